//! Help text for a registry.
//!
//! Visible config types are grouped by section, sections sorted by ascending
//! order (ties by creation order), types within a group in registration order.
//! Types without a section are listed last, under an `Other:` heading when
//! explicit sections are also present. Hidden types are never listed, and a
//! section whose types are all hidden is omitted.

use std::collections::BTreeMap;
use std::fmt::Write;

use cfgbind_common::constants::UNSECTIONED_HEADING;
use cfgbind_common::types::ConfigSection;

use crate::registry::{RegisteredType, Registry};

struct Group<'a> {
    section: Option<&'a ConfigSection>,
    types: Vec<&'a RegisteredType>,
}

/// Renders the help text for every visible config type.
#[must_use]
pub fn render(registry: &Registry, program: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Usage: {program} [--<type> [<field>=<value> | <value>]...]... [--config <file>]"
    );

    let groups = group_types(registry);
    let has_sections = groups.iter().any(|group| group.section.is_some());
    for group in &groups {
        let _ = writeln!(out);
        match group.section {
            Some(section) => {
                let _ = writeln!(out, "{}:", section.description);
            }
            None if has_sections => {
                let _ = writeln!(out, "{UNSECTIONED_HEADING}:");
            }
            None => {}
        }
        for ty in &group.types {
            render_type(&mut out, ty);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "--config <file> reads a YAML list of `<type>: {{<field>: <value>, ...}}` entries."
    );
    out
}

fn group_types(registry: &Registry) -> Vec<Group<'_>> {
    let mut sectioned: BTreeMap<(i32, usize), Group<'_>> = BTreeMap::new();
    let mut unsectioned = Vec::new();

    for ty in registry.types().iter().filter(|ty| !ty.hidden) {
        let section = ty
            .section
            .and_then(|id| registry.section(id).map(|section| (id, section)));
        match section {
            Some((id, section)) => sectioned
                .entry((section.order, id.index()))
                .or_insert_with(|| Group {
                    section: Some(section),
                    types: Vec::new(),
                })
                .types
                .push(ty),
            None => unsectioned.push(ty),
        }
    }

    let mut groups: Vec<Group<'_>> = sectioned.into_values().collect();
    if !unsectioned.is_empty() {
        groups.push(Group {
            section: None,
            types: unsectioned,
        });
    }
    groups
}

fn render_type(out: &mut String, ty: &RegisteredType) {
    let _ = write!(out, "  --{}", ty.flag_name);
    if let Some(idx) = ty.bare_value_index() {
        let _ = write!(out, " <{}>", ty.fields[idx].name);
    }
    if !ty.description.is_empty() {
        let _ = write!(out, ": {}", ty.description);
    }

    let mut labels = Vec::new();
    if ty.required {
        labels.push("required");
    }
    if ty.singleton {
        labels.push("at most once");
    }
    if ty.exclusive {
        labels.push("exclusive");
    }
    if !labels.is_empty() {
        let _ = write!(out, " [{}]", labels.join(", "));
    }
    let _ = writeln!(out);

    for field in &ty.fields {
        let _ = write!(out, "      {}=<{}>", field.name, field.kind);
        if !field.description.is_empty() {
            let _ = write!(out, ": {}", field.description);
        }
        if field.required {
            let _ = write!(out, " (required)");
        }
        if let Some(default) = &field.default {
            let _ = write!(out, " (default: {default:?})");
        }
        if field.bare_value {
            let _ = write!(out, " (bare value)");
        }
        let _ = writeln!(out);
    }
}

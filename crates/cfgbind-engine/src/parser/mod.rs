//! Command-line token parser.
//!
//! Splits the token stream into instance blocks. `--<FlagName>` opens a block,
//! `key=value` assigns a field of the active block, and any other token is the
//! block's bare value. `--config <path>` merges a document into the stream at
//! that point.

pub mod document;
pub mod pending;
pub mod validator;

use std::path::Path;

use cfgbind_common::constants::{ASSIGNMENT_SEPARATOR, CONFIG_FLAG, FLAG_PREFIX};
use cfgbind_common::error::{CfgbindError, Result};
use cfgbind_common::types::normalize_key;

use self::document::DocumentEntry;
use self::pending::{PendingEntry, RawValue};
use crate::registry::Registry;

/// Cursor over the raw token sequence.
struct ArgCursor<'a, S> {
    tokens: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> ArgCursor<'a, S> {
    const fn new(tokens: &'a [S]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn advance(&mut self) -> Option<&'a str> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok.map(AsRef::as_ref)
    }
}

/// Returns the flag name if `token` has the `--` prefix.
#[must_use]
pub fn flag_name(token: &str) -> Option<&str> {
    token.strip_prefix(FLAG_PREFIX)
}

/// Parses `args` into pending entries in first-appearance order.
///
/// # Errors
///
/// Returns a grammar error for unknown flags or fields, stray tokens, bare
/// values without a bare-value field, or a `--config` without a path, and a
/// document error if a referenced document cannot be loaded.
pub fn parse_args<S: AsRef<str>>(registry: &Registry, args: &[S]) -> Result<Vec<PendingEntry>> {
    tracing::info!(tokens = args.len(), "parsing command line");
    let mut cursor = ArgCursor::new(args);
    let mut entries: Vec<PendingEntry> = Vec::new();
    let mut active: Option<usize> = None;

    while let Some(token) = cursor.advance() {
        if let Some(flag) = flag_name(token) {
            if normalize_key(flag) == CONFIG_FLAG {
                let path = cursor.advance().ok_or(CfgbindError::MissingConfigPath)?;
                let doc = document::load(Path::new(path))?;
                merge_document(registry, &mut entries, active, doc)?;
            } else {
                let type_index = registry
                    .lookup(flag)
                    .ok_or_else(|| CfgbindError::UnknownFlag {
                        flag: flag.to_owned(),
                    })?;
                entries.push(PendingEntry::new(
                    type_index,
                    registry.get(type_index).fields.len(),
                ));
                active = Some(entries.len() - 1);
                tracing::debug!(flag = %registry.get(type_index).flag_name, "opened instance block");
            }
            continue;
        }

        let Some(pos) = active else {
            return Err(CfgbindError::ValueOutsideBlock {
                token: token.to_owned(),
            });
        };
        assign_token(registry, &mut entries[pos], token)?;
    }

    tracing::info!(instances = entries.len(), "command line parsed");
    Ok(entries)
}

fn assign_token(registry: &Registry, entry: &mut PendingEntry, token: &str) -> Result<()> {
    let ty = registry.get(entry.type_index);

    if let Some((key, value)) = token.split_once(ASSIGNMENT_SEPARATOR) {
        let field = ty
            .field_index(key)
            .ok_or_else(|| CfgbindError::UnknownField {
                flag: ty.flag_name.clone(),
                field: key.to_owned(),
            })?;
        entry.push(field, RawValue::Text(value.to_owned()));
        return Ok(());
    }

    let field = ty
        .bare_value_index()
        .ok_or_else(|| CfgbindError::NoBareValueField {
            flag: ty.flag_name.clone(),
            value: token.to_owned(),
        })?;
    entry.push(field, RawValue::Text(token.to_owned()));
    Ok(())
}

/// Merges document entries into the stream.
///
/// The first entry for the type of the `active` block fills that block; every
/// other entry opens a new block.
fn merge_document(
    registry: &Registry,
    entries: &mut Vec<PendingEntry>,
    active: Option<usize>,
    doc: Vec<DocumentEntry>,
) -> Result<()> {
    let mut merge_target = active;

    for doc_entry in doc {
        let type_index =
            registry
                .lookup(&doc_entry.flag)
                .ok_or_else(|| CfgbindError::UnknownFlag {
                    flag: doc_entry.flag.clone(),
                })?;
        let ty = registry.get(type_index);

        let target = match merge_target {
            Some(pos) if entries[pos].type_index == type_index => {
                merge_target = None;
                pos
            }
            _ => {
                entries.push(PendingEntry::new(type_index, ty.fields.len()));
                entries.len() - 1
            }
        };

        for (key, value) in doc_entry.fields {
            let field = ty
                .field_index(&key)
                .ok_or_else(|| CfgbindError::UnknownField {
                    flag: ty.flag_name.clone(),
                    field: key.clone(),
                })?;
            entries[target].push(field, RawValue::Structured(value));
        }
    }

    Ok(())
}

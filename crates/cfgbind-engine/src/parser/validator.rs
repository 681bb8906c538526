//! Cross-instance constraint validation of pending entries.
//!
//! Runs on the merged entry list before any instance is constructed, so a
//! rejected batch never reaches coercion or phase execution.

use std::collections::HashMap;

use cfgbind_common::error::{CfgbindError, Result};

use super::pending::PendingEntry;
use crate::registry::Registry;

/// Validates the pending entries of one invocation.
///
/// # Checks performed
///
/// 1. Every required config type has at least one entry.
/// 2. No singleton config type has more than one entry.
/// 3. An entry of an exclusive config type is the only entry.
/// 4. Every required field of every entry received a value.
///
/// # Errors
///
/// Returns a constraint error describing the first rule broken.
pub fn validate(registry: &Registry, entries: &[PendingEntry]) -> Result<()> {
    tracing::info!(instances = entries.len(), "validating constraints");
    let counts = count_by_type(entries);
    check_required_types(registry, &counts)?;
    check_singletons(registry, &counts)?;
    check_exclusive(registry, entries)?;
    check_required_fields(registry, entries)?;
    Ok(())
}

fn count_by_type(entries: &[PendingEntry]) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for entry in entries {
        *counts.entry(entry.type_index).or_insert(0) += 1;
    }
    counts
}

fn check_required_types(registry: &Registry, counts: &HashMap<usize, usize>) -> Result<()> {
    for (idx, ty) in registry.types().iter().enumerate() {
        if ty.required && !counts.contains_key(&idx) {
            return Err(CfgbindError::MissingRequiredType {
                flag: ty.flag_name.clone(),
            });
        }
    }
    Ok(())
}

fn check_singletons(registry: &Registry, counts: &HashMap<usize, usize>) -> Result<()> {
    for (idx, ty) in registry.types().iter().enumerate() {
        if ty.singleton && counts.get(&idx).copied().unwrap_or(0) > 1 {
            return Err(CfgbindError::DuplicateSingleton {
                flag: ty.flag_name.clone(),
            });
        }
    }
    Ok(())
}

fn check_exclusive(registry: &Registry, entries: &[PendingEntry]) -> Result<()> {
    if entries.len() < 2 {
        return Ok(());
    }
    if let Some(entry) = entries
        .iter()
        .find(|entry| registry.get(entry.type_index).exclusive)
    {
        return Err(CfgbindError::ExclusiveConflict {
            flag: registry.get(entry.type_index).flag_name.clone(),
        });
    }
    Ok(())
}

fn check_required_fields(registry: &Registry, entries: &[PendingEntry]) -> Result<()> {
    for entry in entries {
        let ty = registry.get(entry.type_index);
        for (idx, field) in ty.fields.iter().enumerate() {
            if field.required && !entry.is_set(idx) {
                return Err(CfgbindError::MissingRequiredField {
                    flag: ty.flag_name.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cfgbind_common::types::Constraint;
    use serde_json::Value;

    use super::*;
    use crate::config_type::ConfigType;
    use crate::parser::pending::RawValue;
    use crate::schema::Field;

    fn registry(constraints: &[(&str, Option<Constraint>)]) -> Registry {
        let mut builder = Registry::builder();
        for (flag, constraint) in constraints {
            let mut ty = ConfigType::<Value>::new(*flag, "").field(Field::string("value").required());
            if let Some(c) = constraint {
                ty = ty.constraint(*c);
            }
            let _ = builder.register(ty).expect("should register");
        }
        builder.freeze()
    }

    fn entry(type_index: usize) -> PendingEntry {
        let mut entry = PendingEntry::new(type_index, 1);
        entry.push(0, RawValue::Text("abc".into()));
        entry
    }

    #[test]
    fn validate_empty_batch_succeeds() {
        let reg = registry(&[("test", None)]);
        assert!(validate(&reg, &[]).is_ok());
    }

    #[test]
    fn missing_required_type_fails() {
        let reg = registry(&[("test", Some(Constraint::Required))]);
        let err = validate(&reg, &[]).unwrap_err();
        assert!(matches!(err, CfgbindError::MissingRequiredType { .. }), "got: {err}");
        assert!(validate(&reg, &[entry(0)]).is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let reg = registry(&[("test", None)]);
        let err = validate(&reg, &[PendingEntry::new(0, 1)]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("value"), "got: {msg}");
        assert!(msg.contains("--test"), "got: {msg}");
    }

    #[test]
    fn duplicate_singleton_fails() {
        let reg = registry(&[("test", Some(Constraint::Singleton))]);
        assert!(validate(&reg, &[entry(0)]).is_ok());
        let err = validate(&reg, &[entry(0), entry(0)]).unwrap_err();
        assert!(err.to_string().contains("only be specified once"), "got: {err}");
    }

    #[test]
    fn exclusive_alone_succeeds() {
        let reg = registry(&[("test1", Some(Constraint::Exclusive)), ("test2", None)]);
        assert!(validate(&reg, &[entry(0)]).is_ok());
        assert!(validate(&reg, &[entry(1), entry(1)]).is_ok());
    }

    #[test]
    fn exclusive_with_others_fails() {
        let reg = registry(&[("test1", Some(Constraint::Exclusive)), ("test2", None)]);
        let err = validate(&reg, &[entry(1), entry(0)]).unwrap_err();
        assert!(err.to_string().contains("--test1"), "got: {err}");
    }

    #[test]
    fn two_exclusive_instances_of_same_type_fail() {
        let reg = registry(&[("test1", Some(Constraint::Exclusive))]);
        assert!(validate(&reg, &[entry(0), entry(0)]).is_err());
    }

    #[test]
    fn required_type_is_checked_before_fields() {
        let reg = registry(&[("a", None), ("b", Some(Constraint::Required))]);
        let err = validate(&reg, &[PendingEntry::new(0, 1)]).unwrap_err();
        assert!(matches!(err, CfgbindError::MissingRequiredType { .. }), "got: {err}");
    }
}

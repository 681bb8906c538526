//! Instance construction, semantic checks, and phase execution.
//!
//! Phases run phase-major, instance-minor: every instance completes phase
//! *k* before any instance starts phase *k + 1*. The first failing operation
//! aborts the remaining matrix. Side effects of operations that already ran
//! are not rolled back.

use std::fmt;

use cfgbind_common::error::{CfgbindError, Result};
use cfgbind_common::types::normalize_key;

use crate::coerce::coerce_entry;
use crate::config_type::BoxedValue;
use crate::parser::pending::PendingEntry;
use crate::registry::Registry;

/// A constructed instance of a config type.
pub struct ParsedInstance {
    type_index: usize,
    flag_name: String,
    value: BoxedValue,
}

impl ParsedInstance {
    pub(crate) const fn type_index(&self) -> usize {
        self.type_index
    }

    /// Flag name of the instance's config type.
    #[must_use]
    pub fn flag_name(&self) -> &str {
        &self.flag_name
    }

    /// Returns the bound value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for ParsedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedInstance")
            .field("flag_name", &self.flag_name)
            .finish_non_exhaustive()
    }
}

/// Outcome of one parse-and-run call.
#[derive(Debug, Default)]
pub struct ParseResult {
    instances: Vec<ParsedInstance>,
    what_ran: Option<String>,
    help_shown: bool,
}

impl ParseResult {
    pub(crate) fn new(instances: Vec<ParsedInstance>, what_ran: Option<String>) -> Self {
        Self {
            instances,
            what_ran,
            help_shown: false,
        }
    }

    pub(crate) fn help() -> Self {
        Self {
            help_shown: true,
            ..Self::default()
        }
    }

    /// Instances in parse order.
    #[must_use]
    pub fn instances(&self) -> &[ParsedInstance] {
        &self.instances
    }

    /// Flag name of the exclusive config type that ran, if any.
    #[must_use]
    pub fn what_ran(&self) -> Option<&str> {
        self.what_ran.as_deref()
    }

    /// Whether the call rendered help instead of running.
    #[must_use]
    pub const fn help_shown(&self) -> bool {
        self.help_shown
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instances were constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The instance at `index`, if it is a `T`.
    #[must_use]
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.instances.get(index)?.downcast_ref::<T>()
    }

    /// All instances that are a `T`, in parse order.
    pub fn iter_of<T: 'static>(&self) -> impl Iterator<Item = &T> {
        self.instances.iter().filter_map(ParsedInstance::downcast_ref::<T>)
    }
}

/// Coerces and binds every pending entry, in parse order.
///
/// # Errors
///
/// Returns a coercion error for the first value that does not fit its field,
/// or a bind error if the assembled values do not deserialize into the type.
pub fn construct(registry: &Registry, entries: &[PendingEntry]) -> Result<Vec<ParsedInstance>> {
    let mut instances = Vec::with_capacity(entries.len());
    for entry in entries {
        let ty = registry.get(entry.type_index);
        let values = coerce_entry(ty, entry)?;
        let value = ty
            .binder
            .bind(values)
            .map_err(|source| CfgbindError::Bind {
                flag: ty.flag_name.clone(),
                source,
            })?;
        tracing::debug!(flag = %ty.flag_name, "instance constructed");
        instances.push(ParsedInstance {
            type_index: entry.type_index,
            flag_name: ty.flag_name.clone(),
            value,
        });
    }
    Ok(instances)
}

/// Runs each instance's semantic check, in construction order.
///
/// # Errors
///
/// Returns a semantic error for the first instance whose check fails.
pub fn run_checks(registry: &Registry, instances: &[ParsedInstance]) -> Result<()> {
    for instance in instances {
        let ty = registry.get(instance.type_index);
        if let Some(Err(source)) = ty.binder.check(instance.value.as_ref()) {
            tracing::warn!(flag = %ty.flag_name, error = %source, "check failed");
            return Err(CfgbindError::Check {
                flag: ty.flag_name.clone(),
                source,
            });
        }
    }
    Ok(())
}

/// Runs `phases` across `instances`, phase-major.
///
/// # Errors
///
/// Returns a phase error for the first operation that fails; nothing after
/// it runs.
pub fn run_phases<S: AsRef<str>>(
    registry: &Registry,
    instances: &[ParsedInstance],
    phases: &[S],
) -> Result<()> {
    for phase in phases {
        let phase = phase.as_ref();
        let key = normalize_key(phase);
        tracing::info!(phase, "running phase");
        for instance in instances {
            let ty = registry.get(instance.type_index);
            let Some(outcome) = ty.binder.invoke(&key, instance.value.as_ref()) else {
                continue;
            };
            tracing::debug!(phase, flag = %ty.flag_name, "phase invoked");
            if let Err(source) = outcome {
                tracing::warn!(phase, flag = %ty.flag_name, error = %source, "phase failed");
                return Err(CfgbindError::Phase {
                    phase: phase.to_owned(),
                    flag: ty.flag_name.clone(),
                    source,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde::Deserialize;

    use super::*;
    use crate::config_type::ConfigType;
    use crate::parser::pending::RawValue;
    use crate::schema::Field;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: String,
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log, line: String) {
        log.lock().expect("log lock").push(line);
    }

    fn registry(log: &Log, fail_on: Option<(&'static str, &'static str)>) -> Registry {
        let mut builder = Registry::builder();
        let mut ty = ConfigType::<Named>::new("named", "").field(Field::string("id").bare_value());
        for phase in ["init", "run"] {
            let log = Arc::clone(log);
            ty = ty.phase(phase, move |n: &Named| {
                record(&log, format!("{phase} {}", n.id));
                match fail_on {
                    Some((p, id)) if p == phase && id == n.id => Err(format!("{id} broke").into()),
                    _ => Ok(()),
                }
            });
        }
        let ty = ty.check(|n: &Named| {
            if n.id.is_empty() {
                Err("empty id".into())
            } else {
                Ok(())
            }
        });
        let _ = builder.register(ty).expect("should register");
        builder.freeze()
    }

    fn instances(registry: &Registry, ids: &[&str]) -> Vec<ParsedInstance> {
        let entries: Vec<PendingEntry> = ids
            .iter()
            .map(|id| {
                let mut entry = PendingEntry::new(0, 1);
                entry.push(0, RawValue::Text((*id).to_owned()));
                entry
            })
            .collect();
        construct(registry, &entries).expect("should construct")
    }

    fn lines(log: &Log) -> Vec<String> {
        log.lock().expect("log lock").clone()
    }

    #[test]
    fn phases_run_phase_major() {
        let log = Log::default();
        let reg = registry(&log, None);
        let built = instances(&reg, &["a", "b"]);
        run_phases(&reg, &built, &["Init", "prepare", "RUN"]).expect("should run");
        assert_eq!(lines(&log), vec!["init a", "init b", "run a", "run b"]);
    }

    #[test]
    fn failure_aborts_remaining_matrix() {
        let log = Log::default();
        let reg = registry(&log, Some(("init", "a")));
        let built = instances(&reg, &["a", "b"]);
        let err = run_phases(&reg, &built, &["init", "run"]).unwrap_err();
        assert_eq!(lines(&log), vec!["init a"]);
        let msg = err.to_string();
        assert!(msg.contains("a broke"), "got: {msg}");
        assert!(msg.contains("init"), "got: {msg}");
    }

    #[test]
    fn checks_reject_before_phases() {
        let log = Log::default();
        let reg = registry(&log, None);
        let built = instances(&reg, &["ok", ""]);
        let err = run_checks(&reg, &built).unwrap_err();
        assert!(matches!(err, CfgbindError::Check { .. }), "got: {err}");
        assert!(lines(&log).is_empty());
    }

    #[test]
    fn unset_field_binds_zero_value() {
        let log = Log::default();
        let reg = registry(&log, None);
        let built = construct(&reg, &[PendingEntry::new(0, 1)]).expect("should construct");
        assert_eq!(built[0].downcast_ref::<Named>().map(|n| n.id.as_str()), Some(""));
    }

    #[derive(Debug, Deserialize)]
    struct Counted {
        #[allow(dead_code)]
        count: u32,
    }

    #[test]
    fn construct_reports_bind_errors() {
        let mut builder = Registry::builder();
        let _ = builder
            .register(ConfigType::<Counted>::new("counted", "").field(Field::string("count")))
            .expect("should register");
        let reg = builder.freeze();
        let mut entry = PendingEntry::new(0, 1);
        entry.push(0, RawValue::Text("many".into()));
        let err = construct(&reg, &[entry]).unwrap_err();
        assert!(matches!(err, CfgbindError::Bind { .. }), "got: {err}");
    }

    #[test]
    fn typed_access_to_results() {
        let log = Log::default();
        let reg = registry(&log, None);
        let result = ParseResult::new(instances(&reg, &["x", "y"]), None);
        assert_eq!(result.len(), 2);
        assert_eq!(result.get::<Named>(1).map(|n| n.id.as_str()), Some("y"));
        assert!(result.get::<String>(0).is_none());
        let ids: Vec<&str> = result.iter_of::<Named>().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(result.instances()[0].flag_name(), "named");
    }
}

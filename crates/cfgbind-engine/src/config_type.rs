//! Typed config type declarations and their type-erased binders.
//!
//! A [`ConfigType`] pairs a Rust type `T` with its flag name, field
//! declarations, constraints, and the operations it implements. Operations are
//! registered explicitly per phase name; a type that registers no operation for
//! a phase is skipped during that phase.

use std::any::Any;
use std::fmt;

use cfgbind_common::error::HandlerResult;
use cfgbind_common::types::{Constraint, normalize_key};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::schema::Field;

/// A bound instance value, erased to allow heterogeneous instance lists.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

type Handler<T> = Box<dyn Fn(&T) -> HandlerResult + Send + Sync>;

/// Declaration of a config type bound to the Rust type `T`.
///
/// `T` is built by deserializing a JSON object keyed by the declared field
/// names. Unset fields arrive as the zero value of their kind.
///
/// ```
/// use cfgbind_engine::config_type::ConfigType;
/// use cfgbind_engine::schema::Field;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Circle {
///     radius: f64,
/// }
///
/// let circle = ConfigType::<Circle>::new("circle", "Circle Shape")
///     .field(Field::float("radius").bare_value().required())
///     .check(|c| if c.radius < 0.0 { Err("negative radius".into()) } else { Ok(()) })
///     .phase("draw", |_| Ok(()));
/// ```
pub struct ConfigType<T> {
    pub(crate) flag_name: String,
    pub(crate) description: String,
    pub(crate) fields: Vec<Field>,
    pub(crate) constraints: Vec<Constraint>,
    check: Option<Handler<T>>,
    phases: Vec<(String, Handler<T>)>,
}

impl<T> ConfigType<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Declares a config type opened by `--<flag_name>`.
    #[must_use]
    pub fn new(flag_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            flag_name: flag_name.into(),
            description: description.into(),
            fields: Vec::new(),
            constraints: Vec::new(),
            check: None,
            phases: Vec::new(),
        }
    }

    /// Adds a field declaration.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a constraint marker.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Sets the semantic check run once per instance after construction.
    #[must_use]
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        self.check = Some(Box::new(check));
        self
    }

    /// Registers the operation run for `phase`. Phase names match
    /// case-insensitively; a later registration for the same phase replaces
    /// the earlier one.
    #[must_use]
    pub fn phase<F>(mut self, phase: impl AsRef<str>, handler: F) -> Self
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        let key = normalize_key(phase.as_ref());
        self.phases.retain(|(existing, _)| *existing != key);
        self.phases.push((key, Box::new(handler)));
        self
    }

    pub(crate) fn into_binder(self) -> Box<dyn Binder> {
        Box::new(TypedBinder {
            check: self.check,
            phases: self.phases,
        })
    }
}

impl<T> fmt::Debug for ConfigType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigType")
            .field("flag_name", &self.flag_name)
            .field("fields", &self.fields)
            .field("constraints", &self.constraints)
            .field("check", &self.check.is_some())
            .field(
                "phases",
                &self.phases.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Type-erased construction and dispatch for one registered config type.
pub(crate) trait Binder: Send + Sync {
    /// Builds an instance from coerced field values.
    fn bind(&self, values: Map<String, Value>) -> Result<BoxedValue, serde_json::Error>;

    /// Runs the semantic check, if the type has one.
    fn check(&self, value: &dyn Any) -> Option<HandlerResult>;

    /// Runs the operation registered for the normalized `phase`, if any.
    fn invoke(&self, phase: &str, value: &dyn Any) -> Option<HandlerResult>;

    /// Normalized names of the phases this type implements.
    fn phases(&self) -> Vec<&str>;
}

struct TypedBinder<T> {
    check: Option<Handler<T>>,
    phases: Vec<(String, Handler<T>)>,
}

impl<T> Binder for TypedBinder<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn bind(&self, values: Map<String, Value>) -> Result<BoxedValue, serde_json::Error> {
        let value: T = serde_json::from_value(Value::Object(values))?;
        Ok(Box::new(value))
    }

    fn check(&self, value: &dyn Any) -> Option<HandlerResult> {
        let check = self.check.as_ref()?;
        let value = value.downcast_ref::<T>()?;
        Some(check(value))
    }

    fn invoke(&self, phase: &str, value: &dyn Any) -> Option<HandlerResult> {
        let (_, handler) = self.phases.iter().find(|(name, _)| name == phase)?;
        let value = value.downcast_ref::<T>()?;
        Some(handler(value))
    }

    fn phases(&self) -> Vec<&str> {
        self.phases.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        id: String,
    }

    fn object(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn bind_builds_typed_value() {
        let binder = ConfigType::<Probe>::new("probe", "").into_binder();
        let value = binder
            .bind(object(&[("id", Value::from("abc"))]))
            .expect("should bind");
        let probe = value.downcast_ref::<Probe>().expect("should be a Probe");
        assert_eq!(probe.id, "abc");
    }

    #[test]
    fn bind_reports_missing_field() {
        let binder = ConfigType::<Probe>::new("probe", "").into_binder();
        assert!(binder.bind(Map::new()).is_err());
    }

    #[test]
    fn phases_match_normalized_names() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let binder = ConfigType::<Probe>::new("probe", "")
            .phase("Run", move |_| {
                let _ = counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .into_binder();
        let value = binder
            .bind(object(&[("id", Value::from("x"))]))
            .expect("should bind");

        assert!(binder.invoke("run", value.as_ref()).is_some());
        assert!(binder.invoke("init", value.as_ref()).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(binder.phases(), vec!["run"]);
    }

    #[test]
    fn later_phase_registration_replaces_earlier() {
        let binder = ConfigType::<Probe>::new("probe", "")
            .phase("run", |_| Err("first".into()))
            .phase("RUN", |_| Ok(()))
            .into_binder();
        let value = binder
            .bind(object(&[("id", Value::from("x"))]))
            .expect("should bind");
        let outcome = binder.invoke("run", value.as_ref()).expect("has run");
        assert!(outcome.is_ok());
    }

    #[test]
    fn check_absent_returns_none() {
        let binder = ConfigType::<Probe>::new("probe", "").into_binder();
        let value = binder
            .bind(object(&[("id", Value::from("x"))]))
            .expect("should bind");
        assert!(binder.check(value.as_ref()).is_none());
    }
}

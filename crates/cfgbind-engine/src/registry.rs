//! The Type Registry.
//!
//! Registration happens on a [`RegistryBuilder`], which is consumed by
//! [`RegistryBuilder::freeze`] into an immutable [`Registry`]. A frozen
//! registry is `Send + Sync` and can serve any number of parse-and-run calls.

use std::collections::HashMap;
use std::fmt;

use cfgbind_common::constants::{ASSIGNMENT_SEPARATOR, RESERVED_FLAGS};
use cfgbind_common::error::{CfgbindError, Result};
use cfgbind_common::types::{ConfigSection, Constraint, SectionId, normalize_key};
use serde::de::DeserializeOwned;

use crate::config_type::{Binder, ConfigType};
use crate::schema::{FieldDescriptor, describe_fields};

/// A config type after registration.
pub struct RegisteredType {
    /// Flag name as registered.
    pub flag_name: String,
    /// Human description.
    pub description: String,
    /// Field descriptors in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// At least one instance must be supplied.
    pub required: bool,
    /// At most one instance may be supplied.
    pub singleton: bool,
    /// Must be the only instance when present.
    pub exclusive: bool,
    /// Omitted from help output.
    pub hidden: bool,
    /// Help section, if any.
    pub section: Option<SectionId>,
    field_index: HashMap<String, usize>,
    bare_value: Option<usize>,
    pub(crate) binder: Box<dyn Binder>,
}

impl RegisteredType {
    /// Looks up a field by case-insensitive name.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_index.get(&normalize_key(name)).copied()
    }

    /// Index of the bare-value field, if the type has one.
    #[must_use]
    pub const fn bare_value_index(&self) -> Option<usize> {
        self.bare_value
    }

    /// Normalized names of the phases this type implements.
    #[must_use]
    pub fn phases(&self) -> Vec<&str> {
        self.binder.phases()
    }
}

impl fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredType")
            .field("flag_name", &self.flag_name)
            .field("fields", &self.fields)
            .field("required", &self.required)
            .field("singleton", &self.singleton)
            .field("exclusive", &self.exclusive)
            .field("hidden", &self.hidden)
            .field("section", &self.section)
            .finish_non_exhaustive()
    }
}

/// Mutable registry used during registration.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    types: Vec<RegisteredType>,
    flag_index: HashMap<String, usize>,
    sections: Vec<ConfigSection>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a help section and returns its handle.
    pub fn add_section(&mut self, section: ConfigSection) -> SectionId {
        self.sections.push(section);
        SectionId::new(self.sections.len() - 1)
    }

    /// Registers a config type.
    ///
    /// # Errors
    ///
    /// Returns a registration error if the flag name is malformed, reserved,
    /// or already taken, if a field declaration is invalid, or if a section
    /// constraint refers to a section not added to this builder.
    pub fn register<T>(&mut self, config_type: ConfigType<T>) -> Result<&mut Self>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let flag = config_type.flag_name.clone();
        let key = validate_flag_name(&flag)?;
        if self.flag_index.contains_key(&key) {
            return Err(CfgbindError::DuplicateFlag { flag });
        }

        let fields = describe_fields(&flag, &config_type.fields)?;
        let field_index = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.key.clone(), idx))
            .collect();
        let bare_value = fields.iter().position(|field| field.bare_value);

        let (mut required, mut singleton, mut exclusive, mut hidden) = (false, false, false, false);
        let mut section = None;
        for constraint in &config_type.constraints {
            match *constraint {
                Constraint::Required => required = true,
                Constraint::Singleton => singleton = true,
                Constraint::Exclusive => exclusive = true,
                Constraint::Hidden => hidden = true,
                Constraint::Section(id) => {
                    if id.index() >= self.sections.len() {
                        return Err(CfgbindError::UnknownSection { flag });
                    }
                    section = Some(id);
                }
            }
        }

        let registered = RegisteredType {
            flag_name: flag,
            description: config_type.description.clone(),
            fields,
            required,
            singleton,
            exclusive,
            hidden,
            section,
            field_index,
            bare_value,
            binder: config_type.into_binder(),
        };

        tracing::debug!(
            flag = %registered.flag_name,
            fields = registered.fields.len(),
            "registered config type"
        );
        let _ = self.flag_index.insert(key, self.types.len());
        self.types.push(registered);
        Ok(self)
    }

    /// Ends registration.
    #[must_use]
    pub fn freeze(self) -> Registry {
        tracing::info!(types = self.types.len(), "registry frozen");
        Registry {
            types: self.types,
            flag_index: self.flag_index,
            sections: self.sections,
        }
    }
}

/// Immutable set of registered config types.
#[derive(Debug)]
pub struct Registry {
    types: Vec<RegisteredType>,
    flag_index: HashMap<String, usize>,
    sections: Vec<ConfigSection>,
}

impl Registry {
    /// Starts a new registration.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up a config type index by case-insensitive flag name.
    #[must_use]
    pub fn lookup(&self, flag: &str) -> Option<usize> {
        self.flag_index.get(&normalize_key(flag)).copied()
    }

    /// Returns the config type at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` did not come from this registry.
    #[must_use]
    pub fn get(&self, index: usize) -> &RegisteredType {
        &self.types[index]
    }

    /// All config types in registration order.
    #[must_use]
    pub fn types(&self) -> &[RegisteredType] {
        &self.types
    }

    /// Returns the section behind `id`.
    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<&ConfigSection> {
        self.sections.get(id.index())
    }
}

fn validate_flag_name(flag: &str) -> Result<String> {
    let invalid = |reason| CfgbindError::InvalidFlagName {
        flag: flag.to_owned(),
        reason,
    };
    let key = normalize_key(flag);
    if key.is_empty() {
        return Err(invalid("flag name is empty"));
    }
    if key.starts_with('-') || key.contains(char::is_whitespace) || key.contains(ASSIGNMENT_SEPARATOR)
    {
        return Err(invalid("flag name may not start with '-' or contain whitespace or '='"));
    }
    if RESERVED_FLAGS.contains(&key.as_str()) {
        return Err(invalid("flag name is reserved"));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::schema::Field;

    #[derive(Debug, Deserialize)]
    struct Empty {}

    #[test]
    fn lookup_is_case_insensitive() {
        let mut builder = Registry::builder();
        let _ = builder
            .register(ConfigType::<Empty>::new("PhaseTest", "Phase Test"))
            .expect("should register");
        let registry = builder.freeze();
        assert_eq!(registry.lookup("phasetest"), Some(0));
        assert_eq!(registry.lookup("PHASETEST"), Some(0));
        assert_eq!(registry.lookup("other"), None);
    }

    #[test]
    fn duplicate_flag_fails() {
        let mut builder = Registry::builder();
        let _ = builder
            .register(ConfigType::<Empty>::new("test", ""))
            .expect("should register");
        let err = builder
            .register(ConfigType::<Empty>::new("TEST", ""))
            .unwrap_err();
        assert!(matches!(err, CfgbindError::DuplicateFlag { .. }), "got: {err}");
    }

    #[test]
    fn reserved_and_malformed_flags_fail() {
        for flag in ["config", "Help", "", "two words", "a=b", "-x"] {
            let mut builder = Registry::builder();
            assert!(
                builder.register(ConfigType::<Empty>::new(flag, "")).is_err(),
                "accepted {flag:?}"
            );
        }
    }

    #[test]
    fn constraints_are_recorded() {
        let mut builder = Registry::builder();
        let section = builder.add_section(ConfigSection::new("Shapes", 1));
        let _ = builder
            .register(
                ConfigType::<Empty>::new("t", "")
                    .constraint(Constraint::Required)
                    .constraint(Constraint::Singleton)
                    .constraint(Constraint::Hidden)
                    .constraint(Constraint::Section(section)),
            )
            .expect("should register");
        let registry = builder.freeze();
        let ty = registry.get(0);
        assert!(ty.required && ty.singleton && ty.hidden && !ty.exclusive);
        assert_eq!(ty.section, Some(section));
        assert_eq!(
            registry.section(section).map(|s| s.description.as_str()),
            Some("Shapes")
        );
    }

    #[test]
    fn foreign_section_fails() {
        let mut builder = Registry::builder();
        let err = builder
            .register(
                ConfigType::<Empty>::new("t", "").constraint(Constraint::Section(SectionId::new(3))),
            )
            .unwrap_err();
        assert!(matches!(err, CfgbindError::UnknownSection { .. }), "got: {err}");
    }

    #[test]
    fn field_and_bare_value_lookup() {
        let mut builder = Registry::builder();
        let _ = builder
            .register(
                ConfigType::<Empty>::new("t", "")
                    .field(Field::string("Name"))
                    .field(Field::string("id").bare_value()),
            )
            .expect("should register");
        let registry = builder.freeze();
        let ty = registry.get(0);
        assert_eq!(ty.field_index("NAME"), Some(0));
        assert_eq!(ty.bare_value_index(), Some(1));
        assert_eq!(ty.field_index("missing"), None);
    }

    #[test]
    fn failed_registration_leaves_builder_unchanged() {
        let mut builder = Registry::builder();
        let _ = builder
            .register(
                ConfigType::<Empty>::new("t", "")
                    .field(Field::string("a").bare_value())
                    .field(Field::string("b").bare_value()),
            )
            .unwrap_err();
        let registry = builder.freeze();
        assert!(registry.types().is_empty());
        assert_eq!(registry.lookup("t"), None);
    }
}

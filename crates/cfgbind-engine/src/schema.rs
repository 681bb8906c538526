//! Field declarations and the descriptors built from them at registration.
//!
//! A [`Field`] names a schema field, its value [`FieldKind`], and a list of
//! annotations using the vocabulary `description`, `barevalue`, `required`
//! and `default`. Annotations may be attached one at a time through the
//! builder methods or in bulk with a struct-tag string:
//!
//! ```
//! use cfgbind_engine::schema::{Field, FieldKind, FloatWidth};
//!
//! let radius = Field::new("radius", FieldKind::Float(FloatWidth::W64))
//!     .tags(r#"description:"Radius of the circle" barevalue:"yes" required:"yes""#);
//! ```
//!
//! Nothing is validated until the owning config type is registered, when
//! [`describe_fields`] turns the declarations into [`FieldDescriptor`]s.

use std::collections::HashSet;
use std::fmt;

use cfgbind_common::constants::{
    ANNOTATION_BARE_VALUE, ANNOTATION_DEFAULT, ANNOTATION_DESCRIPTION, ANNOTATION_REQUIRED,
};
use cfgbind_common::error::{CfgbindError, Result};
use cfgbind_common::types::{normalize_key, parse_flag_bool};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Bit width of a signed integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// `i8`
    W8,
    /// `i16`
    W16,
    /// `i32`
    W32,
    /// `i64`
    W64,
}

impl IntWidth {
    /// Inclusive value range representable at this width.
    #[must_use]
    pub const fn range(self) -> (i64, i64) {
        match self {
            Self::W8 => (i8::MIN as i64, i8::MAX as i64),
            Self::W16 => (i16::MIN as i64, i16::MAX as i64),
            Self::W32 => (i32::MIN as i64, i32::MAX as i64),
            Self::W64 => (i64::MIN, i64::MAX),
        }
    }

    const fn bits(self) -> u8 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }
}

/// Bit width of a floating-point field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    /// `f32`
    W32,
    /// `f64`
    W64,
}

/// Declared shape of a structured field, used to check decoded values.
#[derive(Clone, Copy)]
pub struct Shape {
    type_name: &'static str,
    check: fn(&Value) -> std::result::Result<(), serde_json::Error>,
    zero: fn() -> Option<Value>,
}

impl Shape {
    /// Shape of `S`; an unset field takes `S::default()`.
    #[must_use]
    pub fn of<S: DeserializeOwned + Serialize + Default>() -> Self {
        Self {
            type_name: std::any::type_name::<S>(),
            check: decodes_as::<S>,
            zero: default_of::<S>,
        }
    }

    /// Shape of `S` with no zero value. An unset field is left out when
    /// binding, so the bound type must tolerate its absence (an `Option` or a
    /// `#[serde(default)]` field).
    #[must_use]
    pub fn without_default<S: DeserializeOwned>() -> Self {
        Self {
            type_name: std::any::type_name::<S>(),
            check: decodes_as::<S>,
            zero: || None,
        }
    }

    /// Value bound when the field is unset and has no default.
    #[must_use]
    pub fn zero(&self) -> Option<Value> {
        (self.zero)()
    }

    /// Rust type name of the declared shape.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Verifies that `value` decodes into the declared shape.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the value does not fit.
    pub fn check(&self, value: &Value) -> std::result::Result<(), serde_json::Error> {
        (self.check)(value)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shape").field(&self.type_name).finish()
    }
}

fn decodes_as<S: DeserializeOwned>(value: &Value) -> std::result::Result<(), serde_json::Error> {
    serde_json::from_value::<S>(value.clone()).map(drop)
}

fn default_of<S: Serialize + Default>() -> Option<Value> {
    serde_json::to_value(S::default()).ok()
}

/// Semantic kind of a field's value.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Signed integer of the given width.
    Int(IntWidth),
    /// Floating point of the given width.
    Float(FloatWidth),
    /// Text assigned verbatim.
    String,
    /// List of strings, one element per occurrence of the field key.
    StringList,
    /// Arbitrary value decoded from a JSON literal.
    Structured(Shape),
}

impl FieldKind {
    /// A structured kind decoding into `S`.
    #[must_use]
    pub fn structured<S: DeserializeOwned + Serialize + Default>() -> Self {
        Self::Structured(Shape::of::<S>())
    }

    /// Value bound when a field of this kind is unset and has no default.
    #[must_use]
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            Self::Int(_) => Some(Value::from(0)),
            Self::Float(_) => Some(Value::from(0.0)),
            Self::String => Some(Value::String(String::new())),
            Self::StringList => Some(Value::Array(Vec::new())),
            Self::Structured(shape) => shape.zero(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(width) => write!(f, "int{}", width.bits()),
            Self::Float(FloatWidth::W32) => write!(f, "float32"),
            Self::Float(FloatWidth::W64) => write!(f, "float64"),
            Self::String => write!(f, "string"),
            Self::StringList => write!(f, "string, repeatable"),
            Self::Structured(_) => write!(f, "json"),
        }
    }
}

/// Declaration of one schema field, prior to registration.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    annotations: Vec<(String, String)>,
    tags: Vec<String>,
}

impl Field {
    /// Declares a field. `name` must match the serialized field name of the
    /// bound type.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Declares an `i64` field.
    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int(IntWidth::W64))
    }

    /// Declares an `f64` field.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float(FloatWidth::W64))
    }

    /// Declares a string field.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// Declares an accumulating string-list field.
    #[must_use]
    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    /// Declares a structured field decoding into `S`.
    #[must_use]
    pub fn structured<S>(name: impl Into<String>) -> Self
    where
        S: DeserializeOwned + Serialize + Default,
    {
        Self::new(name, FieldKind::structured::<S>())
    }

    /// Attaches a raw annotation.
    #[must_use]
    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.push((key.into(), value.into()));
        self
    }

    /// Attaches annotations written as `key:"value"` pairs.
    #[must_use]
    pub fn tags(mut self, tags: impl Into<String>) -> Self {
        self.tags.push(tags.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn description(self, text: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_DESCRIPTION, text)
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(self) -> Self {
        self.annotate(ANNOTATION_REQUIRED, "yes")
    }

    /// Marks the field as receiving the unlabeled token.
    #[must_use]
    pub fn bare_value(self) -> Self {
        self.annotate(ANNOTATION_BARE_VALUE, "yes")
    }

    /// Sets the literal text applied when no value is supplied.
    #[must_use]
    pub fn default_value(self, text: impl Into<String>) -> Self {
        self.annotate(ANNOTATION_DEFAULT, text)
    }

    /// Declared field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Resolved metadata for one field of a registered config type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declared field name, used as the key of the bound value.
    pub name: String,
    /// Normalized lookup key.
    pub key: String,
    /// Help text.
    pub description: String,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Literal text applied when no value is supplied.
    pub default: Option<String>,
    /// Whether unlabeled tokens are assigned to this field.
    pub bare_value: bool,
    /// Value kind.
    pub kind: FieldKind,
}

/// Resolves the declarations of config type `flag` into descriptors.
///
/// # Errors
///
/// Returns a registration error for unknown or malformed annotations,
/// duplicate field names, more than one bare-value field, or a field that is
/// both required and defaulted.
pub fn describe_fields(flag: &str, fields: &[Field]) -> Result<Vec<FieldDescriptor>> {
    let mut seen = HashSet::new();
    let mut bare: Option<&str> = None;
    let mut descriptors = Vec::with_capacity(fields.len());

    for field in fields {
        let descriptor = describe_field(flag, field)?;
        if !seen.insert(descriptor.key.clone()) {
            return Err(CfgbindError::DuplicateField {
                flag: flag.to_owned(),
                field: field.name.clone(),
            });
        }
        if descriptor.bare_value {
            if let Some(first) = bare {
                return Err(CfgbindError::MultipleBareValues {
                    flag: flag.to_owned(),
                    first: first.to_owned(),
                    second: field.name.clone(),
                });
            }
            bare = Some(&field.name);
        }
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}

fn describe_field(flag: &str, field: &Field) -> Result<FieldDescriptor> {
    let invalid = |message: String| CfgbindError::InvalidAnnotation {
        flag: flag.to_owned(),
        field: field.name.clone(),
        message,
    };

    let key = normalize_key(&field.name);
    if key.is_empty() {
        return Err(invalid("field name is empty".into()));
    }

    let mut annotations = Vec::new();
    for tag in &field.tags {
        annotations.extend(parse_tags(tag).map_err(invalid)?);
    }
    annotations.extend(field.annotations.iter().cloned());

    let mut descriptor = FieldDescriptor {
        name: field.name.clone(),
        key,
        description: String::new(),
        required: false,
        default: None,
        bare_value: false,
        kind: field.kind,
    };

    for (name, value) in annotations {
        match normalize_key(&name).as_str() {
            ANNOTATION_DESCRIPTION => descriptor.description = value,
            ANNOTATION_DEFAULT => descriptor.default = Some(value),
            ANNOTATION_REQUIRED => {
                descriptor.required = parse_flag_bool(&value)
                    .ok_or_else(|| invalid(format!("required must be yes or no, got {value:?}")))?;
            }
            ANNOTATION_BARE_VALUE => {
                descriptor.bare_value = parse_flag_bool(&value)
                    .ok_or_else(|| invalid(format!("barevalue must be yes or no, got {value:?}")))?;
            }
            _ => return Err(invalid(format!("unknown annotation {name:?}"))),
        }
    }

    if descriptor.required && descriptor.default.is_some() {
        return Err(invalid("a required field cannot declare a default".into()));
    }

    Ok(descriptor)
}

/// Splits a struct-tag string such as `required:"yes" default:"white"`.
fn parse_tags(tags: &str) -> std::result::Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    let mut rest = tags.trim_start();

    while !rest.is_empty() {
        let Some(colon) = rest.find(':') else {
            return Err(format!("expected key:\"value\", got {rest:?}"));
        };
        let key = &rest[..colon];
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(format!("malformed annotation key {key:?}"));
        }
        let Some(body) = rest[colon + 1..].strip_prefix('"') else {
            return Err(format!("value of {key:?} must be double-quoted"));
        };

        let mut value = String::new();
        let mut end = None;
        let mut chars = body.char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                '"' => {
                    end = Some(idx);
                    break;
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                other => value.push(other),
            }
        }
        let Some(end) = end else {
            return Err(format!("unterminated value for {key:?}"));
        };

        pairs.push((key.to_owned(), value));
        rest = body[end + 1..].trim_start();
    }

    Ok(pairs)
}

//! Conversion of supplied field values into their declared kinds.
//!
//! Every kind is coerced into a [`serde_json::Value`]; the assembled object is
//! then deserialized into the config type's Rust type. Command-line text and
//! document data share this path, so a field behaves the same whichever source
//! supplied it.

use cfgbind_common::error::{CfgbindError, Result};
use serde_json::{Map, Number, Value};

use crate::parser::pending::{PendingEntry, RawValue};
use crate::registry::RegisteredType;
use crate::schema::{FieldDescriptor, FieldKind, FloatWidth, IntWidth};

/// Builds the field-value object for one pending entry.
///
/// Fields with no supplied value take their default, if declared, and
/// otherwise the zero value of their kind. A structured field whose shape has
/// no zero value is left out of the object.
///
/// # Errors
///
/// Returns a coercion error naming the config type and field when a value
/// does not fit its kind.
pub fn coerce_entry(ty: &RegisteredType, entry: &PendingEntry) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for (idx, field) in ty.fields.iter().enumerate() {
        let supplied = entry.values.get(idx).map_or(&[][..], Vec::as_slice);
        let value = match coerce_field(&ty.flag_name, field, supplied)? {
            Some(value) => Some(value),
            None => field.kind.zero_value(),
        };
        if let Some(value) = value {
            let _ = object.insert(field.name.clone(), value);
        }
    }
    Ok(object)
}

/// Coerces the values supplied for one field.
///
/// # Errors
///
/// Returns a coercion error when a value does not fit the field's kind.
pub fn coerce_field(
    flag: &str,
    field: &FieldDescriptor,
    supplied: &[RawValue],
) -> Result<Option<Value>> {
    if supplied.is_empty() {
        return match &field.default {
            Some(text) => coerce_field(flag, field, &[RawValue::Text(text.clone())]),
            None => Ok(None),
        };
    }

    let ctx = FieldCtx { flag, field };
    // Scalar and structured kinds keep the last occurrence.
    let Some(last) = supplied.last() else {
        return Ok(None);
    };
    let value = match field.kind {
        FieldKind::Int(width) => ctx.int(last, width)?,
        FieldKind::Float(width) => ctx.float(last, width)?,
        FieldKind::String => ctx.string(last)?,
        FieldKind::StringList => ctx.list(supplied)?,
        FieldKind::Structured(shape) => {
            let value = ctx.structured(last)?;
            shape.check(&value).map_err(|source| ctx.decode(source))?;
            value
        }
    };
    Ok(Some(value))
}

struct FieldCtx<'a> {
    flag: &'a str,
    field: &'a FieldDescriptor,
}

impl FieldCtx<'_> {
    fn invalid(&self, value: impl Into<String>, message: impl Into<String>) -> CfgbindError {
        CfgbindError::InvalidValue {
            flag: self.flag.to_owned(),
            field: self.field.name.clone(),
            value: value.into(),
            message: message.into(),
        }
    }

    fn decode(&self, source: serde_json::Error) -> CfgbindError {
        CfgbindError::Decode {
            flag: self.flag.to_owned(),
            field: self.field.name.clone(),
            source,
        }
    }

    fn int(&self, raw: &RawValue, width: IntWidth) -> Result<Value> {
        let (min, max) = width.range();
        let parsed = match raw {
            RawValue::Text(text) | RawValue::Structured(Value::String(text)) => text
                .trim()
                .parse::<i64>()
                .map_err(|e| self.invalid(text.as_str(), e.to_string()))?,
            RawValue::Structured(Value::Number(n)) => match n.as_i64() {
                Some(parsed) => parsed,
                None if n.is_u64() => return Err(self.out_of_range(n.to_string(), min, max)),
                None => return Err(self.invalid(n.to_string(), "not an integer")),
            },
            RawValue::Structured(other) => {
                return Err(self.invalid(other.to_string(), "expected an integer"));
            }
        };
        if parsed < min || parsed > max {
            return Err(self.out_of_range(parsed.to_string(), min, max));
        }
        Ok(Value::from(parsed))
    }

    fn out_of_range(&self, value: String, min: i64, max: i64) -> CfgbindError {
        self.invalid(
            value,
            format!("out of range for {} ({min}..={max})", self.field.kind),
        )
    }

    fn float(&self, raw: &RawValue, width: FloatWidth) -> Result<Value> {
        let (parsed, literal) = match raw {
            RawValue::Text(text) | RawValue::Structured(Value::String(text)) => {
                let parsed = text
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| self.invalid(text.as_str(), e.to_string()))?;
                (parsed, text.clone())
            }
            RawValue::Structured(Value::Number(n)) => {
                let parsed = n
                    .as_f64()
                    .ok_or_else(|| self.invalid(n.to_string(), "not a number"))?;
                (parsed, n.to_string())
            }
            RawValue::Structured(other) => {
                return Err(self.invalid(other.to_string(), "expected a number"));
            }
        };
        if !parsed.is_finite() {
            return Err(self.invalid(literal, "number must be finite"));
        }
        if width == FloatWidth::W32 && parsed.abs() > f64::from(f32::MAX) {
            return Err(self.invalid(
                literal,
                format!("out of range for {}", self.field.kind),
            ));
        }
        Number::from_f64(parsed)
            .map(Value::Number)
            .ok_or_else(|| self.invalid(literal, "number must be finite"))
    }

    fn string(&self, raw: &RawValue) -> Result<Value> {
        match raw {
            RawValue::Text(text) => Ok(Value::String(text.clone())),
            RawValue::Structured(value) => self.scalar_text(value).map(Value::String),
        }
    }

    fn list(&self, supplied: &[RawValue]) -> Result<Value> {
        let mut items = Vec::new();
        for raw in supplied {
            match raw {
                RawValue::Text(text) => items.push(Value::String(text.clone())),
                RawValue::Structured(Value::Array(elements)) => {
                    for element in elements {
                        items.push(Value::String(self.scalar_text(element)?));
                    }
                }
                RawValue::Structured(value) => items.push(Value::String(self.scalar_text(value)?)),
            }
        }
        Ok(Value::Array(items))
    }

    fn structured(&self, raw: &RawValue) -> Result<Value> {
        match raw {
            RawValue::Text(text) => serde_json::from_str(text).map_err(|source| self.decode(source)),
            RawValue::Structured(value) => Ok(value.clone()),
        }
    }

    /// Renders a document scalar as text; lists and maps are rejected.
    fn scalar_text(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(text) => Ok(text.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            Value::Array(_) | Value::Object(_) => {
                Err(self.invalid(value.to_string(), "expected a scalar value"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::schema::{Field, describe_fields};

    fn descriptor(field: Field) -> FieldDescriptor {
        describe_fields("test", &[field])
            .expect("should describe")
            .remove(0)
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.into())
    }

    fn coerce(field: Field, supplied: &[RawValue]) -> Result<Option<Value>> {
        coerce_field("test", &descriptor(field), supplied)
    }

    #[test]
    fn integers_of_every_width() {
        let widths = [IntWidth::W8, IntWidth::W16, IntWidth::W32, IntWidth::W64];
        for (n, width) in widths.into_iter().enumerate() {
            let field = Field::new("i", FieldKind::Int(width));
            let value = coerce(field, &[text(&n.to_string())]).expect("should coerce");
            assert_eq!(value, Some(json!(n)));
        }
    }

    #[test]
    fn integer_overflow_fails() {
        let field = Field::new("i2", FieldKind::Int(IntWidth::W8));
        let err = coerce(field, &[text("300")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("i2"), "got: {msg}");
        assert!(msg.contains("out of range"), "got: {msg}");
    }

    #[test]
    fn non_numeric_integer_fails() {
        let err = coerce(Field::int("i1"), &[text("abc")]).unwrap_err();
        assert!(matches!(err, CfgbindError::InvalidValue { .. }), "got: {err}");
    }

    #[test]
    fn fractional_document_integer_fails() {
        let err = coerce(Field::int("i1"), &[RawValue::Structured(json!(1.5))]).unwrap_err();
        assert!(err.to_string().contains("not an integer"), "got: {err}");
    }

    #[test]
    fn floats_parse_text_and_numbers() {
        let f32_field = Field::new("f1", FieldKind::Float(FloatWidth::W32));
        let value = coerce(f32_field, &[text("1.0")]).expect("should coerce");
        assert_eq!(value, Some(json!(1.0)));

        let value = coerce(Field::float("f2"), &[RawValue::Structured(json!(2.3))])
            .expect("should coerce");
        assert_eq!(value, Some(json!(2.3)));

        let value = coerce(Field::float("f2"), &[text("-5")]).expect("should coerce");
        assert_eq!(value, Some(json!(-5.0)));
    }

    #[test]
    fn float32_overflow_fails_from_either_source() {
        let field = || Field::new("f1", FieldKind::Float(FloatWidth::W32));
        let err = coerce(field(), &[text("1e39")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"1e39\""), "got: {msg}");
        assert!(msg.contains("out of range"), "got: {msg}");

        let err = coerce(field(), &[RawValue::Structured(json!(1e39))]).unwrap_err();
        assert!(err.to_string().contains("out of range"), "got: {err}");

        let value = coerce(Field::float("f2"), &[RawValue::Structured(json!(1e39))])
            .expect("fits float64");
        assert_eq!(value, Some(json!(1e39)));
    }

    #[test]
    fn huge_document_integer_is_out_of_range() {
        let err = coerce(Field::int("i4"), &[RawValue::Structured(json!(u64::MAX))]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("out of range for int64"), "got: {msg}");
    }

    #[test]
    fn non_numeric_float_fails() {
        assert!(coerce(Field::float("f"), &[text("wide")]).is_err());
    }

    #[test]
    fn non_finite_float_fails() {
        let err = coerce(Field::float("f"), &[text("inf")]).unwrap_err();
        assert!(err.to_string().contains("must be finite"), "got: {err}");
    }

    #[test]
    fn string_is_verbatim_and_last_wins() {
        let value = coerce(Field::string("s"), &[text("first"), text(" spaced ")])
            .expect("should coerce");
        assert_eq!(value, Some(json!(" spaced ")));
    }

    #[test]
    fn document_scalars_become_strings() {
        let value = coerce(Field::string("s"), &[RawValue::Structured(json!(5))])
            .expect("should coerce");
        assert_eq!(value, Some(json!("5")));
    }

    #[test]
    fn string_list_accumulates_in_order() {
        let value = coerce(
            Field::string_list("ls"),
            &[
                text("hello"),
                RawValue::Structured(json!(["goodbye", "again"])),
                text("last"),
            ],
        )
        .expect("should coerce");
        assert_eq!(value, Some(json!(["hello", "goodbye", "again", "last"])));
    }

    #[test]
    fn structured_literals_decode() {
        let li = coerce(Field::structured::<Vec<i64>>("li"), &[text("[1, 2, 3]")])
            .expect("should coerce");
        assert_eq!(li, Some(json!([1, 2, 3])));

        let mss = coerce(
            Field::structured::<BTreeMap<String, String>>("mss"),
            &[text(r#"{"a": "b", "c": "d"}"#)],
        )
        .expect("should coerce");
        assert_eq!(mss, Some(json!({"a": "b", "c": "d"})));
    }

    #[test]
    fn malformed_literal_names_field() {
        let err = coerce(Field::structured::<Vec<i64>>("li"), &[text("[1, 2")]).unwrap_err();
        assert!(matches!(err, CfgbindError::Decode { .. }), "got: {err}");
        assert!(err.to_string().contains("\"li\""), "got: {err}");
    }

    #[test]
    fn wrong_shape_names_field() {
        let err = coerce(Field::structured::<Vec<i64>>("li"), &[text(r#"["x"]"#)]).unwrap_err();
        assert!(err.to_string().contains("\"li\""), "got: {err}");
    }

    #[test]
    fn default_applies_only_when_unset() {
        let field = || Field::string("value").default_value("98765");
        assert_eq!(coerce(field(), &[]).expect("default"), Some(json!("98765")));
        assert_eq!(coerce(field(), &[text("")]).expect("empty"), Some(json!("")));
    }

    #[test]
    fn default_is_coerced_like_input() {
        let field = Field::new("n", FieldKind::Int(IntWidth::W8)).default_value("1000");
        assert!(coerce(field, &[]).is_err());
    }

    #[test]
    fn unset_field_without_default_is_omitted() {
        assert_eq!(coerce(Field::string("s"), &[]).expect("should coerce"), None);
    }
}

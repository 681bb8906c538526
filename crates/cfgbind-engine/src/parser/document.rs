//! External configuration documents.
//!
//! A document is a YAML sequence of single-key mappings. Each key names a
//! config type; its value maps field keys to scalars, lists, or maps:
//!
//! ```yaml
//! - circle:
//!     radius: 3
//!     color: blue
//! - rectangle:
//!     width: 2
//!     height: 4
//! ```

use std::path::Path;

use cfgbind_common::error::{CfgbindError, Result};
use serde_json::Value;

/// One top-level entry of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    /// Flag name used as the entry key.
    pub flag: String,
    /// Field values in document order.
    pub fields: Vec<(String, Value)>,
}

/// Reads and parses the document at `path`.
///
/// # Errors
///
/// Returns a document error naming `path` if the file cannot be read, is not
/// valid YAML, or does not have the expected shape.
pub fn load(path: &Path) -> Result<Vec<DocumentEntry>> {
    tracing::info!(path = %path.display(), "loading config document");
    let content = std::fs::read_to_string(path).map_err(|source| CfgbindError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, path)
}

/// Parses document text; `path` is only used in error messages.
///
/// # Errors
///
/// Returns a document error if the text is not valid YAML or does not have
/// the expected shape.
pub fn parse_document(content: &str, path: &Path) -> Result<Vec<DocumentEntry>> {
    let shape_err = |message: String| CfgbindError::DocumentShape {
        path: path.to_path_buf(),
        message,
    };

    let doc: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|source| CfgbindError::DocumentParse {
            path: path.to_path_buf(),
            source,
        })?;

    let items = match doc {
        serde_yaml::Value::Null => return Ok(Vec::new()),
        serde_yaml::Value::Sequence(items) => items,
        _ => return Err(shape_err("top level must be a list of entries".into())),
    };

    let mut entries = Vec::with_capacity(items.len());
    for (pos, item) in items.into_iter().enumerate() {
        let serde_yaml::Value::Mapping(mapping) = item else {
            return Err(shape_err(format!("entry {pos} is not a mapping")));
        };
        if mapping.len() != 1 {
            return Err(shape_err(format!(
                "entry {pos} must have exactly one key, found {}",
                mapping.len()
            )));
        }
        let Some((key, body)) = mapping.into_iter().next() else {
            return Err(shape_err(format!("entry {pos} is empty")));
        };
        let Some(flag) = key.as_str().map(str::to_owned) else {
            return Err(shape_err(format!("key of entry {pos} is not a string")));
        };

        let fields = match body {
            serde_yaml::Value::Null => Vec::new(),
            serde_yaml::Value::Mapping(body) => convert_fields(&flag, body).map_err(shape_err)?,
            _ => {
                return Err(shape_err(format!(
                    "value of entry \"{flag}\" must be a mapping of fields"
                )));
            }
        };
        tracing::debug!(flag = %flag, fields = fields.len(), "document entry");
        entries.push(DocumentEntry { flag, fields });
    }

    Ok(entries)
}

fn convert_fields(
    flag: &str,
    body: serde_yaml::Mapping,
) -> std::result::Result<Vec<(String, Value)>, String> {
    let mut fields = Vec::with_capacity(body.len());
    for (key, value) in body {
        let Some(name) = key.as_str().map(str::to_owned) else {
            return Err(format!("field key in entry \"{flag}\" is not a string"));
        };
        let value = serde_json::to_value(&value)
            .map_err(|e| format!("value of \"{flag}.{name}\" is not representable: {e}"))?;
        fields.push((name, value));
    }
    Ok(fields)
}

//! Pending instances produced by the argument parser and document loader.

use serde_json::Value;

/// A value supplied for a field, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Text from a command-line token.
    Text(String),
    /// Already-structured data from a document.
    Structured(Value),
}

/// One instance block awaiting validation and coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    /// Index of the config type in the registry.
    pub type_index: usize,
    /// Supplied values per field index, in occurrence order.
    pub values: Vec<Vec<RawValue>>,
}

impl PendingEntry {
    /// Creates an empty block for a config type with `field_count` fields.
    #[must_use]
    pub fn new(type_index: usize, field_count: usize) -> Self {
        Self {
            type_index,
            values: vec![Vec::new(); field_count],
        }
    }

    /// Records one occurrence of a field value.
    pub fn push(&mut self, field: usize, value: RawValue) {
        self.values[field].push(value);
    }

    /// Whether any value was supplied for `field`.
    #[must_use]
    pub fn is_set(&self, field: usize) -> bool {
        self.values.get(field).is_some_and(|values| !values.is_empty())
    }
}

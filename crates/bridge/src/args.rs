//! Typed extraction from loosely-typed tool arguments.

use crm::Query;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A tool's argument object.
///
/// Handlers `take_*` the fields that belong in the URL, then hand the rest
/// to the API as a body or query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Remove a non-negative integer identifier.
    pub fn take_id(&mut self, field: &str) -> Result<u64> {
        match self.0.remove(field) {
            Some(value) => value
                .as_u64()
                .ok_or_else(|| Error::invalid(format!("{field} must be a non-negative integer"))),
            None => Err(Error::invalid(format!("{field} is required"))),
        }
    }

    /// Remove an array of non-negative integer identifiers.
    pub fn take_ids(&mut self, field: &str) -> Result<Vec<u64>> {
        let Some(value) = self.0.remove(field) else {
            return Err(Error::invalid(format!("{field} is required")));
        };
        let items = value
            .as_array()
            .ok_or_else(|| Error::invalid(format!("{field} must be an array")))?;

        items
            .iter()
            .map(|item| {
                item.as_u64().ok_or_else(|| {
                    Error::invalid(format!("{field} must contain only non-negative integers"))
                })
            })
            .collect()
    }

    /// Remove a string field.
    pub fn take_str(&mut self, field: &str) -> Result<String> {
        match self.0.remove(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(Error::invalid(format!("{field} must be a string"))),
            None => Err(Error::invalid(format!("{field} is required"))),
        }
    }

    /// Remaining fields as a JSON object body.
    pub fn into_body(self) -> Value {
        Value::Object(self.0)
    }

    /// Remaining fields as query pairs.
    ///
    /// Nulls are dropped, arrays are joined with commas, and nested objects
    /// are sent as JSON text.
    pub fn into_query(self) -> Query {
        self.0
            .into_iter()
            .filter_map(|(key, value)| query_value(value).map(|v| (key, v)))
            .collect()
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

fn query_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

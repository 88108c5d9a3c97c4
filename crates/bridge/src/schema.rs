//! Input schemas: field descriptions, JSON Schema rendering, shape checks.

use serde_json::{Map, Value, json};

/// Primitive kind of an argument field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    /// JSON Schema `type` keyword.
    pub fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One named argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
    /// Allowed values, for string fields.
    pub values: &'static [&'static str],
    /// Element kind, for array fields.
    pub items: Option<FieldKind>,
}

impl Field {
    pub fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            values: &[],
            items: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.values = values;
        self
    }

    pub fn of(mut self, items: FieldKind) -> Self {
        self.items = Some(items);
        self
    }

    fn to_json(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind.json_type()));
        schema.insert("description".into(), json!(self.description));
        if !self.values.is_empty() {
            schema.insert("enum".into(), json!(self.values));
        }
        if let Some(items) = self.items {
            schema.insert("items".into(), json!({ "type": items.json_type() }));
        }
        Value::Object(schema)
    }
}

/// Render fields as a JSON Schema object.
pub fn to_json_schema(fields: &[Field]) -> Map<String, Value> {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| (f.name.to_string(), f.to_json()))
        .collect();
    let required: Vec<&str> = fields.iter().filter(|f| f.required).map(|f| f.name).collect();

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    schema.insert("required".into(), json!(required));
    schema
}

/// Check presence and primitive kind of every required field.
///
/// Returns one problem per offending field. Optional fields are not
/// inspected.
pub fn validate(fields: &[Field], args: &Map<String, Value>) -> Result<(), Vec<String>> {
    let problems: Vec<String> = fields
        .iter()
        .filter(|f| f.required)
        .filter_map(|f| match args.get(f.name) {
            None | Some(Value::Null) => Some(format!("{} is required", f.name)),
            Some(value) if !f.kind.matches(value) => {
                Some(format!("{} must be {}", f.name, article(f.kind)))
            }
            Some(_) => None,
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

fn article(kind: FieldKind) -> String {
    match kind {
        FieldKind::Integer | FieldKind::Array | FieldKind::Object => {
            format!("an {}", kind.json_type())
        }
        _ => format!("a {}", kind.json_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<Field> {
        vec![
            Field::required("id", FieldKind::Integer, "ID"),
            Field::required("name", FieldKind::String, "Name"),
            Field::optional("status", FieldKind::String, "Status").one_of(&["active", "paused"]),
            Field::optional("tagIds", FieldKind::Array, "Tags").of(FieldKind::Integer),
        ]
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn renders_json_schema() {
        let schema = to_json_schema(&fields());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["id", "name"]));
        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert_eq!(schema["properties"]["status"]["enum"], json!(["active", "paused"]));
        assert_eq!(schema["properties"]["tagIds"]["items"]["type"], "integer");
        assert!(schema["properties"]["name"].get("enum").is_none());
    }

    #[test]
    fn accepts_valid_arguments() {
        assert!(validate(&fields(), &args(json!({"id": 3, "name": "vip"}))).is_ok());
    }

    #[test]
    fn reports_every_missing_field() {
        let problems = validate(&fields(), &Map::new()).unwrap_err();
        assert_eq!(problems, vec!["id is required", "name is required"]);
    }

    #[test]
    fn null_counts_as_missing() {
        let problems = validate(&fields(), &args(json!({"id": null, "name": "x"}))).unwrap_err();
        assert_eq!(problems, vec!["id is required"]);
    }

    #[test]
    fn reports_wrong_kind() {
        let problems = validate(&fields(), &args(json!({"id": "3", "name": 4}))).unwrap_err();
        assert_eq!(problems, vec!["id must be an integer", "name must be a string"]);
    }

    #[test]
    fn float_is_not_an_integer() {
        let problems = validate(&fields(), &args(json!({"id": 1.5, "name": "x"}))).unwrap_err();
        assert_eq!(problems, vec!["id must be an integer"]);
    }

    #[test]
    fn optional_fields_are_not_checked() {
        let value = json!({"id": 1, "name": "x", "status": 7, "tagIds": "nope"});
        assert!(validate(&fields(), &args(value)).is_ok());
    }
}

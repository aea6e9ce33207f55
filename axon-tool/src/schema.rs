//! Explicit parameter specs and JSON-Schema derivation.
//!
//! Tools declare their parameters with [`ParamSpec`] values — every
//! parameter carries an explicit name and description, so nothing depends
//! on reflected or preserved parameter names. The toolkit derives the JSON
//! Schema once at registration and caches it in the descriptor.

use serde_json::{json, Map, Value};

/// The shape of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// A string.
    String,
    /// An integer.
    Integer,
    /// A floating-point number.
    Number,
    /// A boolean.
    Boolean,
    /// A string restricted to the given values.
    Enum(Vec<String>),
    /// An array of the given element kind.
    Array(Box<ParamKind>),
    /// A nested object with its own fields.
    Object(Vec<ParamSpec>),
}

/// One named, described parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Human-readable description, surfaced to the model.
    pub description: String,
    /// The parameter shape.
    pub kind: ParamKind,
    /// Whether the parameter must be present. Defaults to true.
    pub required: bool,
}

impl ParamSpec {
    fn new(name: impl Into<String>, description: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
        }
    }

    /// A required string parameter.
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::String)
    }

    /// A required integer parameter.
    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::Integer)
    }

    /// A required number parameter.
    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::Number)
    }

    /// A required boolean parameter.
    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::Boolean)
    }

    /// A required enum parameter over the given string values.
    pub fn enumeration(
        name: impl Into<String>,
        description: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(
            name,
            description,
            ParamKind::Enum(values.into_iter().map(Into::into).collect()),
        )
    }

    /// A required array parameter with the given element kind.
    pub fn array(
        name: impl Into<String>,
        description: impl Into<String>,
        items: ParamKind,
    ) -> Self {
        Self::new(name, description, ParamKind::Array(Box::new(items)))
    }

    /// A required nested-object parameter with the given fields.
    pub fn object(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<ParamSpec>,
    ) -> Self {
        Self::new(name, description, ParamKind::Object(fields))
    }

    /// Mark this parameter optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

fn kind_schema(kind: &ParamKind) -> Value {
    match kind {
        ParamKind::String => json!({"type": "string"}),
        ParamKind::Integer => json!({"type": "integer"}),
        ParamKind::Number => json!({"type": "number"}),
        ParamKind::Boolean => json!({"type": "boolean"}),
        ParamKind::Enum(values) => json!({"type": "string", "enum": values}),
        ParamKind::Array(items) => json!({"type": "array", "items": kind_schema(items)}),
        ParamKind::Object(fields) => object_schema(fields),
    }
}

/// Derive a JSON-Schema object for the given parameters. Every
/// non-optional parameter lands in `required`; array parameters always
/// carry an `items` subschema.
pub fn object_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        let mut schema = kind_schema(&param.kind);
        if let Some(obj) = schema.as_object_mut() {
            obj.insert("description".into(), json!(param.description));
        }
        properties.insert(param.name.clone(), schema);
        if param.required {
            required.push(json!(param.name));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn value_matches(kind: &ParamKind, value: &Value) -> Result<(), String> {
    match kind {
        ParamKind::String => {
            if value.is_string() {
                Ok(())
            } else {
                Err("expected string".into())
            }
        }
        ParamKind::Integer => {
            if value.is_i64() || value.is_u64() {
                Ok(())
            } else {
                Err("expected integer".into())
            }
        }
        ParamKind::Number => {
            if value.is_number() {
                Ok(())
            } else {
                Err("expected number".into())
            }
        }
        ParamKind::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err("expected boolean".into())
            }
        }
        ParamKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
            Some(s) => Err(format!("'{s}' is not one of {allowed:?}")),
            None => Err("expected string".into()),
        },
        ParamKind::Array(items) => match value.as_array() {
            Some(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    value_matches(items, element).map_err(|e| format!("[{i}]: {e}"))?;
                }
                Ok(())
            }
            None => Err("expected array".into()),
        },
        ParamKind::Object(fields) => validate(fields, value),
    }
}

/// Validate an input object against parameter specs: required parameters
/// must be present and every present parameter must match its kind.
pub fn validate(params: &[ParamSpec], input: &Value) -> Result<(), String> {
    let obj = input
        .as_object()
        .ok_or_else(|| "arguments must be a JSON object".to_string())?;
    for param in params {
        match obj.get(&param.name) {
            Some(value) => {
                value_matches(&param.kind, value)
                    .map_err(|e| format!("parameter '{}': {e}", param.name))?;
            }
            None if param.required => {
                return Err(format!("missing required parameter '{}'", param.name));
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_marks_required_and_describes() {
        let params = vec![
            ParamSpec::integer("a", "first operand"),
            ParamSpec::integer("b", "second operand").optional(),
        ];
        let schema = object_schema(&params);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["a"]["type"], "integer");
        assert_eq!(schema["properties"]["a"]["description"], "first operand");
        assert_eq!(schema["required"], json!(["a"]));
    }

    #[test]
    fn array_params_always_carry_items() {
        let params = vec![ParamSpec::array(
            "cities",
            "cities to query",
            ParamKind::String,
        )];
        let schema = object_schema(&params);
        assert_eq!(schema["properties"]["cities"]["items"]["type"], "string");
    }

    #[test]
    fn nested_objects_recurse() {
        let params = vec![ParamSpec::object(
            "filter",
            "query filter",
            vec![
                ParamSpec::string("field", "field name"),
                ParamSpec::enumeration("op", "comparison", ["eq", "lt", "gt"]),
            ],
        )];
        let schema = object_schema(&params);
        let filter = &schema["properties"]["filter"];
        assert_eq!(filter["type"], "object");
        assert_eq!(filter["properties"]["op"]["enum"], json!(["eq", "lt", "gt"]));
        assert_eq!(filter["required"], json!(["field", "op"]));
    }

    #[test]
    fn validate_accepts_matching_input() {
        let params = vec![
            ParamSpec::integer("a", "first"),
            ParamSpec::integer("b", "second"),
        ];
        assert!(validate(&params, &json!({"a": 17, "b": 25})).is_ok());
    }

    #[test]
    fn validate_rejects_missing_required() {
        let params = vec![ParamSpec::string("city", "the city")];
        let err = validate(&params, &json!({})).unwrap_err();
        assert!(err.contains("city"));
    }

    #[test]
    fn validate_rejects_wrong_types() {
        let params = vec![ParamSpec::integer("a", "first")];
        assert!(validate(&params, &json!({"a": "seventeen"})).is_err());
        assert!(validate(&params, &json!("not an object")).is_err());
    }

    #[test]
    fn validate_checks_array_elements() {
        let params = vec![ParamSpec::array("xs", "numbers", ParamKind::Integer)];
        assert!(validate(&params, &json!({"xs": [1, 2, 3]})).is_ok());
        assert!(validate(&params, &json!({"xs": [1, "two"]})).is_err());
    }

    #[test]
    fn validate_enum_membership() {
        let params = vec![ParamSpec::enumeration("unit", "unit", ["c", "f"])];
        assert!(validate(&params, &json!({"unit": "c"})).is_ok());
        assert!(validate(&params, &json!({"unit": "k"})).is_err());
    }
}

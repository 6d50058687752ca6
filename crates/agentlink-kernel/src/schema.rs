//! Shallow payload validation against a capability's declared schema.
//!
//! Only the top level is checked: every name in `required` must be present,
//! and every property with a primitive `type` must match it. Nested schemas,
//! formats and combinators are not interpreted.

use serde_json::Value;

/// Return the first violation of `schema` by `payload`, if any.
pub fn validate_payload(schema: &Value, payload: &Value) -> Result<(), String> {
    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object")
        || schema.get("properties").is_some()
        || schema.get("required").is_some();
    if !expects_object {
        return match schema.get("type").and_then(Value::as_str) {
            Some(ty) if !type_matches(ty, payload) => Err(format!(
                "expected payload of type {ty}, got {}",
                type_name(payload)
            )),
            _ => Ok(()),
        };
    }

    let Some(fields) = payload.as_object() else {
        return Err(format!(
            "expected payload of type object, got {}",
            type_name(payload)
        ));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !fields.contains_key(name) {
                return Err(format!("missing required field '{name}'"));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let (Some(value), Some(ty)) = (
                fields.get(name),
                property.get("type").and_then(Value::as_str),
            ) else {
                continue;
            };
            if !type_matches(ty, value) {
                return Err(format!(
                    "field '{name}' must be of type {ty}, got {}",
                    type_name(value)
                ));
            }
        }
    }

    Ok(())
}

/// Unknown type names never fail the check.
fn type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string" },
                "repeat": { "type": "integer" }
            },
            "required": ["message"]
        })
    }

    #[test]
    fn test_valid_payload() {
        assert!(validate_payload(&echo_schema(), &json!({"message": "hi"})).is_ok());
        assert!(validate_payload(&echo_schema(), &json!({"message": "hi", "repeat": 3})).is_ok());
        // Extra fields are allowed.
        assert!(validate_payload(&echo_schema(), &json!({"message": "hi", "x": null})).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate_payload(&echo_schema(), &json!({"repeat": 1})).unwrap_err();
        assert_eq!(err, "missing required field 'message'");
    }

    #[test]
    fn test_wrong_primitive_type() {
        let err = validate_payload(&echo_schema(), &json!({"message": 42})).unwrap_err();
        assert_eq!(err, "field 'message' must be of type string, got integer");

        let err =
            validate_payload(&echo_schema(), &json!({"message": "hi", "repeat": 1.5})).unwrap_err();
        assert_eq!(err, "field 'repeat' must be of type integer, got number");
    }

    #[test]
    fn test_non_object_payload() {
        let err = validate_payload(&echo_schema(), &json!("hello")).unwrap_err();
        assert_eq!(err, "expected payload of type object, got string");
    }

    #[test]
    fn test_top_level_primitive_schema() {
        let schema = json!({"type": "array"});
        assert!(validate_payload(&schema, &json!([1, 2])).is_ok());
        assert!(validate_payload(&schema, &json!({})).is_err());
    }

    #[test]
    fn test_nested_schemas_not_interpreted() {
        let schema = json!({
            "type": "object",
            "properties": {
                "inner": { "type": "object", "required": ["deep"] },
                "any": { "type": "uuid" }
            }
        });
        assert!(validate_payload(&schema, &json!({"inner": {}, "any": 5})).is_ok());
    }

    #[test]
    fn test_empty_schema_accepts_anything() {
        assert!(validate_payload(&json!({}), &json!(null)).is_ok());
        assert!(validate_payload(&json!({}), &json!([1])).is_ok());
    }
}

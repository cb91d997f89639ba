//! JSON-Schema validation of tool inputs
//!
//! The host only depends on the [`SchemaValidator`] contract; the default
//! implementation delegates to the `jsonschema` crate.

use serde_json::Value;

pub trait SchemaValidator: Send + Sync {
    /// Checks that `schema` is itself a well-formed JSON-Schema document.
    fn check_schema(&self, schema: &Value) -> Result<(), String>;

    /// Validates `data` against `schema`, returning every violation on failure.
    fn validate(&self, schema: &Value, data: &Value) -> Result<(), Vec<Value>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn check_schema(&self, schema: &Value) -> Result<(), String> {
        jsonschema::validator_for(schema)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }

    fn validate(&self, schema: &Value, data: &Value) -> Result<(), Vec<Value>> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|err| vec![Value::String(format!("invalid schema: {err}"))])?;

        let errors: Vec<Value> = validator
            .iter_errors(data)
            .map(|err| Value::String(err.to_string()))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn msg_schema() -> Value {
        json!({
            "type": "object",
            "properties": { "msg": { "type": "string" } },
            "required": ["msg"]
        })
    }

    #[test]
    fn accepts_conforming_data() {
        let validator = JsonSchemaValidator;
        assert!(validator
            .validate(&msg_schema(), &json!({"msg": "hi"}))
            .is_ok());
    }

    #[test]
    fn reports_violations() {
        let validator = JsonSchemaValidator;
        let errors = validator
            .validate(&msg_schema(), &json!({}))
            .expect_err("msg is required");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].as_str().is_some_and(|e| e.contains("msg")));
    }

    #[test]
    fn rejects_malformed_schema() {
        let validator = JsonSchemaValidator;
        assert!(validator.check_schema(&msg_schema()).is_ok());
        assert!(validator.check_schema(&json!({"type": 12})).is_err());
    }
}

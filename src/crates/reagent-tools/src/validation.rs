//! Argument validation against a tool's JSON-Schema-shaped parameter map.

use crate::error::{Result, ToolError};
use crate::tool::ToolArgs;
use jsonschema::JSONSchema;
use serde_json::Value;

/// Compile `schema` and validate `args` against it, collecting every
/// violation into one error rather than failing on the first.
pub fn validate_args(schema: &Value, args: &ToolArgs) -> Result<()> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| ToolError::SchemaInvalid(e.to_string()))?;
    let instance = Value::Object(args.iter().map(|(k, v)| (k.clone(), v.clone())).collect());

    if let Err(errors) = compiled.validate(&instance) {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(ToolError::InvalidInput(messages.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_required_property() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "city": { "type": "string" } },
            "required": ["city"]
        });
        let args: ToolArgs = Default::default();
        assert!(validate_args(&schema, &args).is_err());
    }

    #[test]
    fn accepts_well_formed_args() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "city": { "type": "string" } },
            "required": ["city"]
        });
        let mut args: ToolArgs = Default::default();
        args.insert("city".into(), serde_json::json!("Paris"));
        assert!(validate_args(&schema, &args).is_ok());
    }
}

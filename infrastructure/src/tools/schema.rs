//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`], producing the function
//! envelope of OpenAI-compatible chat-completions APIs.

use klaude_application::ToolSchemaPort;
use klaude_domain::ToolDefinition;

/// Wraps each definition as `{type: "function", function: {...}}`.
pub struct JsonSchemaToolConverter;

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters_schema(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klaude_domain::ToolParameter;

    #[test]
    fn test_tool_to_schema() {
        let converter = JsonSchemaToolConverter;
        let tool = ToolDefinition::new("Read", "Read file contents")
            .with_parameter(ToolParameter::new("file_path", "File path to read", true))
            .with_parameter(
                ToolParameter::new("limit", "Max lines to read", false).with_type("number"),
            );

        let schema = converter.tool_to_schema(&tool);

        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "Read");
        assert_eq!(schema["function"]["description"], "Read file contents");

        let params = &schema["function"]["parameters"];
        assert_eq!(params["type"], "object");
        assert_eq!(params["additionalProperties"], false);
        assert_eq!(params["$schema"], "http://json-schema.org/draft-07/schema#");
        assert_eq!(params["properties"]["file_path"]["type"], "string");
        assert_eq!(params["properties"]["limit"]["type"], "number");
        assert_eq!(params["required"], serde_json::json!(["file_path"]));
    }

    #[test]
    fn test_all_tools_schema_keeps_order() {
        let converter = JsonSchemaToolConverter;
        let tools = vec![
            ToolDefinition::new("Write", "Write file"),
            ToolDefinition::new("Bash", "Run a command"),
        ];

        let schemas = converter.all_tools_schema(&tools);
        let names: Vec<&str> = schemas
            .iter()
            .map(|s| s["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Write", "Bash"]);
    }
}

//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::value_objects::ToolError;

/// JSON Schema dialect advertised with every parameter schema.
pub const JSON_SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Definition of a tool that can be advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "Read")
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// Parameter specifications, in declaration order
    pub parameters: Vec<ToolParameter>,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// JSON Schema type (e.g., "string", "integer", "array")
    pub param_type: String,
    /// Allowed values, if the parameter is an enumeration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Default value advertised to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Item schema for array parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    /// Extra JSON Schema keywords (minLength, maximum, format, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub constraints: Map<String, Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of the required parameters, in declaration order.
    pub fn required_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    /// Build the closed object schema for this tool's parameters.
    ///
    /// `required` is always a subset of `properties` because requiredness is a
    /// flag on each declared parameter.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(param.name.clone(), param.to_schema());
        }
        let required: Vec<Value> = self
            .required_parameters()
            .map(|name| Value::String(name.to_string()))
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
            "$schema": JSON_SCHEMA_DIALECT,
        })
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
            enum_values: None,
            default: None,
            items: None,
            constraints: Map::new(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_items(mut self, items: Value) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_constraint(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(keyword.into(), value.into());
        self
    }

    fn to_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), Value::String(self.param_type.clone()));
        prop.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        if let Some(values) = &self.enum_values {
            prop.insert(
                "enum".to_string(),
                Value::Array(values.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.clone());
        }
        if let Some(items) = &self.items {
            prop.insert("items".to_string(), items.clone());
        }
        for (keyword, value) in &self.constraints {
            prop.insert(keyword.clone(), value.clone());
        }
        Value::Object(prop)
    }
}

/// A decoded tool invocation with named arguments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments to pass to the tool
    pub arguments: HashMap<String, Value>,
    /// Call identifier assigned by the model, echoed back on the tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
            call_id: None,
        }
    }

    /// Decode a raw JSON argument payload produced by the model.
    ///
    /// An empty payload is treated as an empty object. Anything that is not a
    /// JSON object is rejected.
    pub fn from_raw(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments: &str,
    ) -> Result<Self, ToolError> {
        let tool_name = tool_name.into();
        let arguments = if raw_arguments.trim().is_empty() {
            HashMap::new()
        } else {
            match serde_json::from_str::<Value>(raw_arguments) {
                Ok(Value::Object(map)) => map.into_iter().collect(),
                Ok(other) => {
                    return Err(ToolError::invalid_argument(format!(
                        "Error: Arguments for tool '{}' must be a JSON object, got {}",
                        tool_name,
                        json_kind(&other)
                    )));
                }
                Err(e) => {
                    return Err(ToolError::invalid_argument(format!(
                        "Error: Invalid JSON arguments for tool '{}': {}",
                        tool_name, e
                    )));
                }
            }
        };

        Ok(Self {
            tool_name,
            arguments,
            call_id: Some(call_id.into()),
        })
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument
    pub fn require_string(&self, key: &str) -> Result<&str, ToolError> {
        match self.arguments.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ToolError::invalid_argument(format!(
                "Error: Argument '{}' must be a string, got {}",
                key,
                json_kind(other)
            ))),
            None => Err(ToolError::invalid_argument(format!(
                "Error: Missing required argument: {}",
                key
            ))),
        }
    }

    /// Get an integer argument, accepting integral floats and numeric strings
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.arguments.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get a boolean argument, accepting "true"/"false" strings
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.arguments.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Get an array argument
    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.arguments.get(key).and_then(|v| v.as_array())
    }

    /// Get an array of strings, skipping non-string entries
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_array(key)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Tool domain traits
//!
//! [`Tool`] is the capability interface every tool implements.
//! [`ToolValidator`] checks a decoded call against a definition without I/O.

use async_trait::async_trait;
use serde_json::Value;

use super::entities::{ToolCall, ToolDefinition, ToolParameter};
use super::value_objects::ToolError;

/// A named, schema-described capability the model can invoke.
///
/// Implementations own whatever state they need (working directory, todo
/// list, HTTP client) and receive it through their constructor.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameters advertised to the model
    fn definition(&self) -> &ToolDefinition;

    /// Stable tool name
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Run the tool. Failures are returned as [`ToolError`], never panics.
    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError>;
}

/// Validator for tool calls
pub trait ToolValidator {
    /// Validate a tool call against its definition
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), ToolError>;
}

/// Default implementation of ToolValidator
///
/// Enforces the closed schema: every required parameter present, no
/// parameter outside the declared set, values of the declared type and
/// within the declared enumeration.
///
/// Types are checked as leniently as [`ToolCall`]'s accessors read them: a
/// numeric or boolean string passes as a number or boolean. `null` on an
/// optional parameter counts as absent.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), ToolError> {
        for name in definition.required_parameters() {
            match call.arguments.get(name) {
                None | Some(serde_json::Value::Null) => {
                    return Err(ToolError::invalid_argument(format!(
                        "Error: Missing required parameter '{}' for tool '{}'",
                        name, definition.name
                    )));
                }
                Some(_) => {}
            }
        }

        let mut unknown: Vec<&str> = call
            .arguments
            .keys()
            .map(String::as_str)
            .filter(|arg| definition.parameter(arg).is_none())
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(ToolError::invalid_argument(format!(
                "Error: Unknown parameter(s) {} for tool '{}'",
                unknown
                    .iter()
                    .map(|n| format!("'{}'", n))
                    .collect::<Vec<_>>()
                    .join(", "),
                definition.name
            )));
        }

        let mut names: Vec<&String> = call.arguments.keys().collect();
        names.sort_unstable();
        for name in names {
            let (Some(param), Some(value)) = (definition.parameter(name), call.arguments.get(name))
            else {
                continue;
            };
            check_value(param, value, &definition.name)?;
        }

        Ok(())
    }
}

fn check_value(param: &ToolParameter, value: &Value, tool: &str) -> Result<(), ToolError> {
    if value.is_null() {
        return Ok(());
    }
    if !matches_type(&param.param_type, value) {
        return Err(ToolError::invalid_argument(format!(
            "Error: Parameter '{}' for tool '{}' must be of type {}",
            param.name, tool, param.param_type
        )));
    }
    if let (Some(allowed), Some(text)) = (&param.enum_values, value.as_str())
        && !allowed.iter().any(|a| a == text)
    {
        return Err(ToolError::invalid_argument(format!(
            "Error: Parameter '{}' for tool '{}' must be one of {}, got '{}'",
            param.name,
            tool,
            allowed.join(", "),
            text
        )));
    }
    Ok(())
}

fn matches_type(param_type: &str, value: &Value) -> bool {
    match param_type {
        "string" => value.is_string(),
        "number" => {
            value.is_number() || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok())
        }
        "integer" => {
            value.as_f64().is_some_and(|f| f.fract() == 0.0)
                || value.as_str().is_some_and(|s| s.trim().parse::<i64>().is_ok())
        }
        "boolean" => value.is_boolean() || value.as_str().is_some_and(|s| s.parse::<bool>().is_ok()),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

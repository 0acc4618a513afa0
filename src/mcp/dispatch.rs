use crate::{errors::AppError, mcp::registry::ToolRegistry, mcp::types::Envelope};
use serde_json::{Map, Value};
use tracing::info;

/// Result of one `/mcp` call, kept apart from the envelope so the caller can
/// audit which tool ran and how it failed.
#[derive(Debug)]
pub struct Outcome {
    pub tool: Option<String>,
    pub result: Result<Value, AppError>,
}

impl Outcome {
    fn rejected(tool: Option<String>, err: AppError) -> Self {
        Self { tool, result: Err(err) }
    }

    pub fn into_envelope(self) -> Envelope {
        match self.result {
            Ok(value) => Envelope::Result(value),
            Err(e) => Envelope::Error(e.to_string()),
        }
    }
}

/// Decode `{"name": ..., "arguments": {...}}` and run the named tool.
/// Every failure ends up in the returned [`Outcome`].
pub async fn dispatch(registry: &ToolRegistry, body: &[u8]) -> Outcome {
    let request: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => return Outcome::rejected(None, AppError::MalformedRequest(e.to_string())),
    };

    let Some(name) = request.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
        return Outcome::rejected(None, AppError::MissingField("name"));
    };
    let name = name.to_string();
    let arguments = request.get("arguments").cloned().unwrap_or(Value::Null);
    info!(tool = %name, arguments = %arguments, "Tool call");

    let Some(tool) = registry.get(&name) else {
        return Outcome::rejected(Some(name.clone()), AppError::ToolNotFound(name));
    };

    let args = match arguments {
        Value::Null => Value::Object(Map::new()),
        obj @ Value::Object(_) => obj,
        other => {
            let err = AppError::invalid_arguments(&name, format!("arguments must be an object, got {other}"));
            return Outcome::rejected(Some(name), err);
        }
    };

    let result = tool.call(registry.client(), args).await;
    Outcome { tool: Some(name), result }
}

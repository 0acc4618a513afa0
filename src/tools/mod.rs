pub mod agents;
pub mod knowledge_bases;
pub mod mcp_servers;
pub mod passthrough;
pub mod workflows;

use crate::{errors::AppError, mcp::registry::DynTool};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::sync::Arc;

pub fn all() -> Vec<DynTool> {
    let tools: [DynTool; 21] = [
        Arc::new(agents::ListAgents),
        Arc::new(agents::GetAgent),
        Arc::new(agents::CreateAgent),
        Arc::new(agents::UpdateAgent),
        Arc::new(agents::DeleteAgent),
        Arc::new(knowledge_bases::ListKnowledgeBases),
        Arc::new(knowledge_bases::GetKnowledgeBase),
        Arc::new(knowledge_bases::CreateKnowledgeBase),
        Arc::new(knowledge_bases::AddDocumentToKb),
        Arc::new(knowledge_bases::SearchKnowledgeBase),
        Arc::new(knowledge_bases::DeleteKnowledgeBase),
        Arc::new(workflows::ListWorkflows),
        Arc::new(workflows::GetWorkflow),
        Arc::new(workflows::CreateWorkflow),
        Arc::new(workflows::UpdateWorkflow),
        Arc::new(workflows::DeleteWorkflow),
        Arc::new(mcp_servers::ListMcpServers),
        Arc::new(mcp_servers::RegisterMcpServer),
        Arc::new(mcp_servers::GetMcpServerTools),
        Arc::new(mcp_servers::UnregisterMcpServer),
        Arc::new(passthrough::RelevanceApiCall),
    ];
    Vec::from(tools)
}

/// Decode a tool's typed parameters from its `arguments` object.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, AppError> {
    serde_json::from_value(args).map_err(|e| AppError::invalid_arguments(tool, e))
}

/// Rejects anything left over once path identifiers are taken out.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoFields {}

/// `limit`/`offset` query shared by every list tool. `null` means "use the default".
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl Page {
    pub fn to_query(&self) -> Value {
        serde_json::json!({"limit": self.limit.unwrap_or(50), "offset": self.offset.unwrap_or(0)})
    }
}

/// Remove the path identifier `field` from `args`, leaving the remaining
/// fields for the tool's body struct. Strings and integers are accepted.
pub fn take_id(tool: &str, args: &mut Value, field: &'static str) -> Result<String, AppError> {
    let map = args
        .as_object_mut()
        .ok_or_else(|| AppError::invalid_arguments(tool, "arguments must be an object"))?;
    match map.remove(field) {
        None | Some(Value::Null) => Err(AppError::invalid_arguments(tool, format!("missing field `{field}`"))),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(AppError::invalid_arguments(tool, format!("`{field}` must not be empty")))
        }
        Some(Value::String(s)) if !is_path_segment(&s) => Err(AppError::invalid_arguments(
            tool,
            format!("`{field}` must be a single path segment, got {s:?}"),
        )),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(AppError::invalid_arguments(
            tool,
            format!("`{field}` must be a string, got {other}"),
        )),
    }
}

/// An identifier may not climb out of, or append to, the endpoint it is placed in.
fn is_path_segment(id: &str) -> bool {
    id != "." && id != ".." && !id.contains(['/', '\\', '?', '#'])
}

/// Falsy optionals (empty strings, `false`, `0`, empty collections) are left
/// out of request bodies just like absent ones.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

pub fn drop_blank_str(field: &mut Option<String>) {
    if field.as_deref().is_some_and(str::is_empty) {
        *field = None;
    }
}

pub fn drop_blank(field: &mut Option<Value>) {
    if field.as_ref().is_some_and(is_blank) {
        *field = None;
    }
}

/// Supplied description, or `"{kind} created via MCP: {name}"` style fallback.
pub fn description_or(description: Option<String>, fallback: impl FnOnce() -> String) -> String {
    description.filter(|d| !d.is_empty()).unwrap_or_else(fallback)
}

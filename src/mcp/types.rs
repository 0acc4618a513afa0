use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `/mcp` response body: `{"result": ...}` or `{"error": "..."}`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Result(Value),
    Error(String),
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToolListing {
    pub tools: Vec<String>,
    pub tool_info: BTreeMap<String, ToolInfo>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub tools: Vec<String>,
    pub documentation: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

use crate::{errors::AppError, upstream::RelevanceClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub type DynTool = Arc<dyn Tool + Send + Sync + 'static>;

/// A named operation exposed through `/mcp`.
#[async_trait]
pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// `args` is always a JSON object.
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError>;
}

/// Immutable name -> tool table. Registration order is the listing order.
#[derive(Clone)]
pub struct ToolRegistry {
    client: Arc<RelevanceClient>,
    tools: Vec<(String, DynTool)>,
}

impl ToolRegistry {
    pub fn new(client: RelevanceClient) -> Self {
        let tools = crate::tools::all()
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Self { client: Arc::new(client), tools }
    }

    pub fn get(&self, name: &str) -> Option<DynTool> { self.tools.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone()) }
    pub fn list_names(&self) -> Vec<String> { self.tools.iter().map(|(n, _)| n.clone()).collect() }
    pub fn iter(&self) -> impl Iterator<Item = &DynTool> { self.tools.iter().map(|(_, t)| t) }
    pub fn len(&self) -> usize { self.tools.len() }
    pub fn client(&self) -> &RelevanceClient { &self.client }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn names_are_unique_and_complete() {
        let client = RelevanceClient::new(None, "http://localhost", Duration::from_secs(1)).unwrap();
        let registry = ToolRegistry::new(client);
        let names = registry.list_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(registry.len(), 21);
        for expected in [
            "list_agents", "get_agent", "create_agent", "update_agent", "delete_agent",
            "list_knowledge_bases", "get_knowledge_base", "create_knowledge_base",
            "add_document_to_kb", "search_knowledge_base", "delete_knowledge_base",
            "list_workflows", "get_workflow", "create_workflow", "update_workflow", "delete_workflow",
            "list_mcp_servers", "register_mcp_server", "get_mcp_server_tools", "unregister_mcp_server",
            "relevance_api_call",
        ] {
            assert!(registry.get(expected).is_some(), "{expected} missing");
        }
        assert!(registry.get("List_Agents").is_none());
    }
}

use crate::{
    errors::AppError,
    mcp::registry::Tool,
    tools::{description_or, drop_blank, drop_blank_str, parse_args, take_id, NoFields, Page},
    upstream::RelevanceClient,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent body sent on create and update. Unset or blank fields are left out entirely.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_bases: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AgentFields {
    fn drop_blanks(&mut self) {
        drop_blank_str(&mut self.name);
        drop_blank_str(&mut self.description);
        drop_blank_str(&mut self.system_prompt);
        drop_blank(&mut self.tools);
        drop_blank(&mut self.knowledge_bases);
        drop_blank_str(&mut self.model);
    }
}

pub struct ListAgents;

#[async_trait]
impl Tool for ListAgents {
    fn name(&self) -> &'static str { "list_agents" }
    fn description(&self) -> &'static str { "List all agents in your Relevance AI workspace" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let page: Page = parse_args(self.name(), args)?;
        Ok(client.get_with_query("agents", &page.to_query()).await?)
    }
}

pub struct GetAgent;

#[async_trait]
impl Tool for GetAgent {
    fn name(&self) -> &'static str { "get_agent" }
    fn description(&self) -> &'static str { "Get details of a specific agent by ID" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "agent_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.get(&format!("agents/{id}")).await?)
    }
}

pub struct CreateAgent;

#[async_trait]
impl Tool for CreateAgent {
    fn name(&self) -> &'static str { "create_agent" }
    fn description(&self) -> &'static str { "Create a new agent in Relevance AI" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let mut fields: AgentFields = parse_args(self.name(), args)?;
        let Some(name) = fields.name.clone() else {
            return Err(AppError::invalid_arguments(self.name(), "missing field `name`"));
        };
        fields.drop_blanks();
        fields.name = Some(name.clone());
        fields.description = Some(description_or(fields.description.take(), || {
            format!("Agent created via MCP: {name}")
        }));
        Ok(client.post("agents", &fields).await?)
    }
}

pub struct UpdateAgent;

#[async_trait]
impl Tool for UpdateAgent {
    fn name(&self) -> &'static str { "update_agent" }
    fn description(&self) -> &'static str { "Update an existing agent in Relevance AI" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "agent_id")?;
        let mut fields: AgentFields = parse_args(self.name(), args)?;
        fields.drop_blanks();
        Ok(client.put(&format!("agents/{id}"), &fields).await?)
    }
}

pub struct DeleteAgent;

#[async_trait]
impl Tool for DeleteAgent {
    fn name(&self) -> &'static str { "delete_agent" }
    fn description(&self) -> &'static str { "Delete an agent from Relevance AI" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "agent_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.delete(&format!("agents/{id}")).await?)
    }
}

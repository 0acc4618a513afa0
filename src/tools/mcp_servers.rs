use crate::{
    errors::AppError,
    mcp::registry::Tool,
    tools::{description_or, drop_blank_str, parse_args, take_id, NoFields, Page},
    upstream::RelevanceClient,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RegisterArgs {
    name: String,
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

pub struct ListMcpServers;

#[async_trait]
impl Tool for ListMcpServers {
    fn name(&self) -> &'static str { "list_mcp_servers" }
    fn description(&self) -> &'static str { "List all registered MCP servers in your Relevance AI workspace" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let page: Page = parse_args(self.name(), args)?;
        Ok(client.get_with_query("mcp-servers", &page.to_query()).await?)
    }
}

pub struct RegisterMcpServer;

#[async_trait]
impl Tool for RegisterMcpServer {
    fn name(&self) -> &'static str { "register_mcp_server" }
    fn description(&self) -> &'static str { "Register a new MCP server with Relevance AI" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let mut body: RegisterArgs = parse_args(self.name(), args)?;
        drop_blank_str(&mut body.auth_type);
        drop_blank_str(&mut body.auth_token);
        let name = body.name.clone();
        body.description = Some(description_or(body.description.take(), || {
            format!("MCP server registered via MCP: {name}")
        }));
        Ok(client.post("mcp-servers", &body).await?)
    }
}

pub struct GetMcpServerTools;

#[async_trait]
impl Tool for GetMcpServerTools {
    fn name(&self) -> &'static str { "get_mcp_server_tools" }
    fn description(&self) -> &'static str { "Get all tools available on a registered MCP server" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "server_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.get(&format!("mcp-servers/{id}/tools")).await?)
    }
}

pub struct UnregisterMcpServer;

#[async_trait]
impl Tool for UnregisterMcpServer {
    fn name(&self) -> &'static str { "unregister_mcp_server" }
    fn description(&self) -> &'static str { "Unregister an MCP server from Relevance AI" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "server_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.delete(&format!("mcp-servers/{id}")).await?)
    }
}

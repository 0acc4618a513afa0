use crate::{
    errors::AppError,
    mcp::registry::Tool,
    tools::{description_or, drop_blank, drop_blank_str, parse_args, take_id, NoFields, Page},
    upstream::RelevanceClient,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct WorkflowFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<Value>,
}

impl WorkflowFields {
    fn drop_blanks(&mut self) {
        drop_blank_str(&mut self.name);
        drop_blank_str(&mut self.description);
        drop_blank(&mut self.steps);
    }
}

pub struct ListWorkflows;

#[async_trait]
impl Tool for ListWorkflows {
    fn name(&self) -> &'static str { "list_workflows" }
    fn description(&self) -> &'static str { "List all workflows in your Relevance AI workspace" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let page: Page = parse_args(self.name(), args)?;
        Ok(client.get_with_query("workflows", &page.to_query()).await?)
    }
}

pub struct GetWorkflow;

#[async_trait]
impl Tool for GetWorkflow {
    fn name(&self) -> &'static str { "get_workflow" }
    fn description(&self) -> &'static str { "Get details of a specific workflow by ID" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "workflow_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.get(&format!("workflows/{id}")).await?)
    }
}

pub struct CreateWorkflow;

#[async_trait]
impl Tool for CreateWorkflow {
    fn name(&self) -> &'static str { "create_workflow" }
    fn description(&self) -> &'static str { "Create a new workflow in Relevance AI" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let mut fields: WorkflowFields = parse_args(self.name(), args)?;
        let Some(name) = fields.name.clone() else {
            return Err(AppError::invalid_arguments(self.name(), "missing field `name`"));
        };
        fields.drop_blanks();
        fields.name = Some(name.clone());
        fields.description = Some(description_or(fields.description.take(), || {
            format!("Workflow created via MCP: {name}")
        }));
        Ok(client.post("workflows", &fields).await?)
    }
}

pub struct UpdateWorkflow;

#[async_trait]
impl Tool for UpdateWorkflow {
    fn name(&self) -> &'static str { "update_workflow" }
    fn description(&self) -> &'static str { "Update an existing workflow in Relevance AI" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "workflow_id")?;
        let mut fields: WorkflowFields = parse_args(self.name(), args)?;
        fields.drop_blanks();
        Ok(client.put(&format!("workflows/{id}"), &fields).await?)
    }
}

pub struct DeleteWorkflow;

#[async_trait]
impl Tool for DeleteWorkflow {
    fn name(&self) -> &'static str { "delete_workflow" }
    fn description(&self) -> &'static str { "Delete a workflow from Relevance AI" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "workflow_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.delete(&format!("workflows/{id}")).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::client_for;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_includes_steps_when_given() {
        let server = MockServer::start().await;
        let steps = json!([{"type": "llm", "prompt": "summarise"}]);
        Mock::given(method("POST"))
            .and(path("/workflows"))
            .and(body_json(json!({
                "name": "digest",
                "description": "Workflow created via MCP: digest",
                "steps": steps.clone()
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "w1"})))
            .expect(1)
            .mount(&server)
            .await;

        CreateWorkflow
            .call(&client_for(&server), json!({"name": "digest", "steps": steps}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_with_no_fields_sends_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/workflows/w1"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "w1"})))
            .expect(1)
            .mount(&server)
            .await;

        UpdateWorkflow.call(&client_for(&server), json!({"workflow_id": "w1"})).await.unwrap();
    }

    #[tokio::test]
    async fn update_with_only_blank_fields_sends_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/workflows/w1"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "w1"})))
            .expect(1)
            .mount(&server)
            .await;

        UpdateWorkflow
            .call(&client_for(&server), json!({"workflow_id": "w1", "name": "", "steps": []}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_requires_id() {
        let server = MockServer::start().await;
        let err = DeleteWorkflow.call(&client_for(&server), json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments for 'delete_workflow': missing field `workflow_id`");
    }
}

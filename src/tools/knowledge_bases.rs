use crate::{
    errors::AppError,
    mcp::registry::Tool,
    tools::{description_or, drop_blank_str, parse_args, take_id, NoFields, Page},
    upstream::RelevanceClient,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct CreateKnowledgeBaseArgs {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedding_model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddDocumentArgs {
    document: Value,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    limit: Option<u64>,
}

pub struct ListKnowledgeBases;

#[async_trait]
impl Tool for ListKnowledgeBases {
    fn name(&self) -> &'static str { "list_knowledge_bases" }
    fn description(&self) -> &'static str { "List all knowledge bases in your Relevance AI workspace" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let page: Page = parse_args(self.name(), args)?;
        Ok(client.get_with_query("knowledge-bases", &page.to_query()).await?)
    }
}

pub struct GetKnowledgeBase;

#[async_trait]
impl Tool for GetKnowledgeBase {
    fn name(&self) -> &'static str { "get_knowledge_base" }
    fn description(&self) -> &'static str { "Get details of a specific knowledge base by ID" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "kb_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.get(&format!("knowledge-bases/{id}")).await?)
    }
}

pub struct CreateKnowledgeBase;

#[async_trait]
impl Tool for CreateKnowledgeBase {
    fn name(&self) -> &'static str { "create_knowledge_base" }
    fn description(&self) -> &'static str { "Create a new knowledge base in Relevance AI" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let mut body: CreateKnowledgeBaseArgs = parse_args(self.name(), args)?;
        drop_blank_str(&mut body.embedding_model);
        let name = body.name.clone();
        body.description = Some(description_or(body.description.take(), || {
            format!("Knowledge base created via MCP: {name}")
        }));
        Ok(client.post("knowledge-bases", &body).await?)
    }
}

pub struct AddDocumentToKb;

#[async_trait]
impl Tool for AddDocumentToKb {
    fn name(&self) -> &'static str { "add_document_to_kb" }
    fn description(&self) -> &'static str { "Add a document to a knowledge base" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "kb_id")?;
        let AddDocumentArgs { document, metadata } = parse_args(self.name(), args)?;
        let body = json!({
            "document": document,
            "metadata": metadata.unwrap_or_else(|| json!({})),
        });
        Ok(client.post(&format!("knowledge-bases/{id}/documents"), &body).await?)
    }
}

pub struct SearchKnowledgeBase;

#[async_trait]
impl Tool for SearchKnowledgeBase {
    fn name(&self) -> &'static str { "search_knowledge_base" }
    fn description(&self) -> &'static str { "Search a knowledge base with a query" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "kb_id")?;
        let SearchArgs { query, limit } = parse_args(self.name(), args)?;
        let body = json!({"query": query, "limit": limit.unwrap_or(10)});
        Ok(client.post(&format!("knowledge-bases/{id}/search"), &body).await?)
    }
}

pub struct DeleteKnowledgeBase;

#[async_trait]
impl Tool for DeleteKnowledgeBase {
    fn name(&self) -> &'static str { "delete_knowledge_base" }
    fn description(&self) -> &'static str { "Delete a knowledge base from Relevance AI" }
    async fn call(&self, client: &RelevanceClient, mut args: Value) -> Result<Value, AppError> {
        let id = take_id(self.name(), &mut args, "kb_id")?;
        parse_args::<NoFields>(self.name(), args)?;
        Ok(client.delete(&format!("knowledge-bases/{id}")).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::client_for;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_defaults_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge-bases"))
            .and(body_json(json!({"name": "docs", "description": "Knowledge base created via MCP: docs"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "kb1"})))
            .expect(1)
            .mount(&server)
            .await;

        CreateKnowledgeBase.call(&client_for(&server), json!({"name": "docs"})).await.unwrap();
    }

    #[tokio::test]
    async fn add_document_always_sends_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge-bases/kb1/documents"))
            .and(body_json(json!({"document": "hello world", "metadata": {}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "d1"})))
            .expect(1)
            .mount(&server)
            .await;

        AddDocumentToKb
            .call(&client_for(&server), json!({"kb_id": "kb1", "document": "hello world"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_document_requires_document() {
        let server = MockServer::start().await;
        let err = AddDocumentToKb.call(&client_for(&server), json!({"kb_id": "kb1"})).await.unwrap_err();
        assert!(err.to_string().contains("missing field `document`"));
    }

    #[tokio::test]
    async fn search_defaults_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge-bases/kb1/search"))
            .and(body_json(json!({"query": "pricing", "limit": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let out = SearchKnowledgeBase
            .call(&client_for(&server), json!({"kb_id": "kb1", "query": "pricing"}))
            .await
            .unwrap();
        assert_eq!(out, json!({"results": []}));
    }

    #[tokio::test]
    async fn search_null_limit_uses_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge-bases/kb1/search"))
            .and(body_json(json!({"query": "pricing", "limit": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        SearchKnowledgeBase
            .call(&client_for(&server), json!({"kb_id": "kb1", "query": "pricing", "limit": null}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_leaves_out_empty_embedding_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge-bases"))
            .and(body_json(json!({"name": "docs", "description": "mine"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "kb2"})))
            .expect(1)
            .mount(&server)
            .await;

        CreateKnowledgeBase
            .call(&client_for(&server), json!({"name": "docs", "description": "mine", "embedding_model": ""}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_and_delete_embed_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knowledge-bases/kb1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "kb1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/knowledge-bases/kb1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        GetKnowledgeBase.call(&client, json!({"kb_id": "kb1"})).await.unwrap();
        assert_eq!(DeleteKnowledgeBase.call(&client, json!({"kb_id": "kb1"})).await.unwrap(), Value::Null);
    }
}

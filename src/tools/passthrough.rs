use crate::{
    errors::AppError,
    mcp::registry::Tool,
    tools::parse_args,
    upstream::RelevanceClient,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiCallArgs {
    method: String,
    endpoint: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    params: Option<Value>,
}

/// Raw access to any endpoint of the upstream API.
pub struct RelevanceApiCall;

#[async_trait]
impl Tool for RelevanceApiCall {
    fn name(&self) -> &'static str { "relevance_api_call" }
    fn description(&self) -> &'static str { "Make a direct call to any Relevance AI API endpoint" }
    async fn call(&self, client: &RelevanceClient, args: Value) -> Result<Value, AppError> {
        let args: ApiCallArgs = parse_args(self.name(), args)?;
        Ok(client
            .call(&args.method, &args.endpoint, args.data.as_ref(), args.params.as_ref())
            .await?)
    }
}

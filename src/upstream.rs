//! Outbound client for the Relevance AI REST API.
//!
//! Every call is a single attempt. Failures are folded into [`UpstreamError`],
//! whose `Display` text is what callers of `/mcp` see.

use crate::config::{Config, API_KEY_VAR};
use reqwest::{header, Client as HttpClient, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("RELEVANCE_API_KEY environment variable is not set")]
    MissingApiKey,
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Invalid JSON in upstream response: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Method {
    type Err = UpstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(UpstreamError::UnsupportedMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceClient {
    api_key: Option<String>,
    base_url: String,
    http: HttpClient,
}

impl RelevanceClient {
    pub fn new(api_key: Option<String>, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Self::new(
            cfg.upstream.api_key.clone(),
            &cfg.upstream.base_url,
            Duration::from_secs(cfg.upstream.timeout_s),
        )
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, UpstreamError> {
        let req = self.request(Method::Get, endpoint)?;
        self.execute(req).await
    }

    pub async fn get_with_query(&self, endpoint: &str, query: &Value) -> Result<Value, UpstreamError> {
        let req = self.request(Method::Get, endpoint)?.query(&query_pairs(query));
        self.execute(req).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value, UpstreamError> {
        let req = self.request(Method::Post, endpoint)?.json(body);
        self.execute(req).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value, UpstreamError> {
        let req = self.request(Method::Put, endpoint)?.json(body);
        self.execute(req).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, UpstreamError> {
        let req = self.request(Method::Delete, endpoint)?;
        self.execute(req).await
    }

    /// Generic call: GET takes `params` as query, POST/PUT take `data` as body,
    /// DELETE sends neither. A missing key is reported before a bad method.
    pub async fn call(
        &self,
        method: &str,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        self.require_key(method, endpoint)?;
        let method: Method = method.parse()?;
        let mut req = self.request(method, endpoint)?;
        match (method, data, params) {
            (Method::Get, _, Some(q)) => req = req.query(&query_pairs(q)),
            (Method::Post | Method::Put, Some(body), _) => req = req.json(body),
            _ => {}
        }
        self.execute(req).await
    }

    fn require_key(&self, method: &str, endpoint: &str) -> Result<&str, UpstreamError> {
        self.api_key.as_deref().ok_or_else(|| {
            error!(method, endpoint, var = API_KEY_VAR, "Attempted Relevance AI API call without API key configured");
            UpstreamError::MissingApiKey
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, UpstreamError> {
        let key = self.require_key(method.as_str(), endpoint)?;
        info!(method = %method, endpoint, "Making {method} request to {endpoint}");
        let url = self.url(endpoint);
        let builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        Ok(builder
            .bearer_auth(key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json"))
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Value, UpstreamError> {
        let response = req.send().await.map_err(|e| {
            warn!(error = %e, "relevance api transport error");
            UpstreamError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let fallback = response
                .error_for_status_ref()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("HTTP status {status}"));
            let status = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body).unwrap_or(fallback);
            error!(status, error = %message, "Relevance AI API error");
            return Err(UpstreamError::Status { status, message });
        }

        let bytes = response.bytes().await.map_err(|e| {
            warn!(error = %e, "failed reading relevance api response");
            UpstreamError::Transport(e.to_string())
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, "relevance api returned non-json body");
            UpstreamError::InvalidJson(e.to_string())
        })
    }
}

/// `{"error": {"message": ...}}` from an upstream error body, if present.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    })
}

fn query_pairs(query: &Value) -> Vec<(String, String)> {
    let Some(map) = query.as_object() else { return Vec::new() };
    map.iter()
        .filter_map(|(k, v)| {
            let rendered = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((k.clone(), rendered))
        })
        .collect()
}

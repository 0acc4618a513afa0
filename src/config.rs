use anyhow::Context;
use axum::http::HeaderValue;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const API_KEY_VAR: &str = "RELEVANCE_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.relevanceai.com/v1";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub upstream: Upstream,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}
fn default_bind_addr() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

impl Default for Server {
    fn default() -> Self { Self { bind_addr: default_bind_addr(), port: default_port() } }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Upstream {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
}
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_timeout_s() -> u64 { 30 }

impl Default for Upstream {
    fn default() -> Self {
        Self { api_key: None, base_url: default_base_url(), timeout_s: default_timeout_s() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    /// Static token required on `POST /mcp` when set.
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}
fn default_origins() -> Vec<String> { vec!["*".to_string()] }

impl Default for Auth {
    fn default() -> Self { Self { bearer_token: None, allowed_origins: default_origins() } }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    #[serde(default = "default_max_request_kb")]
    pub max_request_kb: usize,
}
fn default_max_request_kb() -> usize { 1024 }

impl Default for Limits {
    fn default() -> Self { Self { max_request_kb: default_max_request_kb() } }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// File settings (if any) overlaid with the process environment.
    pub fn from_sources(path: Option<&Path>) -> anyhow::Result<Self> {
        let base = match path {
            Some(p) => Self::load(p).with_context(|| format!("reading {}", p.display()))?,
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())
    }

    pub fn with_env<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        self.upstream.api_key = var(API_KEY_VAR).or(self.upstream.api_key.take().filter(|k| !k.trim().is_empty()));
        if let Some(url) = var("RELEVANCE_API_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(raw) = var("REQUEST_TIMEOUT_SECS") {
            self.upstream.timeout_s = raw
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS must be an integer, got {raw:?}"))?;
        }
        if let Some(addr) = var("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(raw) = var("PORT") {
            self.server.port = raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?;
        }
        if let Some(raw) = var("CORS_ORIGINS") {
            self.auth.allowed_origins = parse_origins(&raw);
        }
        if let Some(token) = var("MCP_BEARER_TOKEN") {
            self.auth.bearer_token = Some(token);
        }
        if let Some(raw) = var("MAX_REQUEST_KB") {
            self.limits.max_request_kb = raw
                .parse()
                .with_context(|| format!("MAX_REQUEST_KB must be an integer, got {raw:?}"))?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.upstream.base_url)
            .with_context(|| format!("invalid base_url: {}", self.upstream.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("base_url must be http or https: {}", self.upstream.base_url);
        }
        if self.upstream.timeout_s == 0 { anyhow::bail!("timeout_s must be > 0"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.auth.allowed_origins.is_empty() { anyhow::bail!("allowed_origins must not be empty"); }
        if let Some(token) = &self.auth.bearer_token {
            if token.trim().is_empty() { anyhow::bail!("bearer_token must not be empty when set"); }
        }
        for origin in self.auth.allowed_origins.iter().filter(|o| o.as_str() != "*") {
            HeaderValue::from_str(origin).with_context(|| format!("invalid CORS origin: {origin:?}"))?;
        }
        Ok(())
    }

    pub fn allows_any_origin(&self) -> bool {
        self.auth.allowed_origins.iter().any(|o| o == "*")
    }

    /// First four characters of the API key, for startup logs.
    pub fn api_key_hint(&self) -> Option<String> {
        self.upstream
            .api_key
            .as_deref()
            .map(|k| format!("{}****", k.chars().take(4).collect::<String>()))
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() { default_origins() } else { origins }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = Config::default().with_env(env(&[])).unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.bind_addr, "0.0.0.0");
        assert_eq!(cfg.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.upstream.api_key, None);
        assert_eq!(cfg.auth.allowed_origins, vec!["*"]);
        assert!(cfg.allows_any_origin());
        cfg.validate().unwrap();
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = Config::default()
            .with_env(env(&[
                ("RELEVANCE_API_KEY", "sk-abcdef"),
                ("RELEVANCE_API_BASE_URL", "http://localhost:9000/v2"),
                ("PORT", "9100"),
                ("CORS_ORIGINS", "https://a.example, https://b.example ,"),
                ("REQUEST_TIMEOUT_SECS", "5"),
            ]))
            .unwrap();
        assert_eq!(cfg.upstream.api_key.as_deref(), Some("sk-abcdef"));
        assert_eq!(cfg.upstream.base_url, "http://localhost:9000/v2");
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.upstream.timeout_s, 5);
        assert_eq!(cfg.auth.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!cfg.allows_any_origin());
        assert_eq!(cfg.api_key_hint().as_deref(), Some("sk-a****"));
    }

    #[test]
    fn empty_api_key_counts_as_unset() {
        let cfg = Config::default().with_env(env(&[("RELEVANCE_API_KEY", "  ")])).unwrap();
        assert_eq!(cfg.upstream.api_key, None);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::default().with_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.upstream.base_url = "not a url".into();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.upstream.timeout_s = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.auth.allowed_origins = vec!["bad\norigin".into()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn file_is_base_layer_for_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 7000\n\n[upstream]\nbase_url = \"http://file.example/v1\"\ntimeout_s = 12\n"
        )
        .unwrap();
        let cfg = Config::load(file.path()).unwrap().with_env(env(&[("PORT", "7001")])).unwrap();
        assert_eq!(cfg.server.port, 7001);
        assert_eq!(cfg.upstream.base_url, "http://file.example/v1");
        assert_eq!(cfg.upstream.timeout_s, 12);
        assert_eq!(cfg.limits.max_request_kb, 1024);
    }

    #[test]
    fn blank_origin_list_falls_back_to_any() {
        assert_eq!(parse_origins(" , "), vec!["*"]);
    }
}

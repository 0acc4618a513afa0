mod config;
mod errors;
mod logging;
mod mcp;
mod security;
mod server;
mod tools;
mod upstream;


use crate::config::Config;
use anyhow::Context;
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = Some(PathBuf::from(&args[i]));
            }
            other => warn!(arg = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    let cfg = Config::from_sources(config_path.as_deref()).context("loading config")?;
    cfg.validate().context("validating config")?;

    match cfg.api_key_hint() {
        Some(hint) => info!(key = %hint, "Relevance AI API key detected"),
        None => warn!("{} environment variable is not set", config::API_KEY_VAR),
    }

    let client = upstream::RelevanceClient::from_config(&cfg).context("building http client")?;
    let registry = mcp::registry::ToolRegistry::new(client);

    info!(
        addr = %format!("{}:{}", cfg.server.bind_addr, cfg.server.port),
        base_url = %cfg.upstream.base_url,
        api_key_present = cfg.upstream.api_key.is_some(),
        cors_origins = ?cfg.auth.allowed_origins,
        inbound_auth = cfg.auth.bearer_token.is_some(),
        tool_count = registry.len(),
        tools = ?registry.list_names(),
        "{} ready",
        server::SERVICE_NAME
    );

    server::serve(cfg, registry).await
}

use std::env::{self, VarError};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use crate::error::{AppError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub perplexity_api_key: String,
    pub perplexity_base_url: String,
    pub perplexity_model: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        // Load Perplexity API key
        let perplexity_api_key = require_api_key(env::var("PERPLEXITY_API_KEY"))?;

        // Upstream endpoint and model
        let perplexity_base_url = env::var("PERPLEXITY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let perplexity_model = env::var("PERPLEXITY_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        // Load server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let server_addr = parse_server_addr(&host, &port)?;

        Ok(Config {
            server_addr,
            perplexity_api_key,
            perplexity_base_url,
            perplexity_model,
        })
    }
}

fn require_api_key(raw: std::result::Result<String, VarError>) -> Result<String> {
    let key = raw?;
    if key.trim().is_empty() {
        return Err(AppError::ConfigError("PERPLEXITY_API_KEY is empty".to_string()));
    }
    Ok(key)
}

fn parse_server_addr(host: &str, port: &str) -> Result<SocketAddr> {
    let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
    let ip = IpAddr::from_str(host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
    Ok(SocketAddr::new(ip, port))
}

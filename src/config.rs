//! Configuration is collected once from the environment and passed
//! down explicitly; nothing below main reads env vars on its own.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    /// Base URL the dashboard client talks to.
    pub api_url: String,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://nonna.db".to_string());
        let listen_addr = env::var("NONNA_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .context("NONNA_ADDR must be host:port")?;
        let api_url =
            env::var("NONNA_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

        let openai = OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            timeout_secs: env::var("PARSER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        Ok(Self { database_url, listen_addr, api_url, openai })
    }
}

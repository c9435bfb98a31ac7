use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::llm::ModelTable;

/// Full application configuration. Values come from the environment with a
/// `.env` overlay; only the JWT secret is required.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub bind: String,
    pub port: u16,

    // LLM backend
    /// "openai" (default) or "scripted" (canned responses, for development).
    pub llm_backend: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub fast_model: String,
    pub reasoning_model: String,
    pub default_model: String,
    pub llm_timeout_secs: u64,

    // HTTP surface
    pub jwt_secret: String,
    pub max_upload_bytes: u64,
}

fn parse_dotenv() -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return map;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}

fn get(key: &str, dotenv: &HashMap<String, String>) -> Option<String> {
    std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
}

fn get_str(key: &str, dotenv: &HashMap<String, String>, default: &str) -> String {
    get(key, dotenv).unwrap_or_else(|| default.to_string())
}

fn get_u16(key: &str, dotenv: &HashMap<String, String>, default: u16) -> u16 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_u64(key: &str, dotenv: &HashMap<String, String>, default: u64) -> u64 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dotenv = parse_dotenv();

        let jwt_secret = get("COLD_JWT_SECRET", &dotenv)
            .filter(|s| !s.is_empty())
            .context("COLD_JWT_SECRET is not set")?;

        let llm_backend = get_str("COLD_LLM_BACKEND", &dotenv, "openai");
        let openai_api_key = get_str("OPENAI_API_KEY", &dotenv, "");
        if llm_backend != "scripted" && openai_api_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY is not set (required unless COLD_LLM_BACKEND=scripted)");
        }

        Ok(Config {
            db_path: get_str("COLD_DB_PATH", &dotenv, "cold.db"),
            bind: get_str("COLD_BIND", &dotenv, "127.0.0.1"),
            port: get_u16("COLD_PORT", &dotenv, 8090),
            llm_backend,
            openai_api_key,
            openai_base_url: get_str("OPENAI_BASE_URL", &dotenv, "https://api.openai.com/v1"),
            fast_model: get_str("COLD_FAST_MODEL", &dotenv, "gpt-4o-mini"),
            reasoning_model: get_str("COLD_REASONING_MODEL", &dotenv, "o4-mini"),
            default_model: get_str("COLD_DEFAULT_MODEL", &dotenv, "gpt-4o"),
            llm_timeout_secs: get_u64("COLD_LLM_TIMEOUT_SECS", &dotenv, 120),
            jwt_secret,
            max_upload_bytes: get_u64("COLD_MAX_UPLOAD_BYTES", &dotenv, 10 * 1024 * 1024),
        })
    }

    pub fn models(&self) -> ModelTable {
        ModelTable {
            fast: self.fast_model.clone(),
            reasoning: self.reasoning_model.clone(),
            default: self.default_model.clone(),
        }
    }
}

//! Process settings from environment variables (after `.env` is loaded by the binary).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Connection string value selecting the in-process store.
pub const MEMORY_STORE: &str = "memory";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres { url: String },
}

#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Schema holding the Modules, Topics and Cards tables.
    pub schema: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub body_limit: usize,
}

#[derive(Clone, Debug)]
pub struct GenerationSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub prompts_dir: PathBuf,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub storage: StorageSettings,
    pub server: ServerSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let connection = get("STORAGE_CONNECTION_STRING").ok_or(ConfigError::Missing("STORAGE_CONNECTION_STRING"))?;
        let backend = if connection.eq_ignore_ascii_case(MEMORY_STORE) {
            StorageBackend::Memory
        } else {
            StorageBackend::Postgres { url: connection }
        };

        Ok(Settings {
            storage: StorageSettings {
                backend,
                schema: get("TABLE_SCHEMA").unwrap_or_else(|| "vocard".into()),
                max_connections: parse_or(get("STORE_MAX_CONNECTIONS"), "STORE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerSettings {
                bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
                body_limit: parse_or(get("REQUEST_BODY_LIMIT"), "REQUEST_BODY_LIMIT", 1024 * 1024)?,
            },
            generation: GenerationSettings {
                api_key: get("OPENAI_API_KEY"),
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".into())
                    .trim_end_matches('/')
                    .to_string(),
                model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".into()),
                prompts_dir: get("PROMPTS_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("prompts")),
                timeout: Duration::from_secs(parse_or(get("GENERATION_TIMEOUT_SECS"), "GENERATION_TIMEOUT_SECS", 60)?),
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(s) => s.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("{:?}: {}", s, e),
        }),
    }
}

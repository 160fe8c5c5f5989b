//! Environment-driven configuration shared by the NerdMath service and CLI.
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file. Every section has working defaults except the credentials,
//! which are only demanded by the code paths that need them.

use serde::Serialize;
use serde_json::{json, Value};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Hard ceiling for prerequisite traversal depth.
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MongoConfig {
    pub uri: Option<String>,
    pub database: String,
    pub timeout_ms: u64,
}

impl MongoConfig {
    pub fn require_uri(&self) -> ConfigResult<&str> {
        self.uri.as_deref().ok_or(ConfigError::Missing("MONGODB_URI"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Neo4jConfig {
    pub uri: Option<String>,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Neo4jConfig {
    pub fn is_configured(&self) -> bool {
        self.uri.is_some() && self.password.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub chat_model: String,
    pub comment_model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearningConfig {
    pub max_depth: u32,
    pub max_nodes: usize,
    pub max_recommended: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_nodes: 30,
            max_recommended: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataConfig {
    pub prompt_dir: PathBuf,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mongo: MongoConfig,
    pub neo4j: Neo4jConfig,
    pub openai: OpenAiConfig,
    pub learning: LearningConfig,
    pub data: DataConfig,
    #[serde(skip_serializing)]
    pub service_token: Option<String>,
}

impl AppConfig {
    /// Load `.env` (when present) and read the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load an explicit env file before reading the process environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        dotenv::from_path(path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(k));

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8000)?,
            environment: first(&["ENV_MODE", "ENVIRONMENT"])
                .unwrap_or_else(|| "development".to_string()),
        };

        let mongo = MongoConfig {
            uri: get("MONGODB_URI"),
            database: get("MONGODB_DB").unwrap_or_else(|| "nerdmath".to_string()),
            timeout_ms: parse_or(&get, "MONGODB_TIMEOUT_MS", 3000)?,
        };

        let neo4j = Neo4jConfig {
            uri: first(&["AURA_URI", "NEO4J_URI"]),
            user: first(&["AURA_USER", "NEO4J_USER"]).unwrap_or_else(|| "neo4j".to_string()),
            password: first(&["AURA_PASS", "NEO4J_PASSWORD"]),
        };

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            api_base: get("OPENAI_API_BASE"),
            chat_model: get("MODEL_CHAT").unwrap_or_else(|| "gpt-4o".to_string()),
            comment_model: get("MODEL_COMMENT").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        };

        let defaults = LearningConfig::default();
        let max_depth: u32 = parse_or(&get, "LEARNING_MAX_DEPTH", defaults.max_depth)?;
        let learning = LearningConfig {
            max_depth: max_depth.clamp(1, MAX_TRAVERSAL_DEPTH),
            max_nodes: parse_or(&get, "LEARNING_MAX_NODES", defaults.max_nodes)?.max(1),
            max_recommended: parse_or(&get, "LEARNING_MAX_RECOMMENDED", defaults.max_recommended)?
                .max(1),
        };

        let data = DataConfig {
            prompt_dir: PathBuf::from(get("PROMPT_DIR").unwrap_or_else(|| "prompts".to_string())),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
        };

        let config = Self {
            server,
            mongo,
            neo4j,
            openai,
            learning,
            data,
            service_token: get("SERVICE_TOKEN"),
        };

        tracing::debug!(
            environment = %config.server.environment,
            port = config.server.port,
            mongo_configured = config.mongo.uri.is_some(),
            neo4j_configured = config.neo4j.is_configured(),
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.server.environment.as_str(), "production" | "prod")
    }

    /// Configuration view that is safe to return over HTTP or print.
    pub fn redacted(&self) -> Value {
        json!({
            "environment": self.server.environment,
            "port": self.server.port,
            "mongodb": {
                "uri": self.mongo.uri.as_deref().map(mask_uri),
                "database": self.mongo.database,
            },
            "neo4j": {
                "uri": self.neo4j.uri,
                "user": self.neo4j.user,
                "password_set": self.neo4j.password.is_some(),
            },
            "openai": {
                "api_key": self.openai.api_key.as_deref().map(mask_secret),
                "chat_model": self.openai.chat_model,
                "comment_model": self.openai.comment_model,
            },
            "service_token_set": self.service_token.is_some(),
            "learning": self.learning,
            "data": self.data,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

/// Keep the first and last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Hide the password component of a connection string.
pub fn mask_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:****@{host}")
        }
        None => uri.to_string(),
    }
}

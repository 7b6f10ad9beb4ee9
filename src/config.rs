use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use teloxide::types::UserId;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    bot: BotSection,
    /// Every other top-level key is a per-module section, addressed by name.
    #[serde(flatten)]
    modules: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct BotSection {
    token: String,
    /// Command prefixes, e.g. [":", "::"]. The bot mention also works.
    prefix: Vec<String>,
    #[serde(default)]
    params: BotParams,
}

/// Session parameters merged into the bot at startup.
#[derive(Deserialize, Default)]
pub struct BotParams {
    /// Users allowed to run hidden commands (debug/eval).
    #[serde(default)]
    pub owner_ids: Vec<u64>,
    /// Custom Bot API server, e.g. a local telegram-bot-api instance.
    pub api_url: Option<String>,
}

pub struct Config {
    /// Path to the config file (also names the log file).
    pub config_path: PathBuf,
    pub token: String,
    /// Configured command prefixes, as written in the file.
    pub prefixes: Vec<String>,
    pub params: BotParams,
    modules: HashMap<String, serde_json::Value>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        if file.bot.token.is_empty() {
            return Err(ConfigError::Validation("bot.token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.bot.token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "bot.token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.bot.prefix.is_empty() {
            return Err(ConfigError::Validation("bot.prefix must contain at least one prefix".into()));
        }
        if file.bot.prefix.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Validation("bot.prefix entries must be non-empty".into()));
        }
        if let Some(ref api_url) = file.bot.params.api_url {
            url::Url::parse(api_url).map_err(|e| {
                ConfigError::Validation(format!("bot.params.api_url is not a valid URL: {}", e))
            })?;
        }

        Ok(Self {
            config_path,
            token: file.bot.token,
            prefixes: file.bot.prefix,
            params: file.bot.params,
            modules: file.modules,
        })
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.params.owner_ids.contains(&user_id.0)
    }

    /// Per-module config section, if the file has one.
    ///
    /// Modules deserialize their own section; an absent section means
    /// defaults.
    pub fn module(&self, name: &str) -> Option<&serde_json::Value> {
        self.modules.get(name)
    }
}

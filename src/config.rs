//! Bot configuration, read once at startup and shared read-only afterwards.
//!
//! Values come from a TOML file and can be overridden from the environment.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BotConfig {
    pub nickname: String,
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    /// Nickname that is granted `grant_mode` whenever it joins a channel.
    ///
    /// This is a plain string match on the claimed nickname and can be
    /// spoofed by anyone able to take that nick.
    #[serde(default)]
    pub trusted_identity: Option<String>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,
    #[serde(default = "default_grant_mode")]
    pub grant_mode: String,
    #[serde(default = "default_report_failures")]
    pub report_failures: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Limits {
    /// Lines routed concurrently.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Lines held while every routing slot is busy; further lines are dropped.
    #[serde(default = "default_backlog")]
    pub backlog: usize,
    /// Outbound lines buffered in front of the writer task.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            backlog: default_backlog(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

fn default_port() -> u16 {
    6667
}

fn default_command_prefix() -> char {
    '.'
}

fn default_grant_mode() -> String {
    "+o".to_string()
}

fn default_report_failures() -> bool {
    true
}

fn default_max_in_flight() -> usize {
    32
}

fn default_backlog() -> usize {
    256
}

fn default_outbound_queue() -> usize {
    64
}

impl Config {
    /// Load configuration from `path`, apply `IRCBOT_*` overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("IRCBOT_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("IRCBOT_SERVER_PORT") {
            self.server.port = val.parse().map_err(|_| ConfigError::Env {
                key: "IRCBOT_SERVER_PORT",
                value: val.clone(),
            })?;
        }
        if let Ok(val) = std::env::var("IRCBOT_NICKNAME") {
            self.bot.nickname = val;
        }
        if let Ok(val) = std::env::var("IRCBOT_CHANNELS") {
            self.bot.channels = val
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(val) = std::env::var("IRCBOT_TRUSTED_IDENTITY") {
            self.bot.trusted_identity = Some(val).filter(|v| !v.is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host is empty".into()));
        }
        if !is_protocol_word(&self.bot.nickname) {
            return Err(ConfigError::Invalid(format!(
                "bot.nickname {:?} must be a single word",
                self.bot.nickname
            )));
        }
        for channel in &self.bot.channels {
            if !channel.starts_with(['#', '&']) || !is_protocol_word(channel) {
                return Err(ConfigError::Invalid(format!(
                    "bot.channels entry {:?} is not a channel name",
                    channel
                )));
            }
        }
        if let Some(trusted) = &self.bot.trusted_identity {
            if !is_protocol_word(trusted) {
                return Err(ConfigError::Invalid(format!(
                    "bot.trusted_identity {:?} must be a single word",
                    trusted
                )));
            }
        }
        if self.bot.command_prefix.is_whitespace() || self.bot.command_prefix == ':' {
            return Err(ConfigError::Invalid(
                "bot.command_prefix must be a visible character".into(),
            ));
        }
        if !is_protocol_word(&self.bot.grant_mode) {
            return Err(ConfigError::Invalid(format!(
                "bot.grant_mode {:?} must be a single word",
                self.bot.grant_mode
            )));
        }
        if self.limits.max_in_flight == 0 || self.limits.outbound_queue == 0 {
            return Err(ConfigError::Invalid("limits must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn realname(&self) -> &str {
        self.bot.realname.as_deref().unwrap_or(&self.bot.nickname)
    }
}

fn is_protocol_word(s: &str) -> bool {
    !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '\0')
}

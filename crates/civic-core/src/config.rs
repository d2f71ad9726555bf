//! Configuration for the civic client
//!
//! Stored in `$XDG_CONFIG_HOME/civic/config.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "civic";
const CONFIG_FILE: &str = "config.toml";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the issue service API
    pub api_url: String,

    /// Bearer token for the current session
    pub token: Option<String>,

    /// Id of the signed-in user, used for verification gating
    pub user_id: Option<String>,

    /// Page size requested by list commands
    pub page_limit: u32,

    /// Per-request timeout applied by the HTTP gateway
    pub request_timeout_secs: u64,

    /// Drop late responses superseded by a newer read of the same kind
    pub discard_stale_responses: bool,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            token: None,
            user_id: None,
            page_limit: 20,
            request_timeout_secs: 30,
            discard_stale_responses: false,
            display: DisplayConfig::default(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Date format for display
    pub date_format: String,

    /// Maximum title length before truncation
    pub max_title_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            max_title_length: 60,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> crate::Result<PathBuf> {
        let base = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .ok_or_else(|| crate::Error::Config("Could not determine config directory".into()))?;
        Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Apply `CIVIC_API_URL`, `CIVIC_TOKEN` and `CIVIC_USER_ID`
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var("CIVIC_API_URL").ok(),
            std::env::var("CIVIC_TOKEN").ok(),
            std::env::var("CIVIC_USER_ID").ok(),
        )
    }

    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        token: Option<String>,
        user_id: Option<String>,
    ) -> Self {
        if let Some(url) = api_url.filter(|s| !s.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = token.filter(|s| !s.is_empty()) {
            self.token = Some(token);
        }
        if let Some(id) = user_id.filter(|s| !s.is_empty()) {
            self.user_id = Some(id);
        }
        self
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# civic client configuration

# Base URL of the issue service API
api_url = "http://localhost:5000/api"

# Session token (or set CIVIC_TOKEN)
# token = "..."

# Your user id, used to check whether you may verify an issue (or set CIVIC_USER_ID)
# user_id = "..."

# Page size for list commands
page_limit = 20

# Per-request timeout in seconds
request_timeout_secs = 30

# Ignore a list/detail response when a newer request of the same kind was sent
discard_stale_responses = false

[display]
# Use colors in output
colors = true

# Date format for display (strftime format)
date_format = "%Y-%m-%d %H:%M"

# Maximum title length before truncation
max_title_length = 60
"#
        .to_string()
    }
}

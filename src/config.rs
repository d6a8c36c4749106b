//! Runtime configuration, loadable from TOML.
//!
//! ```toml
//! in-test = false
//! default-language = "en"
//!
//! [boot]
//! variant = "augmented"
//! guest-message = "Guest session - please login"
//!
//! [csrf]
//! token-length = 56
//! header = "X-Frappe-CSRF-Token"
//!
//! [list]
//! default-page-length = 20
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::boot::BootVariant;
use crate::token::RandomHashGenerator;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has unexpected keys
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Skip forced session writes, as the framework does under its test runner
    pub in_test: bool,
    /// Language used when a request names none
    pub default_language: String,
    /// Boot endpoint settings
    pub boot: BootConfig,
    /// CSRF token settings
    pub csrf: CsrfConfig,
    /// Listing settings
    pub list: ListConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            in_test: false,
            default_language: "en".to_string(),
            boot: BootConfig::default(),
            csrf: CsrfConfig::default(),
            list: ListConfig::default(),
        }
    }
}

impl Config {
    /// Reads and parses a TOML file.
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// `[boot]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BootConfig {
    /// Endpoint revision to serve
    pub variant: BootVariant,
    /// `message` entry of the guest payload
    pub guest_message: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            variant: BootVariant::default(),
            guest_message: "Guest session - please login".to_string(),
        }
    }
}

/// `[csrf]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CsrfConfig {
    /// Hex characters per generated token
    pub token_length: usize,
    /// Request header carrying the token on state-changing requests
    pub header: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_length: RandomHashGenerator::DEFAULT_LENGTH,
            header: "X-Frappe-CSRF-Token".to_string(),
        }
    }
}

/// `[list]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ListConfig {
    /// Row cap for listings that do not ask for a specific limit
    pub default_page_length: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_length: 20,
        }
    }
}

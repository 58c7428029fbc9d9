// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path, ConfigLocation};
use crate::validation::ValidUrl;
use crate::yaml::load_yaml_with_env;
use alloy_primitives::{address, Address};
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};
use tracing::info;

pub const DEFAULT_CONFIG_NAME: &str = "efund.config.yaml";

/// Upper bound the relayer accepts for a decryption grant.
pub const MAX_VALIDITY_DAYS: u64 = 365;

pub const MAX_DECRYPT_ATTEMPTS: u32 = 10;

/// EIP-712 domain of the decryption verifier the relayer checks signatures against.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GatewayConfig {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: "Decryption".to_string(),
            version: "1".to_string(),
            chain_id: 55815,
            verifying_contract: address!("0x5D8BD78e2ea6bbE41f26dFe9fdaEAa349e077478"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RelayerConfig {
    pub url: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            url: "https://relayer.testnet.zama.cloud".to_string(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl RelayerConfig {
    pub fn url(&self) -> Result<ValidUrl> {
        self.url
            .parse()
            .with_context(|| format!("Invalid relayer url '{}'", self.url))
    }
}

/// How the client runs the user decryption protocol.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DecryptionConfig {
    /// Days a signed grant stays valid for.
    pub validity_days: u64,
    pub request_timeout_secs: u64,
    /// Attempts per decryption, each with a fresh keypair. At least one.
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for DecryptionConfig {
    fn default() -> Self {
        Self {
            validity_days: 7,
            request_timeout_secs: 30,
            max_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

impl DecryptionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContractsConfig {
    pub fund: Option<Address>,
    pub token: Option<Address>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenConfig {
    pub decimals: u8,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self { decimals: 6 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Chain the fund and token contracts live on.
    pub chain_id: u64,
    pub contracts: ContractsConfig,
    pub relayer: RelayerConfig,
    pub decryption: DecryptionConfig,
    pub token: TokenConfig,
    /// Default lifetime of an operator grant given to the fund.
    pub operator_window_secs: u64,
    pub log_level: String,
    /// The file this config was read from, if any.
    pub config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain_id: 11155111,
            contracts: ContractsConfig::default(),
            relayer: RelayerConfig::default(),
            decryption: DecryptionConfig::default(),
            token: TokenConfig::default(),
            operator_window_secs: 30 * 24 * 60 * 60,
            log_level: "info".to_string(),
            config_file: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.relayer.url()?;
        let days = self.decryption.validity_days;
        if days == 0 || days > MAX_VALIDITY_DAYS {
            bail!("decryption.validity_days must be between 1 and {MAX_VALIDITY_DAYS}, got {days}");
        }
        let attempts = self.decryption.max_attempts;
        if attempts == 0 || attempts > MAX_DECRYPT_ATTEMPTS {
            bail!("decryption.max_attempts must be between 1 and {MAX_DECRYPT_ATTEMPTS}, got {attempts}");
        }
        if self.decryption.request_timeout_secs == 0 {
            bail!("decryption.request_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn fund_address(&self) -> Result<Address> {
        self.contracts
            .fund
            .context("contracts.fund is not configured")
    }

    pub fn token_address(&self) -> Result<Address> {
        self.contracts
            .token
            .context("contracts.token is not configured")
    }
}

/// Values supplied by the caller that take precedence over the file.
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
    config_file: Option<PathBuf>,
}

/// Load the config from `config_file`, or from the nearest `efund.config.yaml`, falling back to
/// the OS config directory. A missing default file yields the built-in defaults.
pub fn load_config(config_file: Option<String>, log_level: Option<String>) -> Result<AppConfig> {
    let location = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir(),
        DEFAULT_CONFIG_NAME,
        config_file.map(PathBuf::from),
    );

    let yaml = match &location {
        ConfigLocation::Default(path) if !path.exists() => String::new(),
        other => load_yaml_with_env(other.path()).context("Configuration file not found")?,
    };

    info!("Using configuration {location}");
    let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Yaml::string(&yaml))
        .merge(Serialized::defaults(Overrides {
            log_level,
            config_file: Some(location.into_path()),
        }))
        .extract()
        .context("Could not parse configuration")?;

    config.validate()?;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("efund")
    }
}

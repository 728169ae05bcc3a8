//! # Bridge Configuration
//!
//! Loaded from YAML. Every field has a default, so a partial document is
//! valid:
//!
//! ```yaml
//! address: "0x00000000000000000000000000000000000b1d9e"
//! deposit_selector: "1285101517810983806491589552491143496277809242732141897358598292095611420389"
//! max_assets_per_message: 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xnft_core::{Address, Felt};

/// Selector of the deposit handler on the remote bridge.
pub const DEFAULT_DEPOSIT_SELECTOR: &str =
    "1285101517810983806491589552491143496277809242732141897358598292095611420389";

const DEFAULT_MAX_ASSETS: usize = 256;

/// Errors while loading a [`BridgeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// The path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid YAML for this schema.
    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field has an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// The controller's own ledger address.
    pub address: Address,
    /// Entry point on the remote bridge that handles deposits.
    pub deposit_selector: Felt,
    /// Largest asset list accepted by `deposit`.
    pub max_assets_per_message: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: Address::ZERO,
            deposit_selector: default_selector(),
            max_assets_per_message: DEFAULT_MAX_ASSETS,
        }
    }
}

fn default_selector() -> Felt {
    // The constant is a fixed literal below the field modulus.
    DEFAULT_DEPOSIT_SELECTOR.parse().unwrap_or(Felt::ZERO)
}

impl BridgeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check field values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_zero() {
            return Err(ConfigError::Invalid("address must be non-zero".into()));
        }
        if self.deposit_selector.is_zero() {
            return Err(ConfigError::Invalid("deposit_selector must be non-zero".into()));
        }
        if self.max_assets_per_message == 0 {
            return Err(ConfigError::Invalid(
                "max_assets_per_message must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_selector_matches_constant() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.deposit_selector,
            DEFAULT_DEPOSIT_SELECTOR.parse::<Felt>().unwrap()
        );
        assert!(!config.deposit_selector.is_zero());
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config =
            BridgeConfig::from_yaml_str("address: \"0x1111111111111111111111111111111111111111\"\n")
                .unwrap();
        assert_eq!(config.address, Address::repeat_byte(0x11));
        assert_eq!(config.max_assets_per_message, 256);
    }

    #[test]
    fn zero_address_rejected() {
        let err = BridgeConfig::from_yaml_str("max_assets_per_message: 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("address")));
    }

    #[test]
    fn zero_batch_rejected() {
        let yaml = "address: \"0x1111111111111111111111111111111111111111\"\nmax_assets_per_message: 0\n";
        assert!(matches!(
            BridgeConfig::from_yaml_str(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn out_of_field_selector_rejected() {
        let yaml = "address: \"0x1111111111111111111111111111111111111111\"\ndeposit_selector: \"0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\"\n";
        assert!(matches!(
            BridgeConfig::from_yaml_str(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(matches!(
            BridgeConfig::from_yaml_str("addres: \"0x00\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bridge.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"address: \"0x2222222222222222222222222222222222222222\"\nmax_assets_per_message: 10\n")
            .unwrap();
        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.max_assets_per_message, 10);
    }

    #[test]
    fn load_missing_file() {
        let err = BridgeConfig::load(Path::new("/nonexistent/bridge.yaml")).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.contains("nonexistent")),
            other => panic!("expected Io, got: {other}"),
        }
    }
}

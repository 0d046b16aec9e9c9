/// Configuration for the DID:SOV driver
use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;

pub const ENV_LIB_INDY_PATH: &str = "uniresolver_driver_did_sov_libIndyPath";
pub const ENV_POOL_CONFIG_NAME: &str = "uniresolver_driver_did_sov_poolConfigName";
pub const ENV_POOL_GENESIS_TXN: &str = "uniresolver_driver_did_sov_poolGenesisTxn";
pub const ENV_WALLET_NAME: &str = "uniresolver_driver_did_sov_walletName";
pub const ENV_SUBMITTER_SEED: &str = "uniresolver_driver_did_sov_submitterSeed";

pub const DEFAULT_WALLET_NAME: &str = "default";

/// Ledger connection settings, fixed before the first resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Location of the native ledger runtime; `None` if it is already loaded
    pub library_path: Option<PathBuf>,
    /// Name under which the genesis transactions are registered
    pub pool_config_name: String,
    /// Genesis transaction file bootstrapping pool membership
    pub pool_genesis_txn: PathBuf,
    /// Wallet holding the submitter's signing key
    pub wallet_name: String,
    /// Seed for a stable submitter DID. Without one, a fresh DID is created per cold start.
    pub submitter_seed: Option<String>,
}

impl DriverConfig {
    pub fn new(pool_config_name: impl Into<String>, pool_genesis_txn: impl Into<PathBuf>) -> Self {
        Self {
            library_path: None,
            pool_config_name: pool_config_name.into(),
            pool_genesis_txn: pool_genesis_txn.into(),
            wallet_name: DEFAULT_WALLET_NAME.to_string(),
            submitter_seed: None,
        }
    }

    pub fn with_library_path(mut self, library_path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(library_path.into());
        self
    }

    pub fn with_wallet_name(mut self, wallet_name: impl Into<String>) -> Self {
        self.wallet_name = wallet_name.into();
        self
    }

    pub fn with_submitter_seed(mut self, seed: impl Into<String>) -> Self {
        self.submitter_seed = Some(seed.into());
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()));

        let mut config = Self::new(
            required(ENV_POOL_CONFIG_NAME)?,
            required(ENV_POOL_GENESIS_TXN)?,
        );

        if let Some(library_path) = var(ENV_LIB_INDY_PATH) {
            config = config.with_library_path(library_path);
        }
        if let Some(wallet_name) = var(ENV_WALLET_NAME) {
            config = config.with_wallet_name(wallet_name);
        }
        if let Some(seed) = var(ENV_SUBMITTER_SEED) {
            config = config.with_submitter_seed(seed);
        }

        Ok(config)
    }
}

use clients::DEFAULT_API_BASE;
use directories::ProjectDirs;
use resolver::ens::DEFAULT_RPC_URL;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;
use types::{
    address::Address,
    errors::PayError,
    payment::PaymentMetadata,
    token::{DEFAULT_TOKEN_SYMBOL, DestinationToken, find_token},
};

pub const ENV_API_URL: &str = "PAY_API_URL";
pub const ENV_WALLETCONNECT_PROJECT_ID: &str = "WALLETCONNECT_PROJECT_ID";
pub const ENV_RPC_URL: &str = "ETH_RPC_URL";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub api_base: String,
    pub rpc_url: String,
    /// Overrides the ENS Universal Resolver address.
    pub ens_universal_resolver: Option<Address>,
    /// Resolves names straight through this registry instead of the
    /// Universal Resolver, for chains that have none. Wildcard and offchain
    /// names do not resolve in this mode.
    pub ens_registry: Option<Address>,
    pub wallet_connect_project_id: Option<String>,
    pub default_token: String,
    pub request_timeout_secs: Option<u64>,
    pub log_file_path: Option<PathBuf>,
    pub metadata: PaymentMetadata,
    #[serde(skip)]
    pub config_file_path: PathBuf,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            ens_universal_resolver: None,
            ens_registry: None,
            wallet_connect_project_id: None,
            default_token: DEFAULT_TOKEN_SYMBOL.to_string(),
            request_timeout_secs: None,
            log_file_path: None,
            metadata: PaymentMetadata::default(),
            config_file_path: PathBuf::from("config.yaml"),
        }
    }
}

impl CheckoutConfig {
    pub fn get_config_file_path(file_path_option: Option<String>) -> Result<PathBuf, PayError> {
        if let Some(file_path_str) = file_path_option {
            let mut path = PathBuf::from(file_path_str);
            if path.is_dir() {
                path.push("config.yaml");
            }
            debug!("Using config file path: {}", path.display());
            Ok(path)
        } else {
            let proj_dirs = ProjectDirs::from("", "", "Paylink")
                .ok_or_else(|| PayError::Config("Failed to determine project directory".into()))?;
            Ok(proj_dirs.config_dir().join("config.yaml"))
        }
    }

    pub fn load(path: &Path) -> Result<Self, PayError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PayError::Config(format!("Failed to read config file: {e}")))?;

        let mut config = serde_yaml::from_str::<Self>(&contents)
            .map_err(|e| PayError::Config(format!("Failed to deserialize config file: {e}")))?;
        config.config_file_path = path.to_path_buf();
        Ok(config)
    }

    /// Loads the config file when it exists, otherwise starts from defaults.
    /// Environment overrides are applied either way.
    pub fn get_config(config_file_path: Option<String>) -> Result<Self, PayError> {
        let path = Self::get_config_file_path(config_file_path)?;

        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self {
                config_file_path: path,
                ..Self::default()
            }
        };

        config.apply_env_overrides(|key| dotenvy::var(key).ok());
        Ok(config)
    }

    pub fn save_to_file(&self) -> Result<(), PayError> {
        if let Some(parent) = self.config_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    PayError::Config(format!("Failed to create config directory: {e}"))
                })?;
            }
        }

        let config_str = serde_yaml::to_string(self)
            .map_err(|e| PayError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(&self.config_file_path, config_str)
            .map_err(|e| PayError::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Applies `PAY_API_URL`, `WALLETCONNECT_PROJECT_ID` and `ETH_RPC_URL`.
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(api_base) = lookup(ENV_API_URL) {
            debug!("{} overrides api_base", ENV_API_URL);
            self.api_base = api_base;
        }
        if let Some(project_id) = lookup(ENV_WALLETCONNECT_PROJECT_ID) {
            self.wallet_connect_project_id = Some(project_id);
        }
        if let Some(rpc_url) = lookup(ENV_RPC_URL) {
            debug!("{} overrides rpc_url", ENV_RPC_URL);
            self.rpc_url = rpc_url;
        }
    }

    pub fn token(&self) -> Result<DestinationToken, PayError> {
        find_token(&self.default_token)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub struct CheckoutConfigBuilder {
    config_file_path: Option<PathBuf>,
    log_file_path: Option<PathBuf>,

    api_base: Option<String>,
    rpc_url: Option<String>,
    ens_universal_resolver: Option<Address>,
    ens_registry: Option<Address>,
    wallet_connect_project_id: Option<String>,
    default_token: Option<String>,
    request_timeout_secs: Option<u64>,
    metadata: Option<PaymentMetadata>,
}

impl Default for CheckoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config_file_path: None,
            log_file_path: None,

            api_base: None,
            rpc_url: None,
            ens_universal_resolver: None,
            ens_registry: None,
            wallet_connect_project_id: None,
            default_token: None,
            request_timeout_secs: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn config_file_path(mut self, path: PathBuf) -> Self {
        self.config_file_path = Some(path);
        self
    }

    #[must_use]
    pub fn log_file_path(mut self, path: Option<PathBuf>) -> Self {
        self.log_file_path = path;
        self
    }

    #[must_use]
    pub fn api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    #[must_use]
    pub fn rpc_url<S: Into<String>>(mut self, rpc_url: S) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    #[must_use]
    pub const fn ens_universal_resolver(mut self, universal_resolver: Address) -> Self {
        self.ens_universal_resolver = Some(universal_resolver);
        self
    }

    #[must_use]
    pub const fn ens_registry(mut self, registry: Address) -> Self {
        self.ens_registry = Some(registry);
        self
    }

    #[must_use]
    pub fn wallet_connect_project_id<S: Into<String>>(mut self, project_id: S) -> Self {
        self.wallet_connect_project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn default_token<S: Into<String>>(mut self, symbol: S) -> Self {
        self.default_token = Some(symbol.into());
        self
    }

    #[must_use]
    pub const fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: PaymentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> Result<CheckoutConfig, PayError> {
        let mut cfg = CheckoutConfig::default();

        if let Some(path) = self.config_file_path {
            cfg.config_file_path = path;
        }
        cfg.log_file_path = self.log_file_path;

        if let Some(api_base) = self.api_base {
            if api_base.is_empty() {
                return Err(PayError::Config("api_base must not be empty".into()));
            }
            cfg.api_base = api_base;
        }
        if let Some(rpc_url) = self.rpc_url {
            cfg.rpc_url = rpc_url;
        }
        if let Some(universal_resolver) = self.ens_universal_resolver {
            cfg.ens_universal_resolver = Some(universal_resolver);
        }
        if let Some(registry) = self.ens_registry {
            cfg.ens_registry = Some(registry);
        }
        if let Some(project_id) = self.wallet_connect_project_id {
            cfg.wallet_connect_project_id = Some(project_id);
        }
        if let Some(symbol) = self.default_token {
            find_token(&symbol)
                .map_err(|e| PayError::Config(format!("Invalid default token: {e}")))?;
            cfg.default_token = symbol;
        }
        if let Some(secs) = self.request_timeout_secs {
            cfg.request_timeout_secs = Some(secs);
        }
        if let Some(metadata) = self.metadata {
            cfg.metadata = metadata;
        }

        Ok(cfg)
    }
}

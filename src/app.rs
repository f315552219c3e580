use crate::api::client::{ConfirmationPolicy, HttpContractGateway};
use crate::api::relayer::HttpFheClient;
use crate::api::session::{SessionProvider, StaticSession};
use crate::error::{AppError, AppResult};
use crate::orchestrator::AddressBook;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway_url: String,
    pub relayer_url: String,
    pub contract_address: String,
    pub account: Option<String>,
    pub status_ttl_secs: u64,
    pub confirmation_poll_ms: u64,
    pub confirmation_attempts: u32,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            relayer_url: String::new(),
            contract_address: String::new(),
            account: None,
            status_ttl_secs: 3,
            confirmation_poll_ms: 1500,
            confirmation_attempts: 80,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }
    // TOML is the config format; a JSON file from older releases is read once and converted
    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("fhe-address-book.toml"))
    }

    fn legacy_json_path() -> Option<PathBuf> {
        let proj = directories::ProjectDirs::from("com", "example", "FheAddressBook")?;
        Some(proj.config_dir().join("config.json"))
    }

    pub fn from_toml(text: &str) -> AppResult<Self> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn load() -> Self {
        if let Some(path) = Self::toml_path() {
            if let Ok(text) = fs::read_to_string(&path) {
                match Self::from_toml(&text) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("ignoring {}: {}", path.display(), e),
                }
            }
        }

        if let Some(legacy) = Self::legacy_json_path() {
            if let Ok(bytes) = fs::read(&legacy) {
                if let Ok(config) = serde_json::from_slice::<AppConfig>(&bytes) {
                    if let Err(e) = config.save() {
                        log::warn!("could not migrate {}: {}", legacy.display(), e);
                    }
                    return config;
                }
            }
        }

        Self::new()
    }

    pub fn save(&self) -> AppResult<()> {
        let path = Self::toml_path().ok_or_else(|| AppError::Config("no config dir".into()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::Config(e.to_string()))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(&path, text).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn is_complete(&self) -> bool {
        !self.gateway_url.trim().is_empty()
            && !self.relayer_url.trim().is_empty()
            && !self.contract_address.trim().is_empty()
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.confirmation_poll_ms),
            max_attempts: self.confirmation_attempts,
        }
    }
}

/// The address book wired to the HTTP bridge and relayer, plus the session
/// handle the front end uses to connect or disconnect.
pub struct App {
    pub book: Arc<AddressBook>,
    pub session: Arc<StaticSession>,
}

pub fn build_app(config: &AppConfig) -> AppResult<App> {
    let session = Arc::new(StaticSession::new(config.account.clone()));
    let provider: Arc<dyn SessionProvider> = session.clone();
    let gateway = HttpContractGateway::new(
        &config.gateway_url,
        &config.contract_address,
        provider.clone(),
        config.confirmation_policy(),
    )?;
    let fhe = HttpFheClient::new(&config.relayer_url)?;
    let book = AddressBook::new(Arc::new(gateway), Arc::new(fhe), provider, config.status_ttl());
    Ok(App {
        book: Arc::new(book),
        session,
    })
}

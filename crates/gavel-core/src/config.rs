// Configuration loading and parsing (gavel.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::protocol::ViewMode;

/// Environment variable that overrides `backend.base_url` when set.
pub const BACKEND_URL_ENV: &str = "GAVEL_BACKEND_URL";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub auction: AuctionConfig,
    pub display: DisplayConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// gavel.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire gavel.toml file.
#[derive(Debug, Clone, Deserialize)]
struct GavelFile {
    backend: BackendConfig,
    auction: AuctionConfig,
    #[serde(default)]
    display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Host serving the REST API; requests go to `{base_url}/api/...`.
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionConfig {
    pub event_id: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_timer_duration_secs")]
    pub timer_duration_secs: u32,
    /// How long the SOLD stamp stays up (and polling stays suppressed).
    #[serde(default = "default_sold_display_ms")]
    pub sold_display_ms: u64,
    /// Start the countdown as soon as a new player is put up.
    #[serde(default = "default_true")]
    pub auto_start_timer: bool,
    /// Consecutive failed polls before the view marks its data stale.
    #[serde(default = "default_stale_after_failures")]
    pub stale_after_failures: u32,
}

impl AuctionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sold_display(&self) -> Duration {
        Duration::from_millis(self.sold_display_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mode: ViewMode,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            mode: ViewMode::default(),
            currency: default_currency(),
            toast_secs: default_toast_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_timer_duration_secs() -> u32 {
    60
}

fn default_sold_display_ms() -> u64 {
    4000
}

fn default_true() -> bool {
    true
}

fn default_stale_after_failures() -> u32 {
    3
}

fn default_currency() -> String {
    "₹".to_string()
}

fn default_toast_secs() -> u64 {
    4
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub bearer_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/gavel.toml` and (optionally)
/// `config/credentials.toml`, both relative to the given `base_dir`.
///
/// `backend_url_override` replaces `backend.base_url` when it is `Some` and
/// non-empty; `load_config()` feeds it from [`BACKEND_URL_ENV`].
pub fn load_config_from(
    base_dir: &Path,
    backend_url_override: Option<String>,
) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- gavel.toml (required) ---
    let gavel_path = config_dir.join("gavel.toml");
    let gavel_text = read_file(&gavel_path)?;
    let gavel_file: GavelFile =
        toml::from_str(&gavel_text).map_err(|e| ConfigError::ParseError {
            path: gavel_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let mut backend = gavel_file.backend;
    if let Some(url) = backend_url_override.filter(|u| !u.trim().is_empty()) {
        backend.base_url = url;
    }
    backend.base_url = backend.base_url.trim_end_matches('/').to_string();

    let config = Config {
        backend,
        auction: gavel_file.auction,
        display: gavel_file.display,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory, copying defaults first and honouring `GAVEL_BACKEND_URL`.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd, std::env::var(BACKEND_URL_ENV).ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = &config.backend.base_url;
    if url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "backend.base_url".into(),
            message: "must not be empty".into(),
        });
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "backend.base_url".into(),
            message: format!("must start with http:// or https://, got {url}"),
        });
    }

    if config.auction.event_id.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "auction.event_id".into(),
            message: "must not be empty".into(),
        });
    }

    let positive_fields: &[(&str, u64)] = &[
        ("backend.request_timeout_secs", config.backend.request_timeout_secs),
        ("auction.poll_interval_secs", config.auction.poll_interval_secs),
        (
            "auction.timer_duration_secs",
            u64::from(config.auction.timer_duration_secs),
        ),
        ("auction.sold_display_ms", config.auction.sold_display_ms),
        (
            "auction.stale_after_failures",
            u64::from(config.auction.stale_after_failures),
        ),
        ("display.toast_secs", config.display.toast_secs),
    ];
    for (name, val) in positive_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

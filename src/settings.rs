use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagemark";

/// An account the bundled identity provider will accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// `google`, `github` or `email`
    pub provider: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Only meaningful for `email` accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Artificial latency of the simulated chat backends
    #[serde(default = "default_chat_delay_ms")]
    pub chat_delay_ms: u64,

    /// Artificial latency of the simulated converter
    #[serde(default = "default_conversion_delay_ms")]
    pub conversion_delay_ms: u64,

    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,

    #[serde(default = "default_model")]
    pub default_model: String,

    /// Colour theme name, see `theme::ThemeId::parse`
    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<AccountConfig>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_chat_delay_ms() -> u64 {
    1000
}

fn default_conversion_delay_ms() -> u64 {
    2000
}

fn default_notice_secs() -> u64 {
    5
}

fn default_model() -> String {
    "chatgpt".to_string()
}

fn default_theme() -> String {
    "oceanic-next".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            chat_delay_ms: default_chat_delay_ms(),
            conversion_delay_ms: default_conversion_delay_ms(),
            notice_secs: default_notice_secs(),
            default_model: default_model(),
            theme: default_theme(),
            data_dir: None,
            accounts: Vec::new(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `explicit` or from the platform config dir, creating
/// the default file when nothing exists yet.
pub fn load_settings(explicit: Option<&Path>) {
    if let Some(path) = explicit {
        load_settings_from_path(path);
        return;
    }

    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_and_migrate(&content) {
            Ok((settings, migrated)) => {
                debug!("Loaded settings from {path:?}");
                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings.clone();
                }
                if migrated {
                    save_settings_to_file(&settings, path);
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

/// Parse a YAML settings document, migrating older versions.
pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    parse_and_migrate(content).map(|(settings, _)| settings)
}

/// Returns the settings and whether they were migrated from an older version.
fn parse_and_migrate(content: &str) -> Result<(Settings, bool), serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok((Settings::default(), false));
    }
    let mut settings: Settings = serde_yaml::from_str(content)?;
    let migrated = settings.version < CURRENT_VERSION;
    if migrated {
        migrate_settings(&mut settings);
    }
    Ok((settings, migrated))
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 stored the chat delay in seconds
    if settings.version < 2 && settings.chat_delay_ms < 100 {
        settings.chat_delay_ms *= 1000;
    }

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let body = match serde_yaml::to_string(settings) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    let mut content = String::from(SETTINGS_HEADER);
    content.push_str(&body);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# pagemark configuration
#
# accounts: identities the built-in sign-in provider accepts, e.g.
#   accounts:
#     - provider: google
#       email: reader@example.com
#       display_name: Reader
#     - provider: email
#       email: me@example.com
#       password: hunter2

"#;

/// Replace the global settings wholesale. Used by the CLI and by tests.
pub fn install(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn snapshot() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

pub fn chat_delay() -> Duration {
    let ms = SETTINGS
        .read()
        .map(|s| s.chat_delay_ms)
        .unwrap_or_else(|_| default_chat_delay_ms());
    Duration::from_millis(ms)
}

pub fn conversion_delay() -> Duration {
    let ms = SETTINGS
        .read()
        .map(|s| s.conversion_delay_ms)
        .unwrap_or_else(|_| default_conversion_delay_ms());
    Duration::from_millis(ms)
}

pub fn notice_duration() -> Duration {
    let secs = SETTINGS
        .read()
        .map(|s| s.notice_secs)
        .unwrap_or_else(|_| default_notice_secs());
    Duration::from_secs(secs)
}

pub fn default_model_name() -> String {
    SETTINGS
        .read()
        .map(|s| s.default_model.clone())
        .unwrap_or_else(|_| default_model())
}

pub fn theme_name() -> String {
    SETTINGS
        .read()
        .map(|s| s.theme.clone())
        .unwrap_or_else(|_| default_theme())
}

pub fn accounts() -> Vec<AccountConfig> {
    SETTINGS
        .read()
        .map(|s| s.accounts.clone())
        .unwrap_or_default()
}

/// Directory holding the profile store and the cookie jar.
pub fn data_dir() -> PathBuf {
    let configured = SETTINGS.read().ok().and_then(|s| s.data_dir.clone());
    configured
        .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_NAME)))
        .unwrap_or_else(|| PathBuf::from(".pagemark"))
}

pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.data_dir = Some(dir);
    }
}

// Run settings
// Loaded from ~/.config/outreach/config.toml, overridden by env and flags

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "APOLLO_API_KEY";
pub const EMAIL_ACCOUNT_ENV: &str = "APOLLO_EMAIL_ACCOUNT_ID";
pub const API_URL_ENV: &str = "APOLLO_API_URL";

pub const DEFAULT_API_URL: &str = "https://api.apollo.io/v1";
pub const DEFAULT_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Values shipped in the config template. Still seeing one means the
/// template was copied but never filled in.
const PLACEHOLDERS: &[&str] = &["YOUR_API_KEY_HERE", "YOUR_EMAIL_ACCOUNT_ID_HERE"];

const TEMPLATE: &str = r#"# outreach configuration
#
# API key: Apollo -> Settings -> Integrations -> API
# Email account id: Apollo -> Settings -> Email Accounts
#
# Do not commit this file. The API key can also come from APOLLO_API_KEY
# or the system keychain (`outreach key set`).

api_key = "YOUR_API_KEY_HERE"
email_account_id = "YOUR_EMAIL_ACCOUNT_ID_HERE"

# api_url = "https://api.apollo.io/v1"

# Pause after every prospect row, in milliseconds
# delay_ms = 500

# Per-request HTTP timeout, in seconds
# timeout_secs = 30
"#;

/// Raw contents of config.toml. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub email_account_id: Option<String>,
    pub api_url: Option<String>,
    pub delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Read and parse `path`. A missing file is `Ok(None)` unless `required`.
    pub fn load(path: &Path, required: bool) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "no config file");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_toml(&contents)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            })
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Environment,
    Keychain,
    File,
    Default,
    Unset,
}

impl ValueSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueSource::Flag => "flag",
            ValueSource::Environment => "environment",
            ValueSource::Keychain => "keychain",
            ValueSource::File => "config file",
            ValueSource::Default => "default",
            ValueSource::Unset => "unset",
        }
    }
}

/// A resolved string value and its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub value: String,
    pub source: ValueSource,
}

impl Setting {
    fn new(value: impl Into<String>, source: ValueSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    fn unset() -> Self {
        Self::new("", ValueSource::Unset)
    }
}

/// Values passed on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub email_account_id: Option<String>,
    pub api_url: Option<String>,
    pub delay_ms: Option<u64>,
}

/// Every setting, resolved but not yet validated
#[derive(Debug, Clone)]
pub struct Settings {
    pub path: PathBuf,
    pub file_found: bool,
    pub api_key: Setting,
    pub email_account_id: Setting,
    pub api_url: Setting,
    pub delay: Duration,
    pub delay_source: ValueSource,
    pub timeout: Duration,
}

/// Validated settings, ready to build a client from
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub email_account_id: String,
    pub api_url: String,
    pub delay: Duration,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot access config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("missing {name} (use {flag}, set {env}, or add `{key}` to config.toml)")]
    Missing {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
        key: &'static str,
    },

    #[error("{name} is still the template placeholder {value:?}")]
    Placeholder { name: &'static str, value: String },

    #[error("invalid API URL {0:?}: must start with http:// or https://")]
    InvalidUrl(String),
}

impl Settings {
    /// Get the config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("outreach")
            .join("config.toml")
    }

    /// Load from disk, environment and keychain, then apply `overrides`.
    ///
    /// An explicit `path` must exist; the default path may be absent.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };
        let file = FileConfig::load(&path, required)?;

        Ok(Self::resolve(
            path,
            file,
            overrides,
            |name| std::env::var(name).ok(),
            crate::keychain::get_api_key,
        ))
    }

    /// Merge every source. Pure apart from the two lookup callbacks.
    pub fn resolve(
        path: PathBuf,
        file: Option<FileConfig>,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
        keychain: impl Fn() -> Option<String>,
    ) -> Self {
        let file_found = file.is_some();
        let file = file.unwrap_or_default();

        let api_key = pick(overrides.api_key.as_deref(), env(API_KEY_ENV))
            .or_else(|| non_empty(keychain()).map(|v| Setting::new(v, ValueSource::Keychain)))
            .or_else(|| from_file(file.api_key.as_deref()))
            .unwrap_or_else(Setting::unset);

        let email_account_id = pick(
            overrides.email_account_id.as_deref(),
            env(EMAIL_ACCOUNT_ENV),
        )
        .or_else(|| from_file(file.email_account_id.as_deref()))
        .unwrap_or_else(Setting::unset);

        let api_url = pick(overrides.api_url.as_deref(), env(API_URL_ENV))
            .or_else(|| from_file(file.api_url.as_deref()))
            .unwrap_or_else(|| Setting::new(DEFAULT_API_URL, ValueSource::Default));

        let (delay_ms, delay_source) = match (overrides.delay_ms, file.delay_ms) {
            (Some(ms), _) => (ms, ValueSource::Flag),
            (None, Some(ms)) => (ms, ValueSource::File),
            (None, None) => (DEFAULT_DELAY_MS, ValueSource::Default),
        };

        Self {
            path,
            file_found,
            api_key,
            email_account_id,
            api_url,
            delay: Duration::from_millis(delay_ms),
            delay_source,
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Every configuration problem, in a stable order.
    pub fn problems(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if let Some(e) = check_required(
            &self.api_key,
            "Apollo API key",
            "--api-key",
            API_KEY_ENV,
            "api_key",
        ) {
            problems.push(e);
        }
        if let Some(e) = check_required(
            &self.email_account_id,
            "email account id",
            "--email-account-id",
            EMAIL_ACCOUNT_ENV,
            "email_account_id",
        ) {
            problems.push(e);
        }

        let url = self.api_url.value.as_str();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            problems.push(ConfigError::InvalidUrl(url.to_string()));
        }

        problems
    }

    /// Validate and return the settings a run needs.
    pub fn validate(&self) -> Result<ApiSettings, ConfigError> {
        if let Some(first) = self.problems().into_iter().next() {
            return Err(first);
        }

        Ok(ApiSettings {
            api_key: self.api_key.value.clone(),
            email_account_id: self.email_account_id.value.clone(),
            api_url: self.api_url.value.trim_end_matches('/').to_string(),
            delay: self.delay,
            timeout: self.timeout,
        })
    }

    /// Commented starter config.toml
    pub fn template() -> &'static str {
        TEMPLATE
    }

    /// Write the template to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn write_template(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }

        let write_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, TEMPLATE).map_err(write_err)?;
        Ok(true)
    }
}

/// Mask a secret for display, keeping the last four characters.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

/// Flag beats environment. A flag given as an empty string still counts,
/// so validation reports it instead of silently falling through.
fn pick(flag: Option<&str>, env: Option<String>) -> Option<Setting> {
    if let Some(v) = flag {
        return Some(Setting::new(v.trim(), ValueSource::Flag));
    }
    non_empty(env).map(|v| Setting::new(v, ValueSource::Environment))
}

fn from_file(value: Option<&str>) -> Option<Setting> {
    non_empty(value.map(str::to_string)).map(|v| Setting::new(v, ValueSource::File))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_required(
    setting: &Setting,
    name: &'static str,
    flag: &'static str,
    env: &'static str,
    key: &'static str,
) -> Option<ConfigError> {
    if setting.value.is_empty() {
        return Some(ConfigError::Missing {
            name,
            flag,
            env,
            key,
        });
    }
    if PLACEHOLDERS.contains(&setting.value.as_str()) {
        return Some(ConfigError::Placeholder {
            name,
            value: setting.value.clone(),
        });
    }
    None
}

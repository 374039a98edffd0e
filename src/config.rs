use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::constants::{DEFAULT_AUTHORITY_HOST, DEFAULT_LANGUAGE_CODE};
use crate::api::Credentials;

/// Accepted variable names per credential, preferred name first
const URL_VARS: &[&str] = &["DATAVERSE_URL", "environmentUrl"];
const TENANT_VARS: &[&str] = &["DATAVERSE_TENANT_ID", "tenant_id"];
const CLIENT_ID_VARS: &[&str] = &["DATAVERSE_CLIENT_ID", "client_id"];
const CLIENT_SECRET_VARS: &[&str] = &["DATAVERSE_CLIENT_SECRET", "client_secret"];

const DEFAULT_BATCH_SIZE: usize = 50;

/// Read credentials from the process environment, falling back to `env_file`.
///
/// Variables already set in the environment win over the file. A missing
/// `env_file` is only an error when `required` is set.
pub fn load_credentials(env_file: &Path, required: bool) -> Result<Credentials> {
    let file_vars = if env_file.exists() {
        info!("Loading credentials from {:?}", env_file);
        read_env_file(env_file)?
    } else if required {
        anyhow::bail!("Environment file not found: {}", env_file.display());
    } else {
        debug!("No env file at {:?}, using process environment only", env_file);
        HashMap::new()
    };

    credentials_from_lookup(|key| {
        std::env::var(key)
            .ok()
            .or_else(|| file_vars.get(key).cloned())
    })
}

/// Parse a `.env` file without touching the process environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open env file: {}", path.display()))?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) =
            item.with_context(|| format!("Failed to parse env file: {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Build credentials from any key lookup
pub fn credentials_from_lookup<F>(lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |names: &[&str]| -> Result<String> {
        names
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
            .map(|v| v.trim().to_string())
            .with_context(|| format!("{} not set (also accepted: {})", names[0], names[1..].join(", ")))
    };

    Ok(Credentials::new(
        get(URL_VARS)?,
        get(TENANT_VARS)?,
        get(CLIENT_ID_VARS)?,
        get(CLIENT_SECRET_VARS)?,
    ))
}

/// Tool settings from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Label language for payloads and label lookups
    pub language_code: i32,
    /// Options per `$batch` request
    pub batch_size: usize,
    pub authority_host: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language_code: DEFAULT_LANGUAGE_CODE,
            batch_size: DEFAULT_BATCH_SIZE,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        }
    }
}

impl Settings {
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("optionset-cli").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::get_config_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path),
                _ => {
                    debug!("No config file found, using default settings");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from: {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        if settings.batch_size == 0 {
            anyhow::bail!("batch_size in {:?} must be at least 1", path);
        }
        Ok(settings)
    }
}

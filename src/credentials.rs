//! Bearer credential for the completion endpoint, read from a `.env`-style file or the process environment.

use std::env;
use std::path::Path;

use anyhow::Result;
use log::{debug, warn};

use crate::errors::ConfigError;

/// The variable holding the key when no other is named.
pub const DEFAULT_API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Load the API key stored under `service`.
///
/// If `env_path` names an existing file it is loaded, otherwise the first `.env` found from the working directory
/// upwards is. Variables already set in the process environment win over both.
pub fn load_api_key(env_path: Option<&Path>, service: &str) -> Result<String> {
    match env_path {
        Some(path) if path.exists() => {
            dotenvy::from_path(path)
                .map_err(|e| ConfigError::for_key("credentials", service, format!("cannot load {}: {}", path.display(), e)))?;
            debug!("Loaded environment from {}", path.display());
        }
        other => {
            if let Some(path) = other {
                warn!("Environment file {} does not exist, falling back to .env discovery", path.display());
            }
            if let Ok(path) = dotenvy::dotenv() {
                debug!("Loaded environment from {}", path.display());
            }
        }
    }

    match env::var(service) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(ConfigError::for_key("credentials", service, "is empty").into()),
        Err(_) => Err(ConfigError::for_key("credentials", service, "is not set").into()),
    }
}

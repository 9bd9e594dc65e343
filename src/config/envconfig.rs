use std::path::PathBuf;

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Variable naming an explicit dotenv file to load before reading `APP_*`.
pub const ENV_FILE_VAR: &str = "APP_ENV_FILE";

/// Configuration read from `APP_`-prefixed variables; nested keys use `__`,
/// so `APP_DATABASE__URL` lands in `database.url`.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn from_env() -> Result<Self> {
        if let Some(path) = load_dotenv() {
            tracing::debug!(path = %path.display(), "loaded dotenv file");
        }
        Self::from_source(None)
    }

    /// Reads `vars` instead of the process environment when given.
    fn from_source(vars: Option<config_rs::Map<String, String>>) -> Result<Self> {
        let environment = config_rs::Environment::with_prefix(Self::PREFIX)
            .prefix_separator("_")
            .separator(Self::SEPARATOR)
            .try_parsing(true)
            .source(vars);

        let cfg = config_rs::Config::builder()
            .add_source(environment)
            .build()
            .context("failed to read APP_* variables")?
            .try_deserialize::<Self>()
            .context("APP_* variables do not match the configuration layout")?;

        cfg.validate()?;
        Ok(cfg)
    }
}

/// `APP_ENV_FILE` wins when set and must exist; otherwise the crate root
/// `.env` is tried before the one in the working directory.
fn load_dotenv() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(ENV_FILE_VAR) {
        return match dotenvy::from_filename(&explicit) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("{ENV_FILE_VAR}={explicit} could not be loaded: {err}");
                None
            }
        };
    }

    let crate_env = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env");
    dotenvy::from_path(&crate_env)
        .map(|_| crate_env)
        .or_else(|_| dotenvy::dotenv())
        .ok()
}

#[cfg(test)]
mod tests {
    use ::config as config_rs;

    use super::EnvConfig;
    use crate::config::AppConfig;

    fn vars(pairs: &[(&str, &str)]) -> config_rs::Map<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn nested_keys_use_double_underscore() {
        let cfg = AppConfig::from_source(Some(vars(&[
            ("APP_GENERAL__PORT", "9100"),
            ("APP_DATABASE__URL", "sqlite::memory:"),
            ("APP_DATABASE__MAX_CONNECTIONS", "3"),
        ])))
        .expect("config loads");

        assert_eq!(cfg.general.port, 9100);
        let database = cfg.database.expect("database section");
        assert_eq!(database.url, "sqlite::memory:");
        assert_eq!(database.max_connections, 3);
        assert!(cfg.auth.is_none());
    }

    #[test]
    fn empty_environment_falls_back_to_defaults() {
        let cfg = AppConfig::from_source(Some(vars(&[]))).expect("defaults load");

        assert_eq!(cfg.general.project, "longtermhire");
        assert_eq!(cfg.api_prefix(), "/v1/api/longtermhire");
    }
}

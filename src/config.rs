use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "taskbees.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid port number: {value}")]
    InvalidPort { name: &'static str, value: String },
}

/// Service settings, read from `TASKBEES_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub database: PathBuf,
    pub base_path: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("TASKBEES_PORT").ok_or(ConfigError::Missing("TASKBEES_PORT"))?;
        let port = port.trim().parse().map_err(|_| ConfigError::InvalidPort {
            name: "TASKBEES_PORT",
            value: port.clone(),
        })?;

        let database = lookup("TASKBEES_DATABASE")
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
            .into();

        let base_path = lookup("TASKBEES_BASE_PATH")
            .map(|path| normalize_base_path(&path))
            .unwrap_or_default();

        Ok(ServerConfig {
            port,
            database,
            base_path,
        })
    }
}

/// `"app/"` becomes `"/app"`; `"/"` and `""` mean no prefix.
pub fn normalize_base_path(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

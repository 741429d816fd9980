use std::env;
use std::path::PathBuf;

pub const DEFAULT_STORE_FILE: &str = "scenarios.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_PORT: u16 = 8080;

pub const STORE_ENV: &str = "MORTGAGE_SIM_STORE";
pub const LOG_ENV: &str = "MORTGAGE_SIM_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_path: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Command-line values win over the environment, which wins over defaults.
    pub fn resolve(store_flag: Option<PathBuf>, log_flag: Option<String>) -> Self {
        Self::resolve_with(store_flag, log_flag, |key| env::var(key).ok())
    }

    fn resolve_with(
        store_flag: Option<PathBuf>,
        log_flag: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let store_path = store_flag
            .or_else(|| lookup(STORE_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));
        let log_level = log_flag
            .or_else(|| lookup(LOG_ENV).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Self {
            store_path,
            log_level,
        }
    }
}

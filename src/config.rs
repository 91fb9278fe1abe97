//! Service configuration read from the environment

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SURVEY_PORT must be a port number, got '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Respondent identifier allowed to export reports
    pub admin_id: Option<String>,
    /// Custom catalog; the built-in one is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Where the admin notifier drops export snapshots
    pub export_path: Option<PathBuf>,
}

impl SurveyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty("SURVEY_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.symptom-survey/reports.db"))
            },
            PathBuf::from,
        );

        let port = match non_empty("SURVEY_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            db_path,
            port,
            admin_id: non_empty("SURVEY_ADMIN_ID").map(|v| v.trim().to_string()),
            catalog_path: non_empty("SURVEY_CATALOG_PATH").map(PathBuf::from),
            export_path: non_empty("SURVEY_EXPORT_PATH").map(PathBuf::from),
        })
    }
}

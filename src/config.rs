use serde::{Deserialize, Serialize};
use std::{fs, io, path::{Path, PathBuf}};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME not set")]
    NoHome,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join("wiki_city_viewer"))
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("config.json"))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub search_endpoint: String,
    pub username: String,
    pub max_rows: u32,
    pub map_endpoint: String,
    pub map_zoom: u8,
    /// Square edge in pixels, sent as `<n>x<n>`.
    pub map_size: u32,
    pub map_scale: u8,
    pub map_type: String,
    pub map_api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search_endpoint: "http://api.geonames.org/wikipediaSearchJSON".into(),
            username: "mhimmiche".into(),
            max_rows: 20,
            map_endpoint: "https://maps.googleapis.com/maps/api/staticmap".into(),
            map_zoom: 11,
            map_size: 612,
            map_scale: 2,
            map_type: "hybrid".into(),
            map_api_key: None,
            timeout_secs: 20,
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&s)?)
}

/// Missing or broken config files fall back to the defaults.
pub fn load_config() -> AppConfig {
    let path = match config_path() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("no config location: {e}");
            return AppConfig::default();
        }
    };
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring config: {e}");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "username": "someone", "map_api_key": "k" }}"#).unwrap();

        let cfg = load_config_from(file.path()).unwrap();
        assert_eq!(cfg.username, "someone");
        assert_eq!(cfg.map_api_key.as_deref(), Some("k"));
        assert_eq!(cfg.max_rows, 20);
        assert_eq!(cfg.map_type, "hybrid");
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        assert!(matches!(load_config_from(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}

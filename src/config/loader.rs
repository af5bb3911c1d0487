use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::ConfigFile;

/// Plan files looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["volley.toml", "volley.json"];

/// Loads a test plan from the provided path or the default locations in
/// the working directory.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = path {
        return load_config_file(path).map(Some);
    }

    for candidate in DEFAULT_CONFIG_FILES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }

    Ok(None)
}

/// # Errors
///
/// Returns an error when the file cannot be read, has an unsupported
/// extension, or does not parse.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source,
        }),
        Some(ext) => Err(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        }),
        None => Err(ConfigError::MissingExtension),
    }
}

#[must_use]
pub fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

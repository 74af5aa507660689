//! Configuration loading.
//!
//! Loads any `serde`-deserializable settings type (usually
//! [`OffloadConfig`](crate::settings::OffloadConfig)) from YAML, TOML, JSON,
//! INI, RON or JSON5.
//!
//! ## Features
//!
//! - Auto-detection of format from file extension
//! - Environment variable substitution (`${VAR}` and `$VAR` syntax)
//! - Layering of several sources, later ones overriding earlier ones

#[cfg(feature = "config")]
use ::config::{Config as Cfg, File, FileFormat};
#[cfg(feature = "config")]
use regex::Regex;
#[cfg(feature = "config")]
use serde::de::DeserializeOwned;
#[cfg(feature = "config")]
use std::path::Path;
#[cfg(feature = "config")]
use std::sync::LazyLock;


/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(feature = "config")]
static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

#[cfg(feature = "config")]
static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env var pattern is valid")
});

/// Detect configuration format from file extension
///
/// # Supported Extensions
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
/// - INI: `.ini`
/// - RON: `.ron`
/// - JSON5: `.json5`
#[cfg(feature = "config")]
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// `${VAR_NAME}` is replaced first, then bare `$VAR_NAME`. Unknown variables
/// are left untouched.
///
/// # Example
///
/// ```rust,ignore
/// use relaymec_kernel::config::substitute_env_vars;
///
/// std::env::set_var("RELAY_ALTITUDE", "120");
/// let result = substitute_env_vars("altitude: ${RELAY_ALTITUDE}");
/// assert_eq!(result, "altitude: 120");
/// ```
#[cfg(feature = "config")]
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Load configuration from a file
///
/// The format comes from the file extension; environment variables are
/// substituted before parsing.
///
/// ```rust,ignore
/// use relaymec_kernel::config::load_config;
/// use relaymec_kernel::settings::OffloadConfig;
///
/// let config: OffloadConfig = load_config("offload.yaml")?;
/// ```
#[cfg(feature = "config")]
pub fn load_config<T>(path: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let config = from_str(&content, format)?;
    tracing::debug!(path, "loaded configuration");
    Ok(config)
}

/// Load configuration from a string with explicit format
#[cfg(feature = "config")]
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    merge_configs(&[(content, format)])
}

/// Merge multiple configuration sources
///
/// Later sources override earlier ones (defaults -> site file -> local file).
#[cfg(feature = "config")]
pub fn merge_configs<T>(sources: &[(&str, FileFormat)]) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();

    for (content, format) in sources {
        let substituted = substitute_env_vars(content);
        builder = builder.add_source(File::from_str(&substituted, *format));
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from multiple files with later files overriding earlier ones
#[cfg(feature = "config")]
pub fn load_merged<T>(paths: &[&str]) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut contents = Vec::with_capacity(paths.len());
    for path in paths {
        let format = detect_format(path)?;
        contents.push((std::fs::read_to_string(path)?, format));
    }

    let sources: Vec<(&str, FileFormat)> = contents
        .iter()
        .map(|(content, format)| (content.as_str(), *format))
        .collect();
    merge_configs(&sources)
}

//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (RULESMITH__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::{AppConfig, SourceConfig};
use crate::error::ConfigError;
use crate::rules::HandlerDescriptor;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "rulesmith.toml",
    ".rulesmith.toml",
    "~/.config/rulesmith/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
///
/// Source file paths are kept exactly as written.
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    let mut config_file: Option<PathBuf> = None;

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
        config_file = Some(PathBuf::from(path));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                config_file = Some(PathBuf::from(expanded.as_ref()));
                break;
            }
        }
    }

    // 3. Add environment variables with RULESMITH__ prefix
    // e.g., RULESMITH__OUTPUT__PRETTY, RULESMITH__PIPELINE__ON_ERROR
    // Double underscore (__) maps to nested keys (output.pretty)
    builder = builder.add_source(
        Environment::with_prefix("RULESMITH")
            .separator("__")
            .try_parsing(true),
    );

    // Build and deserialize
    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    if let Some(file) = &config_file {
        debug!(path = %file.display(), "Loaded configuration file");
        let base_dir = config_base_dir(file)?;
        resolve_source_paths(&mut app_config, &base_dir);
    }

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Directory that relative source paths are resolved against
fn config_base_dir(config_file: &Path) -> Result<PathBuf, ConfigError> {
    let absolute = if config_file.is_absolute() {
        config_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(config_file)
    };

    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default())
}

/// Make every relative source path relative to `base_dir`
pub fn resolve_source_paths(config: &mut AppConfig, base_dir: &Path) {
    for source in &mut config.sources {
        if source.file.is_relative() {
            source.file = base_dir.join(&source.file);
        }
    }
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_handlers(
        config.gateway.authenticators.iter(),
        "gateway.authenticators",
    )?;
    validate_handlers(config.gateway.mutators.iter(), "gateway.mutators")?;

    for (index, descriptor) in config.gateway.errors.iter().enumerate() {
        validate_handler(descriptor, &format!("gateway.errors[{}]", index))?;
    }

    let mut names = HashSet::new();
    for (index, source) in config.sources.iter().enumerate() {
        validate_source(source, index)?;

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!("source name '{}' is used more than once", source.name),
            });
        }
    }

    Ok(())
}

fn validate_source(source: &SourceConfig, index: usize) -> Result<(), ConfigError> {
    if source.name.is_empty() {
        return Err(ConfigError::Missing {
            field: format!("sources[{}].name", index),
        });
    }

    // ':' separates the source name from the rule id
    if source.name.contains(':') {
        return Err(ConfigError::Invalid {
            message: format!("source name '{}' must not contain ':'", source.name),
        });
    }

    if source.file.as_os_str().is_empty() {
        return Err(ConfigError::Missing {
            field: format!("sources[{}].file", index),
        });
    }

    Ok(())
}

fn validate_handlers<'a, I>(handlers: I, field_path: &str) -> Result<(), ConfigError>
where
    I: Iterator<Item = (&'a String, &'a HandlerDescriptor)>,
{
    for (name, descriptor) in handlers {
        validate_handler(descriptor, &format!("{}.{}", field_path, name))?;
    }
    Ok(())
}

fn validate_handler(descriptor: &HandlerDescriptor, field_path: &str) -> Result<(), ConfigError> {
    if descriptor.handler.is_empty() {
        return Err(ConfigError::Missing {
            field: format!("{}.handler", field_path),
        });
    }
    Ok(())
}

//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ExporterConfig, LegacyEndpoint, PathSpec};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error("unknown vehicle '{0}'")]
    UnknownVehicle(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ExporterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    tracing::info!(
        path = %path.display(),
        addresses = config.addresses.len(),
        paths = config.paths.len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Parse, normalize and validate configuration text.
pub fn parse_config(content: &str) -> Result<ExporterConfig, ConfigError> {
    let mut config: ExporterConfig = serde_json::from_str(content)?;

    migrate_legacy(&mut config).map_err(|e| ConfigError::Validation(vec![e]))?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Fold the legacy top-level `from`/`to`/`bidirectional` fields into
/// `addresses` and `paths`.
///
/// A top-level `bidirectional` next to `paths` marks every path as
/// bidirectional.
fn migrate_legacy(config: &mut ExporterConfig) -> Result<(), ValidationError> {
    let bidirectional = config.bidirectional.take();

    match (config.from.take(), config.to.take()) {
        (None, None) => {
            if bidirectional == Some(true) {
                for path in &mut config.paths {
                    path.bidirectional = true;
                }
            }
            Ok(())
        }
        (Some(_), Some(_)) if !config.paths.is_empty() => Err(ValidationError::MixedSchema),
        (Some(from), Some(to)) => {
            let from = adopt_endpoint(config, from);
            let to = adopt_endpoint(config, to);
            tracing::warn!(
                from = %from,
                to = %to,
                "Legacy single-path configuration, consider migrating to 'paths'"
            );
            config.paths.push(PathSpec {
                from,
                to,
                bidirectional: bidirectional.unwrap_or(true),
            });
            Ok(())
        }
        _ => Err(ValidationError::IncompleteLegacyPath),
    }
}

fn adopt_endpoint(config: &mut ExporterConfig, endpoint: LegacyEndpoint) -> String {
    match endpoint {
        LegacyEndpoint::Name(name) => name,
        LegacyEndpoint::Inline { name, address } => {
            config.addresses.insert(name.clone(), address);
            name
        }
    }
}

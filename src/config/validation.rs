//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (paths reference existing addresses)
//! - Validate listen address and upstream URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExporterConfig → Result<(), Vec<ValidationError>>
//! - Runs before any upstream call is made

use thiserror::Error;

use crate::config::schema::ExporterConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("path #{index} references unknown address '{name}'")]
    UnknownAddress { index: usize, name: String },

    #[error("no path configured")]
    NoPaths,

    #[error("invalid listen address '{0}'")]
    InvalidListen(String),

    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),

    #[error("legacy 'from'/'to' cannot be combined with 'paths'")]
    MixedSchema,

    #[error("legacy schema requires both 'from' and 'to'")]
    IncompleteLegacyPath,
}

/// Validate a normalized configuration.
pub fn validate_config(config: &ExporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.paths.is_empty() {
        errors.push(ValidationError::NoPaths);
    }

    for (index, path) in config.paths.iter().enumerate() {
        for name in [&path.from, &path.to] {
            if !config.addresses.contains_key(name) {
                errors.push(ValidationError::UnknownAddress {
                    index,
                    name: name.clone(),
                });
            }
        }
    }

    if config.listen_addr().is_err() {
        errors.push(ValidationError::InvalidListen(config.listen.clone()));
    }

    match url::Url::parse(&config.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.base_url.clone())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

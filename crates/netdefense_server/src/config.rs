//! Server configuration and game data loading.
//!
//! The catalog and rules are read once at startup, validated, and handed
//! to the engine. Any problem is reported before the server binds.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use netdefense_core::catalog::BuildingCatalog;
use netdefense_core::data::CatalogData;
use netdefense_core::engine::GameEngine;
use netdefense_core::error::GameError;
use netdefense_core::rules::GameRules;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Building catalog RON file; the built-in catalog when unset.
    pub catalog_path: Option<PathBuf>,
    /// Rules RON file; default rules when unset.
    pub rules_path: Option<PathBuf>,
    /// Seed for incident draws; seeded from the OS when unset.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            catalog_path: None,
            rules_path: None,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Load the configured catalog and rules into an engine.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogLoadError`] if either file fails to load.
    pub fn load_engine(&self) -> Result<GameEngine, CatalogLoadError> {
        let catalog = match &self.catalog_path {
            Some(path) => load_catalog(path)?,
            None => BuildingCatalog::builtin(),
        };
        let rules = match &self.rules_path {
            Some(path) => load_rules(path)?,
            None => GameRules::default(),
        };
        Ok(GameEngine::new(Arc::new(catalog), rules))
    }
}

/// Errors that can occur while loading game data.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse RON file.
    #[error("Failed to parse RON file '{path}': {source}")]
    ParseError {
        /// Path to the file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// Data failed validation.
    #[error("Validation failed for '{path}': {errors:?}")]
    ValidationError {
        /// Path to the file.
        path: String,
        /// List of validation errors.
        errors: Vec<String>,
    },
}

fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogLoadError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::IoError {
        path: display.clone(),
        source,
    })?;
    ron::from_str(&text).map_err(|source| CatalogLoadError::ParseError {
        path: display,
        source,
    })
}

/// Load and validate a building catalog from a RON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_catalog(path: &Path) -> Result<BuildingCatalog, CatalogLoadError> {
    let data: CatalogData = read_ron(path)?;
    let catalog = BuildingCatalog::from_data(data).map_err(|err| {
        let errors = match err {
            GameError::InvalidCatalog(errors) => errors,
            other => vec![other.to_string()],
        };
        CatalogLoadError::ValidationError {
            path: path.display().to_string(),
            errors,
        }
    })?;
    tracing::info!(path = %path.display(), types = catalog.len(), "Loaded building catalog");
    Ok(catalog)
}

/// Load and validate game rules from a RON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_rules(path: &Path) -> Result<GameRules, CatalogLoadError> {
    let rules: GameRules = read_ron(path)?;
    let errors = rules.validate();
    if !errors.is_empty() {
        return Err(CatalogLoadError::ValidationError {
            path: path.display().to_string(),
            errors,
        });
    }
    tracing::info!(path = %path.display(), "Loaded game rules");
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/data")
            .join(name)
    }

    #[test]
    fn test_shipped_catalog_matches_builtin() {
        let loaded = load_catalog(&asset("buildings.ron")).unwrap();
        assert_eq!(loaded, BuildingCatalog::builtin());
    }

    #[test]
    fn test_shipped_rules_are_default() {
        let loaded = load_rules(&asset("rules.ron")).unwrap();
        assert_eq!(loaded, GameRules::default());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_catalog(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(matches!(err, CatalogLoadError::IoError { .. }));
        assert!(err.to_string().contains("does/not/exist.ron"));
    }

    #[test]
    fn test_default_config_uses_builtin_data() {
        let engine = ServerConfig::default().load_engine().unwrap();
        assert_eq!(engine.catalog(), &BuildingCatalog::builtin());
        assert_eq!(ServerConfig::default().addr().port(), 8080);
    }
}

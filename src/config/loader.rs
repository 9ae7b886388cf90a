//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! the project's `.ailess` directory in the correct priority order.

use crate::config::merger::merge_configs;
use crate::config::schema::DeployConfig;
use crate::error::{AilessError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding ailess configuration and generated files.
pub const CONFIG_DIR: &str = ".ailess";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. Project config (`.ailess/config.json`)
/// 2. Local overrides (`.ailess/config.local.json`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .ailess/config.json
    pub project: Option<PathBuf>,

    /// Local overrides: .ailess/config.local.json
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.json")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project
            .iter()
            .chain(self.project_local.iter())
            .collect()
    }

    /// Check if any project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Location of the project config file.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.json")
}

/// Find the project root by walking up from `start`.
///
/// Looks for:
/// 1. `.ailess` directory (primary indicator)
/// 2. `.git` directory (fallback)
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a config file as a raw JSON value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    let content = read_config(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| AilessError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(AilessError::ConfigParseError {
            path: path.to_path_buf(),
            message: "expected a JSON object".to_string(),
        });
    }
    Ok(value)
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AilessError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AilessError::Io(e)
        }
    })
}

/// Load, merge and validate all config files for a project.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no project config exists.
/// Returns `ConfigParseError` if any config file is invalid.
/// Returns `ConfigValidationError` if merged values are out of range.
pub fn load_merged_config(project_root: &Path) -> Result<DeployConfig> {
    let paths = ConfigPaths::discover(project_root);

    if !paths.has_project_config() {
        return Err(AilessError::ConfigNotFound {
            path: project_config_path(project_root),
        });
    }

    let mut configs = Vec::new();
    for path in paths.all_existing() {
        configs.push(load_config_value(path)?);
    }

    let merged = merge_configs(&configs);
    let config: DeployConfig =
        serde_json::from_value(merged).map_err(|e| AilessError::ConfigParseError {
            path: project_config_path(project_root),
            message: format!("Failed to parse merged config: {}", e),
        })?;

    config.validate()?;
    Ok(config)
}

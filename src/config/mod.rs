//! Configuration loading, parsing, and validation for ailess.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//!
//! # Example
//!
//! ```
//! use ailess::config::load_merged_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".ailess");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.json"), r#"{"ec2_instance_type": "g4dn.xlarge"}"#).unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! assert!(config.profile().has_gpu_from("NVIDIA"));
//! ```
//!
//! # Configuration File Locations
//!
//! ailess merges configuration in this order:
//! 1. Project config (`.ailess/config.json`)
//! 2. Local overrides (`.ailess/config.local.json`)

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{
    find_project_root, load_config_value, load_merged_config, project_config_path, ConfigPaths,
    CONFIG_DIR,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{DeployConfig, DEFAULT_REGISTRY_TIMEOUT_SECS, DEFAULT_REQUIREMENTS_FILE};

//! ailess - Base image selection and Dockerfile generation for Python
//! ML services.
//!
//! ailess reads a project's `requirements.txt` (following `-r`/`-c`
//! includes), works out which deep-learning framework and version the
//! project needs, and picks a matching published container image for the
//! target hardware.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`images`] - Hardware profiles, registry tags, searchers, and Dockerfiles
//! - [`requirements`] - Requirement parsing and constraint matching
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use ailess::images::{CpuArchitecture, DeploymentProfile, ImageSelector};
//! use ailess::requirements::RequirementSet;
//!
//! let reqs = RequirementSet::from_lines(["tensorflow==2.12"], None).unwrap();
//! let profile = DeploymentProfile::gpu(CpuArchitecture::Amd64, "NVIDIA");
//!
//! let selector = ImageSelector::builtin();
//! let searcher = selector.select(&profile, &reqs).unwrap();
//! assert_eq!(searcher.name(), "tensorflow-amd64-nvidia");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod requirements;
pub mod ui;

pub use error::{AilessError, Result};

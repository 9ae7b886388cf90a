//! Base image selection for deployments.
//!
//! Given a [`DeploymentProfile`] and a [`RequirementSet`](crate::requirements::RequirementSet),
//! the [`ImageSelector`] consults the registered searchers in priority
//! order and resolves a concrete `repository:tag` reference, plus any extra
//! build steps that image needs.
//!
//! # Modules
//!
//! - [`profile`] - Target hardware description
//! - [`tags`] - Registry tag listings
//! - [`searcher`] - Per-library image searchers
//! - [`selector`] - Priority-ordered searcher selection
//! - [`cuda`] - `nvidia/cuda` runtime images for a configured CUDA version
//! - [`dockerfile`] - Dockerfile and `.dockerignore` generation

pub mod cuda;
pub mod dockerfile;
pub mod profile;
pub mod searcher;
pub mod selector;
pub mod tags;

pub use cuda::{CudaRuntimeSearch, CUDA_BUILD_STEPS, CUDA_REPOSITORY, CUDA_SEARCHER_NAME};
pub use dockerfile::{render, update_dockerignore, write_dockerfile, DockerfileOutcome};
pub use profile::{CpuArchitecture, DeploymentProfile};
pub use searcher::{
    builtin_searchers, GpuRequirement, ImageSearcher, LibrarySearcher, SelectedImage,
    SelectionReason, TagVersion,
};
pub use selector::{BaseImage, ImageSelector, DEFAULT_BASE_IMAGE};
pub use tags::{HttpTagSource, TagSource, DEFAULT_REGISTRY_URL};

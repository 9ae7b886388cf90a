//! Base image selection across the registered searchers.

use tracing::{debug, info, warn};

use crate::error::{AilessError, Result};
use crate::requirements::{RequirementSet, Version};

use super::cuda::{CudaRuntimeSearch, CUDA_BUILD_STEPS, CUDA_REPOSITORY, CUDA_SEARCHER_NAME};
use super::profile::DeploymentProfile;
use super::searcher::{builtin_searchers, ImageSearcher, SelectionReason};
use super::tags::TagSource;

/// Image used when no searcher applies.
pub const DEFAULT_BASE_IMAGE: &str = "python:3.9";

/// The resolved base image and what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseImage {
    /// `repository:tag` reference for the `FROM` line.
    pub reference: String,
    /// Extra Dockerfile instructions, possibly empty.
    pub extra_build_steps: String,
    /// Name of the searcher that produced the image, if any.
    pub searcher: Option<String>,
    pub reason: SelectionReason,
}

/// Picks the most specific applicable searcher from an ordered list.
///
/// Searchers are consulted in registration order; the first whose
/// [`is_suitable`](ImageSearcher::is_suitable) holds wins. When none
/// applies, a configured CUDA version selects an `nvidia/cuda` runtime
/// image, and otherwise the default image is used.
pub struct ImageSelector {
    searchers: Vec<Box<dyn ImageSearcher>>,
    cuda: Option<CudaRuntimeSearch>,
    default_image: String,
}

impl ImageSelector {
    /// Create a selector with an explicit priority list.
    pub fn new(searchers: Vec<Box<dyn ImageSearcher>>) -> Self {
        Self {
            searchers,
            cuda: None,
            default_image: DEFAULT_BASE_IMAGE.to_string(),
        }
    }

    /// Create a selector over the built-in searchers.
    pub fn builtin() -> Self {
        Self::new(
            builtin_searchers()
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn ImageSearcher>)
                .collect(),
        )
    }

    /// Use `image` when no searcher applies.
    pub fn with_default_image(mut self, image: impl Into<String>) -> Self {
        self.default_image = image.into();
        self
    }

    /// Fall back to a CUDA runtime image for `cuda_version` before the
    /// default image.
    pub fn with_cuda_version(mut self, cuda_version: Version) -> Self {
        self.cuda = Some(CudaRuntimeSearch::new(cuda_version));
        self
    }

    /// The fallback image.
    pub fn default_image(&self) -> &str {
        &self.default_image
    }

    /// Registered searcher names in priority order.
    pub fn searcher_names(&self) -> Vec<&str> {
        self.searchers.iter().map(|s| s.name()).collect()
    }

    /// The first suitable searcher.
    pub fn select(
        &self,
        profile: &DeploymentProfile,
        requirements: &RequirementSet,
    ) -> Result<&dyn ImageSearcher> {
        self.searchers
            .iter()
            .find(|s| s.is_suitable(profile, requirements))
            .map(|s| {
                debug!("Selected searcher '{}'", s.name());
                s.as_ref()
            })
            .ok_or_else(|| AilessError::NoSuitableSearcher {
                profile: profile.to_string(),
            })
    }

    /// Select a searcher and resolve its image, falling back to the
    /// default image when none applies.
    pub fn resolve(
        &self,
        profile: &DeploymentProfile,
        requirements: &RequirementSet,
        tags: &dyn TagSource,
    ) -> BaseImage {
        match self.select(profile, requirements) {
            Ok(searcher) => {
                let image = searcher.select_image(profile, requirements, tags);
                info!("Base image {} ({})", image.reference, image.reason);
                BaseImage {
                    reference: image.reference,
                    extra_build_steps: searcher.extra_build_steps().to_string(),
                    searcher: Some(searcher.name().to_string()),
                    reason: image.reason,
                }
            }
            Err(e) => {
                debug!("{}", e);
                self.cuda
                    .as_ref()
                    .and_then(|cuda| self.resolve_cuda(cuda, tags))
                    .unwrap_or_else(|| self.default_base_image())
            }
        }
    }

    fn resolve_cuda(&self, cuda: &CudaRuntimeSearch, tags: &dyn TagSource) -> Option<BaseImage> {
        let version = cuda.cuda_version();
        match cuda.find(tags) {
            Ok(Some(image)) => {
                info!("Base image {} for CUDA {}", image.reference, version);
                Some(BaseImage {
                    reference: image.reference,
                    extra_build_steps: CUDA_BUILD_STEPS.to_string(),
                    searcher: Some(CUDA_SEARCHER_NAME.to_string()),
                    reason: image.reason,
                })
            }
            Ok(None) => {
                warn!(
                    "No {} runtime image for CUDA {}; using {}",
                    CUDA_REPOSITORY,
                    version,
                    self.default_image
                );
                None
            }
            Err(e) => {
                warn!("{}; using {}", e, self.default_image);
                None
            }
        }
    }

    fn default_base_image(&self) -> BaseImage {
        debug!("Using default image {}", self.default_image);
        BaseImage {
            reference: self.default_image.clone(),
            extra_build_steps: String::new(),
            searcher: None,
            reason: SelectionReason::Default,
        }
    }
}

impl Default for ImageSelector {
    fn default() -> Self {
        Self::builtin()
    }
}

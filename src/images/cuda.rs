//! CUDA runtime base images for projects pinned to a CUDA version.
//!
//! Used when no library searcher applies but the configuration names a
//! `cuda_version`: the newest `nvidia/cuda` runtime tag for that version is
//! chosen, and Python is installed on top of it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::requirements::{Version, VersionComparison};

use super::searcher::{SelectedImage, SelectionReason};
use super::tags::TagSource;

/// Repository holding the CUDA runtime images.
pub const CUDA_REPOSITORY: &str = "nvidia/cuda";

/// Name reported for images chosen by [`CudaRuntimeSearch`].
pub const CUDA_SEARCHER_NAME: &str = "cuda-runtime";

/// CUDA runtime images ship without Python.
pub const CUDA_BUILD_STEPS: &str = "ENV DEBIAN_FRONTEND=noninteractive

RUN apt update && \\
    apt install -y bash \\
                   build-essential \\
                   curl \\
                   ca-certificates \\
                   python3 \\
                   python3-pip";

// `<cuda>-runtime-ubuntu<release>`, e.g. `11.8.0-runtime-ubuntu22.04`.
static RUNTIME_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+(?:\.\d+)?)-runtime-ubuntu(\d+\.\d+)$").unwrap()
});

/// Finds the newest runtime image for one CUDA version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaRuntimeSearch {
    cuda_version: Version,
}

impl CudaRuntimeSearch {
    /// Search for `cuda_version`, e.g. `11.8`.
    pub fn new(cuda_version: Version) -> Self {
        Self { cuda_version }
    }

    pub fn cuda_version(&self) -> &Version {
        &self.cuda_version
    }

    /// The newest runtime tag whose CUDA version starts with the configured
    /// one, preferring the newest Ubuntu release among equal CUDA versions.
    ///
    /// Returns `Ok(None)` when the registry lists no such tag.
    pub fn find(&self, tags: &dyn TagSource) -> Result<Option<SelectedImage>> {
        let filter = self.cuda_version.to_string();
        let candidates = tags.list_tags(CUDA_REPOSITORY, Some(&filter))?;

        let best = candidates
            .into_iter()
            .filter_map(|tag| {
                let (cuda, ubuntu) = runtime_tag_versions(&tag)?;
                if !cuda.segments().starts_with(self.cuda_version.segments()) {
                    debug!("Skipping tag '{}': not CUDA {}", tag, self.cuda_version);
                    return None;
                }
                Some((cuda, ubuntu, tag))
            })
            .max_by(|a, b| {
                let order = VersionComparison::ZeroPad;
                order
                    .compare(&a.0, &b.0)
                    .then_with(|| order.compare(&a.1, &b.1))
            });

        Ok(best.map(|(cuda, _, tag)| SelectedImage {
            reference: format!("{}:{}", CUDA_REPOSITORY, tag),
            reason: SelectionReason::Matched(cuda),
        }))
    }
}

/// CUDA and Ubuntu versions of a runtime tag.
fn runtime_tag_versions(tag: &str) -> Option<(Version, Version)> {
    let captures = RUNTIME_TAG.captures(tag)?;
    Some((Version::parse(&captures[1])?, Version::parse(&captures[2])?))
}

//! Image searchers: strategies that pick a concrete base image for one library.
//!
//! Each searcher is bound to a target library (e.g. `torch`) and a hardware
//! binding (architecture, GPU vendor). The built-in set is closed and lives
//! in [`builtin_searchers`]; order matters and is decided by the selector.

use std::fmt;

use tracing::{debug, warn};

use crate::requirements::{RequirementSet, Version};

use super::profile::{CpuArchitecture, DeploymentProfile};
use super::tags::TagSource;

/// Capability interface shared by every image searcher.
pub trait ImageSearcher {
    /// Stable identifier, e.g. `pytorch-amd64-nvidia`.
    fn name(&self) -> &str;

    /// The Python distribution this searcher is bound to.
    fn library(&self) -> &str;

    /// Whether this searcher applies to the profile and requirements.
    fn is_suitable(&self, profile: &DeploymentProfile, requirements: &RequirementSet) -> bool;

    /// Pick an image for the declared constraint.
    ///
    /// Never fails: registry errors and exhaustive misses degrade to the
    /// searcher's latest tag.
    fn select_image(
        &self,
        profile: &DeploymentProfile,
        requirements: &RequirementSet,
        tags: &dyn TagSource,
    ) -> SelectedImage;

    /// Dockerfile instructions the chosen base image needs, possibly empty.
    fn extra_build_steps(&self) -> &str;
}

/// Why a particular tag was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionReason {
    /// A published tag satisfied the declared constraints.
    Matched(Version),
    /// The library is declared without constraints; latest is used.
    Unconstrained,
    /// No published tag satisfied the constraints; latest is used.
    NoMatch,
    /// The tag listing could not be fetched; latest is used.
    RegistryUnavailable(String),
    /// No searcher applied; the generic default image is used.
    Default,
}

impl SelectionReason {
    /// Whether the reference is a fallback rather than a real match.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::NoMatch | Self::RegistryUnavailable(_) | Self::Default
        )
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched(version) => write!(f, "matched version {}", version),
            Self::Unconstrained => f.write_str("no version constraint, using latest"),
            Self::NoMatch => f.write_str("no published tag satisfies the constraint, using latest"),
            Self::RegistryUnavailable(message) => {
                write!(f, "registry unavailable ({}), using latest", message)
            }
            Self::Default => f.write_str("no specialized image applies, using default"),
        }
    }
}

/// An image reference chosen by a searcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    /// `repository:tag`
    pub reference: String,
    pub reason: SelectionReason,
}

impl fmt::Display for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

/// GPU condition a searcher requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuRequirement {
    /// The profile must not have a GPU.
    None,
    /// The profile must have a GPU from this vendor.
    Vendor(&'static str),
}

/// Where the numeric version sits in a tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagVersion {
    /// The whole tag is the version (`2.12.0`).
    Whole,
    /// The version is the text before the first `-` (`2.12.0-gpu`).
    BeforeDash,
}

impl TagVersion {
    fn extract(self, tag: &str) -> Option<Version> {
        let text = match self {
            Self::Whole => tag,
            Self::BeforeDash => tag.split('-').next().unwrap_or(tag),
        };
        Version::parse(text)
    }
}

/// A searcher backed by one Docker Hub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySearcher {
    pub name: &'static str,
    /// Python distribution name as it appears in requirements.
    pub library: &'static str,
    pub architecture: CpuArchitecture,
    pub gpu: GpuRequirement,
    /// Image repository, e.g. `pytorch/pytorch`.
    pub repository: &'static str,
    /// Server-side tag name filter.
    pub tag_filter: Option<&'static str>,
    /// Tags containing any of these are unrelated variants.
    pub excluded_variants: &'static [&'static str],
    pub tag_version: TagVersion,
    /// Tag used when nothing better can be determined.
    pub latest_tag: &'static str,
    pub extra_build_steps: &'static str,
}

/// TensorFlow on amd64 with an NVIDIA GPU.
pub const TENSORFLOW_AMD64_NVIDIA: LibrarySearcher = LibrarySearcher {
    name: "tensorflow-amd64-nvidia",
    library: "tensorflow",
    architecture: CpuArchitecture::Amd64,
    gpu: GpuRequirement::Vendor("NVIDIA"),
    repository: "tensorflow/tensorflow",
    tag_filter: Some("gpu"),
    excluded_variants: &["jupyter"],
    tag_version: TagVersion::BeforeDash,
    latest_tag: "latest-gpu",
    extra_build_steps: "",
};

/// PyTorch on amd64 with an NVIDIA GPU.
pub const PYTORCH_AMD64_NVIDIA: LibrarySearcher = LibrarySearcher {
    name: "pytorch-amd64-nvidia",
    library: "torch",
    architecture: CpuArchitecture::Amd64,
    gpu: GpuRequirement::Vendor("NVIDIA"),
    repository: "pytorch/pytorch",
    tag_filter: Some("runtime"),
    excluded_variants: &[],
    tag_version: TagVersion::BeforeDash,
    latest_tag: "latest",
    extra_build_steps: "RUN apt-get install -y libglib2.0-0",
};

/// TensorFlow on amd64 without a GPU.
pub const TENSORFLOW_AMD64: LibrarySearcher = LibrarySearcher {
    name: "tensorflow-amd64",
    library: "tensorflow",
    architecture: CpuArchitecture::Amd64,
    gpu: GpuRequirement::None,
    repository: "tensorflow/tensorflow",
    tag_filter: None,
    excluded_variants: &["jupyter", "gpu"],
    tag_version: TagVersion::Whole,
    latest_tag: "latest",
    extra_build_steps: "",
};

/// The built-in searchers, most specific first.
pub fn builtin_searchers() -> Vec<LibrarySearcher> {
    vec![
        TENSORFLOW_AMD64_NVIDIA,
        PYTORCH_AMD64_NVIDIA,
        TENSORFLOW_AMD64,
    ]
}

impl LibrarySearcher {
    fn image(&self, tag: &str) -> String {
        format!("{}:{}", self.repository, tag)
    }

    fn latest(&self, reason: SelectionReason) -> SelectedImage {
        SelectedImage {
            reference: self.image(self.latest_tag),
            reason,
        }
    }

    fn is_variant_excluded(&self, tag: &str) -> bool {
        self.excluded_variants
            .iter()
            .any(|variant| tag.contains(variant))
    }
}

impl ImageSearcher for LibrarySearcher {
    fn name(&self) -> &str {
        self.name
    }

    fn library(&self) -> &str {
        self.library
    }

    fn is_suitable(&self, profile: &DeploymentProfile, requirements: &RequirementSet) -> bool {
        if !requirements.is_declared(self.library) {
            return false;
        }
        if profile.cpu_architecture != self.architecture {
            return false;
        }
        match self.gpu {
            GpuRequirement::None => !profile.has_gpu,
            GpuRequirement::Vendor(vendor) => profile.has_gpu_from(vendor),
        }
    }

    fn select_image(
        &self,
        _profile: &DeploymentProfile,
        requirements: &RequirementSet,
        tags: &dyn TagSource,
    ) -> SelectedImage {
        if requirements.is_unconstrained(self.library) {
            return self.latest(SelectionReason::Unconstrained);
        }

        let candidates = match tags.list_tags(self.repository, self.tag_filter) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("{}; falling back to {}", e, self.image(self.latest_tag));
                return self.latest(SelectionReason::RegistryUnavailable(e.to_string()));
            }
        };

        for tag in candidates {
            if self.is_variant_excluded(&tag) {
                continue;
            }
            let Some(version) = self.tag_version.extract(&tag) else {
                debug!("Skipping tag '{}': no numeric version", tag);
                continue;
            };
            if requirements.matches(self.library, &version) {
                return SelectedImage {
                    reference: self.image(&tag),
                    reason: SelectionReason::Matched(version),
                };
            }
        }

        debug!(
            "No {} tag satisfies the constraints for {}",
            self.repository, self.library
        );
        self.latest(SelectionReason::NoMatch)
    }

    fn extra_build_steps(&self) -> &str {
        self.extra_build_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AilessError, Result};
    use std::cell::Cell;

    struct FixedTags {
        tags: Vec<&'static str>,
        calls: Cell<usize>,
    }

    impl FixedTags {
        fn new(tags: &[&'static str]) -> Self {
            Self {
                tags: tags.to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl TagSource for FixedTags {
        fn list_tags(&self, _repository: &str, _filter: Option<&str>) -> Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.tags.iter().map(|t| t.to_string()).collect())
        }
    }

    struct DownRegistry;

    impl TagSource for DownRegistry {
        fn list_tags(&self, repository: &str, _filter: Option<&str>) -> Result<Vec<String>> {
            Err(AilessError::RegistryUnavailable {
                repository: repository.to_string(),
                message: "connection refused".into(),
            })
        }
    }

    fn reqs(lines: &[&str]) -> RequirementSet {
        RequirementSet::from_lines(lines.iter().copied(), None).unwrap()
    }

    fn nvidia() -> DeploymentProfile {
        DeploymentProfile::gpu(CpuArchitecture::Amd64, "NVIDIA")
    }

    #[test]
    fn gpu_searcher_requires_matching_vendor() {
        let requirements = reqs(&["torch==2.0.1"]);
        assert!(PYTORCH_AMD64_NVIDIA.is_suitable(&nvidia(), &requirements));
        assert!(!PYTORCH_AMD64_NVIDIA.is_suitable(
            &DeploymentProfile::gpu(CpuArchitecture::Amd64, "AMD"),
            &requirements
        ));
        assert!(!PYTORCH_AMD64_NVIDIA.is_suitable(
            &DeploymentProfile::cpu(CpuArchitecture::Amd64),
            &requirements
        ));
    }

    #[test]
    fn searcher_requires_library_and_architecture() {
        let profile = DeploymentProfile::cpu(CpuArchitecture::Amd64);
        assert!(TENSORFLOW_AMD64.is_suitable(&profile, &reqs(&["tensorflow"])));
        assert!(!TENSORFLOW_AMD64.is_suitable(&profile, &reqs(&["torch"])));
        assert!(!TENSORFLOW_AMD64.is_suitable(
            &DeploymentProfile::cpu(CpuArchitecture::Arm64),
            &reqs(&["tensorflow"])
        ));
        assert!(!TENSORFLOW_AMD64.is_suitable(&nvidia(), &reqs(&["tensorflow"])));
    }

    #[test]
    fn unconstrained_library_uses_latest_without_fetching() {
        let tags = FixedTags::new(&["2.12.0-gpu"]);
        let image =
            TENSORFLOW_AMD64_NVIDIA.select_image(&nvidia(), &reqs(&["tensorflow"]), &tags);

        assert_eq!(image.reference, "tensorflow/tensorflow:latest-gpu");
        assert_eq!(image.reason, SelectionReason::Unconstrained);
        assert_eq!(tags.calls.get(), 0);
    }

    #[test]
    fn first_matching_tag_in_registry_order_wins() {
        let tags = FixedTags::new(&[
            "latest-gpu",
            "2.13.0-gpu-jupyter",
            "2.13.0-gpu",
            "2.12.0-gpu-jupyter",
            "2.12.0-gpu",
            "2.11.1-gpu",
        ]);
        let image = TENSORFLOW_AMD64_NVIDIA.select_image(
            &nvidia(),
            &reqs(&["tensorflow==2.12"]),
            &tags,
        );

        assert_eq!(image.reference, "tensorflow/tensorflow:2.12.0-gpu");
        assert_eq!(image.reason, SelectionReason::Matched(Version::from([2, 12, 0])));
    }

    #[test]
    fn cpu_searcher_skips_gpu_variants() {
        let tags = FixedTags::new(&["2.12.0-gpu", "2.12.0-jupyter", "2.12.0", "latest"]);
        let image = TENSORFLOW_AMD64.select_image(
            &DeploymentProfile::cpu(CpuArchitecture::Amd64),
            &reqs(&["tensorflow>=2.10,<2.13"]),
            &tags,
        );
        assert_eq!(image.reference, "tensorflow/tensorflow:2.12.0");
    }

    #[test]
    fn pytorch_tag_version_is_prefix_before_dash() {
        let tags = FixedTags::new(&[
            "2.1.0-cuda12.1-cudnn8-runtime",
            "2.0.1-cuda11.7-cudnn8-runtime",
            "1.13.1-cuda11.6-cudnn8-runtime",
        ]);
        let image = PYTORCH_AMD64_NVIDIA.select_image(
            &nvidia(),
            &reqs(&["torch>=1.13,<2.1"]),
            &tags,
        );
        assert_eq!(
            image.reference,
            "pytorch/pytorch:2.0.1-cuda11.7-cudnn8-runtime"
        );
    }

    #[test]
    fn no_matching_tag_falls_back_to_latest() {
        let tags = FixedTags::new(&["2.13.0-gpu", "2.11.0-gpu"]);
        let image = TENSORFLOW_AMD64_NVIDIA.select_image(
            &nvidia(),
            &reqs(&["tensorflow==2.12"]),
            &tags,
        );
        assert_eq!(image.reference, "tensorflow/tensorflow:latest-gpu");
        assert_eq!(image.reason, SelectionReason::NoMatch);
        assert!(image.reason.is_fallback());
    }

    #[test]
    fn registry_failure_falls_back_to_latest() {
        let image =
            PYTORCH_AMD64_NVIDIA.select_image(&nvidia(), &reqs(&["torch==2.0.1"]), &DownRegistry);
        assert_eq!(image.reference, "pytorch/pytorch:latest");
        assert!(matches!(
            image.reason,
            SelectionReason::RegistryUnavailable(ref msg) if msg.contains("connection refused")
        ));
    }

    #[test]
    fn unparseable_tags_are_skipped() {
        let tags = FixedTags::new(&["nightly", "2.0.1rc-runtime", "", "2.0.1-runtime"]);
        let image =
            PYTORCH_AMD64_NVIDIA.select_image(&nvidia(), &reqs(&["torch==2.0.1"]), &tags);
        assert_eq!(image.reference, "pytorch/pytorch:2.0.1-runtime");
    }

    #[test]
    fn extra_build_steps_are_per_searcher() {
        assert_eq!(
            PYTORCH_AMD64_NVIDIA.extra_build_steps(),
            "RUN apt-get install -y libglib2.0-0"
        );
        assert_eq!(TENSORFLOW_AMD64.extra_build_steps(), "");
    }

    #[test]
    fn builtin_order_puts_gpu_searchers_first() {
        let names: Vec<&str> = builtin_searchers().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["tensorflow-amd64-nvidia", "pytorch-amd64-nvidia", "tensorflow-amd64"]
        );
    }

    #[test]
    fn selected_image_displays_reference() {
        let image = SelectedImage {
            reference: "pytorch/pytorch:latest".into(),
            reason: SelectionReason::Unconstrained,
        };
        assert_eq!(image.to_string(), "pytorch/pytorch:latest");
        assert!(!image.reason.is_fallback());
    }
}

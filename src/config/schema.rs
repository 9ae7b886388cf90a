//! Configuration schema for `.ailess/config.json`.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AilessError, Result};
use crate::images::{
    CpuArchitecture, DeploymentProfile, HttpTagSource, DEFAULT_BASE_IMAGE, DEFAULT_REGISTRY_URL,
};
use crate::requirements::{Version, VersionComparison};

/// Default requirements file, relative to the project root.
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.txt";

/// Default registry request timeout in seconds.
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 30;

/// Root configuration structure for `.ailess/config.json`.
///
/// Every field is optional so partial files and local overrides
/// deserialize cleanly; accessors supply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    /// Port the application listens on. Accepts `5000` or `"5000"`.
    #[serde(
        deserialize_with = "deserialize_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub host_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances_count: Option<u32>,

    /// EC2 instance type, e.g. `g4dn.xlarge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec2_instance_type: Option<String>,

    /// Script started by the container, relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_architecture: Option<CpuArchitecture>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_gpu: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_manufacturer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements_file: Option<PathBuf>,

    /// Registry API base URL (Docker Hub by default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    /// Image used when no specialized searcher applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_comparison: Option<VersionComparison>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_timeout_secs: Option<u64>,

    /// CUDA version whose `nvidia/cuda` runtime image is used when no
    /// library-specific image applies, e.g. `11.8`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuda_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<PortValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PortValue::Number(port)) => Ok(Some(port)),
        Some(PortValue::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid host_port '{}'", text))),
    }
}

impl DeployConfig {
    /// Derive the deployment profile.
    ///
    /// Explicit fields win; gaps are filled from `ec2_instance_type` when
    /// the instance family is known, then default to amd64 without a GPU.
    pub fn profile(&self) -> DeploymentProfile {
        let inferred = self
            .ec2_instance_type
            .as_deref()
            .and_then(DeploymentProfile::from_instance_type)
            .unwrap_or_default();

        let has_gpu = self.has_gpu.unwrap_or(inferred.has_gpu);
        let gpu_manufacturer = if has_gpu {
            self.gpu_manufacturer
                .clone()
                .or(inferred.gpu_manufacturer)
        } else {
            None
        };

        DeploymentProfile {
            cpu_architecture: self.cpu_architecture.unwrap_or(inferred.cpu_architecture),
            has_gpu,
            gpu_manufacturer,
        }
    }

    /// Absolute path of the requirements file for `project_root`.
    pub fn requirements_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(
            self.requirements_file
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_REQUIREMENTS_FILE)),
        )
    }

    pub fn registry_url(&self) -> &str {
        self.registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(
            self.registry_timeout_secs
                .unwrap_or(DEFAULT_REGISTRY_TIMEOUT_SECS),
        )
    }

    pub fn default_image(&self) -> &str {
        self.default_image.as_deref().unwrap_or(DEFAULT_BASE_IMAGE)
    }

    pub fn comparison(&self) -> VersionComparison {
        self.version_comparison.unwrap_or_default()
    }

    /// The configured CUDA version, if it parses.
    pub fn cuda_version(&self) -> Option<Version> {
        self.cuda_version.as_deref().and_then(|v| Version::parse(v.trim()))
    }

    /// HTTP tag source for the configured registry.
    pub fn tag_source(&self) -> Result<HttpTagSource> {
        HttpTagSource::with_options(self.registry_url(), self.registry_timeout())
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(AilessError::ConfigValidationError {
                message: message.to_string(),
            })
        };

        if self.host_port == Some(0) {
            return invalid("host_port must be between 1 and 65535");
        }
        if self.instances_count == Some(0) {
            return invalid("instances_count must be at least 1");
        }
        if self.registry_timeout_secs == Some(0) {
            return invalid("registry_timeout_secs must be greater than 0");
        }
        if self
            .entrypoint_path
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return invalid("entrypoint_path must not be empty");
        }
        if self.cuda_version.is_some() && self.cuda_version().is_none() {
            return invalid("cuda_version must be numeric, e.g. 11.8");
        }
        if let Some(url) = &self.registry_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return invalid("registry_url must start with http:// or https://");
            }
        }
        Ok(())
    }
}

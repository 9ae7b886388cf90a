//! Hardware/deployment profiles used to filter image searchers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target CPU architecture of the deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CpuArchitecture {
    #[default]
    Amd64,
    Arm64,
}

impl CpuArchitecture {
    /// The Docker platform string, e.g. `linux/amd64`.
    pub fn platform(self) -> &'static str {
        match self {
            Self::Amd64 => "linux/amd64",
            Self::Arm64 => "linux/arm64",
        }
    }
}

impl FromStr for CpuArchitecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linux/amd64" | "amd64" | "x86_64" => Ok(Self::Amd64),
            "linux/arm64" | "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(format!("unknown CPU architecture: {}", s)),
        }
    }
}

impl TryFrom<String> for CpuArchitecture {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CpuArchitecture> for String {
    fn from(arch: CpuArchitecture) -> Self {
        arch.platform().to_string()
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.platform())
    }
}

/// The hardware an application will be deployed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentProfile {
    pub cpu_architecture: CpuArchitecture,
    pub has_gpu: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_manufacturer: Option<String>,
}

impl DeploymentProfile {
    /// A CPU-only profile.
    pub fn cpu(cpu_architecture: CpuArchitecture) -> Self {
        Self {
            cpu_architecture,
            has_gpu: false,
            gpu_manufacturer: None,
        }
    }

    /// A profile with a GPU from `manufacturer`.
    pub fn gpu(cpu_architecture: CpuArchitecture, manufacturer: &str) -> Self {
        Self {
            cpu_architecture,
            has_gpu: true,
            gpu_manufacturer: Some(manufacturer.to_string()),
        }
    }

    /// Whether the profile has a GPU made by `manufacturer` (case-insensitive).
    pub fn has_gpu_from(&self, manufacturer: &str) -> bool {
        self.has_gpu
            && self
                .gpu_manufacturer
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(manufacturer))
    }

    /// Infer a profile from an EC2 instance type such as `g4dn.xlarge`.
    ///
    /// Returns `None` when the instance family is not recognizable.
    pub fn from_instance_type(instance_type: &str) -> Option<Self> {
        let family = instance_type
            .split_whitespace()
            .next()?
            .split('.')
            .next()?
            .to_lowercase();

        let digit_at = family.find(|c: char| c.is_ascii_digit())?;
        if digit_at == 0 {
            return None;
        }

        if let Some(&(_, arch, vendor)) = GPU_FAMILIES.iter().find(|(f, _, _)| *f == family) {
            return Some(Self::gpu(arch, vendor));
        }

        let suffix = family[digit_at..].trim_start_matches(|c: char| c.is_ascii_digit());
        let arch = if family == "a1" || suffix.starts_with('g') {
            CpuArchitecture::Arm64
        } else {
            CpuArchitecture::Amd64
        };
        Some(Self::cpu(arch))
    }
}

/// EC2 GPU families, their CPU architecture and GPU vendor.
const GPU_FAMILIES: &[(&str, CpuArchitecture, &str)] = &[
    ("p2", CpuArchitecture::Amd64, "NVIDIA"),
    ("p3", CpuArchitecture::Amd64, "NVIDIA"),
    ("p3dn", CpuArchitecture::Amd64, "NVIDIA"),
    ("p4d", CpuArchitecture::Amd64, "NVIDIA"),
    ("p4de", CpuArchitecture::Amd64, "NVIDIA"),
    ("p5", CpuArchitecture::Amd64, "NVIDIA"),
    ("g3", CpuArchitecture::Amd64, "NVIDIA"),
    ("g3s", CpuArchitecture::Amd64, "NVIDIA"),
    ("g4dn", CpuArchitecture::Amd64, "NVIDIA"),
    ("g5", CpuArchitecture::Amd64, "NVIDIA"),
    ("g5g", CpuArchitecture::Arm64, "NVIDIA"),
    ("g6", CpuArchitecture::Amd64, "NVIDIA"),
    ("g6e", CpuArchitecture::Amd64, "NVIDIA"),
    ("g4ad", CpuArchitecture::Amd64, "AMD"),
];

impl fmt::Display for DeploymentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.has_gpu, &self.gpu_manufacturer) {
            (true, Some(vendor)) => write!(f, "{} with {} GPU", self.cpu_architecture, vendor),
            (true, None) => write!(f, "{} with GPU", self.cpu_architecture),
            (false, _) => write!(f, "{} without GPU", self.cpu_architecture),
        }
    }
}

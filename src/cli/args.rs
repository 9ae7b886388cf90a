//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::images::CpuArchitecture;

/// ailess - Pick base images and generate Dockerfiles for Python ML services.
#[derive(Debug, Parser)]
#[command(name = "ailess")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Registry API base URL (overrides registry_url in config)
    #[arg(long, global = true, env = "AILESS_REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the resolved requirement set
    Requirements(RequirementsArgs),

    /// Check whether a package version satisfies the requirements
    Check(CheckArgs),

    /// Select a base image for the deployment
    Image(ImageArgs),

    /// Generate the Dockerfile and update .dockerignore
    Dockerfile(DockerfileArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `requirements` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RequirementsArgs {
    /// Requirements file (overrides requirements_file in config)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CheckArgs {
    /// Package name
    pub package: String,

    /// Candidate version, e.g. 2.0.1
    #[arg(id = "candidate_version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Requirements file (overrides requirements_file in config)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Hardware overrides shared by image-selecting commands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProfileArgs {
    /// Target CPU architecture (amd64, arm64)
    #[arg(long)]
    pub arch: Option<CpuArchitecture>,

    /// Target a GPU from this vendor (e.g. NVIDIA)
    #[arg(long, value_name = "VENDOR", conflicts_with = "no_gpu")]
    pub gpu: Option<String>,

    /// Target a machine without a GPU
    #[arg(long)]
    pub no_gpu: bool,
}

/// Arguments for the `image` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ImageArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Requirements file (overrides requirements_file in config)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Arguments for the `dockerfile` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DockerfileArgs {
    /// Script the container runs (overrides entrypoint_path in config)
    #[arg(short, long)]
    pub entrypoint: Option<String>,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Requirements file (overrides requirements_file in config)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Print only the derived deployment profile
    #[arg(long)]
    pub profile: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_with_version() {
        let cli = Cli::parse_from(["ailess", "check", "torch", "2.0.1"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.package, "torch");
                assert_eq!(args.version.as_deref(), Some("2.0.1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_image_profile_overrides() {
        let cli = Cli::parse_from(["ailess", "image", "--arch", "arm64", "--gpu", "NVIDIA"]);
        match cli.command {
            Commands::Image(args) => {
                assert_eq!(args.profile.arch, Some(CpuArchitecture::Arm64));
                assert_eq!(args.profile.gpu.as_deref(), Some("NVIDIA"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_architecture() {
        assert!(Cli::try_parse_from(["ailess", "image", "--arch", "riscv"]).is_err());
    }

    #[test]
    fn gpu_and_no_gpu_conflict() {
        assert!(Cli::try_parse_from(["ailess", "image", "--gpu", "AMD", "--no-gpu"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ailess",
            "requirements",
            "--quiet",
            "--registry-url",
            "http://localhost:1",
        ]);
        assert!(cli.quiet);
        assert_eq!(cli.registry_url.as_deref(), Some("http://localhost:1"));
    }
}

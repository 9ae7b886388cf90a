//! Shared project loading for commands.
//!
//! Commands that read requirements or select images go through
//! [`ProjectContext`], which applies CLI overrides on top of the merged
//! configuration.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::args::ProfileArgs;
use crate::config::{load_merged_config, project_config_path, DeployConfig};
use crate::error::{AilessError, Result};
use crate::images::{BaseImage, DeploymentProfile, ImageSelector};
use crate::requirements::{RequirementSet, RequirementSetBuilder};
use crate::ui::UserInterface;

/// Configuration and paths for the project a command runs against.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root: PathBuf,
    config: DeployConfig,
    config_found: bool,
}

impl ProjectContext {
    /// Load the project's merged config, falling back to defaults when the
    /// project has no `.ailess/config.json`.
    pub fn load(root: &Path, registry_url: Option<&str>) -> Result<Self> {
        let (mut config, config_found) = match load_merged_config(root) {
            Ok(config) => (config, true),
            Err(AilessError::ConfigNotFound { .. }) => {
                debug!("No config at {}", project_config_path(root).display());
                (DeployConfig::default(), false)
            }
            Err(e) => return Err(e),
        };

        if let Some(url) = registry_url {
            config.registry_url = Some(url.to_string());
            config.validate()?;
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
            config_found,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Whether a project config file was found.
    pub fn config_found(&self) -> bool {
        self.config_found
    }

    /// Tell the user defaults are in use when no config was found.
    pub fn warn_if_unconfigured(&self, ui: &mut dyn UserInterface) {
        if !self.config_found {
            ui.warning(&format!(
                "No {} found, using defaults",
                project_config_path(&self.root).display()
            ));
        }
    }

    /// The requirements file, honoring a command-line override.
    ///
    /// Relative overrides resolve against the project root.
    pub fn requirements_path(&self, file_override: Option<&Path>) -> PathBuf {
        match file_override {
            Some(path) => self.root.join(path),
            None => self.config.requirements_path(&self.root),
        }
    }

    /// Build the requirement set, reporting degraded lines as warnings.
    pub fn requirements(
        &self,
        file_override: Option<&Path>,
        ui: &mut dyn UserInterface,
    ) -> Result<RequirementSet> {
        let path = self.requirements_path(file_override);
        let set = RequirementSetBuilder::new()
            .with_comparison(self.config.comparison())
            .build_file(&path)?;

        for line in set.degraded() {
            let origin = line
                .source
                .as_deref()
                .map(|p| p.strip_prefix(&self.root).unwrap_or(p).display().to_string())
                .unwrap_or_else(|| "<input>".to_string());
            ui.warning(&format!(
                "Ignoring unparseable line {}:{}: {}",
                origin,
                line.line_number,
                line.text.trim()
            ));
        }
        Ok(set)
    }

    /// The deployment profile after applying command-line overrides.
    pub fn profile(&self, overrides: &ProfileArgs) -> DeploymentProfile {
        let mut profile = self.config.profile();
        if let Some(arch) = overrides.arch {
            profile.cpu_architecture = arch;
        }
        if let Some(vendor) = &overrides.gpu {
            profile.has_gpu = true;
            profile.gpu_manufacturer = Some(vendor.clone());
        }
        if overrides.no_gpu {
            profile.has_gpu = false;
            profile.gpu_manufacturer = None;
        }
        profile
    }

    /// Resolve the base image with a progress spinner.
    pub fn resolve_image(
        &self,
        profile: &DeploymentProfile,
        requirements: &RequirementSet,
        ui: &mut dyn UserInterface,
    ) -> Result<BaseImage> {
        let mut selector =
            ImageSelector::builtin().with_default_image(self.config.default_image());
        if let Some(cuda) = self.config.cuda_version() {
            selector = selector.with_cuda_version(cuda);
        }
        let tags = self.config.tag_source()?;

        if ui.output_mode().shows_details() {
            ui.show_hint(&format!("Searchers: {}", selector.searcher_names().join(", ")));
            if let Some(cuda) = self.config.cuda_version() {
                ui.show_hint(&format!("CUDA fallback: {}", cuda));
            }
            ui.show_hint(&format!("Default image: {}", selector.default_image()));
        }

        let mut spinner = ui.start_spinner(&format!("Selecting base image for {}", profile));
        let image = selector.resolve(profile, requirements, &tags);
        if image.reason.is_fallback() {
            spinner.finish_skipped(&format!("{} ({})", image.reference, image.reason));
        } else {
            spinner.finish_success(&image.reference);
        }
        Ok(image)
    }
}

//! Image command implementation.
//!
//! The `ailess image` command selects the base image for the deployment.

use std::path::{Path, PathBuf};

use crate::cli::args::ImageArgs;
use crate::error::Result;
use crate::images::BaseImage;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::project::ProjectContext;

/// The image command implementation.
pub struct ImageCommand {
    project_root: PathBuf,
    registry_url: Option<String>,
    args: ImageArgs,
}

impl ImageCommand {
    /// Create a new image command.
    pub fn new(project_root: &Path, registry_url: Option<String>, args: ImageArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            registry_url,
            args,
        }
    }
}

/// Print the selection details below the image reference.
pub fn show_selection(ui: &mut dyn UserInterface, image: &BaseImage) {
    match &image.searcher {
        Some(searcher) => ui.show_hint(&format!("{} via {}", image.reason, searcher)),
        None => ui.show_hint(&image.reason.to_string()),
    }
    for step in image.extra_build_steps.lines() {
        ui.show_hint(&format!("extra build step: {}", step));
    }
}

impl Command for ImageCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.registry_url.as_deref())?;
        ctx.warn_if_unconfigured(ui);

        let requirements = ctx.requirements(self.args.file.as_deref(), ui)?;
        let profile = ctx.profile(&self.args.profile);
        let image = ctx.resolve_image(&profile, &requirements, ui)?;

        ui.message(&image.reference);
        show_selection(ui, &image);

        Ok(CommandResult::success())
    }
}

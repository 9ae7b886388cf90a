//! Check command implementation.
//!
//! The `ailess check <package> [version]` command reports whether a package
//! is declared and whether a candidate version satisfies its constraints.

use std::path::{Path, PathBuf};

use crate::cli::args::CheckArgs;
use crate::error::Result;
use crate::requirements::Version;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::project::ProjectContext;
use super::requirements::{describe_constraints, describe_package};

/// The check command implementation.
pub struct CheckCommand {
    project_root: PathBuf,
    registry_url: Option<String>,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(project_root: &Path, registry_url: Option<String>, args: CheckArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            registry_url,
            args,
        }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.registry_url.as_deref())?;
        let set = ctx.requirements(self.args.file.as_deref(), ui)?;
        let package = &self.args.package;

        if !set.is_declared(package) {
            ui.error(&format!("{} is not declared", package));
            return Ok(CommandResult::failure(1));
        }

        let Some(raw) = &self.args.version else {
            ui.message(&describe_package(&set, package));
            return Ok(CommandResult::success());
        };

        let Some(version) = Version::parse(raw) else {
            ui.error(&format!(
                "'{}' is not a numeric version (expected e.g. 2.0.1)",
                raw
            ));
            return Ok(CommandResult::failure(2));
        };

        if set.matches(package, &version) {
            ui.success(&format!(
                "{} {} satisfies {}",
                package,
                version,
                describe_constraints(&set, package)
            ));
            Ok(CommandResult::success())
        } else {
            ui.error(&format!(
                "{} {} does not satisfy {}",
                package,
                version,
                describe_constraints(&set, package)
            ));
            Ok(CommandResult::failure(1))
        }
    }
}

//! Requirements command implementation.
//!
//! The `ailess requirements` command lists the resolved requirement set.

use std::path::{Path, PathBuf};

use crate::cli::args::RequirementsArgs;
use crate::error::Result;
use crate::requirements::RequirementSet;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::project::ProjectContext;

/// The requirements command implementation.
pub struct RequirementsCommand {
    project_root: PathBuf,
    registry_url: Option<String>,
    args: RequirementsArgs,
}

impl RequirementsCommand {
    /// Create a new requirements command.
    pub fn new(project_root: &Path, registry_url: Option<String>, args: RequirementsArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            registry_url,
            args,
        }
    }
}

/// Render the constraints of `name`, e.g. `>=1.13,<2.1`.
pub fn describe_constraints(set: &RequirementSet, name: &str) -> String {
    match set.constraints(name) {
        Some([]) | None => "(any version)".to_string(),
        Some(constraints) => constraints
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Render one package as `name  constraint,constraint`.
pub fn describe_package(set: &RequirementSet, name: &str) -> String {
    format!("{}  {}", name, describe_constraints(set, name))
}

impl Command for RequirementsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.registry_url.as_deref())?;
        let path = ctx.requirements_path(self.args.file.as_deref());
        let set = ctx.requirements(self.args.file.as_deref(), ui)?;

        ui.show_header(&format!("Requirements from {}", path.display()));
        for name in set.names() {
            ui.message(&describe_package(&set, name));
        }

        let noun = if set.len() == 1 { "package" } else { "packages" };
        ui.show_hint(&format!(
            "{} {} declared, {} line(s) ignored, {} matching",
            set.len(),
            noun,
            set.degraded().len(),
            set.comparison().as_str()
        ));

        Ok(CommandResult::success())
    }
}

//! Config command implementation.
//!
//! The `ailess config` command shows the resolved configuration and the
//! deployment profile derived from it.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cli::args::ConfigArgs;
use crate::config::{load_merged_config, ConfigPaths};
use crate::error::{AilessError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The config command implementation.
pub struct ConfigCommand {
    project_root: PathBuf,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(project_root: &Path, args: ConfigArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match load_merged_config(&self.project_root) {
            Ok(c) => c,
            Err(AilessError::ConfigNotFound { path }) => {
                ui.error(&format!("No configuration found at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        let profile = config.profile();
        let requirements_file = config
            .requirements_path(&self.project_root)
            .display()
            .to_string();
        let value = if self.args.profile {
            serde_json::to_value(&profile)
        } else {
            serde_json::to_value(&config).map(|config| {
                json!({
                    "config": config,
                    "profile": profile,
                    "requirements_file": requirements_file,
                })
            })
        }
        .map_err(|e| AilessError::Other(e.into()))?;

        for path in ConfigPaths::discover(&self.project_root).all_existing() {
            ui.show_hint(&format!("# {}", path.display()));
        }

        let rendered =
            serde_json::to_string_pretty(&value).map_err(|e| AilessError::Other(e.into()))?;
        ui.message(&rendered);

        Ok(CommandResult::success())
    }
}

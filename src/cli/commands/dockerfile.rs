//! Dockerfile command implementation.
//!
//! The `ailess dockerfile` command writes `.ailess/Dockerfile` for the
//! selected base image and keeps `.dockerignore` up to date.

use std::path::{Path, PathBuf};

use crate::cli::args::DockerfileArgs;
use crate::error::{AilessError, Result};
use crate::images::{update_dockerignore, write_dockerfile, DockerfileOutcome};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::image::show_selection;
use super::project::ProjectContext;

/// The dockerfile command implementation.
pub struct DockerfileCommand {
    project_root: PathBuf,
    registry_url: Option<String>,
    args: DockerfileArgs,
}

impl DockerfileCommand {
    /// Create a new dockerfile command.
    pub fn new(project_root: &Path, registry_url: Option<String>, args: DockerfileArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            registry_url,
            args,
        }
    }
}

impl Command for DockerfileCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.registry_url.as_deref())?;
        ctx.warn_if_unconfigured(ui);

        let entrypoint = self
            .args
            .entrypoint
            .clone()
            .or_else(|| ctx.config().entrypoint_path.clone())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AilessError::ConfigValidationError {
                message: "No entrypoint configured. Set entrypoint_path in .ailess/config.json \
                          or pass --entrypoint"
                    .to_string(),
            })?;

        if !ctx.root().join(&entrypoint).is_file() {
            ui.warning(&format!("Entrypoint {} does not exist yet", entrypoint));
        }

        let requirements = ctx.requirements(self.args.file.as_deref(), ui)?;
        let profile = ctx.profile(&self.args.profile);
        let image = ctx.resolve_image(&profile, &requirements, ui)?;
        show_selection(ui, &image);

        let outcome = write_dockerfile(ctx.root(), &image, &entrypoint)?;
        match &outcome {
            DockerfileOutcome::Written(path) => {
                ui.success(&format!("Wrote {} (FROM {})", path.display(), image.reference));
            }
            DockerfileOutcome::ProjectOwned(path) => {
                ui.warning(&format!(
                    "Using existing {}; it was not modified",
                    path.display()
                ));
            }
        }

        let added = update_dockerignore(ctx.root())?;
        if !added.is_empty() {
            ui.success(&format!("Added {} to .dockerignore", added.join(", ")));
        }

        let dockerfile = outcome.path();
        ui.show_hint(&format!(
            "Build with: docker build -f {} .",
            dockerfile
                .strip_prefix(ctx.root())
                .unwrap_or(dockerfile)
                .display()
        ));

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn project(config: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".ailess")).unwrap();
        fs::write(temp.path().join(".ailess/config.json"), config).unwrap();
        fs::write(temp.path().join("requirements.txt"), "flask\n").unwrap();
        fs::write(temp.path().join("app.py"), "print('hi')\n").unwrap();
        temp
    }

    #[test]
    fn writes_dockerfile_from_config_entrypoint() {
        let temp = project(r#"{"entrypoint_path": "app.py"}"#);
        let cmd = DockerfileCommand::new(temp.path(), None, DockerfileArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        let dockerfile = fs::read_to_string(temp.path().join(".ailess/Dockerfile")).unwrap();
        assert!(dockerfile.starts_with("FROM python:3.9\n"));
        assert!(dockerfile.ends_with(r#"CMD ["python3", "-u", "app.py"]"#));
        assert!(ui.has_success(".dockerignore"));
        assert!(ui.has_hint("docker build -f .ailess/Dockerfile ."));
        assert!(ui.warnings().is_empty());
    }

    #[test]
    fn flag_overrides_config_entrypoint() {
        let temp = project(r#"{"entrypoint_path": "app.py", "default_image": "python:3.11"}"#);
        let args = DockerfileArgs {
            entrypoint: Some("serve.py".into()),
            ..Default::default()
        };
        let mut ui = MockUI::new();

        DockerfileCommand::new(temp.path(), None, args)
            .execute(&mut ui)
            .unwrap();

        let dockerfile = fs::read_to_string(temp.path().join(".ailess/Dockerfile")).unwrap();
        assert!(dockerfile.starts_with("FROM python:3.11\n"));
        assert!(dockerfile.contains("serve.py"));
        assert!(ui.has_warning("serve.py does not exist"));
    }

    #[test]
    fn missing_entrypoint_is_an_error() {
        let temp = project("{}");
        let cmd = DockerfileCommand::new(temp.path(), None, DockerfileArgs::default());
        let err = cmd.execute(&mut MockUI::new()).err().unwrap();
        assert!(matches!(err, AilessError::ConfigValidationError { .. }));
    }

    #[test]
    fn keeps_project_dockerfile() {
        let temp = project(r#"{"entrypoint_path": "app.py"}"#);
        fs::write(temp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        let mut ui = MockUI::new();

        DockerfileCommand::new(temp.path(), None, DockerfileArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("Dockerfile")).unwrap(),
            "FROM scratch\n"
        );
        assert!(ui.has_warning("not modified"));
        assert!(ui.has_hint("docker build -f Dockerfile ."));
        assert!(!temp.path().join(".ailess/Dockerfile").exists());
    }

    #[test]
    fn second_run_leaves_dockerignore_alone() {
        let temp = project(r#"{"entrypoint_path": "app.py"}"#);
        let cmd = DockerfileCommand::new(temp.path(), None, DockerfileArgs::default());
        cmd.execute(&mut MockUI::new()).unwrap();

        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();

        assert!(!ui.has_success(".dockerignore"));
        assert_eq!(
            fs::read_to_string(temp.path().join(".dockerignore")).unwrap(),
            ".ailess/*\n.idea/*\n"
        );
    }
}

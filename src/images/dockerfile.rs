//! Dockerfile and `.dockerignore` generation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

use super::selector::BaseImage;

/// Directory holding generated deployment files.
pub const WORK_DIR: &str = ".ailess";

/// Entries every generated `.dockerignore` carries.
pub const IGNORED_ENTRIES: &[&str] = &[".ailess/*", ".idea/*"];

/// What happened when writing the Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerfileOutcome {
    /// A Dockerfile was generated at this path.
    Written(PathBuf),
    /// The project already has its own Dockerfile at this path.
    ProjectOwned(PathBuf),
}

impl DockerfileOutcome {
    /// The Dockerfile that will be used for builds.
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::ProjectOwned(path) => path,
        }
    }
}

/// Render Dockerfile text for `image` running `entrypoint`.
pub fn render(image: &BaseImage, entrypoint: &str) -> String {
    let mut lines = vec![format!("FROM {}", image.reference)];
    let extra = image.extra_build_steps.trim();
    if !extra.is_empty() {
        lines.push(extra.to_string());
    }
    lines.push("ADD requirements.txt /app/requirements.txt".to_string());
    lines.push("WORKDIR /app".to_string());
    lines.push("RUN pip3 install -r requirements.txt".to_string());
    lines.push("ADD . /app".to_string());
    lines.push(format!(
        "CMD [\"python3\", \"-u\", {}]",
        serde_json::Value::String(entrypoint.to_string())
    ));
    lines.join("\n")
}

/// The Dockerfile a build of `project_root` would use.
pub fn dockerfile_path(project_root: &Path) -> PathBuf {
    let own = project_root.join("Dockerfile");
    if own.is_file() {
        own
    } else {
        project_root.join(WORK_DIR).join("Dockerfile")
    }
}

/// Write `.ailess/Dockerfile` unless the project has a root `Dockerfile`.
pub fn write_dockerfile(
    project_root: &Path,
    image: &BaseImage,
    entrypoint: &str,
) -> Result<DockerfileOutcome> {
    let path = dockerfile_path(project_root);
    if !path.starts_with(project_root.join(WORK_DIR)) {
        debug!("Keeping project Dockerfile at {}", path.display());
        return Ok(DockerfileOutcome::ProjectOwned(path));
    }

    fs::create_dir_all(project_root.join(WORK_DIR))?;
    fs::write(&path, render(image, entrypoint))?;
    debug!("Wrote {}", path.display());
    Ok(DockerfileOutcome::Written(path))
}

/// Ensure `.dockerignore` lists the generated directories.
///
/// Returns the entries that were added; empty when nothing changed.
pub fn update_dockerignore(project_root: &Path) -> Result<Vec<&'static str>> {
    let path = project_root.join(".dockerignore");
    let existing = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        String::new()
    };

    let missing: Vec<&'static str> = IGNORED_ENTRIES
        .iter()
        .copied()
        .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
        .collect();

    if missing.is_empty() {
        return Ok(missing);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for entry in &missing {
        content.push_str(entry);
        content.push('\n');
    }
    fs::write(&path, content)?;
    debug!("Added {:?} to {}", missing, path.display());
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::searcher::SelectionReason;
    use tempfile::TempDir;

    fn image(reference: &str, extra: &str) -> BaseImage {
        BaseImage {
            reference: reference.to_string(),
            extra_build_steps: extra.to_string(),
            searcher: None,
            reason: SelectionReason::Default,
        }
    }

    #[test]
    fn renders_default_layout() {
        let text = render(&image("python:3.9", ""), "main.py");
        assert_eq!(
            text,
            "FROM python:3.9\n\
             ADD requirements.txt /app/requirements.txt\n\
             WORKDIR /app\n\
             RUN pip3 install -r requirements.txt\n\
             ADD . /app\n\
             CMD [\"python3\", \"-u\", \"main.py\"]"
        );
    }

    #[test]
    fn renders_extra_steps_after_from() {
        let text = render(
            &image("pytorch/pytorch:latest", "RUN apt-get install -y libglib2.0-0"),
            "app/serve.py",
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "FROM pytorch/pytorch:latest");
        assert_eq!(lines[1], "RUN apt-get install -y libglib2.0-0");
        assert_eq!(lines[2], "ADD requirements.txt /app/requirements.txt");
    }

    #[test]
    fn entrypoint_is_json_escaped() {
        let text = render(&image("python:3.9", ""), "my \"app\".py");
        assert!(text.ends_with(r#"CMD ["python3", "-u", "my \"app\".py"]"#));
    }

    #[test]
    fn writes_into_work_dir() {
        let temp = TempDir::new().unwrap();
        let outcome = write_dockerfile(temp.path(), &image("python:3.9", ""), "main.py").unwrap();

        let expected = temp.path().join(".ailess").join("Dockerfile");
        assert_eq!(outcome, DockerfileOutcome::Written(expected.clone()));
        assert!(fs::read_to_string(expected)
            .unwrap()
            .starts_with("FROM python:3.9"));
    }

    #[test]
    fn never_overwrites_project_dockerfile() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Dockerfile"), "FROM scratch\n").unwrap();

        let outcome = write_dockerfile(temp.path(), &image("python:3.9", ""), "main.py").unwrap();

        assert!(matches!(outcome, DockerfileOutcome::ProjectOwned(_)));
        assert_eq!(
            fs::read_to_string(temp.path().join("Dockerfile")).unwrap(),
            "FROM scratch\n"
        );
        assert!(!temp.path().join(".ailess").exists());
        assert_eq!(dockerfile_path(temp.path()), temp.path().join("Dockerfile"));
    }

    #[test]
    fn creates_dockerignore() {
        let temp = TempDir::new().unwrap();
        let added = update_dockerignore(temp.path()).unwrap();
        assert_eq!(added, IGNORED_ENTRIES);
        assert_eq!(
            fs::read_to_string(temp.path().join(".dockerignore")).unwrap(),
            ".ailess/*\n.idea/*\n"
        );
    }

    #[test]
    fn appends_missing_entries_on_new_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".dockerignore");
        fs::write(&path, "venv\n.idea/*").unwrap();

        let added = update_dockerignore(temp.path()).unwrap();

        assert_eq!(added, [".ailess/*"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "venv\n.idea/*\n.ailess/*\n");
    }

    #[test]
    fn dockerignore_update_is_idempotent() {
        let temp = TempDir::new().unwrap();
        update_dockerignore(temp.path()).unwrap();
        let first = fs::read_to_string(temp.path().join(".dockerignore")).unwrap();

        assert!(update_dockerignore(temp.path()).unwrap().is_empty());
        let second = fs::read_to_string(temp.path().join(".dockerignore")).unwrap();
        assert_eq!(first, second);
    }
}

//! Requirement sets: building them from files and querying them.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{AilessError, Result};

use super::specifier::{parse_line_in, Constraint, Specifier, SpecifierKind};
use super::version::{Version, VersionComparison};

/// A line that could not be classified as a usable specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedLine {
    /// File the line came from, if it was read from disk.
    pub source: Option<PathBuf>,
    /// 1-based line number within `source`.
    pub line_number: usize,
    pub text: String,
}

/// The flattened mapping from package name to its constraints.
///
/// Names are stored lower-cased and looked up case-insensitively. An empty
/// constraint list means the package was declared without constraints.
#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    packages: HashMap<String, Vec<Constraint>>,
    order: Vec<String>,
    degraded: Vec<DegradedLine>,
    comparison: VersionComparison,
}

impl RequirementSet {
    /// Build a set from a requirements file and everything it includes.
    pub fn from_file(path: &Path) -> Result<Self> {
        RequirementSetBuilder::new().build_file(path)
    }

    /// Build a set from in-memory lines.
    ///
    /// Include directives are resolved against `base_dir`, or the current
    /// directory when `None`.
    pub fn from_lines<I, S>(lines: I, base_dir: Option<&Path>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RequirementSetBuilder::new().build_lines(lines, base_dir)
    }

    /// Whether `name` was declared at all.
    pub fn is_declared(&self, name: &str) -> bool {
        self.packages.contains_key(&name.to_lowercase())
    }

    /// Whether `name` was declared with no constraints.
    pub fn is_unconstrained(&self, name: &str) -> bool {
        self.constraints(name).is_some_and(<[Constraint]>::is_empty)
    }

    /// The constraints declared for `name`.
    pub fn constraints(&self, name: &str) -> Option<&[Constraint]> {
        self.packages.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    /// Whether every constraint declared for `name` accepts `candidate`.
    ///
    /// Undeclared packages never match. No constraints, or an empty
    /// candidate, always match.
    pub fn matches(&self, name: &str, candidate: &Version) -> bool {
        let Some(constraints) = self.constraints(name) else {
            return false;
        };
        if constraints.is_empty() || candidate.is_empty() {
            return true;
        }
        constraints
            .iter()
            .all(|constraint| constraint.accepts(candidate, self.comparison))
    }

    /// Declared package names in first-declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of declared packages.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no package was declared.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Lines that could not be parsed.
    pub fn degraded(&self) -> &[DegradedLine] {
        &self.degraded
    }

    /// The comparison policy used by [`matches`](Self::matches).
    pub fn comparison(&self) -> VersionComparison {
        self.comparison
    }
}

/// A line waiting to be classified, with where it came from.
#[derive(Debug)]
struct SourceLine {
    text: String,
    source: Option<PathBuf>,
    line_number: usize,
    /// The line held bytes that are not valid UTF-8.
    lossy: bool,
}

impl SourceLine {
    fn base_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    /// Whether undecodable bytes sit outside the inline comment.
    fn is_undecodable(&self) -> bool {
        self.lossy
            && self
                .text
                .split('#')
                .next()
                .is_some_and(|code| code.contains(char::REPLACEMENT_CHARACTER))
    }
}

/// Builds a [`RequirementSet`], expanding include directives.
///
/// The builder owns the accumulated lines and the files already included,
/// each mapped to the file that first included it, so any include graph is
/// read at most once per file.
#[derive(Debug, Default)]
pub struct RequirementSetBuilder {
    comparison: VersionComparison,
    lines: Vec<SourceLine>,
    included_by: HashMap<PathBuf, Option<PathBuf>>,
    base_dir: Option<PathBuf>,
}

impl RequirementSetBuilder {
    /// Create a builder using the default comparison policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `comparison` for the built set's matcher.
    pub fn with_comparison(mut self, comparison: VersionComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Build from a file on disk.
    pub fn build_file(mut self, path: &Path) -> Result<RequirementSet> {
        self.include(path, None)?;
        self.expand()?;
        Ok(self.fold())
    }

    /// Build from in-memory lines.
    pub fn build_lines<I, S>(mut self, lines: I, base_dir: Option<&Path>) -> Result<RequirementSet>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(
            lines
                .into_iter()
                .enumerate()
                .map(|(i, text)| SourceLine {
                    text: text.into(),
                    source: None,
                    line_number: i + 1,
                    lossy: false,
                }),
        );
        self.base_dir = base_dir.map(Path::to_path_buf);
        self.expand()?;
        Ok(self.fold())
    }

    /// Append the lines of `path` unless it was already included.
    fn include(&mut self, path: &Path, referenced_from: Option<&Path>) -> Result<()> {
        let not_found = || AilessError::ReferencedFileNotFound {
            path: path.to_path_buf(),
            referenced_from: referenced_from.map(Path::to_path_buf),
        };

        if !path.is_file() {
            return Err(not_found());
        }
        let canonical = path.canonicalize().map_err(|_| not_found())?;
        if self.included_by.contains_key(&canonical) {
            if self.is_on_include_chain(&canonical, referenced_from) {
                warn!(
                    "Skipping {}: already included (include cycle)",
                    path.display()
                );
            } else {
                debug!("Skipping {}: already included", path.display());
            }
            return Ok(());
        }
        self.included_by
            .insert(canonical.clone(), referenced_from.map(Path::to_path_buf));

        debug!("Reading requirements from {}", canonical.display());
        let bytes = fs::read(&canonical)?;
        let content = String::from_utf8_lossy(&bytes);
        let lossy = matches!(content, Cow::Owned(_));
        if lossy {
            warn!("{} is not valid UTF-8", canonical.display());
        }
        self.lines
            .extend(content.lines().enumerate().map(|(i, text)| SourceLine {
                text: text.to_string(),
                source: Some(canonical.clone()),
                line_number: i + 1,
                lossy: lossy && text.contains(char::REPLACEMENT_CHARACTER),
            }));
        Ok(())
    }

    /// Whether `target` is `referrer` or one of the files that led to it.
    fn is_on_include_chain(&self, target: &Path, referrer: Option<&Path>) -> bool {
        let mut current = referrer;
        while let Some(file) = current {
            if file == target {
                return true;
            }
            current = self.included_by.get(file).and_then(Option::as_deref);
        }
        false
    }

    /// Expand include directives until none remain unread.
    fn expand(&mut self) -> Result<()> {
        let mut index = 0;
        while index < self.lines.len() {
            let line = &self.lines[index];
            if line.is_undecodable() {
                index += 1;
                continue;
            }
            let dir = self.line_dir(line).map(Path::to_path_buf);
            let spec = parse_line_in(&line.text, dir.as_deref());

            if let SpecifierKind::Include { path, .. } = spec.kind {
                let target = match &dir {
                    Some(dir) => dir.join(&path),
                    None => path,
                };
                let referrer = line.source.clone();
                self.include(&target, referrer.as_deref())?;
            }
            index += 1;
        }
        Ok(())
    }

    /// Directory relative paths on `line` resolve against.
    fn line_dir<'a>(&'a self, line: &'a SourceLine) -> Option<&'a Path> {
        line.base_dir().or(self.base_dir.as_deref())
    }

    /// Classify every accumulated line into the final mapping.
    fn fold(self) -> RequirementSet {
        let mut set = RequirementSet {
            comparison: self.comparison,
            ..RequirementSet::default()
        };

        for line in &self.lines {
            let spec = if line.is_undecodable() {
                Specifier {
                    raw: line.text.clone(),
                    name: None,
                    kind: SpecifierKind::Unparseable,
                    constraints: Vec::new(),
                }
            } else {
                parse_line_in(&line.text, self.line_dir(line))
            };
            match spec.kind {
                SpecifierKind::Constrained | SpecifierKind::Unconstrained => {
                    let Some(name) = spec.name else { continue };
                    let key = name.to_lowercase();
                    if set.packages.contains_key(&key) {
                        debug!("Ignoring later declaration of '{}'", key);
                        continue;
                    }
                    set.order.push(key.clone());
                    set.packages.insert(key, spec.constraints);
                }
                SpecifierKind::Unparseable => {
                    warn!(
                        "Skipping unparseable requirement '{}'{}",
                        line.text.trim(),
                        line.source
                            .as_ref()
                            .map(|p| format!(" ({}:{})", p.display(), line.line_number))
                            .unwrap_or_default()
                    );
                    set.degraded.push(DegradedLine {
                        source: line.source.clone(),
                        line_number: line.line_number,
                        text: line.text.clone(),
                    });
                }
                _ => {}
            }
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(lines: &[&str]) -> RequirementSet {
        RequirementSet::from_lines(lines.iter().copied(), None).unwrap()
    }

    fn v(segments: &[u64]) -> Version {
        Version::from(segments)
    }

    #[test]
    fn range_accepts_version_inside() {
        let reqs = set(&["torch>=1.13,<3.0"]);
        assert!(reqs.matches("torch", &v(&[2, 0, 1])));
        assert!(!reqs.matches("torch", &v(&[1, 12])));
        assert!(!reqs.matches("torch", &v(&[3, 0])));
    }

    #[test]
    fn pin_rejects_other_version() {
        let reqs = set(&["torch==1.12"]);
        assert!(!reqs.matches("torch", &v(&[2, 0, 1])));
        assert!(reqs.matches("torch", &v(&[1, 12, 1])));
    }

    #[test]
    fn bare_name_is_unconstrained_and_matches_anything() {
        let reqs = set(&["numpy"]);
        assert!(reqs.is_declared("numpy"));
        assert!(reqs.is_unconstrained("numpy"));
        assert!(reqs.matches("numpy", &v(&[0, 1])));
        assert!(reqs.matches("numpy", &v(&[99])));
    }

    #[test]
    fn undeclared_never_matches() {
        let reqs = set(&["flask==2.0"]);
        assert!(!reqs.is_declared("django"));
        assert!(!reqs.is_unconstrained("django"));
        assert!(!reqs.matches("django", &Version::default()));
    }

    #[test]
    fn empty_candidate_matches_declared_package() {
        let reqs = set(&["flask==2.0"]);
        assert!(reqs.matches("flask", &Version::default()));
    }

    #[test]
    fn unrecognized_operator_fails_closed() {
        let reqs = set(&["flask=2.0"]);
        assert!(reqs.is_declared("flask"));
        assert!(!reqs.is_unconstrained("flask"));
        assert!(!reqs.matches("flask", &v(&[2, 0])));
    }

    #[test]
    fn not_equal_excludes_single_version() {
        let reqs = set(&["requests>=2.0,!=2.29.0"]);
        assert!(reqs.matches("requests", &v(&[2, 31, 0])));
        assert!(!reqs.matches("requests", &v(&[2, 29, 0])));
    }

    #[test]
    fn compatible_release_is_equality() {
        let reqs = set(&["tensorflow~=2.12"]);
        assert!(reqs.matches("tensorflow", &v(&[2, 12, 0])));
        assert!(!reqs.matches("tensorflow", &v(&[2, 13, 0])));
    }

    #[test]
    fn names_are_case_insensitive() {
        let reqs = set(&["Flask==2.0"]);
        assert!(reqs.is_declared("flask"));
        assert!(reqs.is_declared("FLASK"));
        assert_eq!(reqs.names().collect::<Vec<_>>(), ["flask"]);
    }

    #[test]
    fn first_declaration_wins() {
        let reqs = set(&["torch==1.13", "torch==2.0"]);
        assert_eq!(reqs.len(), 1);
        assert!(reqs.matches("torch", &v(&[1, 13])));
        assert!(!reqs.matches("torch", &v(&[2, 0])));
    }

    #[test]
    fn unparseable_lines_are_recorded_not_fatal() {
        let reqs = set(&["# deps", "", "flask==2.0", "torch==2.0.0rc1", "numpy"]);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs.degraded().len(), 1);
        assert_eq!(reqs.degraded()[0].line_number, 4);
        assert_eq!(reqs.degraded()[0].text, "torch==2.0.0rc1");
        assert!(!reqs.is_declared("torch"));
    }

    #[test]
    fn zero_pad_policy_distinguishes_patch_versions() {
        let reqs = RequirementSetBuilder::new()
            .with_comparison(VersionComparison::ZeroPad)
            .build_lines(["lib==1.2"], None)
            .unwrap();
        assert_eq!(reqs.comparison(), VersionComparison::ZeroPad);
        assert!(reqs.matches("lib", &v(&[1, 2, 0])));
        assert!(!reqs.matches("lib", &v(&[1, 2, 1])));

        let prefix = set(&["lib==1.2"]);
        assert!(prefix.matches("lib", &v(&[1, 2, 1])));
    }

    #[test]
    fn recursive_include_is_followed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "-r b.txt\n").unwrap();
        fs::write(temp.path().join("b.txt"), "flask==2.0\n").unwrap();

        let reqs = RequirementSet::from_file(&temp.path().join("a.txt")).unwrap();
        assert_eq!(
            reqs.constraints("flask").unwrap()[0].to_string(),
            "==2.0"
        );
    }

    #[test]
    fn include_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "-r b.txt\nnumpy\n").unwrap();
        fs::write(temp.path().join("b.txt"), "-r a.txt\nflask==2.0\n").unwrap();

        let reqs = RequirementSet::from_file(&temp.path().join("a.txt")).unwrap();
        assert!(reqs.is_declared("numpy"));
        assert!(reqs.is_declared("flask"));
        assert_eq!(reqs.len(), 2);
    }

    #[test]
    fn self_include_terminates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "-r ./a.txt\nnumpy\n").unwrap();

        let reqs = RequirementSet::from_file(&temp.path().join("a.txt")).unwrap();
        assert_eq!(reqs.len(), 1);
    }

    #[test]
    fn included_lines_come_after_including_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "-r b.txt\ntorch==2.0\n").unwrap();
        fs::write(temp.path().join("b.txt"), "torch==1.13\n").unwrap();

        let reqs = RequirementSet::from_file(&temp.path().join("a.txt")).unwrap();
        assert!(reqs.matches("torch", &v(&[2, 0])));
    }

    #[test]
    fn nested_includes_resolve_relative_to_including_file() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("reqs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("requirements.txt"), "-r reqs/base.txt\n").unwrap();
        fs::write(nested.join("base.txt"), "-c pins.txt\nrequests\n").unwrap();
        fs::write(nested.join("pins.txt"), "urllib3<2\n").unwrap();

        let reqs = RequirementSet::from_file(&temp.path().join("requirements.txt")).unwrap();
        assert!(reqs.is_unconstrained("requests"));
        assert!(reqs.matches("urllib3", &v(&[1, 26])));
        assert!(!reqs.matches("urllib3", &v(&[2, 0])));
    }

    #[test]
    fn missing_include_is_an_error() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("requirements.txt");
        fs::write(&entry, "-r missing.txt\n").unwrap();

        let err = RequirementSet::from_file(&entry).unwrap_err();
        match err {
            AilessError::ReferencedFileNotFound {
                path,
                referenced_from,
            } => {
                assert!(path.ends_with("missing.txt"));
                assert!(referenced_from.unwrap().ends_with("requirements.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_entry_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = RequirementSet::from_file(&temp.path().join("nope.txt")).unwrap_err();
        assert!(matches!(
            err,
            AilessError::ReferencedFileNotFound {
                referenced_from: None,
                ..
            }
        ));
    }

    #[test]
    fn in_memory_lines_resolve_includes_against_base_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("base.txt"), "pandas>=2\n").unwrap();

        let reqs = RequirementSet::from_lines(["-r base.txt", "numpy"], Some(temp.path())).unwrap();
        assert!(reqs.is_declared("pandas"));
        assert!(reqs.is_declared("numpy"));
    }

    #[test]
    fn in_memory_local_file_is_not_a_declaration() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("mywheel-1.0-py3-none-any.whl"), b"").unwrap();

        let reqs = RequirementSet::from_lines(
            ["mywheel-1.0-py3-none-any.whl", "numpy"],
            Some(temp.path()),
        )
        .unwrap();

        assert_eq!(reqs.names().collect::<Vec<_>>(), ["numpy"]);
        assert!(reqs.degraded().is_empty());
    }

    #[test]
    fn invalid_utf8_in_comment_is_ignored() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("requirements.txt");
        fs::write(&entry, b"flask==2.0\n# caf\xe9 pins\nnumpy\n").unwrap();

        let reqs = RequirementSet::from_file(&entry).unwrap();

        assert_eq!(reqs.names().collect::<Vec<_>>(), ["flask", "numpy"]);
        assert!(reqs.degraded().is_empty());
    }

    #[test]
    fn invalid_utf8_in_requirement_is_degraded() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("requirements.txt");
        fs::write(&entry, b"caf\xe9==1.0\ntorch==2.0\n").unwrap();

        let reqs = RequirementSet::from_file(&entry).unwrap();

        assert_eq!(reqs.names().collect::<Vec<_>>(), ["torch"]);
        assert_eq!(reqs.degraded().len(), 1);
        assert_eq!(reqs.degraded()[0].line_number, 1);
    }

    #[test]
    fn diamond_include_reads_shared_file_once() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "-r b.txt\n-r c.txt\n").unwrap();
        fs::write(temp.path().join("b.txt"), "-r d.txt\nflask\n").unwrap();
        fs::write(temp.path().join("c.txt"), "-r d.txt\nnumpy\n").unwrap();
        fs::write(temp.path().join("d.txt"), "torch==2.0\n").unwrap();

        let entry = temp.path().join("a.txt");
        let mut builder = RequirementSetBuilder::new();
        builder.include(&entry, None).unwrap();
        builder.expand().unwrap();

        let d = temp.path().join("d.txt").canonicalize().unwrap();
        let b = temp.path().join("b.txt").canonicalize().unwrap();
        let c = temp.path().join("c.txt").canonicalize().unwrap();
        assert_eq!(builder.included_by.get(&d), Some(&Some(b.clone())));
        assert!(!builder.is_on_include_chain(&d, Some(&c)));
        assert!(builder.is_on_include_chain(&b, Some(&d)));

        let reqs = builder.fold();
        assert_eq!(reqs.len(), 3);
        assert!(reqs.matches("torch", &v(&[2, 0])));
    }

    #[test]
    fn degraded_line_records_source_file() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("requirements.txt");
        fs::write(&entry, "flask\n-e .\n").unwrap();

        let reqs = RequirementSet::from_file(&entry).unwrap();
        let degraded = &reqs.degraded()[0];
        assert_eq!(degraded.line_number, 2);
        assert!(degraded.source.as_ref().unwrap().ends_with("requirements.txt"));
    }
}

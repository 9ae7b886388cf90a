//! Requirement line parsing.
//!
//! [`parse_line`] turns one line of a requirements file into a
//! [`Specifier`]. Parsing is total: malformed input degrades to
//! [`SpecifierKind::Unparseable`] instead of failing.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::version::{Version, VersionComparison};

// Package name, optional whitespace, optional `[extras]`.
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?").unwrap());

// One `operator version` clause of a constraint list.
static CLAUSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([=<>!~]=?)\s*(\S+)$").unwrap());

const OPERATOR_CHARS: &[char] = &['=', '>', '<', '!', '~'];

/// A comparison operator in a version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `~=`, matched as equality.
    Compatible,
    /// Bare `~`, matched as equality.
    Tilde,
    /// Operator text that is not part of the grammar. Never matches.
    Unrecognized(String),
}

impl Operator {
    /// Parse operator text such as `">="`.
    pub fn parse(text: &str) -> Self {
        match text {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            ">=" => Self::GreaterEqual,
            "<=" => Self::LessEqual,
            ">" => Self::Greater,
            "<" => Self::Less,
            "~=" => Self::Compatible,
            "~" => Self::Tilde,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The operator as written.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Compatible => "~=",
            Self::Tilde => "~",
            Self::Unrecognized(text) => text,
        }
    }

    /// Whether `candidate.cmp(bound) == ordering` satisfies this operator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Equal | Self::Compatible | Self::Tilde => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
            Self::GreaterEqual => ordering != Ordering::Less,
            Self::LessEqual => ordering != Ordering::Greater,
            Self::Greater => ordering == Ordering::Greater,
            Self::Less => ordering == Ordering::Less,
            Self::Unrecognized(_) => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `(operator, version)` pair restricting acceptable versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub op: Operator,
    pub version: Version,
}

impl Constraint {
    /// Create a constraint.
    pub fn new(op: Operator, version: impl Into<Version>) -> Self {
        Self {
            op,
            version: version.into(),
        }
    }

    /// Whether `candidate` satisfies this constraint.
    pub fn accepts(&self, candidate: &Version, comparison: VersionComparison) -> bool {
        self.op
            .accepts(comparison.compare(candidate, &self.version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Which pip option introduced an include directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// `-r` / `--requirement`
    Requirement,
    /// `-c` / `--constraint`
    Constraint,
}

/// Classification of a requirement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Blank or whitespace-only.
    Empty,
    /// Whole-line `#` comment.
    Comment,
    /// A path to an existing file (wheel, sdist) rather than a package name.
    LocalPath(PathBuf),
    /// A URL requirement.
    Url,
    /// A `-r`/`-c` directive pulling in another file.
    Include { kind: IncludeKind, path: PathBuf },
    /// A bare package name.
    Unconstrained,
    /// A package name with at least one constraint.
    Constrained,
    /// Anything that could not be classified.
    Unparseable,
}

/// One parsed requirement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    /// The line exactly as read.
    pub raw: String,
    /// Package name, as written, for `Constrained`/`Unconstrained` lines.
    pub name: Option<String>,
    pub kind: SpecifierKind,
    /// Constraints in line order; non-empty exactly when `kind` is `Constrained`.
    pub constraints: Vec<Constraint>,
}

impl Specifier {
    fn classified(raw: &str, kind: SpecifierKind) -> Self {
        Self {
            raw: raw.to_string(),
            name: None,
            kind,
            constraints: Vec::new(),
        }
    }

    /// Whether this line declares a package.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind,
            SpecifierKind::Constrained | SpecifierKind::Unconstrained
        )
    }
}

/// Parse a line, resolving local paths against the current directory.
pub fn parse_line(raw: &str) -> Specifier {
    parse_line_in(raw, None)
}

/// Parse a line, resolving relative local paths against `base_dir`.
pub fn parse_line_in(raw: &str, base_dir: Option<&Path>) -> Specifier {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Specifier::classified(raw, SpecifierKind::Empty);
    }
    if trimmed.starts_with('#') {
        return Specifier::classified(raw, SpecifierKind::Comment);
    }
    if let Some((kind, path)) = include_directive(trimmed) {
        return Specifier::classified(raw, SpecifierKind::Include { kind, path });
    }

    let undecorated = strip_comment_and_marker(trimmed);
    let line = after_last_at(undecorated);
    if line.is_empty() {
        return Specifier::classified(raw, SpecifierKind::Empty);
    }

    let candidate = match base_dir {
        Some(dir) => dir.join(line),
        None => PathBuf::from(line),
    };
    if candidate.is_file() {
        return Specifier::classified(raw, SpecifierKind::LocalPath(candidate));
    }

    if is_url(undecorated) {
        return Specifier::classified(raw, SpecifierKind::Url);
    }

    let Some(captures) = NAME_REGEX.captures(line) else {
        return Specifier::classified(raw, SpecifierKind::Unparseable);
    };
    let name = captures[1].to_string();
    let rest = &line[captures[0].len()..];

    if !rest.contains(OPERATOR_CHARS) {
        return Specifier {
            raw: raw.to_string(),
            name: Some(name),
            kind: SpecifierKind::Unconstrained,
            constraints: Vec::new(),
        };
    }

    match parse_constraints(rest) {
        Some(constraints) if !constraints.is_empty() => Specifier {
            raw: raw.to_string(),
            name: Some(name),
            kind: SpecifierKind::Constrained,
            constraints,
        },
        _ => Specifier::classified(raw, SpecifierKind::Unparseable),
    }
}

/// Recognize `-r path`, `-c path`, `--requirement[=| ]path`, `--constraint[=| ]path`.
fn include_directive(line: &str) -> Option<(IncludeKind, PathBuf)> {
    let line = line.split('#').next().unwrap_or("").trim_end();

    let (kind, rest) = if let Some(rest) = line.strip_prefix("--requirement") {
        (IncludeKind::Requirement, long_option_value(rest)?)
    } else if let Some(rest) = line.strip_prefix("--constraint") {
        (IncludeKind::Constraint, long_option_value(rest)?)
    } else if let Some(rest) = line.strip_prefix("-r") {
        (IncludeKind::Requirement, short_option_value(rest)?)
    } else if let Some(rest) = line.strip_prefix("-c") {
        (IncludeKind::Constraint, short_option_value(rest)?)
    } else {
        return None;
    };

    let path = rest.trim();
    if path.is_empty() {
        None
    } else {
        Some((kind, PathBuf::from(path)))
    }
}

fn short_option_value(rest: &str) -> Option<&str> {
    rest.starts_with(char::is_whitespace).then_some(rest)
}

fn long_option_value(rest: &str) -> Option<&str> {
    if let Some(value) = rest.strip_prefix('=') {
        Some(value)
    } else {
        short_option_value(rest)
    }
}

/// Drop the inline comment and the environment marker.
fn strip_comment_and_marker(line: &str) -> &str {
    let line = line.split('#').next().unwrap_or("");
    line.split(';').next().unwrap_or("").trim()
}

/// The text after the last `@` (`name @ location` keeps only the location).
fn after_last_at(line: &str) -> &str {
    line.rsplit('@').next().unwrap_or("").trim()
}

/// URL requirements, including VCS schemes whose userinfo contains an `@`
/// (`git+ssh://git@host/repo`). Checked before the `@` split.
fn is_url(line: &str) -> bool {
    line.contains("http:") || line.contains("https:") || line.contains("://")
}

fn parse_constraints(text: &str) -> Option<Vec<Constraint>> {
    text.split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| {
            let captures = CLAUSE_REGEX.captures(clause)?;
            let version = Version::parse(&captures[2])?;
            Some(Constraint::new(Operator::parse(&captures[1]), version))
        })
        .collect()
}

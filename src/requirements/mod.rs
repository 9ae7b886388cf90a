//! Python requirement parsing and constraint matching.
//!
//! This module reads `requirements.txt`-style files (including `-r`/`-c`
//! includes), normalizes version constraints, and answers whether a
//! candidate version of a package is acceptable.
//!
//! # Modules
//!
//! - [`specifier`] - Single-line parsing into [`Specifier`]s
//! - [`version`] - Numeric version tuples and comparison policy
//! - [`set`] - Multi-file [`RequirementSet`] building and matching
//!
//! # Example
//!
//! ```
//! use ailess::requirements::{RequirementSet, Version};
//!
//! let reqs = RequirementSet::from_lines(["torch>=1.13,<3.0", "numpy"], None).unwrap();
//! assert!(reqs.matches("torch", &Version::from([2, 0, 1])));
//! assert!(reqs.is_unconstrained("numpy"));
//! ```

pub mod set;
pub mod specifier;
pub mod version;

pub use set::{DegradedLine, RequirementSet, RequirementSetBuilder};
pub use specifier::{
    parse_line, parse_line_in, Constraint, IncludeKind, Operator, Specifier, SpecifierKind,
};
pub use version::{Version, VersionComparison};

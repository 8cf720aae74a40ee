//! Rich subject templates.
//!
//! This module provides:
//! - Placeholder lookup against a notification's rich object table
//! - A substitution engine turning `{key}` templates into styled runs
//!
//! # Example
//!
//! ```ignore
//! let runs = substitute("{user} shared {file}", &notification.subject_rich_parameters);
//!
//! // [Alice (bold), " shared ", report.pdf (bold)]
//! let text = runs_to_string(&runs);
//! ```

mod resolver;
mod substitution;
mod types;

pub use resolver::resolve;
pub use substitution::{substitute, SubstitutionEngine};
pub use types::{runs_to_string, Color, ColorParseError, NameScan, StyledRun};

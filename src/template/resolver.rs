//! Placeholder key lookup

use crate::notification::{RichObject, RichParameters};

/// Resolve a placeholder key against the rich object table.
///
/// Exact, case-sensitive match. The empty key is looked up like any other.
pub fn resolve<'a>(key: &str, params: &'a RichParameters) -> Option<&'a RichObject> {
    params.get(key)
}

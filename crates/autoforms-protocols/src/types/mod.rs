//! Shared data model.

mod form;
mod locator;
mod manual;

pub use form::*;
pub use locator::*;
pub use manual::*;

/// Flat map of caller-supplied values keyed by field name.
///
/// Ordered so that "first matching field" lookups are deterministic.
pub type UserData = std::collections::BTreeMap<String, String>;

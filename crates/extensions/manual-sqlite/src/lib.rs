//! SQLite manual repository for AutoForms.
//!
//! Persists recorded and imported manuals in a single `manuals` table.
//! Steps are stored as a JSON array.

mod backend;
mod schema;

pub use backend::SqliteManualRepository;

//! Error types for the AutoForms protocol layer.

mod driver;
mod layer;
mod storage;

pub use driver::*;
pub use layer::*;
pub use storage::*;

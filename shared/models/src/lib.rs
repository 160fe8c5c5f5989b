//! Domain types shared across the NerdMath crates.
//!
//! Field names follow the camelCase layout of the stored MongoDB documents so
//! the same types serve the HTTP API and persistence.

pub mod curriculum;
pub mod diagnostic;
pub mod graph;
pub mod learning_path;

pub use curriculum::*;
pub use diagnostic::*;
pub use graph::*;
pub use learning_path::*;

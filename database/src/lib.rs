//! MongoDB access layer for NerdMath.
//!
//! `MongoStore` owns the client; `Catalog` is the narrow lookup/persistence
//! interface the services depend on, with a Mongo and an in-memory
//! implementation. Loaders, schema setup and reports operate on the store
//! directly.

pub mod catalog;
pub mod collections;
pub mod convert;
pub mod errors;
pub mod loaders;
pub mod reports;
pub mod schema;
pub mod store;

pub use catalog::{Catalog, DiagnosticRecord, InMemoryCatalog, MongoCatalog};
pub use errors::{DatabaseError, DatabaseResult};
pub use store::MongoStore;

// Re-export driver crates for callers building filters
pub use bson;
pub use mongodb;

//! NerdMath Observability Library
//!
//! Logging setup and HTTP request logging shared by the API service and CLI.

pub mod init;
pub mod middleware;

pub use init::*;
pub use middleware::*;

// Re-export tracing for convenience
pub use tracing::{debug, error, info, instrument, warn};

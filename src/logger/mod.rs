//! Reloadable `tracing` setup shared by the server and the demo binaries.
//! See `bin/logger_demo.rs` for a binary demonstrating the reload.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};

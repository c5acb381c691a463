//! The `logger` module is a simple utility that requires manual verification: run the server
//! with `RUST_LOG=trace` and watch the filter switch to `log.filter` once settings load.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};

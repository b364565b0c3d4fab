//! wick CLI library
//!
//! A thin binary crate; kept as a library target only so integration tests
//! can reference crate metadata without duplicating it.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

//! Reference-counted dynamic value system for the wick interpreter (spec §3,
//! §4.1), plus the optional live-object registry (spec §3, §6).

pub mod convert;
pub mod ops;
pub mod registry;
pub mod value;

pub use value::{format_float_general, Rank, Value};

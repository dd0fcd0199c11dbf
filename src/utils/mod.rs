//! Shared utilities: lenient config decoding, naming and unit parsing.

pub mod lenient;
pub mod naming;
pub mod units;

pub use naming::{slugify, UniqueNames};
pub use units::{memory_mb_or_default, parse_memory_mb};

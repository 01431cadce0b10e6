//! Hostname pattern compilation and matching.
//!
//! Patterns constrain the start and/or end of a hostname. They are checked
//! in two stages: a cheap approximate match against the checksum-free
//! prefix of a candidate, then an exact match against the full hostname.

mod pattern;
mod set;

pub use pattern::{Pattern, PatternError};
pub use set::PatternSet;

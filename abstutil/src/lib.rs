//! Utilities shared by the street mesh crates: logging setup, a hierarchical `Timer`, and
//! OSM-style `Tags`.

mod collections;
pub mod logger;
mod tags;
mod time;

pub use crate::collections::wraparound_get;
pub use crate::tags::Tags;
pub use crate::time::{elapsed_seconds, prettyprint_time, prettyprint_usize, Timer};

const PROGRESS_FREQUENCY_SECONDS: f64 = 0.2;


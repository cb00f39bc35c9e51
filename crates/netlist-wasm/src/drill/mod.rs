//! Drill layer analysis: which drill-layer shapes are holes.

pub mod scanner;
pub mod types;

pub use scanner::*;
pub use types::*;

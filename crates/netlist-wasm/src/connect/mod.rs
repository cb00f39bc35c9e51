//! Cross-layer connectivity: joining top and bottom nets through holes.

pub mod connector;
pub mod types;

pub use connector::*;
pub use types::*;

//! Scanline segmentation and net labelling of a single layer.

pub mod propagate;
pub mod scanline;
pub mod scanner;
pub mod segment;

pub use propagate::Propagation;
pub use scanline::*;
pub use scanner::*;
pub use segment::*;

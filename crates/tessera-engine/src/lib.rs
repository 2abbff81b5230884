//! Tessera engine crate.
//!
//! A batched 2D rendering core (shader programs, batch accumulation, clip
//! regions, projection) plus the platform + GPU runtime pieces that drive it.

pub mod math;
pub mod coords;
pub mod paint;
pub mod shader;
pub mod gpu;
pub mod render;

pub mod device;
pub mod window;
pub mod time;
pub mod core;
pub mod logging;

mod error;

pub use error::RenderError;

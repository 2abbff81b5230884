//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, one [`Gpu`](crate::device::Gpu)
//! per window, and drives [`App`](crate::core::App) once per redraw.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx, WindowMode};

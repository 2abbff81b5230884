//! Contract between the runtime (platform loop) and the application.
//!
//! The app implements [`App`]; once per redraw it receives a [`FrameCtx`]
//! whose [`render`](FrameCtx::render) method hands out the GPU context a
//! [`Renderer`](crate::render::Renderer) draws into.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};

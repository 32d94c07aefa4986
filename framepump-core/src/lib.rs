//! # Framepump Core
//!
//! Core types shared across the framepump workstream driver:
//! - Error handling types
//! - The workstream state enumeration reported by transform engines
//! - Image descriptors and raw pixel formats
//! - Engine-owned surfaces with an explicit acquire/release ledger
//! - A timer for accumulating engine-call latency

pub mod error;
pub mod image;
pub mod state;
pub mod surface;
pub mod timer;

pub use error::{Error, Result};
pub use image::{align_up, ImageInfo, RawFormat, SURFACE_ALIGNMENT};
pub use state::WorkstreamState;
pub use surface::{Surface, SurfacePool};
pub use timer::Timer;

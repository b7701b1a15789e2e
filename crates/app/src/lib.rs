//! Application loop: one-time scene bootstrap, synchronous resize handling,
//! and a cancellable per-frame render cycle.
//!
//! # Invariants
//! - Camera aspect equals the surface aspect whenever `on_resize` returns.
//! - `frame_tick` requests the next frame before it renders.
//! - A cancelled `FrameLoop` neither renders nor reschedules.

pub mod config;
pub mod context;
pub mod frame_loop;

pub use config::{ConfigError, SceneConfig};
pub use context::{ApplicationContext, SceneHandles};
pub use frame_loop::{CancellationToken, FixedRatePacer, FrameLoop, FramePacer, FrameScheduler};

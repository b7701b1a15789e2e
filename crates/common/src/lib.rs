//! Shared value types used across the orbitview crates.

mod types;

pub use types::{Color, NodeId, Transform, Viewport};

//! Input handling: backend-neutral pointer events and orbit camera controls.
//!
//! # Invariants
//! - Controls only mutate the camera transform, never projection parameters.
//! - Hosts translate native events into [`PointerEvent`] before dispatch.

pub mod orbit;
pub mod pointer;

pub use orbit::{OrbitControls, OrbitSettings};
pub use pointer::{PointerButton, PointerEvent};

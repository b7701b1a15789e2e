//! Scene graph store: meshes and lights owned by the application.
//!
//! # Invariants
//! - Node ids are never reused within a scene.
//! - Traversal order is insertion order.
//! - Every mutation is recorded in the event log.

pub mod geometry;
pub mod light;
pub mod scene;

pub use geometry::{BoxGeometry, LambertMaterial, Mesh, MeshVertex};
pub use light::{AmbientLight, PointLight};
pub use scene::{NodeKind, Scene, SceneError, SceneEvent, SceneNode};

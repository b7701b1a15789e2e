use orbitview_common::Color;
use serde::{Deserialize, Serialize};

/// Vertex of a generated mesh: position and face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Axis-aligned box centered at the local origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxGeometry {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn cube(side: f32) -> Self {
        Self::new(side, side, side)
    }

    /// Flat-shaded triangle list: 4 vertices and 6 indices per face,
    /// counter-clockwise when viewed from outside.
    pub fn triangles(&self) -> (Vec<MeshVertex>, Vec<u16>) {
        let (x, y, z) = (self.width / 2.0, self.height / 2.0, self.depth / 2.0);
        // (normal, four corners in CCW order)
        #[rustfmt::skip]
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0],  [[-x, -y,  z], [ x, -y,  z], [ x,  y,  z], [-x,  y,  z]]),
            ([0.0, 0.0, -1.0], [[ x, -y, -z], [-x, -y, -z], [-x,  y, -z], [ x,  y, -z]]),
            ([1.0, 0.0, 0.0],  [[ x, -y,  z], [ x, -y, -z], [ x,  y, -z], [ x,  y,  z]]),
            ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y,  z], [-x,  y,  z], [-x,  y, -z]]),
            ([0.0, 1.0, 0.0],  [[-x,  y,  z], [ x,  y,  z], [ x,  y, -z], [-x,  y, -z]]),
            ([0.0, -1.0, 0.0], [[-x, -y, -z], [ x, -y, -z], [ x, -y,  z], [-x, -y,  z]]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = vertices.len() as u16;
            vertices.extend(corners.iter().map(|&position| MeshVertex { position, normal }));
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        (vertices, indices)
    }
}

/// Diffuse-only material lit by ambient and point lights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertMaterial {
    pub color: Color,
}

impl Default for LambertMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
        }
    }
}

/// Pairing of geometry and material. Static once added to a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: BoxGeometry,
    pub material: LambertMaterial,
}

impl Mesh {
    pub fn new(geometry: BoxGeometry, material: LambertMaterial) -> Self {
        Self { geometry, material }
    }
}

use crate::geometry::Mesh;
use crate::light::{AmbientLight, PointLight};
use orbitview_common::{NodeId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a scene node renders or emits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Mesh(Mesh),
    AmbientLight(AmbientLight),
    PointLight(PointLight),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Mesh(_) => "mesh",
            NodeKind::AmbientLight(_) => "ambient_light",
            NodeKind::PointLight(_) => "point_light",
        }
    }
}

/// A node: name, placement, and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Mutations recorded by the scene, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Added { id: NodeId, kind: &'static str },
    Removed { id: NodeId },
    TransformUpdated { id: NodeId, old: Transform, new: Transform },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene node {0} not found")]
    NodeNotFound(NodeId),
}

/// Retained scene graph. Iteration is in insertion order because node ids
/// are allocated sequentially and stored in a `BTreeMap`.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    event_log: Vec<SceneEvent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct children (every node is a direct child of the scene root).
    pub fn child_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node and return its id.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        tracing::debug!(%id, name = %node.name, kind = node.kind.label(), "scene node added");
        self.event_log.push(SceneEvent::Added {
            id,
            kind: node.kind.label(),
        });
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node, returning it.
    pub fn remove(&mut self, id: NodeId) -> Result<SceneNode, SceneError> {
        let node = self.nodes.remove(&id).ok_or(SceneError::NodeNotFound(id))?;
        self.event_log.push(SceneEvent::Removed { id });
        Ok(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Replace a node's transform and log the change.
    pub fn set_transform(&mut self, id: NodeId, new: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        let old = node.transform;
        node.transform = new;
        self.event_log
            .push(SceneEvent::TransformUpdated { id, old, new });
        Ok(())
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Visit every node in insertion order.
    pub fn traverse(&self, mut visit: impl FnMut(NodeId, &SceneNode)) {
        for (id, node) in &self.nodes {
            visit(*id, node);
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = (&Transform, &Mesh)> + '_ {
        self.nodes.values().filter_map(|node| match &node.kind {
            NodeKind::Mesh(mesh) => Some((&node.transform, mesh)),
            _ => None,
        })
    }

    pub fn ambient_lights(&self) -> impl Iterator<Item = &AmbientLight> + '_ {
        self.nodes.values().filter_map(|node| match &node.kind {
            NodeKind::AmbientLight(light) => Some(light),
            _ => None,
        })
    }

    pub fn point_lights(&self) -> impl Iterator<Item = (&Transform, &PointLight)> + '_ {
        self.nodes.values().filter_map(|node| match &node.kind {
            NodeKind::PointLight(light) => Some((&node.transform, light)),
            _ => None,
        })
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }
}

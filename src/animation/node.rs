use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Visual state the engine animates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub opacity: f64,
    /// Degrees.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            opacity: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "scale" => Some(self.scale),
            "opacity" => Some(self.opacity),
            "rotation" => Some(self.rotation),
            _ => None,
        }
    }

    /// Returns `false` for names that are not transform fields.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "x" => &mut self.x,
            "y" => &mut self.y,
            "scale" => &mut self.scale,
            "opacity" => &mut self.opacity,
            "rotation" => &mut self.rotation,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// A host-side visual the engine can drive.
pub trait RenderNode {
    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);

    /// Named numeric property; transform fields by default.
    fn property(&self, name: &str) -> Option<f64> {
        self.transform().get(name)
    }

    /// Returns `false` when the node has no such property.
    fn set_property(&mut self, name: &str, value: f64) -> bool {
        let mut transform = self.transform();
        if transform.set(name, value) {
            self.set_transform(transform);
            true
        } else {
            false
        }
    }
}

/// Resolves agent ids to host nodes.
pub trait NodeLookup {
    fn node_mut(&mut self, id: &str) -> Option<&mut dyn RenderNode>;
}

/// In-memory node with free-form extra properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub transform: Transform,
    #[serde(default)]
    pub extras: HashMap<String, f64>,
}

impl SceneNode {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            transform: Transform::at(x, y),
            extras: HashMap::new(),
        }
    }
}

impl RenderNode for SceneNode {
    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn property(&self, name: &str) -> Option<f64> {
        self.transform
            .get(name)
            .or_else(|| self.extras.get(name).copied())
    }

    fn set_property(&mut self, name: &str, value: f64) -> bool {
        if !self.transform.set(name, value) {
            self.extras.insert(name.to_string(), value);
        }
        true
    }
}

/// Nodes keyed by agent id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    nodes: HashMap<String, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, node: SceneNode) {
        self.nodes.insert(id.into(), node);
    }

    pub fn remove(&mut self, id: &str) -> Option<SceneNode> {
        self.nodes.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node for every renderable agent of `story`, placed at its
    /// declared position.
    pub fn from_story(story: &crate::ast::Story) -> Self {
        let mut graph = Self::new();
        story.visit_agents(&mut |agent| {
            if let Some(id) = agent.id() {
                let [x, y] = agent.position().unwrap_or([0.0, 0.0]);
                graph.insert(id, SceneNode::at(x, y));
            }
        });
        graph
    }
}

impl NodeLookup for SceneGraph {
    fn node_mut(&mut self, id: &str) -> Option<&mut dyn RenderNode> {
        self.nodes
            .get_mut(id)
            .map(|node| node as &mut dyn RenderNode)
    }
}

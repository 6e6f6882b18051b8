//! Tweens and procedural animations on host-provided nodes.

pub mod ease;
pub mod engine;
pub mod node;
pub mod procedural;

pub use ease::Easing;
pub use engine::{AnimationEngine, AnimationOptions, MoveOptions, OnComplete, TweenRequest};
pub use node::{NodeLookup, RenderNode, SceneGraph, SceneNode, Transform};
pub use procedural::AnimationKind;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("No node for agent '{0}'")]
    NodeNotFound(String),
    #[error("Unknown animation kind '{0}'")]
    UnknownKind(String),
}

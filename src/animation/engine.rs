use std::collections::HashMap;
use std::fmt;

use tracing::{debug, instrument, warn};

use super::ease::Easing;
use super::node::{NodeLookup, Transform};
use super::procedural::{AnimationKind, ProceduralRun, Step};
use super::AnimationError;
use crate::config::AnimationConfig;

/// Called with the agent id once a tween reaches its target. Cancelled
/// tweens never call it.
pub type OnComplete = Box<dyn FnOnce(&str)>;

#[derive(Debug, Clone, PartialEq)]
pub struct MoveOptions {
    pub x: f64,
    pub y: f64,
    pub duration_ms: Option<u64>,
    pub easing: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TweenRequest {
    pub properties: Vec<(String, f64)>,
    pub duration_ms: Option<u64>,
    pub easing: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationOptions {
    pub duration_ms: Option<u64>,
    pub repeat: Option<i64>,
}

struct TweenProperty {
    name: String,
    from: f64,
    to: f64,
}

struct Tween {
    properties: Vec<TweenProperty>,
    duration_ms: f64,
    elapsed_ms: f64,
    easing: Easing,
    on_complete: Option<OnComplete>,
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("duration_ms", &self.duration_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("easing", &self.easing)
            .finish_non_exhaustive()
    }
}

impl Tween {
    /// Returns `true` once the target values are written.
    fn advance(&mut self, node: &mut dyn super::RenderNode, elapsed_ms: f64) -> bool {
        self.elapsed_ms += elapsed_ms.max(0.0);
        let t = if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).min(1.0)
        };
        let eased = self.easing.apply(t);
        for property in &self.properties {
            let value = property.from + (property.to - property.from) * eased;
            node.set_property(&property.name, value);
        }
        t >= 1.0
    }
}

/// Per-agent state: at most one tween and one procedural animation.
#[derive(Debug, Default)]
struct AgentTrack {
    tween: Option<Tween>,
    procedural: Option<ProceduralRun>,
}

impl AgentTrack {
    fn is_idle(&self) -> bool {
        self.tween.is_none() && self.procedural.is_none()
    }
}

/// Drives tweens and procedural animations on host nodes.
///
/// The engine owns no nodes; every call receives the host's [`NodeLookup`]
/// and resolves agents by id. Time only moves in [`AnimationEngine::tick`].
#[derive(Debug, Default)]
pub struct AnimationEngine {
    config: AnimationConfig,
    tracks: HashMap<String, AgentTrack>,
}

impl AnimationEngine {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    fn default_easing(&self) -> Easing {
        self.config.default_easing.parse().unwrap_or_default()
    }

    /// Tweens `x`/`y` to the target, replacing any running tween.
    pub fn move_agent(
        &mut self,
        nodes: &mut dyn NodeLookup,
        id: &str,
        options: MoveOptions,
        on_complete: Option<OnComplete>,
    ) -> Result<(), AnimationError> {
        let request = TweenRequest {
            properties: vec![("x".to_string(), options.x), ("y".to_string(), options.y)],
            duration_ms: Some(
                options
                    .duration_ms
                    .unwrap_or(self.config.default_move_duration_ms),
            ),
            easing: options.easing,
        };
        self.tween_agent(nodes, id, request, on_complete)
    }

    #[instrument(level = "debug", skip(self, nodes, request, on_complete))]
    pub fn tween_agent(
        &mut self,
        nodes: &mut dyn NodeLookup,
        id: &str,
        request: TweenRequest,
        on_complete: Option<OnComplete>,
    ) -> Result<(), AnimationError> {
        let Some(node) = nodes.node_mut(id) else {
            warn!(id, "tween target has no node");
            return Err(AnimationError::NodeNotFound(id.to_string()));
        };

        let properties = request
            .properties
            .into_iter()
            .map(|(name, to)| {
                // properties the node has never held start from zero
                let from = node.property(&name).unwrap_or_else(|| {
                    debug!(id, property = %name, "new property starts at 0");
                    0.0
                });
                TweenProperty { name, from, to }
            })
            .collect();
        let tween = Tween {
            properties,
            duration_ms: request
                .duration_ms
                .unwrap_or(self.config.default_tween_duration_ms) as f64,
            elapsed_ms: 0.0,
            easing: Easing::resolve(request.easing.as_deref(), self.default_easing()),
            on_complete,
        };

        let track = self.tracks.entry(id.to_string()).or_default();
        if track.tween.replace(tween).is_some() {
            debug!(id, "previous tween cancelled");
        }
        Ok(())
    }

    /// Starts a procedural animation. A running one on the same agent is
    /// stopped and its snapshot restored first.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn start_animation(
        &mut self,
        nodes: &mut dyn NodeLookup,
        id: &str,
        kind: &str,
        options: AnimationOptions,
    ) -> Result<(), AnimationError> {
        let Ok(kind) = kind.parse::<AnimationKind>() else {
            warn!(id, kind, "unknown animation kind");
            return Err(AnimationError::UnknownKind(kind.to_string()));
        };
        let Some(node) = nodes.node_mut(id) else {
            warn!(id, "animation target has no node");
            return Err(AnimationError::NodeNotFound(id.to_string()));
        };

        let track = self.tracks.entry(id.to_string()).or_default();
        if let Some(previous) = track.procedural.take() {
            debug!(id, kind = %previous.kind, "replacing running animation");
            node.set_transform(previous.snapshot);
        }

        let snapshot = node.transform();
        let mut run = ProceduralRun::new(
            kind,
            options
                .duration_ms
                .unwrap_or(self.config.default_animation_duration_ms),
            options.repeat.unwrap_or_else(|| kind.default_repeat()),
            snapshot,
        );
        match run.advance(node, 0.0, &self.config) {
            Step::Running => track.procedural = Some(run),
            Step::Finished { restore } => {
                if restore {
                    node.set_transform(snapshot);
                }
            }
        }
        Ok(())
    }

    /// Stops the procedural animation of `id` and restores its snapshot.
    /// Returns whether one was running.
    pub fn stop_animation(
        &mut self,
        nodes: &mut dyn NodeLookup,
        id: &str,
    ) -> Result<bool, AnimationError> {
        let Some(run) = self
            .tracks
            .get_mut(id)
            .and_then(|track| track.procedural.take())
        else {
            return Ok(false);
        };
        self.tracks.retain(|_, track| !track.is_idle());
        match nodes.node_mut(id) {
            Some(node) => {
                node.set_transform(run.snapshot);
                Ok(true)
            }
            None => {
                warn!(id, "cannot restore animation, node is gone");
                Err(AnimationError::NodeNotFound(id.to_string()))
            }
        }
    }

    /// Restores every procedural animation and drops all tweens.
    pub fn stop_all(&mut self, nodes: &mut dyn NodeLookup) {
        for (id, track) in self.tracks.drain() {
            if let Some(run) = track.procedural {
                if let Some(node) = nodes.node_mut(&id) {
                    node.set_transform(run.snapshot);
                }
            }
        }
    }

    /// Advances every tween and animation by `elapsed_ms`.
    pub fn tick(&mut self, nodes: &mut dyn NodeLookup, elapsed_ms: f64) {
        let mut completed: Vec<(String, OnComplete)> = Vec::new();
        let mut orphaned = Vec::new();

        for (id, track) in self.tracks.iter_mut() {
            let Some(node) = nodes.node_mut(id) else {
                warn!(id = %id, "node disappeared, dropping its animations");
                orphaned.push(id.clone());
                continue;
            };

            if let Some(tween) = track.tween.as_mut() {
                if tween.advance(node, elapsed_ms) {
                    if let Some(callback) = track.tween.take().and_then(|t| t.on_complete) {
                        completed.push((id.clone(), callback));
                    }
                }
            }

            if let Some(run) = track.procedural.as_mut() {
                if let Step::Finished { restore } = run.advance(node, elapsed_ms, &self.config) {
                    let snapshot = run.snapshot;
                    track.procedural = None;
                    if restore {
                        node.set_transform(snapshot);
                    }
                    debug!(id = %id, "animation finished");
                }
            }
        }

        self.tracks
            .retain(|id, track| !track.is_idle() && !orphaned.contains(id));
        for (id, callback) in completed {
            callback(&id);
        }
    }

    pub fn is_tweening(&self, id: &str) -> bool {
        self.tracks
            .get(id)
            .is_some_and(|track| track.tween.is_some())
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.tracks
            .get(id)
            .is_some_and(|track| track.procedural.is_some())
    }

    pub fn active_animation(&self, id: &str) -> Option<AnimationKind> {
        self.tracks
            .get(id)
            .and_then(|track| track.procedural.as_ref())
            .map(|run| run.kind)
    }

    /// Transform the running procedural animation of `id` will restore.
    pub fn snapshot(&self, id: &str) -> Option<Transform> {
        self.tracks
            .get(id)
            .and_then(|track| track.procedural.as_ref())
            .map(|run| run.snapshot)
    }

    pub fn is_idle(&self) -> bool {
        self.tracks.is_empty()
    }
}

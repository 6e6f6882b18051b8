use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::node::{RenderNode, Transform};
use crate::config::AnimationConfig;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnimationKind {
    Bounce,
    Pulse,
    FadeIn,
    FadeOut,
    Spin,
    Shake,
}

impl AnimationKind {
    /// Fades run once and keep their final opacity; the rest repeat.
    pub fn is_cyclic(self) -> bool {
        !matches!(self, AnimationKind::FadeIn | AnimationKind::FadeOut)
    }

    /// Repeat count used when none is given; `-1` is infinite.
    pub fn default_repeat(self) -> i64 {
        match self {
            AnimationKind::Shake => 1,
            _ => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Running,
    /// `restore` asks the caller to put the snapshot back.
    Finished { restore: bool },
}

/// A running procedural animation and the transform it started from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProceduralRun {
    pub kind: AnimationKind,
    pub duration_ms: f64,
    pub repeat: i64,
    pub elapsed_ms: f64,
    pub snapshot: Transform,
}

impl ProceduralRun {
    pub fn new(kind: AnimationKind, duration_ms: u64, repeat: i64, snapshot: Transform) -> Self {
        let duration_ms = if kind.is_cyclic() {
            duration_ms.max(1) as f64
        } else {
            duration_ms as f64
        };
        Self {
            kind,
            duration_ms,
            repeat,
            elapsed_ms: 0.0,
            snapshot,
        }
    }

    /// Completed cycles so far.
    pub fn cycles(&self) -> i64 {
        (self.elapsed_ms / self.duration_ms).floor() as i64
    }

    /// Advances the clock and writes the properties this kind drives.
    pub fn advance(
        &mut self,
        node: &mut dyn RenderNode,
        elapsed_ms: f64,
        config: &AnimationConfig,
    ) -> Step {
        self.elapsed_ms += elapsed_ms.max(0.0);

        if !self.kind.is_cyclic() {
            let t = if self.duration_ms <= 0.0 {
                1.0
            } else {
                (self.elapsed_ms / self.duration_ms).min(1.0)
            };
            let (from, to) = match self.kind {
                AnimationKind::FadeIn => (0.0, 1.0),
                _ => (self.snapshot.opacity, 0.0),
            };
            node.set_property("opacity", from + (to - from) * t);
            return if t >= 1.0 {
                Step::Finished { restore: false }
            } else {
                Step::Running
            };
        }

        if self.repeat >= 0 && self.cycles() >= self.repeat {
            return Step::Finished { restore: true };
        }

        let phase = (self.elapsed_ms % self.duration_ms) / self.duration_ms;
        let snap = self.snapshot;
        match self.kind {
            AnimationKind::Bounce => {
                node.set_property("y", snap.y - config.bounce_height * (PI * phase).sin());
            }
            AnimationKind::Pulse => {
                let swing = 1.0 + config.pulse_amount * (2.0 * PI * phase).sin();
                node.set_property("scale", snap.scale * swing);
            }
            AnimationKind::Spin => {
                node.set_property("rotation", snap.rotation + 360.0 * phase);
            }
            AnimationKind::Shake => {
                let decay = 1.0 - phase;
                let offset = config.shake_amplitude
                    * decay
                    * (2.0 * PI * config.shake_oscillations * phase).sin();
                node.set_property("x", snap.x + offset);
            }
            AnimationKind::FadeIn | AnimationKind::FadeOut => {}
        }
        Step::Running
    }
}

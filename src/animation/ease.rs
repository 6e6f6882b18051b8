use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Easing curve applied to tween progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Easing {
    Linear,
    #[strum(to_string = "ease_in", serialize = "easeIn")]
    EaseIn,
    #[default]
    #[strum(to_string = "ease_out", serialize = "easeOut")]
    EaseOut,
    #[strum(to_string = "ease_in_out", serialize = "easeInOut")]
    EaseInOut,
    #[strum(to_string = "ease_in_cubic", serialize = "easeInCubic")]
    EaseInCubic,
    #[strum(to_string = "ease_out_cubic", serialize = "easeOutCubic")]
    EaseOutCubic,
    #[strum(to_string = "ease_in_out_cubic", serialize = "easeInOutCubic")]
    EaseInOutCubic,
}

impl Easing {
    /// Resolves a name, falling back to `default` when it is missing or
    /// unknown.
    pub fn resolve(name: Option<&str>, default: Easing) -> Easing {
        match name {
            Some(name) => name.parse().unwrap_or_else(|_| {
                tracing::warn!(easing = name, fallback = %default, "unknown easing");
                default
            }),
            None => default,
        }
    }

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

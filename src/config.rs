use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{Error, InternalResult};

/// Settings for a story session. Every field has a default so partial JSON
/// files are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FableConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub animation: AnimationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Keep variables the story does not declare when it is reloaded.
    #[serde(default = "default_true")]
    pub preserve_external_vars: bool,

    /// Ignore `go to page` targets that are not pages of the loaded story.
    #[serde(default)]
    pub strict_navigation: bool,

    /// Seed for `random` and `pick_one`; entropy when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            preserve_external_vars: default_true(),
            strict_navigation: false,
            random_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_easing")]
    pub default_easing: String,

    #[serde(default = "default_move_duration_ms")]
    pub default_move_duration_ms: u64,

    #[serde(default = "default_tween_duration_ms")]
    pub default_tween_duration_ms: u64,

    #[serde(default = "default_animation_duration_ms")]
    pub default_animation_duration_ms: u64,

    /// Peak vertical offset of `bounce`, in story units.
    #[serde(default = "default_bounce_height")]
    pub bounce_height: f64,

    /// Relative scale swing of `pulse` (0.1 swings by a tenth).
    #[serde(default = "default_pulse_amount")]
    pub pulse_amount: f64,

    #[serde(default = "default_shake_amplitude")]
    pub shake_amplitude: f64,

    /// Oscillations per `shake` cycle.
    #[serde(default = "default_shake_oscillations")]
    pub shake_oscillations: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_easing: default_easing(),
            default_move_duration_ms: default_move_duration_ms(),
            default_tween_duration_ms: default_tween_duration_ms(),
            default_animation_duration_ms: default_animation_duration_ms(),
            bounce_height: default_bounce_height(),
            pulse_amount: default_pulse_amount(),
            shake_amplitude: default_shake_amplitude(),
            shake_oscillations: default_shake_oscillations(),
        }
    }
}

impl FableConfig {
    /// Loads a config from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        from_file(path)
    }

    pub fn from_str(s: &str) -> InternalResult<Self> {
        from_str(s)
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "Failed to open config file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

fn default_true() -> bool {
    true
}
fn default_easing() -> String {
    "ease_out".to_string()
}
fn default_move_duration_ms() -> u64 {
    500
}
fn default_tween_duration_ms() -> u64 {
    500
}
fn default_animation_duration_ms() -> u64 {
    1000
}
fn default_bounce_height() -> f64 {
    20.0
}
fn default_pulse_amount() -> f64 {
    0.1
}
fn default_shake_amplitude() -> f64 {
    10.0
}
fn default_shake_oscillations() -> f64 {
    4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde() {
        let config = FableConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        tracing::debug!("{}", json);
        let deserialized: FableConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config =
            FableConfig::from_str(r#"{"runtime": {"strict_navigation": true}}"#).unwrap();
        assert!(config.runtime.strict_navigation);
        assert!(config.runtime.preserve_external_vars);
        assert_eq!(config.animation, AnimationConfig::default());
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let result = FableConfig::from_str("{ not json");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

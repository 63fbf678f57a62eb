//! Application configuration.
//!
//! The configuration lives in a JSON file (by default
//! `$XDG_CONFIG_HOME/edgebar/config.json`).  The `"transforms"` section
//! carries the panel geometry and look; `"gestures"` and `"animation"` tune
//! the interaction.  Other top-level sections (such as the widget list) are
//! owned by other parts of the launcher and are preserved untouched by
//! [`JsonConfigStore`](crate::store::JsonConfigStore).
//!
//! # Example
//!
//! ```json
//! {
//!   "transforms": {
//!     "display": 0,
//!     "height": 64,
//!     "width": 400,
//!     "expanded_height": 450,
//!     "posy": -120,
//!     "opacity": 0.95,
//!     "animation_speed": 1.5
//!   },
//!   "gestures": { "travel_distance": 250.0 },
//!   "animation": { "base_duration_ms": 300, "easing": "ease-out-quart" },
//!   "widgets": []
//! }
//! ```
//!
//! Numbers under `"transforms"` are read leniently: a value of the wrong
//! type (or a numeric string) falls back to the default for that field only.

use crate::animator::{animation_duration, AnimationConfig};
use crate::geometry::{PanelMetrics, Rect};
use crate::gesture::GestureConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; `{}` is a valid file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Panel geometry and look.
    #[serde(default)]
    pub transforms: Transforms,

    /// Horizontal gesture tuning.
    #[serde(default)]
    pub gestures: GestureConfig,

    /// Expand/collapse timing.
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Bounds of the selected display, attached by the store.  Never
    /// written to disk.
    #[serde(skip)]
    pub display_bounds: Option<Rect>,
}

/// The `"transforms"` section.  `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transforms {
    /// Index of the display the panel is docked to.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub display: Option<f64>,
    /// Height of the collapsed strip.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Width of the expanded panel.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height of the expanded panel.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub expanded_height: Option<f64>,
    /// Anchor offset: vertical distance of the panel's center from the
    /// display's center.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub posy: Option<f64>,
    /// Background opacity of the expanded panel.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Animation speed multiplier.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,
}

/// Accept any JSON value; keep it only if it reads as a finite number.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(n.filter(|n| n.is_finite()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

/// Resolve the config directory (`$XDG_CONFIG_HOME/edgebar`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("edgebar")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

//  Settings snapshot

/// Display assumed when the store cannot tell us the real one.
pub const FALLBACK_DISPLAY: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1920.0,
    height: 1080.0,
};

pub const DEFAULT_OPACITY: f64 = 0.95;

/// Fully resolved, sanitized configuration the engine works from.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub metrics: PanelMetrics,
    pub display: Rect,
    pub display_index: usize,
    pub anchor_offset: f64,
    pub opacity: f64,
    pub animation_speed: f64,
    pub animation: AnimationConfig,
    pub gestures: GestureConfig,
    pub always_on_top: bool,
}

/// How a new configuration differs from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    Unchanged,
    /// Look or feel only (opacity, speed, easing, gesture tuning).
    Cosmetic,
    /// Sizes, display or anchor changed; the window must be resynced.
    Structural,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn positive_or(v: Option<f64>, fallback: f64) -> f64 {
    v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        let t = &config.transforms;
        let d = PanelMetrics::default();

        let collapsed_height = positive_or(t.height, d.collapsed_height);
        let expanded_width = positive_or(t.width, d.expanded_width).max(d.collapsed_width);
        let expanded_height = positive_or(t.expanded_height, d.expanded_height);

        let display = config
            .display_bounds
            .filter(|r| r.width > 0.0 && r.height > 0.0)
            .unwrap_or(FALLBACK_DISPLAY);

        Self {
            metrics: PanelMetrics {
                collapsed_width: d.collapsed_width,
                collapsed_height,
                expanded_width,
                expanded_height,
            },
            display,
            display_index: t.display.filter(|v| *v >= 0.0).map(|v| v as usize).unwrap_or(0),
            anchor_offset: t.posy.unwrap_or(0.0),
            opacity: t.opacity.map(|o| o.clamp(0.0, 1.0)).unwrap_or(DEFAULT_OPACITY),
            animation_speed: positive_or(t.animation_speed, 1.0),
            animation: AnimationConfig {
                easing: config.animation.easing.sanitized(),
                ..config.animation
            },
            gestures: config.gestures.sanitized(),
            always_on_top: t.always_on_top.unwrap_or(true),
        }
    }

    /// Expand/collapse duration at the configured speed.
    pub fn animation_duration(&self) -> Duration {
        animation_duration(self.animation.base_duration_ms, self.animation_speed)
    }

    pub fn diff(&self, next: &Settings) -> ConfigChange {
        if self == next {
            return ConfigChange::Unchanged;
        }
        let structural = self.metrics != next.metrics
            || self.display != next.display
            || self.display_index != next.display_index
            || self.anchor_offset != next.anchor_offset;
        if structural {
            ConfigChange::Structural
        } else {
            ConfigChange::Cosmetic
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "transforms": {
                "display": 1,
                "height": 80,
                "width": 360,
                "expanded_height": 500,
                "posy": -120,
                "opacity": 0.7,
                "animation_speed": 2,
                "always_on_top": false
            },
            "gestures": { "travel_distance": 300.0 },
            "animation": { "base_duration_ms": 240, "easing": { "cubic-bezier": [0.2, 0.0, 0.0, 1.0] } }
        }"#;
        let cfg = Config::parse(json).unwrap();
        assert_eq!(cfg.transforms.display, Some(1.0));
        assert_eq!(cfg.transforms.height, Some(80.0));
        assert_eq!(cfg.transforms.posy, Some(-120.0));
        assert_eq!(cfg.transforms.always_on_top, Some(false));
        assert_eq!(cfg.gestures.travel_distance, 300.0);
        assert_eq!(cfg.animation.base_duration_ms, 240);
        assert_eq!(cfg.animation.easing, Easing::CubicBezier([0.2, 0.0, 0.0, 1.0]));

        let s = Settings::from_config(&cfg);
        assert_eq!(s.display_index, 1);
        assert_eq!(s.metrics.collapsed_height, 80.0);
        assert_eq!(s.metrics.expanded_width, 360.0);
        assert_eq!(s.metrics.expanded_height, 500.0);
        assert_eq!(s.anchor_offset, -120.0);
        assert_eq!(s.opacity, 0.7);
        assert_eq!(s.animation_duration(), Duration::from_millis(120));
        assert!(!s.always_on_top);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg = Config::parse("{}").unwrap();
        let s = Settings::from_config(&cfg);
        assert_eq!(s.metrics, PanelMetrics::default());
        assert_eq!(s.display, FALLBACK_DISPLAY);
        assert_eq!(s.display_index, 0);
        assert_eq!(s.anchor_offset, 0.0);
        assert_eq!(s.opacity, DEFAULT_OPACITY);
        assert_eq!(s.animation_speed, 1.0);
        assert_eq!(s.animation_duration(), Duration::from_millis(300));
        assert_eq!(s.gestures, GestureConfig::default());
        assert!(s.always_on_top);
    }

    #[test]
    fn malformed_numbers_fall_back_per_field() {
        let json = r#"{ "transforms": {
            "height": "tall",
            "width": "380",
            "posy": null,
            "opacity": [1],
            "animation_speed": -3
        } }"#;
        let s = Settings::from_config(&Config::parse(json).unwrap());
        assert_eq!(s.metrics.collapsed_height, 64.0);
        assert_eq!(s.metrics.expanded_width, 380.0);
        assert_eq!(s.anchor_offset, 0.0);
        assert_eq!(s.opacity, DEFAULT_OPACITY);
        assert_eq!(s.animation_speed, 1.0);
    }

    #[test]
    fn overshooting_easing_resolves_to_quart() {
        let json = r#"{ "animation": { "base_duration_ms": 200, "easing": { "cubic-bezier": [0.2, 1.6, 0.8, -0.6] } } }"#;
        let s = Settings::from_config(&Config::parse(json).unwrap());
        assert_eq!(s.animation.easing, Easing::EaseOutQuart);
        assert_eq!(s.animation.base_duration_ms, 200);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "transforms": {}, "widgets": [{ "type": "app" }] }"#;
        let _cfg: Config = Config::parse(json).unwrap();
    }

    #[test]
    fn display_bounds_are_not_serialized() {
        let cfg = Config {
            display_bounds: Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
            ..Config::default()
        };
        let v = serde_json::to_value(&cfg).unwrap();
        assert!(v.get("display_bounds").is_none());
    }

    #[test]
    fn degenerate_display_bounds_fall_back() {
        let cfg = Config {
            display_bounds: Some(Rect::new(0.0, 0.0, 0.0, 900.0)),
            ..Config::default()
        };
        assert_eq!(Settings::from_config(&cfg).display, FALLBACK_DISPLAY);
    }

    #[test]
    fn diff_classifies_changes() {
        let base = Settings::default();
        assert_eq!(base.diff(&base.clone()), ConfigChange::Unchanged);

        let mut cosmetic = base.clone();
        cosmetic.opacity = 0.5;
        cosmetic.animation_speed = 3.0;
        assert_eq!(base.diff(&cosmetic), ConfigChange::Cosmetic);

        let mut moved = base.clone();
        moved.anchor_offset = 42.0;
        assert_eq!(base.diff(&moved), ConfigChange::Structural);

        let mut resized = base.clone();
        resized.metrics.expanded_width = 420.0;
        assert_eq!(base.diff(&resized), ConfigChange::Structural);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("edgebar-test-does-not-exist.json");
        assert!(Config::load(&path).is_err());
    }
}

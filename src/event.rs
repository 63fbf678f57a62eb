//! Input vocabulary shared by every event source.
//!
//! [`InputEvent`] describes everything the interaction engine reacts to:
//! pointer and touch input, window focus, external drag-and-drop, and a few
//! programmatic requests.  Sources (the GTK overlay, the Unix socket
//! listener, the replay tool) stamp each event with its arrival time as a
//! [`TimedEvent`].
//!
//! Pointer coordinates `x`/`y` are in screen space.  The optional `local`
//! point is window-local; when a source cannot provide it the engine derives
//! it from the last geometry it requested.

use crate::geometry::Point;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Instant;

/// What the pointer was over when a button went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PointerTarget {
    /// The panel body or the collapsed strip.
    #[default]
    Panel,
    /// An interactive child control (input, button, link, launcher item,
    /// slider).  Presses on these belong to the control.
    Interactive,
    /// The reposition grip.
    Handle,
    /// Anywhere outside the visible panel.
    Outside,
}

impl fmt::Display for PointerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerTarget::Panel => write!(f, "panel"),
            PointerTarget::Interactive => write!(f, "interactive"),
            PointerTarget::Handle => write!(f, "handle"),
            PointerTarget::Outside => write!(f, "outside"),
        }
    }
}

/// Parse a target name (case-insensitive; accepts a few aliases).
fn parse_target(s: &str) -> Option<PointerTarget> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "panel" | "strip" | "sidebar" => Some(PointerTarget::Panel),
        "interactive" | "control" | "button" | "input" | "link" => {
            Some(PointerTarget::Interactive)
        }
        "handle" | "grip" => Some(PointerTarget::Handle),
        "outside" | "none" => Some(PointerTarget::Outside),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for PointerTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_target(&s).ok_or_else(|| DeError::custom(format!("invalid pointer target: {:?}", s)))
    }
}

fn yes() -> bool {
    true
}

/// Every input the interaction engine understands.
///
/// On the wire (socket listener, replay scripts) events use serde's default
/// externally tagged JSON:
///
/// ```json
/// {"PointerDown":{"x":3,"y":540,"target":"panel"}}
/// {"PointerMove":{"x":80,"y":541}}
/// {"PointerUp":{"x":170}}
/// "FocusLost"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Mouse button or touch went down.
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        target: PointerTarget,
    },

    /// Pointer or touch moved.
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        local: Option<Point>,
    },

    /// Mouse button or touch released.
    ///
    /// Coordinates may be missing when a touch ends without a changed-touch
    /// point.
    PointerUp {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
    },

    /// Pointer left the host window.
    PointerLeave,

    /// The host window lost focus.
    FocusLost,

    /// An external drag (e.g. files from a file manager) entered the window.
    DragEnter {
        #[serde(default = "yes")]
        has_data: bool,
    },

    /// An external drag is hovering over the window.
    DragOver,

    /// An external drag left the window.
    DragLeave,

    /// An external drag was dropped on the window.
    Drop,

    /// Programmatically expand (tray, hotkey).
    Expand,

    /// Programmatically collapse.
    Collapse,

    /// Expand if collapsed, collapse otherwise.
    Toggle,

    /// Re-read the configuration store.
    ReloadConfig,
}

/// An [`InputEvent`] stamped with its arrival time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub at: Instant,
    pub event: InputEvent,
}

impl TimedEvent {
    pub fn now(event: InputEvent) -> Self {
        Self {
            at: Instant::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_display() {
        assert_eq!(PointerTarget::Panel.to_string(), "panel");
        assert_eq!(PointerTarget::Interactive.to_string(), "interactive");
        assert_eq!(PointerTarget::Handle.to_string(), "handle");
        assert_eq!(PointerTarget::Outside.to_string(), "outside");
    }

    #[test]
    fn target_parsing_accepts_aliases() {
        assert_eq!(parse_target("Panel"), Some(PointerTarget::Panel));
        assert_eq!(parse_target(" BUTTON "), Some(PointerTarget::Interactive));
        assert_eq!(parse_target("grip"), Some(PointerTarget::Handle));
        assert_eq!(parse_target("out-side"), Some(PointerTarget::Outside));
        assert_eq!(parse_target("elsewhere"), None);
    }

    #[test]
    fn pointer_down_defaults_to_panel() {
        let e: InputEvent = serde_json::from_str(r#"{"PointerDown":{"x":3,"y":540}}"#).unwrap();
        assert_eq!(
            e,
            InputEvent::PointerDown {
                x: 3.0,
                y: 540.0,
                target: PointerTarget::Panel
            }
        );
    }

    #[test]
    fn pointer_up_without_coordinates() {
        let e: InputEvent = serde_json::from_str(r#"{"PointerUp":{}}"#).unwrap();
        assert_eq!(e, InputEvent::PointerUp { x: None, y: None });
    }

    #[test]
    fn pointer_move_with_local_point() {
        let e: InputEvent =
            serde_json::from_str(r#"{"PointerMove":{"x":10,"y":20,"local":{"x":1,"y":2}}}"#)
                .unwrap();
        assert_eq!(
            e,
            InputEvent::PointerMove {
                x: 10.0,
                y: 20.0,
                local: Some(Point::new(1.0, 2.0))
            }
        );
    }

    #[test]
    fn unit_events_are_strings() {
        let e: InputEvent = serde_json::from_str(r#""FocusLost""#).unwrap();
        assert_eq!(e, InputEvent::FocusLost);
        let e: InputEvent = serde_json::from_str(r#"{"DragEnter":{}}"#).unwrap();
        assert_eq!(e, InputEvent::DragEnter { has_data: true });
    }

    #[test]
    fn invalid_target_is_rejected() {
        let r: Result<InputEvent, _> =
            serde_json::from_str(r#"{"PointerDown":{"x":0,"y":0,"target":"moon"}}"#);
        assert!(r.is_err());
    }
}

//! Live interaction events delivered to the recorder.

use serde::{Deserialize, Serialize};

/// One user interaction observed on a page.
///
/// Variants the recorder has no use for, and any tag it does not know,
/// deserialize to [`InteractionEvent::Ignored`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    Click {
        x: f64,
        y: f64,
    },
    DoubleClick {
        x: f64,
        y: f64,
    },
    RightClick {
        x: f64,
        y: f64,
    },
    TypeText {
        text: String,
    },
    Scroll {
        x: f64,
        y: f64,
        #[serde(default)]
        delta_y: f64,
    },
    Navigate {
        url: String,
    },
    KeyPress {
        key: String,
    },
    Wait {
        ms: u64,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    Screenshot,
    Focus,
    #[serde(other)]
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_known_variant() {
        let ev: InteractionEvent =
            serde_json::from_str(r#"{"type":"click","x":10.5,"y":20}"#).unwrap();
        assert_eq!(ev, InteractionEvent::Click { x: 10.5, y: 20.0 });
    }

    #[test]
    fn test_unknown_variant_is_ignored() {
        let ev: InteractionEvent =
            serde_json::from_str(r#"{"type":"drag_and_drop"}"#).unwrap();
        assert_eq!(ev, InteractionEvent::Ignored);
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-direction key-hold durations (milliseconds) the loop executed for one iteration.
///
/// The wire format carries plain integers, but a field that was never present is not the same
/// thing as an explicit zero hold; `None` keeps that distinction. `exit` is the escape press
/// that ends a run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct MoveCommands {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<u64>,
}

impl MoveCommands {
    /// True when every field is absent or zero: the loop executed nothing this iteration.
    pub fn all_idle(&self) -> bool {
        [self.up, self.down, self.left, self.right, self.exit]
            .iter()
            .all(|cmd| cmd.unwrap_or(0) == 0)
    }
}

/// One logged observe -> decide -> act iteration, as appended to the corpus JSONL file.
///
/// `iteration` is the record's identity and the only required field; everything else decodes
/// to an explicit absent value so a sparse line still yields a usable record.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InteractionRecord {
    pub iteration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vla_output: Option<String>,
    #[serde(default)]
    pub commands: MoveCommands,
    /// Key-hold durations the actuator reports back after execution; shape is loop-defined.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub executed_durations: serde_json::Map<String, serde_json::Value>,
}

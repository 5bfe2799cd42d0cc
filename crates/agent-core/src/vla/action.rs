use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"The action to be taken is therefore\s*\(\s*([+-]?\d+)\s*,\s*([+-]?\d+)\s*\)",
    )
    .expect("valid action regex")
});

/// Signed pixel displacement the model claims the camera should perform.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActionVector {
    pub dx: i64,
    pub dy: i64,
}

/// Finds the first well-formed motion clause in `text`:
/// `The action to be taken is therefore (dx, dy)`.
///
/// A match whose span contains a markup delimiter is rejected: an annotation tag bleeding
/// into the clause means the numbers cannot be trusted as a plain action. Absence is `None`,
/// never an error.
pub fn parse_action_clause(text: &str) -> Option<ActionVector> {
    for caps in ACTION_RE.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        if whole.as_str().contains('<') {
            continue;
        }
        let (Ok(dx), Ok(dy)) = (caps[1].parse(), caps[2].parse()) else {
            continue;
        };
        return Some(ActionVector { dx, dy });
    }
    None
}

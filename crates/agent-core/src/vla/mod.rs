//! Model-output interpretation: annotation tags, the motion clause, role assignment, and the
//! geometric consistency check.
//!
//! Everything here is pure text-in/facts-out. The pipeline runs leaf-first: raw text ->
//! tags -> roles -> (points, action) -> consistency report; `analyze_output` composes the
//! stages for one output.

pub mod action;
pub mod consistency;
pub mod roles;
pub mod tags;

pub use action::{ActionVector, parse_action_clause};
pub use consistency::{ConsistencyReport, ConsistencyStatus, check_consistency};
pub use roles::{FirstMatchClassifier, RoleAssignment, RoleClassifier, UniqueRoleClassifier};
pub use tags::{CoordEncoding, FrameGeometry, FrameSize, TagPoint, extract_tag_points};

/// Everything the pipeline derives from one raw model output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputAnalysis {
    /// Extracted tag points, in text-appearance order.
    pub tags: Vec<TagPoint>,
    pub roles: RoleAssignment,
    pub action: Option<ActionVector>,
    pub report: ConsistencyReport,
}

/// Runs the full interpretation pipeline over one raw model output.
pub fn analyze_output(
    text: &str,
    geometry: &FrameGeometry,
    encoding: CoordEncoding,
    classifier: &dyn RoleClassifier,
    tolerance_px: f64,
) -> OutputAnalysis {
    let tags = extract_tag_points(text, geometry, encoding);
    let roles = classifier.classify(&tags);
    let action = parse_action_clause(text);
    let report = check_consistency(
        roles.object_point.as_ref().map(|t| (t.x, t.y)),
        roles.centre_point.as_ref().map(|t| (t.x, t.y)),
        action,
        tolerance_px,
    );

    OutputAnalysis {
        tags,
        roles,
        action,
        report,
    }
}

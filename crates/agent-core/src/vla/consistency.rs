use serde::{Deserialize, Serialize};

use super::action::ActionVector;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyStatus {
    Consistent,
    Inconsistent,
    /// Object point, centre point or action was absent; distinct from a numeric mismatch.
    Unevaluable,
}

/// Outcome of comparing the stated action against the geometric expectation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConsistencyReport {
    pub object_point: Option<(f64, f64)>,
    pub centre_point: Option<(f64, f64)>,
    pub action: Option<ActionVector>,
    pub diff_vector: Option<(f64, f64)>,
    pub diff_norm: Option<f64>,
    pub status: ConsistencyStatus,
}

/// Checks whether `action` moves the frame centre onto the object.
///
/// Expected action is `centre - object`; the report is `Consistent` iff the Euclidean norm of
/// `expected - action` is within `tolerance_px`. Any absent input makes the report
/// `Unevaluable` with null diff fields.
pub fn check_consistency(
    object_point: Option<(f64, f64)>,
    centre_point: Option<(f64, f64)>,
    action: Option<ActionVector>,
    tolerance_px: f64,
) -> ConsistencyReport {
    let mut report = ConsistencyReport {
        object_point,
        centre_point,
        action,
        diff_vector: None,
        diff_norm: None,
        status: ConsistencyStatus::Unevaluable,
    };

    let (Some((x_obj, y_obj)), Some((x_ctr, y_ctr)), Some(action)) =
        (object_point, centre_point, action)
    else {
        return report;
    };

    let expected_dx = x_ctr - x_obj;
    let expected_dy = y_ctr - y_obj;
    let diff_x = expected_dx - action.dx as f64;
    let diff_y = expected_dy - action.dy as f64;
    let diff_norm = diff_x.hypot(diff_y);

    report.diff_vector = Some((diff_x, diff_y));
    report.diff_norm = Some(diff_norm);
    report.status = if diff_norm <= tolerance_px {
        ConsistencyStatus::Consistent
    } else {
        ConsistencyStatus::Inconsistent
    };
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_action_is_consistent() {
        let report = check_consistency(
            Some((100.0, 100.0)),
            Some((120.0, 90.0)),
            Some(ActionVector { dx: 20, dy: -10 }),
            5.0,
        );
        assert_eq!(report.status, ConsistencyStatus::Consistent);
        assert_eq!(report.diff_vector, Some((0.0, 0.0)));
        assert_eq!(report.diff_norm, Some(0.0));
    }

    #[test]
    fn zero_action_against_real_offset_is_inconsistent() {
        let report = check_consistency(
            Some((100.0, 100.0)),
            Some((120.0, 90.0)),
            Some(ActionVector { dx: 0, dy: 0 }),
            5.0,
        );
        assert_eq!(report.status, ConsistencyStatus::Inconsistent);
        let norm = report.diff_norm.unwrap();
        assert!((norm - (20.0f64 * 20.0 + 10.0 * 10.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn norm_at_tolerance_boundary_is_consistent() {
        let report = check_consistency(
            Some((0.0, 0.0)),
            Some((3.0, 4.0)),
            Some(ActionVector { dx: 0, dy: 0 }),
            5.0,
        );
        assert_eq!(report.diff_norm, Some(5.0));
        assert_eq!(report.status, ConsistencyStatus::Consistent);
    }

    #[test]
    fn missing_centre_is_unevaluable_not_inconsistent() {
        let report = check_consistency(
            Some((100.0, 100.0)),
            None,
            Some(ActionVector { dx: 20, dy: -10 }),
            5.0,
        );
        assert_eq!(report.status, ConsistencyStatus::Unevaluable);
        assert_eq!(report.diff_vector, None);
        assert_eq!(report.diff_norm, None);
    }

    #[test]
    fn missing_action_is_unevaluable() {
        let report = check_consistency(Some((1.0, 1.0)), Some((2.0, 2.0)), None, 5.0);
        assert_eq!(report.status, ConsistencyStatus::Unevaluable);
    }

    #[test]
    fn everything_missing_is_unevaluable() {
        let report = check_consistency(None, None, None, 5.0);
        assert_eq!(report.status, ConsistencyStatus::Unevaluable);
        assert_eq!(report.object_point, None);
        assert_eq!(report.centre_point, None);
        assert_eq!(report.action, None);
    }
}

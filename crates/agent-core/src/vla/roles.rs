use super::tags::TagPoint;

/// Label substring that marks a tag as the reference-frame centre.
pub const CENTRE_LABEL_MARKER: &str = "centre of image";

/// Partition of one output's tags into the two roles the validator cares about, plus
/// everything else (retained, unused by validation).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoleAssignment {
    pub object_point: Option<TagPoint>,
    pub centre_point: Option<TagPoint>,
    pub other: Vec<TagPoint>,
}

/// Strategy seam for assigning roles to extracted tags.
///
/// The default policy is a positional heuristic, not semantic detection; stricter policies
/// can be swapped in without touching the extractor.
pub trait RoleClassifier {
    /// `tags` must be in text-appearance order.
    fn classify(&self, tags: &[TagPoint]) -> RoleAssignment;
}

/// First tag whose label contains the centre marker (case-insensitive) is the centre point;
/// the first tag without the marker is the object point; everything else is `other`.
#[derive(Debug, Clone)]
pub struct FirstMatchClassifier {
    pub centre_marker: String,
}

impl Default for FirstMatchClassifier {
    fn default() -> Self {
        Self {
            centre_marker: CENTRE_LABEL_MARKER.to_string(),
        }
    }
}

impl RoleClassifier for FirstMatchClassifier {
    fn classify(&self, tags: &[TagPoint]) -> RoleAssignment {
        let marker = self.centre_marker.to_lowercase();
        let mut out = RoleAssignment::default();

        for tag in tags {
            if tag.label.to_lowercase().contains(&marker) {
                if out.centre_point.is_none() {
                    out.centre_point = Some(tag.clone());
                } else {
                    out.other.push(tag.clone());
                }
            } else if out.object_point.is_none() {
                out.object_point = Some(tag.clone());
            } else {
                out.other.push(tag.clone());
            }
        }

        out
    }
}

/// Stricter policy: a role is only assigned when its candidate is unique. Two centre-marked
/// tags (or two object candidates) leave that role empty and route all candidates to `other`.
#[derive(Debug, Clone)]
pub struct UniqueRoleClassifier {
    pub centre_marker: String,
}

impl Default for UniqueRoleClassifier {
    fn default() -> Self {
        Self {
            centre_marker: CENTRE_LABEL_MARKER.to_string(),
        }
    }
}

impl RoleClassifier for UniqueRoleClassifier {
    fn classify(&self, tags: &[TagPoint]) -> RoleAssignment {
        let marker = self.centre_marker.to_lowercase();
        let (centres, objects): (Vec<&TagPoint>, Vec<&TagPoint>) = tags
            .iter()
            .partition(|tag| tag.label.to_lowercase().contains(&marker));

        let mut out = RoleAssignment::default();
        if let [only] = centres.as_slice() {
            out.centre_point = Some((*only).clone());
        } else {
            out.other.extend(centres.into_iter().cloned());
        }
        if let [only] = objects.as_slice() {
            out.object_point = Some((*only).clone());
        } else {
            out.other.extend(objects.into_iter().cloned());
        }
        out
    }
}

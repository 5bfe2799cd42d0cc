use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `<points coords="...">label</points>` or `<tracks ...>...</tracks>`, label may span lines.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(?:points|tracks)[^>]*coords="([^"]*)"[^>]*>(.*?)</(?:points|tracks)>"#)
        .expect("valid tag regex")
});

static INT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\d+").expect("valid int token regex"));

/// One frame-delimited group inside a coords payload: a frame id followed by a run of numbers.
/// Groups are separated by tab, `:`, `,` or `;`.
static FRAME_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\t:;,])[ \t]*([0-9.]+) ([0-9. ]+)").expect("valid group regex")
});

/// `(index, x, y)` triples inside a frame group. x/y are capped at 4 digits so a stray long
/// number cannot swallow a whole group.
static TRIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+) ([0-9]{1,4}) ([0-9]{1,4})").expect("valid triple regex"));

/// How the numeric payload of an annotation tag encodes positions.
///
/// Both encodings appear in the wild for the same tag grammar, so the caller must pick one
/// explicitly; nothing here tries to guess.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoordEncoding {
    /// The last two numeric tokens of the payload are absolute pixels.
    Pixel,
    /// `(index, x, y)` triples with x/y in thousandths of the frame dimension.
    PerMille,
}

impl CoordEncoding {
    pub fn other(self) -> Self {
        match self {
            CoordEncoding::Pixel => CoordEncoding::PerMille,
            CoordEncoding::PerMille => CoordEncoding::Pixel,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

/// Image dimensions used to resolve tag coordinates, either shared by every frame or listed
/// per frame (index 0 = frame 1).
#[derive(Debug, Clone, PartialEq)]
pub enum FrameGeometry {
    Uniform(FrameSize),
    PerFrame(Vec<FrameSize>),
}

impl FrameGeometry {
    pub fn uniform(width: f64, height: f64) -> Self {
        FrameGeometry::Uniform(FrameSize { width, height })
    }

    /// Size for a 1-based frame id. `None` means the id is unresolvable and the frame's
    /// points must be skipped.
    pub fn size_for(&self, frame_id: u32) -> Option<FrameSize> {
        match self {
            FrameGeometry::Uniform(size) => Some(*size),
            FrameGeometry::PerFrame(sizes) => {
                let idx = usize::try_from(frame_id.checked_sub(1)?).ok()?;
                sizes.get(idx).copied()
            }
        }
    }
}

/// A single resolved annotation point: absolute pixel position plus the tag's label and
/// source span.
#[derive(Debug, Clone, PartialEq)]
pub struct TagPoint {
    /// 1-based frame the point belongs to.
    pub frame_id: u32,
    /// Track/point index inside the frame group, when the encoding carries one.
    pub index: Option<u32>,
    pub x: f64,
    pub y: f64,
    /// Inner tag text, verbatim.
    pub label: String,
    /// Byte range of the whole tag occurrence in the source text.
    pub span: Range<usize>,
}

/// Extracts every annotation point from `text` under the given encoding, in text order.
///
/// Points that resolve outside `[0, width] x [0, height]` are dropped, never clamped.
/// A numeric token that fails to parse skips only the point it belongs to.
pub fn extract_tag_points(
    text: &str,
    geometry: &FrameGeometry,
    encoding: CoordEncoding,
) -> Vec<TagPoint> {
    let mut points = Vec::new();

    for caps in TAG_RE.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        let payload = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let label = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let span = whole.start()..whole.end();

        match encoding {
            CoordEncoding::Pixel => {
                if let Some(point) = pixel_point(payload, label, span, geometry) {
                    points.push(point);
                }
            }
            CoordEncoding::PerMille => {
                per_mille_points(payload, label, span, geometry, &mut points);
            }
        }
    }

    points
}

/// Pixel payloads carry one point per tag: the last two integer tokens. Earlier tokens are
/// frame/track indices; the first one doubles as the frame id when present.
fn pixel_point(
    payload: &str,
    label: &str,
    span: Range<usize>,
    geometry: &FrameGeometry,
) -> Option<TagPoint> {
    let nums: Vec<i64> = INT_TOKEN_RE
        .find_iter(payload)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if nums.len() < 2 {
        return None;
    }

    let frame_id = if nums.len() > 2 {
        u32::try_from(nums[0]).ok().filter(|id| *id >= 1).unwrap_or(1)
    } else {
        1
    };
    let size = geometry.size_for(frame_id)?;

    let x = nums[nums.len() - 2] as f64;
    let y = nums[nums.len() - 1] as f64;
    if !(0.0..=size.width).contains(&x) || !(0.0..=size.height).contains(&y) {
        return None;
    }

    Some(TagPoint {
        frame_id,
        index: None,
        x,
        y,
        label: label.to_string(),
        span,
    })
}

/// Per-mille payloads carry frame-delimited groups of `(index, x, y)` triples, many points
/// per tag. `x/1000 * width` resolves the pixel position.
fn per_mille_points(
    payload: &str,
    label: &str,
    span: Range<usize>,
    geometry: &FrameGeometry,
    out: &mut Vec<TagPoint>,
) {
    for group in FRAME_GROUP_RE.captures_iter(payload) {
        let Ok(frame_id) = group[1].parse::<u32>() else {
            continue;
        };
        let Some(size) = geometry.size_for(frame_id) else {
            continue;
        };

        for triple in TRIPLE_RE.captures_iter(&group[2]) {
            let Ok(index) = triple[1].parse::<u32>() else {
                continue;
            };
            let (Ok(xm), Ok(ym)) = (triple[2].parse::<f64>(), triple[3].parse::<f64>()) else {
                continue;
            };

            let x = xm / 1000.0 * size.width;
            let y = ym / 1000.0 * size.height;
            if !(0.0..=size.width).contains(&x) || !(0.0..=size.height).contains(&y) {
                continue;
            }

            out.push(TagPoint {
                frame_id,
                index: Some(index),
                x,
                y,
                label: label.to_string(),
                span: span.clone(),
            });
        }
    }
}

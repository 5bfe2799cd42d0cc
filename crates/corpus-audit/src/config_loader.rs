use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use vla_agent_core::corpus::{CorpusScanner, ScanConfig};
use vla_agent_core::vla::{CoordEncoding, FirstMatchClassifier, FrameGeometry, FrameSize};

pub const DEFAULT_CONFIG_FILE: &str = "audit.toml";

/// Audit settings, loadable from `audit.toml`. Every field has a default matching the
/// original deployment (1920x1200, pixel coords, 5 px tolerance), so the file is optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub image_width: f64,
    pub image_height: f64,
    /// Per-frame `[width, height]` pairs for multi-resolution corpora; overrides the
    /// uniform pair when present (entry 0 = frame 1).
    pub frame_sizes: Option<Vec<[f64; 2]>>,
    pub tolerance_px: f64,
    pub encoding: CoordEncoding,
    pub centre_marker: String,
    pub flag_encoding_divergence: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            image_width: 1920.0,
            image_height: 1200.0,
            frame_sizes: None,
            tolerance_px: 5.0,
            encoding: CoordEncoding::Pixel,
            centre_marker: "centre of image".to_string(),
            flag_encoding_divergence: true,
        }
    }
}

impl AuditConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse(&text)
    }

    /// Loads `audit.toml` via the usual search order, falling back to defaults when no file
    /// exists anywhere.
    pub fn load_default() -> anyhow::Result<Self> {
        match resolve_path(DEFAULT_CONFIG_FILE) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Failed to parse TOML")
    }

    pub fn geometry(&self) -> FrameGeometry {
        match &self.frame_sizes {
            Some(sizes) => FrameGeometry::PerFrame(
                sizes
                    .iter()
                    .map(|[width, height]| FrameSize {
                        width: *width,
                        height: *height,
                    })
                    .collect(),
            ),
            None => FrameGeometry::uniform(self.image_width, self.image_height),
        }
    }

    pub fn build_scanner(&self) -> CorpusScanner {
        let scan = ScanConfig {
            geometry: self.geometry(),
            encoding: self.encoding,
            tolerance_px: self.tolerance_px,
            flag_encoding_divergence: self.flag_encoding_divergence,
        };
        let classifier = FirstMatchClassifier {
            centre_marker: self.centre_marker.clone(),
        };
        CorpusScanner::with_classifier(scan, Box::new(classifier))
    }
}

/// Search order:
/// 1) `VLA_AUDIT_CONFIG_DIR/<relative_path>`
/// 2) `./<relative_path>`
/// 3) `<repo_root>/config/<relative_path>` (repo-local convenience)
fn resolve_path(relative_path: &str) -> Option<PathBuf> {
    let rel = Path::new(relative_path);

    if let Some(root) = env::var_os("VLA_AUDIT_CONFIG_DIR") {
        let candidate = PathBuf::from(root).join(rel);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        let candidate = cwd.join(rel);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    // This crate lives at <repo_root>/crates/corpus-audit.
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)?
        .join("config")
        .join(rel);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = AuditConfig::parse("").unwrap();
        assert_eq!(cfg, AuditConfig::default());
        assert_eq!(
            cfg.geometry(),
            FrameGeometry::uniform(1920.0, 1200.0)
        );
    }

    #[test]
    fn full_toml_overrides_everything() {
        let cfg = AuditConfig::parse(
            r#"
image_width = 2560.0
image_height = 1440.0
tolerance_px = 10.0
encoding = "per_mille"
centre_marker = "screen middle"
flag_encoding_divergence = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.image_width, 2560.0);
        assert_eq!(cfg.tolerance_px, 10.0);
        assert_eq!(cfg.encoding, CoordEncoding::PerMille);
        assert_eq!(cfg.centre_marker, "screen middle");
        assert!(!cfg.flag_encoding_divergence);
    }

    #[test]
    fn frame_sizes_switch_to_per_frame_geometry() {
        let cfg = AuditConfig::parse(
            r#"
frame_sizes = [[1920.0, 1200.0], [1280.0, 720.0]]
"#,
        )
        .unwrap();
        match cfg.geometry() {
            FrameGeometry::PerFrame(sizes) => {
                assert_eq!(sizes.len(), 2);
                assert_eq!(sizes[1].width, 1280.0);
            }
            other => panic!("expected per-frame geometry, got {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AuditConfig::parse("tollerance_px = 5.0").is_err());
    }
}

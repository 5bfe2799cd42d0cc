use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::record::InteractionRecord;
use crate::vla::{
    ConsistencyReport, ConsistencyStatus, CoordEncoding, FirstMatchClassifier, FrameGeometry,
    RoleAssignment, RoleClassifier, TagPoint, analyze_output,
};

/// Diagnostic categories a scanned record can fall into. A record may be in several at once;
/// membership in none means the record is well-formed and geometrically consistent.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticBucket {
    /// No annotation tags were extracted at all.
    NoPoints,
    /// Tags were extracted but none classified as the centre point.
    NoCentre,
    /// No action clause and every command field idle: the turn pointed but never moved.
    PointOnlyNoAction,
    /// The stated action disagrees with the geometric expectation beyond tolerance.
    InconsistentAction,
}

/// Scanner output for one corpus record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordDiagnostic {
    pub iteration: u64,
    pub before_screenshot: Option<String>,
    pub buckets: Vec<DiagnosticBucket>,
    pub report: ConsistencyReport,
    /// The two coordinate encodings resolved the same role to materially different positions.
    pub encoding_divergence: bool,
}

impl DiagnosticBucket {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticBucket::NoPoints => "no_points",
            DiagnosticBucket::NoCentre => "no_centre",
            DiagnosticBucket::PointOnlyNoAction => "point_only_no_action",
            DiagnosticBucket::InconsistentAction => "inconsistent_action",
        }
    }
}

impl RecordDiagnostic {
    pub fn is_clean(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn has(&self, bucket: DiagnosticBucket) -> bool {
        self.buckets.contains(&bucket)
    }
}

/// All the knobs of the diagnostic pass, threaded explicitly so differently configured
/// corpora/resolutions can share one binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub geometry: FrameGeometry,
    pub encoding: CoordEncoding,
    pub tolerance_px: f64,
    /// Re-parse each output under the other encoding and flag material disagreement.
    pub flag_encoding_divergence: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::uniform(1920.0, 1200.0),
            encoding: CoordEncoding::Pixel,
            tolerance_px: 5.0,
            flag_encoding_divergence: true,
        }
    }
}

/// Runs the interpretation pipeline over a recorded corpus and buckets each record.
///
/// Scanning is pure per record: re-scanning an unchanged corpus yields identical results, and
/// no record's failure affects any other record.
pub struct CorpusScanner {
    config: ScanConfig,
    classifier: Box<dyn RoleClassifier>,
}

impl CorpusScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_classifier(config, Box::new(FirstMatchClassifier::default()))
    }

    pub fn with_classifier(config: ScanConfig, classifier: Box<dyn RoleClassifier>) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Diagnoses a single record. Pure: no shared state, any execution order over a corpus
    /// yields the same per-record result.
    pub fn diagnose(&self, record: &InteractionRecord) -> RecordDiagnostic {
        let cfg = &self.config;
        let text = record.vla_output.as_deref().unwrap_or("");
        let analysis = analyze_output(
            text,
            &cfg.geometry,
            cfg.encoding,
            self.classifier.as_ref(),
            cfg.tolerance_px,
        );

        let mut buckets = Vec::new();
        if analysis.tags.is_empty() {
            buckets.push(DiagnosticBucket::NoPoints);
        } else if analysis.roles.centre_point.is_none() {
            buckets.push(DiagnosticBucket::NoCentre);
        }
        if analysis.action.is_none() && record.commands.all_idle() {
            buckets.push(DiagnosticBucket::PointOnlyNoAction);
        }
        if analysis.report.status == ConsistencyStatus::Inconsistent {
            buckets.push(DiagnosticBucket::InconsistentAction);
        }

        let encoding_divergence = cfg.flag_encoding_divergence && {
            let alt = analyze_output(
                text,
                &cfg.geometry,
                cfg.encoding.other(),
                self.classifier.as_ref(),
                cfg.tolerance_px,
            );
            roles_diverge(&analysis.roles, &alt.roles, cfg.tolerance_px)
        };

        RecordDiagnostic {
            iteration: record.iteration,
            before_screenshot: record.before_screenshot.clone(),
            buckets,
            report: analysis.report,
            encoding_divergence,
        }
    }

    /// Lazily scans a corpus from any buffered reader. Malformed lines are logged and
    /// skipped; they never abort the scan.
    pub fn scan_reader<R: BufRead>(&self, reader: R) -> ScanIter<'_, R> {
        ScanIter {
            scanner: self,
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Opens and lazily scans a corpus file. An unreadable file is the only fatal condition.
    pub fn scan_path(&self, path: &Path) -> anyhow::Result<ScanIter<'_, BufReader<File>>> {
        let file = File::open(path)
            .with_context(|| format!("open corpus file {}", path.display()))?;
        Ok(self.scan_reader(BufReader::new(file)))
    }
}

/// True when either role resolves under both encodings to positions further apart than the
/// tolerance. Presence/absence disagreement alone is not divergence.
fn roles_diverge(primary: &RoleAssignment, alt: &RoleAssignment, tolerance_px: f64) -> bool {
    let apart =
        |a: &TagPoint, b: &TagPoint| (a.x - b.x).hypot(a.y - b.y) > tolerance_px;

    let object_diverges = match (&primary.object_point, &alt.object_point) {
        (Some(a), Some(b)) => apart(a, b),
        _ => false,
    };
    let centre_diverges = match (&primary.centre_point, &alt.centre_point) {
        (Some(a), Some(b)) => apart(a, b),
        _ => false,
    };
    object_diverges || centre_diverges
}

/// Lazy, single-pass iterator over a corpus. Restart by calling `scan_reader`/`scan_path`
/// again; the underlying corpus is never mutated.
pub struct ScanIter<'a, R> {
    scanner: &'a CorpusScanner,
    lines: io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> Iterator for ScanIter<'_, R> {
    type Item = RecordDiagnostic;

    fn next(&mut self) -> Option<RecordDiagnostic> {
        loop {
            self.line_no += 1;
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    // The stream itself is broken; nothing further can be read.
                    warn!(line = self.line_no, "corpus read failed: {err}");
                    return None;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<InteractionRecord>(line) {
                Ok(record) => return Some(self.scanner.diagnose(&record)),
                Err(err) => {
                    warn!(line = self.line_no, "skipping malformed corpus line: {err}");
                }
            }
        }
    }
}

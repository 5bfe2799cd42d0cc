//! Offline corpus audit: replays the model-output interpretation pipeline over a recorded
//! run and prints every anomalous iteration plus a summary.

mod config_loader;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vla_agent_core::corpus::{DiagnosticBucket, RecordDiagnostic};
use vla_agent_core::vla::ActionVector;

use crate::config_loader::AuditConfig;

#[derive(Debug, Default)]
struct Totals {
    scanned: usize,
    clean: usize,
    no_points: usize,
    no_centre: usize,
    point_only_no_action: usize,
    inconsistent_action: usize,
    encoding_divergence: usize,
}

impl Totals {
    fn tally(&mut self, diag: &RecordDiagnostic) {
        self.scanned += 1;
        if diag.is_clean() {
            self.clean += 1;
        }
        for bucket in &diag.buckets {
            match bucket {
                DiagnosticBucket::NoPoints => self.no_points += 1,
                DiagnosticBucket::NoCentre => self.no_centre += 1,
                DiagnosticBucket::PointOnlyNoAction => self.point_only_no_action += 1,
                DiagnosticBucket::InconsistentAction => self.inconsistent_action += 1,
            }
        }
        if diag.encoding_divergence {
            self.encoding_divergence += 1;
        }
    }
}

fn fmt_point(point: Option<(f64, f64)>) -> String {
    match point {
        Some((x, y)) => format!("({x:.1}, {y:.1})"),
        None => "-".to_string(),
    }
}

fn fmt_action(action: Option<ActionVector>) -> String {
    match action {
        Some(a) => format!("({}, {})", a.dx, a.dy),
        None => "-".to_string(),
    }
}

fn print_anomaly(diag: &RecordDiagnostic) {
    let buckets: Vec<&str> = diag.buckets.iter().map(|b| b.name()).collect();
    let report = &diag.report;
    let norm = report
        .diff_norm
        .map(|n| format!("{n:.2}"))
        .unwrap_or_else(|| "-".to_string());
    let divergence = if diag.encoding_divergence {
        " encoding_divergence"
    } else {
        ""
    };

    println!(
        "{} iter {} [{}]{} obj {} ctr {} act {} diff {} ||diff|| {}",
        diag.before_screenshot.as_deref().unwrap_or("-"),
        diag.iteration,
        buckets.join(", "),
        divergence,
        fmt_point(report.object_point),
        fmt_point(report.centre_point),
        fmt_action(report.action),
        fmt_point(report.diff_vector),
        norm,
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let corpus_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .context("usage: corpus-audit <metadata.jsonl> [audit.toml]")?;
    let config = match args.next() {
        Some(path) => AuditConfig::load(Path::new(&path))?,
        None => AuditConfig::load_default()?,
    };

    let scanner = config.build_scanner();
    let mut totals = Totals::default();

    for diag in scanner.scan_path(&corpus_path)? {
        totals.tally(&diag);
        if !diag.is_clean() || diag.encoding_divergence {
            print_anomaly(&diag);
        }
    }

    info!(
        scanned = totals.scanned,
        clean = totals.clean,
        no_points = totals.no_points,
        no_centre = totals.no_centre,
        point_only_no_action = totals.point_only_no_action,
        inconsistent_action = totals.inconsistent_action,
        encoding_divergence = totals.encoding_divergence,
        "audit complete"
    );
    Ok(())
}

//! End-to-end scanner tests over a real corpus file on disk.

use std::io::Write;
use std::path::PathBuf;

use vla_agent_core::corpus::{CorpusScanner, DiagnosticBucket, RecordDiagnostic, ScanConfig};

fn write_corpus(lines: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("metadata.jsonl");
    let mut file = std::fs::File::create(&path).expect("create corpus");
    for line in lines {
        writeln!(file, "{line}").expect("write corpus line");
    }
    (dir, path)
}

fn scanner() -> CorpusScanner {
    CorpusScanner::new(ScanConfig {
        flag_encoding_divergence: false,
        ..ScanConfig::default()
    })
}

#[test]
fn one_malformed_line_among_ten_yields_nine_results() {
    let good = r#"{"iteration": ITER, "before_screenshot": "before_ITER.png", "vla_output": "<points coords=\"1 1 940 610\">ship</points>"}"#;
    let mut lines: Vec<String> = (1..=10)
        .map(|i| good.replace("ITER", &i.to_string()))
        .collect();
    lines[4] = "{this line is not json".to_string();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (_dir, path) = write_corpus(&refs);

    let diags: Vec<RecordDiagnostic> = scanner()
        .scan_path(&path)
        .expect("corpus should open")
        .collect();

    assert_eq!(diags.len(), 9);
    let iterations: Vec<u64> = diags.iter().map(|d| d.iteration).collect();
    assert_eq!(iterations, vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);
}

#[test]
fn rescanning_an_unchanged_corpus_is_idempotent() {
    let (_dir, path) = write_corpus(&[
        concat!(
            r#"{"iteration": 1, "vla_output": "#,
            r#""<points coords=\"1 1 940 610\">ship</points> "#,
            r#"<points coords=\"1 1 960 600\">centre of image</points> "#,
            r#"The action to be taken is therefore (20, -10).""#,
            r#", "commands": {"up":0,"down":0,"left":0,"right":200,"exit":0}}"#,
        ),
        r#"{"iteration": 2, "vla_output": "nothing to point at"}"#,
        r#"{"iteration": 3}"#,
    ]);

    let scanner = scanner();
    let first: Vec<RecordDiagnostic> = scanner.scan_path(&path).unwrap().collect();
    let second: Vec<RecordDiagnostic> = scanner.scan_path(&path).unwrap().collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(first[0].is_clean());
    assert!(first[1].has(DiagnosticBucket::NoPoints));
    assert!(first[2].has(DiagnosticBucket::NoPoints));
}

#[test]
fn buckets_survive_the_disk_round_trip() {
    let (_dir, path) = write_corpus(&[concat!(
        r#"{"iteration": 9, "before_screenshot": "before_0009.png", "vla_output": "#,
        r#""<points coords=\"1 1 100 100\">ship</points> "#,
        r#"<points coords=\"1 1 120 90\">centre of image</points> "#,
        r#"The action to be taken is therefore (0, 0).""#,
        r#", "commands": {"right": 150}}"#,
    )]);

    let diags: Vec<RecordDiagnostic> = scanner().scan_path(&path).unwrap().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].iteration, 9);
    assert_eq!(
        diags[0].before_screenshot.as_deref(),
        Some("before_0009.png")
    );
    assert_eq!(diags[0].buckets, vec![DiagnosticBucket::InconsistentAction]);
    let norm = diags[0].report.diff_norm.expect("evaluable report");
    assert!((norm - 22.360_679_774_997_9).abs() < 1e-6);
}

#[test]
fn unreadable_corpus_file_is_the_only_fatal_error() {
    let missing = PathBuf::from("/nonexistent/metadata.jsonl");
    assert!(scanner().scan_path(&missing).is_err());
}

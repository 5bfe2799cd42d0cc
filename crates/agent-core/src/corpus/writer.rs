use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use super::record::InteractionRecord;

/// Append-only writer for the corpus JSONL file: one record per line, flushed per append.
#[derive(Debug)]
pub struct CorpusWriter {
    file: File,
}

impl CorpusWriter {
    pub fn append_to(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open corpus file {}", path.display()))?;
        Ok(Self { file })
    }

    pub fn append(&mut self, record: &InteractionRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record).context("encode corpus record")?;
        writeln!(self.file, "{line}").context("append corpus record")?;
        self.file.flush().context("flush corpus file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::record::MoveCommands;

    fn record(iteration: u64) -> InteractionRecord {
        InteractionRecord {
            iteration,
            timestamp: None,
            before_screenshot: Some(format!("before_{iteration:04}.png")),
            after_screenshot: None,
            prompt: None,
            vla_output: Some("no target".to_string()),
            commands: MoveCommands::default(),
            executed_durations: serde_json::Map::new(),
        }
    }

    #[test]
    fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.jsonl");

        let mut writer = CorpusWriter::append_to(&path).unwrap();
        writer.append(&record(1)).unwrap();
        writer.append(&record(2)).unwrap();
        drop(writer);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: InteractionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.iteration, 1);
    }

    #[test]
    fn reopening_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.jsonl");

        CorpusWriter::append_to(&path).unwrap().append(&record(1)).unwrap();
        CorpusWriter::append_to(&path).unwrap().append(&record(2)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}

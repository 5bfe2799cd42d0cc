//! Recorded-interaction corpus: the JSONL record schema, an append-only writer for the
//! acting loop, and the diagnostic scanner that replays the interpretation pipeline over a
//! finished run.

pub mod record;
pub mod scan;
pub mod writer;

pub use record::{InteractionRecord, MoveCommands};
pub use scan::{CorpusScanner, DiagnosticBucket, RecordDiagnostic, ScanConfig};
pub use writer::CorpusWriter;

use std::time::Duration;

use anyhow::Context;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::corpus::record::MoveCommands;

/// Minimal config for the model-serving `/analyze` endpoint.
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:8000/analyze`.
    pub endpoint: String,
    /// Whole-request deadline; the stream is one atomic unit per iteration.
    pub timeout: Duration,
}

impl AnalyzeConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Events the serving process streams back as NDJSON while analyzing a frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AnalyzeEvent {
    Processing {
        #[serde(default)]
        message: String,
    },
    ModelOutput {
        #[serde(default)]
        text: String,
    },
    Commands {
        #[serde(default)]
        data: MoveCommands,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

/// What one analyze call settles on: the raw model text and the parsed key-hold commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzeOutcome {
    pub raw_output: String,
    pub commands: MoveCommands,
}

/// Sends one screenshot plus prompt to the serving endpoint and drains its event stream.
///
/// Service-side `error` events and unparsable lines are logged and do not abort the stream;
/// the loop decides what to do with a partial outcome. Only transport-level failures are
/// returned as errors.
pub async fn analyze_frame(
    image_png: Vec<u8>,
    prompt: &str,
    cfg: &AnalyzeConfig,
) -> anyhow::Result<AnalyzeOutcome> {
    let client = reqwest::Client::builder()
        .timeout(cfg.timeout)
        .build()
        .context("build analyze http client")?;

    let form = Form::new()
        .part(
            "file",
            Part::bytes(image_png)
                .file_name("current_frame.png")
                .mime_str("image/png")
                .context("build image part")?,
        )
        .text("prompt", prompt.to_string());

    let res = client
        .post(&cfg.endpoint)
        .multipart(form)
        .send()
        .await
        .context("analyze request failed")?
        .error_for_status()
        .context("analyze non-2xx response")?;

    let mut outcome = AnalyzeOutcome::default();
    let mut stream = res.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("analyze stream read")?;
        pending.extend_from_slice(&chunk);
        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            apply_event_line(&line, &mut outcome);
        }
    }
    if !pending.is_empty() {
        apply_event_line(&pending, &mut outcome);
    }

    Ok(outcome)
}

fn apply_event_line(line: &[u8], outcome: &mut AnalyzeOutcome) {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<AnalyzeEvent>(line) {
        Ok(AnalyzeEvent::ModelOutput { text }) => outcome.raw_output = text,
        Ok(AnalyzeEvent::Commands { data }) => outcome.commands = data,
        Ok(AnalyzeEvent::Processing { message }) => debug!("analyze progress: {message}"),
        Ok(AnalyzeEvent::Error { message }) => error!("analyze service error: {message}"),
        Err(err) => warn!("unparsable analyze event: {err} line={line}"),
    }
}

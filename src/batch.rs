use std::io;

use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::{
    features::{Feature, RawFields, RawValue, N_FEATURES},
    pipeline::{Outcome, Pipeline},
};

const MAX_LINE_LENGTH: usize = 4096;

/// Counters of a finished batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Outcome) {
        self.processed += 1;
        if !outcome.is_value() {
            self.failed += 1;
        }
    }
}

/// Parses one input line into raw fields.
///
/// A line is either nine comma separated values in feature order, or comma separated
/// `name=value` pairs using the same names the web form uses.
///
/// # Errors
/// Returns a human-readable string if the line has the wrong shape.
pub fn parse_line(line: &str) -> Result<RawFields, String> {
    if line.contains('=') {
        return line
            .split(',')
            .map(|pair| {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("malformed pair '{}'", pair.trim()))?;
                Ok((key.trim().to_string(), RawValue::from(value)))
            })
            .collect();
    }

    let values: Vec<&str> = line.split(',').collect();
    if values.len() != N_FEATURES {
        return Err(format!(
            "expected {N_FEATURES} comma separated values, got {}",
            values.len()
        ));
    }

    Ok(Feature::ALL
        .iter()
        .zip(values)
        .map(|(feature, value)| (feature.name().to_string(), RawValue::from(value)))
        .collect())
}

fn codec_err(e: LinesCodecError) -> io::Error {
    match e {
        LinesCodecError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Runs every line of `input` through the pipeline, writing one result line per input line.
///
/// Blank lines and lines starting with `#` are skipped. A bad or oversized line never stops
/// the run, only I/O failures do.
pub async fn run<R, W>(pipeline: &Pipeline, input: R, output: W) -> io::Result<BatchSummary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(input, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let mut results = FramedWrite::new(output, LinesCodec::new());
    let mut summary = BatchSummary::default();
    let mut resuming = false;

    loop {
        let outcome = match lines.next().await {
            Some(Ok(line)) => {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                match parse_line(line) {
                    Ok(fields) => pipeline.respond(&fields),
                    Err(e) => Outcome::error(e),
                }
            }
            // The codec drops the rest of the line on its own.
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                resuming = true;
                Outcome::error(format!("line longer than {MAX_LINE_LENGTH} bytes"))
            }
            Some(Err(LinesCodecError::Io(e))) => return Err(e),
            // After a decode error the reader yields a single `None` before reading on.
            None if resuming => {
                resuming = false;
                continue;
            }
            None => break,
        };

        if let Outcome::Error(msg) = &outcome {
            warn!("line {}: {msg}", summary.processed + 1);
        }

        summary.record(&outcome);
        results.send(outcome.to_string()).await.map_err(codec_err)?;
    }

    SinkExt::<String>::flush(&mut results)
        .await
        .map_err(codec_err)?;
    info!(
        "processed {} line(s), {} failed",
        summary.processed, summary.failed
    );

    Ok(summary)
}

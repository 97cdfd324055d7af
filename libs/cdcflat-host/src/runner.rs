use std::io::{BufRead, Write};

use cdcflat_api::transform::{is_dropped, RecordTransform, DROP_SENTINEL};

use crate::error::HostError;

/// Counters for one run over an input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Non-blank input lines handed to the transform.
    pub lines: u64,
    pub accepted: u64,
    /// Lines answered with the drop sentinel.
    pub rejected: u64,
    /// Blank input lines.
    pub skipped: u64,
}

/// Feeds newline-delimited change events through a transform, one output
/// line per input line.
pub struct Runner<'a> {
    transform: &'a dyn RecordTransform,
    skip_rejected: bool,
}

impl<'a> Runner<'a> {
    pub fn new(transform: &'a dyn RecordTransform) -> Self {
        Self {
            transform,
            skip_rejected: false,
        }
    }

    /// Leave dropped records out of the output instead of writing `{}`.
    pub fn skip_rejected(mut self, skip: bool) -> Self {
        self.skip_rejected = skip;
        self
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<RunStats, HostError> {
        let mut stats = RunStats::default();

        for (idx, line) in input.split(b'\n').enumerate() {
            let line_no = idx + 1;
            let mut line = line.map_err(|e| HostError::from(e).with_context(format!("line {line_no}")))?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                stats.skipped += 1;
                continue;
            }
            stats.lines += 1;

            let out = match std::str::from_utf8(&line) {
                Ok(text) => self.transform.transform(text),
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "dropping non UTF-8 line");
                    DROP_SENTINEL.to_string()
                }
            };
            if is_dropped(&out) {
                stats.rejected += 1;
                tracing::debug!(line = line_no, "record dropped");
                if self.skip_rejected {
                    continue;
                }
            } else {
                stats.accepted += 1;
            }
            writeln!(output, "{out}")?;
        }

        output.flush()?;
        tracing::info!(
            transform = self.transform.name(),
            lines = stats.lines,
            accepted = stats.accepted,
            rejected = stats.rejected,
            skipped = stats.skipped,
            "run finished"
        );
        Ok(stats)
    }
}

//! Output writing
//!
//! Writes decoded messages either as a text dump or as packed
//! `timestamp;name;label;value` rows, and keeps per-file counters.

use crate::config::OutputFormat;
use dla_decoder::{Message, MessageKind};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

/// Per-file decoding counters
#[derive(Debug, Default)]
pub struct FileSummary {
    pub lines_read: usize,
    pub messages: HashMap<MessageKind, usize>,
    pub errors: usize,
    /// Messages left out of packed output because they could not be packed
    pub pack_skipped: usize,
}

impl FileSummary {
    pub fn total_messages(&self) -> usize {
        self.messages.values().sum()
    }

    /// Log the summary at info level
    pub fn log(&self, source: &Path) {
        log::info!(
            "{:?}: {} lines, {} messages, {} errors, {} not packed",
            source,
            self.lines_read,
            self.total_messages(),
            self.errors,
            self.pack_skipped
        );
        for kind in MessageKind::ALL {
            if let Some(count) = self.messages.get(&kind) {
                log::info!("  {}: {}", kind, count);
            }
        }
    }
}

/// Writes messages in the selected output format
pub struct ReportWriter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    /// Text dumps start with a comment naming the source and decode time.
    /// Packed output has no preamble so it stays machine-readable.
    pub fn write_preamble(&mut self, source: &Path) -> io::Result<()> {
        if self.format == OutputFormat::Txt {
            writeln!(
                self.out,
                "# Decoded from {} at {}",
                source.display(),
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            )?;
        }
        Ok(())
    }

    pub fn write_message(&mut self, message: &Message, summary: &mut FileSummary) -> io::Result<()> {
        *summary.messages.entry(message.kind()).or_insert(0) += 1;

        match self.format {
            OutputFormat::Txt => write!(self.out, "{}", message),
            OutputFormat::Packed => match message.pack() {
                Ok(rows) => {
                    for row in rows {
                        writeln!(self.out, "{}", row)?;
                    }
                    Ok(())
                }
                Err(e) => {
                    log::debug!("Not packing {} at {}: {}", message.kind(), message.timestamp(), e);
                    summary.pack_skipped += 1;
                    Ok(())
                }
            },
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

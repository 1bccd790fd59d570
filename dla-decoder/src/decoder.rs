//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct owns the schema tables and the single piece of session
//! state (whether the `T_RTC` synchronization line has been seen), and turns
//! log lines into [`Message`]s.

use crate::config::DecoderConfig;
use crate::message::{CanPayload, Message};
use crate::opcode::Opcode;
use crate::schema::{SchemaDatabase, SchemaStats, SchemaTable};
use crate::types::{DecoderError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Schema tables used to resolve CAN identifiers, in precedence order
    schema: SchemaDatabase,
    config: DecoderConfig,
    /// Set once the `T_RTC` line has been seen
    synchronized: bool,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with the given configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            schema: SchemaDatabase::new(),
            synchronized: !config.require_sync,
            config,
        }
    }

    /// Replace the schema database
    pub fn with_schema(mut self, schema: SchemaDatabase) -> Self {
        self.schema = schema;
        self
    }

    /// Load a JSON schema file and append it to the schema tables
    ///
    /// Files added earlier take precedence when identifiers overlap.
    ///
    /// # Example
    /// ```no_run
    /// use dla_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_schema_file(Path::new("CFG/batteries.can.json")).unwrap();
    /// decoder.add_schema_file(Path::new("CFG/tritium.can.json")).unwrap();
    /// ```
    pub fn add_schema_file(&mut self, path: &Path) -> Result<()> {
        let table = crate::schema::load_schema_file(path)?;
        self.schema.add_table(table);
        Ok(())
    }

    /// Append an in-memory schema table
    pub fn add_schema_table(&mut self, table: SchemaTable) {
        self.schema.add_table(table);
    }

    pub fn schema(&self) -> &SchemaDatabase {
        &self.schema
    }

    /// Get statistics about the loaded schema tables
    pub fn schema_stats(&self) -> SchemaStats {
        self.schema.stats()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Start a new session: lines are ignored again until the next `T_RTC`
    pub fn reset(&mut self) {
        self.synchronized = !self.config.require_sync;
    }

    /// Decode a single log line
    ///
    /// Returns `Ok(None)` for blank lines, unknown or reserved opcodes, the
    /// `T_RTC` line itself and anything before it. A malformed timestamp or a
    /// line too short for its record type is an error for that line only.
    ///
    /// # Example
    /// ```
    /// use dla_decoder::Decoder;
    ///
    /// let mut decoder = Decoder::new();
    /// assert!(decoder.dispatch("ACL 1.0 00 01 00 02 00 03").unwrap().is_none());
    /// assert!(decoder.dispatch("T_RTC 0.0").unwrap().is_none());
    ///
    /// let message = decoder.dispatch("ACL 12.512 00 41 00 42 00 43").unwrap().unwrap();
    /// assert_eq!(message.data(), vec!["41", "42", "43"]);
    /// ```
    pub fn dispatch(&mut self, line: &str) -> Result<Option<Message>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let Some(first) = tokens.first() else {
            return Ok(None);
        };

        let Some(opcode) = Opcode::from_token(first) else {
            log::trace!("Ignoring unknown opcode {:?}", first);
            return Ok(None);
        };

        if opcode == Opcode::RealTimeClock {
            if !self.synchronized {
                log::debug!("Synchronized on {} line", Opcode::SYNC_TOKEN);
            }
            self.synchronized = true;
            return Ok(None);
        }

        if !self.synchronized {
            log::trace!("Skipping {} line before synchronization", opcode.name());
            return Ok(None);
        }

        let message = match opcode {
            Opcode::Accelerometer => Message::accelerometer(&tokens)?,
            Opcode::BufferOverflow => Message::buffer_overflow(&tokens)?,
            Opcode::CanReceive => Message::can_frame(&tokens, &self.schema)?,
            Opcode::CanOverflow => Message::can_overflow(&tokens)?,
            Opcode::CardInfo => Message::sd_card_info(&tokens)?,
            Opcode::Mount => Message::sd_card_mounted(&tokens)?,
            Opcode::Performance => Message::voltage_performance(&tokens)?,
            Opcode::Voltage => Message::voltage_measurement(&tokens)?,
            Opcode::CanTransmitError => Message::can_transmit_error(&tokens)?,
            Opcode::Parameters
            | Opcode::Dismount
            | Opcode::CanReceiveError
            | Opcode::RealTimeClock => {
                log::trace!("No handler for {} (id {})", opcode.name(), opcode.id());
                return Ok(None);
            }
        };

        Ok(Some(message))
    }

    /// Decode every line of a reader and return an iterator of messages
    ///
    /// Lines are read as bytes and converted lossily, so stray non-UTF-8 bytes
    /// only affect the line they appear on. Per-line errors are yielded as
    /// [`DecoderError::AtLine`] and iteration continues with the next line.
    pub fn decode_reader<R: BufRead>(&mut self, reader: R) -> DecodingIterator<'_, R> {
        DecodingIterator::new(reader, self)
    }

    /// Decode a log file from the beginning of a new session
    ///
    /// # Example
    /// ```no_run
    /// use dla_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// for message in decoder.decode_file(Path::new("RUN0001.DLA")).unwrap() {
    ///     match message {
    ///         Ok(message) => print!("{}", message),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(&mut self, path: &Path) -> Result<DecodingIterator<'_, BufReader<File>>> {
        log::info!("Decoding log file: {:?}", path);

        let file = File::open(path)?;
        self.reset();
        Ok(self.decode_reader(BufReader::new(file)))
    }

    /// Apply the stream filters from the configuration
    fn should_emit(&self, message: &Message) -> bool {
        if !self.config.should_emit_kind(message.kind()) {
            return false;
        }
        if !self.config.emit_unknown_can {
            if let Message::CanFrame {
                payload: CanPayload::Unknown,
                ..
            } = message
            {
                return false;
            }
        }
        true
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that decodes log lines into messages
///
/// This iterator wraps a line reader and processes each line:
/// 1. Dispatch the line → message, nothing, or a line error
/// 2. Drop messages rejected by the configured filters
/// 3. Wrap errors with their 1-based line number
pub struct DecodingIterator<'a, R: BufRead> {
    lines: std::io::Split<R>,
    decoder: &'a mut Decoder,
    line_no: usize,
}

impl<'a, R: BufRead> DecodingIterator<'a, R> {
    fn new(reader: R, decoder: &'a mut Decoder) -> Self {
        Self {
            lines: reader.split(b'\n'),
            decoder,
            line_no: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    fn at_line(&self, source: DecoderError) -> DecoderError {
        DecoderError::AtLine {
            line: self.line_no,
            source: Box::new(source),
        }
    }
}

impl<'a, R: BufRead> Iterator for DecodingIterator<'a, R> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = self.lines.next()?;
            self.line_no += 1;

            let bytes = match bytes {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(self.at_line(e.into()))),
            };
            let line = String::from_utf8_lossy(&bytes);

            match self.decoder.dispatch(&line) {
                Ok(Some(message)) if self.decoder.should_emit(&message) => {
                    return Some(Ok(message));
                }
                Ok(_) => continue,
                Err(e) => {
                    log::debug!("Line {}: {}", self.line_no, e);
                    return Some(Err(self.at_line(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CanIdentifier, SchemaEntry};
    use crate::types::MessageKind;

    const LOG: &str = "\
PRM CANCHA 0 Main
CRD 0.1 03 SD SU02G 8.0 1a2b3c4d 00c7
ACL 0.5 00 01 00 02 00 03
T_RTC 2012 05 15
MNT 1.0 0000A1B2
ACL 12.512 00 41 00 42 00 43
XYZ 13.0 ignored
PWM 13.0 ignored
CRM 14.0 00 403 00,00,80,3F
CRM 14.5 00 7FF 01,02
CRM 15.0 covf
BOVF 16.0
VLT bogus 2 100 11 12 13
PFM 17.0 2 100 11 12 13
";

    fn decoder() -> Decoder {
        let mut table = SchemaTable::new("tritium");
        table.insert(
            SchemaEntry::new(CanIdentifier::from_token("403"), "f")
                .with_name("Motor Velocity")
                .with_labels(["rpm"]),
        );
        let mut decoder = Decoder::new();
        decoder.add_schema_table(table);
        decoder
    }

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        let stats = decoder.schema_stats();
        assert_eq!(stats.num_tables, 0);
        assert_eq!(stats.num_entries, 0);
        assert!(!decoder.is_synchronized());
    }

    #[test]
    fn test_nothing_before_sync() {
        let mut decoder = decoder();
        assert!(decoder.dispatch("ACL 1.0 00 01 00 02 00 03").unwrap().is_none());
        assert!(decoder.dispatch("CRM 1.0 00 403 00,00,80,3F").unwrap().is_none());
        // malformed lines are not even inspected before sync
        assert!(decoder.dispatch("BOVF garbage").unwrap().is_none());

        assert!(decoder.dispatch("T_RTC").unwrap().is_none());
        assert!(decoder.is_synchronized());
        assert!(decoder.dispatch("T_RTC 2012 05 15").unwrap().is_none());
        assert!(decoder.dispatch("BOVF 2.0").unwrap().is_some());
    }

    #[test]
    fn test_sentinel_is_case_sensitive() {
        let mut decoder = decoder();
        decoder.dispatch("t_rtc").unwrap();
        assert!(!decoder.is_synchronized());
    }

    #[test]
    fn test_blank_and_reserved_lines() {
        let mut decoder = decoder();
        decoder.dispatch("T_RTC").unwrap();
        assert!(decoder.dispatch("").unwrap().is_none());
        assert!(decoder.dispatch("   \t ").unwrap().is_none());
        for line in ["PRM 1.0 x", "PWM 1.0 x", "DM 1.0", "CRE 1.0 01", "NOPE 1.0"] {
            assert!(decoder.dispatch(line).unwrap().is_none(), "{}", line);
        }
    }

    #[test]
    fn test_whitespace_runs() {
        let mut decoder = decoder();
        decoder.dispatch("T_RTC").unwrap();
        let msg = decoder
            .dispatch("ACL\t12.512   00 41  00\t42 00 43\r")
            .unwrap()
            .unwrap();
        assert_eq!(msg.data(), vec!["41", "42", "43"]);
    }

    #[test]
    fn test_overflow_aliases() {
        let mut decoder = decoder();
        decoder.dispatch("T_RTC").unwrap();
        let covf = decoder.dispatch("COVF 3.0").unwrap().unwrap();
        let movf = decoder.dispatch("MOVF 3.0").unwrap().unwrap();
        assert_eq!(covf, movf);
        assert_eq!(covf.kind(), MessageKind::CanOverflow);
    }

    #[test]
    fn test_timestamp_error_propagates() {
        let mut decoder = decoder();
        decoder.dispatch("T_RTC").unwrap();
        let result = decoder.dispatch("ACL 12 00 41");
        assert!(matches!(result, Err(DecoderError::TimestampParse(_))));
    }

    #[test]
    fn test_decode_reader() {
        let mut decoder = decoder();
        let results: Vec<_> = decoder.decode_reader(LOG.as_bytes()).collect();

        let kinds: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().map(|m| m.kind()).ok())
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(MessageKind::SdCardMounted),
                Some(MessageKind::Accelerometer),
                Some(MessageKind::CanFrame),
                Some(MessageKind::CanFrame),
                Some(MessageKind::CanOverflow),
                Some(MessageKind::BufferOverflow),
                None,
                Some(MessageKind::VoltagePerformance),
            ]
        );

        match &results[6] {
            Err(DecoderError::AtLine { line, source }) => {
                assert_eq!(*line, 13);
                assert!(matches!(**source, DecoderError::TimestampParse(_)));
            }
            other => panic!("expected line error, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_filters() {
        let config = DecoderConfig::new()
            .with_kind_filter(vec![MessageKind::CanFrame])
            .with_unknown_can(false);
        let mut decoder = decoder();
        decoder.config = config;

        let messages: Vec<Message> = decoder
            .decode_reader(LOG.as_bytes())
            .filter_map(|r| r.ok())
            .collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].can_id(), Some("403"));
        assert_eq!(messages[0].data(), vec!["1.0"]);
    }

    #[test]
    fn test_without_sync_requirement() {
        let mut decoder = Decoder::with_config(DecoderConfig::new().with_require_sync(false));
        assert!(decoder.is_synchronized());
        assert!(decoder.dispatch("BOVF 1.0").unwrap().is_some());
        decoder.reset();
        assert!(decoder.is_synchronized());
    }

    #[test]
    fn test_reset_clears_sync() {
        let mut decoder = decoder();
        decoder.dispatch("T_RTC").unwrap();
        decoder.reset();
        assert!(!decoder.is_synchronized());
        assert!(decoder.dispatch("BOVF 1.0").unwrap().is_none());
    }

    #[test]
    fn test_lossy_lines() {
        let mut decoder = decoder();
        let input: &[u8] = b"T_RTC\nBOVF 1.0 \xff\xfe\nBOVF 2.0\n";
        let messages: Vec<_> = decoder.decode_reader(input).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.is_ok()));
    }

    #[test]
    fn test_missing_file() {
        let mut decoder = decoder();
        let result = decoder.decode_file(Path::new("does/not/exist.dla"));
        assert!(matches!(result, Err(DecoderError::Io(_))));
    }
}

//! Datalogger Log Decoder Library
//!
//! A small, reusable library for decoding the line-oriented ASCII logs (`.dla`)
//! written by the vehicle datalogger into typed records.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on decoding:
//! - Tokenizes each log line and dispatches on its opcode
//! - Skips everything before the `T_RTC` synchronization line
//! - Decodes fixed-point timestamps
//! - Resolves CAN identifiers against ordered schema tables (JSON schema files)
//! - Unpacks CAN payloads with the struct-format mini-language
//!
//! The library does NOT:
//! - Select input files
//! - Write CSV or text output
//! - Aggregate records across lines
//!
//! All higher-level functionality is in the application layer (dla-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use dla_decoder::{Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! // Create decoder and load schema tables, highest precedence first
//! let mut decoder = Decoder::with_config(DecoderConfig::new());
//! decoder.add_schema_file(Path::new("CFG/batteries.can.json")).unwrap();
//! decoder.add_schema_file(Path::new("CFG/tritium.can.json")).unwrap();
//!
//! // Decode log file
//! for message in decoder.decode_file(Path::new("RUN0001.DLA")).unwrap() {
//!     match message {
//!         Ok(message) => match message.pack() {
//!             Ok(rows) => rows.iter().for_each(|row| println!("{}", row)),
//!             Err(_) => print!("{}", message),
//!         },
//!         Err(e) => eprintln!("Decode error: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod message;
pub mod opcode;
pub mod payload;
pub mod schema;
pub mod timestamp;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{Decoder, DecodingIterator};
pub use message::{CanPayload, Message, DECODE_FAILED, UNKNOWN_CAN_MESSAGE};
pub use opcode::Opcode;
pub use payload::PayloadDecoder;
pub use schema::{CanIdentifier, SchemaDatabase, SchemaEntry, SchemaStats, SchemaTable};
pub use timestamp::Timestamp;
pub use types::{DecoderError, MessageKind, PackError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

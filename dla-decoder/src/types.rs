//! Core types for the datalogger decoder library
//!
//! This module defines the error types shared by every stage of decoding and the
//! small enums that classify decoded messages. The message record itself lives in
//! [`crate::message`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to parse timestamp: {0}")]
    TimestampParse(String),

    #[error("Failed to decode payload: {0}")]
    PayloadDecode(String),

    #[error("Failed to pack message: {0}")]
    Pack(#[from] PackError),

    #[error("{opcode} line has no field at index {index}")]
    MissingField { opcode: &'static str, index: usize },

    #[error("Failed to parse schema file: {0}")]
    SchemaParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<DecoderError>,
    },
}

/// Errors raised by the field-pairing projection ([`crate::Message::pack`])
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("message carries no data")]
    MissingData,

    #[error("message header has no field labels")]
    MissingLabels,

    #[error("{labels} field labels but {values} values")]
    FieldCountMismatch { labels: usize, values: usize },
}

/// The kind of a decoded message, one per log record variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Accelerometer,
    BufferOverflow,
    CanFrame,
    CanOverflow,
    CanTransmitError,
    SdCardInfo,
    SdCardMounted,
    VoltagePerformance,
    VoltageMeasurement,
}

impl MessageKind {
    /// All kinds, in opcode order
    pub const ALL: [MessageKind; 9] = [
        MessageKind::Accelerometer,
        MessageKind::BufferOverflow,
        MessageKind::CanFrame,
        MessageKind::CanOverflow,
        MessageKind::CanTransmitError,
        MessageKind::SdCardInfo,
        MessageKind::SdCardMounted,
        MessageKind::VoltagePerformance,
        MessageKind::VoltageMeasurement,
    ];

    /// True for the kinds that originate on the CAN bus
    pub fn is_can(&self) -> bool {
        matches!(
            self,
            MessageKind::CanFrame | MessageKind::CanOverflow | MessageKind::CanTransmitError
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Accelerometer => write!(f, "Accelerometer"),
            MessageKind::BufferOverflow => write!(f, "BufferOverflow"),
            MessageKind::CanFrame => write!(f, "CanFrame"),
            MessageKind::CanOverflow => write!(f, "CanOverflow"),
            MessageKind::CanTransmitError => write!(f, "CanTransmitError"),
            MessageKind::SdCardInfo => write!(f, "SdCardInfo"),
            MessageKind::SdCardMounted => write!(f, "SdCardMounted"),
            MessageKind::VoltagePerformance => write!(f, "VoltagePerformance"),
            MessageKind::VoltageMeasurement => write!(f, "VoltageMeasurement"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_kinds() {
        let can: Vec<_> = MessageKind::ALL.iter().filter(|k| k.is_can()).collect();
        assert_eq!(
            can,
            vec![
                &MessageKind::CanFrame,
                &MessageKind::CanOverflow,
                &MessageKind::CanTransmitError
            ]
        );
    }

    #[test]
    fn test_error_display() {
        let err = DecoderError::AtLine {
            line: 7,
            source: Box::new(DecoderError::TimestampParse("missing '.' in \"12\"".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "line 7: Failed to parse timestamp: missing '.' in \"12\""
        );

        let err = DecoderError::from(PackError::FieldCountMismatch { labels: 3, values: 1 });
        assert_eq!(err.to_string(), "Failed to pack message: 3 field labels but 1 values");
    }
}

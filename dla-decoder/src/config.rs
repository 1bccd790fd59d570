//! Decoder configuration types
//!
//! This module defines the small set of options the decoder library needs.
//! Per-line dispatch is not affected by them; they only filter the message
//! stream produced by [`crate::Decoder::decode_reader`].

use crate::types::MessageKind;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Ignore lines until the first `T_RTC` line (false = start synchronized)
    #[serde(default = "default_true")]
    pub require_sync: bool,

    /// Optional: only emit messages of these kinds
    #[serde(default)]
    pub kind_filter: Option<Vec<MessageKind>>,

    /// Whether to emit CAN frames whose identifier is in no schema table
    #[serde(default = "default_true")]
    pub emit_unknown_can: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            require_sync: true,
            kind_filter: None,
            emit_unknown_can: true,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: require (or skip) the `T_RTC` synchronization line
    pub fn with_require_sync(mut self, enabled: bool) -> Self {
        self.require_sync = enabled;
        self
    }

    /// Builder method: set kind filter
    pub fn with_kind_filter(mut self, kinds: Vec<MessageKind>) -> Self {
        self.kind_filter = Some(kinds);
        self
    }

    /// Builder method: emit or drop CAN frames with unknown identifiers
    pub fn with_unknown_can(mut self, enabled: bool) -> Self {
        self.emit_unknown_can = enabled;
        self
    }

    /// Check if a message kind should be emitted
    pub fn should_emit_kind(&self, kind: MessageKind) -> bool {
        match &self.kind_filter {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_require_sync(false)
            .with_kind_filter(vec![MessageKind::CanFrame])
            .with_unknown_can(false);

        assert!(!config.require_sync);
        assert!(!config.emit_unknown_can);
        assert!(config.should_emit_kind(MessageKind::CanFrame));
        assert!(!config.should_emit_kind(MessageKind::Accelerometer));
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();

        // Without filters, everything should pass
        assert!(config.require_sync);
        for kind in MessageKind::ALL {
            assert!(config.should_emit_kind(kind));
        }
    }

    #[test]
    fn test_serde_defaults() {
        let config: DecoderConfig = serde_json::from_str("{}").unwrap();
        assert!(config.require_sync);
        assert!(config.emit_unknown_can);
        assert!(config.kind_filter.is_none());

        let config: DecoderConfig =
            serde_json::from_str(r#"{"kind_filter": ["Accelerometer", "VoltageMeasurement"]}"#)
                .unwrap();
        assert_eq!(
            config.kind_filter,
            Some(vec![MessageKind::Accelerometer, MessageKind::VoltageMeasurement])
        );
    }
}

//! Decoded log records
//!
//! One [`Message`] is produced per telemetry line. Each variant carries only the
//! fields its record type has; the uniform `header`/`data` view used by output
//! writers is computed on demand.

use crate::payload::PayloadDecoder;
use crate::schema::SchemaDatabase;
use crate::timestamp::Timestamp;
use crate::types::{DecoderError, MessageKind, PackError, Result};
use std::fmt;

/// Sole data value of a CAN frame whose payload did not match its format
pub const DECODE_FAILED: &str = "Error decoding payload";

/// Header of a CAN frame whose identifier is in no schema table
pub const UNKNOWN_CAN_MESSAGE: &str = "Unknown CAN Message";

/// Token positions shared by every line layout
const TIMESTAMP_INDEX: usize = 1;
const PAYLOAD_START: usize = 2;

/// CAN line layout: `CRM <timestamp> <flag> <id> <b0,b1,...>`
const CAN_FLAG_INDEX: usize = 2;
const CAN_ID_INDEX: usize = 3;
const CAN_PAYLOAD_INDEX: usize = 4;

/// Accelerometer samples sit at every other token from here
const ACCEL_FIRST_SAMPLE: usize = 3;

const SD_CARD_INFO_HEADER: [&str; 7] = [
    "SD Card Information",
    "Manufacturer ID (hex)",
    "OEM/Application ID",
    "Product Name",
    "Product Revision",
    "Product Serial Number (hex)",
    "Manufacturing Date (hex)",
];

const PERFORMANCE_HEADER: [&str; 6] = [
    "Statistical Performance Measurement",
    "Channel ID",
    "Samples",
    "Min",
    "Avg",
    "Max",
];

const VOLTAGE_HEADER: [&str; 6] = [
    "Statistical Voltage Measurement",
    "Channel ID",
    "Samples",
    "Min",
    "Avg",
    "Max",
];

/// Outcome of decoding a CAN frame's payload
#[derive(Debug, Clone, PartialEq)]
pub enum CanPayload {
    /// Identifier found in a schema and payload decoded
    Decoded {
        name: String,
        labels: Vec<String>,
        values: Vec<String>,
    },
    /// Identifier found but the payload did not fit the format
    DecodeFailed { name: String, labels: Vec<String> },
    /// Identifier in no schema table
    Unknown,
}

/// A decoded log record
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Accelerometer {
        timestamp: Timestamp,
        /// X, Y, Z samples as logged
        samples: Vec<String>,
    },
    BufferOverflow {
        timestamp: Timestamp,
    },
    CanFrame {
        timestamp: Timestamp,
        /// Identifier token as logged, without `0x`
        can_id: String,
        /// Raw byte tokens of the payload
        raw: Vec<String>,
        payload: CanPayload,
    },
    CanOverflow {
        timestamp: Timestamp,
    },
    CanTransmitError {
        timestamp: Timestamp,
    },
    SdCardInfo {
        timestamp: Timestamp,
        fields: Vec<String>,
    },
    SdCardMounted {
        timestamp: Timestamp,
    },
    VoltagePerformance {
        timestamp: Timestamp,
        fields: Vec<String>,
    },
    VoltageMeasurement {
        timestamp: Timestamp,
        fields: Vec<String>,
    },
}

impl Message {
    /// `ACL <ts> <x-hi> <x> <y-hi> <y> <z-hi> <z>`
    pub(crate) fn accelerometer(tokens: &[&str]) -> Result<Self> {
        Ok(Message::Accelerometer {
            timestamp: timestamp_of(tokens, "ACL")?,
            samples: tokens
                .iter()
                .skip(ACCEL_FIRST_SAMPLE)
                .step_by(2)
                .map(|s| s.to_string())
                .collect(),
        })
    }

    pub(crate) fn buffer_overflow(tokens: &[&str]) -> Result<Self> {
        Ok(Message::BufferOverflow {
            timestamp: timestamp_of(tokens, "BOVF")?,
        })
    }

    pub(crate) fn can_overflow(tokens: &[&str]) -> Result<Self> {
        Ok(Message::CanOverflow {
            timestamp: timestamp_of(tokens, "COVF")?,
        })
    }

    pub(crate) fn can_transmit_error(tokens: &[&str]) -> Result<Self> {
        Ok(Message::CanTransmitError {
            timestamp: timestamp_of(tokens, "CTE")?,
        })
    }

    pub(crate) fn sd_card_mounted(tokens: &[&str]) -> Result<Self> {
        Ok(Message::SdCardMounted {
            timestamp: timestamp_of(tokens, "MNT")?,
        })
    }

    pub(crate) fn sd_card_info(tokens: &[&str]) -> Result<Self> {
        Ok(Message::SdCardInfo {
            timestamp: timestamp_of(tokens, "CRD")?,
            fields: rest_of(tokens),
        })
    }

    pub(crate) fn voltage_performance(tokens: &[&str]) -> Result<Self> {
        Ok(Message::VoltagePerformance {
            timestamp: timestamp_of(tokens, "PFM")?,
            fields: rest_of(tokens),
        })
    }

    pub(crate) fn voltage_measurement(tokens: &[&str]) -> Result<Self> {
        Ok(Message::VoltageMeasurement {
            timestamp: timestamp_of(tokens, "VLT")?,
            fields: rest_of(tokens),
        })
    }

    /// `CRM <ts> <flag> <id> <payload>`
    ///
    /// A `covf`/`movf` flag turns the line into an overflow record.
    pub(crate) fn can_frame(tokens: &[&str], schema: &SchemaDatabase) -> Result<Self> {
        let timestamp = timestamp_of(tokens, "CRM")?;

        let flag = field(tokens, CAN_FLAG_INDEX, "CRM")?;
        if flag.eq_ignore_ascii_case("covf") || flag.eq_ignore_ascii_case("movf") {
            return Ok(Message::CanOverflow { timestamp });
        }

        let can_id = field(tokens, CAN_ID_INDEX, "CRM")?;
        let raw: Vec<&str> = if tokens.len() > CAN_PAYLOAD_INDEX {
            tokens[tokens.len() - 1]
                .split(',')
                .filter(|b| !b.is_empty())
                .collect()
        } else {
            Vec::new()
        };

        let payload = match schema.resolve(can_id) {
            Some(entry) => {
                let name = entry.display_name();
                let labels = entry.field_labels.clone();
                match PayloadDecoder::decode(&raw, &entry.format) {
                    Ok(values) => {
                        log::trace!("Decoded CAN 0x{} as {}", can_id, name);
                        CanPayload::Decoded {
                            name,
                            labels,
                            values,
                        }
                    }
                    Err(e) => {
                        log::warn!("CAN 0x{} ({}): {}", can_id, name, e);
                        CanPayload::DecodeFailed { name, labels }
                    }
                }
            }
            None => {
                log::trace!("No schema entry for CAN 0x{}", can_id);
                CanPayload::Unknown
            }
        };

        Ok(Message::CanFrame {
            timestamp,
            can_id: can_id.to_string(),
            raw: raw.into_iter().map(str::to_string).collect(),
            payload,
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Accelerometer { .. } => MessageKind::Accelerometer,
            Message::BufferOverflow { .. } => MessageKind::BufferOverflow,
            Message::CanFrame { .. } => MessageKind::CanFrame,
            Message::CanOverflow { .. } => MessageKind::CanOverflow,
            Message::CanTransmitError { .. } => MessageKind::CanTransmitError,
            Message::SdCardInfo { .. } => MessageKind::SdCardInfo,
            Message::SdCardMounted { .. } => MessageKind::SdCardMounted,
            Message::VoltagePerformance { .. } => MessageKind::VoltagePerformance,
            Message::VoltageMeasurement { .. } => MessageKind::VoltageMeasurement,
        }
    }

    /// Get the timestamp of this message
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Message::Accelerometer { timestamp, .. }
            | Message::BufferOverflow { timestamp }
            | Message::CanFrame { timestamp, .. }
            | Message::CanOverflow { timestamp }
            | Message::CanTransmitError { timestamp }
            | Message::SdCardInfo { timestamp, .. }
            | Message::SdCardMounted { timestamp }
            | Message::VoltagePerformance { timestamp, .. }
            | Message::VoltageMeasurement { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_can(&self) -> bool {
        self.kind().is_can()
    }

    /// CAN identifier token, for CAN frames
    pub fn can_id(&self) -> Option<&str> {
        match self {
            Message::CanFrame { can_id, .. } => Some(can_id),
            _ => None,
        }
    }

    /// Message name followed by one label per field
    pub fn header(&self) -> Vec<&str> {
        match self {
            Message::Accelerometer { .. } => vec!["Accelerometer"],
            Message::BufferOverflow { .. } => vec!["Buffer Overflow"],
            Message::CanOverflow { .. } => vec!["CAN Overflow"],
            Message::CanTransmitError { .. } => vec!["CAN Transmit Error"],
            Message::SdCardMounted { .. } => vec!["SD Card Mounted"],
            Message::SdCardInfo { .. } => SD_CARD_INFO_HEADER.to_vec(),
            Message::VoltagePerformance { .. } => PERFORMANCE_HEADER.to_vec(),
            Message::VoltageMeasurement { .. } => VOLTAGE_HEADER.to_vec(),
            Message::CanFrame { payload, .. } => match payload {
                CanPayload::Decoded { name, labels, .. }
                | CanPayload::DecodeFailed { name, labels } => {
                    std::iter::once(name.as_str())
                        .chain(labels.iter().map(String::as_str))
                        .collect()
                }
                CanPayload::Unknown => vec![UNKNOWN_CAN_MESSAGE],
            },
        }
    }

    /// Decoded values, aligned with `header()[1..]`
    pub fn data(&self) -> Vec<&str> {
        let values: &[String] = match self {
            Message::Accelerometer { samples, .. } => samples,
            Message::SdCardInfo { fields, .. }
            | Message::VoltagePerformance { fields, .. }
            | Message::VoltageMeasurement { fields, .. } => fields,
            Message::CanFrame { payload, .. } => match payload {
                CanPayload::Decoded { values, .. } => values,
                CanPayload::DecodeFailed { .. } => return vec![DECODE_FAILED],
                CanPayload::Unknown => &[],
            },
            Message::BufferOverflow { .. }
            | Message::CanOverflow { .. }
            | Message::CanTransmitError { .. }
            | Message::SdCardMounted { .. } => &[],
        };
        values.iter().map(String::as_str).collect()
    }

    /// True when `data()` holds decoded values (the decode-failure marker does not count)
    pub fn has_data(&self) -> bool {
        match self {
            Message::CanFrame {
                payload: CanPayload::DecodeFailed { .. },
                ..
            } => false,
            _ => !self.data().is_empty(),
        }
    }

    /// Pair every field label with its value
    ///
    /// Produces one `timestamp;name;label;value` row per field. Fails when the
    /// message has no data, no field labels, or a different number of each.
    pub fn pack(&self) -> std::result::Result<Vec<String>, PackError> {
        let header = self.header();
        let data = self.data();

        if data.is_empty() {
            return Err(PackError::MissingData);
        }
        if header.len() < 2 {
            return Err(PackError::MissingLabels);
        }
        let labels = &header[1..];
        if labels.len() != data.len() {
            return Err(PackError::FieldCountMismatch {
                labels: labels.len(),
                values: data.len(),
            });
        }

        let timestamp = self.timestamp();
        Ok(labels
            .iter()
            .zip(&data)
            .map(|(label, value)| format!("{};{};{};{}", timestamp, header[0], label, value))
            .collect())
    }

    /// Text-dump projection: timestamp, header list and, if present, data list
    pub fn params(&self) -> Vec<String> {
        let mut params = vec![self.timestamp().to_string(), bracketed(&self.header())];
        let data = self.data();
        if !data.is_empty() {
            params.push(bracketed(&data));
        }
        params
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.params() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn field<'a>(tokens: &[&'a str], index: usize, opcode: &'static str) -> Result<&'a str> {
    tokens
        .get(index)
        .copied()
        .ok_or(DecoderError::MissingField { opcode, index })
}

fn timestamp_of(tokens: &[&str], opcode: &'static str) -> Result<Timestamp> {
    Timestamp::parse(field(tokens, TIMESTAMP_INDEX, opcode)?)
}

fn rest_of(tokens: &[&str]) -> Vec<String> {
    tokens
        .iter()
        .skip(PAYLOAD_START)
        .map(|s| s.to_string())
        .collect()
}

fn bracketed(items: &[&str]) -> String {
    format!("[{}]", items.join(", "))
}

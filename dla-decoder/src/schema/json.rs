//! JSON schema file loader
//!
//! Schema files map an identifier key to a display name, a list of field
//! descriptions and a struct-format string:
//!
//! ```json
//! {
//!   "0x403": {
//!     "name": "Velocity Measurement",
//!     "messages": [["Motor Velocity", "rpm", "Motor angular frequency"],
//!                  ["Vehicle Velocity", "m/s", "Vehicle velocity"]],
//!     "format": "<ff"
//!   }
//! }
//! ```
//!
//! Each inner `messages` array becomes one field label, joined with spaces.

use crate::schema::database::{CanIdentifier, SchemaEntry, SchemaTable};
use crate::types::{DecoderError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    messages: Vec<Vec<String>>,
    format: String,
}

/// Parse a schema file and return its table
pub fn load_schema_file(path: &Path) -> Result<SchemaTable> {
    log::info!("Loading schema file: {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|e| {
        DecoderError::SchemaParse(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.json")
        .to_string();

    let table = parse_schema_str(&content, &source)?;

    log::info!("Parsed {} schema entries from {:?}", table.len(), path);
    Ok(table)
}

/// Parse schema JSON text into a table labelled `source`
pub fn parse_schema_str(content: &str, source: &str) -> Result<SchemaTable> {
    let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)
        .map_err(|e| DecoderError::SchemaParse(format!("{}: {}", source, e)))?;

    let mut table = SchemaTable::new(source);

    for (key, value) in root {
        match serde_json::from_value::<RawEntry>(value) {
            Ok(raw) => table.insert(convert_entry(key, raw)),
            Err(e) => {
                log::warn!("Skipping schema entry {} in {}: {}", key, source, e);
            }
        }
    }

    Ok(table)
}

fn convert_entry(key: String, raw: RawEntry) -> SchemaEntry {
    SchemaEntry {
        id: CanIdentifier::from_key(key),
        name: raw.name,
        field_labels: raw.messages.iter().map(|parts| parts.join(" ")).collect(),
        format: raw.format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRITIUM: &str = r#"{
        "0x403": {
            "name": "Velocity Measurement",
            "messages": [["Motor Velocity", "rpm", "Motor angular frequency in revolutions per minute."],
                         ["Vehicle Velocity", "m/s", "Vehicle velocity in metres / second."]],
            "format": "<ff"
        },
        "0x40E": {
            "messages": [["Odometer", "meters"], ["DC Bus AmpHours", "Ampere-hours"]],
            "format": "ff"
        },
        "0x4FF": { "name": "Broken entry without a format" }
    }"#;

    #[test]
    fn test_parse_entries() {
        let table = parse_schema_str(TRITIUM, "tritium.can.json").unwrap();
        assert_eq!(table.len(), 2);

        let velocity = table.get(&CanIdentifier::from_token("403")).unwrap();
        assert_eq!(velocity.name.as_deref(), Some("Velocity Measurement"));
        assert_eq!(velocity.format, "<ff");
        assert_eq!(
            velocity.field_labels[0],
            "Motor Velocity rpm Motor angular frequency in revolutions per minute."
        );

        let odometer = table.get(&CanIdentifier::from_token("40E")).unwrap();
        assert_eq!(odometer.name, None);
        assert_eq!(odometer.field_labels, vec!["Odometer meters", "DC Bus AmpHours Ampere-hours"]);
    }

    #[test]
    fn test_non_object_is_error() {
        let result = parse_schema_str("[1, 2, 3]", "bad.json");
        assert!(matches!(result, Err(DecoderError::SchemaParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRITIUM.as_bytes()).unwrap();

        let table = load_schema_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = load_schema_file(Path::new("does/not/exist.can.json"));
        assert!(matches!(result, Err(DecoderError::SchemaParse(_))));
    }
}

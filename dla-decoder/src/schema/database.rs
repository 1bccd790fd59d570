//! Ordered schema database
//!
//! Several subsystems (batteries, motor controller, dashboard, ...) publish their
//! own schema table. Tables may overlap; the first table added wins.

use std::collections::HashMap;
use std::fmt;

/// A CAN identifier in its schema key form, e.g. `0x403`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanIdentifier(String);

impl CanIdentifier {
    /// Build the key for a CAN-ID token as it appears in the log (`"403"`)
    pub fn from_token(token: &str) -> Self {
        Self(format!("0x{}", token))
    }

    /// Wrap an already-prefixed key (`"0x403"`)
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the identifier, if the key is valid hex
    pub fn value(&self) -> Option<u32> {
        let digits = self
            .0
            .strip_prefix("0x")
            .or_else(|| self.0.strip_prefix("0X"))?;
        u32::from_str_radix(digits, 16).ok()
    }
}

impl fmt::Display for CanIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoding description for one CAN identifier
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub id: CanIdentifier,
    /// Display name, optional in the schema source
    pub name: Option<String>,
    /// One label per value produced by `format`
    pub field_labels: Vec<String>,
    /// Struct-format string, see [`crate::PayloadDecoder`]
    pub format: String,
}

impl SchemaEntry {
    pub fn new(id: CanIdentifier, format: impl Into<String>) -> Self {
        Self {
            id,
            name: None,
            field_labels: Vec::new(),
            format: format.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Name used as the first header element; falls back to the identifier
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }
}

/// One subsystem's schema, keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    /// Where the table came from (file name or caller-chosen label)
    pub source: String,
    entries: HashMap<CanIdentifier, SchemaEntry>,
}

impl SchemaTable {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: HashMap::new(),
        }
    }

    /// Insert an entry, replacing any previous entry with the same identifier
    pub fn insert(&mut self, entry: SchemaEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, id: &CanIdentifier) -> Option<&SchemaEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Schema tables in precedence order
#[derive(Debug, Clone, Default)]
pub struct SchemaDatabase {
    tables: Vec<SchemaTable>,
}

impl SchemaDatabase {
    /// Create a new empty schema database
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Append a table; it has lower precedence than every table added before it
    pub fn add_table(&mut self, table: SchemaTable) {
        log::debug!(
            "Adding schema table {:?} with {} entries",
            table.source,
            table.len()
        );
        self.tables.push(table);
    }

    /// Find the entry for a CAN-ID token (no `0x` prefix)
    pub fn resolve(&self, can_id: &str) -> Option<&SchemaEntry> {
        resolve(can_id, &self.tables)
    }

    pub fn tables(&self) -> &[SchemaTable] {
        &self.tables
    }

    /// Get database statistics
    pub fn stats(&self) -> SchemaStats {
        SchemaStats {
            num_tables: self.tables.len(),
            num_entries: self.tables.iter().map(SchemaTable::len).sum(),
        }
    }
}

/// Scan `tables` in order and return the first entry keyed `"0x" + can_id`
pub fn resolve<'a>(can_id: &str, tables: &'a [SchemaTable]) -> Option<&'a SchemaEntry> {
    let key = CanIdentifier::from_token(can_id);
    tables.iter().find_map(|table| table.get(&key))
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStats {
    /// Number of tables loaded
    pub num_tables: usize,
    /// Total entries across all tables, overlaps counted twice
    pub num_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(source: &str, entries: &[(&str, &str)]) -> SchemaTable {
        let mut table = SchemaTable::new(source);
        for (key, name) in entries {
            table.insert(SchemaEntry::new(CanIdentifier::from_key(*key), "B").with_name(*name));
        }
        table
    }

    #[test]
    fn test_empty_database() {
        let db = SchemaDatabase::new();
        assert_eq!(db.stats(), SchemaStats { num_tables: 0, num_entries: 0 });
        assert!(db.resolve("403").is_none());
    }

    #[test]
    fn test_first_table_wins() {
        let mut db = SchemaDatabase::new();
        db.add_table(table("batteries", &[("0x123", "Pack Voltage")]));
        db.add_table(table("tritium", &[("0x123", "Overlap"), ("0x403", "Velocity")]));

        assert_eq!(db.resolve("123").unwrap().name.as_deref(), Some("Pack Voltage"));
        assert_eq!(db.resolve("403").unwrap().name.as_deref(), Some("Velocity"));
        assert!(db.resolve("999").is_none());
        assert_eq!(db.stats(), SchemaStats { num_tables: 2, num_entries: 3 });
    }

    #[test]
    fn test_lookup_key_is_exact() {
        let mut db = SchemaDatabase::new();
        db.add_table(table("dashboard", &[("0x40E", "Odometer")]));
        assert!(db.resolve("40E").is_some());
        assert!(db.resolve("0x40E").is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let entry = SchemaEntry::new(CanIdentifier::from_token("501"), "H");
        assert_eq!(entry.display_name(), "0x501");
        assert_eq!(entry.with_name("Drive Command").display_name(), "Drive Command");
    }

    #[test]
    fn test_identifier_value() {
        assert_eq!(CanIdentifier::from_token("40E").value(), Some(0x40E));
        assert_eq!(CanIdentifier::from_key("bogus").value(), None);
    }
}

//! [`VisionTable`] – non-blocking key/value access to a vendor network table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A single entry value.
#[derive(Debug, Clone, PartialEq)]
pub enum TableValue {
    String(String),
    Number(f64),
    NumberArray(Vec<f64>),
}

/// A named network table published by a vision coprocessor.
///
/// Getters return the latest cached value, or `None` when the entry is
/// missing or holds a different type.  Setters are fire-and-forget.
pub trait VisionTable: Send + Sync {
    /// Table name, e.g. `"limelight"`.
    fn name(&self) -> &str;

    fn get_string(&self, key: &str) -> Option<String>;

    fn get_number(&self, key: &str) -> Option<f64>;

    fn get_number_array(&self, key: &str) -> Option<Vec<f64>>;

    fn set_number(&self, key: &str, value: f64);

    fn set_number_array(&self, key: &str, values: &[f64]);
}

/// In-process [`VisionTable`].
///
/// Clones share the same entries, so a simulation can keep one handle to
/// publish into while the pipeline reads from another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    name: String,
    entries: Arc<RwLock<HashMap<String, TableValue>>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::default(),
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: &str, value: TableValue) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
    }

    pub fn put_string(&self, key: &str, value: impl Into<String>) {
        self.put(key, TableValue::String(value.into()));
    }

    pub fn put_number(&self, key: &str, value: f64) {
        self.put(key, TableValue::Number(value));
    }

    pub fn put_number_array(&self, key: &str, values: &[f64]) {
        self.put(key, TableValue::NumberArray(values.to_vec()));
    }

    /// Raw entry lookup.
    pub fn get(&self, key: &str) -> Option<TableValue> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

impl VisionTable for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(TableValue::String(s)) => Some(s),
            _ => None,
        }
    }

    fn get_number(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(TableValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    fn get_number_array(&self, key: &str) -> Option<Vec<f64>> {
        match self.get(key) {
            Some(TableValue::NumberArray(v)) => Some(v),
            _ => None,
        }
    }

    fn set_number(&self, key: &str, value: f64) {
        self.put_number(key, value);
    }

    fn set_number_array(&self, key: &str, values: &[f64]) {
        self.put_number_array(key, values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let writer = MemoryTable::new("limelight");
        let reader = writer.clone();
        writer.put_number("tv", 1.0);
        assert_eq!(reader.get_number("tv"), Some(1.0));
        assert_eq!(reader.name(), "limelight");
    }

    #[test]
    fn typed_getters_reject_mismatched_entries() {
        let table = MemoryTable::new("t");
        table.put_string("json", "{}");
        assert_eq!(table.get_number("json"), None);
        assert_eq!(table.get_number_array("json"), None);
        assert_eq!(table.get_string("json").as_deref(), Some("{}"));
    }

    #[test]
    fn missing_entries_are_none() {
        let table = MemoryTable::new("t");
        assert!(table.get_string("json").is_none());
        assert!(table.get("anything").is_none());
    }

    #[test]
    fn setters_overwrite_and_clear_removes() {
        let table = MemoryTable::new("t");
        table.set_number("pipeline", 0.0);
        table.set_number("pipeline", 2.0);
        table.set_number_array("camerapose_robotspace_set", &[0.1, 0.0, 0.5, 0.0, 15.0, 0.0]);
        assert_eq!(table.get_number("pipeline"), Some(2.0));
        assert_eq!(
            table.get_number_array("camerapose_robotspace_set").map(|v| v.len()),
            Some(6)
        );
        table.clear();
        assert!(table.get_number("pipeline").is_none());
    }
}

//! `__attrs__`: a JSON sidecar of arbitrary user metadata attached to a
//! persisted `BArray`/`BTable`, independent of the binary `meta` header.

use crate::error::{BlzError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attrs(BTreeMap<String, Value>);

impl Attrs {
    pub fn new() -> Self {
        Attrs(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.0)
            .map_err(|e| BlzError::Corrupted(format!("failed to encode attrs: {e}")))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| BlzError::Io(e.error))?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Attrs::new());
        }
        let bytes = fs::read(path)?;
        let map = serde_json::from_slice(&bytes)
            .map_err(|e| BlzError::Corrupted(format!("malformed attrs file: {e}")))?;
        Ok(Attrs(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("__attrs__");
        let mut a = Attrs::new();
        a.set("source", Value::String("sensor-3".into()));
        a.write(&path).unwrap();
        let back = Attrs::read(&path).unwrap();
        assert_eq!(back.get("source").unwrap(), "sensor-3");
    }
}

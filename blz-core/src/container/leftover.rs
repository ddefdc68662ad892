//! `leftover`: the raw, uncompressed tail of atoms that haven't yet filled a
//! full chunk. Kept as plain bytes on disk (not chunk-encoded) since it's
//! always small and is rewritten wholesale on every flush.

use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| crate::error::BlzError::Io(e.error))?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read(path)?)
}

use super::ChunkStore;
use crate::chunk::Chunk;
use crate::dtype::DType;
use crate::error::{BlzError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A `ChunkStore` backed by one file per chunk under `dir`, named
/// `__NNNNNN__.blp`. Replacing a chunk writes to a temp file and renames it
/// into place so a reader never observes a partially written chunk.
pub struct DiskChunkStore {
    dir: PathBuf,
    dtype: DType,
    len: usize,
}

impl DiskChunkStore {
    /// Opens an existing on-disk chunk directory that already holds `len`
    /// chunks of `dtype`.
    pub fn open(dir: impl Into<PathBuf>, dtype: DType, len: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(DiskChunkStore { dir, dtype, len })
    }

    /// Creates a fresh, empty on-disk chunk directory.
    pub fn create(dir: impl Into<PathBuf>, dtype: DType) -> Result<Self> {
        Self::open(dir, dtype, 0)
    }

    fn chunk_path(&self, idx: usize) -> PathBuf {
        self.dir.join(format!("__{idx:06}__.blp"))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(path)
            .map_err(|e| BlzError::Io(e.error))?;
        Ok(())
    }
}

impl ChunkStore for DiskChunkStore {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, idx: usize) -> Result<Chunk> {
        if idx >= self.len {
            return Err(BlzError::Index(format!("chunk index {idx} out of range")));
        }
        let bytes = fs::read(self.chunk_path(idx))?;
        Chunk::read_from(self.dtype, &bytes)
    }

    fn push(&mut self, chunk: Chunk) -> Result<()> {
        let path = self.chunk_path(self.len);
        let mut bytes = Vec::with_capacity(chunk.encoded_len());
        chunk.write_to(&mut bytes);
        self.write_atomic(&path, &bytes)?;
        self.len += 1;
        Ok(())
    }

    fn replace(&mut self, idx: usize, chunk: Chunk) -> Result<()> {
        if idx >= self.len {
            return Err(BlzError::Index(format!("chunk index {idx} out of range")));
        }
        let path = self.chunk_path(idx);
        let mut bytes = Vec::with_capacity(chunk.encoded_len());
        chunk.write_to(&mut bytes);
        self.write_atomic(&path, &bytes)
    }

    fn truncate(&mut self, new_len: usize) -> Result<()> {
        if new_len >= self.len {
            return Ok(());
        }
        for idx in new_len..self.len {
            let path = self.chunk_path(idx);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        self.len = new_len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    #[test]
    fn push_get_replace_truncate() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DiskChunkStore::create(tmp.path(), DType::I32).unwrap();
        let params = Params::default();
        let data: Vec<u8> = (0..10i32).flat_map(|v| v.to_le_bytes()).collect();
        let chunk = Chunk::build(DType::I32, &data, &params).unwrap();
        store.push(chunk.clone()).unwrap();
        assert_eq!(store.len(), 1);

        let back = store.get(0).unwrap();
        let mut out = Vec::new();
        back.decompress_into(&mut out).unwrap();
        assert_eq!(out, data);

        store.replace(0, chunk).unwrap();
        assert_eq!(store.len(), 1);

        store.truncate(0).unwrap();
        assert_eq!(store.len(), 0);
        assert!(store.get(0).is_err());
    }
}

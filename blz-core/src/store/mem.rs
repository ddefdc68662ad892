use super::ChunkStore;
use crate::chunk::Chunk;
use crate::error::{BlzError, Result};

/// A `ChunkStore` that keeps every chunk resident in memory. Used for
/// in-memory `BArray`s and as the working copy while building a disk-backed
/// one.
#[derive(Default)]
pub struct MemChunkStore {
    chunks: Vec<Chunk>,
}

impl MemChunkStore {
    pub fn new() -> Self {
        MemChunkStore { chunks: Vec::new() }
    }
}

impl ChunkStore for MemChunkStore {
    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn get(&self, idx: usize) -> Result<Chunk> {
        self.chunks
            .get(idx)
            .cloned()
            .ok_or_else(|| BlzError::Index(format!("chunk index {idx} out of range")))
    }

    fn push(&mut self, chunk: Chunk) -> Result<()> {
        self.chunks.push(chunk);
        Ok(())
    }

    fn replace(&mut self, idx: usize, chunk: Chunk) -> Result<()> {
        let slot = self
            .chunks
            .get_mut(idx)
            .ok_or_else(|| BlzError::Index(format!("chunk index {idx} out of range")))?;
        *slot = chunk;
        Ok(())
    }

    fn truncate(&mut self, new_len: usize) -> Result<()> {
        self.chunks.truncate(new_len);
        Ok(())
    }
}

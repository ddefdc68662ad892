use super::{CodecId, Compressor};
use crate::error::{BlzError, Result};
use std::io::{Read, Write};

pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn id(&self) -> CodecId {
        CodecId::Lz4
    }

    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, _level: i32) -> Result<u64> {
        let mut buf = Vec::new();
        let n = src.read_to_end(&mut buf)? as u64;
        let compressed = lz4_flex::block::compress_prepend_size(&buf);
        dst.write_all(&compressed)?;
        Ok(n)
    }

    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<u64> {
        let mut buf = Vec::new();
        src.read_to_end(&mut buf)?;
        let decompressed = lz4_flex::block::decompress_size_prepended(&buf)
            .map_err(|e| BlzError::Corrupted(format!("lz4 frame corrupted: {e}")))?;
        dst.write_all(&decompressed)?;
        Ok(decompressed.len() as u64)
    }
}

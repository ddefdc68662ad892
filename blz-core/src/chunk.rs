//! A `Chunk` is the compressed-block primitive BArray is built out of: a
//! fixed-size run of atoms, compressed as a unit and stored with a small
//! self-describing header so a single chunk file is independently decodable
//! (no side table needed).

use crate::codec::{self, shuffle, CodecId};
use crate::dtype::DType;
use crate::error::{BlzError, Result};
use crate::params::Params;
use std::io::Cursor;

const MAGIC: &[u8; 4] = b"BLZ1";
const FLAG_SHUFFLE: u8 = 0b0000_0001;
const FLAG_CONSTANT: u8 = 0b0000_0010;
pub const HEADER_LEN: usize = 32;

/// One compressed run of atoms plus the metadata needed to decode it without
/// consulting anything outside the chunk's own bytes.
#[derive(Clone, Debug)]
pub struct Chunk {
    dtype: DType,
    nitems: usize,
    codec: CodecId,
    shuffled: bool,
    /// `Some(atom_bytes)` when every atom in the chunk is identical — the
    /// payload is then just that one atom, not `nitems` copies of it.
    constant: Option<Vec<u8>>,
    payload: Vec<u8>,
}

impl Chunk {
    /// Builds a chunk from a flat little-endian byte buffer of `nitems`
    /// atoms of `dtype`. Detects the constant-run case before compressing.
    pub fn build(dtype: DType, buf: &[u8], params: &Params) -> Result<Chunk> {
        let typesize = dtype.itemsize();
        if buf.len() % typesize != 0 {
            return Err(BlzError::Value(format!(
                "buffer length {} is not a multiple of itemsize {}",
                buf.len(),
                typesize
            )));
        }
        let nitems = buf.len() / typesize;

        if nitems > 0 && is_constant(buf, typesize) {
            return Ok(Chunk {
                dtype,
                nitems,
                codec: CodecId::Store,
                shuffled: false,
                constant: Some(buf[0..typesize].to_vec()),
                payload: Vec::new(),
            });
        }

        let codec_id = CodecId::from_name(params.cname())?;
        let shuffled = params.shuffle() && typesize > 1;
        let prepared = if shuffled {
            shuffle::shuffle(typesize, buf)
        } else {
            buf.to_vec()
        };

        let compressor = codec::get_compressor(codec_id);
        let mut src = Cursor::new(&prepared);
        let mut payload = Vec::new();
        compressor.compress(&mut src, &mut payload, params.clevel() as i32)?;

        Ok(Chunk {
            dtype,
            nitems,
            codec: codec_id,
            shuffled,
            constant: None,
            payload,
        })
    }

    pub fn nitems(&self) -> usize {
        self.nitems
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    /// The repeated atom's bytes, if this chunk is a constant run.
    pub fn constant_atom(&self) -> Option<&[u8]> {
        self.constant.as_deref()
    }

    /// Size this chunk occupies on disk/in memory, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + match &self.constant {
                Some(atom) => atom.len(),
                None => self.payload.len(),
            }
    }

    /// Decompresses the whole chunk back into a flat little-endian buffer.
    pub fn decompress_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let typesize = self.dtype.itemsize();
        if let Some(atom) = &self.constant {
            out.reserve(self.nitems * typesize);
            for _ in 0..self.nitems {
                out.extend_from_slice(atom);
            }
            return Ok(());
        }

        let compressor = codec::get_compressor(self.codec);
        let mut src = Cursor::new(&self.payload);
        let mut raw = Vec::new();
        compressor.decompress(&mut src, &mut raw)?;

        if self.shuffled {
            out.extend_from_slice(&shuffle::unshuffle(typesize, &raw));
        } else {
            out.extend_from_slice(&raw);
        }
        Ok(())
    }

    /// Decodes a single atom at `idx` without materializing the whole chunk
    /// into a separate buffer beyond what decompression requires.
    pub fn get_one(&self, idx: usize) -> Result<Vec<u8>> {
        if idx >= self.nitems {
            return Err(BlzError::Index(format!(
                "chunk index {idx} out of range (nitems={})",
                self.nitems
            )));
        }
        let typesize = self.dtype.itemsize();
        if let Some(atom) = &self.constant {
            return Ok(atom.clone());
        }
        let mut full = Vec::new();
        self.decompress_into(&mut full)?;
        Ok(full[idx * typesize..(idx + 1) * typesize].to_vec())
    }

    /// Decodes atoms `start..end` (end exclusive) into a flat buffer.
    pub fn get_range(&self, start: usize, end: usize) -> Result<Vec<u8>> {
        if start > end || end > self.nitems {
            return Err(BlzError::Index(format!(
                "chunk range {start}..{end} out of bounds (nitems={})",
                self.nitems
            )));
        }
        let typesize = self.dtype.itemsize();
        if let Some(atom) = &self.constant {
            let mut out = Vec::with_capacity((end - start) * typesize);
            for _ in start..end {
                out.extend_from_slice(atom);
            }
            return Ok(out);
        }
        let mut full = Vec::new();
        self.decompress_into(&mut full)?;
        Ok(full[start * typesize..end * typesize].to_vec())
    }

    /// Serializes this chunk to its self-describing on-disk form.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let typesize = self.dtype.itemsize() as u16;
        let mut flags = 0u8;
        if self.shuffled {
            flags |= FLAG_SHUFFLE;
        }
        if self.constant.is_some() {
            flags |= FLAG_CONSTANT;
        }
        let payload: &[u8] = match &self.constant {
            Some(atom) => atom,
            None => &self.payload,
        };

        out.extend_from_slice(MAGIC);
        out.push(flags);
        out.push(self.codec as u8);
        out.extend_from_slice(&typesize.to_le_bytes());
        out.extend_from_slice(&(self.nitems as u64).to_le_bytes());
        out.extend_from_slice(&(self.dtype.itemsize() as u64 * self.nitems as u64).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(payload);
    }

    /// Parses a chunk from its on-disk form, given the dtype it was written
    /// with (dtype itself is not embedded in the header — it's carried by
    /// the owning BArray's metadata, same split the reference format uses
    /// between a container-wide header and per-block records).
    pub fn read_from(dtype: DType, bytes: &[u8]) -> Result<Chunk> {
        if bytes.len() < HEADER_LEN {
            return Err(BlzError::Corrupted("chunk shorter than header".into()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(BlzError::Corrupted("bad chunk magic".into()));
        }
        let flags = bytes[4];
        let codec = CodecId::from_u8(bytes[5])?;
        let typesize = u16::from_le_bytes(bytes[6..8].try_into().unwrap()) as usize;
        if typesize != dtype.itemsize() {
            return Err(BlzError::Corrupted(format!(
                "chunk typesize {typesize} does not match dtype itemsize {}",
                dtype.itemsize()
            )));
        }
        let nitems = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        let _nbytes = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
        let cbytes = u64::from_le_bytes(bytes[24..32].try_into().unwrap()) as usize;

        let payload = bytes
            .get(HEADER_LEN..HEADER_LEN + cbytes)
            .ok_or_else(|| BlzError::Corrupted("chunk payload truncated".into()))?
            .to_vec();

        if flags & FLAG_CONSTANT != 0 {
            return Ok(Chunk {
                dtype,
                nitems,
                codec,
                shuffled: false,
                constant: Some(payload),
                payload: Vec::new(),
            });
        }

        Ok(Chunk {
            dtype,
            nitems,
            codec,
            shuffled: flags & FLAG_SHUFFLE != 0,
            constant: None,
            payload,
        })
    }
}

fn is_constant(buf: &[u8], typesize: usize) -> bool {
    buf.chunks_exact(typesize)
        .all(|atom| atom == &buf[0..typesize])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i32_bytes(vals: &[i32]) -> Vec<u8> {
        vals.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn roundtrip_normal_chunk() {
        let params = Params::default();
        let data = i32_bytes(&[1, 2, 3, 4, 5, -6, 7, 800]);
        let chunk = Chunk::build(DType::I32, &data, &params).unwrap();
        assert!(!chunk.is_constant());
        assert_eq!(chunk.constant_atom(), None);
        let mut out = Vec::new();
        chunk.decompress_into(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn detects_constant_chunk() {
        let params = Params::default();
        let data = i32_bytes(&[42; 100]);
        let chunk = Chunk::build(DType::I32, &data, &params).unwrap();
        assert!(chunk.is_constant());
        assert!(chunk.encoded_len() < data.len());
        assert_eq!(chunk.constant_atom(), Some(&42i32.to_le_bytes()[..]));
        let mut out = Vec::new();
        chunk.decompress_into(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn disk_roundtrip() {
        let params = Params::default();
        let data = i32_bytes(&(0..256).collect::<Vec<_>>());
        let chunk = Chunk::build(DType::I32, &data, &params).unwrap();
        let mut buf = Vec::new();
        chunk.write_to(&mut buf);
        let parsed = Chunk::read_from(DType::I32, &buf).unwrap();
        let mut out = Vec::new();
        parsed.decompress_into(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn get_one_and_range() {
        let params = Params::default();
        let data = i32_bytes(&[10, 20, 30, 40, 50]);
        let chunk = Chunk::build(DType::I32, &data, &params).unwrap();
        assert_eq!(chunk.get_one(2).unwrap(), 30i32.to_le_bytes().to_vec());
        assert_eq!(chunk.get_range(1, 3).unwrap(), i32_bytes(&[20, 30]));
        assert!(chunk.get_one(5).is_err());
    }
}

//! `meta`: the fixed binary header plus a CBOR-encoded body that describes a
//! persisted `BArray` — dtype, logical length, chunk layout and codec
//! params. Same two-part shape used for on-disk containers throughout the
//! pack: a small magic+version header written by hand, followed by a
//! serde-serialized body.

use crate::dtype::DType;
use crate::error::{BlzError, Result};
use crate::params::Params;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub const MAGIC: &[u8; 8] = b"BLZMETA\0";
pub const VERSION: u16 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetaBody {
    pub dtype: DType,
    /// Atoms per full chunk.
    pub chunklen: usize,
    /// Number of full chunks currently in the chunk store.
    pub nchunks: usize,
    /// Atoms sitting in the `leftover` file, not yet chunked.
    pub leftover_len: usize,
    pub params: Params,
}

impl MetaBody {
    /// Total logical element count: full chunks plus the leftover tail.
    pub fn len(&self) -> usize {
        self.nchunks * self.chunklen + self.leftover_len
    }
}

pub fn write_to(body: &MetaBody, mut w: impl Write) -> Result<()> {
    let mut encoded = Vec::new();
    ciborium::into_writer(body, &mut encoded)
        .map_err(|e| BlzError::Corrupted(format!("failed to encode meta body: {e}")))?;

    w.write_all(MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&(encoded.len() as u64).to_le_bytes())?;
    w.write_all(&encoded)?;
    Ok(())
}

pub fn read_from(mut r: impl Read) -> Result<MetaBody> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(BlzError::Corrupted("bad meta magic".into()));
    }
    let mut v = [0u8; 2];
    r.read_exact(&mut v)?;
    let version = u16::from_le_bytes(v);
    if version != VERSION {
        return Err(BlzError::Corrupted(format!(
            "unsupported meta version {version}"
        )));
    }
    let mut len_buf = [0u8; 8];
    r.read_exact(&mut len_buf)?;
    let body_len = u64::from_le_bytes(len_buf) as usize;
    let mut body_bytes = vec![0u8; body_len];
    r.read_exact(&mut body_bytes)?;

    ciborium::from_reader(&body_bytes[..])
        .map_err(|e| BlzError::Corrupted(format!("failed to decode meta body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let body = MetaBody {
            dtype: DType::F64,
            chunklen: 16384,
            nchunks: 3,
            leftover_len: 12,
            params: Params::default(),
        };
        let mut buf = Vec::new();
        write_to(&body, &mut buf).unwrap();
        let back = read_from(&buf[..]).unwrap();
        assert_eq!(back.len(), body.len());
        assert_eq!(back.dtype, body.dtype);
    }
}

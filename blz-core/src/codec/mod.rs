use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecId {
    Store = 0,
    Zstd = 1,
    Lz4 = 2,
}

impl CodecId {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(CodecId::Store),
            1 => Ok(CodecId::Zstd),
            2 => Ok(CodecId::Lz4),
            other => Err(crate::error::BlzError::Corrupted(format!(
                "unknown codec id {other}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CodecId::Store => "store",
            CodecId::Zstd => "zstd",
            CodecId::Lz4 => "lz4",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "store" => Ok(CodecId::Store),
            "zstd" => Ok(CodecId::Zstd),
            "lz4" => Ok(CodecId::Lz4),
            other => Err(crate::error::BlzError::Value(format!(
                "unknown compressor name '{other}'"
            ))),
        }
    }
}

pub trait Compressor: Send + Sync {
    fn id(&self) -> CodecId;
    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, level: i32) -> Result<u64>;
    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<u64>;
}

pub mod lz4c;
pub mod shuffle;
pub mod store;
pub mod zstdc;

pub fn get_compressor(id: CodecId) -> &'static dyn Compressor {
    match id {
        CodecId::Store => &store::Store,
        CodecId::Zstd => &zstdc::ZstdCompressor,
        CodecId::Lz4 => &lz4c::Lz4Compressor,
    }
}

pub fn get_decoder_u8(codec: u8) -> Result<&'static dyn Compressor> {
    Ok(get_compressor(CodecId::from_u8(codec)?))
}

/// Names accepted by `Params::new`'s `cname` field, in canonical order.
pub fn compressor_names() -> &'static [&'static str] {
    &["store", "zstd", "lz4"]
}

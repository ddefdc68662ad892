//! The atom type system: a small closed set of fixed-width primitive kinds,
//! plus the scalar values that carry them. A single `BArray` is always
//! homogeneous over one `DType` — compound records are realized one layer up
//! by `BTable`.

use crate::error::{BlzError, Result};
use half::f16;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
    Bool,
    Complex64,  // two f32 lanes
    Complex128, // two f64 lanes
}

impl DType {
    pub fn itemsize(self) -> usize {
        match self {
            DType::I8 | DType::U8 | DType::Bool => 1,
            DType::I16 | DType::U16 | DType::F16 => 2,
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 | DType::Complex64 => 8,
            DType::Complex128 => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::F16 => "float16",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::Bool => "bool",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "int8" => DType::I8,
            "int16" => DType::I16,
            "int32" => DType::I32,
            "int64" => DType::I64,
            "uint8" => DType::U8,
            "uint16" => DType::U16,
            "uint32" => DType::U32,
            "uint64" => DType::U64,
            "float16" => DType::F16,
            "float32" => DType::F32,
            "float64" => DType::F64,
            "bool" => DType::Bool,
            "complex64" => DType::Complex64,
            "complex128" => DType::Complex128,
            other => return Err(BlzError::Dtype(format!("unknown dtype: {other}"))),
        })
    }

    /// The all-zero scalar for this dtype, used as the implicit default when
    /// the caller doesn't supply one.
    pub fn zero_scalar(self) -> Scalar {
        match self {
            DType::I8 => Scalar::I8(0),
            DType::I16 => Scalar::I16(0),
            DType::I32 => Scalar::I32(0),
            DType::I64 => Scalar::I64(0),
            DType::U8 => Scalar::U8(0),
            DType::U16 => Scalar::U16(0),
            DType::U32 => Scalar::U32(0),
            DType::U64 => Scalar::U64(0),
            DType::F16 => Scalar::F16(f16::from_f32(0.0)),
            DType::F32 => Scalar::F32(0.0),
            DType::F64 => Scalar::F64(0.0),
            DType::Bool => Scalar::Bool(false),
            DType::Complex64 => Scalar::Complex64(0.0, 0.0),
            DType::Complex128 => Scalar::Complex128(0.0, 0.0),
        }
    }
}

/// A single fixed-width value. Byte encoding is always little-endian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F16(f16),
    F32(f32),
    F64(f64),
    Bool(bool),
    Complex64(f32, f32),
    Complex128(f64, f64),
}

impl Scalar {
    pub fn dtype(self) -> DType {
        match self {
            Scalar::I8(_) => DType::I8,
            Scalar::I16(_) => DType::I16,
            Scalar::I32(_) => DType::I32,
            Scalar::I64(_) => DType::I64,
            Scalar::U8(_) => DType::U8,
            Scalar::U16(_) => DType::U16,
            Scalar::U32(_) => DType::U32,
            Scalar::U64(_) => DType::U64,
            Scalar::F16(_) => DType::F16,
            Scalar::F32(_) => DType::F32,
            Scalar::F64(_) => DType::F64,
            Scalar::Bool(_) => DType::Bool,
            Scalar::Complex64(..) => DType::Complex64,
            Scalar::Complex128(..) => DType::Complex128,
        }
    }

    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Scalar::I8(v) => vec![v as u8],
            Scalar::I16(v) => v.to_le_bytes().to_vec(),
            Scalar::I32(v) => v.to_le_bytes().to_vec(),
            Scalar::I64(v) => v.to_le_bytes().to_vec(),
            Scalar::U8(v) => vec![v],
            Scalar::U16(v) => v.to_le_bytes().to_vec(),
            Scalar::U32(v) => v.to_le_bytes().to_vec(),
            Scalar::U64(v) => v.to_le_bytes().to_vec(),
            Scalar::F16(v) => v.to_le_bytes().to_vec(),
            Scalar::F32(v) => v.to_le_bytes().to_vec(),
            Scalar::F64(v) => v.to_le_bytes().to_vec(),
            Scalar::Bool(v) => vec![v as u8],
            Scalar::Complex64(re, im) => {
                let mut out = Vec::with_capacity(8);
                out.extend_from_slice(&re.to_le_bytes());
                out.extend_from_slice(&im.to_le_bytes());
                out
            }
            Scalar::Complex128(re, im) => {
                let mut out = Vec::with_capacity(16);
                out.extend_from_slice(&re.to_le_bytes());
                out.extend_from_slice(&im.to_le_bytes());
                out
            }
        }
    }

    pub fn from_bytes(dtype: DType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != dtype.itemsize() {
            return Err(BlzError::Corrupted(format!(
                "scalar byte length mismatch: expected {}, got {}",
                dtype.itemsize(),
                bytes.len()
            )));
        }
        Ok(match dtype {
            DType::I8 => Scalar::I8(bytes[0] as i8),
            DType::I16 => Scalar::I16(i16::from_le_bytes(bytes.try_into().unwrap())),
            DType::I32 => Scalar::I32(i32::from_le_bytes(bytes.try_into().unwrap())),
            DType::I64 => Scalar::I64(i64::from_le_bytes(bytes.try_into().unwrap())),
            DType::U8 => Scalar::U8(bytes[0]),
            DType::U16 => Scalar::U16(u16::from_le_bytes(bytes.try_into().unwrap())),
            DType::U32 => Scalar::U32(u32::from_le_bytes(bytes.try_into().unwrap())),
            DType::U64 => Scalar::U64(u64::from_le_bytes(bytes.try_into().unwrap())),
            DType::F16 => Scalar::F16(f16::from_le_bytes(bytes.try_into().unwrap())),
            DType::F32 => Scalar::F32(f32::from_le_bytes(bytes.try_into().unwrap())),
            DType::F64 => Scalar::F64(f64::from_le_bytes(bytes.try_into().unwrap())),
            DType::Bool => Scalar::Bool(bytes[0] != 0),
            DType::Complex64 => Scalar::Complex64(
                f32::from_le_bytes(bytes[0..4].try_into().unwrap()),
                f32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            ),
            DType::Complex128 => Scalar::Complex128(
                f64::from_le_bytes(bytes[0..8].try_into().unwrap()),
                f64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            ),
        })
    }

    /// Widen to `f64` for arithmetic in the evaluator and for generic sums.
    /// Lossy for `u64`/`i64`/`Complex*` magnitudes beyond 2^53, acceptable for
    /// a correctness-reference interpreter.
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::I8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::U8(v) => v as f64,
            Scalar::U16(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F16(v) => v.to_f64(),
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
            Scalar::Bool(v) => v as u8 as f64,
            Scalar::Complex64(re, _) => re as f64,
            Scalar::Complex128(re, _) => re,
        }
    }

    pub fn from_f64(dtype: DType, v: f64) -> Scalar {
        match dtype {
            DType::I8 => Scalar::I8(v as i8),
            DType::I16 => Scalar::I16(v as i16),
            DType::I32 => Scalar::I32(v as i32),
            DType::I64 => Scalar::I64(v as i64),
            DType::U8 => Scalar::U8(v as u8),
            DType::U16 => Scalar::U16(v as u16),
            DType::U32 => Scalar::U32(v as u32),
            DType::U64 => Scalar::U64(v as u64),
            DType::F16 => Scalar::F16(f16::from_f64(v)),
            DType::F32 => Scalar::F32(v as f32),
            DType::F64 => Scalar::F64(v),
            DType::Bool => Scalar::Bool(v != 0.0),
            DType::Complex64 => Scalar::Complex64(v as f32, 0.0),
            DType::Complex128 => Scalar::Complex128(v, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_bytes() {
        for (dt, s) in [
            (DType::I32, Scalar::I32(-7)),
            (DType::U64, Scalar::U64(9_000_000_000)),
            (DType::F64, Scalar::F64(3.25)),
            (DType::Bool, Scalar::Bool(true)),
            (DType::Complex128, Scalar::Complex128(1.5, -2.5)),
        ] {
            let bytes = s.to_bytes();
            assert_eq!(bytes.len(), dt.itemsize());
            let back = Scalar::from_bytes(dt, &bytes).unwrap();
            assert_eq!(back, s);
        }
    }

    #[test]
    fn name_roundtrip() {
        for dt in [DType::I8, DType::F32, DType::Complex64, DType::Bool] {
            assert_eq!(DType::from_name(dt.name()).unwrap(), dt);
        }
    }
}

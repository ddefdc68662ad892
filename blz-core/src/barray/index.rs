//! Indexing, slicing, and element assignment.

use super::BArray;
use crate::chunk::Chunk;
use crate::dtype::Scalar;
use crate::error::{BlzError, Result};

impl BArray {
    fn normalize_index(&self, idx: isize) -> Result<usize> {
        let len = self.len() as isize;
        let resolved = if idx < 0 { idx + len } else { idx };
        if resolved < 0 || resolved >= len {
            return Err(BlzError::Index(format!(
                "index {idx} out of range for array of length {len}"
            )));
        }
        Ok(resolved as usize)
    }

    /// Reads a single element, accepting Python-style negative indices.
    pub fn get(&self, idx: isize) -> Result<Scalar> {
        let idx = self.normalize_index(idx)?;
        let bytes = self.get_atom_bytes(idx)?;
        Scalar::from_bytes(self.dtype, &bytes)
    }

    fn get_atom_bytes(&self, idx: usize) -> Result<Vec<u8>> {
        let chunklen = self.chunklen();
        let chunked_len = self.store().len() * chunklen;
        if idx < chunked_len {
            let chunk = self.store().get(idx / chunklen)?;
            chunk.get_one(idx % chunklen)
        } else {
            let within = idx - chunked_len;
            let ts = self.dtype.itemsize();
            Ok(self.leftover()[within * ts..(within + 1) * ts].to_vec())
        }
    }

    /// Reads a contiguous, positive-step range of elements as raw
    /// little-endian bytes. `step` other than 1 thins the result after
    /// reading the dense range; a negative `step` is not supported.
    pub fn get_range_bytes(&self, start: usize, stop: usize, step: usize) -> Result<Vec<u8>> {
        if step == 0 {
            return Err(BlzError::Value("slice step cannot be zero".into()));
        }
        let len = self.len();
        if start > stop || stop > len {
            return Err(BlzError::Index(format!(
                "slice {start}..{stop} out of bounds for array of length {len}"
            )));
        }
        let ts = self.dtype.itemsize();
        let chunklen = self.chunklen();
        let chunked_len = self.store().len() * chunklen;

        let mut dense = Vec::with_capacity((stop - start) * ts);
        let mut pos = start;
        while pos < stop {
            if pos < chunked_len {
                let chunk_idx = pos / chunklen;
                let within_start = pos % chunklen;
                let chunk_end = ((chunk_idx + 1) * chunklen).min(stop).min(chunked_len);
                let within_end = chunk_end - chunk_idx * chunklen;
                let chunk = self.store().get(chunk_idx)?;
                dense.extend_from_slice(&chunk.get_range(within_start, within_end)?);
                pos = chunk_end;
            } else {
                let from = pos - chunked_len;
                let to = stop - chunked_len;
                dense.extend_from_slice(&self.leftover()[from * ts..to * ts]);
                pos = stop;
            }
        }

        if step == 1 {
            return Ok(dense);
        }
        let mut thinned = Vec::with_capacity(dense.len() / step + 1);
        let mut i = 0;
        while i * ts < dense.len() {
            thinned.extend_from_slice(&dense[i * ts..(i + 1) * ts]);
            i += step;
        }
        Ok(thinned)
    }

    pub fn get_range(&self, start: usize, stop: usize, step: isize) -> Result<Vec<Scalar>> {
        if step <= 0 {
            return Err(BlzError::Unimplemented(
                "slicing with a zero or negative step is not supported".to_string(),
            ));
        }
        let bytes = self.get_range_bytes(start, stop, step as usize)?;
        let ts = self.dtype.itemsize();
        Ok(bytes
            .chunks_exact(ts)
            .map(|b| Scalar::from_bytes(self.dtype, b).expect("itemsize-aligned chunk"))
            .collect())
    }

    /// Overwrites the element at `idx`. Forces a decompress/recompress of
    /// the owning chunk if `idx` falls inside the already-chunked region.
    pub fn set(&mut self, idx: isize, value: Scalar) -> Result<()> {
        self.check_writable()?;
        if value.dtype() != self.dtype {
            return Err(BlzError::Dtype(format!(
                "cannot assign {:?} value into {:?} array",
                value.dtype(),
                self.dtype
            )));
        }
        let idx = self.normalize_index(idx)?;
        let chunklen = self.chunklen();
        let chunked_len = self.store().len() * chunklen;
        let atom = value.to_bytes();

        if idx < chunked_len {
            let chunk_idx = idx / chunklen;
            let within = idx % chunklen;
            let chunk = self.store().get(chunk_idx)?;
            let mut raw = Vec::new();
            chunk.decompress_into(&mut raw)?;
            let ts = self.dtype.itemsize();
            raw[within * ts..(within + 1) * ts].copy_from_slice(&atom);
            let rebuilt = Chunk::build(self.dtype, &raw, &self.params)?;
            self.replace_chunk(chunk_idx, rebuilt)
        } else {
            let within = idx - chunked_len;
            let ts = self.dtype.itemsize();
            self.leftover_mut()[within * ts..(within + 1) * ts].copy_from_slice(&atom);
            Ok(())
        }
    }

    /// Overwrites the elements at `indices` (Python-style negative indices
    /// accepted) with `values`, one-to-one. Writes are grouped by owning
    /// chunk so each touched chunk is decompressed and re-encoded exactly
    /// once, regardless of how many of its atoms are overwritten.
    pub fn set_many(&mut self, indices: &[isize], values: &[Scalar]) -> Result<()> {
        self.check_writable()?;
        if indices.len() != values.len() {
            return Err(BlzError::Value(format!(
                "expected {} values for {} indices, got {}",
                indices.len(),
                indices.len(),
                values.len()
            )));
        }
        for v in values {
            if v.dtype() != self.dtype {
                return Err(BlzError::Dtype(format!(
                    "cannot assign {:?} value into {:?} array",
                    v.dtype(),
                    self.dtype
                )));
            }
        }

        let chunklen = self.chunklen();
        let chunked_len = self.store().len() * chunklen;
        let ts = self.dtype.itemsize();

        let mut by_chunk: std::collections::BTreeMap<usize, Vec<(usize, Scalar)>> =
            std::collections::BTreeMap::new();
        let mut leftover_writes: Vec<(usize, Scalar)> = Vec::new();

        for (&idx, &value) in indices.iter().zip(values.iter()) {
            let idx = self.normalize_index(idx)?;
            if idx < chunked_len {
                let chunk_idx = idx / chunklen;
                let within = idx % chunklen;
                by_chunk.entry(chunk_idx).or_default().push((within, value));
            } else {
                leftover_writes.push((idx - chunked_len, value));
            }
        }

        for (chunk_idx, writes) in by_chunk {
            let chunk = self.store().get(chunk_idx)?;
            let mut raw = Vec::new();
            chunk.decompress_into(&mut raw)?;
            for (within, value) in writes {
                raw[within * ts..(within + 1) * ts].copy_from_slice(&value.to_bytes());
            }
            let rebuilt = Chunk::build(self.dtype, &raw, &self.params)?;
            self.replace_chunk(chunk_idx, rebuilt)?;
        }

        for (within, value) in leftover_writes {
            self.leftover_mut()[within * ts..(within + 1) * ts]
                .copy_from_slice(&value.to_bytes());
        }

        Ok(())
    }

    /// Overwrites a positive-step range with either a single broadcast
    /// scalar or a buffer supplying one value per selected position.
    /// Negative step is not supported.
    pub fn set_slice(
        &mut self,
        start: usize,
        stop: usize,
        step: isize,
        values: SliceValues<'_>,
    ) -> Result<()> {
        self.check_writable()?;
        if step <= 0 {
            return Err(BlzError::Unimplemented(
                "slice assignment with a zero or negative step is not supported".to_string(),
            ));
        }
        let len = self.len();
        if start > stop || stop > len {
            return Err(BlzError::Index(format!(
                "slice {start}..{stop} out of bounds for array of length {len}"
            )));
        }
        let step = step as usize;
        let indices: Vec<isize> = (start..stop).step_by(step).map(|i| i as isize).collect();
        let atoms = values.resolve(indices.len())?;
        self.set_many(&indices, &atoms)
    }
}

/// Right-hand side of a `set_slice` call: either one scalar broadcast across
/// every selected position, or a buffer supplying one value per position.
pub enum SliceValues<'a> {
    Scalar(Scalar),
    Buffer(&'a [Scalar]),
}

impl<'a> SliceValues<'a> {
    fn resolve(&self, count: usize) -> Result<Vec<Scalar>> {
        match self {
            SliceValues::Scalar(v) => Ok(vec![*v; count]),
            SliceValues::Buffer(buf) => {
                if buf.len() != count {
                    return Err(BlzError::Value(format!(
                        "expected {count} values for slice assignment, got {}",
                        buf.len()
                    )));
                }
                Ok(buf.to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::params::Params;

    fn test_array() -> BArray {
        let mut a = BArray::new_in_memory(DType::I32, Params::default());
        a.set_chunklen(4).unwrap();
        for i in 0..10i32 {
            a.append_one(Scalar::I32(i)).unwrap();
        }
        a
    }

    #[test]
    fn negative_index() {
        let a = test_array();
        assert_eq!(a.get(-1).unwrap(), Scalar::I32(9));
        assert_eq!(a.get(-10).unwrap(), Scalar::I32(0));
        assert!(a.get(-11).is_err());
    }

    #[test]
    fn range_spans_chunks_and_leftover() {
        let a = test_array();
        let got = a.get_range(2, 9, 1).unwrap();
        let expect: Vec<Scalar> = (2..9).map(Scalar::I32).collect();
        assert_eq!(got, expect);
    }

    #[test]
    fn range_with_step() {
        let a = test_array();
        let got = a.get_range(0, 10, 3).unwrap();
        assert_eq!(got, vec![Scalar::I32(0), Scalar::I32(3), Scalar::I32(6), Scalar::I32(9)]);
    }

    #[test]
    fn negative_step_unimplemented() {
        let a = test_array();
        assert!(matches!(
            a.get_range(0, 10, -1),
            Err(BlzError::Unimplemented(_))
        ));
    }

    #[test]
    fn set_in_chunked_region_and_leftover() {
        let mut a = test_array();
        a.set(0, Scalar::I32(100)).unwrap();
        a.set(9, Scalar::I32(900)).unwrap();
        assert_eq!(a.get(0).unwrap(), Scalar::I32(100));
        assert_eq!(a.get(9).unwrap(), Scalar::I32(900));
    }

    #[test]
    fn set_slice_broadcast_spans_chunks_and_leftover() {
        let mut a = test_array();
        a.set_slice(2, 9, 1, SliceValues::Scalar(Scalar::I32(-1)))
            .unwrap();
        let got = a.get_range(0, 10, 1).unwrap();
        assert_eq!(
            got,
            vec![0, 1, -1, -1, -1, -1, -1, -1, -1, 9]
                .into_iter()
                .map(Scalar::I32)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn set_slice_buffer_with_step() {
        let mut a = test_array();
        let buf = [Scalar::I32(90), Scalar::I32(91), Scalar::I32(92)];
        a.set_slice(0, 6, 3, SliceValues::Buffer(&buf[..2])).unwrap();
        assert_eq!(a.get(0).unwrap(), Scalar::I32(90));
        assert_eq!(a.get(3).unwrap(), Scalar::I32(91));
        assert_eq!(a.get(1).unwrap(), Scalar::I32(1));
    }

    #[test]
    fn set_slice_buffer_length_mismatch_is_rejected() {
        let mut a = test_array();
        let buf = [Scalar::I32(1), Scalar::I32(2)];
        assert!(a.set_slice(0, 5, 1, SliceValues::Buffer(&buf)).is_err());
    }

    #[test]
    fn set_slice_negative_step_unimplemented() {
        let mut a = test_array();
        assert!(matches!(
            a.set_slice(0, 10, -1, SliceValues::Scalar(Scalar::I32(0))),
            Err(BlzError::Unimplemented(_))
        ));
    }

    #[test]
    fn set_many_fancy_indices_grouped_across_chunks() {
        let mut a = test_array();
        a.set_many(
            &[9, 0, -3, 5],
            &[Scalar::I32(900), Scalar::I32(100), Scalar::I32(700), Scalar::I32(500)],
        )
        .unwrap();
        assert_eq!(a.get(0).unwrap(), Scalar::I32(100));
        assert_eq!(a.get(5).unwrap(), Scalar::I32(500));
        assert_eq!(a.get(7).unwrap(), Scalar::I32(700));
        assert_eq!(a.get(9).unwrap(), Scalar::I32(900));
        let untouched: Vec<Scalar> = [1, 2, 3, 4, 6, 8].into_iter().map(Scalar::I32).collect();
        let got: Vec<Scalar> = [1isize, 2, 3, 4, 6, 8]
            .into_iter()
            .map(|i| a.get(i).unwrap())
            .collect();
        assert_eq!(got, untouched);
    }

    #[test]
    fn set_many_readonly_rejects_mutation() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("roarray_index");
        let mut a = test_array();
        a.save_as(&root, crate::barray::OpenMode::Write).unwrap();
        let mut opened = BArray::open(&root, crate::barray::OpenMode::Read).unwrap();
        assert!(matches!(
            opened.set_many(&[0], &[Scalar::I32(1)]),
            Err(BlzError::ReadOnly(_))
        ));
    }
}

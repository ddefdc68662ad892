//! Reductions. `sum` is computed chunk-at-a-time in parallel via rayon so a
//! reduction never needs the whole decompressed array resident at once.

use super::BArray;
use crate::dtype::{DType, Scalar};
use crate::error::Result;
use rayon::prelude::*;

impl BArray {
    /// Sums every atom, accumulating into a scalar of this array's own
    /// dtype. See [`sum_as`](Self::sum_as) to accumulate into a wider type.
    pub fn sum(&self) -> Result<Scalar> {
        self.sum_as(None)
    }

    /// Sums every atom, accumulating into `dtype` (or this array's own
    /// dtype, if `None`) — useful to avoid overflow when summing a narrow
    /// integer array into a wider one. Constant chunks contribute
    /// `nitems * value` directly, without decompressing their payload.
    pub fn sum_as(&self, dtype: Option<DType>) -> Result<Scalar> {
        let out_dtype = dtype.unwrap_or_else(|| self.dtype());
        let nchunks = self.store().len();
        let chunk_sums: Result<Vec<f64>> = crate::pool::install(|| {
            (0..nchunks)
                .into_par_iter()
                .map(|idx| -> Result<f64> {
                    let chunk = self.store().get(idx)?;
                    if let Some(atom) = chunk.constant_atom() {
                        let value = Scalar::from_bytes(self.dtype(), atom)?.as_f64();
                        return Ok(value * chunk.nitems() as f64);
                    }
                    let mut raw = Vec::new();
                    chunk.decompress_into(&mut raw)?;
                    Ok(sum_bytes(self.dtype(), &raw))
                })
                .collect()
        });

        let mut total: f64 = chunk_sums?.into_iter().sum();
        total += sum_bytes(self.dtype(), self.leftover());
        Ok(Scalar::from_f64(out_dtype, total))
    }
}

fn sum_bytes(dtype: DType, bytes: &[u8]) -> f64 {
    let ts = dtype.itemsize();
    bytes
        .chunks_exact(ts)
        .map(|b| Scalar::from_bytes(dtype, b).expect("itemsize-aligned chunk").as_f64())
        .sum()
}

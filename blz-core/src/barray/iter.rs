//! Iteration: the owning-borrow scalar iterator plus boolean-mask selection
//! (`where_`/`wheretrue`), decoding one chunk at a time rather than the
//! whole array at once.

use super::BArray;
use crate::dtype::Scalar;
use crate::error::{BlzError, Result};

/// A lazy, finite, non-restartable sequence of atoms produced by
/// [`BArray::iter_range`]. Decodes one atom at a time rather than
/// materializing the whole selected range up front.
pub struct Iter<'a> {
    array: &'a BArray,
    cur: usize,
    stop: usize,
    step: usize,
    remaining: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Scalar;

    fn next(&mut self) -> Option<Scalar> {
        if let Some(0) = self.remaining {
            return None;
        }
        if self.cur >= self.stop {
            return None;
        }
        let value = self.array.get(self.cur as isize).ok()?;
        self.cur += self.step;
        if let Some(r) = &mut self.remaining {
            *r -= 1;
        }
        Some(value)
    }
}

impl BArray {
    /// Iterates atoms in `[start, stop)` at `step`, resolving negative
    /// `start`/`stop` the same way indexing does (`v < 0 → v + len`, then
    /// clamped to `[0, len]`), discarding the first `skip` emitted atoms and
    /// capping the total at `limit`. Negative or zero `step` is not
    /// supported.
    pub fn iter_range(
        &self,
        start: isize,
        stop: isize,
        step: isize,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Iter<'_>> {
        if step <= 0 {
            return Err(BlzError::Unimplemented(
                "iteration with a zero or negative step is not supported".to_string(),
            ));
        }
        let len = self.len() as isize;
        let resolve = |v: isize| -> usize {
            let v = if v < 0 { v + len } else { v };
            v.clamp(0, len) as usize
        };
        let start = resolve(start);
        let stop = resolve(stop).max(start);
        let step = step as usize;
        let cur = start.saturating_add(skip.saturating_mul(step)).min(stop);
        Ok(Iter {
            array: self,
            cur,
            stop,
            step,
            remaining: limit,
        })
    }

    /// Iterates elements `skip..skip+limit` (or to the end, if `limit` is
    /// `None`), a convenience wrapper over [`iter_range`](Self::iter_range)
    /// for the common start=0/stop=len/step=1 case.
    pub fn iter_skip_limit(&self, skip: usize, limit: Option<usize>) -> Iter<'_> {
        self.iter_range(0, self.len() as isize, 1, skip, limit)
            .expect("default start/stop/step are always valid")
    }

    /// Iterates every element in order.
    pub fn iter(&self) -> Iter<'_> {
        self.iter_range(0, self.len() as isize, 1, 0, None)
            .expect("default start/stop/step are always valid")
    }

    /// Element indices where `mask` holds a truthy (non-zero) value. Both
    /// arrays must have the same length. `skip` discards the first `skip`
    /// matches; `limit` caps the total returned.
    pub fn wheretrue(
        &self,
        mask: &BArray,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<usize>> {
        if mask.len() != self.len() {
            return Err(BlzError::Value(format!(
                "mask length {} does not match array length {}",
                mask.len(),
                self.len()
            )));
        }
        let mut out = Vec::new();
        let mut matched = 0usize;
        for (idx, v) in mask.iter().enumerate() {
            if v.as_f64() == 0.0 {
                continue;
            }
            if matched < skip {
                matched += 1;
                continue;
            }
            if let Some(l) = limit {
                if out.len() >= l {
                    break;
                }
            }
            out.push(idx);
            matched += 1;
        }
        Ok(out)
    }

    /// Elements of `self` selected by a boolean mask of matching length,
    /// with the same `skip`/`limit` semantics as [`wheretrue`](Self::wheretrue).
    pub fn where_(
        &self,
        mask: &BArray,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Scalar>> {
        let idxs = self.wheretrue(mask, skip, limit)?;
        idxs.into_iter().map(|i| self.get(i as isize)).collect()
    }

    /// Fancy selection: elements at arbitrary, unordered positions.
    pub fn take(&self, indices: &[usize]) -> Result<Vec<Scalar>> {
        indices.iter().map(|&i| self.get(i as isize)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::params::Params;

    #[test]
    fn skip_limit() {
        let a = BArray::arange(DType::I32, 0.0, 10.0, 1.0, Params::default()).unwrap();
        let got: Vec<Scalar> = a.iter_skip_limit(2, Some(3)).collect();
        assert_eq!(got, vec![Scalar::I32(2), Scalar::I32(3), Scalar::I32(4)]);
    }

    #[test]
    fn iter_range_negative_bounds_and_step() {
        let a = BArray::arange(DType::I32, 0.0, 10.0, 1.0, Params::default()).unwrap();
        let got: Vec<Scalar> = a.iter_range(-8, -2, 2, 0, None).unwrap().collect();
        assert_eq!(got, vec![Scalar::I32(2), Scalar::I32(4), Scalar::I32(6)]);
    }

    #[test]
    fn iter_range_skip_and_limit_apply_after_striding() {
        let a = BArray::arange(DType::I32, 0.0, 20.0, 1.0, Params::default()).unwrap();
        let got: Vec<Scalar> = a.iter_range(0, 20, 2, 2, Some(3)).unwrap().collect();
        assert_eq!(got, vec![Scalar::I32(4), Scalar::I32(6), Scalar::I32(8)]);
    }

    #[test]
    fn iter_range_negative_step_unimplemented() {
        let a = BArray::arange(DType::I32, 0.0, 10.0, 1.0, Params::default()).unwrap();
        assert!(matches!(
            a.iter_range(0, 10, -1, 0, None),
            Err(BlzError::Unimplemented(_))
        ));
    }

    #[test]
    fn wheretrue_and_where() {
        let a = BArray::arange(DType::I32, 0.0, 6.0, 1.0, Params::default()).unwrap();
        let mask = BArray::from_iter(
            DType::Bool,
            [false, true, false, true, true, false].map(Scalar::Bool),
            Params::default(),
        )
        .unwrap();
        assert_eq!(a.wheretrue(&mask, 0, None).unwrap(), vec![1, 3, 4]);
        assert_eq!(
            a.where_(&mask, 0, None).unwrap(),
            vec![Scalar::I32(1), Scalar::I32(3), Scalar::I32(4)]
        );
    }

    #[test]
    fn wheretrue_and_where_respect_skip_and_limit() {
        let values = BArray::arange(DType::I32, 1.0, 11.0, 1.0, Params::default()).unwrap();
        let mask_vals: Vec<Scalar> = (1..11).map(|v| Scalar::Bool(v > 5)).collect();
        let mask = BArray::from_iter(DType::Bool, mask_vals, Params::default()).unwrap();

        assert_eq!(values.wheretrue(&mask, 1, Some(2)).unwrap(), vec![6, 7]);
        assert_eq!(
            values.where_(&mask, 1, Some(2)).unwrap(),
            vec![Scalar::I32(7), Scalar::I32(8)]
        );
    }

    #[test]
    fn take_fancy_indices() {
        let a = BArray::arange(DType::I32, 0.0, 10.0, 1.0, Params::default()).unwrap();
        let got = a.take(&[9, 0, 5]).unwrap();
        assert_eq!(got, vec![Scalar::I32(9), Scalar::I32(0), Scalar::I32(5)]);
    }
}

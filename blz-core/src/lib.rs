#![forbid(unsafe_code)]

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod barray;
pub mod btable;
pub mod chunk;
pub mod codec;
pub mod container;
pub mod dtype;
pub mod error;
pub mod eval;
pub mod params;
pub mod pool;
pub mod store;

pub use barray::index::SliceValues;
pub use barray::{BArray, OpenMode};
pub use btable::BTable;
pub use dtype::{DType, Scalar};
pub use error::{BlzError, Result};
pub use params::Params;
pub use pool::{nthreads, set_nthreads};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Creates an array filled with zeros.
pub fn zeros(dtype: DType, len: usize, params: Params) -> Result<BArray> {
    BArray::zeros(dtype, len, params)
}

/// Creates an array filled with ones.
pub fn ones(dtype: DType, len: usize, params: Params) -> Result<BArray> {
    BArray::ones(dtype, len, params)
}

/// Creates an array filled with a repeated scalar.
pub fn fill(dtype: DType, len: usize, value: Scalar, params: Params) -> Result<BArray> {
    BArray::fill(dtype, len, value, params)
}

/// Creates an array from an arithmetic progression, `numpy.arange`-style.
pub fn arange(dtype: DType, start: f64, stop: f64, step: f64, params: Params) -> Result<BArray> {
    BArray::arange(dtype, start, stop, step, params)
}

/// Builds an array by draining an iterator of scalars. Pass `count` when
/// known to pre-size chunk layout; `None` grows the array dynamically.
pub fn fromiter<I: IntoIterator<Item = Scalar>>(
    dtype: DType,
    values: I,
    params: Params,
) -> Result<BArray> {
    BArray::from_iter(dtype, values, params)
}

/// Opens a persisted `BArray` (a directory holding `meta`/`data`/`leftover`).
pub fn open(rootdir: impl AsRef<Path>, mode: OpenMode) -> Result<BArray> {
    BArray::open(rootdir, mode)
}

/// Opens a persisted `BTable` (a directory holding `__names__` plus one
/// subdirectory per column).
pub fn open_table(rootdir: impl AsRef<Path>, mode: OpenMode) -> Result<BTable> {
    BTable::open(rootdir, mode)
}

/// Evaluates a string expression over a table's columns.
pub fn eval(table: &BTable, sexpr: &str, params: Params) -> Result<BArray> {
    eval::eval_table(table, sexpr, params)
}

/// Yields successive blocks of at most `blen` elements from `array`.
pub fn iterblocks(array: &BArray, blen: usize) -> Vec<Vec<Scalar>> {
    eval::iterblocks(array, blen)
}

/// Row indices of `table` where `sexpr` holds truthy, scanned block-at-a-time.
pub fn whereblocks(table: &BTable, sexpr: &str) -> Result<Vec<usize>> {
    eval::whereblocks(table, sexpr)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Array,
    Table,
}

/// One persisted `BArray`/`BTable` directory found under a `walk` root.
#[derive(Clone, Debug)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Recursively discovers persisted `BArray`/`BTable` directories under
/// `rootdir`, identifying each by the presence of a `meta` file (array) or
/// a `__names__` file (table).
pub fn walk(rootdir: impl AsRef<Path>) -> Result<Vec<WalkEntry>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(rootdir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        if dir.join("__names__").is_file() {
            found.push(WalkEntry {
                path: dir.to_path_buf(),
                kind: EntryKind::Table,
            });
        } else if dir.join("meta").is_file() {
            found.push(WalkEntry {
                path: dir.to_path_buf(),
                kind: EntryKind::Array,
            });
        }
    }
    Ok(found)
}

/// Process-wide tunables that aren't per-array codec params: worker thread
/// count and the default evaluation block length.
#[derive(Clone, Debug)]
pub struct BlzConfig {
    pub nthreads: usize,
    pub eval_block_len: usize,
}

impl Default for BlzConfig {
    fn default() -> Self {
        BlzConfig {
            nthreads: pool::nthreads(),
            eval_block_len: eval::DEFAULT_BLOCK_LEN,
        }
    }
}

impl BlzConfig {
    pub fn apply(&self) {
        pool::set_nthreads(self.nthreads);
    }
}

pub mod prelude {
    pub use crate::barray::index::SliceValues;
    pub use crate::barray::{BArray, OpenMode};
    pub use crate::btable::BTable;
    pub use crate::dtype::{DType, Scalar};
    pub use crate::error::{BlzError, Result};
    pub use crate::params::Params;
    pub use crate::{arange, eval, fill, fromiter, ones, open, open_table, walk, zeros};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_finds_array_and_table() {
        let tmp = tempfile::tempdir().unwrap();
        let mut arr = BArray::zeros(DType::I32, 5, Params::default()).unwrap();
        arr.save_as(tmp.path().join("myarray"), OpenMode::Write)
            .unwrap();

        let cx = BArray::zeros(DType::F64, 3, Params::default()).unwrap();
        let mut table = BTable::new(vec!["x".into()], vec![cx]).unwrap();
        table
            .save_as(tmp.path().join("mytable"), OpenMode::Write)
            .unwrap();

        let found = walk(tmp.path()).unwrap();
        assert!(found.iter().any(|e| e.kind == EntryKind::Array));
        assert!(found.iter().any(|e| e.kind == EntryKind::Table));
    }
}

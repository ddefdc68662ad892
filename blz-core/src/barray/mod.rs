//! `BArray`: a chunked, compressed, homogeneous 1-D array. The only mutable
//! state kept uncompressed is the `leftover` tail that hasn't yet filled a
//! full chunk; everything before it lives as immutable compressed `Chunk`s
//! in a `ChunkStore`.

pub mod index;
pub mod iter;
pub mod reduce;

use crate::chunk::Chunk;
use crate::container::{attrs::Attrs, leftover, meta};
use crate::dtype::{DType, Scalar};
use crate::error::{BlzError, Result};
use crate::params::Params;
use crate::store::{ChunkStore, DiskChunkStore, MemChunkStore};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Target size, in bytes, of a single compressed chunk before compression.
/// Mirrors the reference library's cache-sized-block heuristic without
/// depending on the original L1/L2 constants, which describe a CPU cache
/// hierarchy this engine has no access to.
const TARGET_CHUNK_BYTES: usize = 1 << 20;

pub struct BArray {
    dtype: DType,
    params: Params,
    chunklen: usize,
    store: Box<dyn ChunkStore>,
    leftover: Vec<u8>,
    attrs: Attrs,
    readonly: bool,
    root: Option<PathBuf>,
}

fn default_chunklen(dtype: DType) -> usize {
    (TARGET_CHUNK_BYTES / dtype.itemsize()).max(1)
}

impl BArray {
    fn new_in_memory(dtype: DType, params: Params) -> Self {
        BArray {
            dtype,
            chunklen: default_chunklen(dtype),
            params,
            store: Box::new(MemChunkStore::new()),
            leftover: Vec::new(),
            attrs: Attrs::new(),
            readonly: false,
            root: None,
        }
    }

    /// An empty, growable in-memory array of the given dtype.
    pub fn empty(dtype: DType, params: Params) -> Self {
        Self::new_in_memory(dtype, params)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    pub fn len(&self) -> usize {
        self.store.len() * self.chunklen + self.leftover.len() / self.dtype.itemsize()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(BlzError::ReadOnly(
                "array was opened read-only".to_string(),
            ));
        }
        Ok(())
    }

    // ---- constructors -------------------------------------------------

    pub fn zeros(dtype: DType, len: usize, params: Params) -> Result<Self> {
        Self::fill(dtype, len, dtype.zero_scalar(), params)
    }

    pub fn ones(dtype: DType, len: usize, params: Params) -> Result<Self> {
        let one = Scalar::from_f64(dtype, 1.0);
        Self::fill(dtype, len, one, params)
    }

    pub fn fill(dtype: DType, len: usize, value: Scalar, params: Params) -> Result<Self> {
        if value.dtype() != dtype {
            return Err(BlzError::Dtype(format!(
                "fill value has dtype {:?}, array dtype is {:?}",
                value.dtype(),
                dtype
            )));
        }
        let mut arr = Self::new_in_memory(dtype, params);
        let atom = value.to_bytes();
        let mut buf = Vec::with_capacity(len * dtype.itemsize());
        for _ in 0..len {
            buf.extend_from_slice(&atom);
        }
        arr.extend_bytes(&buf)?;
        Ok(arr)
    }

    pub fn arange(dtype: DType, start: f64, stop: f64, step: f64, params: Params) -> Result<Self> {
        if step == 0.0 {
            return Err(BlzError::Value("arange step must be non-zero".into()));
        }
        let mut arr = Self::new_in_memory(dtype, params);
        let mut v = start;
        let mut buf = Vec::new();
        while (step > 0.0 && v < stop) || (step < 0.0 && v > stop) {
            buf.extend_from_slice(&Scalar::from_f64(dtype, v).to_bytes());
            v += step;
        }
        arr.extend_bytes(&buf)?;
        Ok(arr)
    }

    /// Builds a `BArray` from an iterator of scalars. `count` pre-sizes the
    /// chunk layout when known; `None` grows the array dynamically as the
    /// iterator is drained, matching the reference library's `count=-1`.
    pub fn from_iter<I: IntoIterator<Item = Scalar>>(
        dtype: DType,
        values: I,
        params: Params,
    ) -> Result<Self> {
        let mut arr = Self::new_in_memory(dtype, params);
        for v in values {
            arr.append_one(v)?;
        }
        Ok(arr)
    }

    // ---- mutation -------------------------------------------------------

    pub fn append_one(&mut self, value: Scalar) -> Result<()> {
        self.check_writable()?;
        if value.dtype() != self.dtype {
            return Err(BlzError::Dtype(format!(
                "cannot append {:?} value to {:?} array",
                value.dtype(),
                self.dtype
            )));
        }
        self.extend_bytes(&value.to_bytes())
    }

    pub fn append_many(&mut self, values: &[Scalar]) -> Result<()> {
        self.check_writable()?;
        let mut buf = Vec::with_capacity(values.len() * self.dtype.itemsize());
        for v in values {
            if v.dtype() != self.dtype {
                return Err(BlzError::Dtype(format!(
                    "cannot append {:?} value to {:?} array",
                    v.dtype(),
                    self.dtype
                )));
            }
            buf.extend_from_slice(&v.to_bytes());
        }
        self.extend_bytes(&buf)
    }

    fn extend_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.leftover.extend_from_slice(bytes);
        self.spill_full_chunks()
    }

    /// Moves as many whole chunks' worth of atoms as possible out of
    /// `leftover` and into the chunk store as immutable compressed chunks.
    fn spill_full_chunks(&mut self) -> Result<()> {
        let typesize = self.dtype.itemsize();
        let chunk_bytes = self.chunklen * typesize;
        while self.leftover.len() >= chunk_bytes {
            let tail = self.leftover.split_off(chunk_bytes);
            let full = std::mem::replace(&mut self.leftover, tail);
            let chunk = Chunk::build(self.dtype, &full, &self.params)?;
            self.store.push(chunk)?;
        }
        Ok(())
    }

    /// Removes the last `n` elements. A negative `n` grows the array by
    /// `-n` zero-filled elements instead of shrinking it, matching the
    /// reference library's `trim`.
    pub fn trim(&mut self, n: isize) -> Result<()> {
        self.check_writable()?;
        if n < 0 {
            let grow = (-n) as usize;
            let zero = self.dtype.zero_scalar();
            let atom = zero.to_bytes();
            let mut buf = Vec::with_capacity(grow * atom.len());
            for _ in 0..grow {
                buf.extend_from_slice(&atom);
            }
            return self.extend_bytes(&buf);
        }
        let n = n as usize;
        let cur = self.len();
        if n > cur {
            return Err(BlzError::Value(format!(
                "cannot trim {n} elements from an array of length {cur}"
            )));
        }
        self.resize(cur - n, self.dtype.zero_scalar())
    }

    /// Grows or shrinks the array to exactly `new_len`, zero/`fill`-filling
    /// any newly created elements.
    pub fn resize(&mut self, new_len: usize, fill_value: Scalar) -> Result<()> {
        self.check_writable()?;
        let cur = self.len();
        if new_len == cur {
            return Ok(());
        }
        if new_len > cur {
            let atom = fill_value.to_bytes();
            let mut buf = Vec::with_capacity((new_len - cur) * atom.len());
            for _ in 0..(new_len - cur) {
                buf.extend_from_slice(&atom);
            }
            return self.extend_bytes(&buf);
        }

        // Shrinking: figure out how many full chunks survive and rebuild the
        // leftover tail from what remains of the last partially-kept chunk.
        let typesize = self.dtype.itemsize();
        let full_chunks_kept = new_len / self.chunklen;
        let atoms_in_partial = new_len % self.chunklen;

        let mut new_leftover = Vec::new();
        if atoms_in_partial > 0 && full_chunks_kept < self.store.len() {
            let chunk = self.store.get(full_chunks_kept)?;
            new_leftover = chunk.get_range(0, atoms_in_partial)?;
        } else if full_chunks_kept >= self.store.len() {
            // new_len falls inside the current leftover tail.
            let keep_bytes = (new_len - self.store.len() * self.chunklen) * typesize;
            new_leftover = self.leftover[..keep_bytes].to_vec();
            self.leftover = new_leftover;
            return Ok(());
        }

        self.store.truncate(full_chunks_kept)?;
        self.leftover = new_leftover;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.check_writable()?;
        let Some(root) = self.root.clone() else {
            return Ok(());
        };
        leftover::write(&root.join("leftover"), &self.leftover)?;
        self.attrs.write(&root.join("__attrs__"))?;
        let body = meta::MetaBody {
            dtype: self.dtype,
            chunklen: self.chunklen,
            nchunks: self.store.len(),
            leftover_len: self.leftover.len() / self.dtype.itemsize(),
            params: self.params.clone(),
        };
        let mut buf = Vec::new();
        meta::write_to(&body, &mut buf)?;
        let meta_path = root.join("meta");
        let dir = root.clone();
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        use std::io::Write as _;
        tmp.write_all(&buf)?;
        tmp.flush()?;
        tmp.persist(&meta_path).map_err(|e| BlzError::Io(e.error))?;
        Ok(())
    }

    /// Produces an independent copy of this array. With `params = None` the
    /// existing compressed chunks are carried over unchanged — cheap, no
    /// re-encoding, the path `save_as`/migration between memory and disk
    /// uses. With `params = Some(p)` every chunk is decompressed and
    /// re-encoded under `p`, fanned out across the thread pool — used to
    /// re-tune compression.
    pub fn copy(&self, params: Option<Params>) -> Result<BArray> {
        let Some(new_params) = params else {
            let mut out = BArray::new_in_memory(self.dtype, self.params.clone());
            for idx in 0..self.store.len() {
                out.store.push(self.store.get(idx)?)?;
            }
            out.chunklen = self.chunklen;
            out.leftover = self.leftover.clone();
            out.attrs = self.attrs.clone();
            return Ok(out);
        };

        let nchunks = self.store.len();
        let rebuilt: Result<Vec<Chunk>> = crate::pool::install(|| {
            (0..nchunks)
                .into_par_iter()
                .map(|idx| -> Result<Chunk> {
                    let chunk = self.store.get(idx)?;
                    let mut raw = Vec::new();
                    chunk.decompress_into(&mut raw)?;
                    Chunk::build(self.dtype, &raw, &new_params)
                })
                .collect()
        });

        let mut out = BArray::new_in_memory(self.dtype, new_params);
        out.chunklen = self.chunklen;
        for chunk in rebuilt? {
            out.store.push(chunk)?;
        }
        out.leftover = self.leftover.clone();
        out.attrs = self.attrs.clone();
        Ok(out)
    }

    // ---- persistence ----------------------------------------------------

    /// Persists this array to `rootdir`, creating it if necessary. Mode `w`
    /// overwrites an existing rootdir's contents; `a` requires one to exist
    /// already (and is otherwise identical to a flush).
    pub fn save_as(&mut self, rootdir: impl AsRef<Path>, mode: OpenMode) -> Result<()> {
        let rootdir = rootdir.as_ref();
        match mode {
            OpenMode::Write => {
                if rootdir.exists() {
                    std::fs::remove_dir_all(rootdir)?;
                }
                std::fs::create_dir_all(rootdir)?;
            }
            OpenMode::Append => {
                if !rootdir.exists() {
                    return Err(BlzError::Value(format!(
                        "cannot open '{}' in append mode: does not exist",
                        rootdir.display()
                    )));
                }
            }
            OpenMode::Read => {
                return Err(BlzError::ReadOnly(
                    "cannot save_as with mode 'r'".to_string(),
                ));
            }
        }
        let data_dir = rootdir.join("data");
        std::fs::create_dir_all(&data_dir)?;
        let mut disk = DiskChunkStore::create(&data_dir, self.dtype)?;
        for idx in 0..self.store.len() {
            disk.push(self.store.get(idx)?)?;
        }
        self.store = Box::new(disk);
        self.root = Some(rootdir.to_path_buf());
        self.readonly = matches!(mode, OpenMode::Read);
        self.flush()
    }

    /// Opens a previously persisted `BArray` from `rootdir`.
    pub fn open(rootdir: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let rootdir = rootdir.as_ref();
        let meta_bytes = std::fs::read(rootdir.join("meta"))?;
        let body = meta::read_from(&meta_bytes[..])?;
        let data_dir = rootdir.join("data");
        let store = DiskChunkStore::open(&data_dir, body.dtype, body.nchunks)?;
        let leftover_bytes = leftover::read(&rootdir.join("leftover"))?;
        let attrs = Attrs::read(&rootdir.join("__attrs__"))?;

        Ok(BArray {
            dtype: body.dtype,
            chunklen: body.chunklen,
            params: body.params,
            store: Box::new(store),
            leftover: leftover_bytes,
            attrs,
            readonly: matches!(mode, OpenMode::Read),
            root: Some(rootdir.to_path_buf()),
        })
    }

    pub(crate) fn chunklen(&self) -> usize {
        self.chunklen
    }

    pub(crate) fn store(&self) -> &dyn ChunkStore {
        self.store.as_ref()
    }

    pub(crate) fn leftover(&self) -> &[u8] {
        &self.leftover
    }

    pub(crate) fn leftover_mut(&mut self) -> &mut [u8] {
        &mut self.leftover
    }

    pub(crate) fn replace_chunk(&mut self, idx: usize, chunk: Chunk) -> Result<()> {
        self.store.replace(idx, chunk)
    }

    /// Overrides the heuristic chunk length (in atoms). Only valid before
    /// any data has been appended, since changing it afterward would leave
    /// existing chunks at a different length than new ones.
    pub fn set_chunklen(&mut self, chunklen: usize) -> Result<()> {
        if self.len() > 0 {
            return Err(BlzError::Value(
                "chunklen can only be set on an empty array".to_string(),
            ));
        }
        if chunklen == 0 {
            return Err(BlzError::Value("chunklen must be non-zero".to_string()));
        }
        self.chunklen = chunklen;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_and_len() {
        let a = BArray::zeros(DType::I32, 10, Params::default()).unwrap();
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn append_spills_into_chunks() {
        let mut a = BArray::new_in_memory(DType::I8, Params::default());
        a.chunklen = 4;
        for i in 0..10 {
            a.append_one(Scalar::I8(i)).unwrap();
        }
        assert_eq!(a.len(), 10);
        assert_eq!(a.store.len(), 2);
        assert_eq!(a.leftover.len(), 2);
    }

    #[test]
    fn trim_negative_grows() {
        let mut a = BArray::zeros(DType::I32, 5, Params::default()).unwrap();
        a.trim(-3).unwrap();
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn trim_positive_shrinks() {
        let mut a = BArray::new_in_memory(DType::I32, Params::default());
        a.chunklen = 4;
        for i in 0..10i32 {
            a.append_one(Scalar::I32(i)).unwrap();
        }
        a.trim(3).unwrap();
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn persistence_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("myarray");
        let mut a = BArray::new_in_memory(DType::I32, Params::default());
        a.chunklen = 4;
        for i in 0..10i32 {
            a.append_one(Scalar::I32(i)).unwrap();
        }
        a.save_as(&root, OpenMode::Write).unwrap();

        let opened = BArray::open(&root, OpenMode::Read).unwrap();
        assert_eq!(opened.len(), 10);
        assert!(opened.is_readonly());
    }

    #[test]
    fn copy_without_params_preserves_chunks_and_values() {
        let mut a = BArray::new_in_memory(DType::I32, Params::default());
        a.chunklen = 4;
        for i in 0..10i32 {
            a.append_one(Scalar::I32(i)).unwrap();
        }
        let b = a.copy(None).unwrap();
        assert_eq!(b.len(), a.len());
        assert_eq!(b.store.len(), a.store.len());
        for i in 0..10 {
            assert_eq!(b.get(i).unwrap(), a.get(i).unwrap());
        }
    }

    #[test]
    fn copy_with_params_reencodes_and_preserves_values() {
        let mut a = BArray::new_in_memory(DType::I32, Params::default());
        a.chunklen = 4;
        for i in 0..10i32 {
            a.append_one(Scalar::I32(i)).unwrap();
        }
        let new_params = Params::new(9, false, "lz4".to_string()).unwrap();
        let b = a.copy(Some(new_params.clone())).unwrap();
        assert_eq!(b.params().cname(), new_params.cname());
        for i in 0..10 {
            assert_eq!(b.get(i).unwrap(), a.get(i).unwrap());
        }
    }
}

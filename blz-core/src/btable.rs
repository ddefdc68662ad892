//! `BTable`: a struct-of-arrays compound record — named, equal-length
//! `BArray` columns that together form a row-oriented table when iterated.

use crate::barray::{BArray, OpenMode};
use crate::container::attrs::Attrs;
use crate::dtype::{DType, Scalar};
use crate::error::{BlzError, Result};
use crate::params::Params;
use std::path::{Path, PathBuf};

pub struct BTable {
    names: Vec<String>,
    columns: Vec<BArray>,
    attrs: Attrs,
    readonly: bool,
    root: Option<PathBuf>,
}

impl BTable {
    /// Builds a table from equal-length columns. Column order is the
    /// insertion order given here, not any sorting of `names`.
    pub fn new(names: Vec<String>, columns: Vec<BArray>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(BlzError::Value(
                "names and columns must have the same length".to_string(),
            ));
        }
        if let Some(first) = columns.first() {
            let len = first.len();
            for col in &columns {
                if col.len() != len {
                    return Err(BlzError::Value(
                        "all columns in a btable must have the same length".to_string(),
                    ));
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        for n in &names {
            if !seen.insert(n.clone()) {
                return Err(BlzError::Value(format!("duplicate column name '{n}'")));
            }
        }
        Ok(BTable {
            names,
            columns,
            attrs: Attrs::new(),
            readonly: false,
            root: None,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(BArray::len).unwrap_or(0)
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    fn col_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| BlzError::Value(format!("no such column '{name}'")))
    }

    pub fn column(&self, name: &str) -> Result<&BArray> {
        Ok(&self.columns[self.col_index(name)?])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut BArray> {
        let idx = self.col_index(name)?;
        Ok(&mut self.columns[idx])
    }

    /// Reads one row as `(name, value)` pairs in column order.
    pub fn row(&self, idx: isize) -> Result<Vec<(String, Scalar)>> {
        self.names
            .iter()
            .zip(self.columns.iter())
            .map(|(n, c)| Ok((n.clone(), c.get(idx)?)))
            .collect()
    }

    pub fn rows(&self) -> Result<Vec<Vec<(String, Scalar)>>> {
        (0..self.nrows() as isize).map(|i| self.row(i)).collect()
    }

    /// Appends a row given in column order.
    pub fn append_row(&mut self, values: &[Scalar]) -> Result<()> {
        if self.readonly {
            return Err(BlzError::ReadOnly("btable is read-only".to_string()));
        }
        if values.len() != self.columns.len() {
            return Err(BlzError::Value(format!(
                "expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }
        for (col, v) in self.columns.iter_mut().zip(values) {
            col.append_one(*v)?;
        }
        Ok(())
    }

    /// Adds a new column of the same length as the existing ones, appended
    /// after the last column.
    pub fn addcol(&mut self, name: impl Into<String>, column: BArray) -> Result<()> {
        if self.readonly {
            return Err(BlzError::ReadOnly("btable is read-only".to_string()));
        }
        let name = name.into();
        if self.names.iter().any(|n| n == &name) {
            return Err(BlzError::Value(format!("column '{name}' already exists")));
        }
        if !self.columns.is_empty() && column.len() != self.nrows() {
            return Err(BlzError::Value(format!(
                "new column has length {}, table has {} rows",
                column.len(),
                self.nrows()
            )));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn delcol(&mut self, name: &str) -> Result<BArray> {
        if self.readonly {
            return Err(BlzError::ReadOnly("btable is read-only".to_string()));
        }
        let idx = self.col_index(name)?;
        self.names.remove(idx);
        Ok(self.columns.remove(idx))
    }

    /// Row indices where `mask` (a column or externally built boolean
    /// `BArray`) holds true.
    pub fn wheretrue(&self, mask: &BArray) -> Result<Vec<usize>> {
        if mask.len() != self.nrows() {
            return Err(BlzError::Value(
                "mask length does not match number of rows".to_string(),
            ));
        }
        let mut out = Vec::new();
        for (idx, v) in mask.iter().enumerate() {
            if v.as_f64() != 0.0 {
                out.push(idx);
            }
        }
        Ok(out)
    }

    /// Rows selected by a boolean mask.
    pub fn where_rows(&self, mask: &BArray) -> Result<Vec<Vec<(String, Scalar)>>> {
        self.wheretrue(mask)?
            .into_iter()
            .map(|i| self.row(i as isize))
            .collect()
    }

    /// Evaluates a string expression over this table's columns, producing
    /// one `f64` result per row.
    pub fn eval(&self, sexpr: &str, params: Params) -> Result<BArray> {
        crate::eval::eval_table(self, sexpr, params)
    }

    /// Row indices where `sexpr` holds truthy.
    pub fn where_indices(&self, sexpr: &str) -> Result<Vec<usize>> {
        crate::eval::whereblocks(self, sexpr)
    }

    /// Rows selected by a string expression.
    pub fn where_expr(&self, sexpr: &str) -> Result<Vec<Vec<(String, Scalar)>>> {
        self.where_indices(sexpr)?
            .into_iter()
            .map(|i| self.row(i as isize))
            .collect()
    }

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
                return Err(BlzError::ReadOnly("cannot save_as with mode 'r'".to_string()));
            }
        }
        for (name, col) in self.names.iter().zip(self.columns.iter_mut()) {
            col.save_as(rootdir.join(name), mode)?;
        }
        self.attrs.write(&rootdir.join("__attrs__"))?;
        let names_json = serde_json::to_vec_pretty(&self.names)
            .map_err(|e| BlzError::Corrupted(format!("failed to encode column order: {e}")))?;
        std::fs::write(rootdir.join("__names__"), names_json)?;
        self.root = Some(rootdir.to_path_buf());
        self.readonly = matches!(mode, OpenMode::Read);
        Ok(())
    }

    pub fn open(rootdir: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let rootdir = rootdir.as_ref();
        let names_bytes = std::fs::read(rootdir.join("__names__"))?;
        let names: Vec<String> = serde_json::from_slice(&names_bytes)
            .map_err(|e| BlzError::Corrupted(format!("malformed __names__ file: {e}")))?;
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            columns.push(BArray::open(rootdir.join(name), mode)?);
        }
        let attrs = Attrs::read(&rootdir.join("__attrs__"))?;
        Ok(BTable {
            names,
            columns,
            attrs,
            readonly: matches!(mode, OpenMode::Read),
            root: Some(rootdir.to_path_buf()),
        })
    }
}

/// Builds an all-columns-same-dtype table from row-major data, convenient
/// for quick construction in tests and the CLI.
pub fn from_rows(names: Vec<String>, dtype: DType, rows: &[Vec<Scalar>], params: Params) -> Result<BTable> {
    let ncols = names.len();
    let mut columns: Vec<BArray> = (0..ncols)
        .map(|_| BArray::empty(dtype, params.clone()))
        .collect();
    for row in rows {
        for (col, v) in columns.iter_mut().zip(row) {
            col.append_one(*v)?;
        }
    }
    BTable::new(names, columns)
}

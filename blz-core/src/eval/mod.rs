//! Expression evaluation over arrays and tables, worked out chunk-at-a-time
//! so evaluating a filter over a billion-row table never needs it all
//! decompressed at once.

pub mod expr;

use crate::barray::BArray;
use crate::btable::BTable;
use crate::dtype::{DType, Scalar};
use crate::error::Result;
use crate::params::Params;
use expr::parse;
use std::collections::HashMap;

/// Default block size (in rows/elements) used by `iterblocks`/`whereblocks`
/// and by `eval` internally, matching `BArray`'s own default chunk sizing.
pub const DEFAULT_BLOCK_LEN: usize = 1 << 16;

/// Evaluates `sexpr` against a table's columns, producing a new `f64`
/// `BArray` of one result per row.
pub fn eval_table(table: &BTable, sexpr: &str, params: Params) -> Result<BArray> {
    let ast = parse(sexpr)?;
    let mut out = BArray::empty(DType::F64, params);
    let nrows = table.nrows();
    let mut start = 0;
    while start < nrows {
        let end = (start + DEFAULT_BLOCK_LEN).min(nrows);
        let mut columns: HashMap<String, Vec<Scalar>> = HashMap::new();
        for name in table.names() {
            columns.insert(name.clone(), table.column(name)?.get_range(start, end, 1)?);
        }
        for i in 0..(end - start) {
            let row: HashMap<&str, f64> = columns
                .iter()
                .map(|(k, v)| (k.as_str(), v[i].as_f64()))
                .collect();
            out.append_one(Scalar::F64(ast.eval_row(&row)?))?;
        }
        start = end;
    }
    Ok(out)
}

/// Evaluates `sexpr` for every element of a single array, binding the
/// array's values to the identifier `x`.
pub fn eval_array(array: &BArray, sexpr: &str, params: Params) -> Result<BArray> {
    let ast = parse(sexpr)?;
    let mut out = BArray::empty(DType::F64, params);
    for v in array.iter() {
        let mut row = HashMap::new();
        row.insert("x", v.as_f64());
        out.append_one(Scalar::F64(ast.eval_row(&row)?))?;
    }
    Ok(out)
}

/// Row indices where `sexpr` holds truthy, scanning block-at-a-time.
pub fn whereblocks(table: &BTable, sexpr: &str) -> Result<Vec<usize>> {
    let ast = parse(sexpr)?;
    let nrows = table.nrows();
    let mut out = Vec::new();
    let mut start = 0;
    while start < nrows {
        let end = (start + DEFAULT_BLOCK_LEN).min(nrows);
        let mut columns: HashMap<String, Vec<Scalar>> = HashMap::new();
        for name in table.names() {
            columns.insert(name.clone(), table.column(name)?.get_range(start, end, 1)?);
        }
        for i in 0..(end - start) {
            let row: HashMap<&str, f64> = columns
                .iter()
                .map(|(k, v)| (k.as_str(), v[i].as_f64()))
                .collect();
            if ast.eval_row(&row)? != 0.0 {
                out.push(start + i);
            }
        }
        start = end;
    }
    Ok(out)
}

/// Yields successive blocks of at most `blen` elements from `array`.
pub fn iterblocks(array: &BArray, blen: usize) -> Vec<Vec<Scalar>> {
    let len = array.len();
    let mut blocks = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + blen).min(len);
        if let Ok(block) = array.get_range(start, end, 1) {
            blocks.push(block);
        }
        start = end;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btable::BTable;

    #[test]
    fn eval_table_simple_expr() {
        let cx = BArray::arange(DType::F64, 0.0, 10.0, 1.0, Params::default()).unwrap();
        let table = BTable::new(vec!["x".into()], vec![cx]).unwrap();
        let result = eval_table(&table, "x<5", Params::default()).unwrap();
        let got: Vec<f64> = result.iter().map(|s| s.as_f64()).collect();
        assert_eq!(
            got,
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn whereblocks_row_indices() {
        let cx = BArray::arange(DType::F64, 0.0, 10.0, 1.0, Params::default()).unwrap();
        let table = BTable::new(vec!["x".into()], vec![cx]).unwrap();
        let idxs = whereblocks(&table, "x>7").unwrap();
        assert_eq!(idxs, vec![8, 9]);
    }

    #[test]
    fn iterblocks_chunks_array() {
        let a = BArray::arange(DType::I32, 0.0, 10.0, 1.0, Params::default()).unwrap();
        let blocks = iterblocks(&a, 4);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].len(), 4);
        assert_eq!(blocks[2].len(), 2);
    }
}

use std::path::PathBuf;

use blz_core::{BArray, BTable, DType, OpenMode, Params, Result, Scalar};

fn parse_params(clevel: u8, cname: String, shuffle: bool) -> Result<Params> {
    Params::new(clevel, shuffle, cname)
}

pub fn handle_create(
    out: PathBuf,
    dtype: String,
    len: usize,
    fill: String,
    clevel: u8,
    cname: String,
    shuffle: bool,
) -> Result<()> {
    let dtype = DType::from_name(&dtype)?;
    let params = parse_params(clevel, cname, shuffle)?;

    let mut array = match fill.as_str() {
        "zeros" => BArray::zeros(dtype, len, params)?,
        "ones" => BArray::ones(dtype, len, params)?,
        value => {
            let v: f64 = value
                .parse()
                .map_err(|_| blz_core::BlzError::Value(format!("invalid fill value '{value}'")))?;
            BArray::fill(dtype, len, Scalar::from_f64(dtype, v), params)?
        }
    };
    array.save_as(&out, OpenMode::Write)?;
    tracing::info!(path = %out.display(), len, "created array");
    println!("created array at {} ({len} elements)", out.display());
    Ok(())
}

fn is_table(rootdir: &std::path::Path) -> bool {
    rootdir.join("__names__").is_file()
}

pub fn handle_info(rootdir: PathBuf) -> Result<()> {
    if is_table(&rootdir) {
        let table = BTable::open(&rootdir, OpenMode::Read)?;
        println!("btable at {}", rootdir.display());
        println!("  rows: {}", table.nrows());
        println!("  columns: {}", table.names().join(", "));
    } else {
        let array = BArray::open(&rootdir, OpenMode::Read)?;
        println!("barray at {}", rootdir.display());
        println!("  dtype: {}", array.dtype().name());
        println!("  len: {}", array.len());
        println!(
            "  params: clevel={} shuffle={} cname={}",
            array.params().clevel(),
            array.params().shuffle(),
            array.params().cname()
        );
    }
    Ok(())
}

pub fn handle_dump(rootdir: PathBuf, skip: usize, limit: Option<usize>) -> Result<()> {
    if is_table(&rootdir) {
        let table = BTable::open(&rootdir, OpenMode::Read)?;
        let end = match limit {
            Some(n) => (skip + n).min(table.nrows()),
            None => table.nrows(),
        };
        for i in skip..end {
            let row = table.row(i as isize)?;
            let rendered: Vec<String> = row
                .iter()
                .map(|(name, v)| format!("{name}={}", v.as_f64()))
                .collect();
            println!("{}", rendered.join(" "));
        }
    } else {
        let array = BArray::open(&rootdir, OpenMode::Read)?;
        for v in array.iter_skip_limit(skip, limit) {
            println!("{}", v.as_f64());
        }
    }
    Ok(())
}

pub fn handle_query(rootdir: PathBuf, expr: String) -> Result<()> {
    let table = BTable::open(&rootdir, OpenMode::Read)?;
    let rows = table.where_expr(&expr)?;
    for row in rows {
        let rendered: Vec<String> = row
            .iter()
            .map(|(name, v)| format!("{name}={}", v.as_f64()))
            .collect();
        println!("{}", rendered.join(" "));
    }
    Ok(())
}

pub fn handle_walk(rootdir: PathBuf) -> Result<()> {
    for entry in blz_core::walk(&rootdir)? {
        println!("{:?}\t{}", entry.kind, entry.path.display());
    }
    Ok(())
}

use blz_core::{arange, eval::iterblocks, BArray, BTable, DType, OpenMode, Params, Scalar};

fn p() -> Params {
    Params::default()
}

#[test]
fn scenario_arange_index_and_slice() {
    let b = arange(DType::I64, 1.0, 1000.0, 1.0, p()).unwrap();
    assert_eq!(b.get(-1).unwrap(), Scalar::I64(999));
    let got = b.get_range(1, 80, 3).unwrap();
    let expect: Vec<Scalar> = (1..80).step_by(3).map(Scalar::I64).collect();
    assert_eq!(got, expect);
}

#[test]
fn scenario_append_grows_and_sums() {
    let mut b = BArray::empty(DType::I64, p());
    b.set_chunklen(100).unwrap();
    for v in 0..10_000i64 {
        b.append_one(Scalar::I64(v)).unwrap();
    }
    for v in 10_000..30_000i64 {
        b.append_one(Scalar::I64(v)).unwrap();
    }
    assert_eq!(b.len(), 30_000);
    let expect_sum: i64 = (0..30_000i64).sum();
    assert_eq!(b.sum().unwrap(), Scalar::I64(expect_sum));
}

#[test]
fn scenario_zeros_persisted_are_cheap_and_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("zarray");
    let mut b = BArray::empty(DType::I8, p());
    b.set_chunklen(1_000).unwrap();
    for _ in 0..50_000 {
        b.append_one(Scalar::I8(0)).unwrap();
    }
    b.save_as(&root, OpenMode::Write).unwrap();

    let opened = BArray::open(&root, OpenMode::Read).unwrap();
    assert_eq!(opened.len(), 50_000);
    assert_eq!(opened.sum().unwrap(), Scalar::I8(0));

    let chunk_files: Vec<_> = std::fs::read_dir(root.join("data"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(chunk_files.len(), 50, "expected 50 full 1000-atom chunks");
    let on_disk_bytes: u64 = chunk_files.iter().map(|e| e.metadata().unwrap().len()).sum();
    assert!(
        on_disk_bytes < 50_000,
        "constant-chunk zeros should compress far below raw size, got {on_disk_bytes}"
    );
}

#[test]
fn scenario_trim_positive_and_negative() {
    let mut b = arange(DType::I32, 0.0, 100.0, 1.0, p()).unwrap();
    b.trim(3).unwrap();
    assert_eq!(b.len(), 97);
    b.trim(-10).unwrap();
    assert_eq!(b.len(), 107);
    for i in 97..107 {
        assert_eq!(b.get(i).unwrap(), Scalar::I32(0));
    }
}

#[test]
fn scenario_where_with_skip_and_limit() {
    let values = arange(DType::I32, 1.0, 11.0, 1.0, p()).unwrap();
    let mask_vals: Vec<Scalar> = (1..11).map(|v| Scalar::Bool(v > 5)).collect();
    let mask = blz_core::fromiter(DType::Bool, mask_vals, p()).unwrap();

    let selected = values.where_(&mask, 1, Some(2)).unwrap();
    assert_eq!(selected, vec![Scalar::I32(7), Scalar::I32(8)]);
}

#[test]
fn scenario_table_where_expr() {
    let cx = arange(DType::F64, 0.0, 100_000.0, 1.0, p()).unwrap();
    let cy = arange(DType::F64, 0.0, 100_000.0, 1.0, p()).unwrap();
    let t = BTable::new(vec!["x".into(), "y".into()], vec![cx, cy]).unwrap();

    let rows = t.where_expr("x<5").unwrap();
    let got: Vec<(f64, f64)> = rows
        .into_iter()
        .map(|row| (row[0].1.as_f64(), row[1].1.as_f64()))
        .collect();
    assert_eq!(
        got,
        vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]
    );
}

#[test]
fn invariant_chunk_boundary_indexing_matches_contiguous() {
    let mut b = BArray::empty(DType::I32, p());
    b.set_chunklen(16).unwrap();
    for i in 0..40i32 {
        b.append_one(Scalar::I32(i)).unwrap();
    }
    for i in [15usize, 16, 17, 31, 32] {
        assert_eq!(b.get(i as isize).unwrap(), Scalar::I32(i as i32));
    }
}

#[test]
fn invariant_resize_zero_and_grow() {
    let mut b = arange(DType::I32, 0.0, 20.0, 1.0, p()).unwrap();
    b.resize(0, Scalar::I32(0)).unwrap();
    assert_eq!(b.len(), 0);
    b.resize(5, Scalar::I32(-1)).unwrap();
    assert_eq!(b.len(), 5);
    for v in b.iter() {
        assert_eq!(v, Scalar::I32(-1));
    }
}

#[test]
fn invariant_iterblocks_matches_get_range() {
    let b = arange(DType::I32, 0.0, 50.0, 1.0, p()).unwrap();
    let blocks = iterblocks(&b, 8);
    let flattened: Vec<Scalar> = blocks.into_iter().flatten().collect();
    assert_eq!(flattened, b.get_range(0, 50, 1).unwrap());
}

#[test]
fn negative_step_slicing_is_unimplemented() {
    let b = arange(DType::I32, 0.0, 10.0, 1.0, p()).unwrap();
    assert!(matches!(
        b.get_range(0, 10, -1),
        Err(blz_core::BlzError::Unimplemented(_))
    ));
}

#[test]
fn readonly_open_rejects_mutation() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("roarray");
    let mut b = arange(DType::I32, 0.0, 10.0, 1.0, p()).unwrap();
    b.save_as(&root, OpenMode::Write).unwrap();

    let mut opened = BArray::open(&root, OpenMode::Read).unwrap();
    assert!(matches!(
        opened.append_one(Scalar::I32(1)),
        Err(blz_core::BlzError::ReadOnly(_))
    ));
}

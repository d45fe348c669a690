//! End-to-end assembly of synthetic box-decomposed datasets.

use pltrs::{read_data, read_field, scan_dataset, scan_level};
use std::path::Path;

fn tuple(v: &[i64]) -> String {
    format!(
        "({})",
        v.iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

fn f64_bytes(words: &[f64]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_ne_bytes()).collect()
}

/// Column-major fab values over an inclusive index range, first axis
/// fastest, computed from the global cell index.
fn fab_values(lo: &[i64], hi: &[i64], value: &dyn Fn(&[i64]) -> f64) -> Vec<f64> {
    let total: usize = lo
        .iter()
        .zip(hi)
        .map(|(l, h)| (h - l + 1) as usize)
        .product();
    let mut idx = lo.to_vec();
    let mut out = Vec::with_capacity(total);
    for _ in 0..total {
        out.push(value(&idx));
        for axis in 0..lo.len() {
            idx[axis] += 1;
            if idx[axis] <= hi[axis] {
                break;
            }
            idx[axis] = lo[axis];
        }
    }
    out
}

/// Writes `<field>_H` plus one payload file holding every fab in box order.
/// `boxes` hold the unpadded corners exactly as the header stores them.
fn write_field(
    dir: &Path,
    field: &str,
    version: u32,
    ncomp: usize,
    ghost_line: &str,
    boxes: &[(Vec<i64>, Vec<i64>)],
    fabs: &[Vec<f64>],
) {
    let payload_name = format!("{field}_D_00000");
    let mut offsets = Vec::new();
    let mut payload: Vec<u8> = Vec::new();
    for words in fabs {
        offsets.push(payload.len() as u64);
        if version == 1 {
            payload.extend_from_slice(b"FAB ((8, (64 11 52 0 1 12 0 1023)))\n");
        }
        payload.extend_from_slice(&f64_bytes(words));
    }
    std::fs::write(dir.join(&payload_name), payload).unwrap();

    let mut header = format!("{version}\n1\n{ncomp}\n{ghost_line}\n");
    header.push_str(&format!("({} 0\n", boxes.len()));
    for (lo, hi) in boxes {
        let node = vec![0i64; lo.len()];
        header.push_str(&format!("({} {} {})\n", tuple(lo), tuple(hi), tuple(&node)));
    }
    header.push_str(")\n");
    for off in &offsets {
        header.push_str(&format!("FabOnDisk: {payload_name} {off}\n"));
    }
    std::fs::write(dir.join(format!("{field}_H")), header).unwrap();
}

fn ramp2(idx: &[i64]) -> f64 {
    (idx[0] * 100 + idx[1]) as f64
}

fn ramp3(idx: &[i64]) -> f64 {
    (idx[0] * 10_000 + idx[1] * 100 + idx[2]) as f64
}

#[test]
fn four_boxes_tile_a_2d_domain_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let boxes: Vec<(Vec<i64>, Vec<i64>)> = vec![
        (vec![0, 0], vec![3, 3]),
        (vec![4, 0], vec![7, 3]),
        (vec![0, 4], vec![3, 7]),
        (vec![4, 4], vec![7, 7]),
    ];
    let fabs: Vec<Vec<f64>> = boxes
        .iter()
        .map(|(lo, hi)| fab_values(lo, hi, &ramp2))
        .collect();
    write_field(dir.path(), "Ex", 0, 1, "0", &boxes, &fabs);

    let arr = read_field(dir.path(), "Ex").unwrap();
    assert_eq!(arr.shape(), &[8, 8]);
    for i in 0..8i64 {
        for j in 0..8i64 {
            assert_eq!(arr[[i as usize, j as usize]], ramp2(&[i, j]));
        }
    }
}

#[test]
fn ghost_padded_3d_box_shifts_the_origin() {
    let dir = tempfile::tempdir().unwrap();
    let boxes = vec![(vec![0, 0, 0], vec![3, 3, 3])];
    // payload covers the ghost-expanded range
    let fabs = vec![fab_values(&[-1, -1, -1], &[4, 4, 4], &ramp3)];
    write_field(dir.path(), "rho", 0, 1, "(1,1,1)", &boxes, &fabs);

    let arr = read_field(dir.path(), "rho").unwrap();
    assert_eq!(arr.shape(), &[6, 6, 6]);
    // array index 0 is global cell -1
    assert_eq!(arr[[0, 0, 0]], ramp3(&[-1, -1, -1]));
    assert_eq!(arr[[5, 5, 5]], ramp3(&[4, 4, 4]));
    assert_eq!(arr[[1, 2, 3]], ramp3(&[0, 1, 2]));
}

#[test]
fn version_one_and_version_zero_fixtures_agree() {
    let dir = tempfile::tempdir().unwrap();
    let boxes = vec![(vec![0, 0], vec![3, 3])];
    let fabs = vec![fab_values(&[0, 0], &[3, 3], &ramp2)];
    let v0 = dir.path().join("v0");
    let v1 = dir.path().join("v1");
    std::fs::create_dir(&v0).unwrap();
    std::fs::create_dir(&v1).unwrap();
    write_field(&v0, "Ez", 0, 1, "0", &boxes, &fabs);
    write_field(&v1, "Ez", 1, 1, "0", &boxes, &fabs);

    let a = read_field(&v0, "Ez").unwrap();
    let b = read_field(&v1, "Ez").unwrap();
    assert_eq!(a, b);
}

#[test]
fn missing_the_version_one_skip_shifts_every_value() {
    let dir = tempfile::tempdir().unwrap();
    let boxes = vec![(vec![0, 0], vec![3, 3])];
    let fabs = vec![fab_values(&[0, 0], &[3, 3], &ramp2)];
    write_field(dir.path(), "Ez", 1, 1, "0", &boxes, &fabs);

    // Downgrade the header to version 0 while the payload keeps its fab
    // line: the read must now come back wrong or short.
    let header_path = dir.path().join("Ez_H");
    let header = std::fs::read_to_string(&header_path).unwrap();
    std::fs::write(&header_path, header.replacen("1\n", "0\n", 1)).unwrap();

    match read_field(dir.path(), "Ez") {
        Ok(arr) => assert_ne!(arr[[0, 0]], ramp2(&[0, 0])),
        Err(err) => assert_eq!(err.kind(), "truncated"),
    }
}

#[test]
fn uncovered_cells_stay_zero() {
    let dir = tempfile::tempdir().unwrap();
    let boxes: Vec<(Vec<i64>, Vec<i64>)> = vec![
        (vec![0, 0], vec![0, 0]),
        (vec![3, 3], vec![3, 3]),
    ];
    let fabs = vec![vec![7.0], vec![9.0]];
    write_field(dir.path(), "gap", 0, 1, "0", &boxes, &fabs);

    let arr = read_field(dir.path(), "gap").unwrap();
    assert_eq!(arr.shape(), &[4, 4]);
    assert_eq!(arr[[0, 0]], 7.0);
    assert_eq!(arr[[3, 3]], 9.0);
    assert_eq!(arr.sum(), 16.0);
}

#[test]
fn one_bad_field_does_not_abort_its_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let boxes = vec![(vec![0, 0], vec![1, 1])];
    let fabs = vec![fab_values(&[0, 0], &[1, 1], &ramp2)];
    write_field(dir.path(), "good", 0, 1, "0", &boxes, &fabs);
    write_field(dir.path(), "bad", 0, 1, "0", &boxes, &fabs);
    std::fs::remove_file(dir.path().join("bad_D_00000")).unwrap();

    let scan = scan_level(dir.path(), 0).unwrap();
    assert!(scan.fields["good"].is_ok());
    assert_eq!(scan.fields["bad"].as_ref().unwrap_err().kind(), "io");
    assert_eq!(scan.failures().count(), 1);
    assert_eq!(scan.ok_fields().count(), 1);
}

#[test]
fn dataset_scan_walks_levels_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let boxes = vec![(vec![0, 0], vec![1, 1])];
    let fabs = vec![fab_values(&[0, 0], &[1, 1], &ramp2)];
    for level in ["Level_0", "Level_1"] {
        let level_dir = dir.path().join(level);
        std::fs::create_dir(&level_dir).unwrap();
        write_field(&level_dir, "Ex", 0, 1, "0", &boxes, &fabs);
    }

    let levels = scan_dataset(dir.path()).unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].level, 0);
    assert_eq!(levels[1].level, 1);
    assert!(levels[1].fields["Ex"].is_ok());
}

#[test]
fn read_data_prefers_the_raw_fields_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    let level_dir = dir.path().join("raw_fields").join("Level_0");
    std::fs::create_dir_all(&level_dir).unwrap();
    let boxes = vec![(vec![0, 0], vec![1, 1])];
    let fabs = vec![fab_values(&[0, 0], &[1, 1], &ramp2)];
    write_field(&level_dir, "Bz", 0, 1, "0", &boxes, &fabs);

    let levels = read_data(dir.path()).unwrap();
    assert_eq!(levels.len(), 1);
    assert!(levels[0].fields["Bz"].is_ok());
}

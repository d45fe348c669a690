#[allow(dead_code)]
pub mod plt_scan {
    use crate::plt_reader::plt_reader::{read_field, PltError};
    use ndarray::ArrayD;
    use rayon::prelude::*;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    const LEVEL_PREFIX: &str = "Level_";
    const HEADER_SUFFIX: &str = "_H";

    /// One grid level: every field found in the level directory, each either
    /// an assembled array or the error that stopped it. One bad field never
    /// aborts the level.
    #[derive(Debug)]
    pub struct LevelScan {
        pub level: usize,
        pub fields: BTreeMap<String, Result<ArrayD<f64>, PltError>>,
    }

    impl LevelScan {
        pub fn ok_fields(&self) -> impl Iterator<Item = (&str, &ArrayD<f64>)> {
            self.fields
                .iter()
                .filter_map(|(name, r)| r.as_ref().ok().map(|arr| (name.as_str(), arr)))
        }

        pub fn failures(&self) -> impl Iterator<Item = (&str, &PltError)> {
            self.fields
                .iter()
                .filter_map(|(name, r)| r.as_ref().err().map(|err| (name.as_str(), err)))
        }
    }

    fn io_err(path: &Path, source: std::io::Error) -> PltError {
        PltError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn format_err(path: &Path, reason: impl Into<String>) -> PltError {
        PltError::Format {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// `Level_<n>` subdirectories of a dataset root, ascending by level
    /// index. A missing root fails fast, nothing partial is returned.
    pub fn list_levels(root: &Path) -> Result<Vec<(usize, PathBuf)>, PltError> {
        let entries = std::fs::read_dir(root).map_err(|e| io_err(root, e))?;
        let mut levels = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(root, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(index) = name
                .strip_prefix(LEVEL_PREFIX)
                .and_then(|s| s.parse::<usize>().ok())
            {
                if entry.path().is_dir() {
                    levels.push((index, entry.path()));
                }
            }
        }
        levels.sort_by_key(|(index, _)| *index);
        Ok(levels)
    }

    /// Distinct field names of a level directory, one per `<field>_H` header.
    pub fn list_fields(level_dir: &Path) -> Result<Vec<String>, PltError> {
        let entries = std::fs::read_dir(level_dir).map_err(|e| io_err(level_dir, e))?;
        let mut fields = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(level_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(HEADER_SUFFIX) {
                if !stem.is_empty() {
                    fields.push(stem.to_string());
                }
            }
        }
        fields.sort();
        Ok(fields)
    }

    /// Assembles every field of one level. Fields own disjoint outputs, so
    /// they run on the worker pool; boxes within a field stay sequential.
    pub fn scan_level(level_dir: &Path, level: usize) -> Result<LevelScan, PltError> {
        let names = list_fields(level_dir)?;
        let results: Vec<(String, Result<ArrayD<f64>, PltError>)> = names
            .par_iter()
            .map(|name| (name.clone(), read_field(level_dir, name)))
            .collect();

        let mut fields = BTreeMap::new();
        for (name, result) in results {
            if let Err(err) = &result {
                log::warn!("level {level}: field {name} failed ({}): {err}", err.kind());
            }
            fields.insert(name, result);
        }
        Ok(LevelScan { level, fields })
    }

    /// Scans a dataset root laid out as `<root>/Level_<n>/<field>_H`.
    pub fn scan_dataset(root: &Path) -> Result<Vec<LevelScan>, PltError> {
        let levels = list_levels(root)?;
        levels
            .into_iter()
            .map(|(index, dir)| scan_level(&dir, index))
            .collect()
    }

    /// Convenience entry for full plotfile trees, which keep their raw dumps
    /// under a `raw_fields` subdirectory.
    pub fn read_data(plt_dir: &Path) -> Result<Vec<LevelScan>, PltError> {
        let raw = plt_dir.join("raw_fields");
        if raw.is_dir() {
            scan_dataset(&raw)
        } else {
            scan_dataset(plt_dir)
        }
    }

    /// Global header of a lab-frame snapshot series.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SnapshotGlobalHeader {
        pub nsnapshots: usize,
        pub dt_between_snapshots: f64,
        pub gamma_boost: f64,
        pub beta_boost: f64,
    }

    /// Per-snapshot header. 2-D layouts store (x, z) on disk; y collapses to
    /// one dummy cell with zero extent.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SnapshotLocalHeader {
        pub t_snapshot: f64,
        pub cells: [usize; 3],
        pub lo: [f64; 3],
        pub hi: [f64; 3],
        pub field_names: Vec<String>,
    }

    fn next_line<'a>(
        path: &Path,
        lines: &mut std::str::Lines<'a>,
        what: &str,
    ) -> Result<&'a str, PltError> {
        lines
            .next()
            .ok_or_else(|| format_err(path, format!("missing {what} line")))
    }

    fn parse_numbers<T: std::str::FromStr>(
        path: &Path,
        line: &str,
        what: &str,
        expected: usize,
    ) -> Result<Vec<T>, PltError> {
        let values = line
            .split_whitespace()
            .map(|t| t.parse::<T>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format_err(path, format!("bad {what} line {line:?}")))?;
        if values.len() != expected {
            return Err(format_err(
                path,
                format!("{what} line has {} entries, expected {expected}", values.len()),
            ));
        }
        Ok(values)
    }

    pub fn read_global_header(path: &Path) -> Result<SnapshotGlobalHeader, PltError> {
        let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let mut lines = text.lines();
        let nsnapshots = parse_numbers::<usize>(
            path,
            next_line(path, &mut lines, "snapshot count")?,
            "snapshot count",
            1,
        )?[0];
        let dt_between_snapshots = parse_numbers::<f64>(
            path,
            next_line(path, &mut lines, "snapshot dt")?,
            "snapshot dt",
            1,
        )?[0];
        let gamma_boost = parse_numbers::<f64>(
            path,
            next_line(path, &mut lines, "gamma boost")?,
            "gamma boost",
            1,
        )?[0];
        let beta_boost = parse_numbers::<f64>(
            path,
            next_line(path, &mut lines, "beta boost")?,
            "beta boost",
            1,
        )?[0];
        Ok(SnapshotGlobalHeader {
            nsnapshots,
            dt_between_snapshots,
            gamma_boost,
            beta_boost,
        })
    }

    pub fn read_local_header(path: &Path, dim: usize) -> Result<SnapshotLocalHeader, PltError> {
        if dim != 2 && dim != 3 {
            return Err(format_err(path, format!("unsupported dimensionality {dim}")));
        }
        let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let mut lines = text.lines();

        let t_snapshot = parse_numbers::<f64>(
            path,
            next_line(path, &mut lines, "snapshot time")?,
            "snapshot time",
            1,
        )?[0];
        let counts =
            parse_numbers::<usize>(path, next_line(path, &mut lines, "cell count")?, "cell count", dim)?;
        let los = parse_numbers::<f64>(path, next_line(path, &mut lines, "domain lo")?, "domain lo", dim)?;
        let his = parse_numbers::<f64>(path, next_line(path, &mut lines, "domain hi")?, "domain hi", dim)?;
        let field_names: Vec<String> = next_line(path, &mut lines, "field names")?
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let (cells, lo, hi) = if dim == 2 {
            (
                [counts[0], 1, counts[1]],
                [los[0], 0.0, los[1]],
                [his[0], 0.0, his[1]],
            )
        } else {
            (
                [counts[0], counts[1], counts[2]],
                [los[0], los[1], los[2]],
                [his[0], his[1], his[2]],
            )
        };
        Ok(SnapshotLocalHeader {
            t_snapshot,
            cells,
            lo,
            hi,
            field_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::plt_scan::*;
    use std::path::Path;

    fn touch(path: &Path, body: &str) {
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn levels_are_sorted_by_index() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Level_10", "Level_2", "Level_0", "notes", "Level_x"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        let levels = list_levels(dir.path()).unwrap();
        let indices: Vec<usize> = levels.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2, 10]);
    }

    #[test]
    fn missing_root_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_dataset(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn fields_come_from_header_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Ez_H"), "");
        touch(&dir.path().join("Bx_H"), "");
        touch(&dir.path().join("Ez_D_00000"), "");
        let fields = list_fields(dir.path()).unwrap();
        assert_eq!(fields, vec!["Bx".to_string(), "Ez".to_string()]);
    }

    #[test]
    fn global_snapshot_header_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Header");
        touch(&path, "12\n2.5e-9\n10.0\n0.995\n");
        let header = read_global_header(&path).unwrap();
        assert_eq!(header.nsnapshots, 12);
        assert_eq!(header.dt_between_snapshots, 2.5e-9);
        assert_eq!(header.gamma_boost, 10.0);
        assert_eq!(header.beta_boost, 0.995);
    }

    #[test]
    fn local_snapshot_header_pads_the_y_axis_in_2d() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Header");
        touch(
            &path,
            "1.5e-13\n64 128\n-1.0 -2.0\n1.0 2.0\nEx Ey Ez\n",
        );
        let header = read_local_header(&path, 2).unwrap();
        assert_eq!(header.t_snapshot, 1.5e-13);
        assert_eq!(header.cells, [64, 1, 128]);
        assert_eq!(header.lo, [-1.0, 0.0, -2.0]);
        assert_eq!(header.hi, [1.0, 0.0, 2.0]);
        assert_eq!(header.field_names, vec!["Ex", "Ey", "Ez"]);
    }

    #[test]
    fn local_snapshot_header_reads_all_three_axes_in_3d() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Header");
        touch(
            &path,
            "1.0e-12\n16 32 64\n0.0 0.0 0.0\n1.0 2.0 4.0\nrho\n",
        );
        let header = read_local_header(&path, 3).unwrap();
        assert_eq!(header.cells, [16, 32, 64]);
        assert_eq!(header.hi, [1.0, 2.0, 4.0]);
    }

    #[test]
    fn local_snapshot_header_rejects_other_dims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Header");
        touch(&path, "0.0\n1\n0.0\n1.0\nEx\n");
        assert_eq!(read_local_header(&path, 4).unwrap_err().kind(), "format");
    }
}

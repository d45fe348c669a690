#[allow(dead_code)]
pub mod reduced {
    use crate::plt_reader::plt_reader::PltError;
    use ndarray::{Array1, Array2};
    use std::collections::BTreeMap;
    use std::path::Path;

    /// Header metadata of a reduced-diagnostics file: field order as written,
    /// units and source column keyed by field name.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ReducedMetadata {
        pub field_names: Vec<String>,
        pub units: BTreeMap<String, String>,
        pub columns: BTreeMap<String, String>,
    }

    pub type ReducedData = BTreeMap<String, Array1<f64>>;

    fn format_err(path: &Path, reason: impl Into<String>) -> PltError {
        PltError::Format {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    fn split_tokens<'a>(line: &'a str, delimiter: Option<&str>) -> Vec<&'a str> {
        match delimiter {
            None => line.split_whitespace().collect(),
            Some(d) => line
                .split(d)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    // One encoded token `[<column>]<name>(<unit>)`, delimiters located
    // positionally, first occurrence each.
    fn split_token(path: &Path, token: &str) -> Result<(String, String, String), PltError> {
        let (Some(ob), Some(cb), Some(op), Some(cp)) = (
            token.find('['),
            token.find(']'),
            token.find('('),
            token.find(')'),
        ) else {
            return Err(format_err(
                path,
                format!("header token {token:?} missing a delimiter"),
            ));
        };
        if ob >= cb || cb >= op || op >= cp {
            return Err(format_err(
                path,
                format!("header token {token:?} has delimiters out of order"),
            ));
        }
        let column = token[ob + 1..cb].to_string();
        let name = token[cb + 1..op].to_string();
        let unit = token[op + 1..cp].to_string();
        Ok((column, name, unit))
    }

    // Histogram columns encode `b<idx>=<center>` in the name slot. The
    // normalized field name is `b` plus the bin index; the center is the
    // number between `=` and the unit parenthesis.
    fn split_bin_token(path: &Path, name: &str) -> Result<(String, f64), PltError> {
        let eq = name
            .find('=')
            .ok_or_else(|| format_err(path, format!("bin token {name:?} missing '='")))?;
        if !name[..eq].contains('b') {
            return Err(format_err(path, format!("bin token {name:?} missing 'b'")));
        }
        let digits: String = name[..eq]
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        if digits.is_empty() {
            return Err(format_err(path, format!("bin token {name:?} missing index")));
        }
        let center = name[eq + 1..]
            .trim()
            .parse::<f64>()
            .map_err(|_| format_err(path, format!("bin token {name:?} has a bad center")))?;
        Ok((format!("b{digits}"), center))
    }

    // Returns the encoded header line and the raw body rows. `@` lines are
    // comments anywhere; `#` marks the header itself and any repeated header
    // lines in appended files.
    fn header_and_rows<'a>(
        path: &Path,
        text: &'a str,
    ) -> Result<(&'a str, Vec<&'a str>), PltError> {
        let mut lines = text.lines();
        let header = loop {
            match lines.next() {
                Some(line) => {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('@') {
                        continue;
                    }
                    break line.trim_start_matches('#').trim();
                }
                None => return Err(format_err(path, "missing header line")),
            }
        };
        let rows = lines
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('@') && !l.starts_with('#'))
            .collect();
        Ok((header, rows))
    }

    fn parse_rows(
        path: &Path,
        rows: &[&str],
        delimiter: Option<&str>,
        width: usize,
    ) -> Result<Vec<Vec<f64>>, PltError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let tokens = split_tokens(row, delimiter);
            if tokens.len() != width {
                return Err(format_err(
                    path,
                    format!("row has {} columns, header has {width}", tokens.len()),
                ));
            }
            let values = tokens
                .iter()
                .map(|t| t.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| format_err(path, format!("bad data row {row:?}")))?;
            out.push(values);
        }
        Ok(out)
    }

    fn column_series(rows: &[Vec<f64>], col: usize) -> Array1<f64> {
        Array1::from_iter(rows.iter().map(|r| r[col]))
    }

    fn build_metadata(
        field_names: &[String],
        units: &[String],
        columns: &[String],
    ) -> ReducedMetadata {
        let mut unit_map = BTreeMap::new();
        let mut column_map = BTreeMap::new();
        for (i, name) in field_names.iter().enumerate() {
            unit_map.insert(name.clone(), units[i].clone());
            column_map.insert(name.clone(), columns[i].clone());
        }
        ReducedMetadata {
            field_names: field_names.to_vec(),
            units: unit_map,
            columns: column_map,
        }
    }

    /// Reads a reduced-diagnostics time series. A single-row body still
    /// yields length-1 series so callers see one shape either way.
    /// `delimiter: None` splits on any whitespace.
    pub fn read_reduced_diags(
        path: &Path,
        delimiter: Option<&str>,
    ) -> Result<(ReducedMetadata, ReducedData), PltError> {
        let text = std::fs::read_to_string(path).map_err(|e| PltError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let (header, raw_rows) = header_and_rows(path, &text)?;
        let tokens = split_tokens(header, delimiter);

        let mut field_names = Vec::with_capacity(tokens.len());
        let mut units = Vec::with_capacity(tokens.len());
        let mut columns = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let (column, name, unit) = split_token(path, token)?;
            field_names.push(name);
            units.push(unit);
            columns.push(column);
        }

        let rows = parse_rows(path, &raw_rows, delimiter, tokens.len())?;
        let data: ReducedData = field_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), column_series(&rows, i)))
            .collect();
        Ok((build_metadata(&field_names, &units, &columns), data))
    }

    /// Histogram variant: the first two columns are step index and time, the
    /// rest are bins named `b<idx>` with a numeric bin center each. Returns
    /// the ordered centers and the bin block as a rows-by-bins matrix.
    pub fn read_reduced_diags_histogram(
        path: &Path,
        delimiter: Option<&str>,
    ) -> Result<(ReducedMetadata, ReducedData, Array1<f64>, Array2<f64>), PltError> {
        let text = std::fs::read_to_string(path).map_err(|e| PltError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let (header, raw_rows) = header_and_rows(path, &text)?;
        let tokens = split_tokens(header, delimiter);
        if tokens.len() < 2 {
            return Err(format_err(path, "histogram header needs step and time columns"));
        }

        let mut field_names = Vec::with_capacity(tokens.len());
        let mut units = Vec::with_capacity(tokens.len());
        let mut columns = Vec::with_capacity(tokens.len());
        let mut centers = Vec::with_capacity(tokens.len().saturating_sub(2));
        for (i, token) in tokens.iter().enumerate() {
            let (column, name, unit) = split_token(path, token)?;
            let name = if i < 2 {
                name
            } else {
                let (bin_name, center) = split_bin_token(path, &name)?;
                centers.push(center);
                bin_name
            };
            field_names.push(name);
            units.push(unit);
            columns.push(column);
        }

        let rows = parse_rows(path, &raw_rows, delimiter, tokens.len())?;
        let data: ReducedData = field_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), column_series(&rows, i)))
            .collect();

        let nbins = centers.len();
        let bin_values =
            Array2::from_shape_fn((rows.len(), nbins), |(r, c)| rows[r][c + 2]);
        let bin_centers = Array1::from_vec(centers);
        Ok((
            build_metadata(&field_names, &units, &columns),
            data,
            bin_centers,
            bin_values,
        ))
    }
}

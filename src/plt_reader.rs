#[allow(dead_code)]
pub mod plt_reader {
    use bytemuck::cast_slice_mut;
    use memmap2::Mmap;
    use ndarray::{ArrayD, IxDyn, ShapeBuilder, SliceInfoElem};
    use num_traits::{NumCast, Zero};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    const FAB_ON_DISK: &str = "FabOnDisk:";
    const F64_BYTES: usize = std::mem::size_of::<f64>();

    #[derive(Debug, Error)]
    pub enum PltError {
        #[error("malformed header {}: {reason}", .path.display())]
        Format { path: PathBuf, reason: String },

        #[error("cannot access {}", .path.display())]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },

        #[error("truncated payload in {}: expected {expected} f64 words, found {found}", .path.display())]
        Truncated {
            path: PathBuf,
            expected: usize,
            found: usize,
        },
    }

    impl PltError {
        fn format(path: &Path, reason: impl Into<String>) -> Self {
            PltError::Format {
                path: path.to_path_buf(),
                reason: reason.into(),
            }
        }

        fn io(path: &Path, source: std::io::Error) -> Self {
            PltError::Io {
                path: path.to_path_buf(),
                source,
            }
        }

        pub fn kind(&self) -> &'static str {
            match self {
                PltError::Format { .. } => "format",
                PltError::Io { .. } => "io",
                PltError::Truncated { .. } => "truncated",
            }
        }
    }

    /// One rectangular sub-block of the decomposed domain, inclusive index
    /// range per axis, already expanded by the field's ghost cells.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RawBox {
        pub lo: Vec<i64>,
        pub hi: Vec<i64>,
        pub node_type: Vec<i64>,
    }

    impl RawBox {
        pub fn ndim(&self) -> usize {
            self.lo.len()
        }

        pub fn shape(&self) -> Vec<usize> {
            self.lo
                .iter()
                .zip(&self.hi)
                .map(|(l, h)| (h - l + 1) as usize)
                .collect()
        }

        pub fn cells(&self) -> usize {
            self.shape().iter().product()
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct HeaderInfo {
        pub version: u32,
        pub storage_mode: u32,
        pub ncomp: usize,
        /// As written in the header: one entry broadcast to all axes, or one
        /// entry per axis.
        pub nghost: Vec<i64>,
    }

    /// Where one box's payload lives: file named relative to the level
    /// directory, byte offset of the fab record.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FabOnDisk {
        pub file_name: String,
        pub offset: u64,
    }

    /// Parses a field header file into ghost-expanded boxes, their on-disk
    /// locations and the header metadata. Boxes and FabOnDisk records
    /// correlate positionally; their counts are checked here, not by callers.
    pub fn parse_header(
        path: &Path,
    ) -> Result<(Vec<RawBox>, Vec<FabOnDisk>, HeaderInfo), PltError> {
        let text = std::fs::read_to_string(path).map_err(|e| PltError::io(path, e))?;
        let mut lines = text.lines();

        let version = next_int(path, &mut lines, "version")?;
        let storage_mode = next_int(path, &mut lines, "storage mode")?;
        let ncomp = next_int(path, &mut lines, "component count")? as usize;
        if ncomp == 0 {
            return Err(PltError::format(path, "component count is zero"));
        }
        let ghost_line = lines
            .next()
            .ok_or_else(|| PltError::format(path, "missing ghost cell line"))?;
        let nghost = parse_ghost(path, ghost_line)?;

        // One reserved line opens the box list.
        lines
            .next()
            .ok_or_else(|| PltError::format(path, "missing box list"))?;

        let mut boxes: Vec<RawBox> = Vec::new();
        let mut closed = false;
        for line in lines.by_ref() {
            let line = line.trim();
            if line == ")" {
                closed = true;
                break;
            }
            if line.is_empty() {
                continue;
            }
            let bx = parse_box_record(path, line, &nghost)?;
            if let Some(first) = boxes.first() {
                if bx.ndim() != first.ndim() {
                    return Err(PltError::format(path, "mixed box dimensionality"));
                }
            }
            boxes.push(bx);
        }
        if !closed {
            return Err(PltError::format(path, "box list never closed with ')'"));
        }
        if boxes.is_empty() {
            return Err(PltError::format(path, "header describes no boxes"));
        }

        let mut fabs: Vec<FabOnDisk> = Vec::new();
        for line in lines {
            if let Some(rest) = line.trim().strip_prefix(FAB_ON_DISK) {
                fabs.push(parse_fab_record(path, rest)?);
            }
        }
        if fabs.len() != boxes.len() {
            return Err(PltError::format(
                path,
                format!(
                    "{} boxes but {} FabOnDisk entries",
                    boxes.len(),
                    fabs.len()
                ),
            ));
        }

        let header = HeaderInfo {
            version,
            storage_mode,
            ncomp,
            nghost,
        };
        Ok((boxes, fabs, header))
    }

    fn next_int(
        path: &Path,
        lines: &mut std::str::Lines<'_>,
        what: &str,
    ) -> Result<u32, PltError> {
        let line = lines
            .next()
            .ok_or_else(|| PltError::format(path, format!("missing {what} line")))?;
        line.trim()
            .parse::<u32>()
            .map_err(|_| PltError::format(path, format!("bad {what} line {line:?}")))
    }

    // The ghost line is either a bare scalar or a parenthesized per-axis
    // tuple like `(9,8,9)`.
    fn parse_ghost(path: &Path, line: &str) -> Result<Vec<i64>, PltError> {
        let stripped: String = line
            .trim()
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .collect();
        stripped
            .split(',')
            .map(|t| t.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PltError::format(path, format!("bad ghost cell line {line:?}")))
    }

    fn ghost_at(nghost: &[i64], axis: usize) -> i64 {
        if nghost.len() == 1 {
            nghost[0]
        } else {
            nghost[axis]
        }
    }

    fn parse_tuple(path: &Path, token: &str) -> Result<Vec<i64>, PltError> {
        let inner = token
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| PltError::format(path, format!("bad index tuple {token:?}")))?;
        inner
            .split(',')
            .map(|t| t.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PltError::format(path, format!("bad index tuple {token:?}")))
    }

    // A record reads `((lo) (hi) (node_type))`; the list parens ride on the
    // first and last token.
    fn parse_box_record(path: &Path, line: &str, nghost: &[i64]) -> Result<RawBox, PltError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(PltError::format(path, format!("bad box record {line:?}")));
        }
        let first = tokens[0]
            .strip_prefix('(')
            .ok_or_else(|| PltError::format(path, format!("bad box record {line:?}")))?;
        let last = tokens[2]
            .strip_suffix(')')
            .ok_or_else(|| PltError::format(path, format!("bad box record {line:?}")))?;

        let lo = parse_tuple(path, first)?;
        let hi = parse_tuple(path, tokens[1])?;
        let node_type = parse_tuple(path, last)?;
        if lo.len() != hi.len() || lo.len() != node_type.len() {
            return Err(PltError::format(path, format!("bad box record {line:?}")));
        }
        if nghost.len() != 1 && nghost.len() != lo.len() {
            return Err(PltError::format(
                path,
                format!(
                    "{} ghost entries for a {}-dimensional box",
                    nghost.len(),
                    lo.len()
                ),
            ));
        }

        let lo = lo
            .iter()
            .enumerate()
            .map(|(axis, v)| v - ghost_at(nghost, axis))
            .collect();
        let hi = hi
            .iter()
            .enumerate()
            .map(|(axis, v)| v + ghost_at(nghost, axis))
            .collect();
        Ok(RawBox { lo, hi, node_type })
    }

    fn parse_fab_record(path: &Path, rest: &str) -> Result<FabOnDisk, PltError> {
        let mut it = rest.split_whitespace();
        let (Some(file_name), Some(offset)) = (it.next(), it.next()) else {
            return Err(PltError::format(path, format!("bad FabOnDisk record {rest:?}")));
        };
        let offset = offset
            .parse::<u64>()
            .map_err(|_| PltError::format(path, format!("bad FabOnDisk offset {offset:?}")))?;
        Ok(FabOnDisk {
            file_name: file_name.to_string(),
            offset,
        })
    }

    /// Bounding domain over all boxes, elementwise min of los and max of his.
    /// The union need not tile it; uncovered cells stay zero after assembly.
    pub fn combine_boxes(boxes: &[RawBox]) -> (Vec<i64>, Vec<i64>) {
        assert!(!boxes.is_empty());
        let mut lo = boxes[0].lo.clone();
        let mut hi = boxes[0].hi.clone();
        for b in &boxes[1..] {
            for (axis, v) in b.lo.iter().enumerate() {
                lo[axis] = lo[axis].min(*v);
            }
            for (axis, v) in b.hi.iter().enumerate() {
                hi[axis] = hi[axis].max(*v);
            }
        }
        (lo, hi)
    }

    fn domain_shape(dom_lo: &[i64], dom_hi: &[i64]) -> Vec<usize> {
        dom_hi
            .iter()
            .zip(dom_lo)
            .map(|(h, l)| (h - l + 1) as usize)
            .collect()
    }

    fn placement(bx: &RawBox, dom_lo: &[i64], ncomp: usize) -> Vec<SliceInfoElem> {
        let mut out = Vec::with_capacity(bx.ndim() + 1);
        for axis in 0..bx.ndim() {
            let start = (bx.lo[axis] - dom_lo[axis]) as isize;
            let end = (bx.hi[axis] - dom_lo[axis] + 1) as isize;
            out.push(SliceInfoElem::Slice {
                start,
                end: Some(end),
                step: 1,
            });
        }
        if ncomp > 1 {
            out.push(SliceInfoElem::Slice {
                start: 0,
                end: None,
                step: 1,
            });
        }
        out
    }

    // Maps the payload file, skips the version-1 text line if present and
    // copies exactly `nwords` f64 words. The map lives only for this call.
    fn read_fab_words(
        level_dir: &Path,
        fab: &FabOnDisk,
        nwords: usize,
        version: u32,
    ) -> Result<Vec<f64>, PltError> {
        let path = level_dir.join(&fab.file_name);
        let file = std::fs::File::open(&path).map_err(|e| PltError::io(&path, e))?;
        let map = unsafe { Mmap::map(&file) }.map_err(|e| PltError::io(&path, e))?;

        let mut start = fab.offset as usize;
        if start > map.len() {
            return Err(PltError::Truncated {
                path,
                expected: nwords,
                found: 0,
            });
        }
        if version == 1 {
            match map[start..].iter().position(|&b| b == b'\n') {
                Some(pos) => start += pos + 1,
                None => {
                    return Err(PltError::Truncated {
                        path,
                        expected: nwords,
                        found: 0,
                    })
                }
            }
        }

        let nbytes = nwords * F64_BYTES;
        if start + nbytes > map.len() {
            return Err(PltError::Truncated {
                path,
                expected: nwords,
                found: (map.len() - start) / F64_BYTES,
            });
        }
        let mut words = vec![0.0f64; nwords];
        cast_slice_mut::<f64, u8>(&mut words).copy_from_slice(&map[start..start + nbytes]);
        Ok(words)
    }

    /// Assembles one field from parsed boxes into a dense zero-initialized
    /// domain array, component axis trailing iff `ncomp > 1`. Payloads are
    /// column major on disk; each block is reinterpreted with F-order strides
    /// and copied into its placement slice, never transposed through an
    /// intermediate.
    pub fn assemble(
        level_dir: &Path,
        boxes: &[RawBox],
        fabs: &[FabOnDisk],
        header: &HeaderInfo,
    ) -> Result<ArrayD<f64>, PltError> {
        assert_eq!(boxes.len(), fabs.len());
        let (dom_lo, dom_hi) = combine_boxes(boxes);
        let mut shape = domain_shape(&dom_lo, &dom_hi);
        if header.ncomp > 1 {
            shape.push(header.ncomp);
        }
        let mut data = ArrayD::<f64>::zeros(IxDyn(&shape));

        for (bx, fab) in boxes.iter().zip(fabs) {
            let words = read_fab_words(level_dir, fab, bx.cells() * header.ncomp, header.version)?;
            let mut local = bx.shape();
            if header.ncomp > 1 {
                local.push(header.ncomp);
            }
            let block = ArrayD::from_shape_vec(IxDyn(&local).f(), words).unwrap();
            log::debug!(
                "placed {}x{} words from {} at offset {}",
                bx.cells(),
                header.ncomp,
                fab.file_name,
                fab.offset
            );
            data.slice_mut(placement(bx, &dom_lo, header.ncomp).as_slice())
                .assign(&block);
        }
        Ok(data)
    }

    /// Reads one field of a level directory: `<field>_H` header plus the
    /// payload files it references.
    pub fn read_field(level_dir: &Path, field: &str) -> Result<ArrayD<f64>, PltError> {
        let header_path = level_dir.join(format!("{field}_H"));
        let (boxes, fabs, header) = parse_header(&header_path)?;
        assemble(level_dir, &boxes, &fabs, &header)
    }

    /// Same as [`read_field`] but casts into a narrower element type, for
    /// consumers that trade precision for memory. Disk words are always f64.
    pub fn read_field_as<T>(level_dir: &Path, field: &str) -> Result<ArrayD<T>, PltError>
    where
        T: Copy + Zero + NumCast,
    {
        Ok(read_field(level_dir, field)?.mapv(|v| T::from(v).unwrap_or_else(T::zero)))
    }

    /// Splits a multi-component fab into one named domain array per
    /// component. The payload stores components planar-wise, all words of
    /// component 0 first, so each plane reshapes independently.
    pub fn read_buffer(
        header_path: &Path,
        payload_dir: &Path,
        component_names: &[&str],
    ) -> Result<BTreeMap<String, ArrayD<f64>>, PltError> {
        let (boxes, fabs, header) = parse_header(header_path)?;
        if component_names.len() != header.ncomp {
            return Err(PltError::format(
                header_path,
                format!(
                    "{} component names for {} components",
                    component_names.len(),
                    header.ncomp
                ),
            ));
        }
        let (dom_lo, dom_hi) = combine_boxes(&boxes);
        let shape = domain_shape(&dom_lo, &dom_hi);
        let mut out: BTreeMap<String, ArrayD<f64>> = component_names
            .iter()
            .map(|n| (n.to_string(), ArrayD::zeros(IxDyn(&shape))))
            .collect();

        for (bx, fab) in boxes.iter().zip(&fabs) {
            let size = bx.cells();
            let words = read_fab_words(payload_dir, fab, size * header.ncomp, header.version)?;
            let slice_elems = placement(bx, &dom_lo, 1);
            for (comp, name) in component_names.iter().enumerate() {
                let plane = words[comp * size..(comp + 1) * size].to_vec();
                let block = ArrayD::from_shape_vec(IxDyn(&bx.shape()).f(), plane).unwrap();
                out.get_mut(*name)
                    .unwrap()
                    .slice_mut(slice_elems.as_slice())
                    .assign(&block);
            }
        }
        Ok(out)
    }
}

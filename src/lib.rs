pub mod plt_reader;
pub mod plt_scan;
pub mod reduced;

pub use crate::plt_reader::plt_reader::{
    assemble, combine_boxes, parse_header, read_buffer, read_field, read_field_as, FabOnDisk,
    HeaderInfo, PltError, RawBox,
};
pub use crate::plt_scan::plt_scan::{
    list_fields, list_levels, read_data, read_global_header, read_local_header, scan_dataset,
    scan_level, LevelScan, SnapshotGlobalHeader, SnapshotLocalHeader,
};
pub use crate::reduced::reduced::{
    read_reduced_diags, read_reduced_diags_histogram, ReducedData, ReducedMetadata,
};

mod plt_reader;
mod plt_scan;
mod reduced;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use plt_reader::plt_reader::read_field;
use plt_scan::plt_scan::{list_fields, list_levels};
use rayon::prelude::*;
use reduced::reduced::{read_reduced_diags, read_reduced_diags_histogram};
use std::path::{Path, PathBuf};

/// Simple CLI tool for inspecting raw plotfile dumps
#[derive(Parser, Debug)]
#[command(
    name = "pltdump",
    version,
    about = "Lists and assembles raw fields from plotfile dumps"
)]
struct Args {
    /// Path to a dataset (plotfile root or raw_fields directory), or a
    /// reduced diagnostics file with -r
    #[arg()]
    input: String,

    /// Prints levels and their fields
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Assembles every field of every level and reports per-field status
    #[arg(short = 's', long = "scan")]
    scan: bool,

    /// Assembles one field and prints shape and min/max
    #[arg(short = 'f', long = "field")]
    field: Option<String>,

    /// Level index used with --field
    #[arg(long = "level", default_value_t = 0)]
    level: usize,

    /// Writes the assembled field to a .npy file
    #[arg(long = "npy")]
    npy: Option<PathBuf>,

    /// Treats the input as a reduced diagnostics file
    #[arg(short = 'r', long = "reduced")]
    reduced: bool,

    /// With --reduced, parse the histogram variant
    #[arg(long = "histogram")]
    histogram: bool,

    /// Delimiter for reduced files; default splits on whitespace
    #[arg(long = "delimiter")]
    delimiter: Option<String>,
}

fn resolve_root(dataset: &Path) -> PathBuf {
    let raw = dataset.join("raw_fields");
    if raw.is_dir() {
        raw
    } else {
        dataset.to_path_buf()
    }
}

fn print_listing(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    for (index, dir) in list_levels(root)? {
        let fields = list_fields(&dir)?;
        println!("Level {index}: {} fields", fields.len());
        print!("[");
        for field in &fields {
            print!("{}, ", field);
        }
        println!("]");
    }
    Ok(())
}

fn scan_all(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    for (index, dir) in list_levels(root)? {
        let names = list_fields(&dir)?;
        let pb = ProgressBar::new(names.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("##-"),
        );
        let results: Vec<_> = names
            .par_iter()
            .map(|name| {
                let result = read_field(&dir, name);
                pb.inc(1);
                (name.clone(), result)
            })
            .collect();
        pb.finish_and_clear();
        for (name, result) in results {
            match result {
                Ok(arr) => println!("Level {index} {name}: shape {:?}", arr.shape()),
                Err(e) => eprintln!("Level {index} {name}: FAILED ({e})"),
            }
        }
    }
    Ok(())
}

fn print_field(
    root: &Path,
    level: usize,
    field: &str,
    npy: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, dir) = list_levels(root)?
        .into_iter()
        .find(|(index, _)| *index == level)
        .ok_or_else(|| format!("Level_{level} not found in {}", root.display()))?;
    let arr = read_field(&dir, field)?;
    let max = arr.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let min = arr.fold(f64::INFINITY, |a, &b| a.min(b));
    println!("{field}: shape {:?} min {min:.6e} max {max:.6e}", arr.shape());
    if let Some(out) = npy {
        ndarray_npy::write_npy(out, &arr)?;
        println!("wrote {}", out.display());
    }
    Ok(())
}

fn print_reduced(
    path: &Path,
    histogram: bool,
    delimiter: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if histogram {
        let (meta, _data, centers, values) = read_reduced_diags_histogram(path, delimiter)?;
        println!(
            "{} fields, {} rows, {} bins",
            meta.field_names.len(),
            values.nrows(),
            centers.len()
        );
        println!("bin centers: {:?}", centers.to_vec());
    } else {
        let (meta, data) = read_reduced_diags(path, delimiter)?;
        let rows = data.values().next().map_or(0, |s| s.len());
        println!("{} fields, {rows} rows", meta.field_names.len());
        for name in &meta.field_names {
            println!("  [{}] {name} ({})", meta.columns[name], meta.units[name]);
        }
    }
    Ok(())
}

fn main() -> Result<std::process::ExitCode, std::process::ExitCode> {
    env_logger::init();
    let args = Args::parse();

    if !args.list && !args.scan && !args.reduced && args.field.is_none() {
        eprintln!("Error: At least one of -l, -s, -f or -r must be specified.");
        return Err(std::process::ExitCode::FAILURE);
    }

    if args.reduced {
        if let Err(e) = print_reduced(
            Path::new(&args.input),
            args.histogram,
            args.delimiter.as_deref(),
        ) {
            eprintln!("Failed to read reduced diagnostics: {e}");
            return Err(std::process::ExitCode::FAILURE);
        }
        return Ok(std::process::ExitCode::SUCCESS);
    }

    let root = resolve_root(Path::new(&args.input));

    if args.list {
        if let Err(e) = print_listing(&root) {
            eprintln!("Failed to list dataset: {e}");
            return Err(std::process::ExitCode::FAILURE);
        }
    }

    if args.scan {
        if let Err(e) = scan_all(&root) {
            eprintln!("Failed to scan dataset: {e}");
            return Err(std::process::ExitCode::FAILURE);
        }
    }

    if let Some(field) = &args.field {
        if let Err(e) = print_field(&root, args.level, field, args.npy.as_deref()) {
            eprintln!("Failed to read field: {e}");
            return Err(std::process::ExitCode::FAILURE);
        }
    }

    Ok(std::process::ExitCode::SUCCESS)
}

use anyhow::{self, Context};

use rust_htslib::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn is_gzipped(file_name: &str) -> bool {
    matches!(
        Path::new(file_name).extension().and_then(|x| x.to_str()),
        Some("gz") | Some("bgz")
    )
}

/// Open a plain or (b)gzip-compressed text file for buffered reading
///
pub fn open_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let buf: Box<dyn BufRead> = if is_gzipped(input_file) {
        let _file = bgzf::Reader::from_path(input_file)
            .with_context(|| format!("failed to open {}", input_file))?;
        Box::new(BufReader::new(_file))
    } else {
        let _file =
            File::open(input_file).with_context(|| format!("failed to open {}", input_file))?;
        Box::new(BufReader::new(_file))
    };
    Ok(buf)
}

///
/// Read every line of the input_file into memory
///
pub fn read_lines(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let mut lines = vec![];
    for x in open_reader(input_file)?.lines() {
        lines.push(x?.into_boxed_str());
    }
    Ok(lines)
}

///
/// Create an output file; `.gz` names are written bgzf compressed
///
pub fn open_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    let buf: Box<dyn Write> = if is_gzipped(output_file) {
        let _file = bgzf::Writer::from_path(output_file)
            .with_context(|| format!("failed to create {}", output_file))?;
        Box::new(BufWriter::new(_file))
    } else {
        let _file = File::create(output_file)
            .with_context(|| format!("failed to create {}", output_file))?;
        Box::new(BufWriter::new(_file))
    };
    Ok(buf)
}

/// Probabilities in fixed notation unless too small to show
pub fn format_prob(p: f64) -> String {
    if p == 0. || p >= 1e-4 {
        format!("{:.6}", p)
    } else {
        format!("{:.6e}", p)
    }
}

/// Ratios with four decimals, switching to scientific notation once
/// that would hide the leading digit
pub fn format_ratio(x: f64) -> String {
    if x == 0. || x.abs() >= 1e-3 {
        format!("{:.4}", x)
    } else {
        format!("{:.4e}", x)
    }
}

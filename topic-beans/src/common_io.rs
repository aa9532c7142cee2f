use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
///
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match extension_of(input_file) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not, or `stdout`
///
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = File::create(output_file)?;
    match extension_of(output_file) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

fn extension_of(file: &str) -> Option<&str> {
    Path::new(file).extension().and_then(|x| x.to_str())
}

/// Field delimiter of a table file, decided by its (inner) extension:
/// `.tsv`, `.txt`, `.gct` (optionally `.gz`) are tab-separated,
/// anything else comma-separated. GCT files have their own reader in
/// [`crate::gct`].
pub fn delimiter_for(file: &str) -> char {
    let inner = file.strip_suffix(".gz").unwrap_or(file);
    match extension_of(inner) {
        Some("tsv") | Some("txt") | Some("gct") => '\t',
        _ => ',',
    }
}

pub struct DelimitedLines {
    pub header: Vec<Box<str>>,
    pub lines: Vec<Vec<Box<str>>>,
}

///
/// Read a delimited file with one header line. Blank lines and
/// lines starting with `#` are skipped. Fields are trimmed.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - field delimiter
///
pub fn read_delimited_lines(input_file: &str, delim: char) -> anyhow::Result<DelimitedLines> {
    let buf = open_buf_reader(input_file)?;

    let mut raw = vec![];
    for line in buf.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        raw.push(line.into_boxed_str());
    }

    if raw.is_empty() {
        return Err(anyhow::anyhow!("no header line in {}", input_file));
    }

    let split = |s: &str| -> Vec<Box<str>> {
        s.split(delim)
            .map(|x| x.trim().trim_matches('"').to_owned().into_boxed_str())
            .collect()
    };

    let header = split(&raw[0][..]);

    // collect() on an indexed parallel iterator keeps the line order
    let lines = raw[1..].par_iter().map(|s| split(&s[..])).collect();

    Ok(DelimitedLines { header, lines })
}

/// Parse one numeric cell. Empty cells and `NA`/`NaN` become `NaN`,
/// i.e. a missing value.
pub fn parse_value(cell: &str) -> anyhow::Result<f32> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Ok(f32::NAN);
    }
    cell.parse::<f32>()
        .map_err(|e| anyhow::anyhow!("failed to parse `{}` as a number: {}", cell, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_by_extension() {
        assert_eq!(delimiter_for("a/b/topic_Z.csv"), ',');
        assert_eq!(delimiter_for("a/b/topic_Z.csv.gz"), ',');
        assert_eq!(delimiter_for("cpm.tsv.gz"), '\t');
        assert_eq!(delimiter_for("cpm.gct"), '\t');
    }

    #[test]
    fn missing_cells_are_nan() -> anyhow::Result<()> {
        assert!(parse_value("")?.is_nan());
        assert!(parse_value("NA")?.is_nan());
        assert_eq!(parse_value("-1.5")?, -1.5);
        assert!(parse_value("x1").is_err());
        Ok(())
    }
}

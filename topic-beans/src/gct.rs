//! GCT expression tables (`#1.2` and `#1.3`).
//!
//! ```text
//! #1.3
//! <genes> <samples> <row annotations> <column annotations>
//! id      Description  s1     s2 ...
//! organ   na           liver  liver ...
//! timepoint na         t0     t1 ...
//! Il6     na           1.0    2.0 ...
//! ```
//!
//! Row annotation columns (e.g. `Description`) are dropped. When the
//! column annotations name the organ (or tissue) and timepoint of each
//! sample, samples are renamed `<organ>_<timepoint>_<column>` so they
//! group like the other tables.

use crate::common_io::{open_buf_reader, parse_value};
use crate::tables::{Mat, MatWithNames};
use fnv::FnvHashMap as HashMap;
use log::{info, warn};
use rayon::prelude::*;
use std::io::BufRead;

/// `cpm.gct` or `cpm.gct.gz`
pub fn is_gct(file: &str) -> bool {
    file.strip_suffix(".gz").unwrap_or(file).ends_with(".gct")
}

fn next_line<I>(lines: &mut I, file: &str, what: &str) -> anyhow::Result<String>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    Ok(lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("{}: missing {} line", file, what))??)
}

fn split_tabs(line: &str) -> Vec<Box<str>> {
    line.trim_end_matches(['\r', '\n'])
        .split('\t')
        .map(|x| x.trim().trim_matches('"').into())
        .collect()
}

///
/// Read a GCT file into a gene × sample matrix.
///
/// * `file` - file name--either gzipped or not
///
pub fn read_gct(file: &str) -> anyhow::Result<MatWithNames> {
    let mut lines = open_buf_reader(file)?.lines();

    let version = next_line(&mut lines, file, "version")?;
    let dims = next_line(&mut lines, file, "dimension")?;
    let dims = dims
        .split_whitespace()
        .map(|x| {
            x.parse::<usize>()
                .map_err(|e| anyhow::anyhow!("{}: bad dimension `{}`: {}", file, x, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let (n_row_meta, n_col_meta) = match (version.trim(), dims.len()) {
        ("#1.2", 2) => (1, 0),
        ("#1.3", 4) => (dims[2], dims[3]),
        (v, n) => {
            return Err(anyhow::anyhow!(
                "{}: unsupported GCT version `{}` with {} dimensions",
                file,
                v,
                n
            ))
        }
    };
    let (n_genes, n_samples) = (dims[0], dims[1]);
    let skip = 1 + n_row_meta;

    let header = split_tabs(&next_line(&mut lines, file, "header")?);
    if header.len() != skip + n_samples {
        return Err(anyhow::anyhow!(
            "{}: header has {} fields, expected {}",
            file,
            header.len(),
            skip + n_samples
        ));
    }

    let mut annotations: HashMap<Box<str>, Vec<Box<str>>> = HashMap::default();
    for _ in 0..n_col_meta {
        let words = split_tabs(&next_line(&mut lines, file, "column annotation")?);
        if words.len() != skip + n_samples {
            return Err(anyhow::anyhow!(
                "{}: annotation `{}` has {} fields, expected {}",
                file,
                words[0],
                words.len(),
                skip + n_samples
            ));
        }
        annotations.insert(words[0].to_lowercase().into(), words[skip..].to_vec());
    }

    let organ = annotations
        .get("organ")
        .or_else(|| annotations.get("tissue"));
    let samples: Vec<Box<str>> = match (organ, annotations.get("timepoint")) {
        (Some(organ), Some(time)) => organ
            .iter()
            .zip(time)
            .enumerate()
            .map(|(j, (o, t))| format!("{}_{}_{}", o, t, j).into_boxed_str())
            .collect(),
        _ => header[skip..].to_vec(),
    };

    let raw = lines
        .filter(|l| !matches!(l, Ok(x) if x.trim().is_empty()))
        .collect::<std::io::Result<Vec<String>>>()?;

    let rows = raw
        .par_iter()
        .enumerate()
        .map(|(i, line)| -> anyhow::Result<(Box<str>, Vec<f32>)> {
            let words = split_tabs(line);
            if words.len() != skip + n_samples {
                return Err(anyhow::anyhow!(
                    "{}: gene row {} has {} fields, expected {}",
                    file,
                    i + 1,
                    words.len(),
                    skip + n_samples
                ));
            }
            let values = words[skip..]
                .iter()
                .map(|w| parse_value(w))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok((words[0].clone(), values))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if rows.len() != n_genes {
        warn!(
            "{}: {} gene rows, but the dimension line says {}",
            file,
            rows.len(),
            n_genes
        );
    }

    info!("Read {} x {} GCT matrix from {}", rows.len(), n_samples, file);

    let nrows = rows.len();
    let mut genes = Vec::with_capacity(nrows);
    let mut values = Vec::with_capacity(nrows * n_samples);
    for (gene, row) in rows {
        genes.push(gene);
        values.extend(row);
    }

    Ok(MatWithNames {
        rows: genes,
        cols: samples,
        mat: Mat::from_row_iterator(nrows, n_samples, values),
    })
}

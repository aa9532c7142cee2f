use crate::common_io::{delimiter_for, parse_value, read_delimited_lines};
use crate::gct::{is_gct, read_gct};
use fnv::FnvHashMap as HashMap;

pub type Mat = nalgebra::DMatrix<f32>;

/// A dense matrix with row and column names
pub struct MatWithNames {
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
    pub mat: Mat,
}

/// A dense matrix whose rows are identified by several key columns,
/// e.g. (`gene`, `tissue`) in the intra-tissue Z-score table.
pub struct KeyedTable {
    pub keys: Vec<Vec<Box<str>>>,
    pub cols: Vec<Box<str>>,
    pub mat: Mat,
}

///
/// Read a delimited table whose first `n_keys` columns identify a row
/// and the remaining columns hold numbers.
///
/// * `file` - file name--either gzipped or not
/// * `n_keys` - number of leading key columns (at least 1)
///
pub fn read_keyed_table(file: &str, n_keys: usize) -> anyhow::Result<KeyedTable> {
    if n_keys == 0 {
        return Err(anyhow::anyhow!("need at least one key column"));
    }

    let data = read_delimited_lines(file, delimiter_for(file))?;

    if data.header.len() <= n_keys {
        return Err(anyhow::anyhow!(
            "{}: expected {} key column(s) followed by value columns",
            file,
            n_keys
        ));
    }

    let cols: Vec<Box<str>> = data.header[n_keys..].to_vec();
    let ncols = cols.len();
    let nrows = data.lines.len();

    let mut keys = Vec::with_capacity(nrows);
    let mut values = Vec::with_capacity(nrows * ncols);

    for (i, words) in data.lines.into_iter().enumerate() {
        if words.len() != n_keys + ncols {
            return Err(anyhow::anyhow!(
                "{}: line {} has {} fields, expected {}",
                file,
                i + 2,
                words.len(),
                n_keys + ncols
            ));
        }
        for w in &words[n_keys..] {
            values.push(parse_value(w)?);
        }
        keys.push(words[..n_keys].to_vec());
    }

    Ok(KeyedTable {
        keys,
        cols,
        mat: Mat::from_row_iterator(nrows, ncols, values),
    })
}

///
/// Read a delimited table with row names in the first column and
/// column names in the header line. GCT files are read with
/// [`read_gct`].
///
pub fn read_named_matrix(file: &str) -> anyhow::Result<MatWithNames> {
    if is_gct(file) {
        return read_gct(file);
    }
    let KeyedTable { keys, cols, mat } = read_keyed_table(file, 1)?;
    let rows = keys.into_iter().filter_map(|k| k.into_iter().next()).collect();
    Ok(MatWithNames { rows, cols, mat })
}

/// Row name -> row index
pub fn name_index(names: &[Box<str>]) -> HashMap<&str, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, x)| (x.as_ref(), i))
        .collect()
}

fn lookup(index: &HashMap<&str, usize>, x: &str, what: &str) -> anyhow::Result<usize> {
    index
        .get(x)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("{} `{}` is missing", what, x))
}

impl MatWithNames {
    ///
    /// Rearrange rows and columns to follow `rows` and `cols`. Every
    /// target name must be present and no source row may be left out.
    ///
    pub fn aligned_to(&self, rows: &[Box<str>], cols: &[Box<str>]) -> anyhow::Result<Mat> {
        if self.rows.len() != rows.len() || self.cols.len() != cols.len() {
            return Err(anyhow::anyhow!(
                "{} x {} found, but {} x {} expected",
                self.rows.len(),
                self.cols.len(),
                rows.len(),
                cols.len()
            ));
        }

        let row_index = name_index(&self.rows);
        let col_index = name_index(&self.cols);

        let src_rows = rows
            .iter()
            .map(|r| lookup(&row_index, &r[..], "row"))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let src_cols = cols
            .iter()
            .map(|c| lookup(&col_index, &c[..], "column"))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Mat::from_fn(rows.len(), cols.len(), |i, j| {
            self.mat[(src_rows[i], src_cols[j])]
        }))
    }
}

//! Read the dashboard tables from disk and assemble a [`DataStore`].
//!
//! Samples are named `<tissue>_<timepoint>_<replicate>`; replicates
//! are averaged per (tissue, timepoint).

use crate::labels::order_labels;
use crate::store::{DataStore, DataStoreBuilder};
use crate::tables::*;
use fnv::FnvHashMap as HashMap;
use log::{info, warn};

/// Input files of one viewer configuration
#[derive(Debug, Clone, Default)]
pub struct TableFiles {
    /// sample × topic proportions
    pub topics: Box<str>,
    /// gene × sample expression (e.g. CPM)
    pub counts: Box<str>,
    /// gene × topic dataset-wide Z-scores
    pub global_z: Option<Box<str>>,
    /// (gene, tissue) × topic intra-tissue Z-scores
    pub tissue_z: Option<Box<str>>,
    /// gene × topic beta coefficients
    pub beta: Option<Box<str>>,
    /// min-max scale each gene's averaged counts into [0, 1]
    pub normalize: bool,
}

/// Split `liver_t12_m3` into (`liver`, `t12`). The tissue may itself
/// contain underscores.
pub fn parse_sample(sample: &str) -> Option<(&str, &str)> {
    let mut parts = sample.rsplitn(3, '_');
    let _replicate = parts.next()?;
    let timepoint = parts.next()?;
    let tissue = parts.next()?;
    if tissue.is_empty() || timepoint.is_empty() {
        return None;
    }
    Some((tissue, timepoint))
}

/// Sample columns grouped by (tissue, timepoint)
pub struct SampleGroups {
    pub tissues: Vec<Box<str>>,
    pub timepoints: Vec<Box<str>>,
    groups: HashMap<(usize, usize), Vec<usize>>,
}

impl SampleGroups {
    pub fn from_samples(samples: &[Box<str>]) -> anyhow::Result<Self> {
        let parsed: Vec<Option<(&str, &str)>> = samples.iter().map(|s| parse_sample(s)).collect();

        for (s, p) in samples.iter().zip(parsed.iter()) {
            if p.is_none() {
                warn!("skipping sample `{}`: not <tissue>_<timepoint>_<replicate>", s);
            }
        }

        let tissues = order_labels(parsed.iter().flatten().map(|&(t, _)| t));
        let timepoints = order_labels(parsed.iter().flatten().map(|&(_, tp)| tp));

        if tissues.is_empty() {
            return Err(anyhow::anyhow!("no sample follows <tissue>_<timepoint>_<replicate>"));
        }

        let tissue_index = name_index(&tissues);
        let time_index = name_index(&timepoints);

        let mut groups: HashMap<(usize, usize), Vec<usize>> = HashMap::default();
        for (j, p) in parsed.iter().enumerate() {
            if let Some((t, tp)) = p {
                groups
                    .entry((tissue_index[t], time_index[tp]))
                    .or_default()
                    .push(j);
            }
        }

        Ok(Self {
            tissues,
            timepoints,
            groups,
        })
    }

    ///
    /// Average the replicate columns of `mat` (feature × sample) within
    /// `tissue`, returning feature × timepoint on `timepoints`. Missing
    /// values are ignored; a timepoint without any value is `NaN`.
    ///
    pub fn average(&self, mat: &Mat, tissue: &str, timepoints: &[Box<str>]) -> anyhow::Result<Mat> {
        let t = self
            .tissues
            .iter()
            .position(|x| x.as_ref() == tissue)
            .ok_or_else(|| anyhow::anyhow!("no sample of tissue `{}`", tissue))?;

        let own_time = name_index(&self.timepoints);

        let mut out = Mat::from_element(mat.nrows(), timepoints.len(), f32::NAN);
        for (j, tp) in timepoints.iter().enumerate() {
            let Some(cols) = own_time
                .get(tp.as_ref())
                .and_then(|&s| self.groups.get(&(t, s)))
            else {
                continue;
            };

            for i in 0..mat.nrows() {
                let (sum, n) = cols
                    .iter()
                    .map(|&c| mat[(i, c)])
                    .filter(|x| !x.is_nan())
                    .fold((0_f32, 0_usize), |(s, n), x| (s + x, n + 1));
                if n > 0 {
                    out[(i, j)] = sum / n as f32;
                }
            }
        }
        Ok(out)
    }
}

/// Scale each gene (row) into [0, 1] jointly over all tissues. A gene
/// with no spread maps to 0; missing values stay missing.
pub fn min_max_normalize(per_tissue: &mut [Mat]) {
    let Some(ngenes) = per_tissue.first().map(|m| m.nrows()) else {
        return;
    };

    for g in 0..ngenes {
        let (lo, hi) = per_tissue
            .iter()
            .flat_map(|m| m.row(g).iter().copied().collect::<Vec<_>>())
            .filter(|x| !x.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });

        let span = hi - lo;
        for m in per_tissue.iter_mut() {
            for x in m.row_mut(g).iter_mut() {
                if x.is_nan() {
                    continue;
                }
                *x = if span > 0.0 { (*x - lo) / span } else { 0.0 };
            }
        }
    }
}

///
/// Load every table named in `files` and build the store.
///
/// Gene order follows the count table; the topic order is taken from
/// the topic proportion table; tissues and timepoints come from the
/// count table's samples.
///
pub fn load_data_store(files: &TableFiles) -> anyhow::Result<DataStore> {
    let has_z = files.global_z.is_some() || files.tissue_z.is_some();
    match (has_z, files.beta.is_some()) {
        (true, true) => {
            return Err(anyhow::anyhow!(
                "Z-score tables and a beta table are mutually exclusive"
            ))
        }
        (false, false) => {
            return Err(anyhow::anyhow!(
                "need either Z-score tables (global and intra-tissue) or a beta table"
            ))
        }
        _ => {}
    }

    // 1. counts: gene × sample -> per tissue gene × timepoint
    let MatWithNames {
        rows: genes,
        cols: count_samples,
        mat: count_mat,
    } = read_named_matrix(&files.counts)?;

    let count_groups = SampleGroups::from_samples(&count_samples)?;
    let tissues = count_groups.tissues.clone();
    let timepoints = count_groups.timepoints.clone();

    info!(
        "Read {} genes x {} samples ({} tissues, {} timepoints) from {}",
        genes.len(),
        count_samples.len(),
        tissues.len(),
        timepoints.len(),
        files.counts
    );

    let mut counts = tissues
        .iter()
        .map(|t| count_groups.average(&count_mat, t, &timepoints))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if files.normalize {
        min_max_normalize(&mut counts);
    }

    // 2. topic proportions: sample × topic -> per tissue timepoint × topic
    let MatWithNames {
        rows: topic_samples,
        cols: topic_cols,
        mat: topic_mat,
    } = read_named_matrix(&files.topics)?;

    let topics = order_labels(topic_cols.iter().map(|x| x.as_ref()));
    if topics.len() != topic_cols.len() {
        return Err(anyhow::anyhow!("duplicate topic columns in {}", files.topics));
    }

    let topic_groups = SampleGroups::from_samples(&topic_samples)?;
    let topic_mat = MatWithNames {
        rows: topic_cols,
        cols: topic_samples,
        mat: topic_mat.transpose(),
    };
    let topic_mat = topic_mat.aligned_to(&topics, &topic_mat.cols)?;

    info!(
        "Read {} topics over {} samples from {}",
        topics.len(),
        topic_mat.ncols(),
        files.topics
    );

    let mut builder =
        DataStoreBuilder::new(genes.clone(), topics.clone(), tissues.clone(), timepoints.clone());

    for (tissue, count) in tissues.iter().zip(counts) {
        let proportion = topic_groups.average(&topic_mat, tissue, &timepoints)?;
        builder = builder
            .normalized_counts(tissue, count)
            .topic_proportions(tissue, proportion.transpose());
    }

    // 3. association statistics on the count table's gene axis
    if let Some(file) = &files.beta {
        let beta = read_named_matrix(file)?;
        builder = builder.beta(beta.aligned_to(&genes, &topics)?);
        info!("Read beta coefficients from {}", file);
    }

    if let Some(file) = &files.global_z {
        let global = read_named_matrix(file)?;
        builder = builder.global_zscores(global.aligned_to(&genes, &topics)?);
        info!("Read global Z-scores from {}", file);
    }

    if let Some(file) = &files.tissue_z {
        for (tissue, table) in split_by_tissue(read_keyed_table(file, 2)?)? {
            builder = builder.intra_tissue_zscores(&tissue, table.aligned_to(&genes, &topics)?);
        }
        info!("Read intra-tissue Z-scores from {}", file);
    }

    let store = builder.build()?;
    info!(
        "Data store ready: {} genes, {} topics, {} tissues, tables: {:?}",
        store.get_genes().len(),
        store.get_topics().len(),
        store.get_tissues().len(),
        store.table_kinds()
    );
    Ok(store)
}

/// (gene, tissue) keyed rows -> one gene × topic matrix per tissue
fn split_by_tissue(table: KeyedTable) -> anyhow::Result<Vec<(Box<str>, MatWithNames)>> {
    let KeyedTable { keys, cols, mat } = table;

    let tissues = order_labels(keys.iter().map(|k| k[1].as_ref()));
    let mut out = vec![];

    for tissue in tissues {
        let rows: Vec<usize> = keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k[1] == tissue)
            .map(|(i, _)| i)
            .collect();

        let genes = rows.iter().map(|&i| keys[i][0].clone()).collect();
        let sub = Mat::from_fn(rows.len(), cols.len(), |i, j| mat[(rows[i], j)]);

        out.push((
            tissue,
            MatWithNames {
                rows: genes,
                cols: cols.clone(),
                mat: sub,
            },
        ));
    }

    if out.is_empty() {
        return Err(anyhow::anyhow!("empty intra-tissue Z-score table"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_names_split_from_the_right() {
        assert_eq!(parse_sample("liver_t3_m1"), Some(("liver", "t3")));
        assert_eq!(
            parse_sample("bone_marrow_t12_m2"),
            Some(("bone_marrow", "t12"))
        );
        assert_eq!(parse_sample("liver_t3"), None);
        assert_eq!(parse_sample("_t3_m1"), None);
    }

    #[test]
    fn replicates_are_averaged() -> anyhow::Result<()> {
        let samples: Vec<Box<str>> = ["lung_t1_a", "lung_t0_a", "lung_t0_b", "gut_t0_a"]
            .iter()
            .map(|&x| x.into())
            .collect();
        let groups = SampleGroups::from_samples(&samples)?;

        let tissues: Vec<&str> = groups.tissues.iter().map(|x| x.as_ref()).collect();
        assert_eq!(tissues, vec!["gut", "lung"]);

        let mat = Mat::from_row_slice(1, 4, &[5.0, 1.0, 3.0, 7.0]);
        let timepoints = groups.timepoints.clone();

        let lung = groups.average(&mat, "lung", &timepoints)?;
        approx::assert_abs_diff_eq!(lung[(0, 0)], 2.0);
        approx::assert_abs_diff_eq!(lung[(0, 1)], 5.0);

        let gut = groups.average(&mat, "gut", &timepoints)?;
        approx::assert_abs_diff_eq!(gut[(0, 0)], 7.0);
        assert!(gut[(0, 1)].is_nan());
        Ok(())
    }

    #[test]
    fn min_max_spans_all_tissues() {
        let mut mats = vec![
            Mat::from_row_slice(2, 2, &[2.0, 4.0, 1.0, 1.0]),
            Mat::from_row_slice(2, 2, &[6.0, f32::NAN, 1.0, 1.0]),
        ];
        min_max_normalize(&mut mats);
        approx::assert_abs_diff_eq!(mats[0][(0, 0)], 0.0);
        approx::assert_abs_diff_eq!(mats[0][(0, 1)], 0.5);
        approx::assert_abs_diff_eq!(mats[1][(0, 0)], 1.0);
        assert!(mats[1][(0, 1)].is_nan());
        approx::assert_abs_diff_eq!(mats[1][(1, 1)], 0.0);
    }
}

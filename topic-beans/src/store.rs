//! Immutable snapshot of every precomputed table the viewer reads.
//!
//! The store is filled once by a loader and never mutated afterwards,
//! so it can be shared between sessions (e.g. behind an `Arc`)
//! without synchronisation.

use crate::error::{Result, ViewerError};
use crate::tables::Mat;
use fnv::FnvHashMap as HashMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which per-gene statistic backs a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Z-score computed across the whole dataset
    Global,
    /// Z-score computed within one tissue
    IntraTissue,
    /// Model coefficient
    Beta,
}

impl TableKind {
    pub fn requires_tissue(&self) -> bool {
        matches!(self, TableKind::IntraTissue)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TableKind::Global => "global",
            TableKind::IntraTissue => "intra_tissue",
            TableKind::Beta => "beta",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TableKind {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "global" | "z" => Ok(TableKind::Global),
            "intra_tissue" | "intra-tissue" | "intra" | "tissue" => Ok(TableKind::IntraTissue),
            "beta" => Ok(TableKind::Beta),
            _ => Err(ViewerError::not_found(format!("table kind `{}`", s))),
        }
    }
}

/// The association statistics of one viewer configuration.
///
/// Matrices are gene × topic on the store's gene and topic axes.
pub enum AssociationTables {
    /// Dataset-wide Z-scores plus one intra-tissue Z-score matrix per
    /// tissue, in the store's tissue order
    ZScore { global: Mat, intra_tissue: Vec<Mat> },
    /// Beta coefficients
    Beta { beta: Mat },
}

impl AssociationTables {
    pub fn kinds(&self) -> &'static [TableKind] {
        match self {
            AssociationTables::ZScore { .. } => &[TableKind::Global, TableKind::IntraTissue],
            AssociationTables::Beta { .. } => &[TableKind::Beta],
        }
    }
}

pub struct DataStore {
    genes: Vec<Box<str>>,
    topics: Vec<Box<str>>,
    tissues: Vec<Box<str>>,
    timepoints: Vec<Box<str>>,
    gene_index: HashMap<Box<str>, usize>,
    topic_index: HashMap<Box<str>, usize>,
    tissue_index: HashMap<Box<str>, usize>,
    stats: AssociationTables,
    /// gene × timepoint, one per tissue
    counts: Vec<Mat>,
    /// timepoint × topic, one per tissue (absent if not loaded)
    proportions: Option<Vec<Mat>>,
}

impl DataStore {
    pub fn get_topics(&self) -> &[Box<str>] {
        &self.topics
    }

    pub fn get_tissues(&self) -> &[Box<str>] {
        &self.tissues
    }

    pub fn get_genes(&self) -> &[Box<str>] {
        &self.genes
    }

    pub fn get_timepoints(&self) -> &[Box<str>] {
        &self.timepoints
    }

    /// Table kinds available in the loaded configuration
    pub fn table_kinds(&self) -> &'static [TableKind] {
        self.stats.kinds()
    }

    pub fn has_table_kind(&self, kind: TableKind) -> bool {
        self.table_kinds().contains(&kind)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topic_index.contains_key(topic)
    }

    pub fn has_tissue(&self, tissue: &str) -> bool {
        self.tissue_index.contains_key(tissue)
    }

    pub fn default_topic(&self) -> &str {
        &self.topics[0]
    }

    pub fn default_tissue(&self) -> &str {
        &self.tissues[0]
    }

    pub fn default_table_kind(&self) -> TableKind {
        self.table_kinds()[0]
    }

    pub fn topic_index(&self, topic: &str) -> Result<usize> {
        self.topic_index
            .get(topic)
            .copied()
            .ok_or_else(|| ViewerError::not_found(format!("topic `{}`", topic)))
    }

    pub fn tissue_index(&self, tissue: &str) -> Result<usize> {
        self.tissue_index
            .get(tissue)
            .copied()
            .ok_or_else(|| ViewerError::not_found(format!("tissue `{}`", tissue)))
    }

    pub fn gene_index(&self, gene: &str) -> Result<usize> {
        self.gene_index
            .get(gene)
            .copied()
            .ok_or_else(|| ViewerError::not_found(format!("gene `{}`", gene)))
    }

    ///
    /// Statistic values of every gene for one topic, in gene-axis order.
    ///
    /// * `kind` - which table
    /// * `topic` - topic label
    /// * `tissue` - required for `IntraTissue`, must be `None` otherwise
    ///
    /// Missing values come back as `NaN`; deciding what that means is
    /// up to the caller.
    pub fn get_statistic(
        &self,
        kind: TableKind,
        topic: &str,
        tissue: Option<&str>,
    ) -> Result<Vec<(&str, f32)>> {
        match (kind.requires_tissue(), tissue) {
            (true, None) => {
                return Err(ViewerError::contract(format!(
                    "{} lookup needs a tissue",
                    kind
                )))
            }
            (false, Some(t)) => {
                return Err(ViewerError::contract(format!(
                    "{} lookup takes no tissue, got `{}`",
                    kind, t
                )))
            }
            _ => {}
        }

        let k = self.topic_index(topic)?;

        let mat = match (&self.stats, kind) {
            (AssociationTables::ZScore { global, .. }, TableKind::Global) => global,
            (AssociationTables::ZScore { intra_tissue, .. }, TableKind::IntraTissue) => {
                let t = self.tissue_index(tissue.unwrap_or_default())?;
                &intra_tissue[t]
            }
            (AssociationTables::Beta { beta }, TableKind::Beta) => beta,
            _ => {
                return Err(ViewerError::not_found(format!(
                    "{} table is not loaded",
                    kind
                )))
            }
        };

        Ok(self
            .genes
            .iter()
            .zip(mat.column(k).iter())
            .map(|(g, &v)| (g.as_ref(), v))
            .collect())
    }

    ///
    /// Normalized expression of `gene` in `tissue` along the timecourse.
    ///
    /// A series with no observed value at all is reported as missing.
    pub fn get_series(&self, gene: &str, tissue: &str) -> Result<Vec<(&str, f32)>> {
        let g = self.gene_index(gene)?;
        let t = self.tissue_index(tissue)?;

        let row = self.counts[t].row(g);
        if row.iter().all(|x| x.is_nan()) {
            return Err(ViewerError::not_found(format!(
                "normalized series of `{}` in `{}`",
                gene, tissue
            )));
        }

        Ok(self
            .timepoints
            .iter()
            .zip(row.iter())
            .map(|(tp, &v)| (tp.as_ref(), v))
            .collect())
    }

    /// Mean proportion of `topic` in `tissue` along the timecourse
    pub fn get_topic_proportions(&self, topic: &str, tissue: &str) -> Result<Vec<(&str, f32)>> {
        let k = self.topic_index(topic)?;
        let t = self.tissue_index(tissue)?;
        let proportions = self
            .proportions
            .as_ref()
            .ok_or_else(|| ViewerError::not_found("topic proportion table"))?;

        Ok(self
            .timepoints
            .iter()
            .zip(proportions[t].column(k).iter())
            .map(|(tp, &v)| (tp.as_ref(), v))
            .collect())
    }
}

/// Collects the tables of a store and checks that they agree
#[derive(Default)]
pub struct DataStoreBuilder {
    genes: Vec<Box<str>>,
    topics: Vec<Box<str>>,
    tissues: Vec<Box<str>>,
    timepoints: Vec<Box<str>>,
    global: Option<Mat>,
    intra_tissue: Vec<(Box<str>, Mat)>,
    beta: Option<Mat>,
    counts: Vec<(Box<str>, Mat)>,
    proportions: Vec<(Box<str>, Mat)>,
}

impl DataStoreBuilder {
    ///
    /// * `genes` - gene axis shared by all statistics and counts
    /// * `topics` - topic axis, in display order
    /// * `tissues` - tissue set, in display order
    /// * `timepoints` - timecourse, in temporal order
    ///
    pub fn new(
        genes: Vec<Box<str>>,
        topics: Vec<Box<str>>,
        tissues: Vec<Box<str>>,
        timepoints: Vec<Box<str>>,
    ) -> Self {
        Self {
            genes,
            topics,
            tissues,
            timepoints,
            ..Default::default()
        }
    }

    /// Dataset-wide Z-scores, gene × topic
    pub fn global_zscores(mut self, mat: Mat) -> Self {
        self.global = Some(mat);
        self
    }

    /// Z-scores within `tissue`, gene × topic
    pub fn intra_tissue_zscores(mut self, tissue: &str, mat: Mat) -> Self {
        self.intra_tissue.push((tissue.into(), mat));
        self
    }

    /// Beta coefficients, gene × topic
    pub fn beta(mut self, mat: Mat) -> Self {
        self.beta = Some(mat);
        self
    }

    /// Normalized counts in `tissue`, gene × timepoint
    pub fn normalized_counts(mut self, tissue: &str, mat: Mat) -> Self {
        self.counts.push((tissue.into(), mat));
        self
    }

    /// Topic proportions in `tissue`, timepoint × topic
    pub fn topic_proportions(mut self, tissue: &str, mat: Mat) -> Self {
        self.proportions.push((tissue.into(), mat));
        self
    }

    pub fn build(self) -> Result<DataStore> {
        let gene_index = unique_index(&self.genes, "gene")?;
        let topic_index = unique_index(&self.topics, "topic")?;
        let tissue_index = unique_index(&self.tissues, "tissue")?;
        unique_index(&self.timepoints, "timepoint")?;

        if self.topics.is_empty() || self.tissues.is_empty() || self.timepoints.is_empty() {
            return Err(ViewerError::integrity(
                "need at least one topic, tissue and timepoint",
            ));
        }

        let ngenes = self.genes.len();
        let ntopics = self.topics.len();
        let ntimes = self.timepoints.len();

        let check_dims = |mat: &Mat, nrow: usize, ncol: usize, what: &str| -> Result<()> {
            if mat.nrows() != nrow || mat.ncols() != ncol {
                return Err(ViewerError::integrity(format!(
                    "{} is {} x {}, expected {} x {}",
                    what,
                    mat.nrows(),
                    mat.ncols(),
                    nrow,
                    ncol
                )));
            }
            Ok(())
        };

        let stats = match (self.global, self.beta) {
            (Some(_), Some(_)) => {
                return Err(ViewerError::integrity(
                    "Z-score and beta tables are mutually exclusive",
                ))
            }
            (None, None) => return Err(ViewerError::integrity("no association table")),
            (None, Some(beta)) => {
                if !self.intra_tissue.is_empty() {
                    return Err(ViewerError::integrity(
                        "intra-tissue Z-scores given with a beta table",
                    ));
                }
                check_dims(&beta, ngenes, ntopics, "beta table")?;
                AssociationTables::Beta { beta }
            }
            (Some(global), None) => {
                check_dims(&global, ngenes, ntopics, "global Z-score table")?;
                let intra_tissue = per_tissue(
                    self.intra_tissue,
                    &tissue_index,
                    "intra-tissue Z-score table",
                )?;
                for (t, mat) in intra_tissue.iter().enumerate() {
                    let what = format!("intra-tissue Z-score table of `{}`", self.tissues[t]);
                    check_dims(mat, ngenes, ntopics, &what)?;
                }
                AssociationTables::ZScore {
                    global,
                    intra_tissue,
                }
            }
        };

        let counts = per_tissue(self.counts, &tissue_index, "normalized count table")?;
        for (t, mat) in counts.iter().enumerate() {
            let what = format!("normalized count table of `{}`", self.tissues[t]);
            check_dims(mat, ngenes, ntimes, &what)?;
        }

        let proportions = if self.proportions.is_empty() {
            None
        } else {
            let proportions =
                per_tissue(self.proportions, &tissue_index, "topic proportion table")?;
            for (t, mat) in proportions.iter().enumerate() {
                let what = format!("topic proportion table of `{}`", self.tissues[t]);
                check_dims(mat, ntimes, ntopics, &what)?;
            }
            Some(proportions)
        };

        Ok(DataStore {
            genes: self.genes,
            topics: self.topics,
            tissues: self.tissues,
            timepoints: self.timepoints,
            gene_index,
            topic_index,
            tissue_index,
            stats,
            counts,
            proportions,
        })
    }
}

fn unique_index(names: &[Box<str>], what: &str) -> Result<HashMap<Box<str>, usize>> {
    let mut index = HashMap::default();
    for (i, x) in names.iter().enumerate() {
        if index.insert(x.clone(), i).is_some() {
            return Err(ViewerError::integrity(format!("duplicate {} `{}`", what, x)));
        }
    }
    Ok(index)
}

/// Place one matrix per tissue in tissue order; every tissue needs
/// exactly one.
fn per_tissue(
    tables: Vec<(Box<str>, Mat)>,
    tissue_index: &HashMap<Box<str>, usize>,
    what: &str,
) -> Result<Vec<Mat>> {
    let mut slots: Vec<Option<Mat>> = vec![None; tissue_index.len()];
    for (tissue, mat) in tables {
        let t = tissue_index
            .get(&tissue)
            .copied()
            .ok_or_else(|| ViewerError::integrity(format!("{} for unknown tissue `{}`", what, tissue)))?;
        if slots[t].replace(mat).is_some() {
            return Err(ViewerError::integrity(format!(
                "{} given twice for `{}`",
                what, tissue
            )));
        }
    }

    let mut names: Vec<(&Box<str>, usize)> = tissue_index.iter().map(|(k, &v)| (k, v)).collect();
    names.sort_by_key(|&(_, v)| v);

    names
        .into_iter()
        .map(|(tissue, t)| {
            slots[t]
                .take()
                .ok_or_else(|| ViewerError::integrity(format!("no {} for `{}`", what, tissue)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xs: &[&str]) -> Vec<Box<str>> {
        xs.iter().map(|&x| x.into()).collect()
    }

    fn toy_builder() -> DataStoreBuilder {
        DataStoreBuilder::new(
            names(&["a", "b", "c"]),
            names(&["k1", "k2"]),
            names(&["liver", "spleen"]),
            names(&["t0", "t1"]),
        )
        .normalized_counts("liver", Mat::from_element(3, 2, 0.5))
        .normalized_counts("spleen", Mat::from_element(3, 2, 0.25))
    }

    fn toy_zscore_store() -> DataStore {
        let global = Mat::from_row_slice(3, 2, &[1.0, -2.0, 0.0, 3.0, -1.5, 0.5]);
        toy_builder()
            .global_zscores(global)
            .intra_tissue_zscores("spleen", Mat::from_element(3, 2, -1.0))
            .intra_tissue_zscores("liver", Mat::from_element(3, 2, 1.0))
            .build()
            .expect("toy store")
    }

    #[test]
    fn statistic_lookup_follows_gene_axis() -> Result<()> {
        let store = toy_zscore_store();
        let col = store.get_statistic(TableKind::Global, "k2", None)?;
        assert_eq!(col, vec![("a", -2.0), ("b", 3.0), ("c", 0.5)]);

        let spleen = store.get_statistic(TableKind::IntraTissue, "k1", Some("spleen"))?;
        assert!(spleen.iter().all(|&(_, v)| v == -1.0));
        Ok(())
    }

    #[test]
    fn tissue_argument_is_a_contract() {
        let store = toy_zscore_store();
        let err = store.get_statistic(TableKind::IntraTissue, "k1", None);
        assert!(matches!(err, Err(ViewerError::ContractViolation { .. })));

        let err = store.get_statistic(TableKind::Global, "k1", Some("liver"));
        assert!(matches!(err, Err(ViewerError::ContractViolation { .. })));
    }

    #[test]
    fn unknown_references_are_not_found() {
        let store = toy_zscore_store();
        let err = store.get_statistic(TableKind::Global, "k9", None);
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));

        let err = store.get_statistic(TableKind::IntraTissue, "k1", Some("brain"));
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));

        let err = store.get_statistic(TableKind::Beta, "k1", None);
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));

        let err = store.get_series("zzz", "liver");
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));
    }

    #[test]
    fn all_missing_series_is_not_found() -> Result<()> {
        let mut liver = Mat::from_element(3, 2, 0.5);
        liver[(1, 0)] = f32::NAN;
        liver[(1, 1)] = f32::NAN;
        let store = DataStoreBuilder::new(
            names(&["a", "b", "c"]),
            names(&["k1"]),
            names(&["liver"]),
            names(&["t0", "t1"]),
        )
        .normalized_counts("liver", liver)
        .beta(Mat::from_element(3, 1, 1.0))
        .build()?;

        assert_eq!(store.get_series("a", "liver")?, vec![("t0", 0.5), ("t1", 0.5)]);
        let err = store.get_series("b", "liver");
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));
        Ok(())
    }

    #[test]
    fn builder_rejects_inconsistent_tables() {
        // missing intra-tissue table for spleen
        let err = toy_builder()
            .global_zscores(Mat::zeros(3, 2))
            .intra_tissue_zscores("liver", Mat::zeros(3, 2))
            .build();
        assert!(matches!(err, Err(ViewerError::DataIntegrity { .. })));

        // wrong gene count
        let err = toy_builder().beta(Mat::zeros(2, 2)).build();
        assert!(matches!(err, Err(ViewerError::DataIntegrity { .. })));

        // both configurations at once
        let err = toy_builder()
            .beta(Mat::zeros(3, 2))
            .global_zscores(Mat::zeros(3, 2))
            .build();
        assert!(matches!(err, Err(ViewerError::DataIntegrity { .. })));

        // duplicate gene
        let err = DataStoreBuilder::new(
            names(&["a", "a"]),
            names(&["k1"]),
            names(&["liver"]),
            names(&["t0"]),
        )
        .beta(Mat::zeros(2, 1))
        .normalized_counts("liver", Mat::zeros(2, 1))
        .build();
        assert!(matches!(err, Err(ViewerError::DataIntegrity { .. })));
    }

    #[test]
    fn configuration_decides_table_kinds() -> Result<()> {
        let store = toy_zscore_store();
        assert_eq!(store.default_table_kind(), TableKind::Global);
        assert!(store.has_table_kind(TableKind::IntraTissue));
        assert!(!store.has_table_kind(TableKind::Beta));

        let store = toy_builder().beta(Mat::zeros(3, 2)).build()?;
        assert_eq!(store.table_kinds(), &[TableKind::Beta]);
        Ok(())
    }

    #[test]
    fn proportions_are_optional() -> Result<()> {
        let store = toy_zscore_store();
        assert!(store.get_topic_proportions("k1", "liver").is_err());

        let store = toy_builder()
            .beta(Mat::zeros(3, 2))
            .topic_proportions("liver", Mat::from_row_slice(2, 2, &[0.1, 0.9, 0.3, 0.7]))
            .topic_proportions("spleen", Mat::from_element(2, 2, 0.5))
            .build()?;
        assert_eq!(
            store.get_topic_proportions("k2", "liver")?,
            vec![("t0", 0.9), ("t1", 0.7)]
        );
        Ok(())
    }

    #[test]
    fn table_kind_names() -> Result<()> {
        assert_eq!("intra".parse::<TableKind>()?, TableKind::IntraTissue);
        assert_eq!("Global".parse::<TableKind>()?, TableKind::Global);
        assert!("pca".parse::<TableKind>().is_err());
        Ok(())
    }
}

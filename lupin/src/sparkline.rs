use crate::payload::{SeriesPoint, Sparkline, TissueSeries};
use crate::ranking::RankedGene;
use std::sync::Arc;
use topic_beans::{DataStore, Result, TableKind, ViewerError};

/// Looks up the normalized timecourse shown next to each ranked gene
pub struct SparklineProvider {
    store: Arc<DataStore>,
}

impl SparklineProvider {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    ///
    /// Tissues whose series accompany a ranking: every tissue for
    /// dataset-wide statistics, only the selected one for intra-tissue
    /// statistics.
    ///
    pub fn relevant_tissues<'a>(
        &'a self,
        kind: TableKind,
        tissue: Option<&'a str>,
    ) -> Result<Vec<&'a str>> {
        match (kind.requires_tissue(), tissue) {
            (true, Some(t)) => {
                self.store.tissue_index(t)?;
                Ok(vec![t])
            }
            (true, None) => Err(ViewerError::contract(format!(
                "{} sparklines need a tissue",
                kind
            ))),
            (false, _) => Ok(self
                .store
                .get_tissues()
                .iter()
                .map(|t| t.as_ref())
                .collect()),
        }
    }

    /// Series of `gene` in each of `tissues`. A missing series breaks
    /// the store's guarantee and is reported, not skipped.
    pub fn sparkline(&self, gene: &str, tissues: &[&str]) -> Result<Sparkline> {
        let series = tissues
            .iter()
            .map(|&tissue| -> Result<TissueSeries> {
                let points = self
                    .store
                    .get_series(gene, tissue)?
                    .into_iter()
                    .map(|(tp, value)| SeriesPoint {
                        timepoint: tp.into(),
                        value,
                    })
                    .collect();
                Ok(TissueSeries {
                    tissue: tissue.into(),
                    points,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Sparkline { series })
    }

    /// One sparkline per row of `page`, in the same order
    pub fn sparklines(
        &self,
        page: &[RankedGene],
        kind: TableKind,
        tissue: Option<&str>,
    ) -> Result<Vec<Sparkline>> {
        let tissues = self.relevant_tissues(kind, tissue)?;
        page.iter()
            .map(|row| self.sparkline(&row.gene, &tissues))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topic_beans::store::DataStoreBuilder;
    use topic_beans::tables::Mat;

    fn provider() -> SparklineProvider {
        let mut spleen = Mat::from_row_slice(2, 3, &[0.0, 0.5, 1.0, 1.0, 0.0, 0.5]);
        spleen[(1, 0)] = f32::NAN;
        spleen[(1, 1)] = f32::NAN;
        spleen[(1, 2)] = f32::NAN;

        let store = DataStoreBuilder::new(
            vec!["a".into(), "b".into()],
            vec!["k1".into()],
            vec!["liver".into(), "spleen".into()],
            vec!["t0".into(), "t1".into(), "t2".into()],
        )
        .beta(Mat::from_element(2, 1, 1.0))
        .normalized_counts("liver", Mat::from_element(2, 3, 0.25))
        .normalized_counts("spleen", spleen)
        .build()
        .expect("store");
        SparklineProvider::new(Arc::new(store))
    }

    fn row(gene: &str) -> RankedGene {
        RankedGene {
            gene: gene.into(),
            value: 1.0,
        }
    }

    #[test]
    fn dataset_wide_rankings_show_every_tissue() -> Result<()> {
        let p = provider();
        let lines = p.sparklines(&[row("a")], TableKind::Beta, None)?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].tissues().collect::<Vec<_>>(), vec!["liver", "spleen"]);

        let spleen = lines[0].get("spleen").expect("spleen series");
        let values: Vec<f32> = spleen.iter().map(|x| x.value).collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
        assert_eq!(spleen[2].timepoint.as_ref(), "t2");
        Ok(())
    }

    #[test]
    fn intra_tissue_rankings_show_one_tissue() -> Result<()> {
        let p = provider();
        let tissues = p.relevant_tissues(TableKind::IntraTissue, Some("liver"))?;
        assert_eq!(tissues, vec!["liver"]);
        assert!(p
            .relevant_tissues(TableKind::IntraTissue, None)
            .is_err());
        Ok(())
    }

    #[test]
    fn missing_series_is_reported() {
        let p = provider();
        let err = p.sparklines(&[row("a"), row("b")], TableKind::Beta, None);
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));

        let err = p.sparklines(&[row("zz")], TableKind::Beta, None);
        assert!(matches!(err, Err(ViewerError::NotFound { .. })));
    }
}

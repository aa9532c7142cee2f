//! Everything the rendering layer receives after an event.

use crate::ranking::Sign;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use topic_beans::TableKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timepoint: Box<str>,
    /// `NaN` (serialized as `null`) where the timepoint was not sampled
    pub value: f32,
}

/// Normalized expression of one gene in one tissue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TissueSeries {
    pub tissue: Box<str>,
    pub points: Vec<SeriesPoint>,
}

/// Per-tissue series of one gene, in tissue display order.
/// Serialized as a map `tissue -> [points]` keeping that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sparkline {
    pub series: Vec<TissueSeries>,
}

impl Serialize for Sparkline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for s in &self.series {
            map.serialize_entry(&s.tissue, &s.points)?;
        }
        map.end()
    }
}

impl Sparkline {
    pub fn get(&self, tissue: &str) -> Option<&[SeriesPoint]> {
        self.series
            .iter()
            .find(|s| s.tissue.as_ref() == tissue)
            .map(|s| s.points.as_slice())
    }

    pub fn tissues(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.tissue.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    /// 0-based position in the whole ranking
    pub rank: usize,
    pub gene_id: Box<str>,
    pub statistic_value: f32,
    pub sparkline: Sparkline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPayload {
    pub topic_id: Box<str>,
    pub table_kind: TableKind,
    pub tissue_id: Option<Box<str>>,
    pub sign: Sign,
    pub page_rows: Vec<PageRow>,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    /// rank of the first row on this page
    pub offset: usize,
    /// length of the whole ranking
    pub total: usize,
}

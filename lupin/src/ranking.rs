//! Gene rankings for one (topic, table kind, tissue, sign) query.
//!
//! Genes are kept only if their statistic has the requested sign and
//! are ordered by the magnitude of the statistic, strongest first.
//! Ties are broken by gene name so the order is reproducible. A
//! value of exactly zero belongs to neither sign.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use topic_beans::{DataStore, Result, TableKind, ViewerError};

/// Direction of association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Does `value` fall into this sign bucket?
    pub fn admits(&self, value: f32) -> bool {
        match self {
            Sign::Positive => value > 0.0,
            Sign::Negative => value < 0.0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Positive => write!(f, "positive"),
            Sign::Negative => write!(f, "negative"),
        }
    }
}

impl FromStr for Sign {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pos" | "positive" | "+" => Ok(Sign::Positive),
            "neg" | "negative" | "-" => Ok(Sign::Negative),
            _ => Err(ViewerError::not_found(format!("sign `{}`", s))),
        }
    }
}

/// One row of a ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGene {
    pub gene: Box<str>,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub topic: Box<str>,
    pub kind: TableKind,
    pub tissue: Option<Box<str>>,
    pub sign: Sign,
}

/// Larger magnitude first, then gene name ascending
fn by_magnitude_then_name(a: &RankedGene, b: &RankedGene) -> Ordering {
    b.value
        .abs()
        .total_cmp(&a.value.abs())
        .then_with(|| a.gene.cmp(&b.gene))
}

///
/// Rank the genes of `query.topic` in the requested table and sign.
///
/// Fails with `NotFound` for an unknown topic/tissue or a table kind
/// that is not loaded, and with `DataIntegrity` if any gene lacks a
/// value for this topic (the gene set would otherwise differ from the
/// other statistics).
///
pub fn rank_genes(store: &DataStore, query: &RankQuery) -> Result<Vec<RankedGene>> {
    let column = store.get_statistic(query.kind, &query.topic, query.tissue.as_deref())?;

    if let Some((gene, _)) = column.iter().find(|(_, v)| v.is_nan()) {
        return Err(ViewerError::integrity(format!(
            "gene `{}` has no {} value for topic `{}`{}",
            gene,
            query.kind,
            query.topic,
            query
                .tissue
                .as_ref()
                .map(|t| format!(" in `{}`", t))
                .unwrap_or_default()
        )));
    }

    let mut ranked: Vec<RankedGene> = column
        .into_iter()
        .filter(|&(_, v)| query.sign.admits(v))
        .map(|(g, v)| RankedGene {
            gene: g.into(),
            value: v,
        })
        .collect();

    ranked.sort_by(by_magnitude_then_name);
    Ok(ranked)
}

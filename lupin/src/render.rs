//! Plain-text rendering of a payload for the terminal session.

use crate::payload::{RenderPayload, Sparkline};
use std::fmt::Write;

const TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One tick per timepoint and tissue, scaled over all of the gene's
/// series like a small line plot with its own y-axis. Unsampled
/// timepoints are blank.
pub fn sparkline_ticks(sparkline: &Sparkline) -> Vec<(Box<str>, String)> {
    let (lo, hi) = sparkline
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.value))
        .filter(|x| x.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    let span = hi - lo;
    let top = (TICKS.len() - 1) as f32;

    sparkline
        .series
        .iter()
        .map(|s| {
            let ticks = s
                .points
                .iter()
                .map(|p| {
                    if !p.value.is_finite() {
                        ' '
                    } else if span > 0.0 {
                        TICKS[(((p.value - lo) / span) * top).round() as usize]
                    } else {
                        TICKS[0]
                    }
                })
                .collect();
            (s.tissue.clone(), ticks)
        })
        .collect()
}

pub fn render_text(payload: &RenderPayload) -> String {
    let mut out = String::new();

    let scope = match &payload.tissue_id {
        Some(t) => format!("{} in {}", payload.table_kind, t),
        None => payload.table_kind.to_string(),
    };

    let _ = writeln!(
        out,
        "Genes correlated with {} [{}, {}] {}-{} of {}",
        payload.topic_id,
        scope,
        payload.sign,
        if payload.page_rows.is_empty() {
            payload.offset
        } else {
            payload.offset + 1
        },
        payload.offset + payload.page_rows.len(),
        payload.total
    );

    if payload.page_rows.is_empty() {
        let _ = writeln!(out, "  (no genes with {} statistic)", payload.sign);
    }

    for row in &payload.page_rows {
        let lines = sparkline_ticks(&row.sparkline)
            .into_iter()
            .map(|(tissue, ticks)| format!("{}:{}", tissue, ticks))
            .collect::<Vec<_>>()
            .join(" ");

        let _ = writeln!(
            out,
            "{:>5}  {:<15} {:>9.3}  {}",
            row.rank, row.gene_id, row.statistic_value, lines
        );
    }

    let _ = write!(
        out,
        "{}{}",
        if payload.has_prev_page { "[p]rev " } else { "" },
        if payload.has_next_page { "[n]ext" } else { "" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{SeriesPoint, TissueSeries};

    fn series(tissue: &str, values: &[f32]) -> TissueSeries {
        TissueSeries {
            tissue: tissue.into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| SeriesPoint {
                    timepoint: format!("t{}", i).into(),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn ticks_share_one_scale_across_tissues() {
        let line = Sparkline {
            series: vec![
                series("liver", &[0.0, 1.0]),
                series("spleen", &[0.5, f32::NAN]),
            ],
        };
        let ticks = sparkline_ticks(&line);
        assert_eq!(ticks[0].1, "▁█");
        assert_eq!(ticks[1].1, "▅ ");
    }

    #[test]
    fn flat_series_sits_on_the_floor() {
        let line = Sparkline {
            series: vec![series("liver", &[3.0, 3.0, 3.0])],
        };
        assert_eq!(sparkline_ticks(&line)[0].1, "▁▁▁");
    }
}

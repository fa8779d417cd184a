//! Labeled numeric series handed to a plotting collaborator.
//!
//! These are the payloads behind the distribution, scatter and trend charts.
//! Nothing here draws; see [`crate::viz`] for the SVG adapter.

use crate::models::MeasurementTable;
use crate::stats::{MonthlyMean, group_values, quantile_sorted};
use serde::{Deserialize, Serialize};

/// Five-number summary plus outliers for one site's boxplot.
///
/// Quartiles use linear interpolation; whiskers reach the most extreme values
/// within 1.5 × IQR of the box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxSummary {
    pub site: String,
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScatterSeries {
    pub site: String,
    /// (x, y) pairs, rows where either side is missing are skipped.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySeries {
    pub site: String,
    /// (month 1..=12, mean), ascending by month.
    pub points: Vec<(u32, f64)>,
}

/// Box summaries of `metric` per site; sites without values are skipped.
pub fn box_summary(table: &MeasurementTable, metric: &str) -> Vec<BoxSummary> {
    let Some(groups) = group_values(table, metric) else {
        return Vec::new();
    };
    groups
        .into_iter()
        .filter_map(|(site, mut vals, _)| {
            vals.sort_by(|a, b| a.total_cmp(b));
            let q1 = quantile_sorted(&vals, 0.25)?;
            let median = quantile_sorted(&vals, 0.5)?;
            let q3 = quantile_sorted(&vals, 0.75)?;
            let iqr = q3 - q1;
            let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
            let inside = vals.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
            let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
            let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
            let outliers = vals
                .iter()
                .copied()
                .filter(|v| *v < lo_fence || *v > hi_fence)
                .collect();
            Some(BoxSummary {
                site,
                count: vals.len(),
                q1,
                median,
                q3,
                lower_whisker,
                upper_whisker,
                outliers,
            })
        })
        .collect()
}

/// `(x, y)` pairs per site for a scatter chart. Empty if either column is absent.
pub fn scatter_pairs(table: &MeasurementTable, x: &str, y: &str) -> Vec<ScatterSeries> {
    let (Some(xi), Some(yi)) = (table.column_index(x), table.column_index(y)) else {
        return Vec::new();
    };
    let mut out: Vec<ScatterSeries> = Vec::new();
    for r in &table.rows {
        let (Some(xv), Some(yv)) = (r.value(xi), r.value(yi)) else {
            continue;
        };
        match out.iter_mut().find(|s| s.site == r.site) {
            Some(s) => s.points.push((xv, yv)),
            None => out.push(ScatterSeries {
                site: r.site.clone(),
                points: vec![(xv, yv)],
            }),
        }
    }
    out
}

/// Regroup flat monthly means into one line per site, keeping site order.
pub fn monthly_series(means: &[MonthlyMean]) -> Vec<MonthlySeries> {
    let mut out: Vec<MonthlySeries> = Vec::new();
    for m in means {
        match out.iter_mut().find(|s| s.site == m.site) {
            Some(s) => s.points.push((m.month, m.mean)),
            None => out.push(MonthlySeries {
                site: m.site.clone(),
                points: vec![(m.month, m.mean)],
            }),
        }
    }
    for s in &mut out {
        s.points.sort_by_key(|(month, _)| *month);
    }
    out
}

//! Per-site aggregations over a (filtered) combined table.
//!
//! Every function here is read-only and returns an empty result when the
//! requested metric column is absent, so callers always get something
//! renderable. Values are never rounded here except through
//! [`SiteSummary::rounded`], which is meant for display only.

use crate::models::MeasurementTable;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary statistics for one site and one metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSummary {
    pub site: String,
    /// Non-missing values.
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (N-1); `None` below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SiteSummary {
    /// Copy with every statistic rounded to 2 decimals.
    pub fn rounded(&self) -> Self {
        let r = |v: Option<f64>| v.map(round2);
        Self {
            site: self.site.clone(),
            count: self.count,
            missing: self.missing,
            mean: r(self.mean),
            median: r(self.median),
            std: r(self.std),
            min: r(self.min),
            max: r(self.max),
        }
    }
}

/// One entry of a site ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteRank {
    pub site: String,
    /// Unrounded mean of the ranked metric.
    pub mean: f64,
    pub count: usize,
}

/// A single row picked by [`top_n`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopRow {
    pub site: String,
    pub value: f64,
}

/// Mean of a metric for one (site, month-of-year) bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyMean {
    pub site: String,
    /// 1..=12
    pub month: u32,
    pub mean: f64,
    pub count: usize,
}

/// Mean of a metric for one (site, region) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionMean {
    pub site: String,
    pub region: String,
    pub mean: f64,
}

/// Sites holding the largest mean and median of a summary table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Highlights {
    pub max_mean: Option<String>,
    pub max_median: Option<String>,
}

/// Round half away from zero to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn mean(vals: &[f64]) -> Option<f64> {
    if vals.is_empty() {
        None
    } else {
        Some(vals.iter().sum::<f64>() / vals.len() as f64)
    }
}

/// Linear-interpolated quantile of already sorted values, `p` in `[0, 1]`.
pub(crate) fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sample_std(vals: &[f64], mean: f64) -> Option<f64> {
    if vals.len() < 2 {
        return None;
    }
    let ss: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (vals.len() - 1) as f64).sqrt())
}

/// Values of `metric` grouped by site, sites in first-appearance order.
/// Returns `(site, values, missing_count)`; `None` when the column is absent.
pub(crate) fn group_values(
    table: &MeasurementTable,
    metric: &str,
) -> Option<Vec<(String, Vec<f64>, usize)>> {
    let idx = table.column_index(metric)?;
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>, usize)> = Vec::new();
    for r in &table.rows {
        let g = *order.entry(r.site.as_str()).or_insert_with(|| {
            groups.push((r.site.clone(), Vec::new(), 0));
            groups.len() - 1
        });
        match r.value(idx) {
            Some(v) => groups[g].1.push(v),
            None => groups[g].2 += 1,
        }
    }
    Some(groups)
}

/// Count, mean, median, sample std, min and max of `metric` per site.
///
/// A site whose values are all missing still gets a row (count 0, no
/// statistics). Absent column → empty result.
pub fn group_summary(table: &MeasurementTable, metric: &str) -> Vec<SiteSummary> {
    let Some(groups) = group_values(table, metric) else {
        return Vec::new();
    };
    groups
        .into_iter()
        .map(|(site, mut vals, missing)| {
            vals.sort_by(|a, b| a.total_cmp(b));
            let mean = mean(&vals);
            SiteSummary {
                site,
                count: vals.len(),
                missing,
                std: mean.and_then(|m| sample_std(&vals, m)),
                mean,
                median: quantile_sorted(&vals, 0.5),
                min: vals.first().copied(),
                max: vals.last().copied(),
            }
        })
        .collect()
}

/// Sites sorted by descending mean of `metric`.
///
/// The sort is stable, so equal means keep registry order. Sites without any
/// value are left out rather than ranked as zero.
pub fn rank_sites(table: &MeasurementTable, metric: &str) -> Vec<SiteRank> {
    let Some(groups) = group_values(table, metric) else {
        return Vec::new();
    };
    let mut ranks: Vec<SiteRank> = groups
        .into_iter()
        .filter_map(|(site, vals, _)| {
            mean(&vals).map(|m| SiteRank {
                site,
                mean: m,
                count: vals.len(),
            })
        })
        .collect();
    ranks.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ranks
}

/// The `n` rows with the largest `metric` value, keeping only site and value.
///
/// Rows with a missing value are skipped; ties keep row order. `n` at or
/// above the row count returns every valued row sorted descending.
pub fn top_n(table: &MeasurementTable, metric: &str, n: usize) -> Vec<TopRow> {
    let mut rows: Vec<TopRow> = table
        .metric_values(metric)
        .into_iter()
        .map(|(site, value)| TopRow {
            site: site.to_string(),
            value,
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows.truncate(n);
    rows
}

/// Mean of `metric` per (site, month-of-year).
///
/// Only buckets holding at least one value are emitted; months without data
/// are absent, never zero-filled. Ordered by site appearance, then month.
pub fn monthly_means(table: &MeasurementTable, metric: &str) -> Vec<MonthlyMean> {
    let Some(idx) = table.column_index(metric) else {
        return Vec::new();
    };
    let mut site_order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<(&str, u32), Vec<f64>> = HashMap::new();
    for r in &table.rows {
        let (Some(ts), Some(v)) = (r.timestamp, r.value(idx)) else {
            continue;
        };
        if !site_order.contains(&r.site.as_str()) {
            site_order.push(r.site.as_str());
        }
        buckets.entry((r.site.as_str(), ts.month())).or_default().push(v);
    }

    let mut out = Vec::with_capacity(buckets.len());
    for site in site_order {
        for month in 1..=12u32 {
            if let Some(vals) = buckets.get(&(site, month))
                && let Some(m) = mean(vals)
            {
                out.push(MonthlyMean {
                    site: site.to_string(),
                    month,
                    mean: m,
                    count: vals.len(),
                });
            }
        }
    }
    out
}

/// Mean of `metric` per (site, region), sorted descending.
///
/// Rows without a region label are ignored; a table without any region yields
/// an empty result.
pub fn region_means(table: &MeasurementTable, metric: &str) -> Vec<RegionMean> {
    let Some(idx) = table.column_index(metric) else {
        return Vec::new();
    };
    let mut keys: Vec<(String, String)> = Vec::new();
    let mut vals: HashMap<(String, String), Vec<f64>> = HashMap::new();
    for r in &table.rows {
        let (Some(region), Some(v)) = (r.region.as_ref(), r.value(idx)) else {
            continue;
        };
        let key = (r.site.clone(), region.clone());
        if !vals.contains_key(&key) {
            keys.push(key.clone());
        }
        vals.entry(key).or_default().push(v);
    }
    let mut out: Vec<RegionMean> = keys
        .into_iter()
        .filter_map(|key| {
            let m = mean(vals.get(&key)?)?;
            Some(RegionMean {
                site: key.0,
                region: key.1,
                mean: m,
            })
        })
        .collect();
    out.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    out
}

/// Which sites hold the highest mean and median; first site wins ties.
pub fn highlight_max(rows: &[SiteSummary]) -> Highlights {
    let best = |f: fn(&SiteSummary) -> Option<f64>| {
        let mut top: Option<(&str, f64)> = None;
        for r in rows {
            if let Some(v) = f(r)
                && top.is_none_or(|(_, t)| v > t)
            {
                top = Some((r.site.as_str(), v));
            }
        }
        top.map(|(s, _)| s.to_string())
    };
    Highlights {
        max_mean: best(|r| r.mean),
        max_median: best(|r| r.median),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_display_only() {
        assert_eq!(round2(2.345678), 2.35);
        assert_eq!(round2(-1.005_1), -1.01);
        assert_eq!(round2(7.0), 7.0);
    }

    #[test]
    fn quantiles_interpolate() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&v, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&v, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&v, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn std_uses_n_minus_one() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = sample_std(&v, 5.0).unwrap();
        assert!((s - 2.138_089_935).abs() < 1e-6);
        assert_eq!(sample_std(&[3.0], 3.0), None);
    }
}

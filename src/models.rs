use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One registered data source: a human-readable site name and the CSV it lives in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SiteSource {
    pub name: String,
    pub path: std::path::PathBuf,
}

/// Tidy row used by this crate (one row = one timestamp at one site).
///
/// `values` is aligned with the `columns` of the [`MeasurementTable`] that owns
/// the row; a missing or `NaN` cell is `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub site: String,
    pub timestamp: Option<NaiveDateTime>,
    pub region: Option<String>,
    pub values: Vec<Option<f64>>,
}

impl Measurement {
    /// Value at column position `idx`, `None` when missing or out of range.
    pub fn value(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }
}

/// An ordered sequence of measurements sharing one metric column schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeasurementTable {
    /// Numeric metric columns, in source order.
    pub columns: Vec<String>,
    /// Whether the source(s) carried a timestamp column.
    pub has_timestamp: bool,
    pub rows: Vec<Measurement>,
}

impl MeasurementTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether any row carries a region label.
    pub fn has_region(&self) -> bool {
        self.rows.iter().any(|r| r.region.is_some())
    }

    /// Distinct site names in order of first appearance.
    pub fn sites(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.rows {
            if !out.iter().any(|s| s == &r.site) {
                out.push(r.site.clone());
            }
        }
        out
    }

    /// `(site, value)` for every row with a non-missing value in `metric`.
    /// Empty when the column does not exist.
    pub fn metric_values<'a>(&'a self, metric: &str) -> Vec<(&'a str, f64)> {
        let Some(idx) = self.column_index(metric) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.value(idx).map(|v| (r.site.as_str(), v)))
            .collect()
    }
}

/// One site's loaded table, every row already tagged with `site`.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteTable {
    pub site: String,
    pub table: MeasurementTable,
}

/// Request parameters coming from the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub sites: Vec<String>,
    pub metric: String,
    /// Overrides the configured top-N row count when set.
    pub top_n: Option<usize>,
}

impl Selection {
    pub fn new<S: Into<String>>(sites: Vec<String>, metric: S) -> Self {
        Self {
            sites,
            metric: metric.into(),
            top_n: None,
        }
    }
}

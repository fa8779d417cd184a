//! Read per-site CSV sources into tagged [`SiteTable`]s.
//!
//! A bad source never aborts the whole load: it is skipped and reported as a
//! [`LoadDiagnostic`]. Only when *every* source fails does loading return
//! [`DashError::NoDataAvailable`].

use crate::config::{LoaderOptions, SiteRegistry};
use crate::error::DashError;
use crate::models::{Measurement, MeasurementTable, SiteTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Tokens (case-insensitive) that mean "no value" in a numeric cell.
const MISSING_TOKENS: [&str; 5] = ["nan", "na", "n/a", "null", "none"];

/// Why a registered site is absent from the loaded set.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadDiagnostic {
    pub site: String,
    pub path: PathBuf,
    pub error: DashError,
}

/// Successfully loaded sites (registry order) plus the per-site failures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedSites {
    pub sites: Vec<SiteTable>,
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadedSites {
    pub fn site_names(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.site.clone()).collect()
    }
}

/// Load every registered source, skipping (and reporting) the ones that fail.
pub fn load_sites(
    registry: &SiteRegistry,
    opts: &LoaderOptions,
) -> Result<LoadedSites, DashError> {
    let mut out = LoadedSites::default();
    for src in registry.sites() {
        match load_site(&src.name, &src.path, opts) {
            Ok(t) => {
                info!("loaded {} rows for site '{}'", t.table.len(), t.site);
                out.sites.push(t);
            }
            Err(error) => {
                warn!("skipping site '{}': {error}", src.name);
                out.diagnostics.push(LoadDiagnostic {
                    site: src.name.clone(),
                    path: src.path.clone(),
                    error,
                });
            }
        }
    }

    if out.sites.is_empty() {
        let detail = if out.diagnostics.is_empty() {
            "the site registry is empty".to_string()
        } else {
            out.diagnostics
                .iter()
                .map(|d| d.error.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        };
        return Err(DashError::NoDataAvailable(format!(
            "no data files could be loaded ({detail})"
        )));
    }
    Ok(out)
}

/// Load one CSV file for `site`.
pub fn load_site<P: AsRef<Path>>(
    site: &str,
    path: P,
    opts: &LoaderOptions,
) -> Result<SiteTable, DashError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| DashError::unavailable(site, format!("{}: {e}", path.display())))?;
    load_reader(site, file, opts)
}

/// Load one CSV from any reader (e.g. an uploaded file handle).
pub fn load_reader<R: Read>(
    site: &str,
    reader: R,
    opts: &LoaderOptions,
) -> Result<SiteTable, DashError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DashError::unavailable(site, format!("reading header: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records: Vec<StringRecord> = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec =
            rec.map_err(|e| DashError::unavailable(site, format!("CSV row {}: {e}", i + 1)))?;
        records.push(rec);
    }
    if records.is_empty() {
        return Err(DashError::unavailable(site, "the file has no data rows"));
    }

    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let ts_idx = find(&opts.timestamp_column);
    let region_idx = find("Region");
    let country_idx = find("Country");

    // A column is a metric unless it holds text and not a single number.
    // Required columns are always kept; their bad cells become missing values.
    let mut metric_idx: Vec<usize> = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        if [ts_idx, region_idx, country_idx].contains(&Some(i)) {
            continue;
        }
        let cells = || records.iter().map(|r| r.get(i).unwrap_or(""));
        let bad = cells()
            .filter(|c| !is_missing(c) && parse_number(c).is_none())
            .count();
        let numeric = cells().any(|c| parse_number(c).is_some());
        let required = opts.required_any.iter().any(|req| req == h);
        if bad == 0 || numeric || required {
            if bad > 0 {
                warn!("site '{site}': {bad} non-numeric cell(s) in '{h}' treated as missing");
            }
            metric_idx.push(i);
        } else {
            debug!("site '{site}': dropping non-numeric column '{h}'");
        }
    }

    if !metric_idx
        .iter()
        .any(|&i| opts.required_any.contains(&headers[i]))
    {
        return Err(DashError::missing_column(
            &opts.required_any.join("/"),
            format!("site '{site}' has none of the required solar columns"),
        ));
    }

    let mut bad_timestamps = 0usize;
    let rows: Vec<Measurement> = records
        .iter()
        .map(|r| {
            let timestamp = ts_idx.and_then(|i| {
                let cell = r.get(i).unwrap_or("");
                let parsed = parse_timestamp(cell);
                if parsed.is_none() && !cell.is_empty() {
                    bad_timestamps += 1;
                }
                parsed
            });
            let region = region_idx
                .and_then(|i| r.get(i))
                .filter(|s| !is_missing(s))
                .map(|s| s.to_string());
            Measurement {
                site: site.to_string(),
                timestamp,
                region,
                values: metric_idx
                    .iter()
                    .map(|&i| parse_number(r.get(i).unwrap_or("")))
                    .collect(),
            }
        })
        .collect();

    if bad_timestamps > 0 {
        debug!("site '{site}': {bad_timestamps} unparseable timestamp(s) left empty");
    }

    Ok(SiteTable {
        site: site.to_string(),
        table: MeasurementTable {
            columns: metric_idx.iter().map(|&i| headers[i].clone()).collect(),
            has_timestamp: ts_idx.is_some(),
            rows,
        },
    })
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t))
}

/// Parse a numeric cell; missing tokens and non-finite values become `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a timestamp cell in any of the accepted layouts.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    if cell.is_empty() {
        return None;
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(cell, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(cell) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn numbers_and_missing_tokens() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn timestamp_layouts() {
        let a = parse_timestamp("2021-08-09 00:01:00").unwrap();
        assert_eq!((a.month(), a.minute()), (8, 1));
        let b = parse_timestamp("2021-08-09T13:30").unwrap();
        assert_eq!(b.hour(), 13);
        let c = parse_timestamp("2022-01-31").unwrap();
        assert_eq!((c.month(), c.day(), c.hour()), (1, 31, 0));
        let d = parse_timestamp("2022-03-01T10:00:00+02:00").unwrap();
        assert_eq!(d.hour(), 8);
        assert!(parse_timestamp("yesterday").is_none());
    }
}

use crate::models::MeasurementTable;
use crate::stats::{SiteRank, SiteSummary};
use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix text cells that a spreadsheet would evaluate as a formula.
fn sanitize(cell: &str) -> String {
    if cell.starts_with(['=', '+', '-', '@']) {
        format!("'{cell}")
    } else {
        cell.to_string()
    }
}

fn fmt_num(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Save a combined table as CSV: `site`, `Timestamp`, `Region`, then the metric columns.
pub fn save_table_csv<P: AsRef<Path>>(table: &MeasurementTable, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = vec!["site".to_string(), "Timestamp".to_string(), "Region".to_string()];
    header.extend(table.columns.iter().cloned());
    wtr.write_record(&header)?;
    for r in &table.rows {
        let mut rec = vec![
            sanitize(&r.site),
            r.timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            r.region.as_deref().map(sanitize).unwrap_or_default(),
        ];
        rec.extend((0..table.columns.len()).map(|i| fmt_num(r.value(i))));
        wtr.write_record(&rec)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save per-site summary statistics as CSV with header.
pub fn save_summary_csv<P: AsRef<Path>>(rows: &[SiteSummary], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("site", "count", "missing", "mean", "median", "std", "min", "max"))?;
    for s in rows {
        wtr.serialize((
            sanitize(&s.site),
            s.count,
            s.missing,
            s.mean,
            s.median,
            s.std,
            s.min,
            s.max,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a site ranking as CSV (`rank` starts at 1).
pub fn save_ranking_csv<P: AsRef<Path>>(ranks: &[SiteRank], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("rank", "site", "mean", "count"))?;
    for (i, r) in ranks.iter().enumerate() {
        wtr.serialize((i + 1, sanitize(&r.site), r.mean, r.count))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save any serializable result as a pretty JSON document.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

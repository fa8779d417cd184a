use crate::models::{Measurement, MeasurementTable, SiteTable};

/// Concatenate per-site tables into one site-tagged table.
///
/// Rows keep their order: every row of the first site, then the second, and
/// so on. Columns are the union of the inputs in first-appearance order; a
/// row from a site lacking a column gets `None` there. Nothing is dropped or
/// deduplicated. An empty input yields an empty table with no columns.
pub fn combine(sites: &[SiteTable]) -> MeasurementTable {
    let mut columns: Vec<String> = Vec::new();
    for s in sites {
        for c in &s.table.columns {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }

    let total: usize = sites.iter().map(|s| s.table.len()).sum();
    let mut rows = Vec::with_capacity(total);
    for s in sites {
        // position of each union column in this site's schema
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|c| s.table.column_index(c))
            .collect();
        for r in &s.table.rows {
            rows.push(Measurement {
                site: s.site.clone(),
                timestamp: r.timestamp,
                region: r.region.clone(),
                values: mapping
                    .iter()
                    .map(|m| m.and_then(|i| r.value(i)))
                    .collect(),
            });
        }
    }

    MeasurementTable {
        columns,
        has_timestamp: sites.iter().any(|s| s.table.has_timestamp),
        rows,
    }
}

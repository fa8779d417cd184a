use crate::models::MeasurementTable;
use serde::{Deserialize, Serialize};

/// What an empty site selection means at a given call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySelection {
    /// Nothing selected means no constraint: keep every row.
    ReturnAll,
    /// Nothing selected means nothing to show.
    ReturnNone,
}

/// Keep the rows whose site is in `selected`, in their original order.
///
/// The input is never modified; a new table with the same columns is returned.
pub fn filter_sites(
    table: &MeasurementTable,
    selected: &[String],
    on_empty: EmptySelection,
) -> MeasurementTable {
    if selected.is_empty() {
        return match on_empty {
            EmptySelection::ReturnAll => table.clone(),
            EmptySelection::ReturnNone => MeasurementTable {
                columns: table.columns.clone(),
                has_timestamp: table.has_timestamp,
                rows: Vec::new(),
            },
        };
    }
    MeasurementTable {
        columns: table.columns.clone(),
        has_timestamp: table.has_timestamp,
        rows: table
            .rows
            .iter()
            .filter(|r| selected.iter().any(|s| s == &r.site))
            .cloned()
            .collect(),
    }
}

use thiserror::Error;

/// Failure taxonomy of the loading and aggregation layers.
///
/// Loader failures are collected as per-site diagnostics and aggregation
/// failures become empty results, so most of these values are reported to the
/// user rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashError {
    /// A referenced CSV cannot be found, read, or parsed.
    #[error("data for site '{site}' is unavailable: {reason}")]
    SourceUnavailable { site: String, reason: String },

    /// A requested metric/column is absent from the table.
    #[error("column '{column}' not found ({context})")]
    SchemaMismatch { column: String, context: String },

    /// Every site failed to load, or the selection produced no rows.
    #[error("no data available: {0}")]
    NoDataAvailable(String),

    /// Registry or configuration problem (duplicate names, bad TOML, ...).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DashError {
    pub fn unavailable(site: &str, reason: impl std::fmt::Display) -> Self {
        DashError::SourceUnavailable {
            site: site.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn missing_column(column: &str, context: impl Into<String>) -> Self {
        DashError::SchemaMismatch {
            column: column.to_string(),
            context: context.into(),
        }
    }
}

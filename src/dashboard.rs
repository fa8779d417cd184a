//! Request-driven pipeline: load (cached) → combine → filter → aggregate.
//!
//! Each [`Dashboard::render`] call is an independent pass for one
//! [`Selection`]. Every panel comes back either with data or with a
//! [`Notice`] the presentation layer can show instead of a chart.

use crate::cache::LoadCache;
use crate::combine::combine;
use crate::config::DashboardConfig;
use crate::error::DashError;
use crate::filter::{EmptySelection, filter_sites};
use crate::loader::LoadDiagnostic;
use crate::models::{MeasurementTable, Selection};
use crate::series::{
    BoxSummary, MonthlySeries, ScatterSeries, box_summary, monthly_series, scatter_pairs,
};
use crate::stats::{
    Highlights, RegionMean, SiteRank, SiteSummary, TopRow, group_summary, highlight_max,
    monthly_means, rank_sites, region_means, top_n,
};
use log::debug;
use serde::Serialize;

/// User-facing message shown in place of a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    /// The dashboard policy treats an empty selection as "show nothing".
    EmptySelection,
    /// The selection matched no rows.
    NoData(String),
    /// A needed column is missing from the selected data.
    MissingColumn(String),
    /// The column exists but holds no usable values for this view.
    NoValues(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::EmptySelection => write!(f, "Please select at least one site."),
            Notice::NoData(msg) => write!(f, "No data available: {msg}"),
            Notice::MissingColumn(col) => {
                write!(f, "No '{col}' column found in the selected data.")
            }
            Notice::NoValues(col) => {
                write!(f, "No valid data available for {col} in the selected sites.")
            }
        }
    }
}

/// One view slot of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Panel<T> {
    Ready(T),
    Notice(Notice),
}

impl<T> Panel<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(t) => Some(t),
            Panel::Notice(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Panel::Ready(_) => None,
            Panel::Notice(n) => Some(n),
        }
    }
}

/// Rounded per-site statistics plus which site leads mean and median.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub metric: String,
    pub rows: Vec<SiteSummary>,
    pub highlights: Highlights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingView {
    pub metric: String,
    pub ranks: Vec<SiteRank>,
    /// Top-performing site, i.e. `ranks[0]`.
    pub leader: SiteRank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub x: String,
    pub y: String,
    pub series: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyView {
    pub metric: String,
    pub series: Vec<MonthlySeries>,
}

/// Everything one request produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub metric: String,
    /// Rows left after filtering.
    pub rows: usize,
    pub distribution: Panel<Vec<BoxSummary>>,
    pub summary: Panel<SummaryTable>,
    pub ranking: Panel<RankingView>,
    pub top_rows: Panel<Vec<TopRow>>,
    pub scatter: Panel<ScatterView>,
    pub monthly: Panel<MonthlyView>,
    pub regions: Panel<Vec<RegionMean>>,
}

impl DashboardView {
    fn all_notice(metric: &str, notice: Notice) -> Self {
        Self {
            metric: metric.to_string(),
            rows: 0,
            distribution: Panel::Notice(notice.clone()),
            summary: Panel::Notice(notice.clone()),
            ranking: Panel::Notice(notice.clone()),
            top_rows: Panel::Notice(notice.clone()),
            scatter: Panel::Notice(notice.clone()),
            monthly: Panel::Notice(notice.clone()),
            regions: Panel::Notice(notice),
        }
    }
}

/// Owns the configuration and the only cross-request state: the load cache.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    cache: LoadCache,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: LoadCache::new(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Names of the sites that loaded successfully, in registry order.
    pub fn available_sites(&mut self) -> Result<Vec<String>, DashError> {
        let loaded = self.cache.load(&self.config.registry, &self.config.loader)?;
        Ok(loaded.site_names())
    }

    /// Per-site failures of the (cached) load.
    pub fn diagnostics(&mut self) -> Result<Vec<LoadDiagnostic>, DashError> {
        let loaded = self.cache.load(&self.config.registry, &self.config.loader)?;
        Ok(loaded.diagnostics.clone())
    }

    /// Combined table of every loaded site.
    pub fn combined(&mut self) -> Result<MeasurementTable, DashError> {
        let loaded = self.cache.load(&self.config.registry, &self.config.loader)?;
        Ok(combine(&loaded.sites))
    }

    /// Combined table narrowed to `sites` under the filter utility's policy.
    pub fn filtered(&mut self, sites: &[String]) -> Result<MeasurementTable, DashError> {
        let on_empty = self.config.selection.filter;
        let combined = self.combined()?;
        Ok(filter_sites(&combined, sites, on_empty))
    }

    /// Drop the cached load so the next request re-reads storage.
    pub fn invalidate(&mut self) -> bool {
        self.cache.invalidate(&self.config.registry, &self.config.loader)
    }

    /// Run one full pass for `selection`.
    ///
    /// Only a load in which every site failed is an `Err`
    /// ([`DashError::NoDataAvailable`]); everything else is reported through
    /// panel notices.
    pub fn render(&mut self, selection: &Selection) -> Result<DashboardView, DashError> {
        let combined = self.combined()?;
        let policy = self.config.selection.dashboard;
        let metric = selection.metric.as_str();

        if selection.sites.is_empty() && policy == EmptySelection::ReturnNone {
            return Ok(DashboardView::all_notice(metric, Notice::EmptySelection));
        }
        let table = filter_sites(&combined, &selection.sites, policy);
        debug!(
            "render: {} of {} rows selected for metric '{metric}'",
            table.len(),
            combined.len()
        );
        if table.is_empty() {
            return Ok(DashboardView::all_notice(
                metric,
                Notice::NoData("the selection yields zero rows".into()),
            ));
        }

        let display = &self.config.display;
        let ranking_metric = display.ranking_metric.as_deref().unwrap_or(metric);
        let n = selection.top_n.unwrap_or(display.top_n);

        Ok(DashboardView {
            metric: metric.to_string(),
            rows: table.len(),
            distribution: panel(&table, &[metric], |t| {
                non_empty(box_summary(t, metric), metric)
            }),
            summary: panel(&table, &[metric], |t| {
                let raw = group_summary(t, metric);
                let highlights = highlight_max(&raw);
                Panel::Ready(SummaryTable {
                    metric: metric.to_string(),
                    rows: raw.iter().map(SiteSummary::rounded).collect(),
                    highlights,
                })
            }),
            ranking: panel(&table, &[ranking_metric], |t| {
                let ranks = rank_sites(t, ranking_metric);
                match ranks.first().cloned() {
                    Some(leader) => Panel::Ready(RankingView {
                        metric: ranking_metric.to_string(),
                        ranks,
                        leader,
                    }),
                    None => Panel::Notice(Notice::NoValues(ranking_metric.to_string())),
                }
            }),
            top_rows: panel(&table, &[metric], |t| non_empty(top_n(t, metric, n), metric)),
            scatter: panel(&table, &[display.scatter_x.as_str(), display.scatter_y.as_str()], |t| {
                let series = scatter_pairs(t, &display.scatter_x, &display.scatter_y);
                if series.is_empty() {
                    Panel::Notice(Notice::NoValues(format!(
                        "{} vs {}",
                        display.scatter_y, display.scatter_x
                    )))
                } else {
                    Panel::Ready(ScatterView {
                        x: display.scatter_x.clone(),
                        y: display.scatter_y.clone(),
                        series,
                    })
                }
            }),
            monthly: if table.has_timestamp {
                panel(&table, &[display.trend_metric.as_str()], |t| {
                    let series = monthly_series(&monthly_means(t, &display.trend_metric));
                    if series.is_empty() {
                        Panel::Notice(Notice::NoValues(display.trend_metric.clone()))
                    } else {
                        Panel::Ready(MonthlyView {
                            metric: display.trend_metric.clone(),
                            series,
                        })
                    }
                })
            } else {
                Panel::Notice(Notice::MissingColumn(self.config.loader.timestamp_column.clone()))
            },
            regions: if table.has_region() {
                panel(&table, &[metric], |t| non_empty(region_means(t, metric), metric))
            } else {
                Panel::Notice(Notice::MissingColumn("Region".into()))
            },
        })
    }
}

/// Run `build` only when every column in `needs` exists.
fn panel<T>(
    table: &MeasurementTable,
    needs: &[&str],
    build: impl FnOnce(&MeasurementTable) -> Panel<T>,
) -> Panel<T> {
    match needs.iter().find(|c| !table.has_column(c)) {
        Some(missing) => Panel::Notice(Notice::MissingColumn(missing.to_string())),
        None => build(table),
    }
}

fn non_empty<T>(items: Vec<T>, metric: &str) -> Panel<Vec<T>> {
    if items.is_empty() {
        Panel::Notice(Notice::NoValues(metric.to_string()))
    } else {
        Panel::Ready(items)
    }
}

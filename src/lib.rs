//! sdc-rs
//!
//! A lightweight Rust library for comparing solar-irradiance measurements
//! (GHI, DNI, DHI, temperature, wind, ...) across sites. Pairs with the `sdc` CLI.
//!
//! ### Features
//! - Load one CSV per site from a registry, skipping (and reporting) bad sources
//! - Combine the sites into one site-tagged table and filter by a selection
//! - Per-site statistics (count, mean, median, std, min, max), rankings,
//!   top-N rows, monthly means, region rankings
//! - Boxplot / ranking / scatter / monthly payloads and SVG charts from them
//!
//! ### Example
//! ```no_run
//! use sdc_rs::{Dashboard, DashboardConfig, Selection};
//!
//! let config = DashboardConfig::from_path("sdc.toml")?;
//! let mut dash = Dashboard::new(config);
//! let sites = dash.available_sites()?;
//! let view = dash.render(&Selection::new(sites, "GHI"))?;
//! if let Some(ranking) = view.ranking.ready() {
//!     println!("{} leads with {:.2} W/m²", ranking.leader.site, ranking.leader.mean);
//! }
//! sdc_rs::viz::write_charts(&view, "charts", 1000, 600)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod combine;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod series;
pub mod stats;
pub mod storage;
pub mod viz;

pub use config::{DashboardConfig, SiteRegistry};
pub use dashboard::{Dashboard, DashboardView, Notice, Panel};
pub use error::DashError;
pub use filter::EmptySelection;
pub use models::{Measurement, MeasurementTable, Selection, SiteSource, SiteTable};

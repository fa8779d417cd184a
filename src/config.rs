//! Site registry and dashboard configuration.
//!
//! The registry is the only persisted "state layout" of the system: an ordered
//! mapping from site name to CSV location. It is read once (TOML file, caller
//! supplied list, or the built-in default) and never mutated afterwards.
//!
//! ```toml
//! [[site]]
//! name = "Benin"
//! path = "data/benin-malanville_clean.csv"
//!
//! [selection]
//! filter = "return_all"
//! dashboard = "return_none"
//! ```

use crate::error::DashError;
use crate::filter::EmptySelection;
use crate::models::SiteSource;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Cleaned station files of the West Africa solar challenge data set.
const DEFAULT_SITES: [(&str, &str); 3] = [
    ("Benin", "benin-malanville_clean.csv"),
    ("Sierra Leone", "sierraleone-bumbuna_clean.csv"),
    ("Togo", "togo-dapaong_qc_clean.csv"),
];

/// Immutable, ordered site name → source location mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteRegistry {
    sites: Vec<SiteSource>,
}

impl SiteRegistry {
    /// Build a registry, rejecting empty or duplicate site names.
    pub fn new(sites: Vec<SiteSource>) -> Result<Self, DashError> {
        for (i, s) in sites.iter().enumerate() {
            if s.name.trim().is_empty() {
                return Err(DashError::Config(format!("site #{} has an empty name", i + 1)));
            }
            if sites[..i].iter().any(|o| o.name == s.name) {
                return Err(DashError::Config(format!("duplicate site name '{}'", s.name)));
            }
        }
        Ok(Self { sites })
    }

    /// Registry with a single ad hoc source.
    pub fn single<N: Into<String>, P: Into<PathBuf>>(name: N, path: P) -> Self {
        Self {
            sites: vec![SiteSource {
                name: name.into(),
                path: path.into(),
            }],
        }
    }

    /// The default three-country registry resolved under `data_dir`.
    pub fn default_in<P: AsRef<Path>>(data_dir: P) -> Self {
        let dir = data_dir.as_ref();
        Self {
            sites: DEFAULT_SITES
                .iter()
                .map(|(name, file)| SiteSource {
                    name: (*name).to_string(),
                    path: dir.join(file),
                })
                .collect(),
        }
    }

    pub fn sites(&self) -> &[SiteSource] {
        &self.sites
    }

    pub fn names(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Hex SHA-256 over every (name, path) pair in order; the load cache key.
    ///
    /// Paths are hashed as raw OS bytes, so non-UTF-8 paths stay distinct.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for s in &self.sites {
            let path = s.path.as_os_str().as_encoded_bytes();
            for part in [s.name.as_bytes(), path] {
                hasher.update((part.len() as u64).to_le_bytes());
                hasher.update(part);
            }
        }
        hex::encode(hasher.finalize())
    }

    fn resolve_relative(mut self, base: &Path) -> Self {
        for s in &mut self.sites {
            if s.path.is_relative() {
                s.path = base.join(&s.path);
            }
        }
        self
    }
}

/// How the loader reads and validates each source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// A source must carry at least one of these columns.
    pub required_any: Vec<String>,
    /// Header of the timestamp column (matched case-insensitively).
    pub timestamp_column: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            required_any: vec!["GHI".into(), "DNI".into(), "DHI".into()],
            timestamp_column: "Timestamp".into(),
        }
    }
}

/// Empty-selection behavior, one entry per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Used by the plain `filter_sites` utility and the CLI table commands.
    pub filter: EmptySelection,
    /// Used by the dashboard pipeline.
    pub dashboard: EmptySelection,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            filter: EmptySelection::ReturnAll,
            dashboard: EmptySelection::ReturnNone,
        }
    }
}

/// Which columns feed the fixed dashboard panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Metrics offered to the user for selection.
    pub metrics: Vec<String>,
    /// Metric for the site ranking; `None` ranks by the selected metric.
    pub ranking_metric: Option<String>,
    pub trend_metric: String,
    pub scatter_x: String,
    pub scatter_y: String,
    pub top_n: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            metrics: ["GHI", "DNI", "DHI", "Tamb", "WS", "RH", "BP"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            ranking_metric: Some("GHI".into()),
            trend_metric: "GHI".into(),
            scatter_x: "Tamb".into(),
            scatter_y: "GHI".into(),
            top_n: 10,
        }
    }
}

/// Everything the dashboard needs at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub registry: SiteRegistry,
    pub loader: LoaderOptions,
    pub selection: SelectionPolicy,
    pub display: DisplayOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    site: Vec<SiteSource>,
    loader: LoaderOptions,
    selection: SelectionPolicy,
    display: DisplayOptions,
}

impl DashboardConfig {
    /// Default settings around a caller-provided registry.
    pub fn with_registry(registry: SiteRegistry) -> Self {
        Self {
            registry,
            loader: LoaderOptions::default(),
            selection: SelectionPolicy::default(),
            display: DisplayOptions::default(),
        }
    }

    /// Parse TOML; relative site paths are resolved against `base_dir`.
    /// Without any `[[site]]` entry the default registry under `base_dir/data` is used.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, DashError> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| DashError::Config(e.to_string()))?;
        let registry = if raw.site.is_empty() {
            SiteRegistry::default_in(base_dir.join("data"))
        } else {
            SiteRegistry::new(raw.site)?.resolve_relative(base_dir)
        };
        Ok(Self {
            registry,
            loader: raw.loader,
            selection: raw.selection,
            display: raw.display,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DashError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DashError::Config(format!("{}: {e}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, base)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::with_registry(SiteRegistry::default_in("data"))
    }
}

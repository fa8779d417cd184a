//! Load-once memoization of [`LoadedSites`], keyed by registry content.

use crate::config::{LoaderOptions, SiteRegistry};
use crate::error::DashError;
use crate::loader::{LoadedSites, load_sites};
use log::info;
use std::collections::HashMap;

/// Explicit cache of loader results.
///
/// The key is the registry's content hash plus the loader options, so a
/// changed registry never sees a stale load. Source files are assumed static
/// for a session; call [`LoadCache::invalidate`] or [`LoadCache::clear`] to
/// force a re-read.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<String, LoadedSites>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(registry: &SiteRegistry, opts: &LoaderOptions) -> String {
        format!(
            "{}|{}|{}",
            registry.content_hash(),
            opts.timestamp_column,
            opts.required_any.join(",")
        )
    }

    /// Return the cached load for `registry`, reading storage on a miss.
    /// A failed load (`NoDataAvailable`) is not cached.
    pub fn load(
        &mut self,
        registry: &SiteRegistry,
        opts: &LoaderOptions,
    ) -> Result<&LoadedSites, DashError> {
        let key = Self::key(registry, opts);
        if self.entries.contains_key(&key) {
            info!("load cache hit for {} site(s)", registry.len());
        } else {
            let loaded = load_sites(registry, opts)?;
            self.entries.insert(key.clone(), loaded);
        }
        self.entries
            .get(&key)
            .ok_or_else(|| DashError::NoDataAvailable("load cache entry vanished".into()))
    }

    pub fn contains(&self, registry: &SiteRegistry, opts: &LoaderOptions) -> bool {
        self.entries.contains_key(&Self::key(registry, opts))
    }

    /// Drop the entry for one registry; returns whether one existed.
    pub fn invalidate(&mut self, registry: &SiteRegistry, opts: &LoaderOptions) -> bool {
        self.entries.remove(&Self::key(registry, opts)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

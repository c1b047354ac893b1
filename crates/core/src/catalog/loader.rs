use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use parking_lot::RwLock;
use tracing::info;

use crate::catalog::Catalog;

/// Where catalog data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Data set compiled into the binary.
    Builtin,
    /// JSON file on disk.
    File(PathBuf),
}

impl CatalogSource {
    /// Source for an optional configured path.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => CatalogSource::File(path),
            None => CatalogSource::Builtin,
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> String {
        match self {
            CatalogSource::Builtin => "built-in catalog".to_string(),
            CatalogSource::File(path) => path.display().to_string(),
        }
    }
}

/// Thread-safe catalog loader with a cached copy and a revision counter.
#[derive(Clone)]
pub struct CatalogLoader {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    source: CatalogSource,
    cache: Option<Catalog>,
    revision: u64,
}

impl CatalogLoader {
    /// Build a loader for the given source. Nothing is read until first use.
    pub fn new(source: CatalogSource) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                source,
                cache: None,
                revision: 0,
            })),
        }
    }

    /// Current source.
    pub fn source(&self) -> CatalogSource {
        self.inner.read().source.clone()
    }

    /// Revision of the cached catalog; bumps every time data is (re)read.
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Return the catalog, reading it on first use.
    pub fn catalog(&self) -> Result<Catalog> {
        let mut inner = self.inner.write();
        if inner.cache.is_none() {
            let catalog = read_source(&inner.source)?;
            inner.revision += 1;
            info!(
                source = %inner.source.describe(),
                listings = catalog.len(),
                revision = inner.revision,
                "Catalog loaded"
            );
            inner.cache = Some(catalog);
        }
        Ok(inner.cache.clone().unwrap_or_default())
    }

    /// Drop the cache and read the current source again.
    pub fn reload(&self) -> Result<Catalog> {
        self.inner.write().cache = None;
        self.catalog()
    }

    /// Point the loader at a new source; the next read picks it up.
    pub fn refresh(&self, source: CatalogSource) {
        let mut inner = self.inner.write();
        inner.source = source;
        inner.cache = None;
    }
}

fn read_source(source: &CatalogSource) -> Result<Catalog> {
    match source {
        CatalogSource::Builtin => Ok(Catalog::builtin().clone()),
        CatalogSource::File(path) => Catalog::from_path(path),
    }
}

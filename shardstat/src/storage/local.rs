//! Read-only index backend over a local directory.
//!
//! # Directory Layout
//!
//! ```text
//! index_dir/
//! └── index_19453/                 <- one directory per table
//!     ├── compactor-1.json         <- multi-tenant shard
//!     ├── tenant-a/                <- one directory per tenant
//!     │   ├── ingester-0.json      <- single-tenant shard
//!     │   └── ingester-1.json
//!     └── tenant-b/
//!         └── ingester-0.json
//! ```
//!
//! # Shard Format
//!
//! ```json
//! {
//!   "series": [
//!     {
//!       "tenant": "tenant-a",
//!       "labels": { "job": "api", "env": "prod" },
//!       "chunks": [ { "min_time": 0, "max_time": 999, "kb": 12, "entries": 340 } ]
//!     }
//!   ]
//! }
//! ```
//!
//! `tenant` is required in multi-tenant shards. In single-tenant shards it
//! defaults to the directory name and must match it when present.
//! `fingerprint` may be given per series; otherwise it is computed from the
//! labels.

use std::cell::OnceCell;
use std::fs::{self, File};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AnalyzerError, Result, StorageError};
use crate::index::{ChunkMeta, ChunkRef, IndexShard, IndexStore, Series, ShardScope};
use crate::labels::{Fingerprint, Labels};
use crate::matcher::LabelMatcher;
use crate::storage::memory::{MemoryShard, SeriesRecord};
use crate::window::TimeRange;

/// File extension of shard files.
const SHARD_EXTENSION: &str = "json";

#[derive(Debug, Deserialize)]
struct ShardFile {
    #[serde(default)]
    series: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    #[serde(default)]
    tenant: Option<String>,
    labels: Labels,
    #[serde(default)]
    fingerprint: Option<u64>,
    #[serde(default)]
    chunks: Vec<ChunkMeta>,
}

/// An [`IndexStore`] reading JSON shard files from a directory tree.
///
/// Shards are opened one at a time, during enumeration, and dropped once
/// the visitor returns. Multi-tenant shards are only decoded when a lookup
/// reads them.
#[derive(Debug, Clone)]
pub struct LocalIndexStore {
    root: PathBuf,
}

impl LocalIndexStore {
    /// Creates a store rooted at `root`. Nothing is read until enumeration.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn table_dir(&self, table: &str) -> Result<PathBuf> {
        let dir = self.root.join(table);
        if !dir.is_dir() {
            return Err(StorageError::TableNotFound {
                table: table.to_string(),
                path: dir,
            }
            .into());
        }
        Ok(dir)
    }
}

impl IndexStore for LocalIndexStore {
    fn for_each_shard(
        &self,
        table: &str,
        tenant: &str,
        visitor: &mut dyn FnMut(ShardScope, &dyn IndexShard) -> Result<()>,
    ) -> Result<()> {
        let table_dir = self.table_dir(table)?;

        let tenant_dir = table_dir.join(tenant);
        if tenant_dir.is_dir() {
            for path in list_shard_files(&tenant_dir)? {
                let shard = open_shard(&path, Some(tenant))?;
                debug!(path = %path.display(), series = shard.len(), "opened single-tenant shard");
                visitor(ShardScope::SingleTenant, &shard)?;
            }
        }

        for path in list_shard_files(&table_dir)? {
            debug!(path = %path.display(), "found multi-tenant shard");
            visitor(ShardScope::MultiTenant, &LazyShard::new(&path))?;
        }

        Ok(())
    }

    fn list_tenants(&self, table: &str) -> Result<Vec<String>> {
        let table_dir = self.table_dir(table)?;
        let mut tenants = Vec::new();
        for entry in read_dir(&table_dir)? {
            let entry = entry.map_err(|source| StorageError::Listing {
                path: table_dir.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                tenants.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        tenants.sort();
        Ok(tenants)
    }
}

/// A multi-tenant shard file, mapped and decoded on its first lookup.
struct LazyShard<'p> {
    path: &'p Path,
    decoded: OnceCell<MemoryShard>,
}

impl<'p> LazyShard<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            path,
            decoded: OnceCell::new(),
        }
    }

    fn shard(&self) -> Result<&MemoryShard> {
        if let Some(shard) = self.decoded.get() {
            return Ok(shard);
        }
        let shard = open_shard(self.path, None)?;
        debug!(path = %self.path.display(), series = shard.len(), "opened multi-tenant shard");
        Ok(self.decoded.get_or_init(|| shard))
    }
}

impl IndexShard for LazyShard<'_> {
    fn series(
        &self,
        tenant: &str,
        window: TimeRange,
        out: &mut Vec<Series>,
        matchers: &[LabelMatcher],
    ) -> Result<()> {
        self.shard()?.series(tenant, window, out, matchers)
    }

    fn chunk_refs(
        &self,
        tenant: &str,
        window: TimeRange,
        out: &mut Vec<ChunkRef>,
        matchers: &[LabelMatcher],
    ) -> Result<()> {
        self.shard()?.chunk_refs(tenant, window, out, matchers)
    }

    fn for_each_series(
        &self,
        tenant: &str,
        matchers: &[LabelMatcher],
        window: TimeRange,
        visitor: &mut dyn FnMut(&Labels, Fingerprint, &[ChunkMeta]) -> ControlFlow<()>,
    ) -> Result<()> {
        self.shard()?.for_each_series(tenant, matchers, window, visitor)
    }
}

fn read_dir(dir: &Path) -> Result<fs::ReadDir> {
    fs::read_dir(dir).map_err(|source| {
        StorageError::Listing {
            path: dir.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Shard files directly inside `dir`, in file-name order.
fn list_shard_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        let path = entry
            .map_err(|source| StorageError::Listing {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SHARD_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Maps and decodes one shard file.
///
/// `owner` is the tenant of a single-tenant shard, `None` for a
/// multi-tenant one.
fn open_shard(path: &Path, owner: Option<&str>) -> Result<MemoryShard> {
    let file = File::open(path).map_err(|source| StorageError::ShardOpen {
        path: path.to_path_buf(),
        source,
    })?;

    // SAFETY: The map is read-only and dropped before this function returns.
    // Index files are immutable once written.
    let mmap = unsafe {
        Mmap::map(&file).map_err(|source| StorageError::ShardOpen {
            path: path.to_path_buf(),
            source,
        })?
    };

    let decoded: ShardFile =
        serde_json::from_slice(&mmap).map_err(|source| StorageError::ShardParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut shard = MemoryShard::new();
    for (i, entry) in decoded.series.into_iter().enumerate() {
        let tenant = match (owner, entry.tenant) {
            (Some(owner), Some(tenant)) if tenant != owner => {
                return Err(corrupted(
                    path,
                    format!("series {i} names tenant '{tenant}' inside the shard of '{owner}'"),
                ));
            }
            (Some(owner), _) => owner.to_string(),
            (None, Some(tenant)) => tenant,
            (None, None) => {
                return Err(corrupted(
                    path,
                    format!("series {i} has no tenant in a multi-tenant shard"),
                ));
            }
        };

        if let Some(chunk) = entry.chunks.iter().find(|c| c.min_time > c.max_time) {
            return Err(corrupted(
                path,
                format!(
                    "series {i} has a chunk ending before it starts ({}..{})",
                    chunk.min_time, chunk.max_time
                ),
            ));
        }

        let fingerprint = entry
            .fingerprint
            .map_or_else(|| entry.labels.fingerprint(), Fingerprint);
        shard.push_record(SeriesRecord {
            tenant,
            labels: entry.labels,
            fingerprint,
            chunks: entry.chunks,
        });
    }

    Ok(shard)
}

fn corrupted(path: &Path, reason: String) -> AnalyzerError {
    StorageError::CorruptedShard {
        path: path.to_path_buf(),
        reason,
    }
    .into()
}

//! In-memory index backend.
//!
//! [`MemoryShard`] is also the decoded form of on-disk shards, so the local
//! backend shares its lookup logic.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use crate::error::Result;
use crate::index::{ChunkMeta, ChunkRef, IndexShard, IndexStore, Series, ShardScope};
use crate::labels::{Fingerprint, Labels};
use crate::matcher::{LabelMatcher, matches_all};
use crate::window::TimeRange;

/// One series stored in a [`MemoryShard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRecord {
    /// Tenant owning the series.
    pub tenant: String,
    /// The series label set.
    pub labels: Labels,
    /// The series fingerprint.
    pub fingerprint: Fingerprint,
    /// Chunks in time order.
    pub chunks: Vec<ChunkMeta>,
}

impl SeriesRecord {
    fn selected(&self, tenant: &str, matchers: &[LabelMatcher]) -> bool {
        self.tenant == tenant && matches_all(matchers, &self.labels)
    }

    fn overlapping(&self, window: TimeRange) -> impl Iterator<Item = &ChunkMeta> {
        self.chunks
            .iter()
            .filter(move |c| window.overlaps(c.min_time, c.max_time))
    }
}

/// A shard held entirely in memory. Series are visited in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryShard {
    series: Vec<SeriesRecord>,
}

impl MemoryShard {
    /// Creates an empty shard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series, fingerprinting it from its labels.
    pub fn push(&mut self, tenant: impl Into<String>, labels: Labels, chunks: Vec<ChunkMeta>) {
        let fingerprint = labels.fingerprint();
        self.push_record(SeriesRecord {
            tenant: tenant.into(),
            labels,
            fingerprint,
            chunks,
        });
    }

    /// Adds a fully specified series.
    pub fn push_record(&mut self, record: SeriesRecord) {
        self.series.push(record);
    }

    /// Number of series in the shard, across all tenants.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the shard holds no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl IndexShard for MemoryShard {
    fn series(
        &self,
        tenant: &str,
        window: TimeRange,
        out: &mut Vec<Series>,
        matchers: &[LabelMatcher],
    ) -> Result<()> {
        out.extend(
            self.series
                .iter()
                .filter(|s| s.selected(tenant, matchers) && s.overlapping(window).next().is_some())
                .map(|s| Series {
                    labels: s.labels.clone(),
                    fingerprint: s.fingerprint,
                }),
        );
        Ok(())
    }

    fn chunk_refs(
        &self,
        tenant: &str,
        window: TimeRange,
        out: &mut Vec<ChunkRef>,
        matchers: &[LabelMatcher],
    ) -> Result<()> {
        for record in self.series.iter().filter(|s| s.selected(tenant, matchers)) {
            out.extend(record.overlapping(window).map(|c| ChunkRef {
                tenant: record.tenant.clone(),
                fingerprint: record.fingerprint,
                start: c.min_time,
                end: c.max_time,
                checksum: c.checksum,
            }));
        }
        Ok(())
    }

    fn for_each_series(
        &self,
        tenant: &str,
        matchers: &[LabelMatcher],
        window: TimeRange,
        visitor: &mut dyn FnMut(&Labels, Fingerprint, &[ChunkMeta]) -> ControlFlow<()>,
    ) -> Result<()> {
        let mut chunks = Vec::new();
        for record in self.series.iter().filter(|s| s.selected(tenant, matchers)) {
            chunks.clear();
            chunks.extend(record.overlapping(window).copied());
            if chunks.is_empty() {
                continue;
            }
            if visitor(&record.labels, record.fingerprint, &chunks).is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ShardEntry {
    table: String,
    owner: Option<String>,
    shard: MemoryShard,
}

/// An [`IndexStore`] over in-memory shards.
///
/// Single-tenant shards are registered under their owning tenant.
/// Multi-tenant shards belong to the table and are enumerated for every
/// tenant, after that tenant's own shards.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexStore {
    shards: Vec<ShardEntry>,
}

impl MemoryIndexStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shard. `tenant` is ignored for multi-tenant shards.
    pub fn add_shard(
        &mut self,
        table: impl Into<String>,
        tenant: impl Into<String>,
        scope: ShardScope,
        shard: MemoryShard,
    ) {
        let owner = match scope {
            ShardScope::SingleTenant => Some(tenant.into()),
            ShardScope::MultiTenant => None,
        };
        self.shards.push(ShardEntry {
            table: table.into(),
            owner,
            shard,
        });
    }

    fn in_table<'s>(&'s self, table: &'s str) -> impl Iterator<Item = &'s ShardEntry> {
        self.shards.iter().filter(move |e| e.table == table)
    }
}

impl IndexStore for MemoryIndexStore {
    fn for_each_shard(
        &self,
        table: &str,
        tenant: &str,
        visitor: &mut dyn FnMut(ShardScope, &dyn IndexShard) -> Result<()>,
    ) -> Result<()> {
        for entry in self
            .in_table(table)
            .filter(|e| e.owner.as_deref() == Some(tenant))
        {
            visitor(ShardScope::SingleTenant, &entry.shard)?;
        }
        for entry in self.in_table(table).filter(|e| e.owner.is_none()) {
            visitor(ShardScope::MultiTenant, &entry.shard)?;
        }
        Ok(())
    }

    fn list_tenants(&self, table: &str) -> Result<Vec<String>> {
        let tenants: BTreeSet<&str> = self
            .in_table(table)
            .filter_map(|e| e.owner.as_deref())
            .collect();
        Ok(tenants.into_iter().map(str::to_string).collect())
    }
}

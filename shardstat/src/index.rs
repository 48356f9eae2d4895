//! Capability surface of the index storage the analyzer reads from.
//!
//! The analyzer never knows how shards are persisted. A backend hands it
//! shards through [`IndexStore::for_each_shard`], and each shard answers the
//! three lookups of [`IndexShard`]. Lookups append into caller-owned buffers
//! so the caller can reuse one allocation across shards.
//!
//! # Selection rules
//!
//! A series is selected by a lookup when it belongs to the requested tenant,
//! satisfies every matcher, and has at least one chunk overlapping the
//! window. [`IndexShard::for_each_series`] hands the visitor only the
//! overlapping chunks.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::labels::{Fingerprint, Labels};
use crate::matcher::LabelMatcher;
use crate::window::TimeRange;

/// Metadata for one stored chunk of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// First sample timestamp (ms).
    pub min_time: i64,
    /// Last sample timestamp (ms).
    pub max_time: i64,
    /// Checksum of the chunk payload.
    #[serde(default)]
    pub checksum: u32,
    /// Encoded size in kilobytes.
    #[serde(default)]
    pub kb: u32,
    /// Number of entries in the chunk.
    #[serde(default)]
    pub entries: u32,
}

impl ChunkMeta {
    /// Creates chunk metadata covering `[min_time, max_time]`.
    pub fn new(min_time: i64, max_time: i64) -> Self {
        Self {
            min_time,
            max_time,
            checksum: 0,
            kb: 0,
            entries: 0,
        }
    }
}

/// A series returned by a filtered lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// The series label set.
    pub labels: Labels,
    /// The series fingerprint.
    pub fingerprint: Fingerprint,
}

/// A reference to one stored chunk of a matched series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRef {
    /// Tenant owning the chunk.
    pub tenant: String,
    /// Fingerprint of the series the chunk belongs to.
    pub fingerprint: Fingerprint,
    /// First sample timestamp (ms).
    pub start: i64,
    /// Last sample timestamp (ms).
    pub end: i64,
    /// Checksum of the chunk payload.
    pub checksum: u32,
}

/// Whether a shard holds data for one tenant or for several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShardScope {
    /// Every series in the shard belongs to the enumerated tenant.
    SingleTenant,
    /// The shard mixes tenants; per-tenant attribution is ambiguous.
    MultiTenant,
}

impl ShardScope {
    /// Returns true for [`ShardScope::MultiTenant`].
    pub fn is_multi_tenant(self) -> bool {
        self == Self::MultiTenant
    }
}

/// Read access to one index shard.
pub trait IndexShard {
    /// Appends the series of `tenant` selected by `matchers` within `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shard cannot be read.
    fn series(
        &self,
        tenant: &str,
        window: TimeRange,
        out: &mut Vec<Series>,
        matchers: &[LabelMatcher],
    ) -> Result<()>;

    /// Appends one reference per chunk overlapping `window` of every series
    /// of `tenant` selected by `matchers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shard cannot be read.
    fn chunk_refs(
        &self,
        tenant: &str,
        window: TimeRange,
        out: &mut Vec<ChunkRef>,
        matchers: &[LabelMatcher],
    ) -> Result<()>;

    /// Calls `visitor` once per selected series with its overlapping chunks.
    ///
    /// The scan stops early when the visitor returns [`ControlFlow::Break`].
    ///
    /// # Errors
    ///
    /// Returns an error if the shard cannot be read.
    fn for_each_series(
        &self,
        tenant: &str,
        matchers: &[LabelMatcher],
        window: TimeRange,
        visitor: &mut dyn FnMut(&Labels, Fingerprint, &[ChunkMeta]) -> ControlFlow<()>,
    ) -> Result<()>;
}

/// Enumerates index shards per table and tenant.
pub trait IndexStore {
    /// Calls `visitor` for every shard covering `table` and `tenant`.
    ///
    /// Enumeration stops at the first visitor error, which is returned.
    ///
    /// # Errors
    ///
    /// Returns the storage error or the first visitor error.
    fn for_each_shard(
        &self,
        table: &str,
        tenant: &str,
        visitor: &mut dyn FnMut(ShardScope, &dyn IndexShard) -> Result<()>,
    ) -> Result<()>;

    /// Lists the tenants that own single-tenant shards in `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be listed.
    fn list_tenants(&self, table: &str) -> Result<Vec<String>>;
}

//! Integration tests for the local directory backend.
//!
//! Each test lays out an index directory in a temp dir, then runs the full
//! analysis through `LocalIndexStore`.

use std::fs;
use std::path::Path;

use serde_json::json;
use shardstat::error::StorageError;
use shardstat::storage::LocalIndexStore;
use shardstat::{AnalysisConfig, AnalyzerError, IndexStore, ShardScope, analyze};
use tempfile::tempdir;

const TABLE: &str = "index_19453";

/// Writes a shard file whose series carry `chunk_counts` chunks each.
fn write_shard(path: &Path, tenant: Option<&str>, job: &str, chunk_counts: &[i64]) {
    let series: Vec<_> = chunk_counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let chunks: Vec<_> = (0..count)
                .map(|c| json!({ "min_time": c * 1_000, "max_time": c * 1_000 + 999 }))
                .collect();
            let mut entry = json!({
                "labels": { "job": job, "pod": format!("pod-{i}") },
                "chunks": chunks,
            });
            if let Some(tenant) = tenant {
                entry["tenant"] = json!(tenant);
            }
            entry
        })
        .collect();

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, json!({ "series": series }).to_string()).unwrap();
}

#[test]
fn test_local_end_to_end() {
    let dir = tempdir().unwrap();
    let table = dir.path().join(TABLE);

    write_shard(&table.join("tenant-a/ingester-0.json"), None, "api", &[2, 3]);
    write_shard(&table.join("tenant-a/ingester-1.json"), None, "web", &[1500]);
    write_shard(&table.join("tenant-b/ingester-0.json"), Some("tenant-b"), "api", &[4]);
    write_shard(&table.join("compactor.json"), Some("tenant-a"), "api", &[9000]);
    fs::write(table.join("README.txt"), "not a shard").unwrap();

    let store = LocalIndexStore::new(dir.path());
    assert_eq!(store.list_tenants(TABLE).unwrap(), vec!["tenant-a", "tenant-b"]);

    let config = AnalysisConfig::new(TABLE).with_label_filters(["job=api"]);
    let summary = analyze(&store, &config).unwrap();

    // job=api: tenant-a has 2 series / 5 chunks, tenant-b has 1 series / 4 chunks.
    assert_eq!(summary.total_series, 3);
    assert_eq!(summary.total_chunks, 9);
    // The web series is only seen by the unfiltered scan; the compactor shard is skipped.
    assert_eq!(summary.max_chunks_per_series, 1500);
    assert_eq!(summary.series_over_threshold, 1);
    assert_eq!(summary.shards_analyzed, 3);
    assert_eq!(summary.shards_skipped, 2);
}

#[test]
fn test_enumeration_order() {
    let dir = tempdir().unwrap();
    let table = dir.path().join(TABLE);
    write_shard(&table.join("a.json"), Some("t"), "x", &[1]);
    write_shard(&table.join("t/b.json"), None, "x", &[1]);
    write_shard(&table.join("t/a.json"), None, "x", &[1]);

    let store = LocalIndexStore::new(dir.path());
    let mut scopes = Vec::new();
    store
        .for_each_shard(TABLE, "t", &mut |scope, _| {
            scopes.push(scope);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        scopes,
        vec![
            ShardScope::SingleTenant,
            ShardScope::SingleTenant,
            ShardScope::MultiTenant
        ]
    );
}

#[test]
fn test_missing_table_is_fatal() {
    let dir = tempdir().unwrap();
    let store = LocalIndexStore::new(dir.path());
    let config = AnalysisConfig::new("index_1").with_tenants(["t"]);

    assert!(matches!(
        analyze(&store, &config),
        Err(AnalyzerError::Storage(StorageError::TableNotFound { .. }))
    ));
    assert!(store.list_tenants("index_1").is_err());
}

#[test]
fn test_unknown_tenant_has_no_shards() {
    let dir = tempdir().unwrap();
    write_shard(&dir.path().join(TABLE).join("t/a.json"), None, "x", &[1]);

    let store = LocalIndexStore::new(dir.path());
    let config = AnalysisConfig::new(TABLE).with_tenants(["nobody"]);
    let summary = analyze(&store, &config).unwrap();

    assert_eq!(summary.shards_analyzed, 0);
    assert_eq!(summary.total_series, 0);
}

#[test]
fn test_corrupted_shard_aborts_run() {
    let dir = tempdir().unwrap();
    let table = dir.path().join(TABLE);
    write_shard(&table.join("t1/a.json"), None, "x", &[1]);
    fs::create_dir_all(table.join("t2")).unwrap();
    fs::write(table.join("t2/a.json"), "{\"series\": [").unwrap();

    let store = LocalIndexStore::new(dir.path());
    let config = AnalysisConfig::new(TABLE);

    assert!(matches!(
        analyze(&store, &config),
        Err(AnalyzerError::Storage(StorageError::ShardParse { .. }))
    ));
}

#[test]
fn test_malformed_multi_tenant_shard_is_skipped_unread() {
    let dir = tempdir().unwrap();
    let table = dir.path().join(TABLE);
    write_shard(&table.join("t1/a.json"), None, "api", &[2, 3]);
    // Series without a tenant would be corrupt in a multi-tenant shard.
    write_shard(&table.join("mt.json"), None, "api", &[7]);
    fs::write(table.join("broken.json"), "{\"series\": [").unwrap();

    let store = LocalIndexStore::new(dir.path());
    let config = AnalysisConfig::new(TABLE).with_tenants(["t1"]);
    let summary = analyze(&store, &config).unwrap();

    assert_eq!(summary.total_series, 2);
    assert_eq!(summary.total_chunks, 5);
    assert_eq!(summary.shards_analyzed, 1);
    assert_eq!(summary.shards_skipped, 2);
}

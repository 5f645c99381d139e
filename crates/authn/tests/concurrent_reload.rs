//! Concurrency tests for `CredentialCache` lookups racing bulk reloads.
//!
//! Every record written in round `g` carries `g` in both its secret and its
//! display name, so a record that mixed two rounds would be detectable.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use dfs_common_authn::{AuthGate, AuthVerdict, CredentialCache, testutil::sign_request};
use dfs_common_storage::{CredentialRecord, CredentialStore, MemoryCredentialStore, StorageResult};
use tokio::task::JoinSet;

/// Number of concurrent reader tasks.
const READERS: usize = 8;

/// Number of reload rounds the writer performs.
const ROUNDS: usize = 50;

/// Keys returned by the bulk load.
const BULK_KEYS: usize = 16;

/// Keys only reachable through single-record fetches.
const LAZY_KEYS: usize = 8;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bulk_key(i: usize) -> String {
    format!("bulk-{i:03}")
}

fn lazy_key(i: usize) -> String {
    format!("lazy-{i:03}")
}

fn versioned(app_key: &str, round: usize) -> CredentialRecord {
    CredentialRecord::builder()
        .app_key(app_key)
        .app_secret(format!("secret-{round}"))
        .name(format!("round-{round}"))
        .build()
}

fn round_of(record: &CredentialRecord) -> usize {
    let from_secret: usize = record.secret().trim_start_matches("secret-").parse().unwrap();
    let from_name: usize =
        record.name.as_deref().unwrap().trim_start_matches("round-").parse().unwrap();
    assert_eq!(from_secret, from_name, "record mixes rounds: {record:?}");
    from_secret
}

/// Store whose bulk load only returns `bulk-*` rows, so `lazy-*` rows are
/// always filled through the miss path.
#[derive(Clone, Default)]
struct PartialBulkStore {
    rows: MemoryCredentialStore,
}

impl PartialBulkStore {
    fn write_round(&self, round: usize) {
        for i in 0..BULK_KEYS {
            self.rows.insert(versioned(&bulk_key(i), round));
        }
        for i in 0..LAZY_KEYS {
            self.rows.insert(versioned(&lazy_key(i), round));
        }
    }
}

#[async_trait]
impl CredentialStore for PartialBulkStore {
    async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>> {
        let rows = self.rows.fetch_all().await?;
        Ok(rows.into_iter().filter(|r| r.app_key.starts_with("bulk-")).collect())
    }

    async fn fetch_by_key(&self, app_key: &str) -> StorageResult<Option<CredentialRecord>> {
        tokio::task::yield_now().await;
        self.rows.fetch_by_key(app_key).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Readers hammer every key while a writer bumps the round and reloads.
/// No reader may see a mixed record, a bulk key may never go missing, and
/// rounds observed by one reader for one key never go backwards once the
/// key is served from a bulk snapshot.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_mixed_records_during_reload() {
    let store = PartialBulkStore::default();
    store.write_round(0);
    let cache = Arc::new(CredentialCache::new(Arc::new(store.clone())));
    cache.reload().await.expect("initial reload");

    let done = Arc::new(AtomicBool::new(false));
    let mut readers = JoinSet::new();
    for reader in 0..READERS {
        let cache = Arc::clone(&cache);
        let done = Arc::clone(&done);
        readers.spawn(async move {
            let mut last_bulk_round = vec![0usize; BULK_KEYS];
            let mut lookups = 0usize;
            while !done.load(Ordering::Acquire) {
                for (i, last) in last_bulk_round.iter_mut().enumerate() {
                    let record = cache
                        .get(&bulk_key(i))
                        .await
                        .expect("store is healthy")
                        .unwrap_or_else(|| panic!("bulk key {i} vanished during reload"));
                    let round = round_of(&record);
                    assert!(round >= *last, "reader {reader} saw round go back on key {i}");
                    *last = round;
                    lookups += 1;
                }
                let lazy = cache.get(&lazy_key(reader % LAZY_KEYS)).await;
                round_of(&lazy.expect("store is healthy").expect("lazy key exists"));
                lookups += 1;
                tokio::task::yield_now().await;
            }
            lookups
        });
    }

    for round in 1..=ROUNDS {
        store.write_round(round);
        cache.reload().await.expect("reload");
        tokio::task::yield_now().await;
    }
    done.store(true, Ordering::Release);

    let mut total = 0;
    while let Some(result) = readers.join_next().await {
        total += result.expect("reader should not panic");
    }
    assert!(total > 0);

    // Whatever survived in the cache belongs to the final round: lazy
    // fetches that overlapped a reload were never published.
    for i in 0..BULK_KEYS {
        assert_eq!(round_of(&cache.get(&bulk_key(i)).await.unwrap().unwrap()), ROUNDS);
    }
    for i in 0..LAZY_KEYS {
        if cache.contains(&lazy_key(i)) {
            assert_eq!(round_of(&cache.get(&lazy_key(i)).await.unwrap().unwrap()), ROUNDS);
        }
    }
}

/// Many tasks verifying the same app while reloads run all succeed; the
/// snapshot swap never makes a known app look unknown.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn verification_stays_ok_across_reloads() {
    let store = MemoryCredentialStore::new();
    store.insert(
        CredentialRecord::builder().app_key("app1").app_secret("s3cr3t".to_owned()).build(),
    );
    let cache = Arc::new(CredentialCache::new(Arc::new(store.clone())));
    cache.reload().await.expect("initial reload");
    let gate = Arc::new(AuthGate::new(Arc::clone(&cache)));

    let now = chrono::Utc::now();
    let ts = now.timestamp().to_string();
    let sign = sign_request("app1", "s3cr3t", &ts);

    let mut verifiers = JoinSet::new();
    for _ in 0..READERS {
        let gate = Arc::clone(&gate);
        let ts = ts.clone();
        let sign = sign.clone();
        verifiers.spawn(async move {
            for _ in 0..200 {
                let verdict =
                    gate.verify_at("app1", &ts, &sign, now).await.expect("no store errors");
                assert_eq!(verdict, AuthVerdict::Ok);
            }
        });
    }

    for _ in 0..ROUNDS {
        cache.reload().await.expect("reload");
        tokio::task::yield_now().await;
    }

    while let Some(result) = verifiers.join_next().await {
        result.expect("verifier should not panic");
    }
    assert_eq!(cache.stats().reloads, ROUNDS as u64 + 1);
}

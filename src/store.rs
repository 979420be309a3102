//! Manages the persistence, retrieval, and filtering of journal entries.
//!
//! The store owns no ambient state: the primary port, the fallback mirror,
//! and the clock are all injected at construction. It imposes no mutual
//! exclusion; overlapping saves for the same id race and the last write
//! wins, which is the intended behavior for a single-user consumer.

use log::{debug, info, warn};

use crate::{
    Clock, Entry, EntryPatch, FailoverPolicy, FallbackStore, PrimaryStore, Result, SystemClock,
    generate_id,
};

/// Prefix namespacing entry records in both stores. Anything outside this
/// namespace is ignored during listing.
const ENTRY_PREFIX: &str = "entry:";

/// The entry store: a CRUD facade over a primary asynchronous key-value
/// port with a synchronous fallback mirror.
pub struct EntryStore<P, F, C = SystemClock> {
    primary: P,
    fallback: F,
    clock: C,
    policy: FailoverPolicy,
}

impl<P, F> EntryStore<P, F, SystemClock>
where
    P: PrimaryStore,
    F: FallbackStore,
{
    /// Creates a store over the given ports, stamped by the system clock.
    pub fn new(primary: P, fallback: F) -> Self {
        Self::with_clock(primary, fallback, SystemClock)
    }
}

impl<P, F, C> EntryStore<P, F, C>
where
    P: PrimaryStore,
    F: FallbackStore,
    C: Clock,
{
    pub fn with_clock(primary: P, fallback: F, clock: C) -> Self {
        EntryStore {
            primary,
            fallback,
            clock,
            policy: FailoverPolicy,
        }
    }

    /// The injected primary port.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// The injected fallback port.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    fn key_for(id: &str) -> String {
        format!("{}{}", ENTRY_PREFIX, id)
    }

    /// Constructs an in-memory entry with a fresh id and the given content.
    /// Pure with respect to storage; nothing is persisted until
    /// [`save_entry`](Self::save_entry) is called.
    pub fn new_entry(&self, content: impl Into<String>) -> Entry {
        let now = self.clock.now_millis();
        let entry = Entry {
            id: generate_id(),
            content: content.into(),
            mood: None,
            mood_score: None,
            summary: None,
            created_at: now,
            updated_at: now,
        };
        debug!("Created new entry {}", entry.id);
        entry
    }

    /// Persists an entry under its namespaced key, overwriting any
    /// existing record with the same id.
    ///
    /// If the primary write fails, a JSON copy is written to the fallback
    /// mirror and the call still fails with `StorageFailed`: the caller
    /// must treat the save as failed and may not assume the mirror copy is
    /// authoritative.
    pub async fn save_entry(&self, entry: &Entry) -> Result<()> {
        let key = Self::key_for(&entry.id);
        debug!("Saving entry {}", entry.id);

        let json = serde_json::to_string(entry)?;
        self.policy
            .write("save", self.primary.put(&key, entry), || {
                self.fallback.set_raw(&key, &json)
            })
            .await
    }

    /// Returns the entry for `id`, or `None` if absent.
    ///
    /// A primary read failure falls back to the mirror copy; malformed
    /// mirror data is treated as absence. This never errors for a missing
    /// key.
    pub async fn get_entry(&self, id: &str) -> Option<Entry> {
        let key = Self::key_for(id);
        self.policy
            .read("get", self.primary.get(&key), || {
                let raw = self.fallback.get_raw(&key)?;
                match serde_json::from_str(&raw) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping malformed mirror record for {}: {}", id, e);
                        None
                    }
                }
            })
            .await
    }

    async fn list_from_primary(&self) -> Result<Vec<Entry>> {
        let keys = self.primary.keys().await?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys.iter().filter(|k| k.starts_with(ENTRY_PREFIX)) {
            if let Some(entry) = self.primary.get(key).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Recovery scan over the mirror's key space. Unparsable records are
    /// skipped; entries that were never mirrored are silently missing.
    fn list_from_fallback(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        for key in self.fallback.keys() {
            if !key.starts_with(ENTRY_PREFIX) {
                continue;
            }
            let Some(raw) = self.fallback.get_raw(&key) else {
                continue;
            };
            match serde_json::from_str::<Entry>(&raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping malformed mirror record under {}: {}", key, e),
            }
        }
        entries
    }

    /// Returns all persisted entries ordered newest first by `created_at`,
    /// ties broken by `id` descending so pagination stays stable. With
    /// `limit`, returns at most that many from the head.
    pub async fn list_entries(&self, limit: Option<usize>) -> Vec<Entry> {
        let mut entries = self
            .policy
            .read("list", self.list_from_primary(), || self.list_from_fallback())
            .await;

        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Removes the entry from both stores. Deleting an id that does not
    /// exist is not an error; failures from either store propagate.
    pub async fn delete_entry(&self, id: &str) -> Result<()> {
        let key = Self::key_for(id);
        info!("Deleting entry {}", id);

        self.primary.remove(&key).await?;
        self.fallback.remove(&key)?;
        Ok(())
    }

    /// Returns the entries whose content or summary contains `query` as a
    /// case-insensitive substring. No tokenization, no ranking; an empty
    /// query returns every entry.
    pub async fn search_entries(&self, query: &str) -> Vec<Entry> {
        let needle = query.to_lowercase();
        self.list_entries(None)
            .await
            .into_iter()
            .filter(|entry| {
                entry.content.to_lowercase().contains(&needle)
                    || entry
                        .summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Count of all persisted entries. Plan-limit enforcement is the
    /// caller's business, not the store's.
    pub async fn entries_count(&self) -> usize {
        self.list_entries(None).await.len()
    }

    /// Entries with `created_at` inside `[start, end]`, both bounds
    /// inclusive, epoch milliseconds.
    pub async fn entries_by_date_range(&self, start: i64, end: i64) -> Vec<Entry> {
        self.list_entries(None)
            .await
            .into_iter()
            .filter(|entry| entry.created_at >= start && entry.created_at <= end)
            .collect()
    }

    /// Reads the entry, merges the patch over it (`id` and `created_at`
    /// are immutable by construction), bumps `updated_at`, and persists.
    ///
    /// Returns `Ok(None)` when no entry exists for `id`; a failed save
    /// propagates its error.
    pub async fn update_entry(&self, id: &str, patch: EntryPatch) -> Result<Option<Entry>> {
        let Some(mut entry) = self.get_entry(id).await else {
            debug!("Cannot update entry {}: not found", id);
            return Ok(None);
        };

        patch.apply(&mut entry);
        entry.updated_at = self.clock.now_millis();

        self.save_entry(&entry).await?;
        info!("Entry {} updated", id);
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DaybookError, ManualClock, MemoryMirror, MemoryStore, Mood};

    /// Primary stub whose every operation fails, simulating an
    /// unavailable or quota-exhausted backend.
    struct FailingPrimary;

    fn unavailable() -> DaybookError {
        DaybookError::ApplicationError {
            message: "primary store unavailable".to_string(),
        }
    }

    impl PrimaryStore for FailingPrimary {
        async fn get(&self, _key: &str) -> Result<Option<Entry>> {
            Err(unavailable())
        }

        async fn put(&self, _key: &str, _entry: &Entry) -> Result<()> {
            Err(unavailable())
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(unavailable())
        }

        async fn keys(&self) -> Result<Vec<String>> {
            Err(unavailable())
        }
    }

    fn memory_store(
        start: i64,
    ) -> (
        EntryStore<MemoryStore, MemoryMirror, ManualClock>,
        ManualClock,
    ) {
        let clock = ManualClock::new(start);
        let store = EntryStore::with_clock(MemoryStore::new(), MemoryMirror::new(), clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn new_entry_stamps_both_timestamps_from_the_clock() {
        let (store, _clock) = memory_store(1_000);
        let entry = store.new_entry("Day one");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.updated_at, 1_000);
        assert!(entry.mood.is_none());
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let (store, _clock) = memory_store(1_000);
        let entry = store.new_entry("round trip");
        store.save_entry(&entry).await.unwrap();

        let loaded = store.get_entry(&entry.id).await.unwrap();
        assert_eq!(loaded, entry);
    }

    #[tokio::test]
    async fn get_missing_entry_is_none_not_error() {
        let (store, _clock) = memory_store(0);
        assert!(store.get_entry("no-such-id").await.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_existing_record() {
        let (store, _clock) = memory_store(0);
        let mut entry = store.new_entry("first");
        store.save_entry(&entry).await.unwrap();

        entry.content = "second".to_string();
        store.save_entry(&entry).await.unwrap();

        let loaded = store.get_entry(&entry.id).await.unwrap();
        assert_eq!(loaded.content, "second");
        assert_eq!(store.entries_count().await, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _clock) = memory_store(0);
        let entry = store.new_entry("gone soon");
        store.save_entry(&entry).await.unwrap();

        store.delete_entry(&entry.id).await.unwrap();
        assert!(store.get_entry(&entry.id).await.is_none());

        // second delete of the same id is a no-op
        store.delete_entry(&entry.id).await.unwrap();
        // and so is deleting an id that never existed
        store.delete_entry("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn list_orders_newest_first_regardless_of_insertion_order() {
        let (store, clock) = memory_store(100);
        let oldest = store.new_entry("oldest");
        store.save_entry(&oldest).await.unwrap();

        clock.set(300);
        let newest = store.new_entry("newest");
        store.save_entry(&newest).await.unwrap();

        clock.set(200);
        let middle = store.new_entry("middle");
        store.save_entry(&middle).await.unwrap();

        let listed = store.list_entries(None).await;
        let contents: Vec<&str> = listed.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn list_ties_break_by_id_descending() {
        let (store, _clock) = memory_store(500);
        let a = store.new_entry("a");
        let b = store.new_entry("b");
        store.save_entry(&a).await.unwrap();
        store.save_entry(&b).await.unwrap();

        let listed = store.list_entries(None).await;
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id > listed[1].id);

        // deterministic across repeated calls
        let again = store.list_entries(None).await;
        assert_eq!(listed, again);
    }

    #[tokio::test]
    async fn list_limit_takes_the_newest_head() {
        let (store, clock) = memory_store(0);
        for t in 1..=5 {
            clock.set(t * 100);
            let entry = store.new_entry(format!("entry {}", t));
            store.save_entry(&entry).await.unwrap();
        }

        let listed = store.list_entries(Some(2)).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "entry 5");
        assert_eq!(listed[1].content, "entry 4");

        // limit larger than the population returns everything
        assert_eq!(store.list_entries(Some(100)).await.len(), 5);
    }

    #[tokio::test]
    async fn update_preserves_id_and_created_at_and_advances_updated_at() {
        let (store, clock) = memory_store(1_000);
        let entry = store.new_entry("before");
        store.save_entry(&entry).await.unwrap();

        clock.set(2_000);
        let updated = store
            .update_entry(
                &entry.id,
                EntryPatch {
                    content: Some("after".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("entry should exist");

        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.created_at, 1_000);
        assert_eq!(updated.updated_at, 2_000);
        assert_eq!(updated.content, "after");

        let reloaded = store.get_entry(&entry.id).await.unwrap();
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn update_of_missing_entry_returns_none() {
        let (store, _clock) = memory_store(0);
        let result = store
            .update_entry("missing", EntryPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn search_matches_content_and_summary_case_insensitively() {
        let (store, _clock) = memory_store(0);
        let hello = store.new_entry("Hello World");
        store.save_entry(&hello).await.unwrap();
        let goodbye = store.new_entry("goodbye");
        store.save_entry(&goodbye).await.unwrap();

        let results = store.search_entries("WORLD").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Hello World");

        // summary participates in the match
        store
            .update_entry(
                &goodbye.id,
                EntryPatch {
                    summary: Some("A difficult Morning".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let results = store.search_entries("morning").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, goodbye.id);

        // empty query returns everything
        assert_eq!(store.search_entries("").await.len(), 2);
    }

    #[tokio::test]
    async fn date_range_bounds_are_inclusive() {
        let (store, clock) = memory_store(0);
        for t in [100, 200, 300] {
            clock.set(t);
            let entry = store.new_entry(format!("at {}", t));
            store.save_entry(&entry).await.unwrap();
        }

        let hits = store.entries_by_date_range(150, 250).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].created_at, 200);

        let hits = store.entries_by_date_range(100, 300).await;
        assert_eq!(hits.len(), 3);

        let hits = store.entries_by_date_range(301, 400).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn failed_save_mirrors_the_record_but_still_errors() {
        let clock = ManualClock::new(1_000);
        let store = EntryStore::with_clock(FailingPrimary, MemoryMirror::new(), clock);
        let entry = store.new_entry("under duress");

        let result = store.save_entry(&entry).await;
        assert!(matches!(
            result,
            Err(DaybookError::StorageFailed { .. })
        ));

        // the mirror holds the serialized copy despite the failure
        let key = format!("entry:{}", entry.id);
        let raw = store.fallback().get_raw(&key).expect("mirror copy");
        let mirrored: Entry = serde_json::from_str(&raw).unwrap();
        assert_eq!(mirrored, entry);

        // and reads recover it through the fallback path
        let recovered = store.get_entry(&entry.id).await.unwrap();
        assert_eq!(recovered, entry);
    }

    #[tokio::test]
    async fn list_falls_back_to_mirror_scan_and_skips_malformed_records() {
        let mirror = MemoryMirror::new();
        let old = Entry::new_at("mirrored old", 100);
        let new = Entry::new_at("mirrored new", 200);
        mirror
            .set_raw(
                &format!("entry:{}", old.id),
                &serde_json::to_string(&old).unwrap(),
            )
            .unwrap();
        mirror
            .set_raw(
                &format!("entry:{}", new.id),
                &serde_json::to_string(&new).unwrap(),
            )
            .unwrap();
        mirror.set_raw("entry:corrupt", "{not json").unwrap();
        mirror.set_raw("unrelated:key", "ignored").unwrap();

        let store = EntryStore::with_clock(FailingPrimary, mirror, ManualClock::new(0));
        let listed = store.list_entries(None).await;
        let contents: Vec<&str> = listed.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["mirrored new", "mirrored old"]);
    }

    #[tokio::test]
    async fn list_is_empty_when_both_stores_yield_nothing() {
        let store = EntryStore::with_clock(FailingPrimary, MemoryMirror::new(), ManualClock::new(0));
        assert!(store.list_entries(None).await.is_empty());
        assert_eq!(store.entries_count().await, 0);
    }

    #[tokio::test]
    async fn delete_failure_propagates() {
        let store = EntryStore::with_clock(FailingPrimary, MemoryMirror::new(), ManualClock::new(0));
        assert!(store.delete_entry("any").await.is_err());
    }

    #[tokio::test]
    async fn day_one_scenario() {
        let (store, clock) = memory_store(1_000);

        let entry = store.new_entry("Day one");
        store.save_entry(&entry).await.unwrap();

        let listed = store.list_entries(None).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "Day one");
        assert!(listed[0].mood.is_none());

        clock.set(2_000);
        store
            .update_entry(
                &entry.id,
                EntryPatch {
                    mood: Some(Mood::Positive),
                    mood_score: Some(0.9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reloaded = store.get_entry(&entry.id).await.unwrap();
        assert_eq!(reloaded.mood, Some(Mood::Positive));
        assert_eq!(reloaded.mood_score, Some(0.9));
        assert_eq!(reloaded.content, "Day one");
        assert!(reloaded.updated_at > reloaded.created_at);
    }
}

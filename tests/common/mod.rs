//! Common test utilities for blogpost integration tests
//!
//! Provides engines over in-memory or file stores, a clock that advances on
//! every reading, and a store wrapper that misbehaves on demand.

#![allow(dead_code)]

use blogpost::{
    BlogEngine, BlogStore, Clock, Label, LabelId, LabelKind, OpenStore, Post, PostId, PostQuery,
    SqliteStore, StorageError, StorageResult, Tagging,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Starts at `start` and moves forward one hour per `now()` call
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self { next: Mutex::new(start) }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let current = *next;
        *next = current + Duration::hours(1);
        current
    }
}

pub fn march_2024() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Engine over a fresh in-memory store with a stepping clock
pub fn create_engine() -> BlogEngine {
    let store = SqliteStore::open_in_memory().unwrap();
    BlogEngine::new(Arc::new(store)).with_clock(Arc::new(SteppingClock::starting_at(march_2024())))
}

/// Save a post built by the caller and return it
pub fn save(engine: &BlogEngine, mut post: Post) -> Post {
    engine.save_post(&mut post).unwrap();
    post
}

pub fn slugs(engine: &BlogEngine, query: &PostQuery) -> Vec<String> {
    engine
        .find_posts(query)
        .unwrap()
        .posts
        .into_iter()
        .filter_map(|p| p.slug)
        .collect()
}

pub fn names(labels: Vec<Label>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

/// Delegates to a SQLite store, misbehaving on demand.
///
/// `fail_after(n)` lets `n` more tagging writes through, then fails every
/// following one until `heal()` is called. `miss_next_lookup()` makes the
/// next `find_label_by_name` report nothing, as if another writer created
/// the label right after it was read. `ignore_taken_slugs()` makes
/// `slug_taken` always answer false, as if another writer took the
/// permalink after the check.
pub struct FlakyStore {
    inner: SqliteStore,
    remaining: AtomicUsize,
    armed: Mutex<bool>,
    lookup_misses: AtomicUsize,
    slugs_hidden: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            remaining: AtomicUsize::new(0),
            armed: Mutex::new(false),
            lookup_misses: AtomicUsize::new(0),
            slugs_hidden: AtomicBool::new(false),
        }
    }

    pub fn fail_after(&self, writes: usize) {
        self.remaining.store(writes, Ordering::SeqCst);
        *self.armed.lock().unwrap() = true;
    }

    pub fn heal(&self) {
        *self.armed.lock().unwrap() = false;
    }

    pub fn miss_next_lookup(&self) {
        self.lookup_misses.store(1, Ordering::SeqCst);
    }

    pub fn ignore_taken_slugs(&self) {
        self.slugs_hidden.store(true, Ordering::SeqCst);
    }
}

impl BlogStore for FlakyStore {
    fn save_post(&self, post: &Post) -> StorageResult<()> {
        self.inner.save_post(post)
    }

    fn load_post(&self, id: &PostId) -> StorageResult<Option<Post>> {
        self.inner.load_post(id)
    }

    fn delete_post(&self, id: &PostId) -> StorageResult<bool> {
        self.inner.delete_post(id)
    }

    fn slug_taken(
        &self,
        slug: &str,
        year: i32,
        month: u32,
        excluding: Option<&PostId>,
    ) -> StorageResult<bool> {
        if self.slugs_hidden.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.slug_taken(slug, year, month, excluding)
    }

    fn find_posts(&self, query: &PostQuery) -> StorageResult<Vec<Post>> {
        self.inner.find_posts(query)
    }

    fn count_posts(&self, query: &PostQuery) -> StorageResult<usize> {
        self.inner.count_posts(query)
    }

    fn create_label(&self, label: &Label) -> StorageResult<()> {
        self.inner.create_label(label)
    }

    fn load_label(&self, id: &LabelId) -> StorageResult<Option<Label>> {
        self.inner.load_label(id)
    }

    fn find_label_by_name(&self, name: &str) -> StorageResult<Option<Label>> {
        let missed = self
            .lookup_misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if missed {
            return Ok(None);
        }
        self.inner.find_label_by_name(name)
    }

    fn find_category(&self, id: &LabelId) -> StorageResult<Option<Label>> {
        self.inner.find_category(id)
    }

    fn list_labels(&self, kind: Option<LabelKind>) -> StorageResult<Vec<Label>> {
        self.inner.list_labels(kind)
    }

    fn create_tagging(&self, tagging: &Tagging) -> StorageResult<()> {
        if *self.armed.lock().unwrap() {
            let passed = self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !passed {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk unplugged",
                )));
            }
        }
        self.inner.create_tagging(tagging)
    }

    fn tagging_count(&self, post_id: &PostId, label_id: &LabelId) -> StorageResult<usize> {
        self.inner.tagging_count(post_id, label_id)
    }

    fn delete_taggings(&self, post_id: &PostId, kind: LabelKind) -> StorageResult<usize> {
        self.inner.delete_taggings(post_id, kind)
    }

    fn delete_tagging(
        &self,
        post_id: &PostId,
        label_id: &LabelId,
        kind: LabelKind,
    ) -> StorageResult<usize> {
        self.inner.delete_tagging(post_id, label_id, kind)
    }

    fn labels_for_post(&self, post_id: &PostId, kind: Option<LabelKind>) -> StorageResult<Vec<Label>> {
        self.inner.labels_for_post(post_id, kind)
    }
}

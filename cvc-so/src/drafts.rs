//! Debounced draft autosave
//!
//! The editor sends its text on every pause in typing. Each service date owns
//! one [`Debouncer`], so a burst of drafts for a date produces one save of the
//! last text, while drafts for different dates never cancel each other.
//!
//! Every write to a service document (draft, full save, delete, element
//! update) runs under one shared write lock. A draft only saves if it is
//! still the newest draft for its date once it holds the lock, so a full save
//! that superseded it always lands last.

use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use cvc_common::db::ServiceStore;
use cvc_common::debounce::Debouncer;
use cvc_common::ServiceDate;

use crate::orders::{save_order, OrderRequest};

/// Exclusive access to service document writes
pub type WriteGuard<'a> = tokio::sync::MutexGuard<'a, ()>;

struct Draft {
    generation: u64,
    debouncer: Debouncer,
}

type Drafts = HashMap<ServiceDate, Draft>;

pub struct DraftSaver {
    store: Arc<dyn ServiceStore>,
    db: SqlitePool,
    delay: Duration,
    next_generation: AtomicU64,
    pending: Arc<Mutex<Drafts>>,
    writes: Arc<tokio::sync::Mutex<()>>,
}

impl DraftSaver {
    pub fn new(store: Arc<dyn ServiceStore>, db: SqlitePool, delay: Duration) -> Self {
        Self {
            store,
            db,
            delay,
            next_generation: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
            writes: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Save `request` for `date` once no newer draft arrives within the delay
    pub fn schedule(&self, date: ServiceDate, request: OrderRequest) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let store = Arc::clone(&self.store);
        let db = self.db.clone();
        let pending = Arc::clone(&self.pending);
        let writes = Arc::clone(&self.writes);

        let mut drafts = self.lock();
        let draft = drafts.entry(date).or_insert_with(|| Draft {
            generation,
            debouncer: Debouncer::new(self.delay),
        });
        draft.generation = generation;
        draft.debouncer.schedule(async move {
            let _writes = writes.lock().await;
            if !is_current(&pending, date, generation) {
                debug!(date = %date, "Skipped superseded draft");
                return;
            }

            match save_order(store.as_ref(), &db, date, request).await {
                Ok(outcome) => debug!(
                    date = %date,
                    elements = outcome.service.elements.len(),
                    "Draft saved"
                ),
                Err(e) => warn!(date = %date, error = %e, "Draft save failed"),
            }

            let mut drafts = lock(&pending);
            if drafts.get(&date).map_or(false, |d| d.generation == generation) {
                drafts.remove(&date);
            }
        });
    }

    /// Drop any draft for `date`, then wait for exclusive write access
    ///
    /// A draft still waiting is discarded; one already being written finishes
    /// before the guard is returned. Hold the guard across the superseding
    /// write.
    pub async fn supersede(&self, date: ServiceDate) -> WriteGuard<'_> {
        let removed = self.lock().remove(&date);
        if let Some(mut draft) = removed {
            let discarded = draft.debouncer.cancel();
            info!(date = %date, discarded, "Superseded pending draft");
        }
        self.writes.lock().await
    }

    /// Exclusive write access for updates that do not replace the order
    pub async fn lock_writes(&self) -> WriteGuard<'_> {
        self.writes.lock().await
    }

    /// A draft for `date` is waiting or being written
    pub fn is_pending(&self, date: ServiceDate) -> bool {
        self.lock()
            .get(&date)
            .map_or(false, |draft| draft.debouncer.is_pending())
    }

    fn lock(&self) -> MutexGuard<'_, Drafts> {
        lock(&self.pending)
    }
}

fn lock(pending: &Mutex<Drafts>) -> MutexGuard<'_, Drafts> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_current(pending: &Mutex<Drafts>, date: ServiceDate, generation: u64) -> bool {
    lock(pending)
        .get(&date)
        .map_or(false, |draft| draft.generation == generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cvc_common::db::{init_database, MemoryServiceStore};
    use cvc_common::order::{ServiceDocument, ServiceType};
    use std::sync::atomic::AtomicUsize;

    /// Memory store whose saves take a while and are counted
    struct SlowStore {
        inner: MemoryServiceStore,
        save_delay: Duration,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl ServiceStore for SlowStore {
        async fn load(&self, date: ServiceDate) -> cvc_common::Result<Option<ServiceDocument>> {
            self.inner.load(date).await
        }

        async fn save(&self, document: &ServiceDocument) -> cvc_common::Result<()> {
            tokio::time::sleep(self.save_delay).await;
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(document).await
        }

        async fn list(&self) -> cvc_common::Result<Vec<ServiceDocument>> {
            self.inner.list().await
        }
    }

    async fn saver(delay_ms: u64) -> (tempfile::TempDir, Arc<MemoryServiceStore>, DraftSaver) {
        let dir = tempfile::tempdir().unwrap();
        let db = init_database(&dir.path().join("cvc.db")).await.unwrap();
        let store = Arc::new(MemoryServiceStore::new());
        let saver = DraftSaver::new(store.clone(), db, Duration::from_millis(delay_ms));
        (dir, store, saver)
    }

    async fn slow_saver(
        delay_ms: u64,
        save_ms: u64,
    ) -> (tempfile::TempDir, Arc<SlowStore>, DraftSaver) {
        let dir = tempfile::tempdir().unwrap();
        let db = init_database(&dir.path().join("cvc.db")).await.unwrap();
        let store = Arc::new(SlowStore {
            inner: MemoryServiceStore::new(),
            save_delay: Duration::from_millis(save_ms),
            saves: AtomicUsize::new(0),
        });
        let saver = DraftSaver::new(store.clone(), db, Duration::from_millis(delay_ms));
        (dir, store, saver)
    }

    fn request(content: &str) -> OrderRequest {
        OrderRequest {
            service_type: ServiceType::Communion,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_burst_saves_last_draft() {
        let (_dir, store, saver) = saver(30).await;
        let date = ServiceDate::parse("10/19/26").unwrap();

        saver.schedule(date, request("Prelude"));
        saver.schedule(date, request("Prelude\nOpening Hymn:"));
        assert!(saver.is_pending(date));

        tokio::time::sleep(Duration::from_millis(200)).await;

        let stored = store.load(date).await.unwrap().unwrap();
        assert_eq!(stored.content, "Prelude\nOpening Hymn:");
        assert_eq!(stored.elements.len(), 2);
        assert!(!saver.is_pending(date));
    }

    #[tokio::test]
    async fn test_dates_do_not_cancel_each_other() {
        let (_dir, store, saver) = saver(30).await;
        let first = ServiceDate::parse("10/19/26").unwrap();
        let second = ServiceDate::parse("10/26/26").unwrap();

        saver.schedule(first, request("Prelude"));
        saver.schedule(second, request("Postlude"));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.load(first).await.unwrap().unwrap().content, "Prelude");
        assert_eq!(store.load(second).await.unwrap().unwrap().content, "Postlude");
    }

    #[tokio::test]
    async fn test_supersede_discards_waiting_draft() {
        let (_dir, store, saver) = saver(50).await;
        let date = ServiceDate::parse("10/19/26").unwrap();

        saver.schedule(date, request("Prelude"));
        drop(saver.supersede(date).await);
        assert!(!saver.is_pending(date));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(store.load(date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_full_save_lands_after_draft_being_written() {
        let (_dir, store, saver) = slow_saver(10, 150).await;
        let date = ServiceDate::parse("10/19/26").unwrap();

        saver.schedule(date, request("Prelude"));
        // Draft is inside its slow save by now
        tokio::time::sleep(Duration::from_millis(60)).await;

        let writes = saver.supersede(date).await;
        assert_eq!(store.load(date).await.unwrap().unwrap().content, "Prelude");
        save_order(store.as_ref(), &saver.db, date, request("Postlude"))
            .await
            .unwrap();
        drop(writes);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.load(date).await.unwrap().unwrap().content, "Postlude");
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_newer_draft_skips_one_waiting_for_writes() {
        let (_dir, store, saver) = slow_saver(10, 0).await;
        let date = ServiceDate::parse("10/19/26").unwrap();

        let writes = saver.lock_writes().await;
        saver.schedule(date, request("Prelude"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        saver.schedule(date, request("Postlude"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(writes);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.load(date).await.unwrap().unwrap().content, "Postlude");
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert!(!saver.is_pending(date));
    }

    #[tokio::test]
    async fn test_finished_drafts_are_forgotten() {
        let (_dir, _store, saver) = saver(20).await;
        let first = ServiceDate::parse("10/19/26").unwrap();
        let second = ServiceDate::parse("10/26/26").unwrap();

        saver.schedule(first, request("Prelude"));
        saver.schedule(second, request("Postlude"));
        assert_eq!(saver.lock().len(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(saver.lock().is_empty());

        saver.schedule(first, request("Prelude"));
        drop(saver.supersede(first).await);
        assert!(saver.lock().is_empty());
    }
}

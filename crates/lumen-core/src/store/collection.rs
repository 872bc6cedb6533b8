// ── Reactive state collection ──
//
// Concurrent storage keyed by fixture or group id, with push-based change
// notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// A concurrent, reactive collection for one kind of light target.
///
/// Uses `DashMap` for O(1) lookups and a `watch` channel carrying the full
/// snapshot, rebuilt on every mutation.
pub(crate) struct StateCollection<T: Send + Sync + 'static> {
    by_id: DashMap<i64, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> StateCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Store `value` under `id` if `accept` approves replacing the current
    /// entry (always when there is none). Returns whether it was stored.
    pub(crate) fn upsert_if(&self, id: i64, value: T, accept: impl FnOnce(&T) -> bool) -> bool {
        let stored = match self.by_id.entry(id) {
            Entry::Occupied(mut entry) => {
                if accept(entry.get()) {
                    entry.insert(Arc::new(value));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(value));
                true
            }
        };
        // Entry guard is released above; rebuilding iterates every shard.
        if stored {
            self.rebuild_snapshot();
        }
        stored
    }

    pub(crate) fn get(&self, id: i64) -> Option<Arc<T>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot, ordered by id (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.rebuild_snapshot();
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(i64, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

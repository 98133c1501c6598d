//! Reconciler bound to a live store subscription.

use super::filter::{DisplayPolicy, FilterMode};
use super::reconciler::Reconciler;
use crate::model::todo::{Todo, TodoId};
use crate::store::list_store::{ListStore, StoreResult};
use crate::store::snapshot::Subscription;
use log::debug;

/// Client-side list state that follows one store.
pub struct LiveList {
    store: ListStore,
    subscription: Subscription,
    reconciler: Reconciler,
}

impl LiveList {
    /// Subscribes to `store` and seeds the view with its current snapshot.
    pub fn attach(store: ListStore, policy: DisplayPolicy) -> Self {
        let mut subscription = store.get_all();
        let mut reconciler = Reconciler::new(policy);
        reconciler.apply_snapshot(subscription.take_current());
        Self {
            store,
            subscription,
            reconciler,
        }
    }

    /// Waits for the next snapshot and folds it into the view.
    ///
    /// Returns `false` once the store has shut down.
    pub async fn refresh(&mut self) -> bool {
        match self.subscription.next().await {
            Some(snapshot) => {
                let version = snapshot.version;
                let taken = self.reconciler.apply_snapshot(snapshot);
                debug!("event=live_refresh module=reconcile status=ok version={version} taken={taken}");
                true
            }
            None => false,
        }
    }

    /// Folds the store's latest snapshot in without waiting.
    pub fn sync_now(&mut self) {
        self.reconciler.apply_snapshot(self.store.snapshot());
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.reconciler.set_filter(filter);
    }

    pub fn visible(&self) -> Vec<Todo> {
        self.reconciler.visible()
    }

    pub fn active_count(&self) -> usize {
        self.reconciler.active_count()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Sends the reorder batch for a finished drag to the store.
    pub async fn commit_drag(&self, dragged: &[TodoId]) -> StoreResult<()> {
        let updates = self.reconciler.reorder_updates(dragged);
        self.store.reorder(updates).await
    }
}

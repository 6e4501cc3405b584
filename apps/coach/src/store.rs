//! Observable state store with deferred, coalesced notification.
//!
//! Writers merge partial updates synchronously; each merge is visible to the next
//! `get_state` immediately. Notification goes through an explicit commit queue: the
//! first write after a flush marks the store pending and wakes the notifier, which
//! lets the current turn finish and then fans out once to every listener. Any number
//! of writes in between coalesce into that single round.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

/// Shallow-merge a partial update into a state value.
pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Shared<S> {
    state: Arc<S>,
    listeners: Vec<(u64, Listener<S>)>,
    next_listener_id: u64,
    pending: bool,
}

pub struct Store<S> {
    shared: Arc<Mutex<Shared<S>>>,
    wake: Arc<Notify>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            wake: Arc::clone(&self.wake),
        }
    }
}

impl<S> Store<S>
where
    S: Merge + Clone + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: Arc::new(initial),
                listeners: Vec::new(),
                next_listener_id: 0,
                pending: false,
            })),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Latest committed snapshot.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&self.shared.lock().state)
    }

    pub fn set_state(&self, patch: S::Patch) {
        let mut shared = self.shared.lock();
        self.commit(&mut shared, patch);
    }

    /// Computes the patch from the latest snapshot and merges it.
    ///
    /// `f` runs without the store lock held, so it may read the store. If another
    /// writer commits while `f` runs, `f` is called again on the newer snapshot.
    /// `f` must not write to the store itself.
    pub fn update<F>(&self, mut f: F)
    where
        F: FnMut(&S) -> S::Patch,
    {
        loop {
            let snapshot = self.get_state();
            let patch = f(&snapshot);

            let mut shared = self.shared.lock();
            if Arc::ptr_eq(&shared.state, &snapshot) {
                self.commit(&mut shared, patch);
                return;
            }
            debug!("Store update raced a concurrent write; recomputing");
        }
    }

    fn commit(&self, shared: &mut Shared<S>, patch: S::Patch) {
        let mut next = (*shared.state).clone();
        next.merge(patch);
        shared.state = Arc::new(next);

        if !shared.pending {
            shared.pending = true;
            self.wake.notify_one();
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription<S>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let mut shared = self.shared.lock();
        let id = shared.next_listener_id;
        shared.next_listener_id += 1;
        shared.listeners.push((id, Arc::new(listener)));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.shared.lock().pending
    }

    /// Drains the commit queue: one notification round with the current snapshot.
    /// Returns false when nothing was pending. The lock is released before
    /// listeners run, so listeners may write back into the store.
    pub fn flush(&self) -> bool {
        let (snapshot, listeners) = {
            let mut shared = self.shared.lock();
            if !shared.pending {
                return false;
            }
            shared.pending = false;
            let listeners: Vec<Listener<S>> =
                shared.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (Arc::clone(&shared.state), listeners)
        };

        debug!("Store flush: notifying {} listener(s)", listeners.len());
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }

    /// Runs forever, flushing once per wake-up after yielding so the writer's
    /// current turn completes first.
    pub async fn run_notifier(self) {
        loop {
            self.wake.notified().await;
            tokio::task::yield_now().await;
            self.flush();
        }
    }

    pub fn spawn_notifier(&self) -> JoinHandle<()> {
        tokio::spawn(self.clone().run_notifier())
    }
}

/// Handle returned by `subscribe`; dropping it keeps the listener registered.
pub struct Subscription<S> {
    shared: Weak<Mutex<Shared<S>>>,
    id: u64,
}

impl<S> Subscription<S> {
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

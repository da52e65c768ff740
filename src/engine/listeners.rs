//! Locale-change callbacks.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{
    AssertUnwindSafe,
    catch_unwind,
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    Weak,
};

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Id order is registration order.
    listeners: BTreeMap<u64, Listener>,
}

/// Callbacks invoked with the new locale after every successful switch.
#[derive(Clone, Default)]
pub struct ListenerSet {
    inner: Arc<Mutex<Registry>>,
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

impl ListenerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener`; dropping the returned handle keeps it registered.
    pub fn add<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));
        Subscription { id, set: Arc::downgrade(&self.inner) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry().listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry().listeners.is_empty()
    }

    /// Calls every listener in registration order.
    ///
    /// The set is snapshotted first, so listeners may add or remove
    /// subscriptions. A panicking listener is logged and skipped.
    pub fn notify(&self, locale: &str) {
        let snapshot: Vec<(u64, Listener)> = self
            .registry()
            .listeners
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(locale))) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                tracing::error!(listener = id, locale, panic = %message, "Locale change listener panicked");
            }
        }
    }
}

/// Handle returned by [`ListenerSet::add`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    set: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes this listener. A no-op if the owning set is gone.
    pub fn unsubscribe(self) {
        if let Some(set) = self.set.upgrade() {
            set.lock().unwrap_or_else(PoisonError::into_inner).listeners.remove(&self.id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |locale: &str| {
            sink.lock().unwrap_or_else(PoisonError::into_inner).push(locale.to_string());
        })
    }

    #[rstest]
    fn notifies_in_registration_order() {
        let set = ListenerSet::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            let _ = set.add(move |_: &str| {
                order.lock().unwrap_or_else(PoisonError::into_inner).push(name);
            });
        }

        set.notify("en");

        let order = order.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(*order, ["first", "second", "third"]);
    }

    #[rstest]
    fn unsubscribe_removes_only_its_listener() {
        let set = ListenerSet::new();
        let (kept_seen, kept) = recorder();
        let (removed_seen, removed) = recorder();
        let _ = set.add(kept);
        let subscription = set.add(removed);

        subscription.unsubscribe();
        set.notify("ja");

        assert_that!(set.len(), eq(1));
        assert_eq!(*kept_seen.lock().unwrap_or_else(PoisonError::into_inner), ["ja"]);
        assert!(removed_seen.lock().unwrap_or_else(PoisonError::into_inner).is_empty());
    }

    #[rstest]
    fn panicking_listener_does_not_stop_others() {
        let set = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _ = set.add(|_: &str| panic!("listener failure"));
        let counter = Arc::clone(&calls);
        let _ = set.add(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        set.notify("en");

        assert_that!(calls.load(Ordering::SeqCst), eq(1));
    }

    #[rstest]
    fn unsubscribe_after_set_dropped_is_noop() {
        let set = ListenerSet::new();
        let subscription = set.add(|_: &str| {});
        drop(set);

        subscription.unsubscribe();
    }
}

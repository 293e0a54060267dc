//! Ordered observer registry.
//!
//! A [`Registry`] keeps a list of subscribed observers in subscription order
//! and fans payloads out to them. It is the publish/subscribe backbone for
//! the rest of this crate: the [`Broker`](crate::Broker) is a registry of
//! query handlers, [`ObservableProperty`](crate::ObservableProperty) and
//! [`StateMachine`](crate::StateMachine) publish their changes through one.
//!
//! # Key Types
//!
//! - [`Registry<O>`] - The subscriber list, generic over the observer trait object
//! - [`Observer<P>`] - The notification capability for payloads of type `P`
//! - [`SubscriptionId`] - Returned by [`Registry::subscribe`], used to unsubscribe
//! - [`SubscriptionGuard`] - RAII subscription that unsubscribes when dropped
//!
//! # Fan-out Semantics
//!
//! [`Registry::publish`] copies the subscriber list under the lock and
//! notifies the copy with the lock released. The observers notified are
//! exactly those subscribed when the publish began, in subscription order.
//! Observers may subscribe or unsubscribe (themselves included) while they
//! are being notified.
//!
//! The first observer that returns an error stops the fan-out; the error is
//! returned to the publisher as [`BehaviorError::Notify`]. Closure observers
//! registered with [`Registry::subscribe_fn`] cannot fail.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_lattice_behavior::{Observer, Registry};
//!
//! let registry: Registry<dyn Observer<String>> = Registry::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen_clone = seen.clone();
//! let id = registry.subscribe_fn(move |name: &String| {
//!     seen_clone.lock().push(format!("A doctor has been called for {name}"));
//! });
//!
//! registry.publish(&"Ann".to_string()).unwrap();
//! registry.unsubscribe(id);
//! registry.publish(&"Bob".to_string()).unwrap();
//!
//! assert_eq!(*seen.lock(), vec!["A doctor has been called for Ann".to_string()]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{BehaviorError, NotifyError, Result};

new_key_type! {
    /// A unique identifier for a subscription.
    ///
    /// Use this ID to remove a specific subscription via [`Registry::unsubscribe`].
    /// Subscribing the same observer twice yields two distinct IDs.
    pub struct SubscriptionId;
}

/// Receives payloads published through a [`Registry`].
///
/// Returning an error aborts the remaining fan-out of the current publish.
pub trait Observer<P: ?Sized>: Send + Sync {
    /// Handle one published payload.
    fn notify(&self, payload: &P) -> std::result::Result<(), NotifyError>;
}

/// Adapter that turns an infallible closure into an [`Observer`].
pub struct FnObserver<F>(F);

impl<F> FnObserver<F> {
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<P: ?Sized, F> Observer<P> for FnObserver<F>
where
    F: Fn(&P) + Send + Sync,
{
    fn notify(&self, payload: &P) -> std::result::Result<(), NotifyError> {
        (self.0)(payload);
        Ok(())
    }
}

/// Subscriber storage: stable IDs plus the subscription order.
struct Subscribers<O: ?Sized> {
    entries: SlotMap<SubscriptionId, Arc<O>>,
    order: Vec<SubscriptionId>,
}

impl<O: ?Sized> Subscribers<O> {
    fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, observer: Arc<O>) -> SubscriptionId {
        let id = self.entries.insert(observer);
        self.order.push(id);
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        if self.entries.remove(id).is_some() {
            self.order.retain(|&entry| entry != id);
            true
        } else {
            false
        }
    }

    fn remove_matching(&mut self, target: *const ()) -> usize {
        let matching: Vec<SubscriptionId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| {
                self.entries
                    .get(id)
                    .is_some_and(|o| Arc::as_ptr(o).cast::<()>() == target)
            })
            .collect();
        for &id in &matching {
            self.entries.remove(id);
        }
        self.order.retain(|id| !matching.contains(id));
        matching.len()
    }

    fn snapshot(&self) -> Vec<(SubscriptionId, Arc<O>)> {
        self.order
            .iter()
            .filter_map(|&id| self.entries.get(id).map(|o| (id, Arc::clone(o))))
            .collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

struct Shared<O: ?Sized> {
    subscribers: Mutex<Subscribers<O>>,
    blocked: AtomicBool,
}

/// An ordered, thread-safe list of observers.
///
/// `O` is the observer type, usually a trait object such as
/// `dyn Observer<P>` or `dyn QueryHandler`. Cloning a registry produces
/// another handle to the same subscriber list.
///
/// # Related Types
///
/// - [`SubscriptionId`] - Returned by [`subscribe`](Self::subscribe)
/// - [`SubscriptionGuard`] - Returned by [`subscribe_scoped`](Self::subscribe_scoped)
pub struct Registry<O: ?Sized> {
    shared: Arc<Shared<O>>,
}

impl<O: ?Sized> Clone for Registry<O> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O: ?Sized> Default for Registry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> Registry<O> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                subscribers: Mutex::new(Subscribers::new()),
                blocked: AtomicBool::new(false),
            }),
        }
    }

    /// Append an observer to the end of the subscriber list.
    pub fn subscribe(&self, observer: Arc<O>) -> SubscriptionId {
        let mut subscribers = self.shared.subscribers.lock();
        let id = subscribers.insert(observer);
        tracing::trace!(target: "horizon_lattice_behavior::registry", ?id, subscriber_count = subscribers.order.len(), "subscribed");
        id
    }

    /// Subscribe an observer for as long as the returned guard lives.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicI32, Ordering};
    /// use horizon_lattice_behavior::{FnObserver, Observer, Registry};
    ///
    /// let registry: Registry<dyn Observer<i32>> = Registry::new();
    /// let total = Arc::new(AtomicI32::new(0));
    /// {
    ///     let total_clone = total.clone();
    ///     let _guard = registry.subscribe_scoped(Arc::new(FnObserver::new(move |&n: &i32| {
    ///         total_clone.fetch_add(n, Ordering::SeqCst);
    ///     })));
    ///     registry.publish(&42).unwrap();
    /// }
    /// registry.publish(&43).unwrap();
    /// assert_eq!(total.load(Ordering::SeqCst), 42);
    /// ```
    pub fn subscribe_scoped(&self, observer: Arc<O>) -> SubscriptionGuard<O> {
        let id = self.subscribe(observer);
        SubscriptionGuard {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    /// Remove a subscription by ID.
    ///
    /// Returns `true` if the subscription existed. Unknown or already removed
    /// IDs are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.shared.subscribers.lock().remove(id);
        tracing::trace!(target: "horizon_lattice_behavior::registry", ?id, removed, "unsubscribe");
        removed
    }

    /// Remove every subscription of this exact observer instance.
    ///
    /// Observers are compared by `Arc` pointer identity. Returns how many
    /// subscriptions were removed.
    pub fn unsubscribe_observer(&self, observer: &Arc<O>) -> usize {
        let target = Arc::as_ptr(observer).cast::<()>();
        let removed = self.shared.subscribers.lock().remove_matching(target);
        tracing::trace!(target: "horizon_lattice_behavior::registry", removed, "unsubscribe observer");
        removed
    }

    /// Remove all subscriptions.
    pub fn clear(&self) {
        self.shared.subscribers.lock().clear();
    }

    /// Check whether a subscription is still active.
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.lock().entries.contains_key(id)
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.shared.subscribers.lock().order.len()
    }

    /// Whether the registry has no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Temporarily suppress fan-out.
    ///
    /// While blocked, publishing notifies nobody. Subscriptions are kept.
    pub fn set_blocked(&self, blocked: bool) {
        self.shared.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if fan-out is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.shared.blocked.load(Ordering::SeqCst)
    }

    /// Copy of the current subscriber list, in subscription order.
    ///
    /// This is what publishing iterates; it is public so that wrappers with
    /// their own handler signature (such as the broker) share the same
    /// semantics.
    pub fn snapshot(&self) -> Vec<(SubscriptionId, Arc<O>)> {
        self.shared.subscribers.lock().snapshot()
    }
}

impl<P: ?Sized> Registry<dyn Observer<P>> {
    /// Subscribe an infallible closure.
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver(f)))
    }

    /// Notify every current subscriber, in subscription order.
    ///
    /// Returns the number of observers notified. If an observer fails, the
    /// remaining observers are skipped and the failure is returned.
    #[tracing::instrument(skip_all, name = "horizon_lattice_behavior::publish", target = "horizon_lattice_behavior::registry", level = "trace")]
    pub fn publish(&self, payload: &P) -> Result<usize> {
        if self.is_blocked() {
            tracing::trace!(target: "horizon_lattice_behavior::registry", "registry blocked, skipping publish");
            return Ok(0);
        }

        let snapshot = self.snapshot();
        tracing::trace!(target: "horizon_lattice_behavior::registry", observer_count = snapshot.len(), "publishing");

        for (id, observer) in &snapshot {
            if let Err(source) = observer.notify(payload) {
                tracing::debug!(target: "horizon_lattice_behavior::registry", ?id, error = %source, "observer failed, aborting fan-out");
                return Err(BehaviorError::Notify {
                    subscription: *id,
                    source,
                });
            }
        }

        Ok(snapshot.len())
    }
}

impl<O: ?Sized> fmt::Debug for Registry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("subscribers", &self.len())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

/// A subscription that is removed when the guard is dropped.
///
/// Created via [`Registry::subscribe_scoped`]. The guard only holds a weak
/// reference to the registry, so it never keeps a registry alive.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard<O: ?Sized> {
    shared: Weak<Shared<O>>,
    id: SubscriptionId,
}

impl<O: ?Sized> SubscriptionGuard<O> {
    /// The ID of the guarded subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribe now.
    pub fn close(self) {}

    /// Keep the subscription alive past the guard and return its ID.
    pub fn detach(mut self) -> SubscriptionId {
        self.shared = Weak::new();
        self.id
    }
}

impl<O: ?Sized> Drop for SubscriptionGuard<O> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.subscribers.lock().remove(self.id);
        }
    }
}

impl<O: ?Sized> fmt::Debug for SubscriptionGuard<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard").field("id", &self.id).finish()
    }
}

static_assertions::assert_impl_all!(Registry<dyn Observer<String>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::sync::atomic::AtomicUsize;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Observer<i32> for Recorder {
        fn notify(&self, payload: &i32) -> std::result::Result<(), NotifyError> {
            self.log.lock().push(format!("{}:{}", self.label, payload));
            Ok(())
        }
    }

    struct Failing;

    impl Observer<i32> for Failing {
        fn notify(&self, payload: &i32) -> std::result::Result<(), NotifyError> {
            Err(NotifyError::new(format!("rejected {payload}")))
        }
    }

    /// Removes its own subscription the first time it is notified.
    struct OneShot {
        registry: Registry<dyn Observer<i32>>,
        id: OnceLock<SubscriptionId>,
        hits: AtomicUsize,
    }

    impl Observer<i32> for OneShot {
        fn notify(&self, _payload: &i32) -> std::result::Result<(), NotifyError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if let Some(&id) = self.id.get() {
                self.registry.unsubscribe(id);
            }
            Ok(())
        }
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Observer<i32>> {
        Arc::new(Recorder {
            label,
            log: log.clone(),
        })
    }

    #[test]
    fn test_publish_in_subscription_order() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(recorder("a", &log));
        registry.subscribe(recorder("b", &log));
        registry.subscribe(recorder("c", &log));

        assert_eq!(registry.publish(&7).unwrap(), 3);
        assert_eq!(*log.lock(), vec!["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn test_order_survives_slot_reuse() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = registry.subscribe(recorder("a", &log));
        registry.subscribe(recorder("b", &log));
        registry.unsubscribe(a);
        // The freed slot is reused, but "d" must still come last.
        registry.subscribe(recorder("d", &log));

        registry.publish(&1).unwrap();
        assert_eq!(*log.lock(), vec!["b:1", "d:1"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let id = registry.subscribe_fn(|_| {});

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_subscriptions_notify_twice() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let observer = recorder("x", &log);

        let first = registry.subscribe(observer.clone());
        let second = registry.subscribe(observer.clone());
        assert_ne!(first, second);

        registry.publish(&2).unwrap();
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_unsubscribe_observer_removes_all_matches() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let twice = recorder("twice", &log);
        let other = recorder("other", &log);

        registry.subscribe(twice.clone());
        registry.subscribe(other.clone());
        registry.subscribe(twice.clone());

        assert_eq!(registry.unsubscribe_observer(&twice), 2);
        assert_eq!(registry.unsubscribe_observer(&twice), 0);
        assert_eq!(registry.len(), 1);

        registry.publish(&3).unwrap();
        assert_eq!(*log.lock(), vec!["other:3"]);
    }

    #[test]
    fn test_self_unsubscribe_during_publish() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(recorder("before", &log));
        let one_shot = Arc::new(OneShot {
            registry: registry.clone(),
            id: OnceLock::new(),
            hits: AtomicUsize::new(0),
        });
        let id = registry.subscribe(one_shot.clone());
        one_shot.id.set(id).unwrap();
        registry.subscribe(recorder("after", &log));

        assert_eq!(registry.publish(&1).unwrap(), 3);
        assert_eq!(registry.publish(&2).unwrap(), 2);

        assert_eq!(one_shot.hits.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock(), vec!["before:1", "after:1", "before:2", "after:2"]);
    }

    #[test]
    fn test_snapshot_includes_observer_removed_mid_publish() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim_id = Arc::new(OnceLock::new());

        let registry_clone = registry.clone();
        let victim_clone = victim_id.clone();
        registry.subscribe_fn(move |_| {
            if let Some(&id) = victim_clone.get() {
                registry_clone.unsubscribe(id);
            }
        });
        victim_id.set(registry.subscribe(recorder("victim", &log))).unwrap();

        // The victim was subscribed when the publish began.
        registry.publish(&1).unwrap();
        registry.publish(&2).unwrap();
        assert_eq!(*log.lock(), vec!["victim:1"]);
    }

    #[test]
    fn test_subscribe_during_publish_waits_for_next_publish() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let registry_clone = registry.clone();
        let late_clone = late_hits.clone();
        registry.subscribe_fn(move |&n| {
            if n == 1 {
                let late = late_clone.clone();
                registry_clone.subscribe_fn(move |_| {
                    late.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(registry.publish(&1).unwrap(), 1);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.publish(&2).unwrap(), 2);
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_aborts_remaining_fan_out() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(recorder("first", &log));
        let failing = registry.subscribe(Arc::new(Failing));
        registry.subscribe(recorder("never", &log));

        let err = registry.publish(&9).unwrap_err();
        match err {
            BehaviorError::Notify {
                subscription,
                source,
            } => {
                assert_eq!(subscription, failing);
                assert_eq!(source.message(), "rejected 9");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*log.lock(), vec!["first:9"]);
    }

    #[test]
    fn test_panicking_observer_leaves_registry_usable() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let bomb = registry.subscribe_fn(|_| panic!("observer exploded"));
        registry.subscribe(recorder("after", &log));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = registry.publish(&1);
        }));
        assert!(outcome.is_err());
        assert!(log.lock().is_empty());

        registry.unsubscribe(bomb);
        registry.publish(&2).unwrap();
        assert_eq!(*log.lock(), vec!["after:2"]);
    }

    #[test]
    fn test_blocked_registry_skips_publish() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.subscribe(recorder("r", &log));

        registry.set_blocked(true);
        assert_eq!(registry.publish(&1).unwrap(), 0);
        registry.set_blocked(false);
        assert_eq!(registry.publish(&2).unwrap(), 1);

        assert_eq!(*log.lock(), vec!["r:2"]);
    }

    #[test]
    fn test_subscription_guard() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let _guard = registry.subscribe_scoped(recorder("scoped", &log));
            registry.publish(&1).unwrap();
        }
        registry.publish(&2).unwrap();

        assert_eq!(*log.lock(), vec!["scoped:1"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscription_guard_detach_and_close() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();

        let kept = registry.subscribe_scoped(Arc::new(FnObserver::new(|_: &i32| {})));
        let id = kept.detach();
        assert!(registry.contains(id));

        let closed = registry.subscribe_scoped(Arc::new(FnObserver::new(|_: &i32| {})));
        let closed_id = closed.id();
        closed.close();
        assert!(!registry.contains(closed_id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_guard_outliving_registry() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        let guard = registry.subscribe_scoped(Arc::new(FnObserver::new(|_: &i32| {})));
        drop(registry);
        // Nothing left to unsubscribe from.
        drop(guard);
    }

    #[test]
    fn test_clear() {
        let registry: Registry<dyn Observer<i32>> = Registry::new();
        for _ in 0..5 {
            registry.subscribe_fn(|_| {});
        }
        assert_eq!(registry.len(), 5);
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.publish(&0).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_subscribe_and_publish() {
        let registry: Registry<dyn Observer<usize>> = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..8 {
            let registry = registry.clone();
            let counter = counter.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let counter = counter.clone();
                    let id = registry.subscribe_fn(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                    registry.publish(&i).unwrap();
                    registry.unsubscribe(id);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(registry.is_empty());
        // Every publish saw at least its own observer.
        assert!(counter.load(Ordering::SeqCst) >= 8 * 50);
    }
}

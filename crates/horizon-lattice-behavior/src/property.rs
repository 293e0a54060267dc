//! Properties that notify observers when their value changes.
//!
//! An [`ObservableProperty`] pairs a value with a [`Registry`] of
//! [`PropertyChanged`] observers. Setting a different value stores it and
//! then notifies every observer with the old and new value; setting an
//! equal value does nothing.
//!
//! The value lock is released before observers run, so an observer may read
//! the property, set it again, or unsubscribe itself.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_lattice_behavior::ObservableProperty;
//!
//! let age = ObservableProperty::new("age", 15);
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let log_clone = log.clone();
//! age.changed().subscribe_fn(move |change| {
//!     log_clone.lock().push((change.old, change.new));
//! });
//!
//! assert!(age.set(16).unwrap());
//! assert!(!age.set(16).unwrap());
//! assert_eq!(*log.lock(), vec![(15, 16)]);
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::error::Result;
use crate::registry::{Observer, Registry};

/// Payload published when an [`ObservableProperty`] changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChanged<T> {
    /// Name of the property that changed.
    pub name: &'static str,
    /// Value before the change.
    pub old: T,
    /// Value after the change.
    pub new: T,
}

/// A named value with change notification.
///
/// # Thread Safety
///
/// `ObservableProperty<T>` uses a `RwLock` for the value and is `Send + Sync`
/// when `T` is.
pub struct ObservableProperty<T> {
    name: &'static str,
    value: RwLock<T>,
    changed: Registry<dyn Observer<PropertyChanged<T>>>,
}

impl<T: Clone> ObservableProperty<T> {
    /// Create a property with an initial value and no observers.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            value: RwLock::new(value),
            changed: Registry::new(),
        }
    }

    /// The property's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    ///
    /// # Deadlocks
    ///
    /// The read lock is held while `f` runs. Calling [`set`](Self::set) or
    /// [`set_silent`](Self::set_silent) on the same property from inside `f`
    /// deadlocks. Compute inside `f` and write after it returns.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without notifying anyone.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }

    /// Observers of this property's changes.
    pub fn changed(&self) -> &Registry<dyn Observer<PropertyChanged<T>>> {
        &self.changed
    }
}

impl<T: Clone + PartialEq> ObservableProperty<T> {
    /// Set the value and notify observers if it changed.
    ///
    /// Returns `Ok(true)` if the value changed, `Ok(false)` if it was equal.
    /// The new value is stored even if an observer fails; the failure is
    /// returned after the remaining observers were skipped.
    pub fn set(&self, value: T) -> Result<bool> {
        let change = {
            let mut current = self.value.write();
            if *current == value {
                return Ok(false);
            }
            let old = std::mem::replace(&mut *current, value.clone());
            PropertyChanged {
                name: self.name,
                old,
                new: value,
            }
        };

        tracing::trace!(target: "horizon_lattice_behavior::property", property = self.name, "property changed");
        self.changed.publish(&change)?;
        Ok(true)
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ObservableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableProperty")
            .field("name", &self.name)
            .field("value", &self.get())
            .field("observers", &self.changed.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(ObservableProperty<i32>: Send, Sync);
static_assertions::assert_impl_all!(ObservableProperty<String>: Send, Sync);

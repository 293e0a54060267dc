//! Stateful wrapper around a [`TransitionTable`].

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use super::TransitionTable;
use crate::error::Result;
use crate::registry::{Observer, Registry};

/// A committed move between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition<S, T> {
    /// State before the trigger.
    pub from: S,
    /// The trigger that was fired.
    pub trigger: T,
    /// State after the trigger.
    pub to: S,
}

struct MachineState<S, T> {
    current: S,
    history: Vec<Transition<S, T>>,
}

/// A state machine holding its current state over a shared table.
///
/// Firing a trigger looks up the next state in the table. On success the
/// state is committed, appended to the history, and then published to the
/// [`transitioned`](Self::transitioned) observers. An undefined transition
/// leaves the state unchanged and returns the error.
///
/// ```
/// use horizon_lattice_behavior::{PhoneState, PhoneTrigger, StateMachine, phone_rules};
///
/// let phone = StateMachine::new(phone_rules(), PhoneState::OffHook);
/// phone.fire(PhoneTrigger::CallDialed).unwrap();
/// phone.fire(PhoneTrigger::CallConnected).unwrap();
/// assert_eq!(phone.state(), PhoneState::Connected);
///
/// assert!(phone.fire(PhoneTrigger::CallDialed).is_err());
/// assert_eq!(phone.state(), PhoneState::Connected);
/// ```
pub struct StateMachine<S, T> {
    table: Arc<TransitionTable<S, T>>,
    inner: Mutex<MachineState<S, T>>,
    transitioned: Registry<dyn Observer<Transition<S, T>>>,
}

impl<S, T> StateMachine<S, T>
where
    S: Copy + Eq + Hash + fmt::Debug,
    T: Copy + Eq + fmt::Debug,
{
    /// Create a machine that owns its table.
    pub fn new(table: TransitionTable<S, T>, initial: S) -> Self {
        Self::with_shared_table(Arc::new(table), initial)
    }

    /// Create a machine over a table shared with other machines.
    pub fn with_shared_table(table: Arc<TransitionTable<S, T>>, initial: S) -> Self {
        Self {
            table,
            inner: Mutex::new(MachineState {
                current: initial,
                history: Vec::new(),
            }),
            transitioned: Registry::new(),
        }
    }

    /// The current state.
    pub fn state(&self) -> S {
        self.inner.lock().current
    }

    /// Whether the machine is currently in `state`.
    pub fn is_in(&self, state: S) -> bool {
        self.state() == state
    }

    /// The table driving this machine.
    pub fn table(&self) -> &Arc<TransitionTable<S, T>> {
        &self.table
    }

    /// Apply a trigger to the current state.
    ///
    /// Returns the new state. If an observer fails, the transition has
    /// already been committed and the observer's error is returned.
    #[tracing::instrument(skip_all, name = "horizon_lattice_behavior::fire", target = "horizon_lattice_behavior::state", level = "debug", fields(trigger = ?trigger))]
    pub fn fire(&self, trigger: T) -> Result<S> {
        let transition = {
            let mut inner = self.inner.lock();
            let from = inner.current;
            let to = match self.table.apply(from, trigger) {
                Ok(to) => to,
                Err(err) => {
                    tracing::debug!(target: "horizon_lattice_behavior::state", state = ?from, "no transition defined");
                    return Err(err.into());
                }
            };
            let transition = Transition { from, trigger, to };
            inner.current = to;
            inner.history.push(transition);
            transition
        };

        tracing::debug!(target: "horizon_lattice_behavior::state", from = ?transition.from, to = ?transition.to, "state changed");
        self.transitioned.publish(&transition)?;
        Ok(transition.to)
    }

    /// Whether `trigger` has a rule in the current state.
    pub fn can_fire(&self, trigger: T) -> bool {
        self.table.lookup(self.state(), trigger).is_some()
    }

    /// Triggers with a rule in the current state.
    pub fn permitted_triggers(&self) -> Vec<T> {
        self.table.permitted_triggers(self.state())
    }

    /// Every committed transition, oldest first.
    pub fn history(&self) -> Vec<Transition<S, T>> {
        self.inner.lock().history.clone()
    }

    /// Observers notified after each committed transition.
    pub fn transitioned(&self) -> &Registry<dyn Observer<Transition<S, T>>> {
        &self.transitioned
    }
}

impl<S: fmt::Debug, T> fmt::Debug for StateMachine<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StateMachine")
            .field("state", &inner.current)
            .field("transitions", &inner.history.len())
            .finish()
    }
}

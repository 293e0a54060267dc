//! Combination lock driven by a rule table.

use std::fmt;

use super::{StateMachine, TransitionTable};

/// States of a [`CombinationLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockState {
    /// Waiting for a code.
    Locked,
    /// The last attempt was wrong; the next attempt only re-arms the lock.
    Failed,
    /// Open. Stays open.
    Unlocked,
}

/// Outcome of comparing an attempt against the lock's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTrigger {
    /// The attempt matched.
    CodeAccepted,
    /// The attempt did not match.
    CodeRejected,
}

/// Rules for [`CombinationLock`].
pub fn lock_rules() -> TransitionTable<LockState, LockTrigger> {
    use LockState::*;
    use LockTrigger::*;

    TransitionTable::new()
        .with_rule(Locked, CodeAccepted, Unlocked)
        .with_rule(Locked, CodeRejected, Failed)
        .with_rule(Failed, CodeAccepted, Locked)
        .with_rule(Failed, CodeRejected, Locked)
        .with_rule(Unlocked, CodeAccepted, Unlocked)
        .with_rule(Unlocked, CodeRejected, Unlocked)
}

/// A lock that opens for one secret code.
///
/// A wrong code moves the lock to [`LockState::Failed`]. The attempt after
/// a failure is not checked; it only returns the lock to
/// [`LockState::Locked`]. Once unlocked the lock stays unlocked.
///
/// ```
/// use horizon_lattice_behavior::{CombinationLock, LockState};
///
/// let lock = CombinationLock::new("Rafael");
/// assert!(!lock.unlock("Daiana"));
/// assert_eq!(lock.state(), LockState::Failed);
/// assert!(!lock.unlock("Rafael"));
/// assert_eq!(lock.state(), LockState::Locked);
/// assert!(lock.unlock("Rafael"));
/// ```
pub struct CombinationLock {
    code: String,
    machine: StateMachine<LockState, LockTrigger>,
}

impl CombinationLock {
    /// Create a locked lock with a secret code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            machine: StateMachine::new(lock_rules(), LockState::Locked),
        }
    }

    /// Try a code. Returns whether the lock is unlocked afterwards.
    ///
    /// The answer always reflects the committed state. A `transitioned`
    /// observer that fails is logged with `warn!` and does not change the
    /// outcome, since the move has already happened by the time observers
    /// run. Use [`machine`](Self::machine) to fire triggers directly if the
    /// observer error is needed.
    pub fn unlock(&self, attempt: &str) -> bool {
        let trigger = if attempt == self.code {
            LockTrigger::CodeAccepted
        } else {
            LockTrigger::CodeRejected
        };

        match self.machine.fire(trigger) {
            Ok(state) => state == LockState::Unlocked,
            Err(err) if err.is_notify() => {
                tracing::warn!(target: "horizon_lattice_behavior::state", error = %err, "lock observer failed");
                self.machine.is_in(LockState::Unlocked)
            }
            Err(err) => {
                tracing::warn!(target: "horizon_lattice_behavior::state", error = %err, "lock transition failed");
                self.machine.is_in(LockState::Unlocked)
            }
        }
    }

    /// The current lock state.
    pub fn state(&self) -> LockState {
        self.machine.state()
    }

    /// The underlying state machine, for observing transitions.
    pub fn machine(&self) -> &StateMachine<LockState, LockTrigger> {
        &self.machine
    }
}

impl fmt::Debug for CombinationLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinationLock")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::NotifyError;
    use crate::registry::Observer;
    use crate::state::Transition;

    #[test]
    fn test_unlock_sequence() {
        let lock = CombinationLock::new("Rafael");
        let attempts = [
            ("Daiana", false, LockState::Failed),
            ("Fabrício", false, LockState::Locked),
            ("Rafael", true, LockState::Unlocked),
        ];

        for (code, opened, state) in attempts {
            assert_eq!(lock.unlock(code), opened, "attempt {code}");
            assert_eq!(lock.state(), state, "attempt {code}");
        }
    }

    #[test]
    fn test_correct_code_first_try() {
        let lock = CombinationLock::new("1234");
        assert!(lock.unlock("1234"));
        assert_eq!(lock.state(), LockState::Unlocked);
    }

    #[test]
    fn test_unlocked_stays_unlocked() {
        let lock = CombinationLock::new("1234");
        assert!(lock.unlock("1234"));
        assert!(lock.unlock("wrong"));
        assert!(lock.unlock("1234"));
        assert_eq!(lock.state(), LockState::Unlocked);
    }

    #[test]
    fn test_correct_code_after_failure_only_rearms() {
        let lock = CombinationLock::new("1234");
        assert!(!lock.unlock("0000"));
        assert!(!lock.unlock("1234"));
        assert_eq!(lock.state(), LockState::Locked);
        assert!(lock.unlock("1234"));
    }

    #[test]
    fn test_history_visible_through_machine() {
        let lock = CombinationLock::new("1234");
        lock.unlock("0000");
        lock.unlock("0000");
        let states: Vec<LockState> = lock.machine().history().iter().map(|t| t.to).collect();
        assert_eq!(states, vec![LockState::Failed, LockState::Locked]);
    }

    #[test]
    fn test_debug_hides_code() {
        let lock = CombinationLock::new("secret");
        let output = format!("{lock:?}");
        assert!(!output.contains("secret"));
        assert!(output.contains("Locked"));
    }

    struct Veto;

    impl Observer<Transition<LockState, LockTrigger>> for Veto {
        fn notify(
            &self,
            _: &Transition<LockState, LockTrigger>,
        ) -> std::result::Result<(), NotifyError> {
            Err(NotifyError::new("vetoed"))
        }
    }

    #[test]
    fn test_failing_observer_does_not_block_unlock() {
        let lock = CombinationLock::new("1234");
        lock.machine().transitioned().subscribe(Arc::new(Veto));

        assert!(!lock.unlock("0000"));
        assert_eq!(lock.state(), LockState::Failed);
        assert!(!lock.unlock("0000"));
        assert_eq!(lock.state(), LockState::Locked);
        assert!(lock.unlock("1234"));
        assert_eq!(lock.state(), LockState::Unlocked);
        assert_eq!(lock.machine().history().len(), 3);
    }
}

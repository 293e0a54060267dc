//! Rule-table state machines.
//!
//! - [`TransitionTable`] - The pure lookup: `(state, trigger) -> next state`
//! - [`StateMachine`] - Holds a current state over a shared table and
//!   publishes each committed [`Transition`]
//! - [`phone_rules`] and [`CombinationLock`] - Tables for a phone call and
//!   a combination lock
//! - [`LightSwitch`] - The object-per-state alternative, where each
//!   [`SwitchState`] returns its successor
//!
//! Tables can also be loaded from TOML with
//! [`TransitionTable::from_toml_str`] and [`TransitionTable::from_toml_file`].

mod lock;
mod machine;
mod phone;
mod switch;
mod table;

pub use lock::{CombinationLock, LockState, LockTrigger, lock_rules};
pub use machine::{StateMachine, Transition};
pub use phone::{PhoneState, PhoneTrigger, phone_rules};
pub use switch::{LightSwitch, OffState, OnState, SwitchState};
pub use table::TransitionTable;

static_assertions::assert_impl_all!(StateMachine<PhoneState, PhoneTrigger>: Send, Sync);
static_assertions::assert_impl_all!(TransitionTable<PhoneState, PhoneTrigger>: Send, Sync, Clone);
static_assertions::assert_impl_all!(CombinationLock: Send, Sync);
static_assertions::assert_impl_all!(LightSwitch: Send, Sync);

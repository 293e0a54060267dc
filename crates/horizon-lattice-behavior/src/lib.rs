//! Behavioral building blocks for Horizon Lattice.
//!
//! This crate provides small, independent components for propagating events
//! and walking structures:
//!
//! - **Observer Registry**: Ordered subscriber lists with snapshot fan-out
//! - **Query Broker**: Mutable queries aggregated by every subscribed handler
//! - **Modifier Chain**: Ordered modifiers that can cancel the rest of the chain
//! - **Chat Room**: A mediator relaying messages between participants
//! - **Observable Property**: Values that notify observers on change
//! - **Tree Cursor**: In-order traversal of a binary tree through parent links
//! - **State Machines**: Rule tables, a stateful wrapper, and state objects
//!
//! # Observer Example
//!
//! ```
//! use horizon_lattice_behavior::{Observer, Registry};
//!
//! let patient_sick: Registry<dyn Observer<str>> = Registry::new();
//!
//! let id = patient_sick.subscribe_fn(|name: &str| {
//!     println!("A doctor has been called for {name}");
//! });
//!
//! assert_eq!(patient_sick.publish("Ann").unwrap(), 1);
//!
//! patient_sick.unsubscribe(id);
//! assert_eq!(patient_sick.publish("Bob").unwrap(), 0);
//! ```
//!
//! # State Machine Example
//!
//! ```
//! use horizon_lattice_behavior::{PhoneState, PhoneTrigger, phone_rules};
//!
//! let rules = phone_rules();
//! assert_eq!(
//!     rules.apply(PhoneState::OffHook, PhoneTrigger::CallDialed),
//!     Ok(PhoneState::Connecting)
//! );
//! assert!(rules.apply(PhoneState::Connected, PhoneTrigger::CallDialed).is_err());
//! ```

mod broker;
mod chain;
mod error;
pub mod logging;
mod mediator;
mod property;
pub mod registry;
pub mod state;
pub mod tree;

pub use broker::{
    Broker, DefenseBonusModifier, DoubleAttackModifier, GameCreature, Query, QueryHandler,
    QueryKind,
};
pub use chain::{Creature, DoubleAttack, IncreaseDefense, Modifier, ModifierChain, NoBonuses, Propagation};
pub use error::{BehaviorError, ConfigError, NotifyError, Result, TransitionError, TreeError, TreeResult};
pub use logging::{TreeDebug, TreeFormatOptions, TreeStyle};
pub use mediator::{ChatRoom, ParticipantId, ROOM_SENDER};
pub use property::{ObservableProperty, PropertyChanged};
pub use registry::{FnObserver, Observer, Registry, SubscriptionGuard, SubscriptionId};
pub use state::{
    CombinationLock, LightSwitch, LockState, LockTrigger, OffState, OnState, PhoneState,
    PhoneTrigger, StateMachine, SwitchState, Transition, TransitionTable, lock_rules, phone_rules,
};
pub use tree::{BinaryTree, InOrder, InOrderCursor, NodeId};

//! Landline phone call states.

use std::fmt;

use serde::Deserialize;

use super::TransitionTable;

/// States of a phone call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum PhoneState {
    /// Handset lifted, nothing dialed yet.
    OffHook,
    /// Number dialed, waiting for an answer.
    Connecting,
    /// Call in progress.
    Connected,
    /// Call placed on hold.
    OnHold,
    /// Handset back on the hook.
    OnHook,
}

/// Events that move a phone call between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum PhoneTrigger {
    CallDialed,
    HungUp,
    CallConnected,
    PlacedOnHold,
    TakenOffHold,
    LeftMessage,
}

impl fmt::Display for PhoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for PhoneTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The phone call rule table.
///
/// `OnHook` is terminal: it has no outgoing rules.
pub fn phone_rules() -> TransitionTable<PhoneState, PhoneTrigger> {
    use PhoneState::*;
    use PhoneTrigger::*;

    TransitionTable::new()
        .with_rule(OffHook, CallDialed, Connecting)
        .with_rule(Connecting, HungUp, OnHook)
        .with_rule(Connecting, CallConnected, Connected)
        .with_rule(Connected, LeftMessage, OnHook)
        .with_rule(Connected, HungUp, OnHook)
        .with_rule(Connected, PlacedOnHold, OnHold)
        .with_rule(OnHold, TakenOffHold, Connected)
        .with_rule(OnHold, HungUp, OnHook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order_matches_table() {
        let rules = phone_rules();
        assert_eq!(rules.rule_count(), 8);
        assert_eq!(
            rules.transitions(PhoneState::Connected),
            &[
                (PhoneTrigger::LeftMessage, PhoneState::OnHook),
                (PhoneTrigger::HungUp, PhoneState::OnHook),
                (PhoneTrigger::PlacedOnHold, PhoneState::OnHold),
            ]
        );
        assert_eq!(
            rules.states().collect::<Vec<_>>(),
            vec![
                PhoneState::OffHook,
                PhoneState::Connecting,
                PhoneState::Connected,
                PhoneState::OnHold,
            ]
        );
    }

    #[test]
    fn test_walk_by_rule_index() {
        let rules = phone_rules();
        let mut state = PhoneState::OffHook;

        let (_, next) = rules.transitions(state)[0];
        state = next;
        assert_eq!(state, PhoneState::Connecting);

        let (_, next) = rules.transitions(state)[1];
        state = next;
        assert_eq!(state, PhoneState::Connected);

        let (trigger, next) = rules.transitions(state)[0];
        state = next;
        assert_eq!(trigger, PhoneTrigger::LeftMessage);
        assert_eq!(state, PhoneState::OnHook);
    }

    #[test]
    fn test_apply() {
        let rules = phone_rules();
        assert_eq!(
            rules.apply(PhoneState::OffHook, PhoneTrigger::CallDialed),
            Ok(PhoneState::Connecting)
        );
        assert!(rules.apply(PhoneState::Connected, PhoneTrigger::CallDialed).is_err());
        assert!(rules.apply(PhoneState::OnHook, PhoneTrigger::CallDialed).is_err());
    }

    #[test]
    fn test_hold_round_trip() {
        let rules = phone_rules();
        let held = rules.apply(PhoneState::Connected, PhoneTrigger::PlacedOnHold).unwrap();
        let resumed = rules.apply(held, PhoneTrigger::TakenOffHold).unwrap();
        assert_eq!(resumed, PhoneState::Connected);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(PhoneState::OnHold.to_string(), "OnHold");
        assert_eq!(PhoneTrigger::CallDialed.to_string(), "CallDialed");
    }
}

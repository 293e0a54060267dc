//! Light switch built from state objects.
//!
//! Each state decides what `on` and `off` do by returning the next state,
//! or `None` when the request does not apply.

use std::fmt;

/// A state of a [`LightSwitch`].
pub trait SwitchState: fmt::Debug + Send + Sync {
    /// Short label for logs.
    fn label(&self) -> &'static str;

    /// Whether the light is lit in this state.
    fn is_lit(&self) -> bool;

    /// Next state when the switch is turned on.
    fn on(&self) -> Option<Box<dyn SwitchState>> {
        None
    }

    /// Next state when the switch is turned off.
    fn off(&self) -> Option<Box<dyn SwitchState>> {
        None
    }
}

/// The light is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnState;

impl SwitchState for OnState {
    fn label(&self) -> &'static str {
        "on"
    }

    fn is_lit(&self) -> bool {
        true
    }

    fn off(&self) -> Option<Box<dyn SwitchState>> {
        Some(Box::new(OffState))
    }
}

/// The light is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffState;

impl SwitchState for OffState {
    fn label(&self) -> &'static str {
        "off"
    }

    fn is_lit(&self) -> bool {
        false
    }

    fn on(&self) -> Option<Box<dyn SwitchState>> {
        Some(Box::new(OnState))
    }
}

/// A switch that delegates every request to its current state.
///
/// ```
/// use horizon_lattice_behavior::LightSwitch;
///
/// let mut switch = LightSwitch::new();
/// assert!(switch.on());
/// assert!(switch.off());
/// assert!(!switch.off());
/// assert!(!switch.is_lit());
/// ```
#[derive(Debug)]
pub struct LightSwitch {
    state: Box<dyn SwitchState>,
}

impl Default for LightSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSwitch {
    /// Create a switch that starts off.
    pub fn new() -> Self {
        Self::with_state(Box::new(OffState))
    }

    /// Create a switch in an arbitrary state.
    pub fn with_state(state: Box<dyn SwitchState>) -> Self {
        Self { state }
    }

    /// Turn the light on. Returns `false` if it already was.
    pub fn on(&mut self) -> bool {
        let next = self.state.on();
        self.advance(next, "on")
    }

    /// Turn the light off. Returns `false` if it already was.
    pub fn off(&mut self) -> bool {
        let next = self.state.off();
        self.advance(next, "off")
    }

    /// Whether the light is lit.
    pub fn is_lit(&self) -> bool {
        self.state.is_lit()
    }

    /// The current state.
    pub fn state(&self) -> &dyn SwitchState {
        self.state.as_ref()
    }

    fn advance(&mut self, next: Option<Box<dyn SwitchState>>, request: &str) -> bool {
        match next {
            Some(next) => {
                tracing::debug!(target: "horizon_lattice_behavior::state", from = self.state.label(), to = next.label(), "light switched");
                self.state = next;
                true
            }
            None => {
                tracing::trace!(target: "horizon_lattice_behavior::state", state = self.state.label(), request, "light already in requested state");
                false
            }
        }
    }
}

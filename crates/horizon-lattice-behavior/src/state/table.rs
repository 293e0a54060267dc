//! The functional core: a static (state, trigger) → state table.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, TransitionError};

/// A transition table mapping each state to an ordered list of
/// `(trigger, next state)` pairs.
///
/// Lookups scan the list for the current state and take the first matching
/// trigger. The table has no notion of a current state; see
/// [`StateMachine`](super::StateMachine) for the stateful wrapper.
///
/// # Example
///
/// ```
/// use horizon_lattice_behavior::TransitionTable;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Door { Open, Closed }
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Push { Close, Open }
///
/// let table = TransitionTable::new()
///     .with_rule(Door::Open, Push::Close, Door::Closed)
///     .with_rule(Door::Closed, Push::Open, Door::Open);
///
/// assert_eq!(table.apply(Door::Open, Push::Close), Ok(Door::Closed));
/// assert!(table.apply(Door::Open, Push::Open).is_err());
/// ```
#[derive(Clone)]
pub struct TransitionTable<S, T> {
    rules: HashMap<S, Vec<(T, S)>>,
    order: Vec<S>,
}

impl<S, T> Default for TransitionTable<S, T> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<S, T> TransitionTable<S, T>
where
    S: Copy + Eq + Hash + fmt::Debug,
    T: Copy + Eq + fmt::Debug,
{
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, builder style.
    pub fn with_rule(mut self, from: S, trigger: T, to: S) -> Self {
        self.add_rule(from, trigger, to);
        self
    }

    /// Append a rule to the list for `from`.
    ///
    /// A second rule for an existing (state, trigger) pair is kept but never
    /// matched.
    pub fn add_rule(&mut self, from: S, trigger: T, to: S) -> &mut Self {
        let entries = self.rules.entry(from).or_insert_with(|| {
            self.order.push(from);
            Vec::new()
        });
        if entries.iter().any(|&(t, _)| t == trigger) {
            tracing::warn!(target: "horizon_lattice_behavior::state", state = ?from, ?trigger, "duplicate rule shadowed by an earlier one");
        }
        entries.push((trigger, to));
        self
    }

    /// The next state for `trigger` in `state`, or an error if the table
    /// defines none.
    pub fn apply(&self, state: S, trigger: T) -> Result<S, TransitionError> {
        self.lookup(state, trigger)
            .ok_or_else(|| TransitionError::undefined(state, trigger))
    }

    /// The next state for `trigger` in `state`, if defined.
    pub fn lookup(&self, state: S, trigger: T) -> Option<S> {
        self.transitions(state)
            .iter()
            .find(|&&(t, _)| t == trigger)
            .map(|&(_, next)| next)
    }

    /// The ordered rules leaving `state`.
    pub fn transitions(&self, state: S) -> &[(T, S)] {
        self.rules.get(&state).map(Vec::as_slice).unwrap_or_default()
    }

    /// Triggers that have a rule in `state`, in rule order, without duplicates.
    pub fn permitted_triggers(&self, state: S) -> Vec<T> {
        let mut triggers: Vec<T> = Vec::new();
        for &(trigger, _) in self.transitions(state) {
            if !triggers.contains(&trigger) {
                triggers.push(trigger);
            }
        }
        triggers
    }

    /// States with at least one outgoing rule, in the order they were first
    /// added.
    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        self.order.iter().copied()
    }

    /// Total number of rules, duplicates included.
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>, T: Deserialize<'de>"))]
struct TableSpec<S, T> {
    #[serde(default)]
    rules: Vec<RuleSpec<S, T>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSpec<S, T> {
    from: S,
    trigger: T,
    to: S,
}

impl<S, T> TransitionTable<S, T>
where
    S: Copy + Eq + Hash + fmt::Debug + DeserializeOwned,
    T: Copy + Eq + fmt::Debug + DeserializeOwned,
{
    /// Parse a table from TOML.
    ///
    /// Rules are given as an array of tables, in lookup order:
    ///
    /// ```toml
    /// [[rules]]
    /// from = "OffHook"
    /// trigger = "CallDialed"
    /// to = "Connecting"
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let spec: TableSpec<S, T> = toml::from_str(source)?;
        let mut table = Self::new();
        for rule in spec.rules {
            table.add_rule(rule.from, rule.trigger, rule.to);
        }
        tracing::debug!(target: "horizon_lattice_behavior::state", rule_count = table.rule_count(), "loaded transition table");
        Ok(table)
    }

    /// Read and parse a TOML table from a file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&source)
    }
}

impl<S: Eq + Hash + fmt::Debug, T: fmt::Debug> fmt::Debug for TransitionTable<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().filter_map(|s| self.rules.get(s).map(|r| (s, r))))
            .finish()
    }
}

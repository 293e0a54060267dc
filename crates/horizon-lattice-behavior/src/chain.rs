//! Modifier chain with cancellation.
//!
//! A [`ModifierChain`] applies its [`Modifier`]s to a [`Creature`] in the
//! order they were added. Any modifier may stop the chain by returning
//! [`Propagation::Stop`]; the modifiers after it are skipped.

use std::fmt;

/// A creature whose statistics are modified in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    /// Display name.
    pub name: String,
    /// Attack value.
    pub attack: i32,
    /// Defense value.
    pub defense: i32,
}

impl Creature {
    /// Create a creature.
    pub fn new(name: impl Into<String>, attack: i32, defense: i32) -> Self {
        Self {
            name: name.into(),
            attack,
            defense,
        }
    }
}

impl fmt::Display for Creature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.attack, self.defense)
    }
}

/// Whether the chain continues after a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Pass the creature on to the next modifier.
    Continue,
    /// Skip every remaining modifier.
    Stop,
}

/// One link of a [`ModifierChain`].
pub trait Modifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Modify the creature and decide whether the chain continues.
    fn apply(&self, creature: &mut Creature) -> Propagation;
}

/// Doubles attack.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleAttack;

impl Modifier for DoubleAttack {
    fn name(&self) -> &'static str {
        "double-attack"
    }

    fn apply(&self, creature: &mut Creature) -> Propagation {
        creature.attack *= 2;
        Propagation::Continue
    }
}

/// Adds one defense to creatures whose attack is at most 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncreaseDefense;

impl Modifier for IncreaseDefense {
    fn name(&self) -> &'static str {
        "increase-defense"
    }

    fn apply(&self, creature: &mut Creature) -> Propagation {
        if creature.attack <= 2 {
            creature.defense += 1;
        }
        Propagation::Continue
    }
}

/// Cancels every modifier after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonuses;

impl Modifier for NoBonuses {
    fn name(&self) -> &'static str {
        "no-bonuses"
    }

    fn apply(&self, _creature: &mut Creature) -> Propagation {
        Propagation::Stop
    }
}

/// An ordered list of modifiers.
///
/// ```
/// use horizon_lattice_behavior::{Creature, DoubleAttack, IncreaseDefense, ModifierChain};
///
/// let mut goblin = Creature::new("Goblin", 1, 1);
/// ModifierChain::new()
///     .with(DoubleAttack)
///     .with(IncreaseDefense)
///     .with(DoubleAttack)
///     .handle(&mut goblin);
/// assert_eq!(goblin.to_string(), "Goblin (4/2)");
/// ```
#[derive(Default)]
pub struct ModifierChain {
    modifiers: Vec<Box<dyn Modifier>>,
}

impl ModifierChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modifier, builder style.
    pub fn with(mut self, modifier: impl Modifier + 'static) -> Self {
        self.add(modifier);
        self
    }

    /// Append a modifier to the end of the chain.
    pub fn add(&mut self, modifier: impl Modifier + 'static) -> &mut Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    /// Number of modifiers in the chain.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether the chain has no modifiers.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Run the chain over a creature.
    ///
    /// Returns the number of modifiers that were applied, including the one
    /// that stopped the chain.
    pub fn handle(&self, creature: &mut Creature) -> usize {
        let mut applied = 0;
        for modifier in &self.modifiers {
            applied += 1;
            let propagation = modifier.apply(creature);
            tracing::trace!(target: "horizon_lattice_behavior::chain", modifier = modifier.name(), creature = %creature, "applied modifier");
            if propagation == Propagation::Stop {
                tracing::debug!(target: "horizon_lattice_behavior::chain", modifier = modifier.name(), "chain cancelled");
                break;
            }
        }
        applied
    }
}

impl fmt::Debug for ModifierChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modifiers.iter().map(|m| m.name()))
            .finish()
    }
}

//! Query broker: publish a mutable query, aggregate by mutation.
//!
//! A [`Broker`] is a [`Registry`] of [`QueryHandler`]s. Firing a [`Query`]
//! hands the same query to every handler in subscription order; each
//! handler decides whether the query concerns it and, if so, adjusts the
//! value. The issuer reads the final value afterwards.
//!
//! [`GameCreature`] asks the broker for its attack and defense, so
//! modifiers attached through the broker apply until they are closed.
//!
//! ```
//! use horizon_lattice_behavior::{Broker, DoubleAttackModifier, GameCreature};
//!
//! let game = Broker::new();
//! let goblin = GameCreature::new(&game, "Strong Goblin", 2, 2);
//! assert_eq!(goblin.to_string(), "Strong Goblin (2/2)");
//!
//! let modifier = DoubleAttackModifier::attach(&goblin);
//! assert_eq!(goblin.attack(), 4);
//! modifier.close();
//! assert_eq!(goblin.attack(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::registry::{Registry, SubscriptionGuard, SubscriptionId};

/// Which statistic a [`Query`] asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Attack value.
    Attack,
    /// Defense value.
    Defense,
}

/// A mutable request passed through every handler of a [`Broker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Name of the entity the query is about.
    pub subject: String,
    /// The statistic being asked for.
    pub kind: QueryKind,
    /// Current value; starts at the issuer's base value.
    pub value: i32,
}

impl Query {
    /// Create a query with an initial value.
    pub fn new(subject: impl Into<String>, kind: QueryKind, value: i32) -> Self {
        Self {
            subject: subject.into(),
            kind,
            value,
        }
    }

    /// Whether this query asks about `kind` for `subject`.
    pub fn concerns(&self, subject: &str, kind: QueryKind) -> bool {
        self.kind == kind && self.subject == subject
    }
}

/// Inspects and possibly modifies a [`Query`].
///
/// Handlers that do not care about a query must leave it untouched.
pub trait QueryHandler: Send + Sync {
    /// Handle a query.
    fn handle(&self, query: &mut Query);
}

struct FnHandler<F>(F);

impl<F> QueryHandler for FnHandler<F>
where
    F: Fn(&mut Query) + Send + Sync,
{
    fn handle(&self, query: &mut Query) {
        (self.0)(query)
    }
}

/// Fans queries out to subscribed handlers.
///
/// Cloning a broker yields another handle to the same handler list.
#[derive(Clone, Default)]
pub struct Broker {
    handlers: Registry<dyn QueryHandler>,
}

impl Broker {
    /// Create a broker without handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler.
    pub fn subscribe(&self, handler: Arc<dyn QueryHandler>) -> SubscriptionId {
        self.handlers.subscribe(handler)
    }

    /// Append a closure handler.
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&mut Query) + Send + Sync + 'static,
    {
        self.handlers.subscribe(Arc::new(FnHandler(f)))
    }

    /// Append a handler for as long as the returned guard lives.
    pub fn subscribe_scoped(&self, handler: Arc<dyn QueryHandler>) -> SubscriptionGuard<dyn QueryHandler> {
        self.handlers.subscribe_scoped(handler)
    }

    /// Remove a handler. Unknown IDs are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.unsubscribe(id)
    }

    /// Number of subscribed handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// The underlying handler registry.
    pub fn handlers(&self) -> &Registry<dyn QueryHandler> {
        &self.handlers
    }

    /// Pass a query through every handler in subscription order.
    ///
    /// Handlers see the list as it was when firing began. Returns the
    /// number of handlers that were given the query.
    #[tracing::instrument(skip_all, name = "horizon_lattice_behavior::query", target = "horizon_lattice_behavior::broker", level = "trace", fields(subject = %query.subject, kind = ?query.kind))]
    pub fn fire(&self, query: &mut Query) -> usize {
        if self.handlers.is_blocked() {
            return 0;
        }
        let snapshot = self.handlers.snapshot();
        for (_, handler) in &snapshot {
            handler.handle(query);
        }
        tracing::trace!(target: "horizon_lattice_behavior::broker", handler_count = snapshot.len(), value = query.value, "query resolved");
        snapshot.len()
    }

    /// Build a query from a base value, fire it and return the final value.
    pub fn query(&self, subject: &str, kind: QueryKind, base: i32) -> i32 {
        let mut query = Query::new(subject, kind, base);
        self.fire(&mut query);
        query.value
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A named creature whose statistics are resolved through a [`Broker`].
#[derive(Debug, Clone)]
pub struct GameCreature {
    broker: Broker,
    name: String,
    base_attack: i32,
    base_defense: i32,
}

impl GameCreature {
    /// Create a creature bound to a game's broker.
    pub fn new(broker: &Broker, name: impl Into<String>, attack: i32, defense: i32) -> Self {
        Self {
            broker: broker.clone(),
            name: name.into(),
            base_attack: attack,
            base_defense: defense,
        }
    }

    /// The creature's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The broker this creature queries.
    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Attack after all active modifiers.
    pub fn attack(&self) -> i32 {
        self.broker.query(&self.name, QueryKind::Attack, self.base_attack)
    }

    /// Defense after all active modifiers.
    pub fn defense(&self) -> i32 {
        self.broker.query(&self.name, QueryKind::Defense, self.base_defense)
    }
}

impl fmt::Display for GameCreature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.attack(), self.defense())
    }
}

struct StatHandler {
    subject: String,
    kind: QueryKind,
    apply: fn(i32) -> i32,
}

impl QueryHandler for StatHandler {
    fn handle(&self, query: &mut Query) {
        if query.concerns(&self.subject, self.kind) {
            query.value = (self.apply)(query.value);
        }
    }
}

fn attach_stat(creature: &GameCreature, kind: QueryKind, apply: fn(i32) -> i32) -> SubscriptionGuard<dyn QueryHandler> {
    tracing::debug!(target: "horizon_lattice_behavior::broker", creature = creature.name(), ?kind, "modifier attached");
    creature.broker().subscribe_scoped(Arc::new(StatHandler {
        subject: creature.name().to_string(),
        kind,
        apply,
    }))
}

/// Doubles a creature's attack while attached.
#[derive(Debug)]
#[must_use = "dropping the modifier detaches it immediately"]
pub struct DoubleAttackModifier {
    guard: SubscriptionGuard<dyn QueryHandler>,
}

impl DoubleAttackModifier {
    /// Start doubling `creature`'s attack.
    pub fn attach(creature: &GameCreature) -> Self {
        Self {
            guard: attach_stat(creature, QueryKind::Attack, |value| value * 2),
        }
    }

    /// The broker subscription backing this modifier.
    pub fn id(&self) -> SubscriptionId {
        self.guard.id()
    }

    /// Stop modifying the creature.
    pub fn close(self) {
        self.guard.close();
    }
}

/// Adds one to a creature's defense while attached.
#[derive(Debug)]
#[must_use = "dropping the modifier detaches it immediately"]
pub struct DefenseBonusModifier {
    guard: SubscriptionGuard<dyn QueryHandler>,
}

impl DefenseBonusModifier {
    /// Start raising `creature`'s defense.
    pub fn attach(creature: &GameCreature) -> Self {
        Self {
            guard: attach_stat(creature, QueryKind::Defense, |value| value + 1),
        }
    }

    /// The broker subscription backing this modifier.
    pub fn id(&self) -> SubscriptionId {
        self.guard.id()
    }

    /// Stop modifying the creature.
    pub fn close(self) {
        self.guard.close();
    }
}

static_assertions::assert_impl_all!(Broker: Send, Sync, Clone);
static_assertions::assert_impl_all!(GameCreature: Send, Sync);

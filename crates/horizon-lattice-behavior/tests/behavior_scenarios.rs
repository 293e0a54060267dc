//! End-to-end scenarios across the behavior components.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use horizon_lattice_behavior::{
    BinaryTree, Broker, ChatRoom, CombinationLock, Creature, DoubleAttack, DoubleAttackModifier,
    GameCreature, IncreaseDefense, LightSwitch, LockState, ModifierChain, NoBonuses, NotifyError,
    ObservableProperty, Observer, PhoneState, PhoneTrigger, PropertyChanged, QueryKind, Registry,
    StateMachine, SubscriptionId, Transition, TreeDebug, phone_rules,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Records "A doctor has been called for <name>" for every sick patient.
#[derive(Default)]
struct DoctorService {
    messages: Mutex<Vec<String>>,
}

impl DoctorService {
    fn last_message(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }
}

impl Observer<str> for DoctorService {
    fn notify(&self, patient: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .push(format!("A doctor has been called for {patient}"));
        Ok(())
    }
}

#[test]
fn test_doctor_is_called_for_sick_patient() {
    init_tracing();

    let caught_cold: Registry<dyn Observer<str>> = Registry::new();
    let doctor = Arc::new(DoctorService::default());
    caught_cold.subscribe(doctor.clone());

    caught_cold.publish("Fabrício").unwrap();
    assert_eq!(
        doctor.last_message().as_deref(),
        Some("A doctor has been called for Fabrício")
    );

    assert_eq!(caught_cold.unsubscribe_observer(&(doctor.clone() as Arc<dyn Observer<str>>)), 1);
    caught_cold.publish("Rafael").unwrap();
    assert_eq!(doctor.messages.lock().len(), 1);
}

/// Congratulates the client once they reach driving age, then stops listening.
struct TrafficManagement {
    age_changed: Registry<dyn Observer<PropertyChanged<u32>>>,
    subscription: OnceLock<SubscriptionId>,
    messages: Mutex<Vec<String>>,
}

impl Observer<PropertyChanged<u32>> for TrafficManagement {
    fn notify(&self, change: &PropertyChanged<u32>) -> Result<(), NotifyError> {
        if change.new >= 16 {
            self.messages
                .lock()
                .push("Congrats, you can drive now!".to_string());
            if let Some(&id) = self.subscription.get() {
                self.age_changed.unsubscribe(id);
            }
        }
        Ok(())
    }
}

#[test]
fn test_traffic_management_unsubscribes_after_first_notice() {
    init_tracing();

    let age = ObservableProperty::new("age", 50u32);
    let traffic = Arc::new(TrafficManagement {
        age_changed: age.changed().clone(),
        subscription: OnceLock::new(),
        messages: Mutex::new(Vec::new()),
    });
    let id = age.changed().subscribe(traffic.clone());
    traffic.subscription.set(id).unwrap();

    for years in 16..=20 {
        age.set(years).unwrap();
    }

    assert_eq!(*traffic.messages.lock(), vec!["Congrats, you can drive now!"]);
    assert_eq!(age.get(), 20);
}

#[test]
fn test_goblin_broker_scenario() {
    init_tracing();

    let game = Broker::new();
    let goblin = GameCreature::new(&game, "Strong Goblin", 2, 2);
    assert_eq!(goblin.to_string(), "Strong Goblin (2/2)");

    {
        let _modifier = DoubleAttackModifier::attach(&goblin);
        assert_eq!(goblin.to_string(), "Strong Goblin (4/2)");
        assert_eq!(game.query("Strong Goblin", QueryKind::Attack, 2), 4);
    }

    assert_eq!(goblin.to_string(), "Strong Goblin (2/2)");
    assert_eq!(game.query("Strong Goblin", QueryKind::Attack, 2), 2);
}

#[test]
fn test_goblin_modifier_chain_scenario() {
    init_tracing();

    let mut goblin = Creature::new("Goblin", 1, 1);
    let mut chain = ModifierChain::new();
    chain.add(DoubleAttack).add(IncreaseDefense).add(DoubleAttack);
    chain.handle(&mut goblin);
    assert_eq!(goblin.to_string(), "Goblin (4/2)");

    let mut cursed = Creature::new("Goblin", 1, 1);
    ModifierChain::new()
        .with(NoBonuses)
        .with(DoubleAttack)
        .with(IncreaseDefense)
        .with(DoubleAttack)
        .handle(&mut cursed);
    assert_eq!(cursed.to_string(), "Goblin (1/1)");
}

#[test]
fn test_chat_room_scenario() {
    init_tracing();

    let mut room = ChatRoom::new();
    let john = room.join("John");
    let jane = room.join("Jane");
    room.say(john, "hi room");
    room.say(jane, "oh, hey john");

    let simon = room.join("Simon");
    room.say(simon, "hi everyone!");
    room.private_message(jane, "Simon", "glad you could join us!");

    assert_eq!(
        room.chat_log(john),
        [
            "Room: Jane joins the chat",
            "Jane: oh, hey john",
            "Room: Simon joins the chat",
            "Simon: hi everyone!",
        ]
    );
    assert_eq!(
        room.chat_log(jane),
        ["John: hi room", "Room: Simon joins the chat", "Simon: hi everyone!"]
    );
    assert_eq!(room.chat_log(simon), ["Jane: glad you could join us!"]);
}

#[test]
fn test_tree_iteration_matches_debug_view() {
    init_tracing();

    //     1
    //    / \
    //   2   3
    let mut tree = BinaryTree::new();
    let left = tree.leaf(2);
    let right = tree.leaf(3);
    let root = tree.node(1, Some(left), Some(right)).unwrap();
    tree.set_root(root).unwrap();

    let mut cursor = tree.cursor();
    let mut values = Vec::new();
    while cursor.move_next() {
        values.push(*cursor.value());
    }
    assert_eq!(values, vec![2, 1, 3]);

    cursor.reset();
    let again: Vec<i32> = std::iter::from_fn(|| cursor.move_next().then(|| *cursor.value())).collect();
    assert_eq!(again, values);

    let rendered = TreeDebug::new(&tree).format_tree();
    assert_eq!(rendered.lines().count(), 3);
    assert!(rendered.starts_with("1\n"));
}

#[test]
fn test_phone_call_walk() {
    init_tracing();

    let phone = StateMachine::new(phone_rules(), PhoneState::OffHook);
    let log = Arc::new(Mutex::new(Vec::new()));

    let log_clone = log.clone();
    phone
        .transitioned()
        .subscribe_fn(move |t: &Transition<PhoneState, PhoneTrigger>| {
            log_clone.lock().push(format!("{} --{}--> {}", t.from, t.trigger, t.to));
        });

    phone.fire(PhoneTrigger::CallDialed).unwrap();
    phone.fire(PhoneTrigger::CallConnected).unwrap();
    assert_eq!(phone.fire(PhoneTrigger::LeftMessage).unwrap(), PhoneState::OnHook);

    assert!(phone.permitted_triggers().is_empty());
    assert!(phone.fire(PhoneTrigger::CallDialed).is_err());
    assert_eq!(phone.state(), PhoneState::OnHook);

    assert_eq!(
        *log.lock(),
        vec![
            "OffHook --CallDialed--> Connecting",
            "Connecting --CallConnected--> Connected",
            "Connected --LeftMessage--> OnHook",
        ]
    );
}

#[test]
fn test_combination_lock_scenario() {
    init_tracing();

    let lock = CombinationLock::new("Rafael");
    assert_eq!((lock.unlock("Daiana"), lock.state()), (false, LockState::Failed));
    assert_eq!((lock.unlock("Fabrício"), lock.state()), (false, LockState::Locked));
    assert_eq!((lock.unlock("Rafael"), lock.state()), (true, LockState::Unlocked));
}

#[test]
fn test_light_switch_scenario() {
    init_tracing();

    let mut switch = LightSwitch::new();
    assert!(switch.on());
    assert!(switch.off());
    assert!(!switch.off());
    assert!(!switch.is_lit());
}

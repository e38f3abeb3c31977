//! # NPC Override Integration Tests
//!
//! End-to-end behavior of bound NPC entities:
//!
//! 1. **Push protection**: protected NPCs ignore pushes unless a listener
//!    lifts the cancellation
//! 2. **Listeners**: rewrite, cancel, and abort pushes; observe collisions
//! 3. **Controllers**: facade identity, deferred player list update, AI lockout
//! 4. **Registry**: startup validation of configured types

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use marionette::core::ai::{Goal, TargetGoal};
use marionette::core::{EntityId, EntityKind, HookError, Location, RandomSource, Simulation, Vec3};
use marionette::entity::{downcast_facade, typed_facade, PigFacade, PlayerFacade};
use marionette::{
    keys, BasicNpc, CollisionEvent, ControllerRegistry, EntityController, EntityFacade,
    EventPipeline, HumanController, ListenerError, MarionetteError, Npc, NpcHandle, NpcId,
    PigController, PushEvent, Settings,
};

// ============================================================================
// Helpers
// ============================================================================

fn sim() -> Simulation {
    Simulation::new(16, &RandomSource::ChaCha { seed: 99 })
}

fn origin() -> Location {
    Location::new(0.0, 64.0, 0.0)
}

/// Spawns a bound pig NPC at `at` and returns its entity and NPC.
fn spawn_pig_at(
    sim: &mut Simulation,
    pipeline: &Rc<EventPipeline>,
    npc: BasicNpc,
    at: Location,
) -> (EntityId, Rc<RefCell<BasicNpc>>, PigController) {
    let npc = npc.into_shared();
    let handle: NpcHandle = npc.clone();
    let mut controller = PigController::pig(Rc::clone(pipeline));
    let entity = controller.spawn(sim, at, handle).unwrap().entity();
    (entity, npc, controller)
}

fn spawn_pig(
    sim: &mut Simulation,
    pipeline: &Rc<EventPipeline>,
    npc: BasicNpc,
) -> (EntityId, Rc<RefCell<BasicNpc>>, PigController) {
    spawn_pig_at(sim, pipeline, npc, origin())
}

fn motion(sim: &Simulation, id: EntityId) -> Vec3 {
    sim.world().motion(id).unwrap()
}

/// Pushes `id` and returns the change in its motion.
fn push_delta(sim: &mut Simulation, id: EntityId, push: Vec3) -> Vec3 {
    let before = motion(sim, id);
    sim.push(id, push).unwrap();
    motion(sim, id) - before
}

// ============================================================================
// Push protection
// ============================================================================

/// Test: the scripted scenario. Protected by default, then allowed by a
/// listener that clears the cancellation.
#[test]
fn test_push_scenario() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));
    let push = Vec3::new(5.0, 0.0, 0.0);

    assert_eq!(push_delta(&mut sim, pig, push), Vec3::ZERO);

    pipeline.register_listener(|event: &mut PushEvent| {
        event.set_cancelled(false);
        Ok(())
    });
    assert_eq!(push_delta(&mut sim, pig, push), push);
}

/// Test: every push on a protected NPC with no listeners is dropped.
#[test]
fn test_protected_without_listeners_drops_all() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, true),
    );

    for push in [Vec3::X, Vec3::Z, Vec3::new(-3.0, 1.0, 0.5)] {
        assert_eq!(push_delta(&mut sim, pig, push), Vec3::ZERO);
    }
}

/// Test: an unprotected NPC with no listeners takes pushes unchanged.
#[test]
fn test_unprotected_without_listeners_applies_exactly() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, false),
    );

    let push = Vec3::new(0.5, 0.25, -0.125);
    assert_eq!(push_delta(&mut sim, pig, push), push);
}

/// Test: protection is read on every push, so changing the metadata takes
/// effect immediately.
#[test]
fn test_protection_change_applies_to_next_push() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, npc, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));

    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::ZERO);
    npc.borrow_mut().data_mut().set(keys::DEFAULT_PROTECTED, false);
    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::X);
}

// ============================================================================
// Listeners
// ============================================================================

/// Test: listeners that all cancel drop the push even for an unprotected NPC.
#[test]
fn test_all_cancelling_listeners_drop_push() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, false),
    );
    for _ in 0..2 {
        pipeline.register_listener(|event: &mut PushEvent| {
            event.set_cancelled(true);
            Ok(())
        });
    }

    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::ZERO);
}

/// Test: a rewritten vector is what gets applied.
#[test]
fn test_listener_rewrites_vector() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, false),
    );
    pipeline.register_listener(|event: &mut PushEvent| {
        if event.vector() == Vec3::X {
            event.set_vector(Vec3::Z);
        }
        Ok(())
    });

    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::Z);
}

/// Test: later listeners see earlier listeners' changes, and the last word
/// on cancellation wins.
#[test]
fn test_listeners_see_each_other() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));

    let seen = Rc::new(Cell::new(None));
    pipeline.register_listener(|event: &mut PushEvent| {
        event.set_cancelled(false);
        event.set_vector(event.vector() * 2.0);
        Ok(())
    });
    let sink = Rc::clone(&seen);
    pipeline.register_listener(move |event: &mut PushEvent| {
        sink.set(Some((event.is_cancelled(), event.vector())));
        Ok(())
    });

    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(seen.get(), Some((false, Vec3::new(2.0, 0.0, 0.0))));
}

/// Test: the default cancellation is fixed when the event is built.
/// Lifting protection mid-dispatch changes neither the event nor the push.
#[test]
fn test_default_cancellation_fixed_at_construction() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, npc, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, true),
    );

    let writer = Rc::clone(&npc);
    pipeline.register_listener(move |_: &mut PushEvent| {
        writer.borrow_mut().data_mut().set(keys::DEFAULT_PROTECTED, false);
        Ok(())
    });
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    pipeline.register_listener(move |event: &mut PushEvent| {
        sink.set(Some(event.is_cancelled()));
        Ok(())
    });

    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::ZERO);
    assert_eq!(seen.get(), Some(true));
    assert!(!npc.borrow().data().get(keys::DEFAULT_PROTECTED, true));
}

/// Test: the event names the NPC and entity being pushed.
#[test]
fn test_push_event_identifies_npc() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(42), "Wilbur"));

    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    pipeline.register_listener(move |event: &mut PushEvent| {
        sink.set(Some((event.npc().borrow().id(), event.entity())));
        Ok(())
    });

    sim.push(pig, Vec3::X).unwrap();
    assert_eq!(seen.get(), Some((NpcId(42), pig)));
}

/// Test: a failing listener aborts the push, the error leaves the
/// simulation, and the override stays installed.
#[test]
fn test_listener_error_aborts_push() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, false),
    );
    pipeline.register_listener(|_: &mut PushEvent| Err(ListenerError::new("not today")));

    let before = motion(&sim, pig);
    let result = sim.push(pig, Vec3::X);
    assert!(matches!(result, Err(HookError::Aborted { entity, .. }) if entity == pig));
    assert_eq!(motion(&sim, pig), before);
    assert!(sim.has_hooks(pig));
}

/// Test: collision events are raised only while someone listens, and never
/// stop the collision itself.
#[test]
fn test_collision_event_needs_listener() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(3), "Wilbur"));
    let cow = sim.spawn(EntityKind::Cow, Location::new(0.3, 64.0, 0.0)).unwrap();
    sim.world_mut().lock_selectors(cow);

    sim.step().unwrap();
    let pushed_away = motion(&sim, cow);
    assert!(pushed_away.x > 0.0, "cow should be shoved away from the npc");
    // Protected npc drops its own half of the shove.
    assert_eq!(motion(&sim, pig), Vec3::ZERO);

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    pipeline.register_listener(move |event: &mut CollisionEvent| {
        sink.borrow_mut().push((event.entity(), event.other()));
        Ok(())
    });
    sim.step().unwrap();

    let events = events.borrow();
    assert!(!events.is_empty());
    let (entity, other) = events[0];
    assert_eq!(entity, pig);
    assert_eq!(other.id, cow);
    assert_eq!(other.kind, EntityKind::Cow);
    assert!(other.npc.is_none());
}

/// Test: two NPCs colliding report each other's NPC id.
#[test]
fn test_collision_between_npcs_reports_npc_ids() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (first, _, _left) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(1), "Left"));
    let (second, _, _right) = spawn_pig_at(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(2), "Right"),
        Location::new(0.3, 64.0, 0.0),
    );

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    pipeline.register_listener(move |event: &mut CollisionEvent| {
        sink.borrow_mut()
            .push((event.npc().borrow().id(), event.other().npc));
        Ok(())
    });

    sim.collide(first, second).unwrap();
    sim.collide(second, first).unwrap();

    // The pushed side raises no collision event of its own.
    assert_eq!(
        *seen.borrow(),
        vec![(NpcId(1), Some(NpcId(2))), (NpcId(2), Some(NpcId(1)))]
    );
}

/// Test: a failing collision listener aborts the step.
#[test]
fn test_collision_listener_error_aborts_step() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(3), "Wilbur"));
    sim.spawn(EntityKind::Sheep, Location::new(0.2, 64.0, 0.2)).unwrap();
    pipeline.register_listener(|_: &mut CollisionEvent| Err(ListenerError::new("blocked")));

    assert!(matches!(
        sim.step(),
        Err(HookError::Aborted { entity, .. }) if entity == pig
    ));
    assert!(sim.has_hooks(pig));
}

// ============================================================================
// Bound entities
// ============================================================================

/// Test: binding empties the AI and it stays empty.
#[test]
fn test_bound_selectors_stay_empty() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let mut controller = marionette::entity::GenericMobController::new(EntityKind::Zombie, Rc::clone(&pipeline));
    let npc: NpcHandle = BasicNpc::new(NpcId(9), "Walker").into_shared();
    let zombie = controller.spawn(&mut sim, origin(), npc).unwrap().entity();

    assert!(!sim
        .world_mut()
        .add_goal(zombie, Goal::Wander { chance: 1.0, speed: 0.2 }));
    assert!(!sim
        .world_mut()
        .add_target(zombie, TargetGoal::NearestPlayer { range: 16.0, speed: 0.2 }));

    sim.spawn(EntityKind::Player, Location::new(4.0, 64.0, 0.0)).unwrap();
    for _ in 0..20 {
        sim.step().unwrap();
    }

    let record = sim.world().record(zombie).unwrap();
    assert!(record.goals().is_empty());
    assert!(record.targets().is_empty());
    assert_eq!(sim.world().location(zombie).map(|l| l.x), Some(0.0));
}

/// Test: the NPC updates once per step, after the host moved the entity.
#[test]
fn test_npc_updates_every_tick() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, npc, _controller) = spawn_pig(
        &mut sim,
        &pipeline,
        BasicNpc::new(NpcId(1), "Wilbur").with_data(keys::DEFAULT_PROTECTED, false),
    );
    sim.push(pig, Vec3::new(1.0, 0.0, 0.0)).unwrap();

    for _ in 0..3 {
        sim.step().unwrap();
    }

    let npc = npc.borrow();
    assert_eq!(npc.updates(), 3);
    assert_eq!(npc.last_seen(), sim.world().location(pig));
}

/// Test: lightning leaves a bound pig untouched.
#[test]
fn test_bound_pig_survives_lightning() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));
    let vitals = sim.world().vitals(pig);

    sim.strike_lightning(pig).unwrap();

    assert_eq!(sim.world().record(pig).map(|r| r.kind()), Some(EntityKind::Pig));
    assert_eq!(sim.world().vitals(pig), vitals);
}

// ============================================================================
// Controllers and facades
// ============================================================================

/// Test: every way of reaching the facade yields the same object.
#[test]
fn test_facade_identity() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let mut controller = PigController::pig(Rc::clone(&pipeline));
    let npc: NpcHandle = BasicNpc::new(NpcId(1), "Wilbur").into_shared();

    let spawned = controller.spawn(&mut sim, origin(), npc).unwrap();
    let again = controller.facade(&mut sim).unwrap();
    assert!(Rc::ptr_eq(&spawned, &again));

    let typed = controller.typed_facade(&mut sim).unwrap();
    let by_entity = typed_facade::<PigFacade>(&mut sim, spawned.entity()).unwrap();
    let downcast = downcast_facade::<PigFacade>(Rc::clone(&spawned)).unwrap();
    assert!(Rc::ptr_eq(&typed, &by_entity));
    assert!(Rc::ptr_eq(&typed, &downcast));

    assert!(typed.set_saddled(sim.world_mut(), true));
    assert!(by_entity.has_saddle(sim.world()));
    assert_eq!(spawned.npc().map(|npc| npc.borrow().id()), Some(NpcId(1)));
}

/// Test: facades of the wrong type are refused.
#[test]
fn test_facade_type_checked() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let (pig, _, _controller) = spawn_pig(&mut sim, &pipeline, BasicNpc::new(NpcId(1), "Wilbur"));

    assert!(matches!(
        typed_facade::<PlayerFacade>(&mut sim, pig),
        Err(MarionetteError::TypeMismatch { .. })
    ));
}

/// Test: the player list update runs once, on the step after spawning.
#[test]
fn test_player_list_update_is_deferred() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let mut controller = HumanController::new(Rc::clone(&pipeline), true);
    let npc: NpcHandle = BasicNpc::new(NpcId(5), "&eGuide").into_shared();
    let player = controller.spawn(&mut sim, origin(), npc).unwrap().entity();

    assert!(sim.world().is_listed(player));
    assert_eq!(sim.pending_tasks(), 1);

    sim.step().unwrap();
    assert!(!sim.world().is_listed(player));
    assert_eq!(sim.pending_tasks(), 0);

    assert!(sim.world_mut().set_listed(player, true));
    sim.step().unwrap();
    assert!(sim.world().is_listed(player));
}

/// Test: the NPC's own metadata beats the controller default.
#[test]
fn test_player_list_metadata_override() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let mut controller = HumanController::new(Rc::clone(&pipeline), true);
    let npc: NpcHandle = BasicNpc::new(NpcId(5), "Guide")
        .with_data(keys::REMOVE_FROM_PLAYER_LIST, false)
        .into_shared();
    let player = controller.spawn(&mut sim, origin(), npc).unwrap().entity();

    sim.step().unwrap();
    assert!(sim.world().is_listed(player));
}

/// Test: despawning before the deferred update runs is harmless.
#[test]
fn test_player_despawned_before_list_update() {
    let pipeline = Rc::new(EventPipeline::new());
    let mut sim = sim();
    let mut controller = HumanController::new(Rc::clone(&pipeline), true);
    let npc: NpcHandle = BasicNpc::new(NpcId(5), "Guide").into_shared();
    let player = controller.spawn(&mut sim, origin(), npc).unwrap().entity();

    assert!(controller.despawn(&mut sim));
    assert!(!sim.has_hooks(player));
    sim.step().unwrap();
    assert!(!sim.world().is_alive(player));
}

// ============================================================================
// Registry
// ============================================================================

/// Test: unknown and uncontrollable types are rejected at startup.
#[test]
fn test_registry_rejects_bad_types() {
    for bad in ["DRAGON", "zombified_pig"] {
        let settings = Settings {
            entity_types: vec!["PIG".to_owned(), bad.to_owned()],
            ..Settings::default()
        };
        match ControllerRegistry::new(&settings, Rc::new(EventPipeline::new())) {
            Err(MarionetteError::UnsupportedEntityType(name)) => assert_eq!(name, bad),
            _ => panic!("{bad} should be rejected"),
        }
    }
}

/// Test: loosely written names resolve to their controllers.
#[test]
fn test_registry_resolves_names() {
    let registry = ControllerRegistry::new(&Settings::default(), Rc::new(EventPipeline::new())).unwrap();

    assert_eq!(registry.create_by_name("villager").unwrap().kind(), EntityKind::Villager);
    assert_eq!(registry.create_by_name(" Pig ").unwrap().kind(), EntityKind::Pig);
    assert_eq!(registry.create_by_name("play").unwrap().kind(), EntityKind::Player);
    assert!(matches!(
        registry.create_by_name("kraken"),
        Err(MarionetteError::UnsupportedEntityType(_))
    ));
}

/// Test: NPCs described in a settings file spawn through the registry.
#[test]
fn test_spawn_from_settings_file() {
    let settings = Settings::from_toml_str(
        r#"
        entity_types = ["player", "pig"]

        [[npcs]]
        name = "&aWilbur"
        entity_type = "pig"
        at = { x = 2.0, y = 64.0, z = 2.0 }
        data = { protected = false }

        [[npcs]]
        name = "Guide"
        entity_type = "PLAYER"
        at = { x = -2.0, y = 64.0, z = 0.0, yaw = 180.0 }
        "#,
    )
    .unwrap();
    let pipeline = Rc::new(EventPipeline::new());
    let registry = ControllerRegistry::new(&settings, Rc::clone(&pipeline)).unwrap();
    let mut sim = Simulation::new(settings.world_capacity, &settings.random);

    let mut facades: Vec<Rc<dyn EntityFacade>> = Vec::new();
    for (i, spec) in settings.npcs.iter().enumerate() {
        let npc: NpcHandle = BasicNpc::new(NpcId(i as u32), spec.name.clone())
            .with_store(spec.data.clone())
            .into_shared();
        let mut controller = registry.create_by_name(&spec.entity_type).unwrap();
        facades.push(controller.spawn(&mut sim, spec.at, npc).unwrap());
    }

    assert_eq!(facades[0].kind(), EntityKind::Pig);
    assert_eq!(facades[1].kind(), EntityKind::Player);
    assert_eq!(facades[1].location(sim.world()).map(|l| l.yaw), Some(180.0));

    let pig = facades[0].entity();
    assert_eq!(push_delta(&mut sim, pig, Vec3::X), Vec3::X);
}

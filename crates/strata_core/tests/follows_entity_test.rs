//! # Follow Component Tests
//!
//! Drives the store and the component registry the way the engine does:
//! `step`, detach components of removed entities, then run systems.

mod common;

use common::{assert_close, RecordingVisuals};
use strata_core::{
    ComponentRegistry, EntityId, EntitySpec, EntityStore, FollowState, FollowsEntity,
    KinematicPhysics,
};
use strata_shared::Vec3;

struct Harness {
    store: EntityStore<KinematicPhysics>,
    components: ComponentRegistry,
    visuals: RecordingVisuals,
}

impl Harness {
    fn new() -> Self {
        let mut components = ComponentRegistry::new();
        components.register(FollowsEntity);
        Self {
            store: EntityStore::new(KinematicPhysics::new()),
            components,
            visuals: RecordingVisuals::default(),
        }
    }

    fn tick(&mut self) {
        let removed = self.store.step(50.0, &mut self.visuals);
        for id in removed {
            self.components.remove_entity(id, &mut self.store);
        }
        self.components.run_systems(50.0, &mut self.store);
    }

    fn follow(&mut self, follower: EntityId, target: EntityId, offset: Vec3) -> bool {
        self.components.add_component::<FollowsEntity>(
            follower,
            |state| {
                state.target = target;
                state.offset = offset;
            },
            &mut self.store,
        )
    }
}

/// Test: Follower lands at target + offset on the next step.
#[test]
fn test_follower_tracks_target_with_offset() {
    let mut h = Harness::new();
    let target = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
    let follower = h.store.add(EntitySpec::new(Vec3::new(-20.0, 0.0, 0.0), 0.5, 0.5));
    assert!(h.follow(follower, target, Vec3::new(0.0, 1.0, 0.0)));

    h.store.set_position(target, Vec3::new(5.0, 0.0, 5.0));
    h.tick();

    assert_close(h.store.position(follower).expect("live"), Vec3::new(5.0, 1.0, 5.0));
}

/// Test: Removing the target detaches the component within one step and
/// leaves the follower alive.
#[test]
fn test_target_removal_detaches_component() {
    let mut h = Harness::new();
    let target = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
    let follower = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
    h.follow(follower, target, Vec3::Y);
    h.tick();
    let parked = h.store.position(follower).expect("live");

    h.store.remove(target);
    h.tick();

    assert!(!h.components.has::<FollowsEntity>(follower));
    assert!(h.store.contains(follower));
    assert_close(h.store.position(follower).expect("live"), parked);
}

/// Test: The render system copies the target's render position.
#[test]
fn test_render_position_follows_target_render_position() {
    let mut h = Harness::new();
    let target = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0).with_physics_body());
    let follower = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
    h.follow(follower, target, Vec3::new(0.0, 0.9, 0.0));

    let body = h.store.body(target).expect("body");
    h.store
        .physics_mut()
        .set_velocity(body, Vec3::new(2.0, 0.0, 0.0));

    h.store.update_render_positions(500.0);
    h.components.run_render_systems(500.0, &mut h.store);

    assert_close(
        h.store.render_position(follower).expect("live"),
        Vec3::new(1.0, 0.9, 0.0),
    );
}

/// Test: Default state follows nothing and detaches on the first pass.
#[test]
fn test_default_state_detaches() {
    let mut h = Harness::new();
    let follower = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));

    assert_eq!(FollowState::default().target, EntityId::NULL);
    assert!(h
        .components
        .add_component::<FollowsEntity>(follower, |_| {}, &mut h.store));
    h.tick();

    assert!(!h.components.has::<FollowsEntity>(follower));
}

/// Test: Components of a removed entity are detached with it.
#[test]
fn test_removed_follower_loses_its_record() {
    let mut h = Harness::new();
    let target = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
    let follower = h.store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
    h.follow(follower, target, Vec3::ZERO);

    h.store.remove(follower);
    h.tick();

    assert!(h.components.states::<FollowsEntity>().is_empty());
    assert!(!h.follow(follower, target, Vec3::ZERO));
}

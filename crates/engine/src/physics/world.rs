use std::collections::HashMap;

use rapier2d::crossbeam::channel::{unbounded, Receiver};
use rapier2d::prelude::{
    point, vector, ActiveEvents, CCDSolver, ChannelEventCollector, ColliderBuilder,
    ColliderHandle, ColliderSet, CollisionEvent as RapierCollisionEvent, ContactForceEvent,
    DefaultBroadPhase, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};
use thiserror::Error;
use tracing::debug;

use crate::app::Vec2;

use super::collision::{
    CollisionCategory, CollisionDispatcher, CollisionEvent, ContactBody, EntityId,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec2 },
    /// Capsule between two points given relative to the body position.
    Segment { a: Vec2, b: Vec2, radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub category: CollisionCategory,
    pub shape: BodyShape,
    pub position: Vec2,
    /// Ignored for static bodies.
    pub mass: f32,
    pub friction: f32,
    pub elasticity: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("entity {0:?} already owns a body")]
    DuplicateOwner(EntityId),
    #[error("entity {0:?} owns no body")]
    UnknownOwner(EntityId),
    #[error("invalid body for entity {owner:?}: {reason}")]
    InvalidBody {
        owner: EntityId,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub contacts: usize,
    pub dispatched: usize,
}

#[derive(Debug, Clone, Copy)]
struct OwnedBody {
    body: RigidBodyHandle,
    category: CollisionCategory,
}

/// Rigid-body simulation with categorised bodies.
///
/// Every body has exactly one collider. The collider handle resolves to its
/// category and owning entity through a side-table, which is how raw solver
/// contacts become [`CollisionEvent`]s.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    event_collector: ChannelEventCollector,
    collision_events: Receiver<RapierCollisionEvent>,
    force_events: Receiver<ContactForceEvent>,
    started: Vec<(ColliderHandle, ColliderHandle)>,
    contacts: Vec<CollisionEvent>,
    contact_bodies: HashMap<ColliderHandle, ContactBody>,
    owned_bodies: HashMap<EntityId, OwnedBody>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        let (collision_send, collision_events) = unbounded();
        let (force_send, force_events) = unbounded();
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![gravity.x, gravity.y],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            event_collector: ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            force_events,
            started: Vec::new(),
            contacts: Vec::new(),
            contact_bodies: HashMap::new(),
            owned_bodies: HashMap::new(),
        }
    }

    /// Creates the body and its collider. The category is fixed for the
    /// lifetime of the body.
    pub fn add_body(&mut self, owner: EntityId, desc: &BodyDesc) -> Result<(), PhysicsError> {
        if self.owned_bodies.contains_key(&owner) {
            return Err(PhysicsError::DuplicateOwner(owner));
        }
        validate_body(owner, desc)?;

        let builder = match desc.category {
            CollisionCategory::Static => RigidBodyBuilder::fixed(),
            _ => RigidBodyBuilder::dynamic(),
        };
        let body = builder
            .translation(vector![desc.position.x, desc.position.y])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let shape = match desc.shape {
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            }
            BodyShape::Segment { a, b, radius } => {
                ColliderBuilder::capsule_from_endpoints(point![a.x, a.y], point![b.x, b.y], radius)
            }
        };
        let mut collider = shape
            .friction(desc.friction)
            .restitution(desc.elasticity)
            .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
            .contact_force_event_threshold(0.0);
        if desc.category != CollisionCategory::Static {
            collider = collider.mass(desc.mass);
        }
        let collider_handle = self.collider_set.insert_with_parent(
            collider.build(),
            body_handle,
            &mut self.rigid_body_set,
        );

        self.contact_bodies.insert(
            collider_handle,
            ContactBody {
                category: desc.category,
                owner,
            },
        );
        self.owned_bodies.insert(
            owner,
            OwnedBody {
                body: body_handle,
                category: desc.category,
            },
        );
        debug!(
            owner = owner.0,
            category = ?desc.category,
            x = desc.position.x,
            y = desc.position.y,
            "body_added"
        );
        Ok(())
    }

    pub fn position(&self, owner: EntityId) -> Option<Vec2> {
        let owned = self.owned_bodies.get(&owner)?;
        let body = self.rigid_body_set.get(owned.body)?;
        let translation = body.translation();
        Some(Vec2::new(translation.x, translation.y))
    }

    /// Counter-clockwise rotation in radians.
    pub fn angle(&self, owner: EntityId) -> Option<f32> {
        let owned = self.owned_bodies.get(&owner)?;
        let body = self.rigid_body_set.get(owned.body)?;
        Some(body.rotation().angle())
    }

    pub fn velocity(&self, owner: EntityId) -> Option<Vec2> {
        let owned = self.owned_bodies.get(&owner)?;
        let body = self.rigid_body_set.get(owned.body)?;
        let linvel = body.linvel();
        Some(Vec2::new(linvel.x, linvel.y))
    }

    pub fn apply_impulse(&mut self, owner: EntityId, impulse: Vec2) -> Result<(), PhysicsError> {
        let body = self
            .owned_bodies
            .get(&owner)
            .and_then(|owned| self.rigid_body_set.get_mut(owned.body))
            .ok_or(PhysicsError::UnknownOwner(owner))?;
        body.apply_impulse(vector![impulse.x, impulse.y], true);
        Ok(())
    }

    pub fn category_of(&self, owner: EntityId) -> Option<CollisionCategory> {
        self.owned_bodies.get(&owner).map(|owned| owned.category)
    }

    pub fn body_count(&self) -> usize {
        self.owned_bodies.len()
    }

    /// Advances the simulation by `dt` seconds and dispatches every contact
    /// of the step before returning.
    ///
    /// Each touching pair yields one event carrying the impulse the solver
    /// applied over the step. A pair that started touching this step is
    /// marked as first contact, including when the solver applied no force.
    pub fn step<C: ?Sized>(
        &mut self,
        dt: f32,
        dispatcher: &CollisionDispatcher<C>,
        ctx: &mut C,
    ) -> StepSummary {
        if !dt.is_finite() || dt <= 0.0 {
            return StepSummary::default();
        }
        self.integration_params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &self.event_collector,
        );

        self.collect_contacts(dt);

        let mut summary = StepSummary {
            contacts: self.contacts.len(),
            dispatched: 0,
        };
        for event in &self.contacts {
            if dispatcher.dispatch(event, ctx) {
                summary.dispatched += 1;
            }
        }
        summary
    }

    fn collect_contacts(&mut self, dt: f32) {
        self.started.clear();
        self.contacts.clear();

        while let Ok(event) = self.collision_events.try_recv() {
            if let RapierCollisionEvent::Started(h1, h2, _flags) = event {
                self.started.push((h1, h2));
            }
        }

        let forces = self.force_events.try_iter().map(|event| {
            let force = Vec2::new(event.total_force.x, event.total_force.y);
            (event.collider1, event.collider2, force)
        });
        merge_contacts(
            &self.contact_bodies,
            &mut self.started,
            forces,
            dt,
            &mut self.contacts,
        );
    }
}

/// Turns one step's raw solver output into collision events, ordered by
/// owner pair. Force events become impulses over `dt`; started pairs with no
/// force event still produce a zero-impulse first contact.
fn merge_contacts(
    bodies: &HashMap<ColliderHandle, ContactBody>,
    started: &mut Vec<(ColliderHandle, ColliderHandle)>,
    forces: impl IntoIterator<Item = (ColliderHandle, ColliderHandle, Vec2)>,
    dt: f32,
    contacts: &mut Vec<CollisionEvent>,
) {
    for (h1, h2, force) in forces {
        let first = take_started(started, h1, h2);
        if let Some(contact) = contact_event(bodies, h1, h2, force * dt, first) {
            contacts.push(contact);
        }
    }
    for (h1, h2) in started.drain(..) {
        if let Some(contact) = contact_event(bodies, h1, h2, Vec2::ZERO, true) {
            contacts.push(contact);
        }
    }

    // Channel delivery order is not stable.
    contacts.sort_by_key(|contact| {
        let (a, b) = (contact.a.owner, contact.b.owner);
        (a.min(b), a.max(b))
    });
}

fn take_started(
    started: &mut Vec<(ColliderHandle, ColliderHandle)>,
    h1: ColliderHandle,
    h2: ColliderHandle,
) -> bool {
    match started
        .iter()
        .position(|&pair| pair == (h1, h2) || pair == (h2, h1))
    {
        Some(index) => {
            started.swap_remove(index);
            true
        }
        None => false,
    }
}

fn contact_event(
    bodies: &HashMap<ColliderHandle, ContactBody>,
    h1: ColliderHandle,
    h2: ColliderHandle,
    total_impulse: Vec2,
    is_first_contact: bool,
) -> Option<CollisionEvent> {
    match (bodies.get(&h1), bodies.get(&h2)) {
        (Some(&a), Some(&b)) => Some(CollisionEvent {
            a,
            b,
            total_impulse,
            is_first_contact,
        }),
        _ => {
            debug!(?h1, ?h2, "contact_without_owner");
            None
        }
    }
}

fn validate_body(owner: EntityId, desc: &BodyDesc) -> Result<(), PhysicsError> {
    let invalid = |reason| Err(PhysicsError::InvalidBody { owner, reason });

    if !desc.position.is_finite() {
        return invalid("position must be finite");
    }
    let shape_ok = match desc.shape {
        BodyShape::Ball { radius } => radius.is_finite() && radius > 0.0,
        BodyShape::Cuboid { half_extents } => {
            half_extents.is_finite() && half_extents.x > 0.0 && half_extents.y > 0.0
        }
        BodyShape::Segment { a, b, radius } => {
            a.is_finite() && b.is_finite() && radius.is_finite() && radius >= 0.0
        }
    };
    if !shape_ok {
        return invalid("shape dimensions must be finite and positive");
    }
    if desc.category != CollisionCategory::Static && !(desc.mass.is_finite() && desc.mass > 0.0) {
        return invalid("dynamic bodies need a finite positive mass");
    }
    if !(desc.friction.is_finite() && desc.friction >= 0.0) {
        return invalid("friction must be finite and non-negative");
    }
    if !(desc.elasticity.is_finite() && desc.elasticity >= 0.0) {
        return invalid("elasticity must be finite and non-negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;
    const FLOOR: EntityId = EntityId(1);
    const BALL: EntityId = EntityId(2);
    const BOX: EntityId = EntityId(3);

    #[derive(Default)]
    struct Recorder {
        events: Vec<CollisionEvent>,
    }

    fn record(event: &CollisionEvent, recorder: &mut Recorder) {
        recorder.events.push(*event);
    }

    fn floor() -> BodyDesc {
        BodyDesc {
            category: CollisionCategory::Static,
            shape: BodyShape::Segment {
                a: Vec2::new(-200.0, 0.0),
                b: Vec2::new(200.0, 0.0),
                radius: 1.0,
            },
            position: Vec2::ZERO,
            mass: 0.0,
            friction: 1.0,
            elasticity: 0.0,
        }
    }

    fn ball(category: CollisionCategory, x: f32, y: f32) -> BodyDesc {
        BodyDesc {
            category,
            shape: BodyShape::Ball { radius: 10.0 },
            position: Vec2::new(x, y),
            mass: 1.0,
            friction: 1.0,
            elasticity: 0.0,
        }
    }

    fn crate_box(x: f32, y: f32, half: f32) -> BodyDesc {
        BodyDesc {
            category: CollisionCategory::Moving,
            shape: BodyShape::Cuboid {
                half_extents: Vec2::new(half, half),
            },
            position: Vec2::new(x, y),
            mass: 1.0,
            friction: 1.0,
            elasticity: 0.0,
        }
    }

    #[test]
    fn duplicate_owner_is_rejected() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.add_body(BALL, &ball(CollisionCategory::Player, 0.0, 0.0)).expect("first");

        let err = world
            .add_body(BALL, &ball(CollisionCategory::Moving, 50.0, 0.0))
            .expect_err("duplicate");

        assert_eq!(err, PhysicsError::DuplicateOwner(BALL));
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.category_of(BALL), Some(CollisionCategory::Player));
    }

    #[test]
    fn dynamic_bodies_need_mass_but_static_ones_do_not() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut weightless = ball(CollisionCategory::Moving, 0.0, 0.0);
        weightless.mass = 0.0;

        assert!(matches!(
            world.add_body(BALL, &weightless),
            Err(PhysicsError::InvalidBody { owner: BALL, .. })
        ));
        world.add_body(FLOOR, &floor()).expect("static body without mass");
        assert_eq!(world.category_of(FLOOR), Some(CollisionCategory::Static));
        assert_eq!(world.category_of(BALL), None);
    }

    #[test]
    fn gravity_moves_dynamic_bodies_only() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -900.0));
        world.add_body(FLOOR, &floor()).expect("floor");
        world.add_body(BALL, &ball(CollisionCategory::Moving, 0.0, 300.0)).expect("ball");
        let dispatcher = CollisionDispatcher::<Recorder>::new();
        let mut recorder = Recorder::default();

        for _ in 0..10 {
            world.step(DT, &dispatcher, &mut recorder);
        }

        assert!(world.position(BALL).expect("ball").y < 300.0);
        assert_eq!(world.position(FLOOR), Some(Vec2::ZERO));
    }

    #[test]
    fn impulse_changes_velocity_by_inverse_mass() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut heavy = ball(CollisionCategory::Player, 0.0, 0.0);
        heavy.mass = 2.0;
        world.add_body(BALL, &heavy).expect("ball");

        world.apply_impulse(BALL, Vec2::new(10.0, 0.0)).expect("impulse");
        world.step(DT, &CollisionDispatcher::<Recorder>::new(), &mut Recorder::default());

        let velocity = world.velocity(BALL).expect("velocity");
        assert!((velocity.x - 5.0).abs() < 1e-3, "velocity {velocity:?}");
        assert_eq!(
            world.apply_impulse(EntityId(99), Vec2::new(1.0, 0.0)),
            Err(PhysicsError::UnknownOwner(EntityId(99)))
        );
    }

    #[test]
    fn landing_dispatches_first_contact_then_resting_contacts() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -900.0));
        world.add_body(FLOOR, &floor()).expect("floor");
        world.add_body(BALL, &ball(CollisionCategory::Player, 0.0, 40.0)).expect("ball");
        let mut dispatcher = CollisionDispatcher::new();
        dispatcher.register(CollisionCategory::Player, CollisionCategory::Static, record);
        let mut recorder = Recorder::default();

        for _ in 0..90 {
            world.step(DT, &dispatcher, &mut recorder);
        }

        let events = &recorder.events;
        assert!(!events.is_empty());
        assert!(events[0].is_first_contact);
        assert!(events.iter().any(|event| event.impulse_magnitude() > 0.0));
        assert!(events.iter().any(|event| !event.is_first_contact));
        for event in events {
            let owners = [event.a.owner, event.b.owner];
            assert!(owners.contains(&FLOOR) && owners.contains(&BALL));
        }
        let resting = world.position(BALL).expect("ball");
        assert!(resting.y > 5.0 && resting.y < 20.0, "resting at {resting:?}");
    }

    #[test]
    fn unregistered_pairs_are_counted_but_not_dispatched() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -900.0));
        world.add_body(FLOOR, &floor()).expect("floor");
        world.add_body(BOX, &crate_box(0.0, 12.0, 10.0)).expect("lower box");
        world.add_body(BALL, &crate_box(0.0, 45.0, 5.0)).expect("upper box");
        let mut dispatcher = CollisionDispatcher::new();
        dispatcher.register(CollisionCategory::Static, CollisionCategory::Moving, record);
        let mut recorder = Recorder::default();

        let mut total = StepSummary::default();
        for _ in 0..90 {
            let summary = world.step(DT, &dispatcher, &mut recorder);
            total.contacts += summary.contacts;
            total.dispatched += summary.dispatched;
        }

        assert!(total.dispatched > 0);
        assert!(total.contacts > total.dispatched);
        assert_eq!(recorder.events.len(), total.dispatched);
        for event in &recorder.events {
            assert!(event.body_with_category(CollisionCategory::Static).is_some());
        }
    }

    #[test]
    fn off_centre_support_tips_a_plank() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -900.0));
        world
            .add_body(FLOOR, &ball(CollisionCategory::Static, 0.0, 0.0))
            .expect("post");
        let plank = BodyDesc {
            shape: BodyShape::Cuboid {
                half_extents: Vec2::new(100.0, 5.0),
            },
            ..crate_box(50.0, 20.0, 5.0)
        };
        world.add_body(BOX, &plank).expect("plank");
        assert_eq!(world.angle(BOX), Some(0.0));

        let dispatcher = CollisionDispatcher::<Recorder>::new();
        let mut recorder = Recorder::default();
        for _ in 0..30 {
            world.step(DT, &dispatcher, &mut recorder);
        }

        let angle = world.angle(BOX).expect("plank angle");
        assert!(angle.abs() > 0.01, "angle {angle}");
        assert_eq!(world.angle(EntityId(99)), None);
    }

    fn handle(index: u32) -> ColliderHandle {
        ColliderHandle::from_raw_parts(index, 0)
    }

    fn contact_bodies() -> HashMap<ColliderHandle, ContactBody> {
        HashMap::from([
            (
                handle(0),
                ContactBody {
                    category: CollisionCategory::Static,
                    owner: FLOOR,
                },
            ),
            (
                handle(1),
                ContactBody {
                    category: CollisionCategory::Player,
                    owner: BALL,
                },
            ),
            (
                handle(2),
                ContactBody {
                    category: CollisionCategory::Moving,
                    owner: BOX,
                },
            ),
        ])
    }

    #[test]
    fn started_contact_without_force_is_a_zero_impulse_first_contact() {
        let bodies = contact_bodies();
        let mut started = vec![(handle(1), handle(0)), (handle(2), handle(0))];
        let forces = [(handle(0), handle(2), Vec2::new(0.0, 600.0))];
        let mut contacts = Vec::new();

        merge_contacts(&bodies, &mut started, forces, DT, &mut contacts);

        assert!(started.is_empty());
        assert_eq!(contacts.len(), 2);
        let grazing = contacts[0];
        assert!(grazing.body_with_category(CollisionCategory::Player).is_some());
        assert_eq!(grazing.total_impulse, Vec2::ZERO);
        assert!(grazing.is_first_contact);
        let pushed = contacts[1];
        assert!(pushed.body_with_category(CollisionCategory::Moving).is_some());
        assert!((pushed.total_impulse.y - 10.0).abs() < 1e-4);
        assert!(pushed.is_first_contact);
    }

    #[test]
    fn force_without_start_is_a_continuing_contact() {
        let bodies = contact_bodies();
        let mut started = Vec::new();
        let forces = [
            (handle(1), handle(0), Vec2::new(0.0, 60.0)),
            (handle(7), handle(0), Vec2::new(0.0, 60.0)),
        ];
        let mut contacts = Vec::new();

        merge_contacts(&bodies, &mut started, forces, DT, &mut contacts);

        assert_eq!(contacts.len(), 1);
        assert!(!contacts[0].is_first_contact);
        assert!((contacts[0].impulse_magnitude() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -900.0));
        world.add_body(BALL, &ball(CollisionCategory::Moving, 0.0, 100.0)).expect("ball");

        let summary = world.step(0.0, &CollisionDispatcher::<Recorder>::new(), &mut Recorder::default());

        assert_eq!(summary, StepSummary::default());
        assert_eq!(world.position(BALL), Some(Vec2::new(0.0, 100.0)));
    }
}

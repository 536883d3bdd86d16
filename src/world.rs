//! The simulation world: object bookkeeping, the per-frame step pipeline,
//! and deferred collision event replay.

use glam::{Quat, Vec3A};
use log::{trace, warn};

use crate::bridge::TransformBridge;
use crate::collision::broadphase::{Broadphase, BroadphaseProxy, filter_for_kind};
use crate::collision::manifold::{ContactManifold, ContactPoint};
use crate::collision::narrowphase;
use crate::dynamics::solver;
use crate::math::integrate_transform;
use crate::object::{CollisionObject, ObjectError, ObjectHandle, ObjectKind};
use crate::shape::ShapeHandle;

#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Advisory lower corner of the simulated region; bounds the broad
    /// phase, does not clip objects.
    pub min_pos: Vec3A,
    pub max_pos: Vec3A,
    /// Broad-phase grid cell edge length.
    pub cell_size: f32,
    pub gravity: Vec3A,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl WorldConfig {
    pub const DEFAULT: Self = Self {
        min_pos: Vec3A::new(-1000.0, -1000.0, -1000.0),
        max_pos: Vec3A::new(1000.0, 1000.0, 1000.0),
        cell_size: 10.0,
        gravity: Vec3A::new(0.0, -10.0, 0.0),
    };

    #[must_use]
    pub const fn with_bounds(min_pos: Vec3A, max_pos: Vec3A) -> Self {
        Self {
            min_pos,
            max_pos,
            cell_size: Self::DEFAULT.cell_size,
            gravity: Self::DEFAULT.gravity,
        }
    }
}

/// One simulated scene. Owns every live collision object, the detector
/// state, the retained contact set, and the host transform bridge.
///
/// All access is single-threaded and synchronous: [`step`](Self::step) runs
/// to completion before returning, and the host serializes all calls.
pub struct World<B: TransformBridge> {
    gravity: Vec3A,
    bridge: B,
    objects: Vec<Option<CollisionObject>>,
    free_slots: Vec<usize>,
    broadphase: Broadphase,
    contacts: Vec<ContactManifold>,
}

impl<B: TransformBridge> World<B> {
    #[must_use]
    pub fn new(config: WorldConfig, bridge: B) -> Self {
        Self {
            gravity: config.gravity,
            bridge,
            objects: Vec::new(),
            free_slots: Vec::new(),
            broadphase: Broadphase::new(config.min_pos, config.max_pos, config.cell_size),
            contacts: Vec::new(),
        }
    }

    /// Registers a new collision object. The initial pose is pulled from the
    /// bridge once, for every kind; use
    /// [`set_initial_transform`](Self::set_initial_transform) to place the
    /// object without a host-side pose.
    ///
    /// Fails without registering anything when the mass does not fit the
    /// kind: dynamic objects need `mass > 0`, all other kinds need
    /// `mass == 0`.
    pub fn new_collision_object(
        &mut self,
        shape: &ShapeHandle,
        mass: f32,
        kind: ObjectKind,
        user_data: u64,
    ) -> Result<ObjectHandle, ObjectError> {
        let mut object = CollisionObject::new(shape.clone(), mass, kind, user_data)?;

        let (position, rotation) = self.bridge.get_world_transform(user_data);
        object.position = position;
        object.rotation = rotation;

        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.objects[slot] = Some(object);
                slot
            }
            None => {
                self.objects.push(Some(object));
                self.objects.len() - 1
            }
        };

        Ok(ObjectHandle(slot))
    }

    /// Removes an object from the world, dropping its shape reference.
    /// Retained contact events keep replaying (they only carry copied user
    /// data), but the handle itself must not be used again.
    pub fn delete_collision_object(&mut self, handle: ObjectHandle) {
        self.objects[handle.0]
            .take()
            .expect("delete of an already deleted collision object");
        self.free_slots.push(handle.0);
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len() - self.free_slots.len()
    }

    /// One-time pose override, usable before simulation or between steps.
    pub fn set_initial_transform(&mut self, handle: ObjectHandle, position: Vec3A, rotation: Quat) {
        let object = self.object_mut(handle);
        object.position = position;
        object.rotation = rotation;
    }

    #[must_use]
    pub fn world_position(&self, handle: ObjectHandle) -> Vec3A {
        self.object(handle).position
    }

    #[must_use]
    pub fn world_rotation(&self, handle: ObjectHandle) -> Quat {
        self.object(handle).rotation
    }

    #[must_use]
    pub fn linear_velocity(&self, handle: ObjectHandle) -> Vec3A {
        self.object(handle).linear_velocity
    }

    #[must_use]
    pub fn angular_velocity(&self, handle: ObjectHandle) -> Vec3A {
        self.object(handle).angular_velocity
    }

    #[must_use]
    pub fn object_kind(&self, handle: ObjectHandle) -> ObjectKind {
        self.object(handle).kind
    }

    /// Bounciness of future contacts involving this object. 0 by default.
    pub fn set_restitution(&mut self, handle: ObjectHandle, restitution: f32) {
        self.object_mut(handle).restitution = restitution.clamp(0.0, 1.0);
    }

    pub const fn set_gravity(&mut self, gravity: Vec3A) {
        self.gravity = gravity;
    }

    #[must_use]
    pub const fn gravity(&self) -> Vec3A {
        self.gravity
    }

    #[must_use]
    pub const fn bridge(&self) -> &B {
        &self.bridge
    }

    pub const fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Accumulates a force on a dynamic object, applied at `point` in world
    /// space (off-center application also accumulates torque). Successive
    /// calls before a step sum; the integrator consumes and clears the
    /// accumulator. Ignored with a warning for non-dynamic objects.
    pub fn apply_force(&mut self, handle: ObjectHandle, force: Vec3A, point: Vec3A) {
        let object = self.object_mut(handle);
        if !object.kind.is_dynamic() {
            warn!("apply_force ignored: object {handle:?} is {:?}", object.kind);
            return;
        }

        let torque = (point - object.position).cross(force);
        object.apply_central_force(force);
        object.apply_torque(torque);
    }

    /// Force accumulated since the last step. Gravity is not part of the
    /// accumulator; it is combined at integration time only.
    #[must_use]
    pub fn total_force(&self, handle: ObjectHandle) -> Vec3A {
        self.object(handle).total_force
    }

    /// Advances the world by `dt` seconds: pull host transforms, integrate
    /// dynamic bodies, detect contacts, resolve them, push results back to
    /// the host, and retain the contact set for
    /// [`for_each_collision`](Self::for_each_collision).
    ///
    /// Non-positive (or non-finite) `dt` is a no-op.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.pull_host_transforms();
        self.integrate(dt);
        self.detect();
        self.resolve();
        self.push_host_transforms();
    }

    /// Replays the contact set retained by the most recent step. Pure read:
    /// calling it any number of times between steps yields identical
    /// replays.
    ///
    /// For every retained pair (trigger pairs included), `collision_cb`
    /// fires twice — once per participant, that participant's user data
    /// first. `contact_point_cb` fires once per contact point with the full
    /// point geometry. Either callback may be `None` to skip that channel.
    pub fn for_each_collision(
        &self,
        mut collision_cb: Option<&mut dyn FnMut(u64, u64)>,
        mut contact_point_cb: Option<&mut dyn FnMut(&ContactPoint)>,
    ) {
        for manifold in &self.contacts {
            if let Some(cb) = collision_cb.as_deref_mut() {
                cb(manifold.user_data_a, manifold.user_data_b);
                cb(manifold.user_data_b, manifold.user_data_a);
            }

            if let Some(cb) = contact_point_cb.as_deref_mut() {
                for point in &manifold.points {
                    cb(point);
                }
            }
        }
    }

    fn object(&self, handle: ObjectHandle) -> &CollisionObject {
        self.objects[handle.0]
            .as_ref()
            .expect("use of a deleted collision object handle")
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> &mut CollisionObject {
        self.objects[handle.0]
            .as_mut()
            .expect("use of a deleted collision object handle")
    }

    /// Kinematic and trigger poses are slaved to the host; dynamic poses are
    /// owned by the integrator and static poses were fixed at creation.
    fn pull_host_transforms(&mut self) {
        for object in self.objects.iter_mut().flatten() {
            if object.kind.is_host_driven() {
                let (position, rotation) = self.bridge.get_world_transform(object.user_data);
                object.position = position;
                object.rotation = rotation;
            }
        }
    }

    /// Semi-implicit Euler over all dynamic bodies; consumes the force and
    /// torque accumulators.
    fn integrate(&mut self, dt: f32) {
        for object in self.objects.iter_mut().flatten() {
            if !object.kind.is_dynamic() {
                continue;
            }

            let force = object.total_force + self.gravity * object.mass;
            object.linear_velocity += force * (object.inv_mass * dt);
            object.angular_velocity += object.inv_inertia_world() * object.total_torque * dt;

            let (position, rotation) = integrate_transform(
                object.position,
                object.rotation,
                object.linear_velocity,
                object.angular_velocity,
                dt,
            );
            object.position = position;
            object.rotation = rotation;

            object.clear_forces();
        }
    }

    /// Broad phase over all live objects, then narrow phase on the
    /// candidates. Replaces the retained contact set.
    fn detect(&mut self) {
        self.broadphase.clear();
        for (slot, object) in self.objects.iter().enumerate() {
            let Some(object) = object else { continue };

            let (group, mask) = filter_for_kind(object.kind);
            self.broadphase.add_proxy(BroadphaseProxy {
                client_slot: slot as u32,
                aabb: object.shape.aabb(object.position, object.rotation),
                collision_filter_group: group,
                collision_filter_mask: mask,
            });
        }

        self.contacts.clear();
        for (a_slot, b_slot) in self.broadphase.overlapping_pairs() {
            let a_handle = ObjectHandle(a_slot as usize);
            let b_handle = ObjectHandle(b_slot as usize);
            let a = self.object(a_handle);
            let b = self.object(b_handle);

            if let Some(manifold) = narrowphase::collide(a_handle, a, b_handle, b) {
                self.contacts.push(manifold);
            }
        }

        trace!("retained {} contact manifold(s)", self.contacts.len());
    }

    /// Impulse response and positional correction for every non-trigger
    /// manifold. Trigger overlaps are recorded but never move anything.
    fn resolve(&mut self) {
        for manifold in &mut self.contacts {
            if manifold.trigger {
                continue;
            }

            let (a, b) = pair_mut(&mut self.objects, manifold.object_a.0, manifold.object_b.0);
            solver::resolve_contact(a, b, manifold);
        }
    }

    fn push_host_transforms(&mut self) {
        for object in self.objects.iter().flatten() {
            if object.kind.is_dynamic() {
                self.bridge
                    .set_world_transform(object.user_data, object.position, object.rotation);
            }
        }
    }
}

/// Disjoint mutable borrows of two object slots.
fn pair_mut(
    objects: &mut [Option<CollisionObject>],
    i: usize,
    j: usize,
) -> (&mut CollisionObject, &mut CollisionObject) {
    debug_assert_ne!(i, j);

    if i < j {
        let (head, tail) = objects.split_at_mut(j);
        (
            head[i].as_mut().expect("contact references deleted object"),
            tail[0].as_mut().expect("contact references deleted object"),
        )
    } else {
        let (head, tail) = objects.split_at_mut(i);
        (
            tail[0].as_mut().expect("contact references deleted object"),
            head[j].as_mut().expect("contact references deleted object"),
        )
    }
}

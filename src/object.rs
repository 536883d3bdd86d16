use crate::shape::ShapeHandle;
use glam::{Mat3A, Quat, Vec3A};
use thiserror::Error;

/// Slot-index handle to a live collision object inside a `World`.
///
/// Handles must not be retained past `delete_collision_object`; using a
/// stale handle is a contract violation and panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Immovable geometry; pose fixed at creation.
    Static,
    /// Host-driven body; pose pulled from the host every step.
    Kinematic,
    /// Simulated body; pose owned by the integrator.
    Dynamic,
    /// Non-physical volume; detects overlap, never responds.
    Trigger,
}

impl ObjectKind {
    /// Kinds whose pose is slaved to the host transform every step.
    #[must_use]
    pub const fn is_host_driven(self) -> bool {
        matches!(self, Self::Kinematic | Self::Trigger)
    }

    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }

    #[must_use]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::Trigger)
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ObjectError {
    #[error("dynamic collision objects require mass > 0")]
    MassRequired,
    #[error("{0:?} collision objects must have zero mass")]
    MassForbidden(ObjectKind),
}

#[derive(Debug)]
pub(crate) struct CollisionObject {
    pub kind: ObjectKind,
    pub mass: f32,
    pub inv_mass: f32,
    pub shape: ShapeHandle,
    pub position: Vec3A,
    pub rotation: Quat,
    pub linear_velocity: Vec3A,
    pub angular_velocity: Vec3A,
    pub inv_inertia_local: Vec3A,
    pub total_force: Vec3A,
    pub total_torque: Vec3A,
    pub restitution: f32,
    pub user_data: u64,
}

impl CollisionObject {
    pub fn new(
        shape: ShapeHandle,
        mass: f32,
        kind: ObjectKind,
        user_data: u64,
    ) -> Result<Self, ObjectError> {
        match kind {
            ObjectKind::Dynamic if mass <= 0.0 => return Err(ObjectError::MassRequired),
            ObjectKind::Static | ObjectKind::Kinematic | ObjectKind::Trigger if mass != 0.0 => {
                return Err(ObjectError::MassForbidden(kind));
            }
            _ => {}
        }

        let inv_mass = if kind.is_dynamic() { 1.0 / mass } else { 0.0 };
        let inv_inertia_local = if kind.is_dynamic() {
            let local_inertia = shape.local_inertia(mass);
            Vec3A::select(
                local_inertia.cmpeq(Vec3A::ZERO),
                Vec3A::ZERO,
                local_inertia.recip(),
            )
        } else {
            Vec3A::ZERO
        };

        Ok(Self {
            kind,
            mass,
            inv_mass,
            shape,
            position: Vec3A::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3A::ZERO,
            angular_velocity: Vec3A::ZERO,
            inv_inertia_local,
            total_force: Vec3A::ZERO,
            total_torque: Vec3A::ZERO,
            restitution: 0.0,
            user_data,
        })
    }

    /// Inverse inertia tensor in world space: `R * diag(inv_local) * R^T`.
    #[must_use]
    pub fn inv_inertia_world(&self) -> Mat3A {
        let basis = Mat3A::from_quat(self.rotation);
        let mut scaled = basis.transpose();
        scaled.x_axis *= self.inv_inertia_local;
        scaled.y_axis *= self.inv_inertia_local;
        scaled.z_axis *= self.inv_inertia_local;

        basis * scaled
    }

    pub fn apply_central_force(&mut self, force: Vec3A) {
        debug_assert!(!force.is_nan());
        self.total_force += force;
    }

    pub fn apply_torque(&mut self, torque: Vec3A) {
        debug_assert!(!torque.is_nan());
        self.total_torque += torque;
    }

    pub const fn clear_forces(&mut self) {
        self.total_force = Vec3A::ZERO;
        self.total_torque = Vec3A::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use glam::Vec3A;

    fn unit_box() -> ShapeHandle {
        Shape::new_box(Vec3A::ONE).unwrap()
    }

    #[test]
    fn mass_rules_per_kind() {
        assert_eq!(
            CollisionObject::new(unit_box(), 0.0, ObjectKind::Dynamic, 0).unwrap_err(),
            ObjectError::MassRequired
        );
        assert!(CollisionObject::new(unit_box(), 1.0, ObjectKind::Dynamic, 0).is_ok());

        for kind in [ObjectKind::Static, ObjectKind::Kinematic, ObjectKind::Trigger] {
            assert_eq!(
                CollisionObject::new(unit_box(), 1.0, kind, 0).unwrap_err(),
                ObjectError::MassForbidden(kind)
            );
            assert!(CollisionObject::new(unit_box(), 0.0, kind, 0).is_ok());
        }
    }

    #[test]
    fn non_dynamic_objects_have_infinite_mass() {
        let object = CollisionObject::new(unit_box(), 0.0, ObjectKind::Kinematic, 0).unwrap();
        assert_eq!(object.inv_mass, 0.0);
        assert_eq!(object.inv_inertia_local, Vec3A::ZERO);
    }

    #[test]
    fn forces_accumulate_and_clear() {
        let mut object = CollisionObject::new(unit_box(), 2.0, ObjectKind::Dynamic, 0).unwrap();
        object.apply_central_force(Vec3A::X);
        object.apply_central_force(Vec3A::X);
        assert_eq!(object.total_force, Vec3A::new(2.0, 0.0, 0.0));

        object.clear_forces();
        assert_eq!(object.total_force, Vec3A::ZERO);
        assert_eq!(object.total_torque, Vec3A::ZERO);
    }
}

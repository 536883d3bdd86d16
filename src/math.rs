use glam::{Mat3A, Quat, Vec3A};
use std::f32::consts::FRAC_PI_4;

/// Largest rotation a single integration step may cover; faster spins are
/// clamped so the quaternion update stays well conditioned.
const ANGULAR_MOTION_THRESHOLD: f32 = FRAC_PI_4;

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Aabb {
    #[must_use]
    pub const fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Intersects the box with `bounds`, keeping `min <= max`.
    #[must_use]
    pub fn clamped(&self, bounds: &Self) -> Self {
        let min = self.min.clamp(bounds.min, bounds.max);
        let max = self.max.clamp(min, bounds.max);
        Self { min, max }
    }
}

/// World-space AABB of an oriented box with the given half extents.
#[must_use]
pub fn transform_aabb(half_extents: Vec3A, position: Vec3A, rotation: Quat) -> Aabb {
    let extent = Mat3A::from_quat(rotation).abs() * half_extents;
    Aabb::new(position - extent, position + extent)
}

/// Advances a pose by `dt` under the given velocities.
///
/// The rotation update applies the exponential map of `ang_vel * dt`, with a
/// series expansion near zero angle.
#[must_use]
pub fn integrate_transform(
    position: Vec3A,
    rotation: Quat,
    lin_vel: Vec3A,
    ang_vel: Vec3A,
    dt: f32,
) -> (Vec3A, Quat) {
    let new_position = position + lin_vel * dt;

    let mut angle = ang_vel.length();
    if angle * dt > ANGULAR_MOTION_THRESHOLD {
        angle = ANGULAR_MOTION_THRESHOLD / dt;
    }

    let axis = if angle < 0.001 {
        ang_vel * (0.5 * dt - dt * dt * dt * 0.020_833_334 * angle * angle)
    } else {
        ang_vel * ((0.5 * angle * dt).sin() / angle)
    };

    let dorn = Quat::from_xyzw(axis.x, axis.y, axis.z, (angle * dt * 0.5).cos());
    let new_rotation = (dorn * rotation).normalize();

    (new_position, new_rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_overlap_is_inclusive_at_touch() {
        let a = Aabb::new(Vec3A::ZERO, Vec3A::ONE);
        let b = Aabb::new(Vec3A::ONE, Vec3A::splat(2.0));
        let c = Aabb::new(Vec3A::splat(1.001), Vec3A::splat(2.0));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn clamped_never_inverts() {
        let bounds = Aabb::new(Vec3A::splat(-1.0), Vec3A::ONE);
        let outside = Aabb::new(Vec3A::splat(5.0), Vec3A::splat(6.0));
        let clamped = outside.clamped(&bounds);

        assert!(clamped.min.cmple(clamped.max).all());
    }

    #[test]
    fn integrate_without_spin_keeps_rotation() {
        let (position, rotation) = integrate_transform(
            Vec3A::ZERO,
            Quat::IDENTITY,
            Vec3A::new(0.0, -1.0, 0.0),
            Vec3A::ZERO,
            0.5,
        );

        assert_eq!(position, Vec3A::new(0.0, -0.5, 0.0));
        assert_eq!(rotation, Quat::IDENTITY);
    }

    #[test]
    fn integrate_spin_rotates_about_axis() {
        let ang_vel = Vec3A::new(0.0, 1.0, 0.0);
        let (_, rotation) =
            integrate_transform(Vec3A::ZERO, Quat::IDENTITY, Vec3A::ZERO, ang_vel, 0.1);

        let (axis, angle) = rotation.to_axis_angle();
        assert!((angle - 0.1).abs() < 1e-4);
        assert!(axis.y > 0.99);
    }
}

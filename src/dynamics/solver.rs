//! Impulse-based contact resolution.
//!
//! Velocity pass: one normal impulse per contact point, applied centrally to
//! dynamic members (static and kinematic participants have zero inverse mass
//! and never move). Position pass: one Baumgarte-style correction per
//! manifold, driven by the deepest point, so resting bodies settle at a
//! stable depth instead of sinking or bouncing.

use crate::collision::manifold::ContactManifold;
use crate::object::CollisionObject;

/// Fraction of the remaining penetration removed per step.
const POSITION_CORRECTION_FACTOR: f32 = 0.8;
/// Penetration tolerated before positional correction kicks in.
const PENETRATION_SLOP: f32 = 0.001;
/// Closing speed below which restitution is ignored; resting contacts must
/// not bounce.
const RESTITUTION_THRESHOLD: f32 = 1.0;

pub(crate) fn resolve_contact(
    a: &mut CollisionObject,
    b: &mut CollisionObject,
    manifold: &mut ContactManifold,
) {
    debug_assert!(!manifold.trigger);

    let inv_mass_sum = a.inv_mass + b.inv_mass;
    if inv_mass_sum == 0.0 {
        return;
    }

    for point in &mut manifold.points {
        let normal = point.normal_world_on_b;
        // closing speed along the normal; normal points from B toward A
        let rel_vel = (a.linear_velocity - b.linear_velocity).dot(normal);
        if rel_vel > 0.0 {
            continue;
        }

        let restitution = if -rel_vel > RESTITUTION_THRESHOLD {
            manifold.combined_restitution
        } else {
            0.0
        };

        let impulse = -(1.0 + restitution) * rel_vel / inv_mass_sum;
        a.linear_velocity += normal * (impulse * a.inv_mass);
        b.linear_velocity -= normal * (impulse * b.inv_mass);
        point.applied_impulse += impulse;
    }

    let Some(deepest) = manifold
        .points
        .iter()
        .max_by(|p, q| p.depth.total_cmp(&q.depth))
    else {
        return;
    };

    let correction = (deepest.depth - PENETRATION_SLOP).max(0.0) / inv_mass_sum
        * POSITION_CORRECTION_FACTOR;
    if correction > 0.0 {
        let normal = deepest.normal_world_on_b;
        a.position += normal * (correction * a.inv_mass);
        b.position -= normal * (correction * b.inv_mass);
    }
}

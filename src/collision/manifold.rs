use arrayvec::ArrayVec;
use glam::Vec3A;

use crate::object::{CollisionObject, ObjectHandle};

pub const MANIFOLD_CACHE_SIZE: usize = 4;

/// A single contact between two collision objects.
///
/// `normal_world_on_b` points from object B toward object A; `depth` is the
/// penetration along that normal and is >= 0 while the shapes overlap.
#[derive(Clone, Copy, Debug)]
pub struct ContactPoint {
    pub position_world_on_a: Vec3A,
    pub position_world_on_b: Vec3A,
    pub normal_world_on_b: Vec3A,
    pub depth: f32,
    /// Normal impulse accumulated by the resolver this step.
    pub applied_impulse: f32,
    pub user_data_a: u64,
    pub user_data_b: u64,
}

/// All contact points between one pair of objects, produced fresh each step
/// and retained until the next step overwrites it.
#[derive(Clone, Debug)]
pub struct ContactManifold {
    pub object_a: ObjectHandle,
    pub object_b: ObjectHandle,
    pub user_data_a: u64,
    pub user_data_b: u64,
    pub points: ArrayVec<ContactPoint, MANIFOLD_CACHE_SIZE>,
    pub(crate) trigger: bool,
    pub(crate) combined_restitution: f32,
}

impl ContactManifold {
    pub(crate) fn new(
        object_a: ObjectHandle,
        a: &CollisionObject,
        object_b: ObjectHandle,
        b: &CollisionObject,
    ) -> Self {
        debug_assert_ne!(object_a, object_b);

        Self {
            object_a,
            object_b,
            user_data_a: a.user_data,
            user_data_b: b.user_data,
            points: ArrayVec::new(),
            trigger: a.kind.is_trigger() || b.kind.is_trigger(),
            combined_restitution: combined_restitution(a, b),
        }
    }

    /// Adds a contact at `position_world_on_b`. When the cache is full the
    /// shallowest point yields to a deeper newcomer.
    pub(crate) fn add_point(&mut self, position_world_on_b: Vec3A, normal_world_on_b: Vec3A, depth: f32) {
        let point = ContactPoint {
            position_world_on_a: position_world_on_b - normal_world_on_b * depth,
            position_world_on_b,
            normal_world_on_b,
            depth,
            applied_impulse: 0.0,
            user_data_a: self.user_data_a,
            user_data_b: self.user_data_b,
        };

        if self.points.is_full() {
            let (shallowest, _) = self
                .points
                .iter()
                .enumerate()
                .min_by(|(_, p), (_, q)| p.depth.total_cmp(&q.depth))
                .map(|(i, p)| (i, p.depth))
                .unwrap();
            if self.points[shallowest].depth < depth {
                self.points[shallowest] = point;
            }
            return;
        }

        self.points.push(point);
    }
}

/// Restitution combination rule: keep the livelier bound against immovable
/// geometry, multiply between two dynamic bodies.
fn combined_restitution(a: &CollisionObject, b: &CollisionObject) -> f32 {
    if a.inv_mass == 0.0 || b.inv_mass == 0.0 {
        a.restitution.max(b.restitution)
    } else {
        a.restitution * b.restitution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use crate::shape::Shape;

    fn object(kind: ObjectKind, mass: f32, restitution: f32) -> CollisionObject {
        let mut object =
            CollisionObject::new(Shape::new_box(Vec3A::ONE).unwrap(), mass, kind, 0).unwrap();
        object.restitution = restitution;
        object
    }

    #[test]
    fn restitution_combines_like_the_solver_expects() {
        let wall = object(ObjectKind::Static, 0.0, 0.1);
        let ball = object(ObjectKind::Dynamic, 1.0, 0.8);
        let other = object(ObjectKind::Dynamic, 1.0, 0.5);

        assert_eq!(combined_restitution(&wall, &ball), 0.8);
        assert_eq!(combined_restitution(&ball, &other), 0.4);
    }

    #[test]
    fn full_cache_keeps_the_deepest_points() {
        let a = object(ObjectKind::Dynamic, 1.0, 0.0);
        let b = object(ObjectKind::Static, 0.0, 0.0);
        let mut manifold = ContactManifold::new(ObjectHandle(0), &a, ObjectHandle(1), &b);

        for depth in [0.4, 0.1, 0.3, 0.2] {
            manifold.add_point(Vec3A::ZERO, Vec3A::Y, depth);
        }
        manifold.add_point(Vec3A::ZERO, Vec3A::Y, 0.5);

        assert_eq!(manifold.points.len(), MANIFOLD_CACHE_SIZE);
        let min_depth = manifold
            .points
            .iter()
            .map(|p| p.depth)
            .fold(f32::INFINITY, f32::min);
        assert_eq!(min_depth, 0.2);
    }

    #[test]
    fn point_on_a_sits_depth_behind_the_normal() {
        let a = object(ObjectKind::Dynamic, 1.0, 0.0);
        let b = object(ObjectKind::Static, 0.0, 0.0);
        let mut manifold = ContactManifold::new(ObjectHandle(0), &a, ObjectHandle(1), &b);

        manifold.add_point(Vec3A::new(0.0, 1.0, 0.0), Vec3A::Y, 0.25);
        let point = manifold.points[0];
        assert_eq!(point.position_world_on_a, Vec3A::new(0.0, 0.75, 0.0));
    }
}

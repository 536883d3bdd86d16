use crate::math::{Aabb, transform_aabb};
use glam::{Quat, Vec3A, Vec3Swizzles};
use std::rc::Rc;
use thiserror::Error;

/// Shared-ownership handle to an immutable collision shape.
///
/// Attaching a shape to a collision object clones the handle, so the
/// geometry lives until the last referencing object (or caller) lets go.
/// Dropping the caller's handle while objects still use the shape is always
/// safe. Resizing means building a new shape and reattaching.
pub type ShapeHandle = Rc<Shape>;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("shape dimensions must be strictly positive and finite")]
    InvalidDimensions,
}

/// Convex collision geometry. Value-immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec3A },
    Sphere { radius: f32 },
}

impl Shape {
    pub fn new_box(half_extents: Vec3A) -> Result<ShapeHandle, ShapeError> {
        if !half_extents.is_finite() || !half_extents.cmpgt(Vec3A::ZERO).all() {
            return Err(ShapeError::InvalidDimensions);
        }

        Ok(Rc::new(Self::Box { half_extents }))
    }

    pub fn new_sphere(radius: f32) -> Result<ShapeHandle, ShapeError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ShapeError::InvalidDimensions);
        }

        Ok(Rc::new(Self::Sphere { radius }))
    }

    /// Half extent of the shape along each local axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec3A {
        match *self {
            Self::Box { half_extents } => half_extents,
            Self::Sphere { radius } => Vec3A::splat(radius),
        }
    }

    /// Supporting point in the given local direction.
    #[must_use]
    pub fn local_supporting_vertex(&self, dir: Vec3A) -> Vec3A {
        match *self {
            Self::Box { half_extents } => {
                Vec3A::select(dir.cmpge(Vec3A::ZERO), half_extents, -half_extents)
            }
            Self::Sphere { radius } => dir.try_normalize().unwrap_or(Vec3A::X) * radius,
        }
    }

    /// World-space bounding box of the shape under the given pose.
    #[must_use]
    pub fn aabb(&self, position: Vec3A, rotation: Quat) -> Aabb {
        match *self {
            Self::Box { half_extents } => transform_aabb(half_extents, position, rotation),
            Self::Sphere { radius } => {
                let extent = Vec3A::splat(radius);
                Aabb::new(position - extent, position + extent)
            }
        }
    }

    /// Principal moments of inertia at the given mass.
    #[must_use]
    pub fn local_inertia(&self, mass: f32) -> Vec3A {
        match *self {
            Self::Box { half_extents } => {
                let l = 2.0 * half_extents;
                let yxx = l.yxx();
                let zzy = l.zzy();

                mass / 12.0 * (yxx * yxx + zzy * zzy)
            }
            Self::Sphere { radius } => Vec3A::splat(0.4 * mass * radius * radius),
        }
    }
}

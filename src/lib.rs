//! `pebble` is a small real-time rigid-body physics and collision engine,
//! meant to be stepped once per frame by a host application that owns the
//! visual representation of every simulated object.
//!
//! The host registers collision objects of four kinds — static geometry,
//! kinematically driven bodies, dynamically simulated bodies, and
//! non-physical trigger volumes — and drives the world with
//! [`World::step`]. Each step pulls host-owned transforms for kinematic and
//! trigger objects, integrates dynamic bodies under gravity and accumulated
//! forces, detects contacts, resolves them, and pushes the resulting dynamic
//! poses back through the [`TransformBridge`]. The contact set of the last
//! completed step can be replayed any number of times with
//! [`World::for_each_collision`].
//!
//! ```no_run
//! use glam::{Quat, Vec3A};
//! use pebble::{ObjectKind, Shape, TransformBridge, World, WorldConfig};
//!
//! struct Host;
//!
//! impl TransformBridge for Host {
//!     fn get_world_transform(&self, _user_data: u64) -> (Vec3A, Quat) {
//!         (Vec3A::ZERO, Quat::IDENTITY)
//!     }
//!     fn set_world_transform(&mut self, _user_data: u64, _position: Vec3A, _rotation: Quat) {}
//! }
//!
//! let mut world = World::new(WorldConfig::DEFAULT, Host);
//! let shape = Shape::new_box(Vec3A::splat(0.5)).unwrap();
//! let body = world
//!     .new_collision_object(&shape, 1.0, ObjectKind::Dynamic, 0)
//!     .unwrap();
//! world.set_initial_transform(body, Vec3A::new(0.0, 10.0, 0.0), Quat::IDENTITY);
//!
//! world.step(1.0 / 60.0);
//! world.for_each_collision(None, Some(&mut |point| println!("{point:?}")));
//! ```

pub mod bridge;
mod collision;
mod dynamics;
pub mod logging;
pub mod math;
pub mod object;
pub mod shape;
pub mod world;

pub use bridge::TransformBridge;
pub use collision::manifold::{ContactManifold, ContactPoint, MANIFOLD_CACHE_SIZE};
pub use object::{ObjectError, ObjectHandle, ObjectKind};
pub use shape::{Shape, ShapeError, ShapeHandle};
pub use world::{World, WorldConfig};

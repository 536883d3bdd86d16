use glam::{Quat, Vec3A};

/// Host-side transform synchronization callbacks.
///
/// The engine stays agnostic to the host's entity representation: each
/// collision object carries an opaque `u64` handed over at creation, and the
/// bridge maps that value back to whatever the host keeps its poses in. The
/// engine never interprets the value.
///
/// Implementations must treat a user data of 0 as "no host object": return
/// the identity pose from [`get_world_transform`](Self::get_world_transform)
/// and ignore [`set_world_transform`](Self::set_world_transform) rather than
/// fail.
pub trait TransformBridge {
    /// Reads the host-owned pose for `user_data`. Called once at object
    /// creation for every kind, and once per step for every kinematic and
    /// trigger object. Must be side-effect-free as far as the engine can
    /// observe.
    fn get_world_transform(&self, user_data: u64) -> (Vec3A, Quat);

    /// Writes a freshly simulated pose back to the host. Called once per
    /// step for every dynamic object.
    fn set_world_transform(&mut self, user_data: u64, position: Vec3A, rotation: Quat);
}

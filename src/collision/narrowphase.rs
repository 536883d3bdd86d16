//! Exact intersection tests producing contact manifolds.
//!
//! Box-box runs the 15-axis separating-axis test in the second box's local
//! frame (so that box degenerates to an AABB), then builds the manifold by
//! clipping the incident face against the reference face's side planes.
//! Sphere pairs are analytic. All normals follow the manifold convention:
//! `normal_world_on_b` points from object B toward object A, depth >= 0.

use arrayvec::ArrayVec;
use glam::{Mat3A, Vec3A};

use crate::collision::manifold::{ContactManifold, MANIFOLD_CACHE_SIZE};
use crate::object::{CollisionObject, ObjectHandle};
use crate::shape::Shape;

/// Oriented box expressed in some reference frame.
struct Obb {
    center: Vec3A,
    axis: Mat3A,
    extent: Vec3A,
}

/// Winning separating-axis candidate. `normal` is unit length, in the
/// reference frame, pointing from box B toward box A.
struct Hit {
    depth: f32,
    normal: Vec3A,
    axis_id: u8,
}

const FACE_AXIS_COUNT: u8 = 6;

const LOCAL_AXES: [Vec3A; 3] = [Vec3A::X, Vec3A::Y, Vec3A::Z];

/// Runs the shape-pair algorithm for two overlapping candidates. Returns a
/// manifold only when the shapes actually intersect and at least one contact
/// point survived.
pub(crate) fn collide(
    handle_a: ObjectHandle,
    a: &CollisionObject,
    handle_b: ObjectHandle,
    b: &CollisionObject,
) -> Option<ContactManifold> {
    let mut manifold = ContactManifold::new(handle_a, a, handle_b, b);

    let hit = match (a.shape.as_ref(), b.shape.as_ref()) {
        (Shape::Box { half_extents: ea }, Shape::Box { half_extents: eb }) => {
            box_box(a, *ea, b, *eb, &mut manifold)
        }
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            sphere_sphere(a.position, *ra, b.position, *rb, &mut manifold)
        }
        (Shape::Sphere { radius }, Shape::Box { half_extents }) => {
            sphere_box(a.position, *radius, b, *half_extents, &mut manifold, false)
        }
        (Shape::Box { half_extents }, Shape::Sphere { radius }) => {
            sphere_box(b.position, *radius, a, *half_extents, &mut manifold, true)
        }
    };

    (hit && !manifold.points.is_empty()).then_some(manifold)
}

fn box_box(
    a: &CollisionObject,
    extent_a: Vec3A,
    b: &CollisionObject,
    extent_b: Vec3A,
    manifold: &mut ContactManifold,
) -> bool {
    let b_basis = Mat3A::from_quat(b.rotation);
    let to_b = b_basis.transpose();

    // express A in B's frame; B becomes an AABB around the origin
    let obb = Obb {
        center: to_b * (a.position - b.position),
        axis: to_b * Mat3A::from_quat(a.rotation),
        extent: extent_a,
    };

    let Some(hit) = separating_axis(&obb, extent_b) else {
        return false;
    };

    let world_normal = b_basis * hit.normal;

    if hit.axis_id >= FACE_AXIS_COUNT {
        let id = hit.axis_id - FACE_AXIS_COUNT;
        let point = edge_edge_contact(
            &obb,
            extent_b,
            hit.normal,
            usize::from(id / 3),
            usize::from(id % 3),
        );
        manifold.add_point(b.position + b_basis * point, world_normal, hit.depth);
        return true;
    }

    for (point, depth) in face_manifold(&obb, extent_b, &hit) {
        manifold.add_point(b.position + b_basis * point, world_normal, depth);
    }

    true
}

/// 15-axis SAT: A's faces, B's faces, then the nine edge-edge cross axes.
/// Near-parallel cross products are skipped rather than normalized into a
/// garbage direction. Face axes run first so equal-depth ties pick a face.
fn separating_axis(a: &Obb, extent_b: Vec3A) -> Option<Hit> {
    let t = a.center;
    let cols = [a.axis.x_axis, a.axis.y_axis, a.axis.z_axis];

    let mut depth = f32::INFINITY;
    let mut best_axis = Vec3A::ZERO;
    let mut best_id = 0;

    let mut update = |l: Vec3A, ra: f32, rb: f32, id: u8| {
        let align = t.dot(l);
        let overlap = (ra + rb) - align.abs();
        if overlap < 0.0 {
            return false;
        }

        if overlap < depth {
            depth = overlap;
            best_axis = if align >= 0.0 { l } else { -l };
            best_id = id;
        }

        true
    };

    for (i, &l) in cols.iter().enumerate() {
        let rb = extent_b.dot(l.abs());
        if !update(l, a.extent[i], rb, i as u8) {
            return None;
        }
    }

    for (j, &l) in LOCAL_AXES.iter().enumerate() {
        let ra = a.extent.x * cols[0][j].abs()
            + a.extent.y * cols[1][j].abs()
            + a.extent.z * cols[2][j].abs();
        if !update(l, ra, extent_b[j], 3 + j as u8) {
            return None;
        }
    }

    for (i, &col) in cols.iter().enumerate() {
        for (j, &axis) in LOCAL_AXES.iter().enumerate() {
            let Some(l) = col.cross(axis).try_normalize() else {
                continue;
            };

            let ra = a.extent.x * cols[0].dot(l).abs()
                + a.extent.y * cols[1].dot(l).abs()
                + a.extent.z * cols[2].dot(l).abs();
            let rb = extent_b.dot(l.abs());

            if !update(l, ra, rb, FACE_AXIS_COUNT + (i * 3 + j) as u8) {
                return None;
            }
        }
    }

    Some(Hit {
        depth,
        normal: best_axis,
        axis_id: best_id,
    })
}

/// The four corners of the `axis_idx` face on `side_sign`'s side, CCW.
fn face_vertices(b: &Obb, axis_idx: usize, side_sign: f32) -> [Vec3A; 4] {
    let n = b.axis.col(axis_idx) * side_sign;
    let u = b.axis.col((axis_idx + 1) % 3);
    let v = b.axis.col((axis_idx + 2) % 3);

    let center = b.center + n * b.extent[axis_idx];
    let ueu = u * b.extent[(axis_idx + 1) % 3];
    let vev = v * b.extent[(axis_idx + 2) % 3];

    [
        center + ueu + vev,
        center - ueu + vev,
        center - ueu - vev,
        center + ueu - vev,
    ]
}

/// Sutherland-Hodgman step: keeps the part of `poly` with `n . p <= d`.
fn clip_polygon(poly: &mut ArrayVec<Vec3A, 8>, n: Vec3A, d: f32) {
    let input = poly.clone();
    poly.clear();

    let len = input.len();
    for i in 0..len {
        let a = input[i];
        let b = input[(i + 1) % len];

        let da = d - n.dot(a);
        let db = d - n.dot(b);

        if da >= 0.0 {
            if db >= 0.0 {
                let _ = poly.try_push(b);
            } else {
                let _ = poly.try_push(a.lerp(b, da / (da - db)));
            }
        } else if db >= 0.0 {
            let _ = poly.try_push(a.lerp(b, da / (da - db)));
            let _ = poly.try_push(b);
        }
    }
}

/// Builds up to [`MANIFOLD_CACHE_SIZE`] face-face contact points in B's
/// frame, each with its own depth measured from the reference plane.
fn face_manifold(
    obb: &Obb,
    extent_b: Vec3A,
    hit: &Hit,
) -> ArrayVec<(Vec3A, f32), MANIFOLD_CACHE_SIZE> {
    let aabb = Obb {
        center: Vec3A::ZERO,
        axis: Mat3A::IDENTITY,
        extent: extent_b,
    };

    // reference face on the winning axis owner, facing the other box
    let ref_is_a = hit.axis_id < 3;
    let (ref_box, inc_box, ref_axis, toward) = if ref_is_a {
        (obb, &aabb, usize::from(hit.axis_id), -hit.normal)
    } else {
        (&aabb, obb, usize::from(hit.axis_id - 3), hit.normal)
    };

    let axis = ref_box.axis.col(ref_axis);
    let ref_face_n = if axis.dot(toward) >= 0.0 { axis } else { -axis };

    // incident face: the one most anti-parallel to the reference normal
    let mut inc_axis = 0;
    let mut inc_sign = 1.0;
    let mut best = -1.0;
    for j in 0..3 {
        let d = inc_box.axis.col(j).dot(ref_face_n);
        if d.abs() > best {
            best = d.abs();
            inc_axis = j;
            inc_sign = -d.signum();
        }
    }

    let mut poly: ArrayVec<Vec3A, 8> = ArrayVec::new();
    poly.extend(face_vertices(inc_box, inc_axis, inc_sign));

    let ref_center = ref_box.center + ref_face_n * ref_box.extent[ref_axis];
    let ref_u = ref_box.axis.col((ref_axis + 1) % 3);
    let ref_v = ref_box.axis.col((ref_axis + 2) % 3);
    let eu = ref_box.extent[(ref_axis + 1) % 3];
    let ev = ref_box.extent[(ref_axis + 2) % 3];

    clip_polygon(&mut poly, ref_u, ref_u.dot(ref_center) + eu);
    clip_polygon(&mut poly, -ref_u, (-ref_u).dot(ref_center) + eu);
    clip_polygon(&mut poly, ref_v, ref_v.dot(ref_center) + ev);
    clip_polygon(&mut poly, -ref_v, (-ref_v).dot(ref_center) + ev);

    let ref_plane_d = ref_face_n.dot(ref_center);
    let mut candidates: ArrayVec<(Vec3A, f32), 8> = ArrayVec::new();
    for p in poly {
        let depth = ref_plane_d - ref_face_n.dot(p);
        if depth >= 0.0 {
            // keep the point on B's surface: the incident face already is
            // B's when A owns the reference face, otherwise project onto
            // B's reference plane
            let on_b = if ref_is_a { p } else { p + ref_face_n * depth };
            let _ = candidates.try_push((on_b, depth));
        }
    }

    if candidates.is_empty() {
        // numerically possible when the clipped face barely misses the
        // plane; keep the deepest incident vertex so the hit is not lost
        let deepest = face_vertices(inc_box, inc_axis, inc_sign)
            .into_iter()
            .max_by(|p, q| {
                (ref_plane_d - ref_face_n.dot(*p)).total_cmp(&(ref_plane_d - ref_face_n.dot(*q)))
            })
            .unwrap();
        let on_b = if ref_is_a { deepest } else { deepest + ref_face_n * hit.depth };
        candidates.push((on_b, hit.depth.max(0.0)));
    }

    candidates.sort_unstable_by(|p, q| q.1.total_cmp(&p.1));
    candidates.into_iter().take(MANIFOLD_CACHE_SIZE).collect()
}

/// Closest points between segments `p1..p2` and `q1..q2`.
fn closest_segment_points(p1: Vec3A, p2: Vec3A, q1: Vec3A, q2: Vec3A) -> (Vec3A, Vec3A) {
    let delta_p = p2 - p1;
    let delta_q = q2 - q1;

    let a = delta_p.length_squared();
    let e = delta_q.length_squared();

    if a <= f32::EPSILON && e <= f32::EPSILON {
        return (p1, q1);
    }

    let r = p1 - q1;
    let f = delta_q.dot(r);
    let (s, t) = if a <= f32::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = delta_p.dot(r);
        if e <= f32::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = delta_p.dot(delta_q);
            let denom = a * e - b * b;
            let s = if denom != 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    (p1 + delta_p * s, q1 + delta_q * t)
}

/// Single contact point for an edge-edge separating axis: the midpoint of
/// the closest points between the two supporting edges.
fn edge_edge_contact(
    a: &Obb,
    extent_b: Vec3A,
    normal: Vec3A,
    a_axis: usize,
    b_axis: usize,
) -> Vec3A {
    let cols = [a.axis.x_axis, a.axis.y_axis, a.axis.z_axis];

    // supporting edge on A runs toward B, i.e. against the normal
    let mut a_mid = a.center;
    for (k, &col) in cols.iter().enumerate() {
        if k != a_axis {
            let sign = if col.dot(normal) >= 0.0 { -1.0 } else { 1.0 };
            a_mid += col * (sign * a.extent[k]);
        }
    }
    let a_dir = cols[a_axis] * a.extent[a_axis];

    // supporting edge on B runs toward A, along the normal
    let mut b_mid = Vec3A::ZERO;
    for (k, &axis) in LOCAL_AXES.iter().enumerate() {
        if k != b_axis {
            let sign = if axis.dot(normal) >= 0.0 { 1.0 } else { -1.0 };
            b_mid += axis * (sign * extent_b[k]);
        }
    }
    let b_dir = LOCAL_AXES[b_axis] * extent_b[b_axis];

    let (on_a, on_b) = closest_segment_points(a_mid - a_dir, a_mid + a_dir, b_mid - b_dir, b_mid + b_dir);
    (on_a + on_b) * 0.5
}

fn sphere_sphere(
    center_a: Vec3A,
    radius_a: f32,
    center_b: Vec3A,
    radius_b: f32,
    manifold: &mut ContactManifold,
) -> bool {
    let delta = center_a - center_b;
    let radius_sum = radius_a + radius_b;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius_sum * radius_sum {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON { delta / dist } else { Vec3A::X };

    manifold.add_point(center_b + normal * radius_b, normal, radius_sum - dist);
    true
}

fn sphere_box(
    sphere_center: Vec3A,
    radius: f32,
    box_obj: &CollisionObject,
    half_extents: Vec3A,
    manifold: &mut ContactManifold,
    swapped: bool,
) -> bool {
    let basis = Mat3A::from_quat(box_obj.rotation);
    let local_center = basis.transpose() * (sphere_center - box_obj.position);

    let closest = local_center.clamp(-half_extents, half_extents);
    let delta = local_center - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return false;
    }

    let dist = dist_sq.sqrt();
    let depth = radius - dist;
    // center inside the box is degenerate; fall back to a fixed axis
    let local_normal = if dist > f32::EPSILON { delta / dist } else { Vec3A::X };

    let normal_to_sphere = basis * local_normal;

    if swapped {
        // box is object A, sphere is object B
        let point_on_sphere = sphere_center - normal_to_sphere * radius;
        manifold.add_point(point_on_sphere, -normal_to_sphere, depth);
    } else {
        let point_on_box = box_obj.position + basis * closest;
        manifold.add_point(point_on_box, normal_to_sphere, depth);
    }

    true
}

//! Analytic ray geometry for light volumes.
//!
//! Rotations are intrinsic X, then Y, then Z Euler angles given in degrees.
//! The rotated frame is built directly from the sines and cosines of each
//! angle, so the same basis is reproduced exactly by the inscattering shader.
//!
//! The canonical cone has its apex at the local origin and opens along +X.
//! After the X axis is scaled by [`CONE_CAP`], the surface is `x² = y² + z²`
//! and the finite cone is the slab `0 ≤ x ≤ CONE_CAP`, closed by a flat cap.

use glam::{EulerRot, Quat, Vec3};

/// Cap position (after X canonicalization) and cap radius of the canonical cone.
pub const CONE_CAP: f32 = 0.5;

/// A ray with an origin and a (not necessarily normalized) direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Ray direction.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Returns the point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Returns the three rotated basis axes for an Euler rotation in degrees.
///
/// The columns are those of `Rx * Ry * Rz`.
#[must_use]
pub fn euler_basis(euler_degrees: Vec3) -> [Vec3; 3] {
    let (sin_x, cos_x) = euler_degrees.x.to_radians().sin_cos();
    let (sin_y, cos_y) = euler_degrees.y.to_radians().sin_cos();
    let (sin_z, cos_z) = euler_degrees.z.to_radians().sin_cos();

    let x_axis = Vec3::new(
        cos_y * cos_z,
        cos_x * sin_z + sin_x * sin_y * cos_z,
        sin_x * sin_z - cos_x * sin_y * cos_z,
    );
    let y_axis = Vec3::new(
        -cos_y * sin_z,
        cos_x * cos_z - sin_x * sin_y * sin_z,
        sin_x * cos_z + cos_x * sin_y * sin_z,
    );
    let z_axis = Vec3::new(sin_y, -sin_x * cos_y, cos_x * cos_y);

    [x_axis, y_axis, z_axis]
}

/// Rotates a vector by an Euler rotation in degrees.
#[must_use]
pub fn rotate(v: Vec3, euler_degrees: Vec3) -> Vec3 {
    let [x_axis, y_axis, z_axis] = euler_basis(euler_degrees);
    x_axis * v.x + y_axis * v.y + z_axis * v.z
}

/// Undoes [`rotate`] for the same Euler angles.
///
/// The basis is orthonormal, so the inverse is a projection onto each axis.
#[must_use]
pub fn inverse_rotate(v: Vec3, euler_degrees: Vec3) -> Vec3 {
    let [x_axis, y_axis, z_axis] = euler_basis(euler_degrees);
    Vec3::new(x_axis.dot(v), y_axis.dot(v), z_axis.dot(v))
}

/// The local unit frame of a light volume.
///
/// Mapping a world ray into the frame translates the origin by `offset`,
/// divides it by `scale`, then rotates origin and direction by `euler_degrees`.
///
/// The direction is rotated but never scaled, so parametric distances found in
/// the local frame are in unscaled local units, not world units. Callers that
/// need world distances must account for `scale` themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeFrame {
    /// Translation applied to the ray origin (usually the negated volume position).
    pub offset: Vec3,
    /// Euler rotation in degrees.
    pub euler_degrees: Vec3,
    /// Uniform scale dividing the translated origin.
    pub scale: f32,
}

impl VolumeFrame {
    /// Creates a new volume frame.
    #[must_use]
    pub fn new(offset: Vec3, euler_degrees: Vec3, scale: f32) -> Self {
        Self {
            offset,
            euler_degrees,
            scale,
        }
    }

    /// Maps a world-space ray into the local frame.
    #[must_use]
    pub fn to_local(&self, ray: Ray) -> Ray {
        let origin = (ray.origin + self.offset) / self.scale;
        Ray {
            origin: rotate(origin, self.euler_degrees),
            direction: rotate(ray.direction, self.euler_degrees),
        }
    }

    /// Maps a local-frame ray back into world space.
    #[must_use]
    pub fn to_world(&self, ray: Ray) -> Ray {
        let origin = inverse_rotate(ray.origin, self.euler_degrees) * self.scale;
        Ray {
            origin: origin - self.offset,
            direction: inverse_rotate(ray.direction, self.euler_degrees),
        }
    }
}

/// Maps a world-space ray into a volume's local frame.
///
/// See [`VolumeFrame`] for the order of operations.
#[must_use]
pub fn transform_ray(
    origin: Vec3,
    direction: Vec3,
    offset: Vec3,
    euler_degrees: Vec3,
    scale: f32,
) -> Ray {
    VolumeFrame::new(offset, euler_degrees, scale).to_local(Ray::new(origin, direction))
}

/// The parametric span of a ray inside the canonical cone.
///
/// `near` is not clamped: it is negative when the ray starts inside the cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeSpan {
    /// Entry parameter.
    pub near: f32,
    /// Exit parameter, always positive.
    pub far: f32,
}

impl ConeSpan {
    fn accept(near: f32, far: f32) -> Option<Self> {
        (far > 0.0).then_some(Self { near, far })
    }

    /// Entry parameter clamped to the ray origin.
    #[must_use]
    pub fn visible_start(&self) -> f32 {
        self.near.max(0.0)
    }

    /// Length of the visible part of the span.
    #[must_use]
    pub fn through(&self) -> f32 {
        self.far - self.visible_start()
    }

    /// Parameter halfway through the visible part of the span.
    #[must_use]
    pub fn middle(&self) -> f32 {
        self.visible_start() + (self.far - self.visible_start()) * 0.5
    }
}

/// Orders two roots ascending.
///
/// A NaN root propagates into both bounds, so the final `far > 0` test
/// rejects the ray.
fn order(first: f32, second: f32) -> (f32, f32) {
    let low = if first < second { first } else { second };
    let high = if first > second { first } else { second };
    (low, high)
}

/// Quadratic coefficients of `x² = y² + z²` along a canonicalized ray.
fn cone_coefficients(pos: Vec3, dir: Vec3) -> (f32, f32, f32) {
    let a = dir.y * dir.y + dir.z * dir.z - dir.x * dir.x;
    let b = pos.y * dir.y + pos.z * dir.z - pos.x * dir.x;
    let c = pos.y * pos.y + pos.z * pos.z - pos.x * pos.x;
    (a, b, c)
}

/// Intersects a local-frame ray with the canonical capped cone.
///
/// Returns `None` on a miss. Parallel rays, tangent rays and rays through the
/// apex are ordinary outcomes, never errors.
#[must_use]
pub fn ray_cone_intersection(ray: Ray) -> Option<ConeSpan> {
    let s = CONE_CAP;
    let mut pos = ray.origin;
    let mut dir = ray.direction;
    pos.x *= s;
    dir.x *= s;

    let (a, b, c) = cone_coefficients(pos, dir);
    let cap = (s - pos.x) / dir.x;
    let x_at = |t: f32| pos.x + t * dir.x;

    // Ray parallel to a generator: a single root.
    if a == 0.0 {
        let root = -0.5 * c / b;
        let x = x_at(root);
        if x < 0.0 || x > s {
            return None;
        }

        let (near, far) = order(cap, root);
        return ConeSpan::accept(near, far);
    }

    let delta = b * b - a * c;
    if delta < 0.0 {
        return None;
    }

    let delta_sqrt = delta.sqrt();
    let a_rcp = 1.0 / a;
    let (mut near, mut far) = order((-b + delta_sqrt) * a_rcp, (-b - delta_sqrt) * a_rcp);

    // Double root with a < 0: the ray stays inside the double cone and only
    // touches the surface at the apex.
    if delta == 0.0 && a < 0.0 {
        let (near, far) = if dir.x > 0.0 { (near, cap) } else { (cap, near) };
        return ConeSpan::accept(near, far);
    }

    let x_near = x_at(near);
    let x_far = x_at(far);

    if x_near < 0.0 {
        if x_far < 0.0 || x_far > s {
            return None;
        }

        near = far;
        far = cap;
    } else if x_near > s {
        if x_far < 0.0 || x_far > s {
            return None;
        }

        near = cap;
    } else if x_far < 0.0 {
        // Straddling the apex: keep the cap side, the tip flickers otherwise.
        far = near;
        near = cap;
    } else if x_far > s {
        far = cap;
    }

    ConeSpan::accept(near, far)
}

/// Returns Euler angles in degrees for a rotation, wrapped into `[0, 360)`.
///
/// The decomposition applies Z first, then X, then Y, matching the authoring
/// convention of scene transforms.
#[must_use]
pub fn quat_to_euler_degrees(rotation: Quat) -> Vec3 {
    let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(
        wrap_degrees(x.to_degrees()),
        wrap_degrees(y.to_degrees()),
        wrap_degrees(z.to_degrees()),
    )
}

/// Builds a rotation from Euler angles in degrees (inverse of [`quat_to_euler_degrees`]).
#[must_use]
pub fn quat_from_euler_degrees(euler_degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler_degrees.y.to_radians(),
        euler_degrees.x.to_radians(),
        euler_degrees.z.to_radians(),
    )
}

fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

//! Camera-ray probe against a cone volume, for debug drawing and bounds.

use glam::Vec3;

use crate::geometry::{ray_cone_intersection, rotate, ConeSpan, Ray, VolumeFrame};

/// A cone-shaped light volume as authored in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeVolume {
    /// Apex position in world space.
    pub position: Vec3,
    /// Euler rotation in degrees.
    pub euler_degrees: Vec3,
    /// Height of the cone (apex to cap).
    pub height: f32,
}

impl ConeVolume {
    /// Creates a new cone volume.
    #[must_use]
    pub fn new(position: Vec3, euler_degrees: Vec3, height: f32) -> Self {
        Self {
            position,
            euler_degrees,
            height,
        }
    }

    /// Frame mapping world rays into the canonical cone.
    #[must_use]
    pub fn frame(&self) -> VolumeFrame {
        VolumeFrame::new(-self.position, -self.euler_degrees, self.height)
    }

    /// World direction of the cone axis (normalized).
    #[must_use]
    pub fn axis(&self) -> Vec3 {
        rotate(Vec3::X, self.euler_degrees).normalize()
    }
}

/// World-space points where a camera ray crosses a cone volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Parametric span in the cone's local units.
    pub span: ConeSpan,
    /// Entry point.
    pub near_point: Vec3,
    /// Point halfway through the visible part.
    pub middle_point: Vec3,
    /// Exit point.
    pub far_point: Vec3,
}

/// Result of probing a cone with the camera's forward ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeProbe {
    /// World direction of the cone axis.
    pub axis: Vec3,
    /// Crossing points, if the visible part of the span is non-empty.
    pub hit: Option<ProbeHit>,
}

impl ConeProbe {
    /// Casts the camera's forward ray through a cone.
    ///
    /// Points are placed along `camera_forward * cone.height` because local
    /// span parameters are in cone-height units.
    #[must_use]
    pub fn cast(camera_position: Vec3, camera_forward: Vec3, cone: &ConeVolume) -> Self {
        let local = cone
            .frame()
            .to_local(Ray::new(camera_position, camera_forward));

        let hit = ray_cone_intersection(local)
            .filter(|span| span.through() > 0.0)
            .map(|span| {
                let world = Ray::new(camera_position, camera_forward * cone.height);
                ProbeHit {
                    span,
                    near_point: world.at(span.visible_start()),
                    middle_point: world.at(span.middle()),
                    far_point: world.at(span.far),
                }
            });

        Self {
            axis: cone.axis(),
            hit,
        }
    }

    /// Direction from the cone apex toward the middle crossing point.
    #[must_use]
    pub fn apex_to_middle(&self, cone: &ConeVolume) -> Option<Vec3> {
        self.hit
            .map(|hit| (hit.middle_point - cone.position).normalize_or_zero())
    }
}

//! Per-frame reconstruction of world-space camera rays.

use glam::{Mat4, Vec3, Vec4};

use crate::camera::{EyeView, FrameCamera, Viewport};
use crate::error::{RenderError, RenderResult};

/// Far-plane corners in world space, ordered bottom-left, top-left,
/// top-right, bottom-right.
pub type FrustumCorners = [Vec3; 4];

/// Screen-to-world matrices handed to the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenToWorld {
    /// Mono rendering also exposes the raw view and projection.
    Mono {
        clip_to_world: Mat4,
        view: Mat4,
        projection: Mat4,
    },
    /// One clip-to-world matrix per eye.
    Stereo { left: Mat4, right: Mat4 },
}

impl ScreenToWorld {
    /// Matrix for the left eye, or the only matrix in mono.
    #[must_use]
    pub fn left(&self) -> Mat4 {
        match self {
            ScreenToWorld::Mono { clip_to_world, .. } => *clip_to_world,
            ScreenToWorld::Stereo { left, .. } => *left,
        }
    }

    /// Matrix for the right eye. Mono falls back to the camera matrix.
    #[must_use]
    pub fn right(&self) -> Mat4 {
        match self {
            ScreenToWorld::Mono { clip_to_world, .. } => *clip_to_world,
            ScreenToWorld::Stereo { right, .. } => *right,
        }
    }
}

/// Everything the shader needs to turn a pixel into a world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Far-plane corners of the active eye.
    pub corners: FrustumCorners,
    /// Camera-to-world matrix of the active eye.
    pub camera_to_world: Mat4,
    /// Inverse projection of the active eye.
    pub inverse_projection: Mat4,
    /// Screen-to-world matrices.
    pub screen_to_world: ScreenToWorld,
    /// Camera position in world space.
    pub camera_position: Vec3,
}

/// Clip-to-world matrix of one eye: camera-to-world times inverse projection.
#[must_use]
pub fn clip_to_world(eye: &EyeView) -> Mat4 {
    eye.view.inverse() * eye.projection.inverse()
}

/// Far-plane corners in camera space at distance `far_clip`.
///
/// Each corner is found on the pixel ray through two unprojected depths, so
/// perspective, orthographic, reversed-depth and infinite projections all work.
pub fn far_plane_corners(
    projection: Mat4,
    viewport: Viewport,
    far_clip: f32,
) -> RenderResult<FrustumCorners> {
    let inverse_projection = projection.inverse();
    let corner = |u: f32, v: f32| -> RenderResult<Vec3> {
        let x = u * 2.0 - 1.0;
        let y = v * 2.0 - 1.0;
        let near = inverse_projection.project_point3(Vec3::new(x, y, 0.25));
        let mid = inverse_projection.project_point3(Vec3::new(x, y, 0.75));
        let along = mid - near;
        if along.z == 0.0 || !along.is_finite() || !near.is_finite() {
            return Err(RenderError::InvalidFrame(format!(
                "projection does not map ({u}, {v}) to a camera ray"
            )));
        }
        let t = (-far_clip - near.z) / along.z;
        Ok(near + along * t)
    };

    let Viewport {
        x,
        y,
        width,
        height,
    } = viewport;
    Ok([
        corner(x, y)?,
        corner(x, y + height)?,
        corner(x + width, y + height)?,
        corner(x + width, y)?,
    ])
}

/// Reorders corners into the layout the shader interpolates
/// (bottom-left, bottom-right, top-left, top-right), padded with `w = 0`.
#[must_use]
pub fn shader_corner_order(corners: &FrustumCorners) -> [Vec4; 4] {
    [corners[0], corners[3], corners[1], corners[2]].map(|c| c.extend(0.0))
}

impl FrameState {
    /// Reconstructs the frame state from the host camera.
    pub fn reconstruct(camera: &FrameCamera) -> RenderResult<Self> {
        if !camera.far_clip.is_finite() || camera.far_clip <= 0.0 {
            return Err(RenderError::InvalidFrame(format!(
                "far clip must be positive, got {}",
                camera.far_clip
            )));
        }

        let active = camera.active_view();
        if active.view.determinant() == 0.0 || active.projection.determinant() == 0.0 {
            return Err(RenderError::InvalidFrame(
                "view or projection matrix is singular".into(),
            ));
        }

        let camera_to_world = active.view.inverse();
        let inverse_projection = active.projection.inverse();
        let corners = far_plane_corners(active.projection, camera.viewport, camera.far_clip)?
            .map(|c| camera_to_world.transform_point3(c));

        let screen_to_world = match &camera.stereo {
            Some(eyes) => ScreenToWorld::Stereo {
                left: clip_to_world(&eyes.left),
                right: clip_to_world(&eyes.right),
            },
            None => ScreenToWorld::Mono {
                clip_to_world: camera_to_world * inverse_projection,
                view: camera.view,
                projection: camera.projection,
            },
        };

        Ok(Self {
            corners,
            camera_to_world,
            inverse_projection,
            screen_to_world,
            camera_position: camera.position,
        })
    }
}

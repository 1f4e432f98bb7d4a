//! Camera state supplied by the host for one frame.

use glam::{Mat4, Vec3};

/// Normalized viewport rectangle (0..1 on both axes, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// The whole render target.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

/// Stereo eye selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eye {
    #[default]
    Left,
    Right,
}

/// View and projection of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    /// World-to-camera matrix.
    pub view: Mat4,
    /// Projection matrix.
    pub projection: Mat4,
}

impl EyeView {
    /// Creates a new eye view.
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }
}

/// Per-eye state for stereo rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoEyes {
    pub left: EyeView,
    pub right: EyeView,
    /// Eye currently being rendered.
    pub active: Eye,
}

impl StereoEyes {
    /// View of the given eye.
    #[must_use]
    pub fn eye(&self, eye: Eye) -> &EyeView {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

/// Camera parameters for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCamera {
    /// Camera position in world space.
    pub position: Vec3,
    /// World-to-camera matrix.
    pub view: Mat4,
    /// Projection matrix (depth 0..1).
    pub projection: Mat4,
    /// Far clipping distance.
    pub far_clip: f32,
    /// Normalized viewport.
    pub viewport: Viewport,
    /// Stereo eyes, `None` for mono rendering.
    pub stereo: Option<StereoEyes>,
}

impl FrameCamera {
    /// Creates a mono camera from explicit matrices.
    #[must_use]
    pub fn new(position: Vec3, view: Mat4, projection: Mat4, far_clip: f32) -> Self {
        Self {
            position,
            view,
            projection,
            far_clip,
            viewport: Viewport::FULL,
            stereo: None,
        }
    }

    /// Creates a mono perspective camera looking at `target`.
    #[must_use]
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::new(
            position,
            Mat4::look_at_rh(position, target, up),
            Mat4::perspective_rh(fov_y, aspect_ratio, near, far),
            far,
        )
    }

    /// Creates a mono orthographic camera looking at `target`.
    #[must_use]
    pub fn orthographic(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        half_height: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let half_width = half_height * aspect_ratio;
        Self::new(
            position,
            Mat4::look_at_rh(position, target, up),
            Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far),
            far,
        )
    }

    /// Switches the camera to stereo rendering.
    #[must_use]
    pub fn with_stereo(mut self, left: EyeView, right: EyeView, active: Eye) -> Self {
        self.stereo = Some(StereoEyes {
            left,
            right,
            active,
        });
        self
    }

    /// Sets the viewport rectangle.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Returns true when rendering a stereo eye.
    #[must_use]
    pub fn is_stereo(&self) -> bool {
        self.stereo.is_some()
    }

    /// View and projection of the eye being rendered (the camera itself in mono).
    #[must_use]
    pub fn active_view(&self) -> EyeView {
        match &self.stereo {
            Some(eyes) => *eyes.eye(eyes.active),
            None => EyeView::new(self.view, self.projection),
        }
    }

    /// Active eye index for the shader (0 = mono or left, 1 = right).
    #[must_use]
    pub fn active_eye_index(&self) -> u32 {
        match &self.stereo {
            Some(StereoEyes {
                active: Eye::Right, ..
            }) => 1,
            _ => 0,
        }
    }
}

//! Frame planning: what the inscattering pass draws this frame.
//!
//! [`composite`] is pure. It reads the camera, the target description and a
//! snapshot of the enabled volumes and returns a [`CompositePlan`]; issuing
//! the plan is left to a [`CompositeBackend`](crate::backend::CompositeBackend).

use glam::{Vec3, Vec4};
use inscatter_core::{InscatteringOptions, SharedVolume, TargetFilter};

use crate::camera::FrameCamera;
use crate::error::{RenderError, RenderResult};
use crate::frame::{shader_corner_order, FrameState, ScreenToWorld};

/// Description of the host's color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TargetDescriptor {
    /// Creates a new target descriptor.
    #[must_use]
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    /// Checks the target can hold a temporary copy.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidFrame(format!(
                "target has zero extent ({}x{})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Frame-wide shader parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalParams {
    /// Far-plane corners in shader order, `w = 0`.
    pub frustum_corners: [Vec4; 4],
    pub screen_to_world: ScreenToWorld,
    pub camera_position: Vec3,
    /// 0 for mono or the left eye, 1 for the right eye.
    pub active_eye: u32,
    pub spherical_volume: bool,
    pub flip_uv: bool,
}

/// Parameters of one full-screen volume draw.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDraw {
    /// Volume name, for logging.
    pub name: String,
    pub position: Vec3,
    /// Euler rotation in degrees with the yaw offset applied.
    pub rotation_degrees: Vec3,
    pub radius: f32,
    /// Resolved HDR color.
    pub color: Vec3,
    /// Shader pass to draw with.
    pub pass_index: u32,
}

/// A registered volume left out of this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVolume {
    pub name: String,
    pub reason: String,
}

/// Everything the pass does in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePlan {
    /// Descriptor of the temporary target (matches the scene target).
    pub target: TargetDescriptor,
    /// Filtering of the temporary target.
    pub filter: TargetFilter,
    pub globals: GlobalParams,
    /// Draws in registry order.
    pub draws: Vec<VolumeDraw>,
    pub skipped: Vec<SkippedVolume>,
}

/// Builds the draw parameters of one volume.
///
/// Returns the reason the volume cannot be drawn when its lock is poisoned or
/// its color cannot be resolved.
pub fn plan_volume(
    volume: &SharedVolume,
    options: &InscatteringOptions,
) -> Result<VolumeDraw, SkippedVolume> {
    let volume = volume.read().map_err(|_| SkippedVolume {
        name: "<poisoned>".into(),
        reason: "volume lock poisoned".into(),
    })?;

    let color = volume.resolve_color().map_err(|e| SkippedVolume {
        name: volume.name().to_string(),
        reason: e.to_string(),
    })?;

    let euler = volume.transform.euler_degrees();
    Ok(VolumeDraw {
        name: volume.name().to_string(),
        position: volume.transform.position,
        rotation_degrees: Vec3::new(euler.x, euler.y + options.yaw_offset_degrees, euler.z),
        radius: volume.transform.scale.x * options.radius_scale,
        color,
        pass_index: 0,
    })
}

/// Plans one frame of the inscattering pass.
pub fn composite(
    camera: &FrameCamera,
    target: &TargetDescriptor,
    volumes: &[SharedVolume],
    options: &InscatteringOptions,
) -> RenderResult<CompositePlan> {
    options.validate()?;
    target.validate()?;
    let frame = FrameState::reconstruct(camera)?;

    let globals = GlobalParams {
        frustum_corners: shader_corner_order(&frame.corners),
        screen_to_world: frame.screen_to_world,
        camera_position: frame.camera_position,
        active_eye: camera.active_eye_index(),
        spherical_volume: options.spherical_volume,
        flip_uv: options.flip_uv(),
    };

    let mut draws = Vec::with_capacity(volumes.len());
    let mut skipped = Vec::new();
    for volume in volumes {
        match plan_volume(volume, options) {
            Ok(draw) => draws.push(draw),
            Err(skip) => {
                log::warn!("skipping volume '{}': {}", skip.name, skip.reason);
                skipped.push(skip);
            }
        }
    }

    Ok(CompositePlan {
        target: *target,
        filter: options.temporary_filter,
        globals,
        draws,
        skipped,
    })
}

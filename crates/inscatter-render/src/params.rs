//! Shader parameter names and their GPU layouts.
//!
//! The names are the interface between the compositor and the shader
//! program. Backends that bind parameters by name (see
//! [`GlobalParams::named_values`] and [`VolumeDraw::named_values`]) use them
//! directly; the wgpu backend packs the same values into [`FrameUniforms`]
//! and [`VolumeUniforms`].

use glam::{Mat4, Vec4};

use crate::composite::{GlobalParams, VolumeDraw};
use crate::frame::ScreenToWorld;

/// Name of the built-in shader program.
pub const INSCATTERING_SHADER: &str = "Hidden/Inscattering";

pub const FRUSTUM_CORNERS: &str = "_FrustumCorners";
pub const SCREEN_TO_WORLD_LEFT: &str = "_MatrixScreenToWorldLeftEye";
pub const SCREEN_TO_WORLD_RIGHT: &str = "_MatrixScreenToWorldRightEye";
pub const VIEW_MATRIX: &str = "_MV";
pub const PROJECTION_MATRIX: &str = "_MP";
pub const VOLUME_POSITION: &str = "_VolumePosition";
pub const VOLUME_ROTATION: &str = "_VolumeRotation";
pub const VOLUME_RADIUS: &str = "_VolumeRadius";
pub const INSCATTERING_COLOR: &str = "_InscatteringColor";

/// Keyword enabling the spherical volume variant.
pub const SPHERICAL_VOLUME: &str = "_SPHERICAL_VOLUME";
/// Keyword enabling the vertical UV flip.
pub const FLIP_UV: &str = "_FLIP_UV";

/// A value bound to a named shader parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderValue {
    Float(f32),
    Vector(Vec4),
    VectorArray([Vec4; 4]),
    Matrix(Mat4),
    Keyword(bool),
}

impl GlobalParams {
    /// Frame-wide parameters as name/value pairs.
    pub fn named_values(&self) -> Vec<(&'static str, ShaderValue)> {
        let mut values = vec![(FRUSTUM_CORNERS, ShaderValue::VectorArray(self.frustum_corners))];
        match self.screen_to_world {
            ScreenToWorld::Mono {
                clip_to_world,
                view,
                projection,
            } => {
                values.push((SCREEN_TO_WORLD_LEFT, ShaderValue::Matrix(clip_to_world)));
                values.push((VIEW_MATRIX, ShaderValue::Matrix(view)));
                values.push((PROJECTION_MATRIX, ShaderValue::Matrix(projection)));
            }
            ScreenToWorld::Stereo { left, right } => {
                values.push((SCREEN_TO_WORLD_LEFT, ShaderValue::Matrix(left)));
                values.push((SCREEN_TO_WORLD_RIGHT, ShaderValue::Matrix(right)));
            }
        }
        values.push((SPHERICAL_VOLUME, ShaderValue::Keyword(self.spherical_volume)));
        values.push((FLIP_UV, ShaderValue::Keyword(self.flip_uv)));
        values
    }
}

impl VolumeDraw {
    /// Per-volume parameters as name/value pairs.
    pub fn named_values(&self) -> [(&'static str, ShaderValue); 4] {
        [
            (VOLUME_POSITION, ShaderValue::Vector(self.position.extend(1.0))),
            (
                VOLUME_ROTATION,
                ShaderValue::Vector(self.rotation_degrees.extend(0.0)),
            ),
            (VOLUME_RADIUS, ShaderValue::Float(self.radius)),
            (INSCATTERING_COLOR, ShaderValue::Vector(self.color.extend(1.0))),
        ]
    }
}

/// GPU representation of the frame-wide parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub frustum_corners: [[f32; 4]; 4],
    pub screen_to_world_left: [[f32; 4]; 4],
    pub screen_to_world_right: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub spherical_volume: u32, // 0 = cone, 1 = sphere
    pub flip_uv: u32,
    pub active_eye: u32, // 0 = mono or left, 1 = right
    pub _padding: u32,
}

impl FrameUniforms {
    /// Packs the frame parameters.
    #[must_use]
    pub fn new(globals: &GlobalParams) -> Self {
        let (view, projection) = match globals.screen_to_world {
            ScreenToWorld::Mono {
                view, projection, ..
            } => (view, projection),
            ScreenToWorld::Stereo { .. } => (Mat4::IDENTITY, Mat4::IDENTITY),
        };
        Self {
            frustum_corners: globals.frustum_corners.map(|c| c.to_array()),
            screen_to_world_left: globals.screen_to_world.left().to_cols_array_2d(),
            screen_to_world_right: globals.screen_to_world.right().to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            camera_position: globals.camera_position.extend(1.0).to_array(),
            spherical_volume: u32::from(globals.spherical_volume),
            flip_uv: u32::from(globals.flip_uv),
            active_eye: globals.active_eye,
            _padding: 0,
        }
    }
}

/// GPU representation of one volume draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VolumeUniforms {
    pub position: [f32; 3],
    pub radius: f32,
    pub rotation_degrees: [f32; 3],
    pub _padding: f32,
    pub color: [f32; 4],
}

impl VolumeUniforms {
    /// Packs one volume draw.
    #[must_use]
    pub fn new(draw: &VolumeDraw) -> Self {
        Self {
            position: draw.position.to_array(),
            radius: draw.radius,
            rotation_degrees: draw.rotation_degrees.to_array(),
            _padding: 0.0,
            color: draw.color.extend(1.0).to_array(),
        }
    }
}

/// Rounds `size` up to a multiple of `alignment`.
#[must_use]
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

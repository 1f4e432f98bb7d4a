//! Rendering side of inscatter-rs.
//!
//! This crate turns the enabled volumes into one additive fullscreen draw per
//! volume:
//! - Camera input and per-frame ray reconstruction ([`FrameCamera`], [`FrameState`])
//! - The pure frame planner ([`composite`]) and its parameter names ([`params`])
//! - The backend seam ([`CompositeBackend`], [`run_frame`]) and its wgpu
//!   implementation ([`InscatteringPass`], [`WgpuCompositor`])

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Exact float comparisons guard against singular matrices
#![allow(clippy::float_cmp)]
// GPU offsets and sizes are u32/u64 by API
#![allow(clippy::cast_possible_truncation)]

pub mod backend;
pub mod camera;
pub mod composite;
pub mod device;
pub mod error;
pub mod frame;
pub mod inscattering_pass;
pub mod params;
pub mod shader;

pub use backend::{run_frame, CompositeBackend, FrameReport};
pub use camera::{Eye, EyeView, FrameCamera, StereoEyes, Viewport};
pub use composite::{
    composite, plan_volume, CompositePlan, GlobalParams, SkippedVolume, TargetDescriptor,
    VolumeDraw,
};
pub use device::GpuContext;
pub use error::{RenderError, RenderResult};
pub use frame::{
    clip_to_world, far_plane_corners, shader_corner_order, FrameState, FrustumCorners,
    ScreenToWorld,
};
pub use inscattering_pass::{FrameBuffers, InscatteringPass, TemporaryTarget, WgpuCompositor};
pub use params::{FrameUniforms, ShaderValue, VolumeUniforms, INSCATTERING_SHADER};
pub use shader::{ShaderLibrary, ShaderSource};

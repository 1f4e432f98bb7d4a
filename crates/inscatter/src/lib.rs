//! inscatter-rs: screen-space atmospheric inscattering for light volumes.
//!
//! Light volumes (spheres with a fixed or light-derived HDR color) are enabled
//! into a [`Context`]. Once per frame the host invokes an
//! [`InscatteringFeature`], which reconstructs world-space view rays from the
//! camera and composites one additive fullscreen draw per enabled volume onto
//! the scene target.
//!
//! # Quick Start
//!
//! ```no_run
//! use inscatter::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let context = Context::default();
//!     let lamp = InscatteringVolume::fixed(
//!         "lamp",
//!         VolumeTransform::new(Vec3::new(0.0, 1.0, -4.0), Vec3::ZERO, 2.0),
//!         Vec3::new(4.0, 3.0, 2.0),
//!     )
//!     .into_shared();
//!     context.enable_volume(&lamp)?;
//!
//!     let camera = FrameCamera::perspective(
//!         Vec3::ZERO,
//!         Vec3::NEG_Z,
//!         Vec3::Y,
//!         std::f32::consts::FRAC_PI_3,
//!         4.0 / 3.0,
//!         0.1,
//!         100.0,
//!     );
//!     let image = render_to_image(&context, &camera, 320, 240, Vec4::new(0.0, 0.0, 0.0, 1.0))?;
//!     println!("{} draws", image.report.draws);
//!     Ok(())
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

mod context;
mod error;
mod feature;
mod headless;

pub use context::Context;
pub use error::{Error, Result};
pub use feature::{FrameTarget, InscatteringFeature};
pub use headless::{
    render_to_image, render_with_device, HeadlessTarget, RenderedImage, HEADLESS_FORMAT,
};

// Re-export core types
pub use inscatter_core::{
    geometry, ConeProbe, ConeSpan, ConeVolume, ExecutionContext, InjectionPoint, InscatterError,
    InscatteringOptions, InscatteringVolume, LightBinding, LightSource, ProbeHit, Ray,
    SharedLight, SharedRegistry, SharedVolume, TargetFilter, VolumeFrame, VolumeKind,
    VolumeRegistry, VolumeTransform, Mat4, Quat, Vec3, Vec4,
};

// Re-export render types
pub use inscatter_render::{
    composite, params, run_frame, CompositeBackend, CompositePlan, Eye, EyeView, FrameCamera,
    FrameReport, FrameState, GlobalParams, GpuContext, InscatteringPass, RenderError,
    ShaderLibrary, ShaderSource, ShaderValue, SkippedVolume, TargetDescriptor, Viewport,
    VolumeDraw,
};

/// Initializes `env_logger` for hosts and tests.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

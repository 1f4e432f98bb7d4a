//! Core abstractions for inscatter-rs.
//!
//! This crate provides the CPU side of screen-space inscattering:
//! - [`geometry`]: Euler basis rotation, ray transforms into a volume frame,
//!   and the analytic ray/cone intersection
//! - [`InscatteringVolume`]: a light volume with a fixed or light-derived color
//! - [`VolumeRegistry`]: the ordered set of currently enabled volumes
//! - Configuration options and the error type

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Exact float comparisons are part of the intersection branch structure
#![allow(clippy::float_cmp)]

pub mod error;
pub mod geometry;
pub mod light;
pub mod options;
pub mod probe;
pub mod registry;
pub mod volume;

pub use error::{InscatterError, Result};
pub use geometry::{
    euler_basis, inverse_rotate, ray_cone_intersection, rotate, transform_ray, ConeSpan, Ray,
    VolumeFrame, CONE_CAP,
};
pub use light::{LightBinding, LightSource, SharedLight};
pub use options::{ExecutionContext, InjectionPoint, InscatteringOptions, TargetFilter};
pub use probe::{ConeProbe, ConeVolume, ProbeHit};
pub use registry::{SharedRegistry, VolumeRegistry};
pub use volume::{InscatteringVolume, SharedVolume, VolumeKind, VolumeTransform};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec3, Vec4};

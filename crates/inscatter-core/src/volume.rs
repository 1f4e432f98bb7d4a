//! Inscattering volumes.
//!
//! A volume is a sphere in its local frame: its scale is kept uniform every
//! tick and the compositor reads the local X scale as its diameter. Two kinds
//! exist, sharing the same transform and color contract:
//!
//! - [`VolumeKind::Fixed`] carries an authored HDR color.
//! - [`VolumeKind::LightDerived`] reads color, intensity and range from a
//!   light owned by the scene.

use std::sync::{Arc, RwLock};

use glam::{Quat, Vec3};

use crate::error::{InscatterError, Result};
use crate::geometry::{quat_from_euler_degrees, quat_to_euler_degrees};
use crate::light::{LightBinding, SharedLight};

/// World transform of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeTransform {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub rotation: Quat,
    /// Local scale. X is the volume's diameter.
    pub scale: Vec3,
}

impl Default for VolumeTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl VolumeTransform {
    /// Creates a transform from position, Euler angles in degrees and uniform scale.
    #[must_use]
    pub fn new(position: Vec3, euler_degrees: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation: quat_from_euler_degrees(euler_degrees),
            scale: Vec3::splat(scale),
        }
    }

    /// Orientation as Euler angles in degrees, wrapped into `[0, 360)`.
    #[must_use]
    pub fn euler_degrees(&self) -> Vec3 {
        quat_to_euler_degrees(self.rotation)
    }

    /// Sets the orientation from Euler angles in degrees.
    pub fn set_euler_degrees(&mut self, euler_degrees: Vec3) {
        self.rotation = quat_from_euler_degrees(euler_degrees);
    }

    /// Copies the X scale into Y and Z.
    pub fn enforce_uniform_scale(&mut self) {
        self.scale = Vec3::splat(self.scale.x);
    }

    /// Returns true if all three scale components are identical.
    #[must_use]
    pub fn has_uniform_scale(&self) -> bool {
        self.scale.x == self.scale.y && self.scale.x == self.scale.z
    }
}

/// How a volume resolves its color and extent.
#[derive(Debug, Clone)]
pub enum VolumeKind {
    /// Authored HDR color; extent comes from the transform.
    Fixed {
        /// Linear color, unclamped.
        color: Vec3,
    },
    /// Color and extent follow an attached light.
    LightDerived {
        /// Binding to the light.
        binding: LightBinding,
    },
}

impl VolumeKind {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            VolumeKind::Fixed { .. } => "fixed",
            VolumeKind::LightDerived { .. } => "light-derived",
        }
    }
}

/// A light volume contributing inscattering.
#[derive(Debug, Clone)]
pub struct InscatteringVolume {
    name: String,
    /// World transform.
    pub transform: VolumeTransform,
    kind: VolumeKind,
}

/// A volume shared between the scene that owns it and the registry.
pub type SharedVolume = Arc<RwLock<InscatteringVolume>>;

impl InscatteringVolume {
    /// Creates a volume with an authored color.
    pub fn fixed(name: impl Into<String>, transform: VolumeTransform, color: Vec3) -> Self {
        let mut volume = Self {
            name: name.into(),
            transform,
            kind: VolumeKind::Fixed { color },
        };
        volume.transform.enforce_uniform_scale();
        volume
    }

    /// Creates a light-derived volume with no light attached yet.
    pub fn light_derived(name: impl Into<String>, transform: VolumeTransform) -> Self {
        let mut volume = Self {
            name: name.into(),
            transform,
            kind: VolumeKind::LightDerived {
                binding: LightBinding::Unbound,
            },
        };
        volume.transform.enforce_uniform_scale();
        volume
    }

    /// Creates a light-derived volume bound to `light`, with its extent synced.
    pub fn with_light(
        name: impl Into<String>,
        transform: VolumeTransform,
        light: &SharedLight,
    ) -> Self {
        let mut volume = Self::light_derived(name, transform);
        volume.kind = VolumeKind::LightDerived {
            binding: LightBinding::bind(light),
        };
        // A poisoned light leaves the volume inert until the next tick.
        if let Err(e) = volume.tick() {
            log::warn!("volume '{}': {e}", volume.name);
        }
        volume
    }

    /// Wraps the volume for sharing with the registry.
    #[must_use]
    pub fn into_shared(self) -> SharedVolume {
        Arc::new(RwLock::new(self))
    }

    /// Returns the name of this volume.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how this volume resolves its color.
    pub fn kind(&self) -> &VolumeKind {
        &self.kind
    }

    /// Attaches a light to a light-derived volume.
    pub fn attach_light(&mut self, light: &SharedLight) -> Result<()> {
        match &mut self.kind {
            VolumeKind::LightDerived { binding } => {
                *binding = LightBinding::bind(light);
                Ok(())
            }
            VolumeKind::Fixed { .. } => Err(InscatterError::NotLightDerived(self.name.clone())),
        }
    }

    /// Resolved HDR color.
    ///
    /// Light-derived volumes return the light's color times its intensity, or
    /// an error while no live light is attached.
    pub fn resolve_color(&self) -> Result<Vec3> {
        match &self.kind {
            VolumeKind::Fixed { color } => Ok(*color),
            VolumeKind::LightDerived { binding } => Ok(binding.light()?.radiance()),
        }
    }

    /// Extent (diameter) of the volume, read from the local X scale.
    pub fn extent(&self) -> f32 {
        self.transform.scale.x
    }

    /// Radius of the volume.
    pub fn radius(&self) -> f32 {
        self.extent() * 0.5
    }

    /// Per-frame maintenance.
    ///
    /// Keeps the scale uniform and, for light-derived volumes, resyncs the
    /// extent to the light's range. A light-derived volume without a live
    /// light keeps its uniform scale and reports the binding error; the host
    /// is expected to attach a light and tick again.
    pub fn tick(&mut self) -> Result<()> {
        match &mut self.kind {
            VolumeKind::Fixed { .. } => {
                self.transform.enforce_uniform_scale();
                Ok(())
            }
            VolumeKind::LightDerived { binding } => {
                binding.refresh();
                match binding.light() {
                    Ok(light) => {
                        self.transform.scale = Vec3::splat(light.range);
                        Ok(())
                    }
                    Err(e) => {
                        self.transform.enforce_uniform_scale();
                        Err(e)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::LightSource;
    use proptest::prelude::*;

    #[test]
    fn test_light_derived_color() {
        let light = LightSource::new(Vec3::new(1.0, 0.0, 0.0), 2.0, 4.0).into_shared();
        let volume = InscatteringVolume::with_light("spot", VolumeTransform::default(), &light);
        assert_eq!(volume.resolve_color().unwrap(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(volume.transform.scale, Vec3::splat(4.0));
        assert_eq!(volume.radius(), 2.0);
    }

    #[test]
    fn test_fixed_color() {
        let volume = InscatteringVolume::fixed(
            "glow",
            VolumeTransform::default(),
            Vec3::new(0.5, 4.0, 1.0),
        );
        assert_eq!(volume.resolve_color().unwrap(), Vec3::new(0.5, 4.0, 1.0));
        assert_eq!(volume.kind().name(), "fixed");
    }

    #[test]
    fn test_unbound_volume_fails_safe() {
        let mut volume = InscatteringVolume::light_derived("pending", VolumeTransform::default());
        assert!(matches!(volume.resolve_color(), Err(InscatterError::LightUnbound)));
        assert!(matches!(volume.tick(), Err(InscatterError::LightUnbound)));
        assert!(volume.transform.has_uniform_scale());
    }

    #[test]
    fn test_rebinding_after_light_released() {
        let first = LightSource::new(Vec3::ONE, 1.0, 2.0).into_shared();
        let mut volume = InscatteringVolume::with_light("lamp", VolumeTransform::default(), &first);
        drop(first);
        assert!(volume.tick().is_err());

        let second = LightSource::new(Vec3::ONE, 1.0, 8.0).into_shared();
        volume.attach_light(&second).unwrap();
        volume.tick().unwrap();
        assert_eq!(volume.extent(), 8.0);
    }

    #[test]
    fn test_attach_light_to_fixed_volume_fails() {
        let light = LightSource::default().into_shared();
        let mut volume = InscatteringVolume::fixed("glow", VolumeTransform::default(), Vec3::ONE);
        assert!(matches!(
            volume.attach_light(&light),
            Err(InscatterError::NotLightDerived(_))
        ));
    }

    #[test]
    fn test_extent_follows_light_range() {
        let light = LightSource::new(Vec3::ONE, 1.0, 3.0).into_shared();
        let mut volume = InscatteringVolume::with_light("lamp", VolumeTransform::default(), &light);
        light.write().unwrap().range = 12.0;
        volume.tick().unwrap();
        assert_eq!(volume.transform.scale, Vec3::splat(12.0));
    }

    proptest! {
        #[test]
        fn prop_scale_uniform_after_tick(
            x in 0.01f32..100.0,
            y in 0.01f32..100.0,
            z in 0.01f32..100.0,
            light_derived in any::<bool>(),
            range in 0.01f32..100.0,
        ) {
            let light = LightSource::new(Vec3::ONE, 1.0, range).into_shared();
            let mut volume = if light_derived {
                InscatteringVolume::with_light("v", VolumeTransform::default(), &light)
            } else {
                InscatteringVolume::fixed("v", VolumeTransform::default(), Vec3::ONE)
            };
            volume.transform.scale = Vec3::new(x, y, z);
            let _ = volume.tick();
            prop_assert!(volume.transform.has_uniform_scale());
        }
    }
}

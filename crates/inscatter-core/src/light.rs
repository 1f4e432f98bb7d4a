//! Light sources and the binding a light-derived volume holds to one.

use std::sync::{Arc, RwLock, Weak};

use glam::Vec3;

use crate::error::{InscatterError, Result};

/// A light source owned by the host scene.
///
/// Volumes only ever read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    /// Base linear color.
    pub color: Vec3,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Effective range in world units.
    pub range: f32,
}

impl LightSource {
    /// Creates a new light source.
    #[must_use]
    pub fn new(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            color,
            intensity,
            range,
        }
    }

    /// Color scaled by intensity (HDR, unclamped).
    #[must_use]
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }

    /// Wraps the light for sharing with volumes.
    #[must_use]
    pub fn into_shared(self) -> SharedLight {
        Arc::new(RwLock::new(self))
    }
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
        }
    }
}

/// A light shared between the scene and the volumes reading it.
pub type SharedLight = Arc<RwLock<LightSource>>;

/// Binding state of a light-derived volume.
///
/// The volume never keeps its light alive: a bound light dropped by the scene
/// makes the binding report [`InscatterError::LightReleased`] until
/// [`LightBinding::refresh`] moves it back to `Unbound`.
#[derive(Debug, Clone, Default)]
pub enum LightBinding {
    /// No light attached yet.
    #[default]
    Unbound,
    /// Attached to a light owned elsewhere.
    Bound(Weak<RwLock<LightSource>>),
}

impl LightBinding {
    /// Binds to a light.
    #[must_use]
    pub fn bind(light: &SharedLight) -> Self {
        Self::Bound(Arc::downgrade(light))
    }

    /// Returns true if bound to a light that is still alive.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        match self {
            Self::Unbound => false,
            Self::Bound(light) => light.strong_count() > 0,
        }
    }

    /// Reads the current state of the bound light.
    pub fn light(&self) -> Result<LightSource> {
        match self {
            Self::Unbound => Err(InscatterError::LightUnbound),
            Self::Bound(light) => {
                let light = light.upgrade().ok_or(InscatterError::LightReleased)?;
                let guard = light
                    .read()
                    .map_err(|_| InscatterError::LockPoisoned("light"))?;
                Ok(*guard)
            }
        }
    }

    /// Drops a binding whose light has been released.
    ///
    /// Returns true if the binding is live afterwards.
    pub fn refresh(&mut self) -> bool {
        if matches!(self, Self::Bound(_)) && !self.is_bound() {
            *self = Self::Unbound;
        }
        self.is_bound()
    }
}

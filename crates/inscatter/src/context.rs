//! State shared between the scene and the inscattering pass.

use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

use inscatter_core::{
    InscatterError, InscatteringOptions, SharedRegistry, SharedVolume, VolumeRegistry,
};

use crate::error::Result;

/// Owns the volume registry and the pass options.
///
/// The scene enables and disables volumes through the context; the pass reads
/// a snapshot of the registry once per frame. Clones share the same registry.
#[derive(Debug, Clone)]
pub struct Context {
    registry: SharedRegistry,
    options: InscatteringOptions,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            registry: VolumeRegistry::shared(),
            options: InscatteringOptions::default(),
        }
    }
}

fn poisoned<T>(_: PoisonError<T>) -> InscatterError {
    InscatterError::LockPoisoned("volume registry")
}

impl Context {
    /// Creates a context with validated options and an empty registry.
    pub fn new(options: InscatteringOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            registry: VolumeRegistry::shared(),
            options,
        })
    }

    /// Returns the pass options.
    pub fn options(&self) -> &InscatteringOptions {
        &self.options
    }

    /// Replaces the pass options.
    pub fn set_options(&mut self, options: InscatteringOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Returns a handle to the shared registry.
    pub fn registry(&self) -> SharedRegistry {
        SharedRegistry::clone(&self.registry)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, VolumeRegistry>> {
        Ok(self.registry.read().map_err(poisoned)?)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, VolumeRegistry>> {
        Ok(self.registry.write().map_err(poisoned)?)
    }

    /// Registers a volume that the scene has enabled.
    pub fn enable_volume(&self, volume: &SharedVolume) -> Result<()> {
        self.write()?.add(volume)?;
        Ok(())
    }

    /// Unregisters a volume that the scene has disabled.
    ///
    /// Returns false if it was not registered.
    pub fn disable_volume(&self, volume: &SharedVolume) -> Result<bool> {
        Ok(self.write()?.remove(volume))
    }

    /// Checks if a volume is currently enabled.
    pub fn is_enabled(&self, volume: &SharedVolume) -> Result<bool> {
        Ok(self.read()?.contains(volume))
    }

    /// Enabled volumes in enable order.
    ///
    /// The registry lock is released before returning, so the scene may keep
    /// enabling and disabling volumes while a frame draws the snapshot.
    pub fn snapshot(&self) -> Result<Vec<SharedVolume>> {
        Ok(self.read()?.all())
    }

    /// Runs per-frame maintenance on every enabled volume.
    ///
    /// Volumes whose light is not bound are left inert and reported by name.
    pub fn tick_volumes(&self) -> Result<Vec<String>> {
        let mut unresolved = Vec::new();
        for volume in self.snapshot()? {
            let mut volume = volume
                .write()
                .map_err(|_| InscatterError::LockPoisoned("volume"))?;
            if let Err(e) = volume.tick() {
                log::warn!("volume '{}' is inert: {e}", volume.name());
                unresolved.push(volume.name().to_string());
            }
        }
        Ok(unresolved)
    }

    /// Drops registry entries for volumes the scene has destroyed.
    pub fn prune(&self) -> Result<usize> {
        Ok(self.write()?.prune())
    }
}

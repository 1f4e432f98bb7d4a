//! Registry of enabled inscattering volumes.

use std::sync::{Arc, RwLock, Weak};

use crate::error::{InscatterError, Result};
use crate::volume::{InscatteringVolume, SharedVolume};

/// Ordered set of the volumes currently enabled.
///
/// Iteration order is enable order. The registry only holds weak references:
/// the scene owns the volumes and the registry never extends their lifetime.
/// References to volumes dropped without being removed are skipped and pruned.
#[derive(Debug, Default)]
pub struct VolumeRegistry {
    entries: Vec<Weak<RwLock<InscatteringVolume>>>,
}

/// A registry shared between the thread that enables volumes and the render thread.
pub type SharedRegistry = Arc<RwLock<VolumeRegistry>>;

fn refers_to(entry: &Weak<RwLock<InscatteringVolume>>, volume: &SharedVolume) -> bool {
    entry.strong_count() > 0 && std::ptr::eq(entry.as_ptr(), Arc::as_ptr(volume))
}

fn volume_name(volume: &SharedVolume) -> String {
    volume
        .read()
        .map_or_else(|_| "<poisoned>".to_string(), |v| v.name().to_string())
}

impl VolumeRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry ready to be shared across threads.
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Registers a volume that has just been enabled.
    ///
    /// Enabling a volume twice is a caller error and is reported rather than
    /// ignored; the registry is left unchanged.
    pub fn add(&mut self, volume: &SharedVolume) -> Result<()> {
        self.prune();
        if self.contains(volume) {
            return Err(InscatterError::VolumeAlreadyRegistered(volume_name(volume)));
        }

        self.entries.push(Arc::downgrade(volume));
        log::debug!("registered inscattering volume '{}'", volume_name(volume));
        Ok(())
    }

    /// Removes a volume that has just been disabled.
    ///
    /// Returns false if the volume was not registered.
    pub fn remove(&mut self, volume: &SharedVolume) -> bool {
        let Some(index) = self.entries.iter().position(|e| refers_to(e, volume)) else {
            return false;
        };

        self.entries.remove(index);
        log::debug!("unregistered inscattering volume '{}'", volume_name(volume));
        true
    }

    /// Checks if a volume is registered.
    pub fn contains(&self, volume: &SharedVolume) -> bool {
        self.entries.iter().any(|e| refers_to(e, volume))
    }

    /// Returns the live volumes in enable order.
    pub fn all(&self) -> Vec<SharedVolume> {
        self.iter().collect()
    }

    /// Returns an iterator over the live volumes in enable order.
    pub fn iter(&self) -> impl Iterator<Item = SharedVolume> + '_ {
        self.entries.iter().filter_map(Weak::upgrade)
    }

    /// Drops references to volumes that no longer exist.
    ///
    /// Returns the number of references dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.strong_count() > 0);
        before - self.entries.len()
    }

    /// Returns the number of live registered volumes.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.strong_count() > 0).count()
    }

    /// Returns true if no live volume is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeTransform;
    use glam::Vec3;
    use proptest::prelude::*;

    fn volume(name: &str) -> SharedVolume {
        InscatteringVolume::fixed(name, VolumeTransform::default(), Vec3::ONE).into_shared()
    }

    fn names(registry: &VolumeRegistry) -> Vec<String> {
        registry
            .iter()
            .map(|v| v.read().unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_remove_keeps_order() {
        let (a, b, c) = (volume("A"), volume("B"), volume("C"));
        let mut registry = VolumeRegistry::new();
        registry.add(&a).unwrap();
        registry.add(&b).unwrap();
        registry.add(&c).unwrap();

        assert!(registry.remove(&b));
        assert_eq!(names(&registry), ["A", "C"]);
    }

    #[test]
    fn test_double_add_is_rejected() {
        let a = volume("A");
        let mut registry = VolumeRegistry::new();
        registry.add(&a).unwrap();
        assert!(matches!(
            registry.add(&a),
            Err(InscatterError::VolumeAlreadyRegistered(name)) if name == "A"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (a, b) = (volume("A"), volume("B"));
        let mut registry = VolumeRegistry::new();
        registry.add(&a).unwrap();
        assert!(!registry.remove(&b));
        assert_eq!(names(&registry), ["A"]);
    }

    #[test]
    fn test_registry_does_not_own_volumes() {
        let a = volume("A");
        let mut registry = VolumeRegistry::new();
        registry.add(&a).unwrap();
        drop(a);

        assert!(registry.is_empty());
        assert!(registry.all().is_empty());
        assert_eq!(registry.prune(), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = VolumeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0usize..6).prop_map(Op::Add), (0usize..6).prop_map(Op::Remove)]
    }

    fn apply(registry: &mut VolumeRegistry, pool: &[SharedVolume], ops: &[Op]) {
        for op in ops {
            match op {
                Op::Add(i) => {
                    let _ = registry.add(&pool[*i]);
                }
                Op::Remove(i) => {
                    registry.remove(&pool[*i]);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_add_then_remove_restores_state(
            before in prop::collection::vec(op(), 0..12),
            after in prop::collection::vec(op(), 0..12),
        ) {
            let pool: Vec<SharedVolume> = (0..6).map(|i| volume(&format!("v{i}"))).collect();
            let probe = volume("probe");

            let mut reference = VolumeRegistry::new();
            apply(&mut reference, &pool, &before);
            apply(&mut reference, &pool, &after);

            let mut registry = VolumeRegistry::new();
            apply(&mut registry, &pool, &before);
            registry.add(&probe).unwrap();
            apply(&mut registry, &pool, &after);
            prop_assert!(registry.remove(&probe));

            prop_assert_eq!(names(&registry), names(&reference));
        }

        #[test]
        fn prop_no_duplicates(ops in prop::collection::vec(op(), 0..24)) {
            let pool: Vec<SharedVolume> = (0..6).map(|i| volume(&format!("v{i}"))).collect();
            let mut registry = VolumeRegistry::new();
            apply(&mut registry, &pool, &ops);

            let mut seen = names(&registry);
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }
    }
}

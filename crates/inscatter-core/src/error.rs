//! Error types for inscatter-rs.

use thiserror::Error;

/// The main error type for inscatter-rs core operations.
#[derive(Error, Debug)]
pub enum InscatterError {
    /// The volume is already present in the registry (enabled twice).
    #[error("volume '{0}' is already registered")]
    VolumeAlreadyRegistered(String),

    /// A light-derived volume has no light attached yet.
    #[error("no light attached")]
    LightUnbound,

    /// The light a volume was bound to has been dropped by its owner.
    #[error("attached light has been released")]
    LightReleased,

    /// A light was attached to a volume with a fixed color.
    #[error("volume '{0}' does not derive its color from a light")]
    NotLightDerived(String),

    /// A shared lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// Options failed validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for inscatter-rs core operations.
pub type Result<T> = std::result::Result<T, InscatterError>;

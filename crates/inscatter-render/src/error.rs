//! Rendering error types.

use inscatter_core::InscatterError;
use thiserror::Error;

/// Errors that can occur while creating or executing the inscattering pass.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// The shader program was not found when the pass was created.
    #[error("shader '{0}' not found")]
    ShaderNotFound(String),

    /// Pipeline creation failed.
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    /// The temporary target could not be allocated.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// The host supplied frame state the pass cannot use.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A volume draw could not be issued.
    #[error("draw failed: {0}")]
    DrawFailed(String),

    /// Error from the core crate.
    #[error(transparent)]
    Core(#[from] InscatterError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

//! Error type of the facade.

use inscatter_core::InscatterError;
use inscatter_render::RenderError;
use thiserror::Error;

/// Errors returned by the facade.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from volume or registry bookkeeping.
    #[error(transparent)]
    Core(#[from] InscatterError),

    /// Error from the rendering pass.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Reading a rendered image back from the GPU failed.
    #[error("readback failed: {0}")]
    Readback(String),
}

/// A specialized Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Execution of a frame against a rendering backend.

use inscatter_core::{InscatteringOptions, SharedVolume, TargetFilter};

use crate::camera::FrameCamera;
use crate::composite::{composite, GlobalParams, SkippedVolume, TargetDescriptor, VolumeDraw};
use crate::error::RenderResult;

/// The rendering operations the inscattering pass needs from its host.
///
/// A frame calls `acquire_temporary` once, then `configure` once, then
/// `draw_volume` for each planned draw in order, and finally
/// `release_temporary` exactly once, including when a previous step failed.
pub trait CompositeBackend {
    /// Handle to the temporary target.
    type Temporary;

    /// Allocates a temporary target matching `target`.
    fn acquire_temporary(
        &mut self,
        target: &TargetDescriptor,
        filter: TargetFilter,
    ) -> RenderResult<Self::Temporary>;

    /// Binds the frame-wide parameters. `draw_count` draws follow.
    fn configure(&mut self, globals: &GlobalParams, draw_count: usize) -> RenderResult<()>;

    /// Blits `temporary` onto the scene target with one volume's parameters.
    fn draw_volume(
        &mut self,
        temporary: &Self::Temporary,
        index: usize,
        draw: &VolumeDraw,
    ) -> RenderResult<()>;

    /// Returns the temporary target.
    fn release_temporary(&mut self, temporary: Self::Temporary);
}

/// Outcome of one executed frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Number of volume draws issued.
    pub draws: usize,
    /// Volumes left out of the frame.
    pub skipped: Vec<SkippedVolume>,
}

/// Holds the temporary target and releases it when dropped, so an early
/// return or a panic during drawing still gives it back.
struct ScopedTemporary<'a, B: CompositeBackend> {
    backend: &'a mut B,
    temporary: Option<B::Temporary>,
}

impl<B: CompositeBackend> Drop for ScopedTemporary<'_, B> {
    fn drop(&mut self) {
        if let Some(temporary) = self.temporary.take() {
            self.backend.release_temporary(temporary);
            log::trace!("released temporary inscattering target");
        }
    }
}

/// Runs one frame of the inscattering pass.
///
/// Steps: acquire the temporary target, reconstruct the frame, bind the
/// frame parameters, draw each volume, release the temporary target.
pub fn run_frame<B: CompositeBackend>(
    backend: &mut B,
    camera: &FrameCamera,
    target: &TargetDescriptor,
    volumes: &[SharedVolume],
    options: &InscatteringOptions,
) -> RenderResult<FrameReport> {
    let temporary = backend.acquire_temporary(target, options.temporary_filter)?;
    let mut scope = ScopedTemporary {
        backend,
        temporary: Some(temporary),
    };

    let plan = composite(camera, target, volumes, options)?;
    scope.backend.configure(&plan.globals, plan.draws.len())?;

    if let Some(temporary) = scope.temporary.as_ref() {
        for (index, draw) in plan.draws.iter().enumerate() {
            log::trace!(
                "inscattering draw {index}: '{}' radius {}",
                draw.name,
                draw.radius
            );
            scope.backend.draw_volume(temporary, index, draw)?;
        }
    }

    log::debug!(
        "inscattering frame: {} draws, {} skipped",
        plan.draws.len(),
        plan.skipped.len()
    );
    Ok(FrameReport {
        draws: plan.draws.len(),
        skipped: plan.skipped,
    })
}

//! The inscattering pass as a feature installed into a host renderer.

use inscatter_core::InjectionPoint;
use inscatter_render::{
    run_frame, FrameCamera, FrameReport, InscatteringPass, ShaderLibrary, TargetDescriptor,
    WgpuCompositor,
};

use crate::context::Context;
use crate::error::Result;

/// Frame inputs the host provides when invoking the feature.
pub struct FrameTarget<'a> {
    /// Description of the scene color target.
    pub descriptor: TargetDescriptor,
    /// View of the scene color target the volumes are composited onto.
    pub view: &'a wgpu::TextureView,
}

/// The inscattering pass, created once and invoked once per frame.
pub struct InscatteringFeature {
    pass: InscatteringPass,
}

impl InscatteringFeature {
    /// Creates the feature with the built-in shader library.
    pub fn create(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        context: &Context,
    ) -> Result<Self> {
        Self::create_with_library(device, format, context, &ShaderLibrary::new())
    }

    /// Creates the feature with a custom shader library.
    ///
    /// Fails, and nothing should be scheduled, when the library does not
    /// provide the inscattering program.
    pub fn create_with_library(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        context: &Context,
        library: &ShaderLibrary,
    ) -> Result<Self> {
        let pass = InscatteringPass::new(
            device,
            format,
            context.options().temporary_filter,
            library,
        )
        .inspect_err(|e| log::error!("inscattering pass not installed: {e}"))?;
        log::info!(
            "inscattering feature installed at {:?}",
            context.options().injection_point
        );
        Ok(Self { pass })
    }

    /// Where the host should schedule the pass, per the context options.
    pub fn injection_point(context: &Context) -> InjectionPoint {
        context.options().injection_point
    }

    /// Scene target format the feature was created for.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.pass.format()
    }

    /// Records one frame of inscattering into `encoder`.
    ///
    /// Each call owns its uniforms, so several frames (one per eye, or per
    /// target) may share an encoder. A failed frame is logged and returned;
    /// the host drops it.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &FrameTarget<'_>,
        camera: &FrameCamera,
        context: &Context,
    ) -> Result<FrameReport> {
        let volumes = context.snapshot()?;
        let mut backend = WgpuCompositor::new(&self.pass, device, queue, encoder, target.view);

        let report = run_frame(
            &mut backend,
            camera,
            &target.descriptor,
            &volumes,
            context.options(),
        )
        .inspect_err(|e| log::error!("inscattering frame dropped: {e}"))?;
        Ok(report)
    }
}

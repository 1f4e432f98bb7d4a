//! Headless rendering of the inscattering pass.
//!
//! Renders one frame onto a cleared offscreen target and reads it back.
//! Useful for integration tests and offline previews.

use glam::Vec4;
use pollster::FutureExt;

use inscatter_render::{FrameCamera, FrameReport, GpuContext, RenderError, TargetDescriptor};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::feature::{FrameTarget, InscatteringFeature};

/// Format of images rendered by [`render_to_image`].
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A frame read back from the GPU.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row by row from the top-left.
    pub pixels: Vec<u8>,
    pub report: FrameReport,
}

impl RenderedImage {
    /// RGBA value of one pixel, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(start..start + 4)?.try_into().ok()
    }
}

fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// An offscreen scene target with a readback buffer.
///
/// Several targets can be rendered into one encoder and read back after a
/// single submit.
pub struct HeadlessTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    descriptor: TargetDescriptor,
    readback: wgpu::Buffer,
    bytes_per_row: u32,
}

impl HeadlessTarget {
    /// Creates a target of [`HEADLESS_FORMAT`].
    ///
    /// Fails before touching the device when the size is empty or exceeds the
    /// device's texture limit.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self> {
        let descriptor = TargetDescriptor::new(width, height, HEADLESS_FORMAT);
        descriptor.validate()?;
        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::TextureCreationFailed(format!(
                "{width}x{height} exceeds the device limit of {max}"
            ))
            .into());
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("headless scene target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HEADLESS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes_per_row = aligned_bytes_per_row(width);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("headless readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Ok(Self {
            texture,
            view,
            descriptor,
            readback,
            bytes_per_row,
        })
    }

    /// The target as handed to [`InscatteringFeature::render`].
    pub fn frame_target(&self) -> FrameTarget<'_> {
        FrameTarget {
            descriptor: self.descriptor,
            view: &self.view,
        }
    }

    /// Records a clear to `background`.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder, background: Vec4) {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("headless clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(background.x),
                        g: f64::from(background.y),
                        b: f64::from(background.z),
                        a: f64::from(background.w),
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
    }

    /// Records the copy of the target into the readback buffer.
    pub fn copy_to_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        let TargetDescriptor { width, height, .. } = self.descriptor;
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Maps the readback buffer after the copy was submitted.
    pub fn read(&self, device: &wgpu::Device, report: FrameReport) -> Result<RenderedImage> {
        let TargetDescriptor { width, height, .. } = self.descriptor;

        let buffer_slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|e| Error::Readback(e.to_string()))?
            .map_err(|e| Error::Readback(e.to_string()))?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let row_bytes = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * self.bytes_per_row as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        self.readback.unmap();

        Ok(RenderedImage {
            width,
            height,
            pixels,
            report,
        })
    }
}

/// Renders the enabled volumes of `context` over a solid background.
///
/// Creates a headless GPU context; fails with a render error when no adapter
/// is available.
pub fn render_to_image(
    context: &Context,
    camera: &FrameCamera,
    width: u32,
    height: u32,
    background: Vec4,
) -> Result<RenderedImage> {
    let gpu = GpuContext::new_headless().block_on()?;
    render_with_device(&gpu.device, &gpu.queue, context, camera, width, height, background)
}

/// Renders with an existing device and queue.
pub fn render_with_device(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    context: &Context,
    camera: &FrameCamera,
    width: u32,
    height: u32,
    background: Vec4,
) -> Result<RenderedImage> {
    let target = HeadlessTarget::new(device, width, height)?;
    let feature = InscatteringFeature::create(device, HEADLESS_FORMAT, context)?;

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("headless inscattering encoder"),
    });
    target.clear(&mut encoder, background);
    let report = feature.render(
        device,
        queue,
        &mut encoder,
        &target.frame_target(),
        camera,
        context,
    )?;
    target.copy_to_readback(&mut encoder);
    queue.submit(std::iter::once(encoder.finish()));

    target.read(device, report)
}

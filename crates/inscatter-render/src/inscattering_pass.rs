//! Inscattering composite pass.
//!
//! A cleared temporary target of the scene's size is the blit source. Each
//! volume is drawn as an additive fullscreen triangle onto the scene target.
//!
//! Uniforms live in buffers owned by one frame, so several frames recorded
//! into one encoder before a submit each draw with their own parameters.

use wgpu::util::DeviceExt;

use inscatter_core::TargetFilter;

use crate::backend::CompositeBackend;
use crate::composite::{GlobalParams, TargetDescriptor, VolumeDraw};
use crate::error::{RenderError, RenderResult};
use crate::params::{align_to, FrameUniforms, VolumeUniforms, INSCATTERING_SHADER};
use crate::shader::ShaderLibrary;

/// Temporary target acquired for one frame.
pub struct TemporaryTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl TemporaryTarget {
    /// The texture backing the target.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// View of the target.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Uniform buffers of one frame.
pub struct FrameBuffers {
    frame: wgpu::Buffer,
    volumes: wgpu::Buffer,
    capacity: usize,
}

impl FrameBuffers {
    /// Number of volume draws the frame has room for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Inscattering render resources.
pub struct InscatteringPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    volume_stride: u64,
    sampler: wgpu::Sampler,
    format: wgpu::TextureFormat,
    filter: TargetFilter,
}

impl InscatteringPass {
    /// Creates the pass for a scene target format.
    ///
    /// Fails if the library has no inscattering program or the format cannot
    /// be sampled with the requested filter.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        filter: TargetFilter,
        library: &ShaderLibrary,
    ) -> RenderResult<Self> {
        let (shader, program) = library.build_module(device, INSCATTERING_SHADER)?;

        if !matches!(
            format.sample_type(None, Some(device.features())),
            Some(wgpu::TextureSampleType::Float { .. })
        ) {
            return Err(RenderError::PipelineCreationFailed(format!(
                "target format {format:?} cannot be sampled as float"
            )));
        }
        let filterable = filter == TargetFilter::Linear;
        if filterable
            && !format
                .guaranteed_format_features(device.features())
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        {
            return Err(RenderError::PipelineCreationFailed(format!(
                "target format {format:?} is not filterable"
            )));
        }

        let volume_size = std::mem::size_of::<VolumeUniforms>() as u64;
        let volume_stride = align_to(
            volume_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        // Create bind group layout
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Inscattering Bind Group Layout"),
            entries: &[
                // Frame uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Volume uniforms, one slot per draw
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(volume_size),
                    },
                    count: None,
                },
                // Temporary target
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(if filterable {
                        wgpu::SamplerBindingType::Filtering
                    } else {
                        wgpu::SamplerBindingType::NonFiltering
                    }),
                    count: None,
                },
            ],
        });

        // Create pipeline layout
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Inscattering Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Additive color, destination alpha untouched
        let blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Inscattering Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(program.vertex_entry.as_str()),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(program.fragment_entry.as_str()),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let filter_mode = match filter {
            TargetFilter::Nearest => wgpu::FilterMode::Nearest,
            TargetFilter::Linear => wgpu::FilterMode::Linear,
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Inscattering Sampler"),
            mag_filter: filter_mode,
            min_filter: filter_mode,
            ..Default::default()
        });

        log::debug!("created inscattering pass for {format:?} ({filter:?} temporary)");

        Ok(Self {
            pipeline,
            bind_group_layout,
            volume_stride,
            sampler,
            format,
            filter,
        })
    }

    /// Scene target format the pipeline was built for.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Filtering of the temporary target.
    pub fn filter(&self) -> TargetFilter {
        self.filter
    }

    /// Creates the uniform buffers of one frame, holding `globals` and room
    /// for `draw_count` volumes.
    pub fn create_frame_buffers(
        &self,
        device: &wgpu::Device,
        globals: &GlobalParams,
        draw_count: usize,
    ) -> FrameBuffers {
        let frame = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Inscattering Frame Buffer"),
            contents: bytemuck::cast_slice(&[FrameUniforms::new(globals)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let capacity = draw_count.max(1);
        let volumes = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Inscattering Volume Buffer"),
            size: self.volume_stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        FrameBuffers {
            frame,
            volumes,
            capacity,
        }
    }

    /// Allocates and clears a temporary target matching the scene target.
    pub fn create_temporary(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        target: &TargetDescriptor,
    ) -> RenderResult<TemporaryTarget> {
        target.validate()?;
        if target.format != self.format {
            return Err(RenderError::TextureCreationFailed(format!(
                "target format {:?} does not match pass format {:?}",
                target.format, self.format
            )));
        }
        let max = device.limits().max_texture_dimension_2d;
        if target.width > max || target.height > max {
            return Err(RenderError::TextureCreationFailed(format!(
                "{}x{} exceeds the device limit of {max}",
                target.width, target.height
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Inscattering Temporary Target"),
            size: wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: target.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Clear so the blit source contributes nothing
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Inscattering Temporary Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        Ok(TemporaryTarget { texture, view })
    }

    /// Writes the uniforms of draw `index` into the frame's volume buffer.
    pub fn write_volume(
        &self,
        queue: &wgpu::Queue,
        buffers: &FrameBuffers,
        index: usize,
        draw: &VolumeDraw,
    ) -> RenderResult<u32> {
        let offset = self.volume_offset(buffers, index)?;
        let uniforms = VolumeUniforms::new(draw);
        queue.write_buffer(
            &buffers.volumes,
            u64::from(offset),
            bytemuck::cast_slice(&[uniforms]),
        );
        Ok(offset)
    }

    fn volume_offset(&self, buffers: &FrameBuffers, index: usize) -> RenderResult<u32> {
        if index >= buffers.capacity {
            return Err(RenderError::DrawFailed(format!(
                "draw {index} exceeds volume capacity {}",
                buffers.capacity
            )));
        }
        u32::try_from(index as u64 * self.volume_stride)
            .map_err(|_| RenderError::DrawFailed(format!("draw {index} offset overflows")))
    }

    /// Creates a bind group over the frame's buffers, sampling `source_view`.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        buffers: &FrameBuffers,
        source_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Inscattering Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.frame.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffers.volumes,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<VolumeUniforms>() as u64),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Draws one volume onto `output_view`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        volume_offset: u32,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Inscattering Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[volume_offset]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }
}

/// Runs a frame of the pass with wgpu, recording into the host's encoder.
pub struct WgpuCompositor<'a> {
    pass: &'a InscatteringPass,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: &'a mut wgpu::CommandEncoder,
    target_view: &'a wgpu::TextureView,
    buffers: Option<FrameBuffers>,
    bind_group: Option<wgpu::BindGroup>,
}

impl<'a> WgpuCompositor<'a> {
    /// Creates a compositor drawing onto `target_view`.
    pub fn new(
        pass: &'a InscatteringPass,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        encoder: &'a mut wgpu::CommandEncoder,
        target_view: &'a wgpu::TextureView,
    ) -> Self {
        Self {
            pass,
            device,
            queue,
            encoder,
            target_view,
            buffers: None,
            bind_group: None,
        }
    }
}

impl CompositeBackend for WgpuCompositor<'_> {
    type Temporary = TemporaryTarget;

    fn acquire_temporary(
        &mut self,
        target: &TargetDescriptor,
        filter: TargetFilter,
    ) -> RenderResult<TemporaryTarget> {
        if filter != self.pass.filter() {
            return Err(RenderError::TextureCreationFailed(format!(
                "pass was created for {:?} filtering, frame requests {filter:?}",
                self.pass.filter()
            )));
        }
        self.buffers = None;
        self.bind_group = None;
        self.pass.create_temporary(self.device, self.encoder, target)
    }

    fn configure(&mut self, globals: &GlobalParams, draw_count: usize) -> RenderResult<()> {
        self.buffers = Some(
            self.pass
                .create_frame_buffers(self.device, globals, draw_count),
        );
        self.bind_group = None;
        Ok(())
    }

    fn draw_volume(
        &mut self,
        temporary: &TemporaryTarget,
        index: usize,
        draw: &VolumeDraw,
    ) -> RenderResult<()> {
        let buffers = self
            .buffers
            .as_ref()
            .ok_or_else(|| RenderError::DrawFailed(format!("draw {index} before configure")))?;
        let offset = self.pass.write_volume(self.queue, buffers, index, draw)?;
        let bind_group = self.bind_group.get_or_insert_with(|| {
            self.pass
                .create_bind_group(self.device, buffers, temporary.view())
        });
        self.pass
            .render(self.encoder, self.target_view, bind_group, offset);
        Ok(())
    }

    fn release_temporary(&mut self, temporary: TemporaryTarget) {
        // Recorded commands keep the texture and buffers alive until they complete.
        log::trace!(
            "released {}x{} inscattering temporary",
            temporary.texture().width(),
            temporary.texture().height()
        );
        self.bind_group = None;
        self.buffers = None;
        drop(temporary);
    }
}

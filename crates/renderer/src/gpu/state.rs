use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use bytemuck::bytes_of;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::model::NormalizedModel;
use crate::showcase::Frame;
use crate::types::Antialiasing;

use super::context::{GpuContext, DEPTH_FORMAT, OFFSCREEN_FORMAT};
use super::pipeline::{BlurPipelines, ScenePipeline};
use super::uniforms::{view_projection, BlurUniforms, SceneUniforms};

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct LayerSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Offscreen scene, depth and blur targets sized for one density.
struct OffscreenTargets {
    width: u32,
    height: u32,
    msaa_view: Option<wgpu::TextureView>,
    scene_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    intermediate_view: wgpu::TextureView,
    horizontal_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
}

pub(crate) struct GpuState {
    context: GpuContext,
    scene: ScenePipeline,
    blur: BlurPipelines,
    meshes: HashMap<String, GpuMesh>,
    layers: Vec<LayerSlot>,
    horizontal_uniforms: wgpu::Buffer,
    composite_uniforms: wgpu::Buffer,
    targets: Option<OffscreenTargets>,
}

impl GpuState {
    pub(crate) fn new(window: Arc<Window>, antialiasing: Antialiasing) -> Result<Self> {
        let context = GpuContext::new(window, antialiasing)?;
        let scene = ScenePipeline::new(&context.device, context.sample_count);
        let blur = BlurPipelines::new(&context.device, context.surface_format);
        let blur_buffer = |label: &str| {
            context.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<BlurUniforms>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let horizontal_uniforms = blur_buffer("blur horizontal uniforms");
        let composite_uniforms = blur_buffer("blur composite uniforms");

        Ok(Self {
            context,
            scene,
            blur,
            meshes: HashMap::new(),
            layers: Vec::new(),
            horizontal_uniforms,
            composite_uniforms,
            targets: None,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn render(
        &mut self,
        frame: &Frame,
        scale_factor: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        let density = frame.preset.density.clamp(scale_factor);
        let (width, height) = self.target_size(scale_factor, density);
        self.ensure_targets(width, height);

        for layer in &frame.layers {
            if !self.meshes.contains_key(&layer.asset_id) {
                let mesh = self.upload_mesh(&layer.asset_id, &layer.model);
                self.meshes.insert(layer.asset_id.clone(), mesh);
            }
        }
        while self.layers.len() < frame.layers.len() {
            let slot = self.create_layer_slot();
            self.layers.push(slot);
        }

        let view_proj = view_projection(width, height);
        for (layer, slot) in frame.layers.iter().zip(&self.layers) {
            let uniforms = SceneUniforms::new(
                view_proj,
                layer.transform,
                frame.preset,
                layer.model.mesh.base_color,
                layer.opacity,
            );
            self.context
                .queue
                .write_buffer(&slot.buffer, 0, bytes_of(&uniforms));
        }

        // Blur radii are in logical pixels; the target has `density` texels
        // per logical pixel.
        let sigma = frame.blur.pixels() * density;
        self.context.queue.write_buffer(
            &self.horizontal_uniforms,
            0,
            bytes_of(&BlurUniforms::horizontal(width, sigma)),
        );
        self.context.queue.write_buffer(
            &self.composite_uniforms,
            0,
            bytes_of(&BlurUniforms::composite(height, sigma, frame.theme)),
        );

        let Some(targets) = self.targets.as_ref() else {
            return Ok(());
        };
        let output = self.context.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("showcase frame"),
            });

        let (view, resolve_target) = match targets.msaa_view.as_ref() {
            Some(msaa) => (msaa, Some(&targets.scene_view)),
            None => (&targets.scene_view, None),
        };
        let opacities = frame.layers.iter().map(|layer| layer.opacity);
        for step in scene_passes(opacities) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: step.color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                // Each layer gets a fresh depth buffer; a fading model must
                // not occlude the one replacing it.
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let Some(index) = step.layer else {
                continue;
            };
            let (Some(layer), Some(slot)) = (frame.layers.get(index), self.layers.get(index))
            else {
                continue;
            };
            let Some(mesh) = self.meshes.get(&layer.asset_id) else {
                continue;
            };
            pass.set_pipeline(&self.scene.pipeline);
            pass.set_bind_group(0, &slot.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        fullscreen_pass(
            &mut encoder,
            "blur horizontal pass",
            &targets.intermediate_view,
            &self.blur.horizontal,
            &targets.horizontal_bind_group,
        );
        fullscreen_pass(
            &mut encoder,
            "blur composite pass",
            &surface_view,
            &self.blur.composite,
            &targets.composite_bind_group,
        );

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Logical window size times the preset density, within device limits.
    fn target_size(&self, scale_factor: f64, density: f32) -> (u32, u32) {
        let scale_factor = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let max = self.context.max_texture_dimension.max(1);
        let scale = |physical: u32| {
            let logical = physical as f64 / scale_factor;
            ((logical * density as f64).round() as u32).clamp(1, max)
        };
        (scale(self.context.size.width), scale(self.context.size.height))
    }

    fn ensure_targets(&mut self, width: u32, height: u32) {
        if let Some(targets) = self.targets.as_ref() {
            if targets.width == width && targets.height == height {
                return;
            }
        }
        tracing::debug!(width, height, "allocating offscreen targets");

        let device = &self.context.device;
        let sample_count = self.context.sample_count;
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let msaa_view = (sample_count > 1).then(|| {
            create_view(
                device,
                "scene msaa target",
                (width, height),
                OFFSCREEN_FORMAT,
                sample_count,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });
        let scene_view = create_view(
            device,
            "scene target",
            (width, height),
            OFFSCREEN_FORMAT,
            1,
            sampled,
        );
        let depth_view = create_view(
            device,
            "scene depth",
            (width, height),
            DEPTH_FORMAT,
            sample_count,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let intermediate_view = create_view(
            device,
            "blur intermediate",
            (width, height),
            OFFSCREEN_FORMAT,
            1,
            sampled,
        );

        let blur_bind_group = |label: &str, uniforms: &wgpu::Buffer, source: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.blur.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.blur.sampler),
                    },
                ],
            })
        };
        let horizontal_bind_group =
            blur_bind_group("blur horizontal bind group", &self.horizontal_uniforms, &scene_view);
        let composite_bind_group = blur_bind_group(
            "blur composite bind group",
            &self.composite_uniforms,
            &intermediate_view,
        );

        self.targets = Some(OffscreenTargets {
            width,
            height,
            msaa_view,
            scene_view,
            depth_view,
            intermediate_view,
            horizontal_bind_group,
            composite_bind_group,
        });
    }

    fn upload_mesh(&self, asset_id: &str, model: &NormalizedModel) -> GpuMesh {
        let device = &self.context.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{asset_id} vertices")),
            contents: bytemuck::cast_slice(&model.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{asset_id} indices")),
            contents: bytemuck::cast_slice(&model.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        tracing::debug!(
            asset = asset_id,
            vertices = model.mesh.vertices.len(),
            indices = model.mesh.indices.len(),
            "uploaded mesh"
        );
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: model.mesh.indices.len() as u32,
        }
    }

    fn create_layer_slot(&self) -> LayerSlot {
        let device = &self.context.device;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene layer uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene layer bind group"),
            layout: &self.scene.layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        LayerSlot { buffer, bind_group }
    }
}

/// One scene render pass: the layer it draws and how it treats the colour
/// already in the target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScenePass {
    layer: Option<usize>,
    color_load: wgpu::LoadOp<wgpu::Color>,
}

/// A pass per visible layer, back to front. The first pass clears the target
/// and later ones blend over it. With nothing visible a single clearing pass
/// remains so the blur never samples a stale frame.
fn scene_passes(opacities: impl IntoIterator<Item = f32>) -> Vec<ScenePass> {
    let mut passes: Vec<ScenePass> = opacities
        .into_iter()
        .enumerate()
        .filter(|(_, opacity)| *opacity > 0.0)
        .map(|(index, _)| ScenePass {
            layer: Some(index),
            color_load: wgpu::LoadOp::Load,
        })
        .collect();
    match passes.first_mut() {
        Some(first) => first.color_load = wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
        None => passes.push(ScenePass {
            layer: None,
            color_load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
        }),
    }
    passes
}

fn create_view(
    device: &wgpu::Device,
    label: &str,
    (width, height): (u32, u32),
    format: wgpu::TextureFormat,
    sample_count: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

//! Multi-material mesh renderer.
//!
//! All groups share one vertex buffer. Group index lists are concatenated
//! into one index buffer; each group draws its own range with its own
//! texture bound at group(1).

use std::collections::HashMap;

use asset::{Mesh, ModelAsset, VertexStream};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferSize, BufferUsages, ColorTargetState,
    ColorWrites, DepthBiasState, DepthStencilState, Device, FragmentState, IndexFormat,
    PipelineLayoutDescriptor, Queue, RenderPass, RenderPipeline, RenderPipelineDescriptor,
    ShaderStages, TextureFormat, VertexBufferLayout, VertexState, VertexStepMode,
    util::DeviceExt,
};

use crate::DEPTH_FORMAT;
use crate::error::RenderResult;
use crate::shader::{ProgramKind, ShaderCache, checked_pipeline};
use crate::texture::{GpuTexture, texture_bind_group, texture_bind_group_layout};

/// Vertex: position + texcoord.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

impl TexturedVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<TexturedVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };
}

/// MVP UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    mvp: [[f32; 4]; 4],
}

/// One indexed draw: a contiguous range of the shared index buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialBatch {
    pub name: String,
    pub first_index: u32,
    pub index_count: u32,
    /// Diffuse texture file, `None` for the fallback texture.
    pub texture: Option<String>,
}

/// Interleave positions and texcoords. The stream must already be reconciled.
pub fn interleave(stream: &VertexStream) -> Vec<TexturedVertex> {
    stream
        .positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| TexturedVertex {
            pos,
            uv: stream.texcoords.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect()
}

/// Concatenate group index lists in draw order and describe each group's range.
pub fn build_batches(mesh: &Mesh) -> (Vec<u32>, Vec<MaterialBatch>) {
    let mut indices = Vec::with_capacity(mesh.total_group_indices());
    let mut batches = Vec::with_capacity(mesh.groups.len());
    for group in &mesh.groups {
        batches.push(MaterialBatch {
            name: group.name.clone(),
            first_index: indices.len() as u32,
            index_count: group.indices.len() as u32,
            texture: group.diffuse_map().map(str::to_owned),
        });
        indices.extend_from_slice(&group.indices);
    }
    (indices, batches)
}

/// Uniform-buffer layout at group(0), binding 0.
pub(crate) fn uniform_layout(
    device: &Device,
    label: &str,
    size: u64,
    visibility: ShaderStages,
) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: BufferSize::new(size),
            },
            count: None,
        }],
    })
}

struct GpuBatch {
    batch: MaterialBatch,
    /// Index into `MeshRenderer::textures`.
    slot: usize,
    bind_group: BindGroup,
}

pub struct MeshRenderer {
    pipeline: RenderPipeline,
    vertex_buf: Buffer,
    index_buf: Buffer,
    camera_buf: Buffer,
    camera_bg: BindGroup,
    batches: Vec<GpuBatch>,
    // Index 0 is the fallback.
    textures: Vec<GpuTexture>,
}

impl MeshRenderer {
    /// Upload geometry and textures and build the pipeline for `color_format`.
    pub fn new(
        device: &Device,
        queue: &Queue,
        shaders: &mut ShaderCache,
        color_format: TextureFormat,
        model: &ModelAsset,
    ) -> RenderResult<Self> {
        let shader = shaders.get_or_compile(device, ProgramKind::Textured)?;

        let camera_bgl = uniform_layout(
            device,
            "Mesh Camera BGL",
            std::mem::size_of::<CameraUniform>() as u64,
            ShaderStages::VERTEX,
        );
        let texture_bgl = texture_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&camera_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = checked_pipeline(device, "Mesh Pipeline", || {
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("Mesh Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[TexturedVertex::LAYOUT],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(ColorTargetState {
                        format: color_format,
                        blend: Some(BlendState::REPLACE),
                        write_mask: ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                // OBJ exports do not guarantee consistent winding.
                primitive: wgpu::PrimitiveState {
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let camera_init = CameraUniform {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Camera UBO"),
            contents: bytemuck::bytes_of(&camera_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Camera BG"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        let vertices = interleave(&model.mesh.stream);
        let (indices, batches) = build_batches(&model.mesh);
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh IB"),
            contents: bytemuck::cast_slice(&indices),
            usage: BufferUsages::INDEX,
        });

        // One GPU texture per distinct file; groups without one share the fallback.
        let mut textures = vec![GpuTexture::fallback(device, queue)?];
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for named in &model.textures {
            match GpuTexture::upload(device, queue, &named.name, &named.data) {
                Ok(tex) => {
                    slots.insert(named.name.as_str(), textures.len());
                    textures.push(tex);
                }
                Err(err) => log::warn!("{err}; using fallback texture"),
            }
        }

        let batches = batches
            .into_iter()
            .map(|batch| {
                let slot = batch
                    .texture
                    .as_deref()
                    .and_then(|file| slots.get(file).copied())
                    .unwrap_or(0);
                if slot == 0 {
                    log::debug!("Group '{}' uses the fallback texture", batch.name);
                }
                let tex = &textures[slot];
                let bind_group = texture_bind_group(
                    device,
                    &texture_bgl,
                    &tex.view,
                    &tex.sampler,
                    &format!("Material BG {}", batch.name),
                );
                GpuBatch {
                    batch,
                    slot,
                    bind_group,
                }
            })
            .collect::<Vec<_>>();

        log::info!(
            "Mesh renderer ready: {} vertices, {} indices, {} batches, {} textures",
            vertices.len(),
            indices.len(),
            batches.len(),
            textures.len()
        );

        Ok(Self {
            pipeline,
            vertex_buf,
            index_buf,
            camera_buf,
            camera_bg,
            batches,
            textures,
        })
    }

    pub fn batches(&self) -> impl Iterator<Item = &MaterialBatch> {
        self.batches.iter().map(|b| &b.batch)
    }

    /// GPU textures held, the fallback included.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Whether the named group draws with the fallback texture.
    pub fn uses_fallback(&self, group: &str) -> Option<bool> {
        self.batches
            .iter()
            .find(|b| b.batch.name == group)
            .map(|b| b.slot == 0)
    }

    /// Record one indexed draw per material group.
    ///
    /// The MVP goes through a single uniform buffer, and `queue.write_buffer`
    /// lands at the next submit, so each pass that calls this must be
    /// submitted before the next call.
    pub fn draw(&self, queue: &Queue, rpass: &mut RenderPass<'_>, mvp: Mat4) {
        let cam = CameraUniform {
            mvp: mvp.to_cols_array_2d(),
        };
        queue.write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&cam));

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.camera_bg, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        rpass.set_index_buffer(self.index_buf.slice(..), IndexFormat::Uint32);
        for gpu in &self.batches {
            let b = &gpu.batch;
            rpass.set_bind_group(1, &gpu.bind_group, &[]);
            rpass.draw_indexed(b.first_index..b.first_index + b.index_count, 0, 0..1);
        }
    }
}

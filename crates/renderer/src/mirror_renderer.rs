//! Mirror quad renderer.
//!
//! Draws a fixed 10x10 quad in its local XY plane, textured with whatever
//! view was last passed to [`MirrorRenderer::set_texture`] (normally the
//! reflection target's color attachment).

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayout, BlendState, Buffer, BufferUsages, ColorTargetState, ColorWrites,
    DepthBiasState, DepthStencilState, Device, FragmentState, IndexFormat,
    PipelineLayoutDescriptor, Queue, RenderPass, RenderPipeline, RenderPipelineDescriptor,
    Sampler, ShaderStages, TextureFormat, TextureView, VertexState, util::DeviceExt,
};

use crate::DEPTH_FORMAT;
use crate::error::RenderResult;
use crate::mesh_renderer::{TexturedVertex, uniform_layout};
use crate::shader::{ProgramKind, ShaderCache, checked_pipeline};
use crate::texture::{create_sampler, texture_bind_group, texture_bind_group_layout};

/// Border and back-face appearance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirrorStyle {
    /// RGBA; alpha is how strongly the border replaces the reflection.
    pub tint: [f32; 4],
    /// Border width as a fraction of the quad's UV extent.
    pub edge_margin: f32,
    /// Back face is an opaque tint fill instead of the reflection.
    pub two_sided: bool,
}

impl Default for MirrorStyle {
    fn default() -> Self {
        Self {
            tint: [1.0, 1.0, 1.0, 1.0],
            edge_margin: 0.05,
            two_sided: false,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct MirrorUniform {
    mvp: [[f32; 4]; 4],
    tint: [f32; 4],
    edge_margin: f32,
    two_sided: u32,
    _pad: [u32; 2],
}

impl MirrorUniform {
    fn new(mvp: Mat4, style: &MirrorStyle) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            tint: style.tint,
            edge_margin: style.edge_margin,
            two_sided: u32::from(style.two_sided),
            _pad: [0; 2],
        }
    }
}

/// Quad corners (CCW seen from +Z) and indices.
///
/// `u` runs right to left: the reflection is rendered by a camera facing the
/// other way, so its image is mirrored horizontally. `v = 0` is the top row of
/// the render target.
pub fn quad_geometry() -> ([TexturedVertex; 4], [u16; 6]) {
    #[rustfmt::skip]
    let v = [
        TexturedVertex { pos: [-5.0,  5.0, 0.0], uv: [1.0, 0.0] }, // top left
        TexturedVertex { pos: [-5.0, -5.0, 0.0], uv: [1.0, 1.0] }, // bottom left
        TexturedVertex { pos: [ 5.0, -5.0, 0.0], uv: [0.0, 1.0] }, // bottom right
        TexturedVertex { pos: [ 5.0,  5.0, 0.0], uv: [0.0, 0.0] }, // top right
    ];
    (v, [0, 1, 2, 0, 2, 3])
}

pub struct MirrorRenderer {
    pipeline: RenderPipeline,
    vertex_buf: Buffer,
    index_buf: Buffer,
    uniform_buf: Buffer,
    uniform_bg: BindGroup,
    texture_bgl: BindGroupLayout,
    sampler: Sampler,
    texture_bg: Option<BindGroup>,
    style: MirrorStyle,
}

impl MirrorRenderer {
    pub fn new(
        device: &Device,
        shaders: &mut ShaderCache,
        color_format: TextureFormat,
        style: MirrorStyle,
    ) -> RenderResult<Self> {
        let shader = shaders.get_or_compile(device, ProgramKind::Mirror)?;

        let uniform_bgl = uniform_layout(
            device,
            "Mirror Uniform BGL",
            std::mem::size_of::<MirrorUniform>() as u64,
            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
        );
        let texture_bgl = texture_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mirror PipelineLayout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = checked_pipeline(device, "Mirror Pipeline", || {
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("Mirror Pipeline"),
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
                        blend: Some(BlendState::ALPHA_BLENDING),
                        write_mask: ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                // Both faces are drawn; the fragment stage tells them apart.
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

        let (vertices, indices) = quad_geometry();
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mirror VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mirror IB"),
            contents: bytemuck::cast_slice(&indices),
            usage: BufferUsages::INDEX,
        });

        let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mirror UBO"),
            contents: bytemuck::bytes_of(&MirrorUniform::new(Mat4::IDENTITY, &style)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let uniform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mirror Uniform BG"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            vertex_buf,
            index_buf,
            uniform_buf,
            uniform_bg,
            texture_bgl,
            sampler: create_sampler(device, "Mirror Sampler"),
            texture_bg: None,
            style,
        })
    }

    /// Sample `view` from now on. The view is owned by the caller.
    pub fn set_texture(&mut self, device: &Device, view: &TextureView) {
        self.texture_bg = Some(texture_bind_group(
            device,
            &self.texture_bgl,
            view,
            &self.sampler,
            "Mirror Texture BG",
        ));
    }

    pub fn has_texture(&self) -> bool {
        self.texture_bg.is_some()
    }

    pub fn style(&self) -> &MirrorStyle {
        &self.style
    }

    /// Draw the quad. Nothing is recorded until a texture has been set.
    pub fn draw(&self, queue: &Queue, rpass: &mut RenderPass<'_>, mvp: Mat4) {
        let Some(texture_bg) = &self.texture_bg else {
            log::debug!("Mirror draw skipped: no texture set");
            return;
        };
        let uniform = MirrorUniform::new(mvp, &self.style);
        queue.write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniform));

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.uniform_bg, &[]);
        rpass.set_bind_group(1, texture_bg, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        rpass.set_index_buffer(self.index_buf.slice(..), IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_wgsl_layout() {
        // mat4 (64) + vec4 (16) + f32 + u32, rounded up to 16-byte alignment.
        assert_eq!(std::mem::size_of::<MirrorUniform>(), 96);
    }

    #[test]
    fn quad_is_two_ccw_triangles_facing_z() {
        let (v, idx) = quad_geometry();
        for tri in idx.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| glam::Vec3::from(v[i as usize].pos));
            let normal = (b - a).cross(c - a);
            assert!(normal.z > 0.0);
        }
    }

    #[test]
    fn quad_uvs_span_unit_square_mirrored() {
        let (v, _) = quad_geometry();
        // Left edge samples the right side of the reflection image.
        assert!(v.iter().filter(|p| p.pos[0] < 0.0).all(|p| p.uv[0] == 1.0));
        // Top edge samples the first rows of the render target.
        assert!(v.iter().filter(|p| p.pos[1] > 0.0).all(|p| p.uv[1] == 0.0));
    }

    #[test]
    fn style_flags_reach_uniform() {
        assert_eq!(MirrorUniform::new(Mat4::IDENTITY, &MirrorStyle::default()).two_sided, 0);
        let style = MirrorStyle {
            two_sided: true,
            ..MirrorStyle::default()
        };
        let u = MirrorUniform::new(Mat4::IDENTITY, &style);
        assert_eq!(u.two_sided, 1);
        assert!((u.edge_margin - 0.05).abs() < 1e-6);
    }
}

//! Renderer: wgpu programs, mesh/mirror renderers, reflection target and
//! the two-pass mirror scene.
//! wgpu = 26.x, winit = 0.30.x

pub mod error;
pub mod framebuffer;
pub mod gpu;
pub mod mesh_renderer;
pub mod mirror_renderer;
pub mod scene;
pub mod shader;
pub mod texture;

pub use error::{RenderError, RenderResult};
pub use framebuffer::ReflectionTarget;
pub use gpu::GpuContext;
pub use mesh_renderer::MeshRenderer;
pub use mirror_renderer::{MirrorRenderer, MirrorStyle};
pub use scene::SceneRenderer;
pub use shader::{ProgramKind, ShaderCache};
pub use texture::GpuTexture;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Background for both the reflection target and the window.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

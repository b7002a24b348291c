//! Two-pass mirror scene.
//!
//! Each frame runs, in order:
//! 1. reflection pass: mesh seen by the mirrored camera, into the reflection target;
//! 2. main pass: mesh seen by the primary camera, then the mirror quad sampling
//!    the reflection target, into the caller's view.
//!
//! The passes are submitted separately. Submission order is what makes the
//! reflection visible to the main pass, and it also lets the mesh renderer
//! reuse one uniform buffer for both MVPs.

use std::time::Instant;

use asset::ModelAsset;
use corelib::SceneConfig;
use corelib::animation::RotationClock;
use corelib::scene::{FrameTransforms, SceneRig};
use wgpu::{
    CommandEncoderDescriptor, Device, LoadOp, Operations, Queue, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp, TextureFormat, TextureView,
};

use crate::error::RenderResult;
use crate::framebuffer::{ReflectionTarget, create_depth_view};
use crate::mesh_renderer::MeshRenderer;
use crate::mirror_renderer::{MirrorRenderer, MirrorStyle};
use crate::shader::ShaderCache;
use crate::CLEAR_COLOR;

struct Mirror {
    renderer: MirrorRenderer,
    target: ReflectionTarget,
    /// Target generation the mirror's texture bind group was built from.
    bound_generation: Option<u64>,
}

pub struct SceneRenderer {
    config: SceneConfig,
    rig: SceneRig,
    clock: RotationClock,
    last_frame: Option<Instant>,
    mesh: MeshRenderer,
    mirror: Option<Mirror>,
    depth_view: TextureView,
    width: u32,
    height: u32,
}

impl SceneRenderer {
    /// Build every GPU resource for the scene. Shader or framebuffer
    /// failures abort construction; nothing is drawn in that case.
    pub fn on_surface_created(
        device: &Device,
        queue: &Queue,
        color_format: TextureFormat,
        (width, height): (u32, u32),
        model: &ModelAsset,
        config: SceneConfig,
    ) -> RenderResult<Self> {
        let width = width.max(1);
        let height = height.max(1);

        let mut shaders = ShaderCache::new();
        let mesh = MeshRenderer::new(device, queue, &mut shaders, color_format, model)?;

        let mirror = if config.mirror_enabled {
            let style = MirrorStyle {
                two_sided: config.two_sided_mirror,
                ..MirrorStyle::default()
            };
            Some(Mirror {
                renderer: MirrorRenderer::new(device, &mut shaders, color_format, style)?,
                target: ReflectionTarget::new(device, color_format, width, height)?,
                bound_generation: None,
            })
        } else {
            log::info!("Mirror disabled; rendering the mesh only");
            None
        };

        let mut rig = SceneRig::new(&config);
        rig.set_viewport(width, height);

        Ok(Self {
            clock: RotationClock::new(config.rotation_speed),
            config,
            rig,
            last_frame: None,
            mesh,
            mirror,
            depth_view: create_depth_view(device, "MainDepth", width, height),
            width,
            height,
        })
    }

    /// Viewport changed: new projection aspect, main depth buffer and reflection target.
    pub fn on_surface_changed(&mut self, device: &Device, width: u32, height: u32) -> RenderResult<()> {
        self.width = width.max(1);
        self.height = height.max(1);
        self.rig.set_viewport(self.width, self.height);
        self.depth_view = create_depth_view(device, "MainDepth", self.width, self.height);
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.target.create_or_resize(device, self.width, self.height)?;
        }
        Ok(())
    }

    /// Render one frame into `target`, advancing the rotation by the time
    /// since the previous frame.
    pub fn on_draw_frame(&mut self, device: &Device, queue: &Queue, target: &TextureView) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|prev| now.duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.draw_frame_with_delta(device, queue, target, dt);
    }

    /// Same as [`Self::on_draw_frame`] with an explicit frame delta in seconds.
    pub fn draw_frame_with_delta(&mut self, device: &Device, queue: &Queue, target: &TextureView, dt: f32) {
        self.clock.advance(dt);
        let frame = self.transforms();

        if let Some(mirror) = self.mirror.as_mut() {
            let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
                label: Some("ReflectionEncoder"),
            });
            {
                let mut rpass = mirror.target.begin_pass(&mut encoder, CLEAR_COLOR);
                self.mesh.draw(queue, &mut rpass, frame.reflected_mesh_mvp);
            }
            queue.submit(Some(encoder.finish()));

            if mirror.bound_generation != Some(mirror.target.generation()) {
                mirror.renderer.set_texture(device, mirror.target.color_view());
                mirror.bound_generation = Some(mirror.target.generation());
            }
        }

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("MainEncoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.mesh.draw(queue, &mut rpass, frame.mesh_mvp);
            if let Some(mirror) = self.mirror.as_ref() {
                mirror.renderer.draw(queue, &mut rpass, frame.mirror_mvp);
            }
        }
        queue.submit(Some(encoder.finish()));
    }

    /// Transforms for the current rotation angle.
    pub fn transforms(&self) -> FrameTransforms {
        self.rig.frame(self.clock.angle_deg(), self.config.model_scale)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn angle_deg(&self) -> f32 {
        self.clock.angle_deg()
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reflection target generation the mirror currently samples, if any.
    pub fn mirror_bound_generation(&self) -> Option<u64> {
        self.mirror.as_ref().and_then(|m| m.bound_generation)
    }

    /// Reflection target, if the mirror is enabled.
    pub fn reflection_target(&self) -> Option<&ReflectionTarget> {
        self.mirror.as_ref().map(|m| &m.target)
    }
}

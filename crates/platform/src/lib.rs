//! Platform layer: window, event loop and the frame cycle that drives the
//! mirror scene.
//!
//! The host owns the window and GPU context; the scene only sees the three
//! hooks `on_surface_created`, `on_surface_changed` and `on_draw_frame`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::ModelAsset;
use corelib::SceneConfig;
use renderer::{GpuContext, SceneRenderer};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

/// Everything the host needs to open a window and build the scene.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    /// OBJ file to display. `None` shows the built-in demo cube.
    pub obj: Option<PathBuf>,
    /// Explicit MTL file; otherwise the OBJ's `mtllib` is followed.
    pub mtl: Option<PathBuf>,
    pub scene: SceneConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
            obj: None,
            mtl: None,
            scene: SceneConfig::default(),
        }
    }
}

/// Load the model named by `options`, logging recoverable issues.
pub fn load_model(options: &RunOptions) -> Result<ModelAsset> {
    let model = match &options.obj {
        Some(obj) => ModelAsset::load(obj, options.mtl.as_deref())
            .with_context(|| format!("loading model {}", obj.display()))?,
        None => {
            log::info!("No --obj given, showing the demo cube");
            ModelAsset::demo_cube().context("building demo cube")?
        }
    };
    if !model.issues.is_empty() {
        log::warn!("Model loaded with {} recovered issue(s)", model.issues.len());
    }
    Ok(model)
}

struct Host {
    options: RunOptions,
    model: ModelAsset,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    scene: Option<SceneRenderer>,
    error: Option<anyhow::Error>,
}

impl Host {
    fn new(options: RunOptions, model: ModelAsset) -> Self {
        Self {
            options,
            model,
            window: None,
            gpu: None,
            scene: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = WindowAttributes::default()
            .with_title("Mirror Scene")
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height))
            .with_resizable(true);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("creating window")?,
        );
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let gpu = pollster::block_on(GpuContext::new(window.clone(), self.options.backends))?;
        let scene = SceneRenderer::on_surface_created(
            &gpu.device,
            &gpu.queue,
            gpu.format(),
            gpu.size(),
            &self.model,
            self.options.scene.clone(),
        )?;

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.scene = Some(scene);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let (Some(gpu), Some(scene)) = (self.gpu.as_mut(), self.scene.as_mut()) else {
            return Ok(());
        };
        gpu.resize(width, height);
        let (w, h) = gpu.size();
        scene.on_surface_changed(&gpu.device, w, h)?;
        log::debug!("Surface resized to {w}x{h}");
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(scene)) = (self.gpu.as_mut(), self.scene.as_mut()) else {
            return;
        };
        let frame = match gpu.acquire() {
            Ok(frame) => frame,
            Err(err) if GpuContext::is_surface_lost(&err) => {
                log::warn!("Surface {err:?}; reconfiguring");
                gpu.recreate_surface();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout; skipping frame");
                return;
            }
            Err(err) => {
                let err = anyhow!("surface error: {err:?}");
                self.fail(event_loop, err);
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        scene.on_draw_frame(&gpu.device, &gpu.queue, &view);
        if let Some(window) = &self.window {
            window.pre_present_notify();
        }
        frame.present();
    }
}

impl ApplicationHandler for Host {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(err) = self.resize(size.width, size.height) {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {scale_factor:.3}");
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Open a window and render the mirror scene until it is closed.
pub fn run_with_renderer(options: RunOptions) -> Result<()> {
    let model = load_model(&options)?;

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut host = Host::new(options, model);
    event_loop
        .run_app(&mut host)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match host.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_show_demo_cube() {
        let opts = RunOptions::default();
        assert!(opts.obj.is_none());
        let model = load_model(&opts).unwrap();
        assert!(model.mesh.group("sides").is_some());
    }

    #[test]
    fn missing_obj_is_an_error() {
        let opts = RunOptions {
            obj: Some(PathBuf::from("/definitely/not/here.obj")),
            ..RunOptions::default()
        };
        let err = load_model(&opts).unwrap_err();
        assert!(format!("{err:#}").contains("here.obj"));
    }
}

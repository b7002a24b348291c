//! Entry point: logging, CLI flags and the mirror scene window.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use corelib::{MirrorOrientation, SceneConfig};
use platform::RunOptions;

fn parse_backend(val: &str) -> wgpu::Backends {
    // Accept: auto|vulkan|dx12|metal|gl
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

fn parse_f32(flag: &str, val: &str) -> Result<f32> {
    val.parse::<f32>()
        .with_context(|| format!("{flag} expects a number, got '{val}'"))
}

fn parse_args<I>(args: I) -> Result<RunOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut opts = RunOptions::default();
    let mut scene = SceneConfig::builder();
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--gpu-backend=") {
            opts.backends = parse_backend(v);
        } else if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        } else if let Some(v) = arg.strip_prefix("--obj=") {
            opts.obj = Some(PathBuf::from(v));
        } else if let Some(v) = arg.strip_prefix("--mtl=") {
            opts.mtl = Some(PathBuf::from(v));
        } else if arg == "--no-mirror" {
            scene = scene.mirror_enabled(false);
        } else if let Some(v) = arg.strip_prefix("--rotation-speed=") {
            scene = scene.rotation_speed(parse_f32("--rotation-speed", v)?);
        } else if let Some(v) = arg.strip_prefix("--model-scale=") {
            scene = scene.model_scale(parse_f32("--model-scale", v)?);
        } else if let Some(v) = arg.strip_prefix("--mirror-facing=") {
            let orientation = match v.to_ascii_lowercase().as_str() {
                "camera" => MirrorOrientation::FacingCamera,
                "away" => MirrorOrientation::FacingAway,
                other => bail!("--mirror-facing expects camera|away, got '{other}'"),
            };
            scene = scene.mirror_orientation(orientation);
        } else if arg == "--two-sided-mirror" {
            scene = scene.two_sided_mirror(true);
        } else if let Some(v) = arg.strip_prefix("--two-sided-mirror=") {
            let two_sided = match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                other => bail!("--two-sided-mirror expects on|off, got '{other}'"),
            };
            scene = scene.two_sided_mirror(two_sided);
        } else {
            log::warn!("Ignoring unknown argument '{}'", arg);
        }
    }

    opts.width = w.unwrap_or(opts.width).max(1);
    opts.height = h.unwrap_or(opts.height).max(1);
    opts.scene = scene.build()?;
    Ok(opts)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = parse_args(std::env::args().skip(1))?;
    log::info!(
        "Starting mirror scene. Backend: {:?}, window_size={}x{}, model={}, mirror={}",
        opts.backends,
        opts.width,
        opts.height,
        opts.obj
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "demo cube".into()),
        opts.scene.mirror_enabled
    );

    platform::run_with_renderer(opts)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

//! Core types: math re-exports, Transform, Camera, mirror plane, scene config.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

use thiserror::Error;

pub mod animation;
pub mod camera;
pub mod config;
pub mod plane;
pub mod scene;
pub mod transform;

pub use config::{MirrorOrientation, SceneConfig, SceneConfigBuilder};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid scene config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

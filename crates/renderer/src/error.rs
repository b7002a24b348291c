use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// WGSL failed validation, or the pipeline built from it was rejected.
    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    #[error("reflection framebuffer {width}x{height} is incomplete: {message}")]
    FramebufferIncomplete {
        width: u32,
        height: u32,
        message: String,
    },

    /// Texture rejected by the device (too large, bad buffer).
    #[error("texture '{label}' could not be uploaded: {message}")]
    TextureUpload { label: String, message: String },

    #[error("failed to create surface: {0}")]
    CreateSurface(String),

    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(String),

    #[error("failed to request device: {0}")]
    RequestDevice(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

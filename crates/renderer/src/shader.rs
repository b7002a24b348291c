//! WGSL program cache.
//!
//! A program is compiled once per device and shared by every pipeline that
//! uses it. Modules are never recompiled in place; a failed compile leaves
//! nothing in the cache.

use std::collections::HashMap;

use wgpu::{Device, ErrorFilter, ShaderModule, ShaderModuleDescriptor, ShaderSource};

use crate::error::{RenderError, RenderResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Position + texcoord + MVP, samples a diffuse texture.
    Textured,
    /// Textured plus a flat tint mix for the mirror border and back face.
    Mirror,
}

impl ProgramKind {
    pub fn label(self) -> &'static str {
        match self {
            ProgramKind::Textured => "Textured WGSL",
            ProgramKind::Mirror => "Mirror WGSL",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            ProgramKind::Textured => include_str!("shaders/textured.wgsl"),
            ProgramKind::Mirror => include_str!("shaders/mirror.wgsl"),
        }
    }
}

#[derive(Default)]
pub struct ShaderCache {
    modules: HashMap<ProgramKind, ShaderModule>,
}

impl ShaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&mut self, device: &Device, kind: ProgramKind) -> RenderResult<&ShaderModule> {
        if !self.modules.contains_key(&kind) {
            let module = compile_wgsl(device, kind.label(), kind.source())?;
            log::info!("Compiled {}", kind.label());
            self.modules.insert(kind, module);
        }
        Ok(&self.modules[&kind])
    }

    pub fn contains(&self, kind: ProgramKind) -> bool {
        self.modules.contains_key(&kind)
    }
}

/// Compile WGSL, turning validation failures into [`RenderError::ShaderCompile`].
pub fn compile_wgsl(device: &Device, label: &str, source: &str) -> RenderResult<ShaderModule> {
    device.push_error_scope(ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(module),
        Some(err) => {
            log::error!("Shader '{}' rejected: {}", label, err);
            Err(RenderError::ShaderCompile {
                label: label.to_owned(),
                message: err.to_string(),
            })
        }
    }
}

/// Run `create` inside a validation scope; a rejected pipeline counts as a link failure.
pub(crate) fn checked_pipeline<T>(
    device: &Device,
    label: &str,
    create: impl FnOnce() -> T,
) -> RenderResult<T> {
    device.push_error_scope(ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => Err(RenderError::ShaderCompile {
            label: label.to_owned(),
            message: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programs_have_distinct_sources() {
        assert_ne!(ProgramKind::Textured.source(), ProgramKind::Mirror.source());
        for kind in [ProgramKind::Textured, ProgramKind::Mirror] {
            let src = kind.source();
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }

    #[test]
    fn mirror_program_has_edge_and_facing_logic() {
        let src = ProgramKind::Mirror.source();
        assert!(src.contains("front_facing"));
        assert!(src.contains("edge_margin"));
    }
}

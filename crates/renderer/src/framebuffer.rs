//! Off-screen reflection target: color texture + depth buffer sized to the viewport.
//!
//! "Binding" the target is beginning a render pass on it; dropping the
//! returned pass ends the redirection, so later passes cannot leak into it.

use wgpu::{
    Color, CommandEncoder, Device, ErrorFilter, Extent3d, LoadOp, Operations, RenderPass,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp,
    Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor,
};

use crate::DEPTH_FORMAT;
use crate::error::{RenderError, RenderResult};

/// Clamp zero sizes to 1 and reject sizes beyond the device limit.
pub fn validate_extent(max_dimension: u32, width: u32, height: u32) -> RenderResult<(u32, u32)> {
    let (w, h) = (width.max(1), height.max(1));
    if w > max_dimension || h > max_dimension {
        return Err(RenderError::FramebufferIncomplete {
            width: w,
            height: h,
            message: format!("exceeds max texture dimension {max_dimension}"),
        });
    }
    Ok((w, h))
}

/// Create a depth texture view of the given size.
pub fn create_depth_view(device: &Device, label: &str, width: u32, height: u32) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

pub struct ReflectionTarget {
    format: TextureFormat,
    color: Texture,
    color_view: TextureView,
    depth_view: TextureView,
    generation: u64,
}

impl ReflectionTarget {
    pub fn new(device: &Device, format: TextureFormat, width: u32, height: u32) -> RenderResult<Self> {
        let (color, color_view, depth_view) = create_attachments(device, format, width, height)?;
        log::info!("Reflection target created: {}x{}", color.width(), color.height());
        Ok(Self {
            format,
            color,
            color_view,
            depth_view,
            generation: 0,
        })
    }

    /// Reallocate both attachments when the size changed. Returns `true` if it did.
    ///
    /// On failure the previous attachments are kept.
    pub fn create_or_resize(&mut self, device: &Device, width: u32, height: u32) -> RenderResult<bool> {
        let wanted = (width.max(1), height.max(1));
        if wanted == self.size() {
            return Ok(false);
        }
        let (color, color_view, depth_view) =
            create_attachments(device, self.format, width, height)?;
        // Old texture and views drop here; nothing else holds them.
        self.color = color;
        self.color_view = color_view;
        self.depth_view = depth_view;
        self.generation += 1;
        log::info!(
            "Reflection target resized: {}x{} (generation {})",
            wanted.0,
            wanted.1,
            self.generation
        );
        Ok(true)
    }

    /// Redirect drawing into this target until the returned pass is dropped.
    pub fn begin_pass<'e>(&self, encoder: &'e mut CommandEncoder, clear: Color) -> RenderPass<'e> {
        encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("ReflectionPass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &self.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(clear),
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
        })
    }

    /// Color attachment to sample from once the reflection pass is submitted.
    pub fn color_view(&self) -> &TextureView {
        &self.color_view
    }

    pub fn color_texture(&self) -> &Texture {
        &self.color
    }

    pub fn size(&self) -> (u32, u32) {
        (self.color.width(), self.color.height())
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Incremented on every reallocation; sampler bind groups built from an
    /// older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn create_attachments(
    device: &Device,
    format: TextureFormat,
    width: u32,
    height: u32,
) -> RenderResult<(Texture, TextureView, TextureView)> {
    let (w, h) = validate_extent(device.limits().max_texture_dimension_2d, width, height)?;

    device.push_error_scope(ErrorFilter::Validation);
    let color = device.create_texture(&TextureDescriptor {
        label: Some("ReflectionColor"),
        size: Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let color_view = color.create_view(&TextureViewDescriptor::default());
    let depth_view = create_depth_view(device, "ReflectionDepth", w, h);

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        log::error!("Reflection target {}x{} rejected: {}", w, h, err);
        return Err(RenderError::FramebufferIncomplete {
            width: w,
            height: h,
            message: err.to_string(),
        });
    }
    Ok((color, color_view, depth_view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extent_clamps_to_one() {
        assert_eq!(validate_extent(2048, 0, 0).expect("clamped"), (1, 1));
        assert_eq!(validate_extent(2048, 640, 0).expect("clamped"), (640, 1));
    }

    #[test]
    fn oversized_extent_is_incomplete() {
        match validate_extent(2048, 4096, 16) {
            Err(RenderError::FramebufferIncomplete { width, height, .. }) => {
                assert_eq!((width, height), (4096, 16));
            }
            other => panic!("expected FramebufferIncomplete, got {other:?}"),
        }
    }
}

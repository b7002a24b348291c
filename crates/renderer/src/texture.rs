//! GPU textures: upload, sampler and the bind group layout shared by both programs.

use asset::TextureData;
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, Device,
    ErrorFilter, Extent3d, FilterMode, Origin3d, Queue, Sampler, SamplerBindingType,
    SamplerDescriptor, ShaderStages, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture,
    TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureView, TextureViewDescriptor, TextureViewDimension,
};

use crate::error::{RenderError, RenderResult};

/// Sampled 2D texture with its own linear/clamp sampler.
pub struct GpuTexture {
    pub texture: Texture,
    pub view: TextureView,
    pub sampler: Sampler,
}

impl GpuTexture {
    /// Upload RGBA8 pixels. Rows are flipped first so OBJ texcoords
    /// (origin bottom-left) address the image the right way up.
    ///
    /// Images the device cannot hold fail with [`RenderError::TextureUpload`].
    pub fn upload(
        device: &Device,
        queue: &Queue,
        label: &str,
        data: &TextureData,
    ) -> RenderResult<Self> {
        let max = device.limits().max_texture_dimension_2d;
        if !data.is_valid() || data.width > max || data.height > max {
            return Err(RenderError::TextureUpload {
                label: label.to_owned(),
                message: format!(
                    "{}x{} with {} bytes (device limit {max})",
                    data.width,
                    data.height,
                    data.data.len()
                ),
            });
        }

        let flipped = data.flipped_vertically();
        let size = Extent3d {
            width: flipped.width,
            height: flipped.height,
            depth_or_array_layers: 1,
        };
        device.push_error_scope(ErrorFilter::Validation);
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            &flipped.data,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(flipped.row_bytes() as u32),
                rows_per_image: Some(flipped.height),
            },
            size,
        );
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::TextureUpload {
                label: label.to_owned(),
                message: err.to_string(),
            });
        }

        let view = texture.create_view(&TextureViewDescriptor::default());
        let sampler = create_sampler(device, label);
        log::debug!("Uploaded texture '{}' {}x{}", label, flipped.width, flipped.height);

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    pub fn fallback(device: &Device, queue: &Queue) -> RenderResult<Self> {
        Self::upload(device, queue, "Fallback Texture", &TextureData::fallback())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Linear min/mag filtering, clamp-to-edge on both axes.
pub fn create_sampler(device: &Device, label: &str) -> Sampler {
    device.create_sampler(&SamplerDescriptor {
        label: Some(label),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        ..Default::default()
    })
}

/// group(1): texture at binding 0, sampler at binding 1.
pub fn texture_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Texture BGL"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn texture_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    view: &TextureView,
    sampler: &Sampler,
    label: &str,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(sampler),
            },
        ],
    })
}

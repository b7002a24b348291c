//! Texture loading and data structures.
//!
//! Decoded images are stored top row first, as the decoder delivers them.
//! OBJ texcoords put `v = 0` at the bottom, so [`TextureData::flipped_vertically`]
//! is applied once before upload.

use std::path::Path;

use crate::error::{AssetError, AssetResult};

/// Side length of the generated fallback texture.
pub const FALLBACK_SIZE: u32 = 64;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Wrap an RGBA8 pixel buffer, checking its length against the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> AssetResult<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(AssetError::TextureDecode {
                name: format!("{width}x{height} buffer"),
                message: format!("expected {expected} RGBA8 bytes, got {}", data.len()),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode an encoded image (PNG/JPEG) held in memory.
    pub fn decode(name: &str, bytes: &[u8]) -> AssetResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|e| AssetError::TextureDecode {
            name: name.to_owned(),
            message: e.to_string(),
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded texture '{}' {}x{}", name, width, height);

        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Load and decode an image file.
    pub fn load<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&path.display().to_string(), &bytes)
    }

    /// Checkerboard used when a material has no usable diffuse texture.
    pub fn fallback() -> Self {
        let size = FALLBACK_SIZE;
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let checker = ((x / 8) + (y / 8)) % 2;
                if checker == 0 {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    data.extend_from_slice(&[255, 105, 180, 255]);
                }
            }
        }

        Self {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
        }
    }

    /// Same image with rows in reverse order. A buffer that does not match
    /// its dimensions is returned unchanged.
    pub fn flipped_vertically(&self) -> Self {
        let data = match image::RgbaImage::from_raw(self.width, self.height, self.data.clone()) {
            Some(img) => image::imageops::flip_vertical(&img).into_raw(),
            None => {
                log::warn!(
                    "Texture buffer of {} bytes does not match {}x{}; not flipped",
                    self.data.len(),
                    self.width,
                    self.height
                );
                self.data.clone()
            }
        };
        Self {
            data,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    #[inline]
    pub fn row_bytes(&self) -> usize {
        (self.width * self.bytes_per_pixel()) as usize
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = self.row_bytes() * self.height as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

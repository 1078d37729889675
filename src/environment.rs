//! Equirectangular environment maps for the portrait shader.
//!
//! The portrait samples its reflection from a 2D equirectangular texture at
//! a mip level selected by surface roughness, so rough surfaces read from
//! progressively blurrier levels. The blur chain is prefiltered here on the
//! CPU with a simple box filter; that work runs on the asset worker thread,
//! not the frame loop.

use crate::error::AssetError;

/// One level of the prefiltered chain.
#[derive(Debug, Clone)]
struct MipLevel {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// A decoded environment image with its prefiltered mip chain.
///
/// Lives entirely on the CPU; [`EnvironmentImage::upload`] turns it into a
/// GPU texture.
#[derive(Debug, Clone)]
pub struct EnvironmentImage {
    levels: Vec<MipLevel>,
}

impl EnvironmentImage {
    /// Decode an image from encoded bytes (PNG or JPEG) and prefilter it.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(img.into_raw(), width, height))
    }

    /// Build the chain from raw RGBA pixels (4 bytes per pixel).
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "RGBA data size mismatch"
        );
        assert!(width > 0 && height > 0, "empty environment image");

        let mut levels = vec![MipLevel {
            width,
            height,
            pixels: data,
        }];
        while levels[levels.len() - 1].width > 1 || levels[levels.len() - 1].height > 1 {
            levels.push(downsample(&levels[levels.len() - 1]));
        }
        Self { levels }
    }

    /// A 1x1 image of a single color, used as a placeholder until the real
    /// map arrives.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::from_rgba(rgba.to_vec(), 1, 1)
    }

    /// Number of mip levels in the chain.
    #[inline]
    pub fn mip_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Dimensions of the base level.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.levels[0].width, self.levels[0].height)
    }

    #[cfg(test)]
    fn level(&self, index: usize) -> (&[u8], u32, u32) {
        let l = &self.levels[index];
        (&l.pixels, l.width, l.height)
    }

    /// Upload the full chain into a GPU texture.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> EnvironmentMap {
        let (width, height) = self.dimensions();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("environment_map"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: self.mip_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip, level) in self.levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        EnvironmentMap {
            texture,
            view,
            mip_count: self.mip_count(),
        }
    }
}

/// GPU-resident environment map.
pub struct EnvironmentMap {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub mip_count: u32,
}

impl EnvironmentMap {
    /// Release the texture memory without waiting for garbage collection.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Halve a level with a 2x2 box filter, clamping samples at the edges.
fn downsample(src: &MipLevel) -> MipLevel {
    let width = (src.width / 2).max(1);
    let height = (src.height / 2).max(1);
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let x0 = (x * 2).min(src.width - 1);
            let x1 = (x * 2 + 1).min(src.width - 1);
            let y0 = (y * 2).min(src.height - 1);
            let y1 = (y * 2 + 1).min(src.height - 1);

            for channel in 0..4 {
                let sum = sample(src, x0, y0, channel) as u32
                    + sample(src, x1, y0, channel) as u32
                    + sample(src, x0, y1, channel) as u32
                    + sample(src, x1, y1, channel) as u32;
                pixels.push(((sum + 2) / 4) as u8);
            }
        }
    }

    MipLevel {
        width,
        height,
        pixels,
    }
}

#[inline]
fn sample(level: &MipLevel, x: u32, y: u32, channel: u32) -> u8 {
    level.pixels[((y * level.width + x) * 4 + channel) as usize]
}

//! Off-screen color + depth targets.

use std::{iter, time::Duration};

use anyhow::{Context as _, Result, anyhow};

use crate::{context::Context, data_structures::texture::Texture};

/// A fixed-size color texture with a matching depth buffer.
///
/// The color texture can be sampled by later passes, which is how the
/// post-processing chain and additive blends read a rendered scene.
#[derive(Clone, Debug)]
pub struct RenderTarget {
    pub color: Texture,
    pub depth: Texture,
}

impl RenderTarget {
    /// A target in [`Texture::HDR_FORMAT`].
    pub fn new(ctx: &Context, size: [u32; 2]) -> Self {
        Self::with_format(ctx, size, Texture::HDR_FORMAT)
    }

    pub fn with_format(ctx: &Context, size: [u32; 2], format: wgpu::TextureFormat) -> Self {
        let color = Texture::create_color_target(&ctx.device, size, format, "render target color");
        let depth = Texture::create_depth_texture(
            &ctx.device,
            size,
            "render target depth",
            wgpu::AddressMode::ClampToEdge,
        );
        Self { color, depth }
    }

    pub fn size(&self) -> [u32; 2] {
        self.color.size()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.color.texture.format()
    }

    /// Copies the color texture back to the CPU.
    ///
    /// Rows are tightly packed, top row first, in the target's own format
    /// (8 bytes per pixel for the default half-float targets).
    pub async fn read_pixels(&self, ctx: &Context) -> Result<Vec<u8>> {
        read_texture(ctx, &self.color).await
    }
}

/// Copies a color texture with `COPY_SRC` usage back to the CPU, rows tightly
/// packed, top row first.
pub async fn read_texture(ctx: &Context, texture: &Texture) -> Result<Vec<u8>> {
    let [width, height] = texture.size();
    let format = texture.texture.format();
    let bytes_per_pixel = format
        .block_copy_size(None)
        .ok_or_else(|| anyhow!("Cannot read back a {format:?} texture."))?;
    let unpadded = width * bytes_per_pixel;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        size: (padded * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("read back buffer"),
        mapped_at_creation: false,
    });
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Read Back Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(iter::once(encoder.finish()));

    // The mapping has to be requested before polling, or the wait never ends.
    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })
        .context("Waiting for the read back failed")?;
    rx.receive()
        .await
        .ok_or_else(|| anyhow!("Read back was cancelled."))??;

    let data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * height) as usize);
    for row in data.chunks(padded as usize) {
        pixels.extend_from_slice(&row[..unpadded as usize]);
    }
    drop(data);
    output_buffer.unmap();
    Ok(pixels)
}

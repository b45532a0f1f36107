//! GPU context: device, queue, and the surface (or off-screen stand-in)
//! frames are drawn to.

use std::{fmt, iter, sync::Arc};

use anyhow::{Context as _, Result};
use winit::window::Window;

use crate::data_structures::texture::Texture;

/// Textures bound in place of samplers and shadow maps that were never set.
#[derive(Debug)]
pub struct Fallback {
    /// 1x1 opaque white.
    pub white: Texture,
    /// 1x1 depth texture cleared to the far plane, so nothing is in shadow.
    pub depth: Texture,
}

/// The color view the current frame is drawn into.
#[derive(Debug)]
pub struct Frame {
    surface: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

/// Why [`Context::acquire_frame`] produced no frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The surface is lost or outdated and must be reconfigured.
    Reconfigure,
    /// Nothing can be drawn right now, e.g. the window is occluded.
    Skip,
    /// There is no surface to draw into.
    Fatal,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Reconfigure => write!(f, "surface needs to be reconfigured"),
            FrameError::Skip => write!(f, "surface texture not available this frame"),
            FrameError::Fatal => write!(f, "no usable surface"),
        }
    }
}

impl std::error::Error for FrameError {}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Option<Arc<Window>>,
    pub surface: Option<wgpu::Surface<'static>>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Size and color format of the screen. Headless contexts keep one too.
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) depth_texture: Texture,
    /// Screen stand-in of a headless context.
    screen_texture: Option<Texture>,
    pub fallback: Fallback,
    features: wgpu::Features,
    frame: Option<Frame>,
}

/// Device features used when the adapter has them.
const OPTIONAL_FEATURES: wgpu::Features = wgpu::Features::POLYGON_MODE_LINE
    .union(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("Cannot create a surface for the window")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        let (device, queue, features) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Materials write linear colors, so prefer an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self::assemble(
            Some(window),
            Some(surface),
            device,
            queue,
            config,
            features,
        ))
    }

    /// A context without a window. The "screen" is an off-screen
    /// `Rgba8UnormSrgb` texture of the given size that can be read back.
    pub async fn headless(width: u32, height: u32) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        let (device, queue, features) = request_device(&adapter).await?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let mut ctx = Self::assemble(None, None, device, queue, config, features);
        ctx.screen_texture = Some(ctx.create_screen_texture());
        Ok(ctx)
    }

    fn assemble(
        window: Option<Arc<Window>>,
        surface: Option<wgpu::Surface<'static>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        features: wgpu::Features,
    ) -> Self {
        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
            wgpu::AddressMode::ClampToEdge,
        );
        let white = Texture::create_solid(&device, &queue, [255, 255, 255, 255], "fallback white");
        let depth = Texture::create_depth_texture(
            &device,
            [1, 1],
            "fallback depth",
            wgpu::AddressMode::ClampToEdge,
        );
        clear_depth(&device, &queue, &depth);

        Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            screen_texture: None,
            fallback: Fallback { white, depth },
            features,
            frame: None,
        }
    }

    fn create_screen_texture(&self) -> Texture {
        Texture::create_color_target(
            &self.device,
            [self.config.width, self.config.height],
            self.config.format,
            "headless screen",
        )
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub fn supports_wireframe(&self) -> bool {
        self.features.contains(wgpu::Features::POLYGON_MODE_LINE)
    }

    pub fn supports_border_clamp(&self) -> bool {
        self.features
            .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER)
    }

    /// Reconfigures the surface and screen-sized buffers. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        if self.screen_texture.is_some() {
            self.screen_texture = Some(self.create_screen_texture());
        }
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [width, height],
            "depth_texture",
            wgpu::AddressMode::ClampToEdge,
        );
    }

    /// Acquires the texture the next screen draws go to.
    pub fn acquire_frame(&mut self) -> std::result::Result<(), FrameError> {
        if self.frame.is_some() {
            return Ok(());
        }
        let frame = match (&self.surface, &self.screen_texture) {
            (Some(surface), _) => {
                let output = match surface.get_current_texture() {
                    wgpu::CurrentSurfaceTexture::Success(output) => output,
                    wgpu::CurrentSurfaceTexture::Suboptimal(output) => {
                        log::debug!("Drawing into a suboptimal surface texture.");
                        output
                    }
                    wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
                        return Err(FrameError::Skip);
                    }
                    wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                        return Err(FrameError::Reconfigure);
                    }
                    wgpu::CurrentSurfaceTexture::Validation => return Err(FrameError::Fatal),
                };
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Frame {
                    surface: Some(output),
                    view,
                }
            }
            (None, Some(screen)) => Frame {
                surface: None,
                view: screen.texture.create_view(&wgpu::TextureViewDescriptor::default()),
            },
            (None, None) => return Err(FrameError::Fatal),
        };
        self.frame = Some(frame);
        Ok(())
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Presents the acquired frame, if any.
    pub fn present(&mut self) {
        if let Some(Frame {
            surface: Some(output),
            ..
        }) = self.frame.take()
        {
            output.present();
        }
    }

    /// The headless screen texture, for reading back what was drawn.
    pub fn screen_texture(&self) -> Option<&Texture> {
        self.screen_texture.as_ref()
    }
}

async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue, wgpu::Features)> {
    let features = adapter.features() & OPTIONAL_FEATURES;
    log::debug!("Requesting device with optional features {features:?}");
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: features,
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            ..Default::default()
        })
        .await
        .context("Cannot open the GPU device")?;
    Ok((device, queue, features))
}

fn clear_depth(device: &wgpu::Device, queue: &wgpu::Queue, depth: &Texture) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Fallback Depth Encoder"),
    });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Fallback Depth Clear"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            multiview_mask: None,
            timestamp_writes: None,
        });
    }
    queue.submit(iter::once(encoder.finish()));
}

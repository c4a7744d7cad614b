//! Paginated raster export: slice a rendered content block into page images.
//!
//! ## Why slice pixels, not layout?
//!
//! The block arrives already rendered (fonts, images and all), so it is
//! paginated as one tall bitmap. Each page takes as many source rows as fit
//! in the page's content area at the block's width. Page breaks may fall
//! mid-line; that is accepted in exchange for an export that looks exactly
//! like what was rendered.
//!
//! ## Geometry
//!
//! ```text
//! ratio    = source_width_px / (page_width - 2·margin)     px per point
//! capacity = max(1, floor((page_height - 2·margin) · ratio))  px per page
//! pages    = ceil(source_height / capacity)
//! ```
//!
//! Rasterisation, compositing and encoding are CPU-bound and run inside
//! `spawn_blocking`.

use crate::error::ExportError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Largest page canvas (RGBA bytes) the exporter will allocate.
pub const MAX_CANVAS_BYTES: u64 = 256 * 1024 * 1024;

/// Default device-pixel scale for rasterisation.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Renders the content block to a bitmap.
///
/// Implemented by whatever owns the rendered view (a headless browser, a
/// layout engine, or [`PrerenderedBlock`] for an existing image).
pub trait BlockRasterizer: Send + Sync {
    /// Rasterise the block at `scale` device pixels per layout pixel.
    fn rasterize(&self, scale: f32) -> Result<DynamicImage, ExportError>;
}

/// A block that has already been rendered to an image at `base_scale`.
///
/// Requests for another scale are resampled with Lanczos3.
#[derive(Debug, Clone)]
pub struct PrerenderedBlock {
    image: DynamicImage,
    base_scale: f32,
}

impl PrerenderedBlock {
    /// Wrap an image rendered at the default scale.
    pub fn new(image: DynamicImage) -> Self {
        Self::with_base_scale(image, DEFAULT_SCALE)
    }

    pub fn with_base_scale(image: DynamicImage, base_scale: f32) -> Self {
        Self { image, base_scale }
    }

    /// Load a rendered block from an image file (PNG or JPEG).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| ExportError::Rasterize(format!("{}: {e}", path.display())))?;
        Ok(Self::new(image))
    }
}

impl BlockRasterizer for PrerenderedBlock {
    fn rasterize(&self, scale: f32) -> Result<DynamicImage, ExportError> {
        if !self.base_scale.is_finite() || self.base_scale <= 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "base scale must be positive, got {}",
                self.base_scale
            )));
        }
        if (scale - self.base_scale).abs() < f32::EPSILON {
            return Ok(self.image.clone());
        }
        let factor = scale / self.base_scale;
        let (w, h) = self.image.dimensions();
        let nw = (w as f32 * factor).round() as u32;
        let nh = (h as f32 * factor).round() as u32;
        if nw == 0 || nh == 0 {
            return Err(ExportError::EmptySource {
                width: nw,
                height: nh,
            });
        }
        Ok(self.image.resize_exact(nw, nh, FilterType::Lanczos3))
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Physical page size and uniform margin, in PDF points (1/72 in).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageSize {
    /// ISO A4 with a 10 mm margin.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
        margin: 28.35,
    };

    /// US Letter with a 10 mm margin.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
        margin: 28.35,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    fn validate(&self) -> Result<(), ExportError> {
        let finite = [self.width, self.height, self.margin]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.margin < 0.0 || self.content_width() <= 0.0 || self.content_height() <= 0.0
        {
            return Err(ExportError::InvalidGeometry(format!(
                "page {}x{} pt with margin {} pt leaves no content area",
                self.width, self.height, self.margin
            )));
        }
        Ok(())
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Encoding used for page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageImageFormat {
    #[default]
    Png,
    /// Required for PDF assembly (embedded as DCTDecode).
    Jpeg,
}

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub page_size: PageSize,
    /// Device-pixel scale passed to the rasteriser.
    pub scale: f32,
    pub format: PageImageFormat,
    /// JPEG quality (1–100); ignored for PNG.
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            scale: DEFAULT_SCALE,
            format: PageImageFormat::Png,
            jpeg_quality: 90,
        }
    }
}

/// One page of exported output.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPage {
    /// 1-based page number.
    pub page: usize,
    /// First source row on this page.
    pub source_offset: u32,
    /// Source rows on this page (also the image height in pixels).
    pub source_height: u32,
    /// Image width in pixels (the source width).
    pub pixel_width: u32,
    /// Height the image occupies on the page, in points.
    pub display_height: f32,
    pub format: PageImageFormat,
    /// Encoded page image.
    pub image: Vec<u8>,
}

/// A contiguous run of source rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub offset: u32,
    pub height: u32,
}

/// Slice `source_height` rows into pages of at most `capacity` rows.
///
/// Slices are contiguous, non-overlapping, sum to `source_height`, and
/// number `ceil(source_height / capacity)`. A zero capacity is treated as 1.
pub fn plan_pages(source_height: u32, capacity: u32) -> Vec<PageSlice> {
    let capacity = capacity.max(1);
    let mut slices = Vec::with_capacity(source_height.div_ceil(capacity) as usize);
    let mut offset = 0u32;
    while offset < source_height {
        let height = capacity.min(source_height - offset);
        slices.push(PageSlice { offset, height });
        offset += height;
    }
    slices
}

/// Source rows per page, and source pixels per point, for a block
/// `source_width` pixels wide.
pub fn page_capacity(page_size: &PageSize, source_width: u32) -> Result<(u32, f32), ExportError> {
    page_size.validate()?;
    if source_width == 0 {
        return Err(ExportError::EmptySource {
            width: 0,
            height: 0,
        });
    }
    let ratio = source_width as f32 / page_size.content_width();
    let rows = (page_size.content_height() * ratio).floor();
    if !ratio.is_finite() || !rows.is_finite() {
        return Err(ExportError::InvalidGeometry(format!(
            "non-finite page ratio for width {source_width} px"
        )));
    }
    Ok(((rows as u32).max(1), ratio))
}

/// Paginate an already-rasterised block (blocking).
pub fn paginate(source: &DynamicImage, options: &ExportOptions) -> Result<Vec<RasterPage>, ExportError> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::EmptySource { width, height });
    }

    let (capacity, ratio) = page_capacity(&options.page_size, width)?;
    let slices = plan_pages(height, capacity);
    debug!(
        "Paginating {}x{} px: {} px/page, ratio {:.3}, {} page(s)",
        width,
        height,
        capacity,
        ratio,
        slices.len()
    );

    let rgba = source.to_rgba8();
    slices
        .iter()
        .enumerate()
        .map(|(i, slice)| render_page(&rgba, i + 1, *slice, ratio, options))
        .collect()
}

/// Rasterise the block and slice it into page images.
///
/// All-or-nothing: any failure returns `Err` and no pages.
pub async fn export_as_document<R>(
    rasterizer: Arc<R>,
    options: ExportOptions,
) -> Result<Vec<RasterPage>, ExportError>
where
    R: BlockRasterizer + ?Sized + 'static,
{
    if !options.scale.is_finite() || options.scale <= 0.0 {
        return Err(ExportError::InvalidGeometry(format!(
            "scale must be positive, got {}",
            options.scale
        )));
    }
    options.page_size.validate()?;

    let pages = tokio::task::spawn_blocking(move || {
        let source = rasterizer.rasterize(options.scale)?;
        paginate(&source, &options)
    })
    .await
    .map_err(|e| ExportError::Task(e.to_string()))??;

    info!("Exported {} page(s)", pages.len());
    Ok(pages)
}

fn check_canvas(page: usize, width: u32, height: u32) -> Result<(), ExportError> {
    if width as u64 * height as u64 * 4 > MAX_CANVAS_BYTES {
        return Err(ExportError::CanvasUnavailable {
            page,
            width,
            height,
        });
    }
    Ok(())
}

/// Composite one slice onto a white page canvas and encode it.
fn render_page(
    source: &RgbaImage,
    page: usize,
    slice: PageSlice,
    ratio: f32,
    options: &ExportOptions,
) -> Result<RasterPage, ExportError> {
    let width = source.width();
    check_canvas(page, width, slice.height)?;

    let mut canvas = RgbaImage::from_pixel(width, slice.height, Rgba([255, 255, 255, 255]));
    let chunk = imageops::crop_imm(source, 0, slice.offset, width, slice.height).to_image();
    imageops::overlay(&mut canvas, &chunk, 0, 0);
    let flattened = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8());

    let mut buf = Vec::new();
    let encoded = match options.format {
        PageImageFormat::Png => flattened.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
        PageImageFormat::Jpeg => flattened.write_with_encoder(JpegEncoder::new_with_quality(
            &mut buf,
            options.jpeg_quality.clamp(1, 100),
        )),
    };
    encoded.map_err(|e| ExportError::Encode {
        page,
        detail: e.to_string(),
    })?;

    Ok(RasterPage {
        page,
        source_offset: slice.offset,
        source_height: slice.height,
        pixel_width: width,
        display_height: slice.height as f32 / ratio,
        format: options.format,
        image: buf,
    })
}

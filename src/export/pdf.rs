//! Document assembly: pack raster pages into a PDF.
//!
//! Each [`RasterPage`] becomes one PDF page holding a single JPEG image
//! (embedded as-is with the `DCTDecode` filter, so nothing is re-encoded).
//! The image is drawn at the top-left margin, `page_width - 2·margin` wide
//! and `display_height` tall; the first chunk lands on the first page and
//! each later chunk starts a new one.

use crate::error::{ContentGenError, ExportError};
use crate::export::raster::{
    export_as_document, BlockRasterizer, ExportOptions, PageImageFormat, PageSize, RasterPage,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Assemble `pages` (JPEG-encoded) into a PDF document.
pub fn assemble_pdf(pages: &[RasterPage], page_size: PageSize) -> Result<Vec<u8>, ExportError> {
    if pages.is_empty() {
        return Err(ExportError::Document("no pages to assemble".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = add_page(&mut doc, pages_id, page, page_size)?;
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ExportError::Document(e.to_string()))?;
    debug!("Assembled PDF: {} page(s), {} bytes", pages.len(), buf.len());
    Ok(buf)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: &RasterPage,
    page_size: PageSize,
) -> Result<ObjectId, ExportError> {
    if page.format != PageImageFormat::Jpeg {
        return Err(ExportError::Document(format!(
            "page {} is {:?}; PDF pages must be JPEG",
            page.page, page.format
        )));
    }

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => page.pixel_width as i64,
            "Height" => page.source_height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        page.image.clone(),
    ));

    // PDF user space has its origin at the bottom-left corner.
    let draw_width = page_size.content_width();
    let draw_height = page.display_height;
    let x = page_size.margin;
    let y = page_size.height - page_size.margin - draw_height;

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(draw_width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(draw_height),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| ExportError::Document(format!("page {}: {e}", page.page)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_size.width),
            Object::Real(page_size.height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

/// Rasterise, paginate and assemble a PDF in one go.
///
/// `options.format` is forced to JPEG.
pub async fn export_pdf<R>(
    rasterizer: Arc<R>,
    options: ExportOptions,
) -> Result<Vec<u8>, ExportError>
where
    R: BlockRasterizer + ?Sized + 'static,
{
    let options = ExportOptions {
        format: PageImageFormat::Jpeg,
        ..options
    };
    let pages = export_as_document(rasterizer, options).await?;
    let page_size = options.page_size;
    tokio::task::spawn_blocking(move || assemble_pdf(&pages, page_size))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?
}

// ── File output ──────────────────────────────────────────────────────────

/// Export a PDF and write it to `path`.
///
/// Uses an atomic write (temp file in the same directory + persist), so a
/// failed export never leaves a partial file behind. Returns the number of
/// bytes written.
pub async fn export_document_to_file<R>(
    rasterizer: Arc<R>,
    options: ExportOptions,
    path: impl AsRef<Path>,
) -> Result<usize, ContentGenError>
where
    R: BlockRasterizer + ?Sized + 'static,
{
    let pdf = export_pdf(rasterizer, options).await?;
    let path = path.as_ref().to_path_buf();
    let len = pdf.len();
    write_atomic(path.clone(), pdf).await?;
    info!("Wrote {} ({} bytes)", path.display(), len);
    Ok(len)
}

/// Write each page image to `dir` as `page-001.png` (or `.jpg`).
pub async fn write_page_images(
    pages: &[RasterPage],
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ContentGenError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ContentGenError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        let ext = match page.format {
            PageImageFormat::Png => "png",
            PageImageFormat::Jpeg => "jpg",
        };
        let path = dir.join(format!("page-{:03}.{ext}", page.page));
        write_atomic(path.clone(), page.image.clone()).await?;
        written.push(path);
    }
    Ok(written)
}

async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), ContentGenError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| ContentGenError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let target = path.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| ContentGenError::Internal(format!("write task failed: {e}")))?
    .map_err(|e| ContentGenError::OutputWriteFailed { path, source: e })
}

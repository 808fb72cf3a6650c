//! PDF assembly: one page with the figure image, then the session log as
//! wrapped text on as many A4 pages as it needs.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::{InsightError, Result};
use crate::utils::wrap_text;

/// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 8;
const LEADING: i64 = 10;
const WRAP_COLUMNS: usize = 110;

/// Lines of log text that fit on one page.
pub(crate) const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// An RGB8 raster to embed.
pub(crate) struct RgbImage<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
}

fn pdf_err(e: impl std::fmt::Display) -> InsightError {
    InsightError::Render(format!("PDF assembly failed: {}", e))
}

/// Write the figure page followed by the log pages.
pub(crate) fn write_pdf(path: &Path, image: &RgbImage<'_>, log_text: &str) -> Result<usize> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let image_id = doc.add_object(image_stream(image)?);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut add_page = |doc: &mut Document, content: Content| -> Result<()> {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(pdf_err)?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
        Ok(())
    };

    add_page(&mut doc, image_page(image))?;

    let lines = wrap_text(log_text, WRAP_COLUMNS);
    for chunk in lines.chunks(LINES_PER_PAGE) {
        add_page(&mut doc, text_page(chunk))?;
    }
    if lines.is_empty() {
        add_page(&mut doc, text_page(&[]))?;
    }

    let page_count = kids.len();
    finish(&mut doc, pages_id, kids);

    doc.save(path)
        .map_err(|e| InsightError::write(path.display().to_string(), e))?;
    debug!("PDF written to {} ({} pages)", path.display(), page_count);

    Ok(page_count)
}

fn finish(doc: &mut Document, pages_id: ObjectId, kids: Vec<Object>) {
    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Image XObject with zlib-compressed RGB samples.
fn image_stream(image: &RgbImage<'_>) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.pixels)?;
    let data = encoder.finish()?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8i64,
        "Filter" => "FlateDecode",
    };
    Ok(Stream::new(dict, data))
}

/// Placement `(width, height, x, y)` of an image scaled to the page width,
/// shrunk further when it would overflow the page height.
pub(crate) fn image_placement(width: u32, height: u32) -> (i64, i64, i64, i64) {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let scale = (PAGE_WIDTH as f64 / w).min(PAGE_HEIGHT as f64 / h);
    let draw_w = (w * scale).round() as i64;
    let draw_h = (h * scale).round() as i64;

    let x = (PAGE_WIDTH - draw_w) / 2;
    let y = PAGE_HEIGHT - draw_h;
    (draw_w, draw_h, x, y)
}

fn image_page(image: &RgbImage<'_>) -> Content {
    let (w, h, x, y) = image_placement(image.width, image.height);
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0i64.into(), 0i64.into(), h.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    }
}

fn text_page(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
    ];

    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(to_win_ansi(line))]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
}

/// Helvetica covers Latin-1; everything else is replaced.
fn to_win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| match c {
            '\t' => b' ',
            c if (c as u32) < 0x20 => b' ',
            c if (c as u32) <= 0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

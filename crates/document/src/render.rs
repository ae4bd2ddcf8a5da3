//! PDF rendering of a composed document plan.
//!
//! The renderer is deliberately dumb: every layout decision was already
//! made by the composer, so this module only turns positioned blocks into
//! `printpdf` drawing calls and then stamps the running footer on every
//! page in a final pass, once the total page count is known.

use crate::layout::{
    line_height, text_width, Block, DocumentPlan, Placed, CONTENT_WIDTH, MARGIN, PAGE_HEIGHT,
    PAGE_WIDTH,
};
use crate::DocumentError;
use consent_core::{SignatureFormat, SignatureImage};
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rect, Rgb,
};
use std::io::{BufWriter, Cursor};

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);
const FOOTER_GREY: (f32, f32, f32) = (0.51, 0.51, 0.51);
/// Alert box background, a pale red.
const ALERT_FILL: (f32, f32, f32) = (0.996, 0.886, 0.886);
/// Alert text, a dark red.
const ALERT_TEXT: (f32, f32, f32) = (0.725, 0.11, 0.11);

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// The per-page "Page X of N" stamp. `index` is zero-based.
pub fn page_stamp(index: usize, total: usize) -> String {
    format!("Page {} of {}", index + 1, total)
}

/// Renders a document plan to PDF bytes.
///
/// # Errors
///
/// Returns [`DocumentError`] when a builtin font cannot be registered or
/// the PDF stream cannot be serialised. A signature raster that fails to
/// decode is skipped with a warning rather than failing the document; the
/// payload was already vetted when the submission was built.
pub fn render(
    plan: &DocumentPlan,
    title: &str,
    signature: &SignatureImage,
) -> Result<Vec<u8>, DocumentError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| DocumentError::Font(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| DocumentError::Font(e.to_string()))?,
    };

    let mut page_refs = vec![(first_page, first_layer)];
    for _ in 1..plan.page_count() {
        page_refs.push(doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1"));
    }

    for (page_plan, (page, layer)) in plan.pages.iter().zip(&page_refs) {
        let layer = doc.get_page(*page).get_layer(*layer);
        for placed in &page_plan.blocks {
            draw_block(&layer, &fonts, placed, signature);
        }
    }

    // Footer pass: page count is only final here, so "Page X of N" is
    // always correct.
    let total = plan.page_count();
    for (index, (page, layer)) in page_refs.iter().enumerate() {
        let layer = doc.get_page(*page).get_layer(*layer);
        set_fill(&layer, FOOTER_GREY);
        draw_centered(&layer, &fonts.regular, &plan.footer.clinic_line, 7.0, 8.0);
        draw_centered(&layer, &fonts.regular, &plan.footer.classification, 7.0, 4.0);
        let stamp = page_stamp(index, total);
        layer.use_text(
            &stamp,
            7.0,
            Mm(PAGE_WIDTH - MARGIN - text_width(&stamp, 7.0)),
            Mm(4.0),
            &fonts.regular,
        );
        set_fill(&layer, BLACK);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| DocumentError::Write(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| DocumentError::Write(e.to_string()))
}

fn set_fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn set_outline(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

/// Converts a top-down position to a PDF baseline coordinate.
fn pdf_y(y_top: f32) -> Mm {
    Mm(PAGE_HEIGHT - y_top)
}

fn filled_rect(layer: &PdfLayerReference, x: f32, y_top: f32, width: f32, height: f32) {
    let rect = Rect::new(
        Mm(x),
        Mm(PAGE_HEIGHT - (y_top + height)),
        Mm(x + width),
        Mm(PAGE_HEIGHT - y_top),
    )
    .with_mode(PaintMode::Fill)
    .with_winding(WindingOrder::NonZero);
    layer.add_rect(rect);
}

fn outlined_rect(layer: &PdfLayerReference, x: f32, y_top: f32, width: f32, height: f32) {
    let rect = Rect::new(
        Mm(x),
        Mm(PAGE_HEIGHT - (y_top + height)),
        Mm(x + width),
        Mm(PAGE_HEIGHT - y_top),
    )
    .with_mode(PaintMode::Stroke)
    .with_winding(WindingOrder::NonZero);
    layer.add_rect(rect);
}

fn draw_centered(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size: f32, y_from_bottom: f32) {
    let x = (PAGE_WIDTH - text_width(text, size)) / 2.0;
    layer.use_text(text, size, Mm(x.max(MARGIN)), Mm(y_from_bottom), font);
}

fn draw_lines(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    lines: &[String],
    size: f32,
    x: f32,
    y_top: f32,
    advance: f32,
) {
    let baseline = advance * 0.8;
    for (i, line) in lines.iter().enumerate() {
        layer.use_text(line, size, Mm(x), pdf_y(y_top + baseline + i as f32 * advance), font);
    }
}

fn draw_block(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    placed: &Placed,
    signature: &SignatureImage,
) {
    let y = placed.y;
    match &placed.block {
        Block::Banner {
            clinic_name,
            subtitle,
            date_line,
            address,
        } => {
            set_fill(layer, BLACK);
            filled_rect(layer, 0.0, 0.0, PAGE_WIDTH, placed.block.height());
            set_fill(layer, WHITE);
            layer.use_text(clinic_name, 16.0, Mm(MARGIN), pdf_y(10.0), &fonts.bold);
            layer.use_text(subtitle, 9.0, Mm(MARGIN), pdf_y(16.0), &fonts.regular);
            layer.use_text(
                date_line,
                8.0,
                Mm(PAGE_WIDTH - MARGIN - text_width(date_line, 8.0)),
                pdf_y(10.0),
                &fonts.regular,
            );
            layer.use_text(
                address,
                8.0,
                Mm(PAGE_WIDTH - MARGIN - text_width(address, 8.0)),
                pdf_y(16.0),
                &fonts.regular,
            );
            set_fill(layer, BLACK);
        }
        Block::SectionHeader(text) => {
            set_fill(layer, BLACK);
            filled_rect(layer, MARGIN, y + 4.0, CONTENT_WIDTH, 8.0);
            set_fill(layer, WHITE);
            layer.use_text(
                &text.to_uppercase(),
                9.0,
                Mm(MARGIN + 3.0),
                pdf_y(y + 9.5),
                &fonts.bold,
            );
            set_fill(layer, BLACK);
        }
        Block::LabelValue { label, value } => {
            layer.use_text(label, 9.0, Mm(MARGIN), pdf_y(y + 3.5), &fonts.bold);
            layer.use_text(
                value,
                9.0,
                Mm(MARGIN + text_width(label, 9.0) + 2.0),
                pdf_y(y + 3.5),
                &fonts.regular,
            );
        }
        Block::Paragraph { lines, size, bold } => {
            let font = if *bold { &fonts.bold } else { &fonts.regular };
            draw_lines(layer, font, lines, *size, MARGIN, y, line_height(*size));
        }
        Block::Bullet { lines } => {
            draw_lines(layer, &fonts.regular, lines, 8.0, MARGIN + 3.0, y, 3.8);
        }
        Block::Alert { lines } => {
            set_fill(layer, ALERT_FILL);
            filled_rect(layer, MARGIN, y, CONTENT_WIDTH, placed.block.height());
            set_fill(layer, ALERT_TEXT);
            draw_lines(layer, &fonts.bold, lines, 8.0, MARGIN + 3.0, y + 2.0, 4.0);
            set_fill(layer, BLACK);
        }
        Block::Checkbox {
            lines,
            checked,
            initials,
        } => {
            if *checked {
                set_fill(layer, BLACK);
                filled_rect(layer, MARGIN, y, 5.0, 5.0);
                set_fill(layer, WHITE);
                let x = MARGIN + 2.5 - text_width(initials, 6.0) / 2.0;
                layer.use_text(initials, 6.0, Mm(x), pdf_y(y + 3.5), &fonts.bold);
                set_fill(layer, BLACK);
            } else {
                set_outline(layer, BLACK);
                layer.set_outline_thickness(0.5);
                outlined_rect(layer, MARGIN, y, 5.0, 5.0);
            }
            draw_lines(layer, &fonts.regular, lines, 8.0, MARGIN + 8.0, y, 4.0);
        }
        Block::Signature { width, height } => {
            embed_signature(layer, signature, MARGIN, y, *width, *height);
        }
    }
}

/// Embeds the signature raster scaled into its reserved box.
///
/// Decode failures are logged and skipped: the payload was validated when
/// the submission was built, and an undrawable pixel buffer must not sink
/// an otherwise complete document.
fn embed_signature(
    layer: &PdfLayerReference,
    signature: &SignatureImage,
    x: f32,
    y_top: f32,
    box_width: f32,
    box_height: f32,
) {
    let cursor = Cursor::new(signature.bytes().to_vec());
    let decoded = match signature.format() {
        SignatureFormat::Png => PngDecoder::new(cursor)
            .map_err(|e| e.to_string())
            .and_then(|d| Image::try_from(d).map_err(|e| e.to_string())),
        SignatureFormat::Jpeg => JpegDecoder::new(cursor)
            .map_err(|e| e.to_string())
            .and_then(|d| Image::try_from(d).map_err(|e| e.to_string())),
    };

    let image = match decoded {
        Ok(image) => image,
        Err(error) => {
            tracing::warn!(%error, "skipping signature raster that failed to decode");
            return;
        }
    };

    let width_px = image.image.width.0.max(1) as f32;
    let height_px = image.image.height.0.max(1) as f32;
    // Pick the dpi that fits the raster inside the reserved box on both
    // axes (larger dpi renders smaller).
    let dpi_for_width = width_px * 25.4 / box_width;
    let dpi_for_height = height_px * 25.4 / box_height;
    let dpi = dpi_for_width.max(dpi_for_height);
    let rendered_height = height_px * 25.4 / dpi;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(PAGE_HEIGHT - (y_top + rendered_height))),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

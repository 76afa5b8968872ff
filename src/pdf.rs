//! Single-page PDF backend using the standard Helvetica fonts.

use crate::font::printable;
use crate::layout::{Element, Scene, Text, POINTS_PER_INCH};
use crate::style::Rgb;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
    TextMatrix,
};
use std::io::{self, BufWriter};

const MM_PER_INCH: f64 = 25.4;

fn mm(points: f64) -> Mm {
    Mm(points * MM_PER_INCH / POINTS_PER_INCH)
}

fn fill_color((r, g, b): Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0,
        None,
    ))
}

/// Text matrix placing the first glyph of `text` on a page `page_height` tall.
/// Vertical runs are turned a quarter counter-clockwise.
fn text_matrix(text: &Text, page_height: f64) -> [f64; 6] {
    let (x, y) = text.baseline_start();
    if text.vertical {
        [0.0, 1.0, -1.0, 0.0, x, page_height - y]
    } else {
        [1.0, 0.0, 0.0, 1.0, x, page_height - y]
    }
}

fn fill_rect(layer: &PdfLayerReference, x: f64, y: f64, w: f64, h: f64, fill: Rgb) {
    layer.set_fill_color(fill_color(fill));
    layer.add_shape(Line {
        points: vec![
            (Point::new(mm(x), mm(y)), false),
            (Point::new(mm(x + w), mm(y)), false),
            (Point::new(mm(x + w), mm(y + h)), false),
            (Point::new(mm(x), mm(y + h)), false),
        ],
        is_closed: true,
        has_fill: true,
        has_stroke: false,
        is_clipping_path: false,
    });
}

fn pdf_error(e: printpdf::Error) -> io::Error {
    io::Error::other(e.to_string())
}

/// Serialize `scene` as a one-page PDF document.
pub fn render_pdf(scene: &Scene) -> io::Result<Vec<u8>> {
    let h = scene.height;
    let (doc, page, layer) =
        PdfDocument::new("Gene recovery heatmap", mm(scene.width), mm(h), "Heatmap");
    let regular: IndirectFontRef = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold: IndirectFontRef = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;
    let layer = doc.get_page(page).get_layer(layer);

    fill_rect(&layer, 0.0, 0.0, scene.width, h, scene.background);
    for element in &scene.elements {
        match element {
            // PDF y grows upwards
            Element::Rect(r) => fill_rect(&layer, r.x, h - r.y - r.h, r.w, r.h, r.fill),
            Element::Text(t) => {
                let font = if t.bold { &bold } else { &regular };
                layer.begin_text_section();
                layer.set_font(font, t.size);
                layer.set_fill_color(fill_color(t.color));
                layer.set_text_matrix(TextMatrix::Raw(text_matrix(t, h)));
                layer.write_text(printable(&t.text), font);
                layer.end_text_section();
            }
        }
    }

    let mut out = BufWriter::new(Vec::new());
    doc.save(&mut out).map_err(pdf_error)?;
    out.into_inner().map_err(|e| e.into_error())
}

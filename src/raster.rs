//! Pixel backend: paints a [`Scene`] into an RGB buffer and encodes it.

use crate::font::{glyph, CHAR_ADVANCE_EM, GLYPH_COLUMNS, GLYPH_ROWS};
use crate::layout::{Element, Scene, Text, POINTS_PER_INCH};
use crate::style::Rgb;
use image::{DynamicImage, ImageFormat, ImageResult, RgbImage};
use log::debug;
use std::io::Cursor;

struct Canvas {
    img: RgbImage,
    // pixels per point
    scale: f64,
}

impl Canvas {
    /// Fill a rectangle given in points. Anything narrower than a pixel still
    /// covers one so thin marks survive low resolutions.
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, (r, g, b): Rgb) {
        let (width, height) = (self.img.width() as i64, self.img.height() as i64);
        let px0 = (x * self.scale).round() as i64;
        let py0 = (y * self.scale).round() as i64;
        let px1 = (((x + w) * self.scale).round() as i64).max(px0 + 1);
        let py1 = (((y + h) * self.scale).round() as i64).max(py0 + 1);
        for py in py0.max(0)..py1.min(height) {
            for px in px0.max(0)..px1.min(width) {
                self.img.put_pixel(px as u32, py as u32, image::Rgb([r, g, b]));
            }
        }
    }

    fn write_char(&mut self, text: &Text, origin: (f64, f64, f64), index: usize, char_data: &[u8; 8]) {
        let (x0, y0, y1) = origin;
        let col_w = CHAR_ADVANCE_EM * text.size / GLYPH_COLUMNS as f64;
        let row_h = text.size / GLYPH_ROWS as f64;
        let stroke = if text.bold { col_w * 1.6 } else { col_w };
        let advance = index as f64 * CHAR_ADVANCE_EM * text.size;

        for (j, &row) in char_data.iter().enumerate() {
            for c in 0..GLYPH_COLUMNS - 1 {
                if (row >> (7 - c)) & 1 == 0 {
                    continue;
                }
                let u = advance + c as f64 * col_w;
                let v = j as f64 * row_h;
                if text.vertical {
                    self.fill_rect(x0 + v, y1 - u - stroke, row_h, stroke, text.color);
                } else {
                    self.fill_rect(x0 + u, y0 + v, stroke, row_h, text.color);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &Text) {
        let (x0, y0, _, y1) = text.bounds();
        for (i, c) in text.text.chars().enumerate() {
            self.write_char(text, (x0, y0, y1), i, glyph(c));
        }
    }
}

/// Paint `scene` at `dpi` pixels per inch.
pub fn rasterize(scene: &Scene, dpi: u32) -> RgbImage {
    let scale = dpi as f64 / POINTS_PER_INCH;
    let width = (scene.width * scale).ceil().max(1.0) as u32;
    let height = (scene.height * scale).ceil().max(1.0) as u32;
    debug!("Rasterizing {}x{} pixels at {} DPI", width, height, dpi);

    let (r, g, b) = scene.background;
    let mut canvas = Canvas {
        img: RgbImage::from_pixel(width, height, image::Rgb([r, g, b])),
        scale,
    };
    for element in &scene.elements {
        match element {
            Element::Rect(rect) => canvas.fill_rect(rect.x, rect.y, rect.w, rect.h, rect.fill),
            Element::Text(text) => canvas.draw_text(text),
        }
    }
    canvas.img
}

/// Encode `img` in `format` into memory.
pub fn encode(img: RgbImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut bytes, format)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontMetrics;
    use crate::layout::Align;

    #[test]
    fn test_rect_painted_at_scale() {
        let mut scene = Scene::new(72.0, 36.0, (255, 255, 255));
        scene.rect(36.0, 0.0, 36.0, 36.0, (10, 20, 30));
        let img = rasterize(&scene, 144);
        assert_eq!(img.dimensions(), (144, 72));
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(100, 10).0, [10, 20, 30]);
        assert_eq!(img.get_pixel(143, 71).0, [10, 20, 30]);
    }

    #[test]
    fn test_text_stays_inside_its_box() {
        for vertical in [false, true] {
            let mut scene = Scene::new(200.0, 200.0, (255, 255, 255));
            let text = Text {
                text: "Gene name".into(),
                x: 100.0,
                y: 100.0,
                size: 14.0,
                bold: false,
                vertical,
                along: Align::Middle,
                across: Align::Middle,
                color: (0, 0, 0),
                metrics: FontMetrics::Bitmap,
            };
            let (x0, y0, x1, y1) = text.bounds();
            scene.text(text);
            let img = rasterize(&scene, 72);
            let mut inked = 0;
            for (px, py, p) in img.enumerate_pixels() {
                if p.0 == [0, 0, 0] {
                    inked += 1;
                    assert!((px as f64) >= x0.floor() && (px as f64) < x1.ceil());
                    assert!((py as f64) >= y0.floor() && (py as f64) < y1.ceil());
                }
            }
            assert!(inked > 0);
        }
    }

    #[test]
    fn test_png_signature() {
        let scene = Scene::new(10.0, 10.0, (255, 255, 255));
        let bytes = encode(rasterize(&scene, 150), ImageFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}

//! Placement of every mark of the heatmap in a backend-neutral scene.
//!
//! Coordinates are in points (1/72 inch) with the origin at the top left and
//! y growing downwards. Backends only ever see filled rectangles and text runs.

use crate::dimensions::RenderParams;
use crate::font::{FontMetrics, ASCENT_EM};
use crate::style::{HeatmapStyle, Rgb};
use crate::table::RecoveryMatrix;
use log::debug;

pub const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub fill: Rgb,
}

/// Alignment of a text run relative to its anchor, in the text's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Middle,
    End,
}

impl Align {
    pub fn fraction(self) -> f64 {
        match self {
            Align::Start => 0.0,
            Align::Middle => 0.5,
            Align::End => 1.0,
        }
    }
}

/// A single line of text.
///
/// `along` places the anchor on the reading direction; `across` places it
/// between the top (`Start`) and bottom (`End`) of the em box. Vertical text
/// reads bottom to top with glyph tops facing left. Widths come from
/// `metrics`, which must match the font the backend finally draws with.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub bold: bool,
    pub vertical: bool,
    pub along: Align,
    pub across: Align,
    pub color: Rgb,
    pub metrics: FontMetrics,
}

impl Text {
    pub fn width(&self) -> f64 {
        self.metrics.width(&self.text, self.size, self.bold)
    }

    /// Page-space bounding box as `(x0, y0, x1, y1)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let w = self.width();
        let s = self.size;
        let a = self.along.fraction();
        let c = self.across.fraction();
        if self.vertical {
            let x0 = self.x - c * s;
            let y1 = self.y + a * w;
            (x0, y1 - w, x0 + s, y1)
        } else {
            let x0 = self.x - a * w;
            let y0 = self.y - c * s;
            (x0, y0, x0 + w, y0 + s)
        }
    }

    /// Point on the baseline level with the anchor.
    pub fn baseline_anchor(&self) -> (f64, f64) {
        let shift = (ASCENT_EM - self.across.fraction()) * self.size;
        if self.vertical {
            (self.x + shift, self.y)
        } else {
            (self.x, self.y + shift)
        }
    }

    /// Where the first glyph starts on the baseline, using the shared metrics.
    pub fn baseline_start(&self) -> (f64, f64) {
        let (bx, by) = self.baseline_anchor();
        let offset = self.along.fraction() * self.width();
        if self.vertical {
            (bx, by + offset)
        } else {
            (bx - offset, by)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rect(Rect),
    Text(Text),
}

impl Element {
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Element::Rect(r) => (r.x, r.y, r.x + r.w, r.y + r.h),
            Element::Text(t) => t.bounds(),
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Element::Rect(r) => {
                r.x += dx;
                r.y += dy;
            }
            Element::Text(t) => {
                t.x += dx;
                t.y += dy;
            }
        }
    }
}

/// A page of marks, painted in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Rgb,
    pub elements: Vec<Element>,
}

impl Scene {
    pub fn new(width: f64, height: f64, background: Rgb) -> Self {
        Scene {
            width,
            height,
            background,
            elements: Vec::new(),
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Rgb) {
        self.elements.push(Element::Rect(Rect { x, y, w, h, fill }));
    }

    pub fn text(&mut self, text: Text) {
        self.elements.push(Element::Text(text));
    }

    /// Extent of everything drawn, or `None` for an empty scene.
    pub fn content_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.elements.iter().map(Element::bounds).reduce(|a, b| {
            (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
        })
    }

    /// Shrink (or grow) the page to the drawn content plus `pad` on every side.
    pub fn crop_to_content(&mut self, pad: f64) {
        let Some((x0, y0, x1, y1)) = self.content_bounds() else {
            return;
        };
        let (dx, dy) = (pad - x0, pad - y0);
        for element in &mut self.elements {
            element.translate(dx, dy);
        }
        self.width = x1 - x0 + 2.0 * pad;
        self.height = y1 - y0 + 2.0 * pad;
    }
}

/// Lay the matrix out on a `figure_length x figure_height` inch canvas and crop
/// the result to its tight bounding box. Labels are measured with `metrics`.
pub fn layout(
    matrix: &RecoveryMatrix,
    params: &RenderParams,
    style: &HeatmapStyle,
    metrics: FontMetrics,
) -> Scene {
    let fig_w = params.figure_length * POINTS_PER_INCH;
    let fig_h = params.figure_height * POINTS_PER_INCH;
    let mut scene = Scene::new(fig_w, fig_h, style.background);

    // Axes area shared by the cells and the colour bar
    let ax_left = style.subplot_left * fig_w;
    let full_w = (style.subplot_right - style.subplot_left) * fig_w;
    let ax_top = (1.0 - style.subplot_top) * fig_h;
    let ax_bottom = (1.0 - style.subplot_bottom) * fig_h;
    let ax_h = ax_bottom - ax_top;
    let heat_w = full_w * (1.0 - style.colorbar_fraction - style.colorbar_pad);

    let n_samples = matrix.n_samples();
    let n_genes = matrix.n_genes();
    let cell_w = heat_w / n_genes as f64;
    let cell_h = ax_h / n_samples as f64;
    debug!(
        "Canvas {:.1} x {:.1} pt, cells {:.2} x {:.2} pt",
        fig_w, fig_h, cell_w, cell_h
    );
    debug!(
        "Colormap {} over [{}, {}], text measured as {:?}",
        style.colormap.name, style.vmin, style.vmax, metrics
    );

    for s in 0..n_samples {
        for (g, &ratio) in matrix.row(s).iter().enumerate() {
            scene.rect(
                ax_left + g as f64 * cell_w,
                ax_top + s as f64 * cell_h,
                cell_w,
                cell_h,
                style.colormap.color(ratio, style.vmin, style.vmax),
            );
        }
    }

    let label = |text: &str, x, y, size, vertical, along, across| Text {
        text: text.to_string(),
        x,
        y,
        size,
        bold: false,
        vertical,
        along,
        across,
        color: style.text_color,
        metrics,
    };

    // Gene ticks below the cells
    let gene_label_top = ax_bottom + style.tick_length + style.tick_pad;
    let mut gene_label_extent: f64 = 0.0;
    for (g, gene) in matrix.genes().iter().enumerate() {
        let cx = ax_left + (g as f64 + 0.5) * cell_w;
        scene.rect(
            cx - style.tick_width / 2.0,
            ax_bottom,
            style.tick_width,
            style.tick_length,
            style.text_color,
        );
        let t = label(gene, cx, gene_label_top, params.gene_text_size, true, Align::End, Align::Middle);
        gene_label_extent = gene_label_extent.max(t.width());
        scene.text(t);
    }

    // Sample ticks left of the cells, always horizontal
    let sample_label_right = ax_left - style.tick_length - style.tick_pad;
    let mut sample_label_extent: f64 = 0.0;
    for (s, sample) in matrix.samples().iter().enumerate() {
        let cy = ax_top + (s as f64 + 0.5) * cell_h;
        scene.rect(
            ax_left - style.tick_length,
            cy - style.tick_width / 2.0,
            style.tick_length,
            style.tick_width,
            style.text_color,
        );
        let t = label(sample, sample_label_right, cy, params.sample_text_size, false, Align::End, Align::Middle);
        sample_label_extent = sample_label_extent.max(t.width());
        scene.text(t);
    }

    let heat_cx = ax_left + heat_w / 2.0;
    let heat_cy = ax_top + ax_h / 2.0;
    scene.text(Text {
        bold: true,
        ..label(
            &style.x_label,
            heat_cx,
            gene_label_top + gene_label_extent + style.axis_label_pad,
            style.axis_label_size,
            false,
            Align::Middle,
            Align::Start,
        )
    });
    scene.text(Text {
        bold: true,
        ..label(
            &style.y_label,
            sample_label_right - sample_label_extent - style.axis_label_pad,
            heat_cy,
            style.axis_label_size,
            true,
            Align::Middle,
            Align::End,
        )
    });
    scene.text(Text {
        bold: true,
        ..label(
            &style.title,
            heat_cx,
            ax_top - style.title_offset * ax_h - style.title_pad,
            style.title_size,
            false,
            Align::Middle,
            Align::End,
        )
    });

    // Colour bar, 0 at the bottom
    let cbar_left = ax_left + heat_w + style.colorbar_pad * full_w;
    let cbar_w = (style.colorbar_fraction * full_w).min(ax_h / style.colorbar_aspect);
    let levels = style.colormap.levels();
    let step = ax_h / levels as f64;
    for level in 0..levels {
        let top = ax_bottom - (level + 1) as f64 * step;
        // overlap the next band so vector viewers show no seams
        let overlap = if level + 1 < levels { step * 0.5 } else { 0.0 };
        scene.rect(cbar_left, top, cbar_w, step + overlap, style.colormap.level(level));
    }
    let cbar_right = cbar_left + cbar_w;
    let range = style.vmax - style.vmin;
    for &tick in &style.colorbar_ticks {
        let y = ax_bottom - (tick - style.vmin) / range * ax_h;
        scene.rect(
            cbar_right,
            y - style.tick_width / 2.0,
            style.tick_length,
            style.tick_width,
            style.text_color,
        );
        scene.text(label(
            &format!("{tick:.1}"),
            cbar_right + style.tick_length + style.tick_pad,
            y,
            style.colorbar_text_size,
            false,
            Align::Start,
            Align::Middle,
        ));
    }

    debug!("Laid out {} elements", scene.elements.len());
    scene.crop_to_content(style.bbox_pad);
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LengthTable, DEFAULT_REFERENCE_ID};

    fn scenario() -> RecoveryMatrix {
        LengthTable::from_reader(
            "Species\tgeneA\tgeneB\nMeanLength\t100\t200\nSample1\t50\t200\nSample2\t150\t50\n".as_bytes(),
            DEFAULT_REFERENCE_ID,
        )
        .unwrap()
        .normalize()
        .unwrap()
    }

    fn params() -> RenderParams {
        RenderParams {
            figure_length: 4.0,
            figure_height: 3.0,
            sample_text_size: 10.0,
            gene_text_size: 8.0,
        }
    }

    fn texts(scene: &Scene) -> Vec<&Text> {
        scene
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_text_bounds() {
        let t = Text {
            text: "abcd".into(),
            x: 100.0,
            y: 50.0,
            size: 10.0,
            bold: false,
            vertical: false,
            along: Align::End,
            across: Align::Middle,
            color: (0, 0, 0),
            metrics: FontMetrics::Bitmap,
        };
        assert_eq!(t.bounds(), (76.0, 45.0, 100.0, 55.0));
        let v = Text { vertical: true, ..t };
        assert_eq!(v.bounds(), (95.0, 50.0, 105.0, 74.0));
        let (bx, by) = v.baseline_start();
        assert!((bx - 103.0).abs() < 1e-9);
        assert!((by - 74.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_adds_padding() {
        let mut scene = Scene::new(500.0, 500.0, (255, 255, 255));
        scene.rect(100.0, 200.0, 50.0, 20.0, (0, 0, 0));
        scene.crop_to_content(5.0);
        assert_eq!(scene.width, 60.0);
        assert_eq!(scene.height, 30.0);
        assert_eq!(scene.content_bounds(), Some((5.0, 5.0, 55.0, 25.0)));
    }

    #[test]
    fn test_cells_follow_colormap() {
        let style = HeatmapStyle::default();
        let scene = layout(&scenario(), &params(), &style, FontMetrics::Bitmap);
        let cells: Vec<&Rect> = scene
            .elements
            .iter()
            .take(4)
            .map(|e| match e {
                Element::Rect(r) => r,
                other => panic!("expected a cell, got {other:?}"),
            })
            .collect();
        let black = (0, 0, 0);
        assert_eq!(cells[1].fill, black);
        assert_eq!(cells[2].fill, black);
        assert_eq!(cells[0].fill, style.colormap.color(0.5, 0.0, 1.0));
        assert_eq!(cells[3].fill, style.colormap.color(0.25, 0.0, 1.0));
        // first sample row above the second
        assert!(cells[0].y < cells[2].y);
        assert!(cells[0].x < cells[1].x);
    }

    #[test]
    fn test_labels_and_sizes() {
        let style = HeatmapStyle::default();
        let scene = layout(&scenario(), &params(), &style, FontMetrics::Bitmap);
        let texts = texts(&scene);

        let gene = texts.iter().find(|t| t.text == "geneA").unwrap();
        assert!(gene.vertical);
        assert_eq!(gene.size, 8.0);
        let sample = texts.iter().find(|t| t.text == "Sample2").unwrap();
        assert!(!sample.vertical);
        assert_eq!(sample.size, 10.0);

        let x_label = texts.iter().find(|t| t.text == "Gene name").unwrap();
        assert!(x_label.bold && !x_label.vertical);
        assert_eq!(x_label.size, 14.0);
        let y_label = texts.iter().find(|t| t.text == "Sample name").unwrap();
        assert!(y_label.bold && y_label.vertical);
        let title = texts.iter().find(|t| t.text == style.title).unwrap();
        assert!(title.bold);

        // title sits above every other mark, axis titles clear the tick labels
        let (_, _, _, title_bottom) = title.bounds();
        let others = scene.elements.iter().filter(|e| !matches!(e, Element::Text(t) if t.text == style.title));
        assert!(others.map(|e| e.bounds().1).all(|top| top > title_bottom));
        assert!(x_label.bounds().1 > gene.bounds().3);
        assert!(y_label.bounds().2 < sample.bounds().0);
    }

    #[test]
    fn test_wide_labels_measured_in_helvetica() {
        let m = LengthTable::from_reader(
            "id\tMMMMMMMMMM\tgeneB\nMeanLength\t10\t10\nWWWWWWWW\t5\t5\n".as_bytes(),
            DEFAULT_REFERENCE_ID,
        )
        .unwrap()
        .normalize()
        .unwrap();
        let params = RenderParams {
            gene_text_size: 10.0,
            ..params()
        };
        let scene = layout(&m, &params, &HeatmapStyle::default(), FontMetrics::Helvetica);
        let cell = match &scene.elements[0] {
            Element::Rect(r) => r.clone(),
            other => panic!("expected a cell, got {other:?}"),
        };
        let texts = texts(&scene);

        // vertical gene label reads upwards from its baseline start
        let gene = texts.iter().find(|t| t.text == "MMMMMMMMMM").unwrap();
        let drawn = FontMetrics::Helvetica.width(&gene.text, gene.size, gene.bold);
        assert!((gene.width() - 83.3).abs() < 1e-9);
        let (_, start_y) = gene.baseline_start();
        assert!(start_y - drawn >= cell.y + cell.h);

        let sample = texts.iter().find(|t| t.text == "WWWWWWWW").unwrap();
        let drawn = FontMetrics::Helvetica.width(&sample.text, sample.size, sample.bold);
        let (start_x, _) = sample.baseline_start();
        assert!(start_x >= 0.0);
        assert!(start_x + drawn <= cell.x + 1e-9);
    }

    #[test]
    fn test_colorbar_ticks_present() {
        let scene = layout(&scenario(), &params(), &HeatmapStyle::default(), FontMetrics::Bitmap);
        let texts = texts(&scene);
        for label in ["0.0", "0.2", "0.4", "0.6", "0.8", "1.0"] {
            assert!(texts.iter().any(|t| t.text == label), "{label}");
        }
    }

    #[test]
    fn test_scene_is_cropped() {
        let style = HeatmapStyle::default();
        let scene = layout(&scenario(), &params(), &style, FontMetrics::Bitmap);
        let (x0, y0, x1, y1) = scene.content_bounds().unwrap();
        assert!((x0 - style.bbox_pad).abs() < 1e-9);
        assert!((y0 - style.bbox_pad).abs() < 1e-9);
        assert!((scene.width - (x1 + style.bbox_pad)).abs() < 1e-9);
        assert!((scene.height - (y1 + style.bbox_pad)).abs() < 1e-9);
    }
}

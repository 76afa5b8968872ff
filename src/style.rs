//! Visual conventions of the recovery heatmap, passed explicitly to the
//! renderer so separate renders never share styling state.

pub type Rgb = (u8, u8, u8);

/// Number of discrete levels in a colormap lookup table.
const LUT_SIZE: usize = 256;

/// Anchor points `(x, y0, y1)` of one channel of a piecewise-linear colormap.
type Segments = &'static [(f64, f64, f64)];

/// matplotlib's "bone" segment data.
const BONE_RED: Segments = &[(0.0, 0.0, 0.0), (0.746032, 0.652778, 0.652778), (1.0, 1.0, 1.0)];
const BONE_GREEN: Segments = &[
    (0.0, 0.0, 0.0),
    (0.365079, 0.319444, 0.319444),
    (0.746032, 0.777778, 0.777778),
    (1.0, 1.0, 1.0),
];
const BONE_BLUE: Segments = &[(0.0, 0.0, 0.0), (0.365079, 0.444444, 0.444444), (1.0, 1.0, 1.0)];

fn interpolate(segments: Segments, x: f64) -> f64 {
    for pair in segments.windows(2) {
        let (x0, _, v0) = pair[0];
        let (x1, v1, _) = pair[1];
        if x <= x1 {
            if x1 == x0 {
                return v1;
            }
            return v0 + (v1 - v0) * (x - x0) / (x1 - x0);
        }
    }
    segments.last().map(|s| s.2).unwrap_or(0.0)
}

fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// A sequential colormap quantised into a fixed lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: &'static str,
    lut: Vec<Rgb>,
}

impl Colormap {
    /// Reversed "bone": white at 0, black at 1, with a blue-grey cast between.
    pub fn bone_r() -> Self {
        let lut = (0..LUT_SIZE)
            .map(|i| {
                let x = 1.0 - i as f64 / (LUT_SIZE - 1) as f64;
                (
                    to_byte(interpolate(BONE_RED, x)),
                    to_byte(interpolate(BONE_GREEN, x)),
                    to_byte(interpolate(BONE_BLUE, x)),
                )
            })
            .collect();
        Colormap { name: "bone_r", lut }
    }

    pub fn levels(&self) -> usize {
        self.lut.len()
    }

    /// Colour of lookup table entry `level`.
    pub fn level(&self, level: usize) -> Rgb {
        self.lut[level.min(self.lut.len() - 1)]
    }

    /// Colour for `value` on the scale `[vmin, vmax]`; out-of-range values take
    /// the nearest extreme.
    pub fn color(&self, value: f64, vmin: f64, vmax: f64) -> Rgb {
        let n = self.lut.len();
        let t = if vmax > vmin { (value - vmin) / (vmax - vmin) } else { 0.0 };
        let idx = if t.is_nan() || t <= 0.0 {
            0
        } else {
            ((t * n as f64) as usize).min(n - 1)
        };
        self.lut[idx]
    }
}

/// Everything about how the heatmap looks, independent of the data.
#[derive(Debug, Clone)]
pub struct HeatmapStyle {
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,

    pub background: Rgb,
    pub text_color: Rgb,

    pub title: String,
    pub title_size: f64,
    /// Gap between the top of the cells and the title, as a fraction of the cell area height.
    pub title_offset: f64,
    pub title_pad: f64,

    pub x_label: String,
    pub y_label: String,
    pub axis_label_size: f64,
    pub axis_label_pad: f64,

    pub tick_length: f64,
    pub tick_width: f64,
    pub tick_pad: f64,

    /// Subplot margins as fractions of the figure (matplotlib's defaults).
    pub subplot_left: f64,
    pub subplot_right: f64,
    pub subplot_bottom: f64,
    pub subplot_top: f64,

    pub colorbar_fraction: f64,
    pub colorbar_pad: f64,
    pub colorbar_aspect: f64,
    pub colorbar_ticks: Vec<f64>,
    pub colorbar_text_size: f64,

    /// Whitespace kept around the drawn content after cropping, in points.
    pub bbox_pad: f64,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        HeatmapStyle {
            colormap: Colormap::bone_r(),
            vmin: 0.0,
            vmax: 1.0,
            background: (255, 255, 255),
            text_color: (38, 38, 38),
            title: "Percentage length recovery for each gene, relative to mean of targetfile references"
                .to_string(),
            title_size: 14.0,
            title_offset: 0.05,
            title_pad: 6.0,
            x_label: "Gene name".to_string(),
            y_label: "Sample name".to_string(),
            axis_label_size: 14.0,
            axis_label_pad: 20.0,
            tick_length: 6.0,
            tick_width: 1.25,
            tick_pad: 3.5,
            subplot_left: 0.125,
            subplot_right: 0.9,
            subplot_bottom: 0.11,
            subplot_top: 0.88,
            colorbar_fraction: 0.15,
            colorbar_pad: 0.05,
            colorbar_aspect: 20.0,
            colorbar_ticks: vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0],
            colorbar_text_size: 11.0,
            bbox_pad: 7.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_r_extremes() {
        let cmap = Colormap::bone_r();
        assert_eq!(cmap.name, "bone_r");
        assert_eq!(cmap.levels(), 256);
        assert_eq!(cmap.color(0.0, 0.0, 1.0), (255, 255, 255));
        assert_eq!(cmap.color(1.0, 0.0, 1.0), (0, 0, 0));
    }

    #[test]
    fn test_bone_r_is_light_to_dark() {
        let cmap = Colormap::bone_r();
        let lum = |(r, g, b): Rgb| r as u32 + g as u32 + b as u32;
        for i in 1..cmap.levels() {
            assert!(lum(cmap.level(i)) <= lum(cmap.level(i - 1)));
        }
        // bluish mid-tones
        let (r, _, b) = cmap.color(0.5, 0.0, 1.0);
        assert!(b > r);
    }

    #[test]
    fn test_scale_is_fixed_and_clamped() {
        let cmap = Colormap::bone_r();
        assert_eq!(cmap.color(-0.5, 0.0, 1.0), cmap.color(0.0, 0.0, 1.0));
        assert_eq!(cmap.color(3.0, 0.0, 1.0), cmap.color(1.0, 0.0, 1.0));
        assert_eq!(cmap.color(f64::NAN, 0.0, 1.0), (255, 255, 255));
    }
}

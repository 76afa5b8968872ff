use crate::dimensions::RenderParams;
use crate::error::{HeatmapError, Result};
use crate::font::FontMetrics;
use crate::layout::{layout, POINTS_PER_INCH};
use crate::output::{check_destination, write_atomically, OutputFormat};
use crate::pdf::render_pdf;
use crate::postscript::render_eps;
use crate::raster::{encode, rasterize};
use crate::style::HeatmapStyle;
use crate::svg::render_svg;
use crate::table::RecoveryMatrix;
use image::ImageFormat;
use log::{debug, info};
use std::io;
use std::path::Path;

/// Largest raster side length in pixels.
const MAX_RASTER_SIDE: u32 = 65535;

/// Draw the heatmap and return the encoded file contents.
pub fn render_bytes(
    matrix: &RecoveryMatrix,
    params: &RenderParams,
    format: OutputFormat,
    dpi: u32,
    style: &HeatmapStyle,
) -> Result<Vec<u8>> {
    if dpi == 0 {
        return Err(HeatmapError::InvalidDimension {
            name: "dpi",
            value: 0.0,
        });
    }

    // text is measured in the font the chosen backend draws with
    let metrics = if format.is_raster() {
        FontMetrics::Bitmap
    } else {
        FontMetrics::Helvetica
    };
    let scene = layout(matrix, params, style, metrics);
    debug!(
        "Cropped page is {:.1} x {:.1} pt",
        scene.width, scene.height
    );

    let raster = |image_format: ImageFormat| -> Result<Vec<u8>> {
        let scale = dpi as f64 / POINTS_PER_INCH;
        let (width, height) = (
            (scene.width * scale).ceil(),
            (scene.height * scale).ceil(),
        );
        if width > MAX_RASTER_SIDE as f64 || height > MAX_RASTER_SIDE as f64 {
            return Err(HeatmapError::RasterTooLarge {
                width: width as u64,
                height: height as u64,
                dpi,
                max: MAX_RASTER_SIDE,
            });
        }
        encode(rasterize(&scene, dpi), image_format).map_err(|e| HeatmapError::Write {
            path: Default::default(),
            source: io::Error::other(e),
        })
    };

    match format {
        OutputFormat::Png => raster(ImageFormat::Png),
        OutputFormat::Tiff => raster(ImageFormat::Tiff),
        OutputFormat::Svg => Ok(render_svg(&scene).into_bytes()),
        OutputFormat::Eps => Ok(render_eps(&scene).into_bytes()),
        OutputFormat::Pdf => render_pdf(&scene).map_err(|source| HeatmapError::Write {
            path: Default::default(),
            source,
        }),
    }
}

/// Render `matrix` with the standard style and write it to `output_path`.
pub fn render(
    matrix: &RecoveryMatrix,
    params: &RenderParams,
    output_path: &Path,
    format: OutputFormat,
    dpi: u32,
) -> Result<()> {
    render_with_style(matrix, params, output_path, format, dpi, &HeatmapStyle::default())
}

/// Render with an explicit style. Nothing is written unless every step succeeds.
pub fn render_with_style(
    matrix: &RecoveryMatrix,
    params: &RenderParams,
    output_path: &Path,
    format: OutputFormat,
    dpi: u32,
    style: &HeatmapStyle,
) -> Result<()> {
    check_destination(output_path)?;

    let bytes = render_bytes(matrix, params, format, dpi, style).map_err(|e| match e {
        HeatmapError::Write { source, .. } => HeatmapError::Write {
            path: output_path.to_path_buf(),
            source,
        },
        e => e,
    })?;

    if format.is_raster() {
        info!("Saving heatmap as file {:?} at {} DPI", output_path, dpi);
    } else {
        info!("Saving heatmap as file {:?}", output_path);
    }
    write_atomically(output_path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LengthTable, DEFAULT_REFERENCE_ID};

    fn matrix() -> RecoveryMatrix {
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
            figure_length: 2.0,
            figure_height: 2.0,
            sample_text_size: 10.0,
            gene_text_size: 10.0,
        }
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let err = render_bytes(&matrix(), &params(), OutputFormat::Png, 0, &HeatmapStyle::default())
            .unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidDimension { name: "dpi", .. }));
    }

    #[test]
    fn test_oversized_raster_rejected() {
        let big = RenderParams {
            figure_length: 2000.0,
            ..params()
        };
        let err = render_bytes(&matrix(), &big, OutputFormat::Tiff, 600, &HeatmapStyle::default())
            .unwrap_err();
        match err {
            HeatmapError::RasterTooLarge { width, height, dpi, max } => {
                assert!(width > max as u64);
                assert!(height <= max as u64);
                assert_eq!(dpi, 600);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // vector output has no pixel limit
        assert!(render_bytes(&matrix(), &big, OutputFormat::Svg, 600, &HeatmapStyle::default()).is_ok());
    }

    #[test]
    fn test_dpi_scales_raster() {
        let style = HeatmapStyle::default();
        let low = image::load_from_memory(
            &render_bytes(&matrix(), &params(), OutputFormat::Png, 72, &style).unwrap(),
        )
        .unwrap();
        let high = image::load_from_memory(
            &render_bytes(&matrix(), &params(), OutputFormat::Png, 144, &style).unwrap(),
        )
        .unwrap();
        let (lw, lh) = (low.width() as i64, low.height() as i64);
        let (hw, hh) = (high.width() as i64, high.height() as i64);
        assert!((hw - 2 * lw).abs() <= 1);
        assert!((hh - 2 * lh).abs() <= 1);
    }

    #[test]
    fn test_missing_directory_fails_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("heatmap.png");
        let err = render(&matrix(), &params(), &path, OutputFormat::Png, 150).unwrap_err();
        assert!(matches!(err, HeatmapError::Write { .. }));
    }
}

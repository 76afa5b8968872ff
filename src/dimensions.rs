use crate::error::{HeatmapError, Result};
use crate::table::RecoveryMatrix;
use log::info;

/// Label size used when no override is given, in points.
pub const DEFAULT_TEXT_SIZE: f64 = 10.0;

/// Rows (or columns) of cells per inch of figure.
const CELLS_PER_INCH: f64 = 3.0;

/// Resolved figure size (inches) and tick label sizes (points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub figure_length: f64,
    pub figure_height: f64,
    pub sample_text_size: f64,
    pub gene_text_size: f64,
}

/// Caller-supplied overrides; `None` means "derive from the matrix".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DimensionOverrides {
    pub figure_length: Option<f64>,
    pub figure_height: Option<f64>,
    pub sample_text_size: Option<f64>,
    pub gene_text_size: Option<f64>,
}

fn checked(name: &'static str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => {
            Err(HeatmapError::InvalidDimension { name, value: v })
        }
        v => Ok(v),
    }
}

/// Reject any override that is not a positive finite number.
pub fn validate_overrides(overrides: &DimensionOverrides) -> Result<()> {
    checked("figure_length", overrides.figure_length)?;
    checked("figure_height", overrides.figure_height)?;
    checked("sample_text_size", overrides.sample_text_size)?;
    checked("gene_text_size", overrides.gene_text_size)?;
    Ok(())
}

/// Work out figure dimensions and label sizes from the shape of `matrix`.
///
/// Each parameter is resolved on its own: an override is returned unchanged,
/// otherwise text sizes fall back to [`DEFAULT_TEXT_SIZE`] and the figure gets
/// one inch per three samples (height) or per three genes (length).
pub fn derive_render_params(
    matrix: &RecoveryMatrix,
    overrides: &DimensionOverrides,
) -> Result<RenderParams> {
    let figure_length = checked("figure_length", overrides.figure_length)?;
    let figure_height = checked("figure_height", overrides.figure_height)?;
    let sample_text_size = checked("sample_text_size", overrides.sample_text_size)?;
    let gene_text_size = checked("gene_text_size", overrides.gene_text_size)?;

    let num_samples = matrix.n_samples();
    let num_genes = matrix.n_genes();
    info!("Number of samples in input lengths file is: {}", num_samples);
    info!("Number of genes in input lengths file is: {}", num_genes);

    let params = RenderParams {
        figure_length: figure_length.unwrap_or(num_genes as f64 / CELLS_PER_INCH),
        figure_height: figure_height.unwrap_or(num_samples as f64 / CELLS_PER_INCH),
        sample_text_size: sample_text_size.unwrap_or(DEFAULT_TEXT_SIZE),
        gene_text_size: gene_text_size.unwrap_or(DEFAULT_TEXT_SIZE),
    };

    info!(
        "figure_length: {:.2} inches, figure_height: {:.2} inches, sample_text_size: {} points, gene_text_size: {} points",
        params.figure_length, params.figure_height, params.sample_text_size, params.gene_text_size
    );
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Recovery, RecoveryMatrix};

    fn matrix(samples: usize, genes: usize) -> RecoveryMatrix {
        let mut records = Vec::new();
        for s in 0..samples {
            for g in 0..genes {
                records.push(Recovery {
                    sample: format!("sample{s}"),
                    gene: format!("gene{g}"),
                    ratio: 0.5,
                });
            }
        }
        RecoveryMatrix::pivot(records).unwrap()
    }

    #[test]
    fn test_default_dimensions() {
        let p = derive_render_params(&matrix(30, 60), &DimensionOverrides::default()).unwrap();
        assert_eq!(p.figure_height, 10.0);
        assert_eq!(p.figure_length, 20.0);
        assert_eq!(p.sample_text_size, 10.0);
        assert_eq!(p.gene_text_size, 10.0);
    }

    #[test]
    fn test_overrides_returned_unchanged() {
        let overrides = DimensionOverrides {
            figure_length: Some(7.5),
            figure_height: Some(3.0),
            sample_text_size: Some(14.0),
            gene_text_size: Some(6.0),
        };
        for (s, g) in [(1, 1), (30, 60), (250, 400)] {
            let p = derive_render_params(&matrix(s, g), &overrides).unwrap();
            assert_eq!(
                p,
                RenderParams {
                    figure_length: 7.5,
                    figure_height: 3.0,
                    sample_text_size: 14.0,
                    gene_text_size: 6.0,
                }
            );
        }
    }

    #[test]
    fn test_sample_text_size_override_alone() {
        let overrides = DimensionOverrides {
            sample_text_size: Some(14.0),
            ..Default::default()
        };
        let p = derive_render_params(&matrix(90, 3), &overrides).unwrap();
        assert_eq!(p.sample_text_size, 14.0);
        assert_eq!(p.gene_text_size, DEFAULT_TEXT_SIZE);
        assert_eq!(p.figure_height, 30.0);
        assert_eq!(p.figure_length, 1.0);
    }

    #[test]
    fn test_idempotent() {
        let m = matrix(7, 11);
        let o = DimensionOverrides {
            figure_height: Some(4.0),
            ..Default::default()
        };
        assert_eq!(
            derive_render_params(&m, &o).unwrap(),
            derive_render_params(&m, &o).unwrap()
        );
    }

    #[test]
    fn test_non_positive_override_rejected() {
        let m = matrix(2, 2);
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let o = DimensionOverrides {
                gene_text_size: Some(bad),
                ..Default::default()
            };
            match derive_render_params(&m, &o) {
                Err(HeatmapError::InvalidDimension { name, .. }) => assert_eq!(name, "gene_text_size"),
                other => panic!("unexpected result {other:?}"),
            }
        }
    }
}

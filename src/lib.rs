/*!

# recovery_heatmap - how much of each gene did each sample recover?

Takes the sequence length table written by a target-capture assembly pipeline
(one row of mean reference lengths per gene, then one row per sample) and draws
a heatmap of the fraction of the reference length recovered for every sample
and gene.

```text
Species     geneA  geneB
MeanLength  100    200
Sample1     50     200
Sample2     150    50
```

gives Sample1 = {geneA: 0.5, geneB: 1.0} and Sample2 = {geneA: 1.0, geneB: 0.25};
recoveries longer than the reference are capped at 1.0 so the colour scale
always spans [0, 1].

The pipeline is load -> normalize -> size -> render; each step is usable on its own.
 */

pub mod dimensions;
pub mod error;
pub mod font;
pub mod layout;
pub mod output;
pub mod pdf;
pub mod postscript;
pub mod raster;
pub mod render;
pub mod style;
pub mod svg;
pub mod table;

pub use dimensions::{derive_render_params, DimensionOverrides, RenderParams};
pub use error::{HeatmapError, Result};
pub use output::OutputFormat;
pub use render::{render, render_with_style};
pub use style::HeatmapStyle;
pub use table::{load_and_normalize, RecoveryMatrix, DEFAULT_REFERENCE_ID};

use log::info;
use std::path::{Path, PathBuf};

pub const DEFAULT_DPI: u32 = 150;

/// One heatmap invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub dpi: u32,
    pub overrides: DimensionOverrides,
    pub reference_id: String,
}

impl RunConfig {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        RunConfig {
            input,
            output,
            format: OutputFormat::Png,
            dpi: DEFAULT_DPI,
            overrides: DimensionOverrides::default(),
            reference_id: DEFAULT_REFERENCE_ID.to_string(),
        }
    }

    /// Read `file` from `folder` and write `<folder>/<stem>.<filetype>` next
    /// to it. An unknown `filetype` is rejected here, before anything runs.
    pub fn in_folder(folder: &Path, file: &Path, stem: &str, filetype: &str) -> Result<Self> {
        let format: OutputFormat = filetype.parse()?;
        let output = folder.join(format!("{}.{}", stem, format.extension()));
        Ok(RunConfig {
            format,
            ..RunConfig::new(folder.join(file), output)
        })
    }
}

/// Run the whole pipeline and return the path of the written heatmap.
pub fn run(config: &RunConfig) -> Result<PathBuf> {
    run_with_style(config, &HeatmapStyle::default())
}

pub fn run_with_style(config: &RunConfig, style: &HeatmapStyle) -> Result<PathBuf> {
    // overrides are checked before the table is even read
    dimensions::validate_overrides(&config.overrides)?;
    output::check_destination(&config.output)?;

    let matrix = load_and_normalize(&config.input, &config.reference_id)?;
    let params = derive_render_params(&matrix, &config.overrides)?;
    render_with_style(
        &matrix,
        &params,
        &config.output,
        config.format,
        config.dpi,
        style,
    )?;
    info!("Done.");
    Ok(config.output.clone())
}

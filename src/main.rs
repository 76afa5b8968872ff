use clap::Parser;
use log::info;
use recovery_heatmap::{run, DimensionOverrides, RunConfig, DEFAULT_DPI, DEFAULT_REFERENCE_ID};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recovery_heatmap")]
#[command(
    about = "Heatmap of percentage length recovery per sample and gene, relative to the mean reference length.",
    long_about = None
)]
struct Args {
    // MANDATORY OPTIONS
    /// Load per-sample gene lengths from this tab-delimited FILE (first data row holds mean reference lengths).
    #[arg(value_name = "FILE")]
    seq_lengths_file: PathBuf,

    /// Parent folder holding the lengths file; the heatmap is written there too.
    #[arg(short = 'o', long = "output-folder", value_name = "DIR")]
    output_folder: Option<PathBuf>,

    // Output Options
    /// Filename stem for the output heatmap.
    #[arg(long = "heatmap-filename", value_name = "STEM", default_value = "recovery_heatmap")]
    heatmap_filename: String,

    /// File type to save the heatmap as: png, pdf, eps, tiff or svg.
    #[arg(long = "heatmap-filetype", value_name = "TYPE", default_value = "png")]
    heatmap_filetype: String,

    /// Dots per inch for raster output.
    #[arg(long = "heatmap-dpi", value_name = "N", default_value_t = DEFAULT_DPI)]
    heatmap_dpi: u32,

    // Dimension Options
    /// Figure length in inches (default: number of genes / 3).
    #[arg(long = "figure-length", value_name = "INCHES")]
    figure_length: Option<f64>,

    /// Figure height in inches (default: number of samples / 3).
    #[arg(long = "figure-height", value_name = "INCHES")]
    figure_height: Option<f64>,

    /// Size in points of the sample labels (default: 10).
    #[arg(long = "sample-text-size", value_name = "POINTS")]
    sample_text_size: Option<f64>,

    /// Size in points of the gene labels (default: 10).
    #[arg(long = "gene-text-size", value_name = "POINTS")]
    gene_text_size: Option<f64>,

    // Table Options
    /// Identifier of the reference row holding mean gene lengths.
    #[arg(long = "reference-id", value_name = "NAME", default_value = DEFAULT_REFERENCE_ID)]
    reference_id: String,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    info!(
        "recovery_heatmap was called with these arguments: {}",
        std::env::args().skip(1).collect::<Vec<_>>().join(" ")
    );

    let parent_dir = args.output_folder.unwrap_or_else(|| PathBuf::from("."));
    let mut config = match RunConfig::in_folder(
        &parent_dir,
        &args.seq_lengths_file,
        &args.heatmap_filename,
        &args.heatmap_filetype,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.dpi = args.heatmap_dpi;
    config.overrides = DimensionOverrides {
        figure_length: args.figure_length,
        figure_height: args.figure_height,
        sample_text_size: args.sample_text_size,
        gene_text_size: args.gene_text_size,
    };
    config.reference_id = args.reference_id;

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

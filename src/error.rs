use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeatmapError>;

/// Every way a heatmap run can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("can not find file {path:?}; is it in the current working directory? alternatively, supply a parent folder with --output-folder")]
    MissingFile { path: PathBuf },

    #[error("malformed length table at line {line}{}: {reason}", column_suffix(.column))]
    MalformedTable {
        line: u64,
        column: Option<String>,
        reason: String,
    },

    #[error("reference length for gene {gene:?} is zero; recovery ratio is undefined")]
    DegenerateReference { gene: String },

    #[error("{name} must be a positive number, got {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("heatmap would be {width} x {height} pixels at {dpi} DPI, more than {max} on a side; lower the DPI or the figure size")]
    RasterTooLarge {
        width: u64,
        height: u64,
        dpi: u32,
        max: u32,
    },

    #[error("unsupported output format {0:?} (expected one of png, pdf, eps, tiff, svg)")]
    UnsupportedFormat(String),

    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HeatmapError {
    pub(crate) fn malformed(line: u64, column: Option<&str>, reason: impl Into<String>) -> Self {
        HeatmapError::MalformedTable {
            line,
            column: column.map(str::to_string),
            reason: reason.into(),
        }
    }
}

fn column_suffix(column: &Option<String>) -> String {
    match column {
        Some(c) => format!(", column {c:?}"),
        None => String::new(),
    }
}

use crate::error::{HeatmapError, Result};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Pdf,
    Eps,
    Tiff,
    Svg,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Png,
        OutputFormat::Pdf,
        OutputFormat::Eps,
        OutputFormat::Tiff,
        OutputFormat::Svg,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Eps => "eps",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Svg => "svg",
        }
    }

    /// Whether the DPI setting affects this format.
    pub fn is_raster(self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::Tiff)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match wanted.as_str() {
            "tif" => Ok(OutputFormat::Tiff),
            _ => OutputFormat::ALL
                .into_iter()
                .find(|f| f.extension() == wanted)
                .ok_or_else(|| HeatmapError::UnsupportedFormat(s.to_string())),
        }
    }
}

fn destination_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Fail with a write error unless the directory that will hold `path` exists.
pub fn check_destination(path: &Path) -> Result<()> {
    let parent = destination_dir(path);
    if parent.is_dir() {
        Ok(())
    } else {
        Err(HeatmapError::Write {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory {parent:?} does not exist"),
            ),
        })
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory that
/// is renamed into place only once fully written. On failure the temporary file
/// is removed and `path` is left untouched.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    check_destination(path)?;
    let write_err = |source: io::Error| HeatmapError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".recovery_heatmap")
        .suffix(".part")
        .tempfile_in(destination_dir(path))
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

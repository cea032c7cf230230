//! Mosaic output types and errors

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use image::ImageFormat;
use thiserror::Error;

/// Encoding of the stitched mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Baseline JPEG, RGB only
    #[default]
    Jpeg,
    /// PNG, keeps alpha
    Png,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(format!("unknown output format '{}' (expected jpg or png)", other)),
        }
    }
}

/// Per-slot problem found while stitching.
///
/// Neither kind aborts the mosaic; the affected cell stays blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileDiagnostic {
    /// The slot file was not on disk.
    Missing { index: usize, path: PathBuf },
    /// The slot file could not be decoded or is too small to crop.
    ///
    /// `quarantined` is where the file was moved, if moving it succeeded.
    Corrupt {
        index: usize,
        quarantined: Option<PathBuf>,
        reason: String,
    },
}

impl TileDiagnostic {
    pub fn index(&self) -> usize {
        match self {
            TileDiagnostic::Missing { index, .. } | TileDiagnostic::Corrupt { index, .. } => *index,
        }
    }
}

/// Result of a successful stitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchReport {
    /// Path of the saved mosaic
    pub output: PathBuf,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Number of patches pasted onto the canvas
    pub placed: usize,
    /// Missing and corrupt slots, ordered by index
    pub diagnostics: Vec<TileDiagnostic>,
}

impl StitchReport {
    pub fn missing(&self) -> impl Iterator<Item = &TileDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, TileDiagnostic::Missing { .. }))
    }

    pub fn corrupt(&self) -> impl Iterator<Item = &TileDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, TileDiagnostic::Corrupt { .. }))
    }

    /// True when every cell of the canvas holds a patch.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Errors that prevent a mosaic from being produced.
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("Cannot stitch an empty grid ({width}x{height} patches)")]
    EmptyGrid { width: usize, height: usize },

    #[error("Mosaic of {width}x{height} patches at {tile_size} px exceeds the maximum canvas size")]
    TooLarge {
        width: usize,
        height: usize,
        tile_size: u32,
    },

    #[error("Failed to encode mosaic {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

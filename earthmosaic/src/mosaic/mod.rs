//! Mosaic assembly.
//!
//! Stitches the tile slots of one mapping run into a single image. Each slot
//! holds a patch as served by the provider, taller than `tile_size` so the
//! logo and attribution bands can be cut off. The assembler keeps rows
//! `[header_crop, header_crop + tile_size)` of every patch and pastes them at
//! `(col * tile_size, row * tile_size)`.
//!
//! Slots that are missing or cannot be decoded do not abort the mosaic: their
//! cells stay blank and are reported as [`TileDiagnostic`]s. Corrupt slots are
//! moved to the quarantine directory rather than deleted. Slots that were
//! placed are removed only after the mosaic has been written.

mod types;

pub use types::{MosaicError, OutputFormat, StitchReport, TileDiagnostic};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, ImageReader, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::slot::{part_path, SlotStore, TileSlot};

/// Largest canvas edge in pixels.
///
/// Baseline JPEG cannot encode anything wider or taller.
pub const MAX_CANVAS_DIMENSION: u32 = 65_535;

/// File name of a finished mosaic: `map_<location>_z<zoom>.<ext>`.
pub fn mosaic_file_name(location: &str, zoom: u8, format: OutputFormat) -> String {
    format!("map_{}_z{}.{}", location, zoom, format.extension())
}

/// Outcome of loading one slot.
enum PatchLoad {
    Loaded(RgbaImage),
    Missing(PathBuf),
    Corrupt(String),
}

/// Stitches tile slots into a mosaic image.
#[derive(Debug, Clone)]
pub struct MosaicAssembler {
    store: SlotStore,
    quarantine_dir: PathBuf,
    tile_size: u32,
    header_crop: u32,
    format: OutputFormat,
}

impl MosaicAssembler {
    /// Creates an assembler writing JPEG mosaics next to the slots in `store`.
    pub fn new(
        store: SlotStore,
        quarantine_dir: impl Into<PathBuf>,
        tile_size: u32,
        header_crop: u32,
    ) -> Self {
        Self {
            store,
            quarantine_dir: quarantine_dir.into(),
            tile_size,
            header_crop,
            format: OutputFormat::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Where the mosaic for `location` at `zoom` is written.
    pub fn output_path(&self, location: &str, zoom: u8) -> PathBuf {
        self.store
            .directory()
            .join(mosaic_file_name(location, zoom, self.format))
    }

    /// Stitches a `width` x `height` patch grid and saves the mosaic.
    ///
    /// # Errors
    ///
    /// Fails only if the grid is empty, the canvas would be too large, or the
    /// mosaic cannot be written. Per-slot problems are reported in the
    /// returned [`StitchReport`].
    pub fn stitch(
        &self,
        width: usize,
        height: usize,
        location: &str,
        zoom: u8,
    ) -> Result<StitchReport, MosaicError> {
        if width == 0 || height == 0 {
            return Err(MosaicError::EmptyGrid { width, height });
        }
        let (canvas_width, canvas_height) = self.canvas_size(width, height)?;

        let mut canvas = RgbaImage::new(canvas_width, canvas_height);
        let mut diagnostics = Vec::new();
        let mut placed = Vec::new();

        for row in 0..height {
            // Decode one row at a time to bound memory on large grids
            let patches: Vec<(usize, PatchLoad)> = (0..width)
                .into_par_iter()
                .map(|col| {
                    let index = row * width + col;
                    (index, self.load_patch(&TileSlot::new(location, zoom, index)))
                })
                .collect();

            for (index, patch) in patches {
                let col = index % width;
                match patch {
                    PatchLoad::Loaded(image) => {
                        let x = col as i64 * self.tile_size as i64;
                        let y = row as i64 * self.tile_size as i64;
                        imageops::replace(&mut canvas, &image, x, y);
                        placed.push(index);
                    }
                    PatchLoad::Missing(path) => {
                        warn!(
                            index,
                            path = %path.display(),
                            "Tile slot missing, leaving cell blank"
                        );
                        diagnostics.push(TileDiagnostic::Missing { index, path });
                    }
                    PatchLoad::Corrupt(reason) => {
                        diagnostics.push(self.quarantine(location, zoom, index, reason));
                    }
                }
            }
        }

        let output = self.output_path(location, zoom);
        self.save(canvas, &output)?;

        for &index in &placed {
            let slot = TileSlot::new(location, zoom, index);
            if let Err(e) = self.store.remove(&slot) {
                warn!(index, error = %e, "Failed to remove consumed tile slot");
            }
        }

        info!(
            output = %output.display(),
            width = canvas_width,
            height = canvas_height,
            placed = placed.len(),
            problems = diagnostics.len(),
            "Mosaic saved"
        );

        Ok(StitchReport {
            output,
            width: canvas_width,
            height: canvas_height,
            placed: placed.len(),
            diagnostics,
        })
    }

    /// Pixel size of the mosaic for a `width` x `height` patch grid.
    ///
    /// # Errors
    ///
    /// [`MosaicError::TooLarge`] when either edge exceeds
    /// [`MAX_CANVAS_DIMENSION`].
    pub fn canvas_size(&self, width: usize, height: usize) -> Result<(u32, u32), MosaicError> {
        let too_large = || MosaicError::TooLarge {
            width,
            height,
            tile_size: self.tile_size,
        };
        let edge = |patches: usize| -> Result<u32, MosaicError> {
            let patches = u32::try_from(patches).map_err(|_| too_large())?;
            patches
                .checked_mul(self.tile_size)
                .filter(|px| *px <= MAX_CANVAS_DIMENSION)
                .ok_or_else(too_large)
        };
        Ok((edge(width)?, edge(height)?))
    }

    fn load_patch(&self, slot: &TileSlot) -> PatchLoad {
        let path = self.store.path(slot);
        let reader = match ImageReader::open(&path) {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return PatchLoad::Missing(path),
            Err(e) => return PatchLoad::Corrupt(e.to_string()),
        };
        let decoded = reader
            .with_guessed_format()
            .map_err(|e| e.to_string())
            .and_then(|r| r.decode().map_err(|e| e.to_string()));
        let image = match decoded {
            Ok(image) => image,
            Err(reason) => return PatchLoad::Corrupt(reason),
        };

        let needed_height = self.header_crop + self.tile_size;
        if image.width() < self.tile_size || image.height() < needed_height {
            return PatchLoad::Corrupt(format!(
                "patch is {}x{}, need at least {}x{}",
                image.width(),
                image.height(),
                self.tile_size,
                needed_height
            ));
        }

        PatchLoad::Loaded(
            image
                .crop_imm(0, self.header_crop, self.tile_size, self.tile_size)
                .to_rgba8(),
        )
    }

    fn quarantine(&self, location: &str, zoom: u8, index: usize, reason: String) -> TileDiagnostic {
        let slot = TileSlot::new(location, zoom, index);
        let quarantined = match self.store.quarantine(&slot, &self.quarantine_dir) {
            Ok(path) => {
                warn!(
                    index,
                    reason = %reason,
                    moved_to = %path.display(),
                    "Corrupt tile quarantined"
                );
                Some(path)
            }
            Err(e) => {
                warn!(index, reason = %reason, error = %e, "Corrupt tile could not be quarantined");
                None
            }
        };
        TileDiagnostic::Corrupt {
            index,
            quarantined,
            reason,
        }
    }

    /// Encodes to a `.part` file and renames it into place.
    fn save(&self, canvas: RgbaImage, output: &Path) -> Result<(), MosaicError> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|source| MosaicError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = part_path(output);
        let encoded = match self.format {
            OutputFormat::Jpeg => DynamicImage::ImageRgba8(canvas)
                .to_rgb8()
                .save_with_format(&tmp, self.format.image_format()),
            OutputFormat::Png => canvas.save_with_format(&tmp, self.format.image_format()),
        };
        if let Err(source) = encoded {
            let _ = fs::remove_file(&tmp);
            return Err(MosaicError::Encode {
                path: output.to_path_buf(),
                source,
            });
        }

        fs::rename(&tmp, output).map_err(|source| MosaicError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        debug!(path = %output.display(), format = %self.format, "Mosaic written");
        Ok(())
    }
}

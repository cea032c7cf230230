//! On-disk tile slots.
//!
//! Every downloaded patch is kept as `tmp_<location>_<zoom>_<index>.jpg` in the
//! output directory until the mosaic consumes it. A slot file existing means
//! the patch was fetched; interrupted runs resume by skipping present slots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Identifies one cached patch of one mapping run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileSlot {
    pub location: String,
    pub zoom: u8,
    /// Row-major grid index
    pub index: usize,
}

impl TileSlot {
    pub fn new(location: &str, zoom: u8, index: usize) -> Self {
        Self {
            location: location.to_string(),
            zoom,
            index,
        }
    }

    /// File name of this slot: `tmp_<location>_<zoom>_<index>.jpg`.
    pub fn file_name(&self) -> String {
        format!("tmp_{}_{}_{}.jpg", self.location, self.zoom, self.index)
    }
}

/// Makes a location name safe to embed in a file name.
pub fn sanitize_location_name(name: &str) -> String {
    name.trim().replace(['/', '\\'], "-")
}

/// Temporary sibling used for write-then-rename.
pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Directory holding tile slot files.
#[derive(Debug, Clone)]
pub struct SlotStore {
    directory: PathBuf,
}

impl SlotStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of a slot file.
    pub fn path(&self, slot: &TileSlot) -> PathBuf {
        self.directory.join(slot.file_name())
    }

    /// True if the slot has been fetched.
    pub fn contains(&self, slot: &TileSlot) -> bool {
        self.path(slot).is_file()
    }

    /// Writes slot bytes atomically.
    ///
    /// Data goes to a `.part` file first and is renamed into place, so a slot
    /// file is never observed half-written.
    pub fn write(&self, slot: &TileSlot, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path(slot);
        let tmp = part_path(&path);
        fs::write(&tmp, bytes)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(path)
    }

    /// Deletes a slot file.
    pub fn remove(&self, slot: &TileSlot) -> io::Result<()> {
        fs::remove_file(self.path(slot))
    }

    /// Moves a slot file into `quarantine_dir`, returning its new location.
    ///
    /// The file is preserved for inspection. A later run will fetch the slot
    /// again because it is no longer present in the store. Earlier copies of
    /// the same slot are kept: the new one gets a `.1`, `.2`, ... suffix.
    pub fn quarantine(&self, slot: &TileSlot, quarantine_dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(quarantine_dir)?;
        let source = self.path(slot);
        let target = free_quarantine_path(quarantine_dir, &slot.file_name());

        match fs::rename(&source, &target) {
            Ok(()) => Ok(target),
            Err(_) => {
                // rename fails across filesystems
                fs::copy(&source, &target)?;
                fs::remove_file(&source)?;
                Ok(target)
            }
        }
    }
}

/// First of `name`, `name.1`, `name.2`, ... not yet present in `dir`.
fn free_quarantine_path(dir: &Path, name: &str) -> PathBuf {
    let mut candidate = dir.join(name);
    let mut n = 0u32;
    while candidate.exists() {
        n += 1;
        candidate = dir.join(format!("{}.{}", name, n));
    }
    candidate
}

//! Fetcher types and errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors that end a fetch pass.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, error status or an HTML error page instead of imagery.
    ///
    /// The pass stops here; slots written before it stay on disk.
    #[error("Provider rejected tile {index} ({url}): {reason}")]
    Rejected {
        index: usize,
        url: String,
        reason: String,
    },

    /// Provider cannot serve this request at all
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A slot file could not be written
    #[error("Failed to write tile slot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Summary of a completed fetch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchReport {
    /// Slots in the grid
    pub total: usize,
    /// Slots fetched from the provider during this pass
    pub downloaded: usize,
    /// Slots already present from an earlier pass
    pub skipped: usize,
}

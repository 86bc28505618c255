use crate::kernel::SolidHandle;
use crate::types::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`crate::PlateKernel`].
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("unknown solid {0}")]
    UnknownSolid(SolidHandle),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("export format '{0}' is not supported by this kernel")]
    UnsupportedFormat(ExportFormat),

    #[error("failed to render {format} export: {message}")]
    Render {
        format: ExportFormat,
        message: String,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that abort a whole build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("kernel failure: {0}")]
    Kernel(#[from] KernelError),

    #[error(
        "sandwich case needs an even number of mount holes, at most {max}, got {holes}",
        max = crate::case_holes::MAX_SANDWICH_HOLES
    )]
    InvalidHoleCount { holes: i64 },

    #[error("build exceeded its {budget_secs}s budget")]
    BudgetExceeded { budget_secs: u64 },

    #[error("cannot prepare export directory {path}: {source}")]
    ExportDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

mod case_holes;
mod config;
mod error;
mod geometry;
mod kernel;
mod layout;
mod placement;
mod plate;
mod plate_generation;
mod postprocessor;
mod request;
mod types;

pub use case_holes::*;
pub use config::BuilderConfig;
pub use error::{BuildError, KernelError};
pub use geometry::*;
pub use kernel::*;
pub use layout::*;
pub use placement::*;
pub use plate::*;
pub use plate_generation::*;
pub use postprocessor::{post_process_dxf, post_process_svg};
pub use request::*;
pub use types::*;

/// High-level function: request → plate layers → export files
///
/// Builds with the bundled [`SketchKernel`], which writes DXF and SVG. Other
/// configured formats are skipped with a warning.
pub fn build(
    request_id: &str,
    request: &BuildRequest,
    config: &BuilderConfig,
) -> Result<BuildResult, BuildError> {
    let mut kernel = SketchKernel::new();
    build_plate(&mut kernel, config, request_id, request)
}

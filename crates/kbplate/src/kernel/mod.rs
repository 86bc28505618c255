use crate::error::KernelError;
use crate::types::ExportFormat;
use std::path::Path;

pub mod handle;
pub mod sketch;

pub use handle::SolidHandle;
pub use sketch::{Sketch, SketchCut, SketchKernel};

/// Solid-modelling backend the plate builder drives.
///
/// Every operation consumes the handle it is given and returns the handle of
/// the resulting solid. Cuts are made at the working point, which starts at the
/// centre of the box and is shifted with [`PlateKernel::move_cursor`].
pub trait PlateKernel {
    fn new_box(&mut self, width: f64, height: f64, thickness: f64)
        -> Result<SolidHandle, KernelError>;

    fn fillet_vertical_edges(
        &mut self,
        solid: SolidHandle,
        radius: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// Relative move of the working point.
    fn move_cursor(&mut self, solid: SolidHandle, dx: f64, dy: f64)
        -> Result<SolidHandle, KernelError>;

    /// Cut a closed outline, relative to the working point, through the solid.
    fn cut_polygon_through_all(
        &mut self,
        solid: SolidHandle,
        points: &[(f64, f64)],
    ) -> Result<SolidHandle, KernelError>;

    /// Cut a round hole centred on the working point.
    fn cut_circle_through_all(
        &mut self,
        solid: SolidHandle,
        diameter: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// Write the solid in its current state. The handle stays valid.
    fn export_solid(
        &mut self,
        solid: SolidHandle,
        format: ExportFormat,
        destination: &Path,
    ) -> Result<(), KernelError>;
}

use super::{PlateKernel, SolidHandle};
use crate::error::KernelError;
use crate::geometry::{is_closed, translate_points, Polygon};
use crate::postprocessor::{post_process_dxf, post_process_svg};
use crate::types::ExportFormat;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A cut recorded in plate coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchCut {
    Polygon(Polygon),
    Circle { center: (f64, f64), diameter: f64 },
}

/// Flat plate outline plus every through-cut made in it.
///
/// Coordinates are millimetres from the plate centre, with +y pointing towards
/// the bottom row of keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    pub corner_radius: f64,
    pub cursor: (f64, f64),
    pub cuts: Vec<SketchCut>,
}

impl Sketch {
    pub fn polygon_count(&self) -> usize {
        self.cuts
            .iter()
            .filter(|cut| matches!(cut, SketchCut::Polygon(_)))
            .count()
    }

    pub fn circle_count(&self) -> usize {
        self.cuts.len() - self.polygon_count()
    }
}

/// 2D kernel that records cuts and exports flat DXF and SVG drawings.
///
/// Mesh and B-rep formats need a real CAD kernel and are reported as unsupported.
#[derive(Debug, Default)]
pub struct SketchKernel {
    sketches: HashMap<SolidHandle, Sketch>,
}

impl SketchKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sketch(&self, solid: SolidHandle) -> Option<&Sketch> {
        self.sketches.get(&solid)
    }

    /// Every live sketch. A finished build leaves exactly one behind.
    pub fn sketches(&self) -> impl Iterator<Item = &Sketch> {
        self.sketches.values()
    }

    pub fn supports(format: ExportFormat) -> bool {
        matches!(format, ExportFormat::Dxf | ExportFormat::Svg)
    }

    /// Replace `solid` with a new handle after applying `edit`.
    fn derive<F>(&mut self, solid: SolidHandle, edit: F) -> Result<SolidHandle, KernelError>
    where
        F: FnOnce(&mut Sketch),
    {
        let mut sketch = self
            .sketches
            .remove(&solid)
            .ok_or(KernelError::UnknownSolid(solid))?;
        edit(&mut sketch);
        let handle = SolidHandle::new();
        self.sketches.insert(handle, sketch);
        Ok(handle)
    }

    fn require(&self, solid: SolidHandle) -> Result<&Sketch, KernelError> {
        self.sketches
            .get(&solid)
            .ok_or(KernelError::UnknownSolid(solid))
    }
}

fn positive(value: f64, what: &str) -> Result<f64, KernelError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(KernelError::InvalidGeometry(format!(
            "{what} must be positive, got {value}"
        )))
    }
}

impl PlateKernel for SketchKernel {
    fn new_box(
        &mut self,
        width: f64,
        height: f64,
        thickness: f64,
    ) -> Result<SolidHandle, KernelError> {
        let sketch = Sketch {
            width: positive(width, "plate width")?,
            height: positive(height, "plate height")?,
            thickness: positive(thickness, "plate thickness")?,
            corner_radius: 0.0,
            cursor: (0.0, 0.0),
            cuts: Vec::new(),
        };
        let handle = SolidHandle::new();
        debug!(%handle, width, height, thickness, "Created plate blank");
        self.sketches.insert(handle, sketch);
        Ok(handle)
    }

    fn fillet_vertical_edges(
        &mut self,
        solid: SolidHandle,
        radius: f64,
    ) -> Result<SolidHandle, KernelError> {
        let radius = positive(radius, "fillet radius")?;
        let sketch = self.require(solid)?;
        if radius * 2.0 > sketch.width.min(sketch.height) {
            return Err(KernelError::InvalidGeometry(format!(
                "fillet radius {radius} does not fit a {}x{} plate",
                sketch.width, sketch.height
            )));
        }
        self.derive(solid, |sketch| sketch.corner_radius = radius)
    }

    fn move_cursor(
        &mut self,
        solid: SolidHandle,
        dx: f64,
        dy: f64,
    ) -> Result<SolidHandle, KernelError> {
        self.derive(solid, |sketch| {
            sketch.cursor = (sketch.cursor.0 + dx, sketch.cursor.1 + dy);
        })
    }

    fn cut_polygon_through_all(
        &mut self,
        solid: SolidHandle,
        points: &[(f64, f64)],
    ) -> Result<SolidHandle, KernelError> {
        if !is_closed(points) {
            return Err(KernelError::InvalidGeometry(format!(
                "cut outline with {} points is not closed",
                points.len()
            )));
        }
        self.derive(solid, |sketch| {
            let placed = translate_points(points, sketch.cursor.0, sketch.cursor.1);
            sketch.cuts.push(SketchCut::Polygon(placed));
        })
    }

    fn cut_circle_through_all(
        &mut self,
        solid: SolidHandle,
        diameter: f64,
    ) -> Result<SolidHandle, KernelError> {
        let diameter = positive(diameter, "hole diameter")?;
        self.derive(solid, |sketch| {
            sketch.cuts.push(SketchCut::Circle {
                center: sketch.cursor,
                diameter,
            });
        })
    }

    fn export_solid(
        &mut self,
        solid: SolidHandle,
        format: ExportFormat,
        destination: &Path,
    ) -> Result<(), KernelError> {
        if !Self::supports(format) {
            return Err(KernelError::UnsupportedFormat(format));
        }
        let sketch = self.require(solid)?;
        let contents = if format == ExportFormat::Svg {
            post_process_svg(sketch).map_err(|err| KernelError::Render {
                format,
                message: err.to_string(),
            })?
        } else {
            post_process_dxf(sketch).to_string()
        };
        fs::write(destination, contents).map_err(|source| KernelError::Io {
            path: destination.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_points;

    #[test]
    fn test_cuts_follow_cursor() {
        let mut kernel = SketchKernel::new();
        let solid = kernel.new_box(100.0, 50.0, 1.5).expect("box");
        let solid = kernel.move_cursor(solid, 10.0, -5.0).expect("move");
        let solid = kernel
            .cut_polygon_through_all(solid, &rect_points((-1.0, -1.0), (1.0, 1.0)))
            .expect("cut");
        let solid = kernel.cut_circle_through_all(solid, 3.0).expect("hole");

        let sketch = kernel.sketch(solid).expect("sketch");
        assert_eq!(sketch.polygon_count(), 1);
        assert_eq!(sketch.circle_count(), 1);
        match &sketch.cuts[0] {
            SketchCut::Polygon(points) => assert_eq!(points[0], (9.0, -6.0)),
            other => panic!("expected polygon, got {other:?}"),
        }
        assert_eq!(
            sketch.cuts[1],
            SketchCut::Circle {
                center: (10.0, -5.0),
                diameter: 3.0
            }
        );
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut kernel = SketchKernel::new();
        let first = kernel.new_box(10.0, 10.0, 1.0).expect("box");
        let _second = kernel.move_cursor(first, 1.0, 1.0).expect("move");
        assert!(matches!(
            kernel.move_cursor(first, 1.0, 1.0),
            Err(KernelError::UnknownSolid(handle)) if handle == first
        ));
    }

    #[test]
    fn test_invalid_box() {
        let mut kernel = SketchKernel::new();
        assert!(matches!(
            kernel.new_box(0.0, 10.0, 1.5),
            Err(KernelError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_open_outline_rejected() {
        let mut kernel = SketchKernel::new();
        let solid = kernel.new_box(10.0, 10.0, 1.0).expect("box");
        let result = kernel.cut_polygon_through_all(solid, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(result, Err(KernelError::InvalidGeometry(_))));
    }

    #[test]
    fn test_oversized_fillet_rejected() {
        let mut kernel = SketchKernel::new();
        let solid = kernel.new_box(10.0, 10.0, 1.0).expect("box");
        assert!(kernel.fillet_vertical_edges(solid, 6.0).is_err());
        let rounded = kernel.fillet_vertical_edges(solid, 2.0).expect("fillet");
        assert_eq!(kernel.sketch(rounded).map(|s| s.corner_radius), Some(2.0));
    }

    #[test]
    fn test_supported_formats() {
        let supported: Vec<ExportFormat> = ExportFormat::ALL
            .iter()
            .copied()
            .filter(|&format| SketchKernel::supports(format))
            .collect();
        assert_eq!(supported, vec![ExportFormat::Dxf, ExportFormat::Svg]);
    }

    #[test]
    fn test_unsupported_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut kernel = SketchKernel::new();
        let solid = kernel.new_box(10.0, 10.0, 1.0).expect("box");
        let result = kernel.export_solid(solid, ExportFormat::Stl, &dir.path().join("p.stl"));
        assert!(matches!(
            result,
            Err(KernelError::UnsupportedFormat(ExportFormat::Stl))
        ));
        assert!(!dir.path().join("p.stl").exists());
    }

    #[test]
    fn test_dxf_export_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut kernel = SketchKernel::new();
        let solid = kernel.new_box(10.0, 10.0, 1.0).expect("box");
        let path = dir.path().join("p.dxf");
        kernel
            .export_solid(solid, ExportFormat::Dxf, &path)
            .expect("export");
        let written = fs::read_to_string(&path).expect("read");
        assert!(written.contains("LWPOLYLINE"));
        assert!(written.trim_end().ends_with("EOF"));
    }
}

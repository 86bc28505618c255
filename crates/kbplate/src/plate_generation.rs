use crate::case_holes::{
    distribute_sandwich_holes, poker_steps, sandwich_edge_lengths, sandwich_inset, sandwich_steps,
    CaseCut, CaseStep, SandwichHoles,
};
use crate::config::BuilderConfig;
use crate::error::BuildError;
use crate::geometry::rect_points;
use crate::kernel::{PlateKernel, SolidHandle};
use crate::layout::{parse_layout, Key, Layout};
use crate::placement::{place_keys, Cursor};
use crate::plate::{CaseSpec, PlateDimensions, PlateSpec};
use crate::request::BuildRequest;
use crate::types::{BuildResult, ExportEntry, ExportFormat, Layer};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Snapshot of the plate parameters, written as the `json` export.
#[derive(Debug, Clone, Serialize)]
pub struct PlateSettings {
    pub case_type_and_holes: serde_json::Value,
    pub height_padding: f64,
    pub kerf: f64,
    pub plate_corners: f64,
    pub plate_layout: Vec<Vec<Key>>,
    pub stabilizer_type: u8,
    pub switch_type: u8,
    pub width_padding: f64,
}

impl PlateSettings {
    pub fn new(plate: &PlateSpec, layout: &Layout, holes: Option<SandwichHoles>) -> Self {
        let case_type_and_holes = match plate.case {
            CaseSpec::None => json!({ "type": null }),
            CaseSpec::Poker { hole_diameter } => {
                json!({ "type": "poker", "hole_diameter": hole_diameter })
            }
            CaseSpec::Sandwich {
                holes: count,
                hole_diameter,
            } => {
                let plan = holes.unwrap_or_default();
                json!({
                    "type": "sandwich",
                    "holes": count,
                    "hole_diameter": hole_diameter,
                    "x_holes": plan.x_holes,
                    "y_holes": plan.y_holes,
                })
            }
        };
        Self {
            case_type_and_holes,
            height_padding: plate.y_pad,
            kerf: plate.kerf,
            plate_corners: plate.fillet,
            plate_layout: layout.key_rows(),
            stabilizer_type: plate.stab_type.index(),
            switch_type: plate.switch_type.index(),
            width_padding: plate.x_pad,
        }
    }
}

/// Drives one build through a kernel, keeping track of where the working
/// point sits relative to the plate centre.
pub struct PlateBuilder<'a, K: PlateKernel> {
    kernel: &'a mut K,
    config: &'a BuilderConfig,
    request_id: &'a str,
    started: Instant,
    cursor: Cursor,
    solid: SolidHandle,
}

impl<'a, K: PlateKernel> PlateBuilder<'a, K> {
    fn check_budget(&self) -> Result<(), BuildError> {
        if let Some(budget) = self.config.budget() {
            if self.started.elapsed() > budget {
                return Err(BuildError::BudgetExceeded {
                    budget_secs: budget.as_secs(),
                });
            }
        }
        Ok(())
    }

    fn travel(&mut self, dx: f64, dy: f64) -> Result<(), BuildError> {
        self.check_budget()?;
        self.solid = self.kernel.move_cursor(self.solid, dx, dy)?;
        self.cursor = self.cursor.moved(dx, dy);
        Ok(())
    }

    fn cut_polygon(&mut self, points: &[(f64, f64)]) -> Result<(), BuildError> {
        self.check_budget()?;
        self.solid = self.kernel.cut_polygon_through_all(self.solid, points)?;
        Ok(())
    }

    fn cut_circle(&mut self, diameter: f64) -> Result<(), BuildError> {
        self.check_budget()?;
        self.solid = self.kernel.cut_circle_through_all(self.solid, diameter)?;
        Ok(())
    }

    fn run_steps(&mut self, steps: &[CaseStep]) -> Result<(), BuildError> {
        for step in steps {
            self.travel(step.delta.0, step.delta.1)?;
            match &step.cut {
                Some(CaseCut::Circle { diameter }) => self.cut_circle(*diameter)?,
                Some(CaseCut::Polygon(points)) => self.cut_polygon(points)?,
                None => {}
            }
        }
        Ok(())
    }

    fn to_top_left(&mut self, plate: &PlateSpec, dims: PlateDimensions) -> Result<(), BuildError> {
        let (x, y) = plate.top_left(dims);
        self.travel(x - self.cursor.origin.0, y - self.cursor.origin.1)?;
        // Row walks measure x_off from here.
        self.cursor.x_off = 0.0;
        Ok(())
    }

    /// Write every configured format for `layer`. Failures are logged and skipped.
    fn export_layer(
        &mut self,
        layer: Layer,
        formats: &[ExportFormat],
        settings: Option<&PlateSettings>,
    ) -> Result<Vec<ExportEntry>, BuildError> {
        info!("Exporting {layer} layer for {}", self.request_id);
        let mut entries = Vec::new();

        for &format in formats {
            self.check_budget()?;
            let path = self.config.export_path(layer, self.request_id, format);
            let written = match format {
                ExportFormat::Json => {
                    let Some(settings) = settings else {
                        continue;
                    };
                    serde_json::to_vec_pretty(settings)
                        .context("serialize plate settings")
                        .and_then(|data| {
                            fs::write(&path, data)
                                .with_context(|| format!("write {}", path.display()))
                        })
                }
                _ => self
                    .kernel
                    .export_solid(self.solid, format, &path)
                    .map_err(anyhow::Error::from),
            };
            match written {
                Ok(()) => {
                    info!("Exported '{}'", format.extension().to_uppercase());
                    entries.push(ExportEntry {
                        name: format,
                        url: self.config.export_url(layer, self.request_id, format),
                    });
                }
                Err(err) => warn!("Skipping {format} export of {layer} layer: {err:#}"),
            }
        }

        Ok(entries)
    }
}

/// Build every layer of the plate described by `request` and export them.
///
/// Only failures that leave no usable solid abort the build; export failures
/// just leave the corresponding entry out of the result.
pub fn build_plate<K: PlateKernel>(
    kernel: &mut K,
    config: &BuilderConfig,
    request_id: &str,
    request: &BuildRequest,
) -> Result<BuildResult, BuildError> {
    info!("Processing {request_id}");
    let started = Instant::now();

    let setup = request.plate_setup();
    let plate = setup.plate;
    let layout = parse_layout(&request.layout, plate.u1);
    let dims = plate.dimensions(&layout);

    let mut formats = config.formats.clone();
    if !request.wants_svg() {
        formats.retain(|format| *format != ExportFormat::Svg);
    }
    let mut result = BuildResult {
        width: dims.width,
        height: dims.height,
        has_layers: setup.has_layers,
        plates: setup.plates,
        formats: formats.clone(),
        exports: BTreeMap::new(),
    };

    fs::create_dir_all(&config.export_dir).map_err(|source| BuildError::ExportDir {
        path: config.export_dir.clone(),
        source,
    })?;

    let solid = kernel.new_box(dims.width, dims.height, plate.thickness)?;
    let mut builder = PlateBuilder {
        kernel,
        config,
        request_id,
        started,
        cursor: Cursor::new(),
        solid,
    };
    if plate.fillet > 0.0 {
        builder.check_budget()?;
        builder.solid = builder
            .kernel
            .fillet_vertical_edges(builder.solid, plate.fillet)?;
    }

    let mut sandwich_holes = None;
    match plate.case {
        CaseSpec::None => builder.to_top_left(&plate, dims)?,
        CaseSpec::Poker { hole_diameter } => {
            debug!(hole_diameter, "Cutting poker case holes");
            builder.run_steps(&poker_steps(hole_diameter))?;
            builder.to_top_left(&plate, dims)?;
        }
        CaseSpec::Sandwich {
            holes,
            hole_diameter,
        } => {
            builder.to_top_left(&plate, dims)?;
            let (x_len, y_len) = sandwich_edge_lengths(&plate, dims);
            match distribute_sandwich_holes(holes, x_len, y_len)? {
                Some(plan) => {
                    let (inset_x, inset_y) = sandwich_inset(&plate);
                    builder.travel(inset_x, inset_y)?;
                    builder.run_steps(&sandwich_steps(plan, hole_diameter, &plate, dims))?;
                    if result.has_layers {
                        let entries = builder.export_layer(Layer::Bottom, &formats, None)?;
                        result.exports.insert(Layer::Bottom, entries);
                    }
                    builder.travel(-inset_x, -inset_y)?;
                    sandwich_holes = Some(plan);
                }
                None => warn!("Sandwich case with {holes} holes needs at least 4, cutting none"),
            }
        }
    }

    let (placements, _) = place_keys(&layout, &plate, builder.cursor);
    for placement in &placements {
        builder.travel(placement.delta.0, placement.delta.1)?;
        for cutout in &placement.cutouts {
            builder.cut_polygon(&cutout.points)?;
        }
        builder.cursor = placement.cursor;
    }

    let settings = PlateSettings::new(&plate, &layout, sandwich_holes);
    let entries = builder.export_layer(Layer::Switch, &formats, Some(&settings))?;
    result.exports.insert(Layer::Switch, entries);

    if result.has_layers {
        let (x, y) = builder.cursor.origin;
        builder.travel(-x, -y)?;

        let k = plate.kerf;
        let half_w = dims.width / 2.0 - plate.x_pad - 2.0 * k;
        let half_h = dims.height / 2.0 - plate.y_pad - 2.0 * k;
        builder.cut_polygon(&rect_points((-half_w, -half_h), (half_w, half_h)))?;
        let entries = builder.export_layer(Layer::Closed, &formats, None)?;
        result.exports.insert(Layer::Closed, entries);

        builder.travel(0.0, -dims.height / 2.0 + plate.y_pad / 2.0 + k)?;
        let slot_w = plate.usb_width / 2.0 - k;
        let slot_h = plate.y_pad / 2.0 + k;
        builder.cut_polygon(&rect_points((-slot_w, -slot_h), (slot_w, slot_h)))?;
        let entries = builder.export_layer(Layer::Open, &formats, None)?;
        result.exports.insert(Layer::Open, entries);
    }

    info!(
        keys = placements.len(),
        elapsed_ms = builder.started.elapsed().as_millis() as u64,
        "Finished {request_id}"
    );
    Ok(result)
}

use super::{rotate_points, Polygon};
use crate::geometry::{resolve_stabilizer_offset, stabilizer_classes, StabilizerClass};
use crate::layout::{Growth, Key};
use crate::plate::PlateSpec;
use crate::{StabilizerType, SwitchType};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoutKind {
    Switch,
    Stabilizer,
}

/// A single through-cut, relative to the key centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cutout {
    pub kind: CutoutKind,
    pub points: Polygon,
}

/// Build the switch cutout and any stabilizer cutouts for one key.
///
/// Per-key `_t`, `_s`, `_k`, `_r` and `_rs` override the plate defaults. A key
/// taller than it is wide is turned 90 degrees before the explicit rotation.
pub fn key_cutouts(key: &Key, plate: &PlateSpec, grow: Growth) -> Vec<Cutout> {
    let switch_type = key
        .switch_type
        .and_then(SwitchType::from_index)
        .unwrap_or(plate.switch_type);
    let stab_type = key
        .stab_type
        .and_then(StabilizerType::from_index)
        .unwrap_or(plate.stab_type);
    let k = key.kerf.map(|kerf| kerf / 2.0).unwrap_or(plate.kerf);
    let rotated = key.is_vertical();

    let orient = |points: Polygon, extra: Option<f64>| -> Polygon {
        let mut points = points;
        if rotated {
            points = rotate_points(&points, 90.0);
        }
        match extra {
            Some(angle) if angle != 0.0 => rotate_points(&points, angle),
            _ => points,
        }
    };

    let mut cutouts = vec![Cutout {
        kind: CutoutKind::Switch,
        points: orient(switch_type.outline(k, (grow.x, grow.y)), key.rotation),
    }];

    for class in stabilizer_classes(key.w, key.h, rotated) {
        let outlines = match class {
            StabilizerClass::TwoUnit => stab_type.two_unit_outlines(k),
            StabilizerClass::Spacebar { length } => {
                let offset = resolve_stabilizer_offset(length, &plate.stabilizer_table);
                stab_type.spacebar_outlines(k, offset)
            }
        };
        cutouts.extend(outlines.into_iter().map(|points| Cutout {
            kind: CutoutKind::Stabilizer,
            points: orient(points, key.stab_rotation),
        }));
    }

    cutouts
}

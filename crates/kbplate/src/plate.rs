use crate::geometry::default_stabilizer_table;
use crate::layout::Layout;
use crate::{StabilizerType, SwitchType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// How the plate is mounted in its case.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CaseSpec {
    #[default]
    None,
    /// Fixed GH60 style hole and slot pattern.
    Poker { hole_diameter: f64 },
    /// `holes` spread around the perimeter of stacked plates.
    Sandwich { holes: i64, hole_diameter: f64 },
}

/// Plate parameters for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSpec {
    /// Millimetres per layout unit.
    pub u1: f64,
    pub thickness: f64,
    pub fillet: f64,
    /// Half of the requested kerf; every edge moves by this much.
    pub kerf: f64,
    pub x_pad: f64,
    pub y_pad: f64,
    pub switch_type: SwitchType,
    pub stab_type: StabilizerType,
    pub usb_width: f64,
    pub stabilizer_table: BTreeMap<String, f64>,
    pub case: CaseSpec,
}

impl Default for PlateSpec {
    fn default() -> Self {
        Self {
            u1: 19.05,
            thickness: 1.5,
            fillet: 0.0,
            kerf: 0.0,
            x_pad: 0.0,
            y_pad: 0.0,
            switch_type: SwitchType::MxAlps,
            stab_type: StabilizerType::CherryCostar,
            usb_width: 10.0,
            stabilizer_table: default_stabilizer_table(),
            case: CaseSpec::None,
        }
    }
}

/// Outer plate size in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateDimensions {
    pub width: f64,
    pub height: f64,
}

impl PlateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a full tool kerf; only half of it is kept.
    pub fn set_kerf(&mut self, kerf: f64) {
        self.kerf = kerf / 2.0;
    }

    /// Returns `false` and keeps the current type when `index` is unknown.
    pub fn set_switch_type(&mut self, index: i64) -> bool {
        match SwitchType::from_index(index) {
            Some(switch_type) => {
                self.switch_type = switch_type;
                info!("Set switch_type to {index} ({switch_type})");
                true
            }
            None => {
                warn!("Ignoring switch_type {index}, keeping {}", self.switch_type);
                false
            }
        }
    }

    /// Returns `false` and keeps the current type when `index` is unknown.
    pub fn set_stab_type(&mut self, index: i64) -> bool {
        match StabilizerType::from_index(index) {
            Some(stab_type) => {
                self.stab_type = stab_type;
                info!("Set stab_type to {index} ({stab_type})");
                true
            }
            None => {
                warn!("Ignoring stab_type {index}, keeping {}", self.stab_type);
                false
            }
        }
    }

    pub fn set_poker_case(&mut self, hole_diameter: f64) {
        self.case = CaseSpec::Poker { hole_diameter };
    }

    pub fn set_sandwich_case(&mut self, holes: i64, hole_diameter: f64) {
        self.case = CaseSpec::Sandwich {
            holes,
            hole_diameter,
        };
    }

    /// Outer size: layout extent plus padding and kerf on both sides.
    pub fn dimensions(&self, layout: &Layout) -> PlateDimensions {
        PlateDimensions {
            width: layout.layout_width * self.u1 + 2.0 * self.x_pad + 2.0 * self.kerf,
            height: layout.layout_height + 2.0 * self.y_pad + 2.0 * self.kerf,
        }
    }

    /// Offset from the plate centre to the top-left corner the key walk starts at.
    pub fn top_left(&self, dims: PlateDimensions) -> (f64, f64) {
        (-dims.width / 2.0 + self.kerf, -dims.height / 2.0 + self.kerf)
    }
}

use super::Polygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Spacebar wire offset used when the key length is not in the table.
pub const DEFAULT_STABILIZER_OFFSET: f64 = 11.95;

/// Stabilizer cutout families, indexed 0..=2 in layouts and requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "u8", try_from = "u8")]
pub enum StabilizerType {
    /// Cherry outline widened so Costar inserts also fit.
    #[default]
    CherryCostar,
    /// Cherry plate-mount outline.
    Cherry,
    /// Two Costar insert slots, no central opening.
    Costar,
}

/// Which stabilizer geometry a key needs. A key can need both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilizerClass {
    TwoUnit,
    Spacebar { length: f64 },
}

impl StabilizerType {
    pub const ALL: [StabilizerType; 3] = [
        StabilizerType::CherryCostar,
        StabilizerType::Cherry,
        StabilizerType::Costar,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> u8 {
        match self {
            StabilizerType::CherryCostar => 0,
            StabilizerType::Cherry => 1,
            StabilizerType::Costar => 2,
        }
    }

    /// Unrotated 2u outlines for half-kerf `k`.
    pub fn two_unit_outlines(self, k: f64) -> Vec<Polygon> {
        match self {
            StabilizerType::CherryCostar => vec![vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -4.73 + k),
                (8.575 + k, -4.73 + k),
                (8.575 + k, -5.53 + k),
                (10.3 + k, -5.53 + k),
                (10.3 + k, -6.45 + k),
                (13.6 - k, -6.45 + k),
                (13.6 - k, -5.53 + k),
                (15.225 - k, -5.53 + k),
                (15.225 - k, -2.3 + k),
                (16.1 - k, -2.3 + k),
                (16.1 - k, 0.5 - k),
                (15.225 - k, 0.5 - k),
                (15.225 - k, 6.77 - k),
                (13.6 - k, 6.77 - k),
                (13.6 - k, 7.75 - k),
                (10.3 + k, 7.75 - k),
                (10.3 + k, 6.77 - k),
                (8.575 + k, 6.77 - k),
                (8.575 + k, 5.97 - k),
                (7.0 - k, 5.97 - k),
                (7.0 - k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 5.97 - k),
                (-8.575 - k, 5.97 - k),
                (-8.575 - k, 6.77 - k),
                (-10.3 - k, 6.77 - k),
                (-10.3 - k, 7.75 - k),
                (-13.6 + k, 7.75 - k),
                (-13.6 + k, 6.77 - k),
                (-15.225 + k, 6.77 - k),
                (-15.225 + k, 0.5 - k),
                (-16.1 + k, 0.5 - k),
                (-16.1 + k, -2.3 + k),
                (-15.225 + k, -2.3 + k),
                (-15.225 + k, -5.53 + k),
                (-13.6 + k, -5.53 + k),
                (-13.6 + k, -6.45 + k),
                (-10.3 - k, -6.45 + k),
                (-10.3 - k, -5.53 + k),
                (-8.575 - k, -5.53 + k),
                (-8.575 - k, -4.73 + k),
                (-7.0 + k, -4.73 + k),
                (-7.0 + k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ]],
            StabilizerType::Cherry => vec![vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -4.73 + k),
                (8.575 + k, -4.73 + k),
                (8.575 + k, -5.53 + k),
                (15.225 - k, -5.53 + k),
                (15.225 - k, -2.3 + k),
                (16.1 - k, -2.3 + k),
                (16.1 - k, 0.5 - k),
                (15.225 - k, 0.5 - k),
                (15.225 - k, 6.77 - k),
                (13.6 - k, 6.77 - k),
                (13.6 - k, 7.97 - k),
                (10.3 + k, 7.97 - k),
                (10.3 + k, 6.77 - k),
                (8.575 + k, 6.77 - k),
                (8.575 + k, 5.97 - k),
                (7.0 - k, 5.97 - k),
                (7.0 - k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 5.97 - k),
                (-8.575 - k, 5.97 - k),
                (-8.575 - k, 6.77 - k),
                (-10.3 - k, 6.77 - k),
                (-10.3 - k, 7.97 - k),
                (-13.6 + k, 7.97 - k),
                (-13.6 + k, 6.77 - k),
                (-15.225 + k, 6.77 - k),
                (-15.225 + k, 0.5 - k),
                (-16.1 + k, 0.5 - k),
                (-16.1 + k, -2.3 + k),
                (-15.225 + k, -2.3 + k),
                (-15.225 + k, -5.53 + k),
                (-8.575 - k, -5.53 + k),
                (-8.575 - k, -4.73 + k),
                (-7.0 + k, -4.73 + k),
                (-7.0 + k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ]],
            StabilizerType::Costar => costar_slots(10.3 + k, 13.6 - k, -6.45 + k, 7.75 - k),
        }
    }

    /// Unrotated spacebar outlines for half-kerf `k`, with the wires `x` mm either side of centre.
    pub fn spacebar_outlines(self, k: f64, x: f64) -> Vec<Polygon> {
        match self {
            StabilizerType::CherryCostar => vec![vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -2.3 + k),
                (x - 3.325 + k, -2.3 + k),
                (x - 3.325 + k, -5.53 + k),
                (x - 1.65 + k, -5.53 + k),
                (x - 1.65 + k, -6.45 + k),
                (x + 1.65 - k, -6.45 + k),
                (x + 1.65 - k, -5.53 + k),
                (x + 3.325 - k, -5.53 + k),
                (x + 3.325 - k, -2.3 + k),
                (x + 4.2 - k, -2.3 + k),
                (x + 4.2 - k, 0.5 - k),
                (x + 3.325 - k, 0.5 - k),
                (x + 3.325 - k, 6.77 - k),
                (x + 1.65 - k, 6.77 - k),
                (x + 1.65 - k, 7.75 - k),
                (x - 1.65 + k, 7.75 - k),
                (x - 1.65 + k, 6.77 - k),
                (x - 3.325 + k, 6.77 - k),
                (x - 3.325 + k, 2.3 - k),
                (7.0 - k, 2.3 - k),
                (7.0 - k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 2.3 - k),
                (-x + 3.325 - k, 2.3 - k),
                (-x + 3.325 - k, 6.77 - k),
                (-x + 1.65 - k, 6.77 - k),
                (-x + 1.65 - k, 7.75 - k),
                (-x - 1.65 + k, 7.75 - k),
                (-x - 1.65 + k, 6.77 - k),
                (-x - 3.325 + k, 6.77 - k),
                (-x - 3.325 + k, 0.5 - k),
                (-x - 4.2 + k, 0.5 - k),
                (-x - 4.2 + k, -2.3 + k),
                (-x - 3.325 + k, -2.3 + k),
                (-x - 3.325 + k, -5.53 + k),
                (-x - 1.65 + k, -5.53 + k),
                (-x - 1.65 + k, -6.45 + k),
                (-x + 1.65 - k, -6.45 + k),
                (-x + 1.65 - k, -5.53 + k),
                (-x + 3.325 - k, -5.53 + k),
                (-x + 3.325 - k, -2.3 + k),
                (-7.0 + k, -2.3 + k),
                (-7.0 + k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ]],
            StabilizerType::Cherry => vec![vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -2.3 + k),
                (x - 3.325 + k, -2.3 + k),
                (x - 3.325 + k, -5.53 + k),
                (x + 3.325 - k, -5.53 + k),
                (x + 3.325 - k, -2.3 + k),
                (x + 4.2 - k, -2.3 + k),
                (x + 4.2 - k, 0.5 - k),
                (x + 3.325 - k, 0.5 - k),
                (x + 3.325 - k, 6.77 - k),
                (x + 1.65 - k, 6.77 - k),
                (x + 1.65 - k, 7.97 - k),
                (x - 1.65 + k, 7.97 - k),
                (x - 1.65 + k, 6.77 - k),
                (x - 3.325 + k, 6.77 - k),
                (x - 3.325 + k, 2.3 - k),
                (7.0 - k, 2.3 - k),
                (7.0 - k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 2.3 - k),
                (-x + 3.325 - k, 2.3 - k),
                (-x + 3.325 - k, 6.77 - k),
                (-x + 1.65 - k, 6.77 - k),
                (-x + 1.65 - k, 7.97 - k),
                (-x - 1.65 + k, 7.97 - k),
                (-x - 1.65 + k, 6.77 - k),
                (-x - 3.325 + k, 6.77 - k),
                (-x - 3.325 + k, 0.5 - k),
                (-x - 4.2 + k, 0.5 - k),
                (-x - 4.2 + k, -2.3 + k),
                (-x - 3.325 + k, -2.3 + k),
                (-x - 3.325 + k, -5.53 + k),
                (-x + 3.325 - k, -5.53 + k),
                (-x + 3.325 - k, -2.3 + k),
                (-7.0 + k, -2.3 + k),
                (-7.0 + k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ]],
            StabilizerType::Costar => {
                costar_slots(x - 1.65 + k, x + 1.65 - k, -6.45 + k, 7.75 - k)
            }
        }
    }
}

/// Left and right insert slots mirrored around x = 0. Each starts at its
/// inner top corner and runs outwards first.
fn costar_slots(inner: f64, outer: f64, top: f64, bottom: f64) -> Vec<Polygon> {
    let slot = |inner: f64, outer: f64| {
        vec![
            (inner, top),
            (outer, top),
            (outer, bottom),
            (inner, bottom),
            (inner, top),
        ]
    };
    vec![slot(-inner, -outer), slot(inner, outer)]
}

/// Classify a key. `rotated` keys are measured along their height.
pub fn stabilizer_classes(width: f64, height: f64, rotated: bool) -> Vec<StabilizerClass> {
    let mut classes = Vec::new();
    if (2.0..3.0).contains(&width) || (rotated && (2.0..3.0).contains(&height)) {
        classes.push(StabilizerClass::TwoUnit);
    }
    if width >= 3.0 || (rotated && height >= 3.0) {
        let length = if rotated { height } else { width };
        classes.push(StabilizerClass::Spacebar { length });
    }
    classes
}

/// Table key for a key length: digits without the decimal point, right-padded
/// with zeros to 3 characters below 10u and 4 characters otherwise.
pub fn stabilizer_table_key(length: f64) -> String {
    let digits = format!("{length}").replace('.', "");
    let width = if length < 10.0 { 3 } else { 4 };
    format!("{digits:0<width$}")
}

/// Wire offset for a spacebar of `length` units.
pub fn resolve_stabilizer_offset(length: f64, table: &BTreeMap<String, f64>) -> f64 {
    table
        .get(&stabilizer_table_key(length))
        .copied()
        .unwrap_or(DEFAULT_STABILIZER_OFFSET)
}

/// Known spacebar wire offsets keyed by [`stabilizer_table_key`].
pub fn default_stabilizer_table() -> BTreeMap<String, f64> {
    [
        ("300", 19.05),
        ("400", 28.575),
        ("450", 34.671),
        ("550", 42.8625),
        ("625", 50.0),
        ("650", 52.38),
        ("700", 57.15),
        ("800", 66.675),
        ("900", 66.675),
        ("1000", 66.675),
    ]
    .into_iter()
    .map(|(key, offset)| (key.to_string(), offset))
    .collect()
}

impl From<StabilizerType> for u8 {
    fn from(value: StabilizerType) -> Self {
        value.index()
    }
}

impl TryFrom<u8> for StabilizerType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(i64::from(value)).ok_or_else(|| format!("unknown stabilizer type {value}"))
    }
}

impl fmt::Display for StabilizerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StabilizerType::CherryCostar => "cherry/costar",
            StabilizerType::Cherry => "cherry",
            StabilizerType::Costar => "costar",
        };
        write!(f, "{name}")
    }
}

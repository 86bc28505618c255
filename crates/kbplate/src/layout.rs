use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A normalized key. Sizes and offsets are in layout units (1u = one key pitch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub w: f64,
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Switch type override (`_t`).
    #[serde(rename = "_t", default, skip_serializing_if = "Option::is_none")]
    pub switch_type: Option<i64>,
    /// Stabilizer type override (`_s`).
    #[serde(rename = "_s", default, skip_serializing_if = "Option::is_none")]
    pub stab_type: Option<i64>,
    /// Full kerf override (`_k`), halved when applied.
    #[serde(rename = "_k", default, skip_serializing_if = "Option::is_none")]
    pub kerf: Option<f64>,
    /// Switch rotation in degrees (`_r`).
    #[serde(rename = "_r", default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Stabilizer rotation in degrees (`_rs`).
    #[serde(rename = "_rs", default, skip_serializing_if = "Option::is_none")]
    pub stab_rotation: Option<f64>,
}

impl Default for Key {
    fn default() -> Self {
        Self {
            w: 1.0,
            h: 1.0,
            x: None,
            y: None,
            switch_type: None,
            stab_type: None,
            kerf: None,
            rotation: None,
            stab_rotation: None,
        }
    }
}

impl Key {
    /// Read a descriptor object. Non-numeric values are ignored.
    pub fn from_descriptor(map: &Map<String, Value>) -> Self {
        let number = |name: &str| map.get(name).and_then(Value::as_f64);
        let index = |name: &str| map.get(name).and_then(as_index);
        Self {
            w: number("w").unwrap_or(1.0),
            h: number("h").unwrap_or(1.0),
            x: number("x"),
            y: number("y"),
            switch_type: index("_t"),
            stab_type: index("_s"),
            kerf: number("_k"),
            rotation: number("_r"),
            stab_rotation: number("_rs"),
        }
    }

    /// Taller than wide: the cutouts are turned 90 degrees.
    pub fn is_vertical(&self) -> bool {
        self.h > self.w
    }
}

/// Integral JSON numbers, accepting `2.0` as well as `2`.
fn as_index(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

/// Switch opening enlargement in mm, already halved per side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Growth {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub keys: Vec<Key>,
}

impl Row {
    /// The row's extra vertical offset in units, taken from its leading key.
    pub fn y_offset(&self) -> f64 {
        self.keys.first().and_then(|key| key.y).unwrap_or(0.0)
    }
}

/// Parsed layout plus the aggregates that size the plate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    pub rows: Vec<Row>,
    pub grow: Growth,
    /// Widest row in units.
    pub layout_width: f64,
    /// Total row height in mm.
    pub layout_height: f64,
}

impl Layout {
    pub fn key_count(&self) -> usize {
        self.rows.iter().map(|row| row.keys.len()).sum()
    }

    /// Keys as nested arrays, the shape stored in exported plate settings.
    pub fn key_rows(&self) -> Vec<Vec<Key>> {
        self.rows.iter().map(|row| row.keys.clone()).collect()
    }
}

/// Parse a keyboard-layout-editor style array into rows of keys.
///
/// An object inside a row describes the next key and suppresses the plain entry
/// that follows it; the suppression carries over a row boundary. Objects at the
/// top level may carry `grow_x`/`grow_y`. Anything unrecognized is skipped.
pub fn parse_layout(value: &Value, u1: f64) -> Layout {
    let mut layout = Layout::default();
    let Some(entries) = value.as_array() else {
        warn!("Layout is not an array, treating it as empty");
        return layout;
    };

    let mut descriptor_pending = false;
    for entry in entries {
        match entry {
            Value::Array(items) => {
                let mut row = Row::default();
                let mut row_width = 0.0;
                for item in items {
                    match item {
                        Value::Object(map) => {
                            let key = Key::from_descriptor(map);
                            row_width += key.w + key.x.unwrap_or(0.0);
                            row.keys.push(key);
                            descriptor_pending = true;
                        }
                        _ => {
                            if !descriptor_pending {
                                row.keys.push(Key::default());
                                row_width += 1.0;
                            }
                            descriptor_pending = false;
                        }
                    }
                }
                layout.layout_height += u1 + row.y_offset() * u1;
                if row_width > layout.layout_width {
                    layout.layout_width = row_width;
                }
                layout.rows.push(row);
            }
            Value::Object(map) => {
                if let Some(grow) = map.get("grow_x").and_then(Value::as_f64) {
                    layout.grow.x = grow / 2.0;
                }
                if let Some(grow) = map.get("grow_y").and_then(Value::as_f64) {
                    layout.grow.y = grow / 2.0;
                }
            }
            other => debug!("Skipping layout entry {other}"),
        }
    }

    debug!(
        rows = layout.rows.len(),
        keys = layout.key_count(),
        width_units = layout.layout_width,
        height_mm = layout.layout_height,
        "Parsed layout"
    );
    layout
}

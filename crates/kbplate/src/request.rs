use crate::plate::PlateSpec;
use crate::types::Layer;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

/// A plate build request as posted by the layout form.
///
/// Numeric fields accept numbers or numeric strings. Anything else is dropped
/// with a warning and the plate default is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildRequest {
    #[serde(default)]
    pub layout: Value,
    #[serde(rename = "case-type", default, deserialize_with = "lenient_text")]
    pub case_type: Option<String>,
    #[serde(rename = "mount-holes-size", default, deserialize_with = "lenient_number")]
    pub mount_holes_size: Option<f64>,
    #[serde(rename = "mount-holes-num", default, deserialize_with = "lenient_integer")]
    pub mount_holes_num: Option<i64>,
    #[serde(rename = "switch-type", default, deserialize_with = "lenient_integer")]
    pub switch_type: Option<i64>,
    #[serde(rename = "stab-type", default, deserialize_with = "lenient_integer")]
    pub stab_type: Option<i64>,
    #[serde(rename = "width-padding", default, deserialize_with = "lenient_number")]
    pub width_padding: Option<f64>,
    #[serde(rename = "height-padding", default, deserialize_with = "lenient_number")]
    pub height_padding: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fillet: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub thickness: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub kerf: Option<f64>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub export_svg: Option<bool>,
}

/// Plate parameters and layer list derived from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateSetup {
    pub plate: PlateSpec,
    pub has_layers: bool,
    pub plates: Vec<Layer>,
}

impl BuildRequest {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn plate_setup(&self) -> PlateSetup {
        let mut plate = PlateSpec::new();
        let mut has_layers = false;
        let mut plates = vec![Layer::Switch];

        match self.case_type.as_deref() {
            Some("poker") => {
                if let Some(size) = self.mount_holes_size {
                    plate.set_poker_case(size);
                }
            }
            Some("sandwich") => {
                plates.extend([Layer::Open, Layer::Closed, Layer::Bottom]);
                has_layers = true;
                if let (Some(holes), Some(size)) = (self.mount_holes_num, self.mount_holes_size) {
                    plate.set_sandwich_case(holes, size);
                }
            }
            Some(other) if !other.is_empty() => warn!("Unknown case-type '{other}', no case holes"),
            _ => {}
        }

        if let Some(index) = self.switch_type {
            plate.set_switch_type(index);
        }
        if let Some(index) = self.stab_type {
            plate.set_stab_type(index);
        }
        if let Some(pad) = self.width_padding {
            plate.x_pad = pad;
        }
        if let Some(pad) = self.height_padding {
            plate.y_pad = pad;
        }
        if let Some(fillet) = self.fillet {
            plate.fillet = fillet;
        }
        if let Some(thickness) = self.thickness {
            plate.thickness = thickness;
        }
        if let Some(kerf) = self.kerf {
            plate.set_kerf(kerf);
        }

        PlateSetup {
            plate,
            has_layers,
            plates,
        }
    }

    /// `false` only when the request explicitly turned SVG off.
    pub fn wants_svg(&self) -> bool {
        self.export_svg != Some(false)
    }
}

/// Hex SHA-256 of the request with its keys sorted.
pub fn request_id(request: &Value) -> String {
    // serde_json maps are ordered, so this serialization is canonical.
    let mut hasher = Sha256::new();
    hasher.update(request.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| {
        let parsed = number_from(&value).filter(|n| n.is_finite());
        if parsed.is_none() {
            warn!("Ignoring non-numeric value {value}");
        }
        parsed
    }))
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| {
        let parsed = match &value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().filter(|n| n.is_finite()).map(|n| n.trunc() as i64)),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            warn!("Ignoring non-integer value {value}");
        }
        parsed
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(other) => {
            warn!("Ignoring non-text value {other}");
            None
        }
        None => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }))
}

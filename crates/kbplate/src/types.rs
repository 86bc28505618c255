use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One exported 2D profile of the plate stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// The switch plate itself.
    Switch,
    /// Sandwich bottom, holes only.
    Bottom,
    /// Sandwich middle ring.
    Closed,
    /// Sandwich middle ring with a USB opening.
    Open,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Layer::Switch => "switch",
            Layer::Bottom => "bottom",
            Layer::Closed => "closed",
            Layer::Open => "open",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// File formats an export can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Three.js JSON mesh.
    Js,
    /// OpenCascade BREP.
    Brp,
    /// STEP.
    Stp,
    /// STL mesh.
    Stl,
    Dxf,
    Svg,
    /// Plate settings, written for the switch layer only.
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 7] = [
        ExportFormat::Js,
        ExportFormat::Brp,
        ExportFormat::Stp,
        ExportFormat::Stl,
        ExportFormat::Dxf,
        ExportFormat::Svg,
        ExportFormat::Json,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Js => "js",
            ExportFormat::Brp => "brp",
            ExportFormat::Stp => "stp",
            ExportFormat::Stl => "stl",
            ExportFormat::Dxf => "dxf",
            ExportFormat::Svg => "svg",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == wanted)
            .ok_or_else(|| format!("unknown export format '{s}'"))
    }
}

/// A written export file and where it is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub name: ExportFormat,
    pub url: String,
}

/// Line-oriented text output of a post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Drawing {
    pub lines: Vec<String>,
}

impl fmt::Display for Drawing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Outcome of one plate build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildResult {
    pub width: f64,
    pub height: f64,
    pub has_layers: bool,
    pub plates: Vec<Layer>,
    pub formats: Vec<ExportFormat>,
    pub exports: BTreeMap<Layer, Vec<ExportEntry>>,
}

impl BuildResult {
    pub fn exports_for(&self, layer: Layer) -> &[ExportEntry] {
        self.exports.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }
}

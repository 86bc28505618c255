use super::Polygon;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Switch cutout families, indexed 0..=4 in layouts and requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "u8", try_from = "u8")]
pub enum SwitchType {
    /// Plain 14mm square.
    Square,
    /// MX and Alps compatible, MX top housing can be opened.
    #[default]
    MxAlps,
    /// MX with side wings so the housing can be opened.
    MxOpenable,
    /// MX with side and top/bottom wings, usable in either orientation.
    MxRotatable,
    /// Alps only, 15.5 x 12.8.
    Alps,
}

impl SwitchType {
    pub const ALL: [SwitchType; 5] = [
        SwitchType::Square,
        SwitchType::MxAlps,
        SwitchType::MxOpenable,
        SwitchType::MxRotatable,
        SwitchType::Alps,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> u8 {
        match self {
            SwitchType::Square => 0,
            SwitchType::MxAlps => 1,
            SwitchType::MxOpenable => 2,
            SwitchType::MxRotatable => 3,
            SwitchType::Alps => 4,
        }
    }

    /// Unrotated outline centred on the key, shrunk inwards by the half-kerf `k`.
    ///
    /// `grow` only applies to the plain square, which is the one family where
    /// layouts are allowed to widen the opening.
    pub fn outline(self, k: f64, grow: (f64, f64)) -> Polygon {
        let (gx, gy) = grow;
        match self {
            SwitchType::Square => vec![
                (7.0 - k + gx, -7.0 + k - gy),
                (7.0 - k + gx, 7.0 - k + gy),
                (-7.0 + k - gx, 7.0 - k + gy),
                (-7.0 + k - gx, -7.0 + k - gy),
                (7.0 - k + gx, -7.0 + k - gy),
            ],
            SwitchType::MxAlps => vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -6.4 + k),
                (7.8 - k, -6.4 + k),
                (7.8 - k, 6.4 - k),
                (7.0 - k, 6.4 - k),
                (7.0 - k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 6.4 - k),
                (-7.8 + k, 6.4 - k),
                (-7.8 + k, -6.4 + k),
                (-7.0 + k, -6.4 + k),
                (-7.0 + k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ],
            SwitchType::MxOpenable => vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -6.0 + k),
                (7.8 - k, -6.0 + k),
                (7.8 - k, -2.9 - k),
                (7.0 - k, -2.9 - k),
                (7.0 - k, 2.9 + k),
                (7.8 - k, 2.9 + k),
                (7.8 - k, 6.0 - k),
                (7.0 - k, 6.0 - k),
                (7.0 - k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 6.0 - k),
                (-7.8 + k, 6.0 - k),
                (-7.8 + k, 2.9 + k),
                (-7.0 + k, 2.9 + k),
                (-7.0 + k, -2.9 - k),
                (-7.8 + k, -2.9 - k),
                (-7.8 + k, -6.0 + k),
                (-7.0 + k, -6.0 + k),
                (-7.0 + k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ],
            SwitchType::MxRotatable => vec![
                (7.0 - k, -7.0 + k),
                (7.0 - k, -6.0 + k),
                (7.8 - k, -6.0 + k),
                (7.8 - k, -2.9 - k),
                (7.0 - k, -2.9 - k),
                (7.0 - k, 2.9 + k),
                (7.8 - k, 2.9 + k),
                (7.8 - k, 6.0 - k),
                (7.0 - k, 6.0 - k),
                (7.0 - k, 7.0 - k),
                (6.0 - k, 7.0 - k),
                (6.0 - k, 7.8 - k),
                (2.9 + k, 7.8 - k),
                (2.9 + k, 7.0 - k),
                (-2.9 - k, 7.0 - k),
                (-2.9 - k, 7.8 - k),
                (-6.0 + k, 7.8 - k),
                (-6.0 + k, 7.0 - k),
                (-7.0 + k, 7.0 - k),
                (-7.0 + k, 6.0 - k),
                (-7.8 + k, 6.0 - k),
                (-7.8 + k, 2.9 + k),
                (-7.0 + k, 2.9 + k),
                (-7.0 + k, -2.9 - k),
                (-7.8 + k, -2.9 - k),
                (-7.8 + k, -6.0 + k),
                (-7.0 + k, -6.0 + k),
                (-7.0 + k, -7.0 + k),
                (-6.0 + k, -7.0 + k),
                (-6.0 + k, -7.8 + k),
                (-2.9 - k, -7.8 + k),
                (-2.9 - k, -7.0 + k),
                (2.9 + k, -7.0 + k),
                (2.9 + k, -7.8 + k),
                (6.0 - k, -7.8 + k),
                (6.0 - k, -7.0 + k),
                (7.0 - k, -7.0 + k),
            ],
            SwitchType::Alps => vec![
                (7.75 - k, -6.4 + k),
                (7.75 - k, 6.4 - k),
                (-7.75 + k, 6.4 - k),
                (-7.75 + k, -6.4 + k),
                (7.75 - k, -6.4 + k),
            ],
        }
    }
}

impl From<SwitchType> for u8 {
    fn from(value: SwitchType) -> Self {
        value.index()
    }
}

impl TryFrom<u8> for SwitchType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(i64::from(value)).ok_or_else(|| format!("unknown switch type {value}"))
    }
}

impl fmt::Display for SwitchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwitchType::Square => "square",
            SwitchType::MxAlps => "mx/alps",
            SwitchType::MxOpenable => "mx openable",
            SwitchType::MxRotatable => "mx rotatable",
            SwitchType::Alps => "alps",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{bounding_box, is_closed};

    #[test]
    fn test_every_outline_is_closed() {
        for switch in SwitchType::ALL {
            let outline = switch.outline(0.1, (0.0, 0.0));
            assert!(is_closed(&outline), "{switch} outline should be closed");
        }
    }

    #[test]
    fn test_vertex_counts() {
        let counts: Vec<usize> = SwitchType::ALL
            .iter()
            .map(|s| s.outline(0.0, (0.0, 0.0)).len())
            .collect();
        assert_eq!(counts, vec![5, 13, 21, 37, 5]);
    }

    #[test]
    fn test_square_is_14mm_without_kerf() {
        let rect = bounding_box(&SwitchType::Square.outline(0.0, (0.0, 0.0))).expect("bounds");
        assert!((rect.width() - 14.0).abs() < 1e-9);
        assert!((rect.height() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_grow_only_widens_square() {
        let grown = bounding_box(&SwitchType::Square.outline(0.0, (0.5, 0.25))).expect("bounds");
        assert!((grown.width() - 15.0).abs() < 1e-9);
        assert!((grown.height() - 14.5).abs() < 1e-9);

        let plain = SwitchType::MxAlps.outline(0.0, (0.0, 0.0));
        let ignored = SwitchType::MxAlps.outline(0.0, (0.5, 0.25));
        assert_eq!(plain, ignored);
    }

    #[test]
    fn test_alps_dimensions() {
        let rect = bounding_box(&SwitchType::Alps.outline(0.0, (0.0, 0.0))).expect("bounds");
        assert!((rect.width() - 15.5).abs() < 1e-9);
        assert!((rect.height() - 12.8).abs() < 1e-9);
    }

    #[test]
    fn test_index_round_trip() {
        for switch in SwitchType::ALL {
            assert_eq!(SwitchType::from_index(i64::from(switch.index())), Some(switch));
        }
        assert_eq!(SwitchType::from_index(5), None);
        assert_eq!(SwitchType::from_index(-1), None);
    }
}

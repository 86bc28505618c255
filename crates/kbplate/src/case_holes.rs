use crate::error::BuildError;
use crate::geometry::{rect_points, Polygon};
use crate::plate::{PlateDimensions, PlateSpec};
use serde::Serialize;
use tracing::debug;

/// Poker mounting hole centres, relative to the plate centre.
pub const POKER_HOLES: [(f64, f64); 6] = [
    (-139.0, 9.2),
    (-117.3, -19.4),
    (-14.3, 0.0),
    (48.0, 37.9),
    (117.55, -19.4),
    (139.0, 9.2),
];

/// Poker edge slot centres, relative to the plate centre.
pub const POKER_SLOTS: [(f64, f64); 2] = [(140.75, 9.2), (-140.75, 9.2)];

pub const POKER_SLOT_SIZE: (f64, f64) = (3.5, 5.0);

/// Largest sandwich hole count a build accepts.
pub const MAX_SANDWICH_HOLES: i64 = 256;

/// What to cut at the cursor once a step has moved it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CaseCut {
    Circle { diameter: f64 },
    Polygon(Polygon),
}

/// A relative cursor move, optionally followed by a cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStep {
    pub delta: (f64, f64),
    pub cut: Option<CaseCut>,
}

impl CaseStep {
    fn cut(delta: (f64, f64), cut: CaseCut) -> Self {
        Self {
            delta,
            cut: Some(cut),
        }
    }

    fn travel(delta: (f64, f64)) -> Self {
        Self { delta, cut: None }
    }
}

/// Holes placed along each edge between the four corner holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SandwichHoles {
    pub x_holes: u32,
    pub y_holes: u32,
}

/// Steps starting and ending at the plate centre. Holes use the raw diameter,
/// without kerf compensation.
pub fn poker_steps(hole_diameter: f64) -> Vec<CaseStep> {
    let (slot_w, slot_h) = POKER_SLOT_SIZE;
    let slot = rect_points(
        (-slot_w / 2.0, -slot_h / 2.0),
        (slot_w / 2.0, slot_h / 2.0),
    );

    let mut steps = Vec::with_capacity(2 * (POKER_HOLES.len() + POKER_SLOTS.len()));
    for &(x, y) in &POKER_HOLES {
        steps.push(CaseStep::cut(
            (x, y),
            CaseCut::Circle {
                diameter: hole_diameter,
            },
        ));
        steps.push(CaseStep::travel((-x, -y)));
    }
    for &(x, y) in &POKER_SLOTS {
        steps.push(CaseStep::cut((x, y), CaseCut::Polygon(slot.clone())));
        steps.push(CaseStep::travel((-x, -y)));
    }
    steps
}

/// Split `holes` between the horizontal and vertical edges.
///
/// Below four holes there is nothing to place and `None` is returned. Four go to
/// the corners; each remaining pair goes to the edge with the larger gap.
/// Odd counts and counts above [`MAX_SANDWICH_HOLES`] are rejected.
pub fn distribute_sandwich_holes(
    holes: i64,
    x_len: f64,
    y_len: f64,
) -> Result<Option<SandwichHoles>, BuildError> {
    if holes < 4 {
        return Ok(None);
    }
    if holes % 2 != 0 || holes > MAX_SANDWICH_HOLES {
        return Err(BuildError::InvalidHoleCount { holes });
    }

    let mut plan = SandwichHoles::default();
    for _ in 0..(holes - 4) / 2 {
        let x_gap = x_len / f64::from(plan.x_holes + 1);
        let y_gap = y_len / f64::from(plan.y_holes + 1);
        let favour_x = if x_gap == y_gap {
            x_len >= y_len
        } else {
            x_gap > y_gap
        };
        if favour_x {
            plan.x_holes += 1;
        } else {
            plan.y_holes += 1;
        }
    }
    debug!(x_holes = plan.x_holes, y_holes = plan.y_holes, "Distributed sandwich holes");
    Ok(Some(plan))
}

/// Edge lengths the hole distribution works with.
pub fn sandwich_edge_lengths(plate: &PlateSpec, dims: PlateDimensions) -> (f64, f64) {
    (
        dims.width - plate.x_pad - plate.kerf,
        dims.height - plate.y_pad - plate.kerf,
    )
}

/// Offset from the top-left corner to the first hole centre.
pub fn sandwich_inset(plate: &PlateSpec) -> (f64, f64) {
    (plate.x_pad / 2.0, plate.y_pad / 2.0)
}

/// Walk clockwise around the perimeter from the first hole, cutting at every
/// stop. The walk ends back where it started.
pub fn sandwich_steps(
    plan: SandwichHoles,
    hole_diameter: f64,
    plate: &PlateSpec,
    dims: PlateDimensions,
) -> Vec<CaseStep> {
    let k = plate.kerf;
    let hole = CaseCut::Circle {
        diameter: hole_diameter - 2.0 * k,
    };
    let x_spans = plan.x_holes + 1;
    let y_spans = plan.y_holes + 1;
    let x_gap = (dims.width - plate.x_pad - 2.0 * k) / f64::from(x_spans);
    let y_gap = (dims.height - plate.y_pad - 2.0 * k) / f64::from(y_spans);

    let edges = [
        ((x_gap, 0.0), x_spans),
        ((0.0, y_gap), y_spans),
        ((-x_gap, 0.0), x_spans),
        ((0.0, -y_gap), y_spans),
    ];
    edges
        .iter()
        .flat_map(|&(delta, spans)| (0..spans).map(move |_| delta))
        .map(|delta| CaseStep::cut(delta, hole.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(steps: &[CaseStep]) -> (f64, f64) {
        steps
            .iter()
            .fold((0.0, 0.0), |acc, s| (acc.0 + s.delta.0, acc.1 + s.delta.1))
    }

    #[test]
    fn test_poker_returns_to_centre() {
        let steps = poker_steps(4.0);
        assert_eq!(steps.len(), 16);
        let (dx, dy) = total(&steps);
        assert!(dx.abs() < 1e-9 && dy.abs() < 1e-9);
        let circles = steps
            .iter()
            .filter(|s| matches!(s.cut, Some(CaseCut::Circle { diameter }) if diameter == 4.0))
            .count();
        assert_eq!(circles, 6);
    }

    #[test]
    fn test_four_holes_are_corners() {
        let plan = distribute_sandwich_holes(4, 300.0, 100.0).expect("even");
        assert_eq!(plan, Some(SandwichHoles { x_holes: 0, y_holes: 0 }));
    }

    #[test]
    fn test_eight_holes_favour_long_edge() {
        let plan = distribute_sandwich_holes(8, 300.0, 100.0)
            .expect("even")
            .expect("enough holes");
        assert_eq!(plan.x_holes + plan.y_holes, 2);
        assert_eq!(plan.x_holes, 2);
    }

    #[test]
    fn test_tie_goes_to_longer_raw_edge() {
        // First pick: gaps 200 vs 100, x. Second: 100 vs 100, tie, x is longer.
        let plan = distribute_sandwich_holes(8, 200.0, 100.0)
            .expect("even")
            .expect("enough holes");
        assert_eq!(plan, SandwichHoles { x_holes: 2, y_holes: 0 });
    }

    #[test]
    fn test_odd_count_rejected() {
        assert!(matches!(
            distribute_sandwich_holes(7, 300.0, 100.0),
            Err(BuildError::InvalidHoleCount { holes: 7 })
        ));
    }

    #[test]
    fn test_oversized_count_rejected() {
        assert!(matches!(
            distribute_sandwich_holes(MAX_SANDWICH_HOLES + 2, 300.0, 100.0),
            Err(BuildError::InvalidHoleCount { .. })
        ));
        assert!(matches!(
            distribute_sandwich_holes(i64::MAX - 1, 300.0, 100.0),
            Err(BuildError::InvalidHoleCount { holes }) if holes == i64::MAX - 1
        ));
        let plan = distribute_sandwich_holes(MAX_SANDWICH_HOLES, 300.0, 100.0)
            .expect("at the limit")
            .expect("planned");
        assert_eq!(
            i64::from(plan.x_holes + plan.y_holes),
            (MAX_SANDWICH_HOLES - 4) / 2
        );
    }

    #[test]
    fn test_too_few_holes() {
        assert_eq!(distribute_sandwich_holes(2, 300.0, 100.0).expect("no error"), None);
    }

    #[test]
    fn test_sandwich_walk_is_closed() {
        let plate = PlateSpec {
            x_pad: 10.0,
            y_pad: 10.0,
            kerf: 0.1,
            ..PlateSpec::default()
        };
        let dims = PlateDimensions {
            width: 300.0,
            height: 110.0,
        };
        let steps = sandwich_steps(SandwichHoles { x_holes: 2, y_holes: 1 }, 3.0, &plate, dims);
        assert_eq!(steps.len(), 2 * 3 + 2 * 2);
        let (dx, dy) = total(&steps);
        assert!(dx.abs() < 1e-9 && dy.abs() < 1e-9);
        assert!(matches!(
            steps[0].cut,
            Some(CaseCut::Circle { diameter }) if (diameter - 2.8).abs() < 1e-12
        ));
    }
}

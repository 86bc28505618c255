use kurbo::{Affine, Point, Rect};

pub mod cutout;
pub mod stabilizer;
pub mod switch;

// Re-export public types
pub use cutout::{key_cutouts, Cutout, CutoutKind};
pub use stabilizer::{
    default_stabilizer_table, resolve_stabilizer_offset, stabilizer_classes, stabilizer_table_key,
    StabilizerClass, StabilizerType, DEFAULT_STABILIZER_OFFSET,
};
pub use switch::SwitchType;

/// Closed outline in plate millimetres. The first vertex is repeated as the last one.
pub type Polygon = Vec<(f64, f64)>;

const CLOSE_EPSILON: f64 = 1e-9;

/// Rotate every vertex counter-clockwise by `degrees` around the origin.
pub fn rotate_points(points: &[(f64, f64)], degrees: f64) -> Polygon {
    let rotation = Affine::rotate(degrees.to_radians());
    points
        .iter()
        .map(|&(x, y)| {
            let rotated = rotation * Point::new(x, y);
            (rotated.x, rotated.y)
        })
        .collect()
}

/// Shift every vertex by `(dx, dy)`.
pub fn translate_points(points: &[(f64, f64)], dx: f64, dy: f64) -> Polygon {
    let shift = Affine::translate((dx, dy));
    points
        .iter()
        .map(|&(x, y)| {
            let moved = shift * Point::new(x, y);
            (moved.x, moved.y)
        })
        .collect()
}

/// Axis-aligned bounds of a vertex list, `None` when it is empty.
pub fn bounding_box(points: &[(f64, f64)]) -> Option<Rect> {
    let mut iter = points.iter();
    let &(x, y) = iter.next()?;
    Some(iter.fold(Rect::new(x, y, x, y), |rect, &(x, y)| {
        rect.union_pt(Point::new(x, y))
    }))
}

/// True when the outline has at least a triangle and ends where it starts.
pub fn is_closed(points: &[(f64, f64)]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 4 => {
            (first.0 - last.0).abs() < CLOSE_EPSILON && (first.1 - last.1).abs() < CLOSE_EPSILON
        }
        _ => false,
    }
}

/// Axis-aligned rectangle outline from its corners, wound counter-clockwise.
pub fn rect_points(min: (f64, f64), max: (f64, f64)) -> Polygon {
    vec![
        (min.0, min.1),
        (max.0, min.1),
        (max.0, max.1),
        (min.0, max.1),
        (min.0, min.1),
    ]
}

use crate::geometry::{key_cutouts, Cutout};
use crate::layout::{Key, Layout};
use crate::plate::PlateSpec;
use serde::Serialize;
use tracing::debug;

/// Position of the kernel's working point, relative to where the walk began.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Cursor {
    pub origin: (f64, f64),
    /// Horizontal distance travelled since the current row began.
    pub x_off: f64,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moved(self, dx: f64, dy: f64) -> Self {
        Self {
            origin: (self.origin.0 + dx, self.origin.1 + dy),
            x_off: self.x_off,
        }
    }
}

/// Running state carried between keys of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkState {
    pub cursor: Cursor,
    pub prev_width: f64,
    pub prev_y_off: f64,
}

impl WalkState {
    pub fn starting_at(cursor: Cursor) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }
}

/// One key resolved to a relative cursor move and its cutouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPlacement {
    pub row: usize,
    pub column: usize,
    pub key: Key,
    /// Relative move applied before cutting.
    pub delta: (f64, f64),
    /// Cursor after the move; `origin` is the key centre.
    pub cursor: Cursor,
    pub cutouts: Vec<Cutout>,
}

impl KeyPlacement {
    pub fn center(&self) -> (f64, f64) {
        self.cursor.origin
    }
}

/// Advance the walk by one key at (`row`, `column`) and return the move to apply.
pub fn step(
    state: WalkState,
    row: usize,
    column: usize,
    key: &Key,
    plate: &PlateSpec,
) -> (WalkState, (f64, f64)) {
    let u1 = plate.u1;
    let mut cursor = state.cursor;
    let mut prev_y_off = state.prev_y_off;

    let mut x = 0.0;
    let mut y = 0.0;
    let mut kx = 0.0;
    if let Some(offset) = key.x {
        x = offset * u1;
        kx = x;
    }
    if column == 0 {
        if let Some(offset) = key.y {
            y = offset * u1;
        }
    }

    let mut lead = (0.0, 0.0);
    if row == 0 && column == 0 {
        lead = (key.w * u1 / 2.0, u1 / 2.0);
        x += plate.x_pad;
        y += plate.y_pad;
        cursor.x_off = -(x - (u1 / 2.0 + key.w * u1 / 2.0) - kx);
    } else if column == 0 {
        lead = (-cursor.x_off, u1);
        cursor.x_off = 0.0;
        x += u1 / 2.0 + key.w * u1 / 2.0;
    } else {
        x += state.prev_width * u1 / 2.0 + key.w * u1 / 2.0;
    }

    if prev_y_off != 0.0 {
        y -= prev_y_off;
        prev_y_off = 0.0;
    }
    if key.h > 1.0 {
        prev_y_off = key.h * u1 / 2.0 - u1 / 2.0;
        y += prev_y_off;
    }

    cursor.x_off += x;
    let delta = (lead.0 + x, lead.1 + y);
    let next = WalkState {
        cursor: cursor.moved(delta.0, delta.1),
        prev_width: key.w,
        prev_y_off,
    };
    (next, delta)
}

/// Walk every key of `layout` starting from `cursor`, which should sit on the
/// plate's top-left corner.
pub fn place_keys(layout: &Layout, plate: &PlateSpec, cursor: Cursor) -> (Vec<KeyPlacement>, Cursor) {
    let mut state = WalkState::starting_at(cursor);
    let mut placements = Vec::with_capacity(layout.key_count());

    for (row_index, row) in layout.rows.iter().enumerate() {
        for (column, key) in row.keys.iter().enumerate() {
            let (next, delta) = step(state, row_index, column, key, plate);
            state = next;
            debug!(
                row = row_index,
                column,
                x = state.cursor.origin.0,
                y = state.cursor.origin.1,
                "Placed key"
            );
            placements.push(KeyPlacement {
                row: row_index,
                column,
                key: key.clone(),
                delta,
                cursor: state.cursor,
                cutouts: key_cutouts(key, plate, layout.grow),
            });
        }
    }

    (placements, state.cursor)
}

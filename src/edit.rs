//! Paint, rectangle fill and flood fill on a [`LayeredGrid`].
//!
//! Every call is a complete, stateless transformation; nothing here remembers
//! previous edits.

use tracing::trace;

use crate::grid::LayeredGrid;
use crate::Gid;

/// Set one cell. Out-of-bounds coordinates are ignored.
pub fn paint(grid: &mut LayeredGrid, x: i32, y: i32, value: Gid, layer: &str) {
    grid.set_on(layer, x, y, value);
}

/// Fill the rectangle spanned by two corners (inclusive, either order),
/// clamped to the grid. Returns the number of cells written.
pub fn fill_rectangle(
    grid: &mut LayeredGrid,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    value: Gid,
    layer: &str,
) -> usize {
    let max_x = i32::try_from(grid.width()).unwrap_or(i32::MAX) - 1;
    let max_y = i32::try_from(grid.height()).unwrap_or(i32::MAX) - 1;

    let min_x = x0.min(x1).max(0);
    let hi_x = x0.max(x1).min(max_x);
    let min_y = y0.min(y1).max(0);
    let hi_y = y0.max(y1).min(max_y);

    let target = grid.get_layer(layer);
    let mut written = 0;
    for y in min_y..=hi_y {
        for x in min_x..=hi_x {
            target.set(x, y, value);
            written += 1;
        }
    }
    written
}

/// 4-connected flood fill from `(sx, sy)`, replacing the seed's value with
/// `value`. Returns the number of cells changed.
///
/// No-op when the seed is out of bounds or already holds `value`. Uses an
/// explicit worklist, so grid size is bounded only by memory.
pub fn flood_fill(grid: &mut LayeredGrid, sx: i32, sy: i32, value: Gid, layer: &str) -> usize {
    let target = grid.get_layer(layer);
    if !target.in_bounds(sx, sy) {
        return 0;
    }
    let original = target.get(sx, sy);
    if original == value {
        return 0;
    }

    // cells are replaced before being pushed, so none is visited twice
    target.set(sx, sy, value);
    let mut stack = vec![(sx, sy)];
    let mut changed = 1;

    while let Some((x, y)) = stack.pop() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            // out-of-bounds reads as 0, which may equal `original`
            if target.in_bounds(nx, ny) && target.get(nx, ny) == original {
                target.set(nx, ny, value);
                stack.push((nx, ny));
                changed += 1;
            }
        }
    }

    trace!(layer, changed, "flood fill");
    changed
}

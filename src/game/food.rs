use super::geometry::{Bounds, Cell};
use crate::consts;
use rand::{seq::IteratorRandom, Rng};
use std::collections::HashSet;

/// Pick a cell within `bounds` that is not in `occupied`, uniformly at
/// random.  Returns `None` if every cell is occupied.
///
/// A handful of random draws are tried first; once those have all landed on
/// occupied cells the free cells are enumerated and one is chosen among them,
/// so the call terminates however crowded the board is.
pub(crate) fn place<R: Rng>(rng: &mut R, bounds: Bounds, occupied: &HashSet<Cell>) -> Option<Cell> {
    if occupied.len() < bounds.area() {
        for _ in 0..consts::MAX_FOOD_ATTEMPTS {
            let cell = Cell::new(
                rng.random_range(0..bounds.width),
                rng.random_range(0..bounds.height),
            );
            if !occupied.contains(&cell) {
                return Some(cell);
            }
        }
    }
    bounds
        .cells()
        .filter(|c| !occupied.contains(c))
        .choose(rng)
}

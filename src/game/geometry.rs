use super::direction::Direction;
use ratatui::layout::Position;

/// A square on the playfield, given as (column, row) with the origin at the
/// top-left corner.
///
/// Coordinates are signed so that a move one step past an edge still yields
/// a `Cell`, which the collision resolver then reports as a wall hit.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct Cell {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl Cell {
    pub(crate) const fn new(x: i32, y: i32) -> Cell {
        Cell { x, y }
    }

    /// Return the cell one step away in `direction`.  The result may lie
    /// outside of any [`Bounds`].
    pub(crate) fn step(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Convert to a terminal position, or `None` if either coordinate is
    /// negative or too large
    pub(crate) fn to_position(self) -> Option<Position> {
        let x = u16::try_from(self.x).ok()?;
        let y = u16::try_from(self.y).ok()?;
        Some(Position { x, y })
    }
}

/// The extent of the playfield
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl Bounds {
    pub(crate) const fn square(size: i32) -> Bounds {
        Bounds {
            width: size,
            height: size,
        }
    }

    pub(crate) fn contains(self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    /// Total number of cells on the playfield
    pub(crate) fn area(self) -> usize {
        let w = usize::try_from(self.width).unwrap_or_default();
        let h = usize::try_from(self.height).unwrap_or_default();
        w.saturating_mul(h)
    }

    /// Iterate over every cell in row-major order
    pub(crate) fn cells(self) -> impl Iterator<Item = Cell> {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Cell { x, y }))
    }
}

use super::geometry::Cell;
use std::collections::{HashSet, VecDeque};

/// The snake's body
///
/// A snake always has a head; the rest of its cells are kept in `body`,
/// starting with the cell right behind the head and ending with the tail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Snake {
    /// The cell the snake's head is on
    head: Cell,

    /// The cells behind the head, nearest first
    body: VecDeque<Cell>,
}

impl Snake {
    /// Create a snake occupying `cells`, listed head first.
    ///
    /// # Panics
    ///
    /// Panics if `cells` is empty.
    pub(crate) fn new<I: IntoIterator<Item = Cell>>(cells: I) -> Snake {
        let mut cells = cells.into_iter();
        let Some(head) = cells.next() else {
            panic!("a snake needs at least one cell");
        };
        Snake {
            head,
            body: cells.collect(),
        }
    }

    /// Return the position of the snake's head
    pub(crate) fn head(&self) -> Cell {
        self.head
    }

    /// Return the position of the last cell of the snake.  For a snake that
    /// is only a head, this is the head.
    pub(crate) fn tail(&self) -> Cell {
        self.body.back().copied().unwrap_or(self.head)
    }

    /// Return the cells behind the head, nearest first
    pub(crate) fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    /// Iterate over every cell of the snake, head first
    pub(crate) fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        std::iter::once(self.head).chain(self.body.iter().copied())
    }

    /// Number of cells the snake occupies, head included
    pub(crate) fn len(&self) -> usize {
        self.body.len().saturating_add(1)
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.head == cell || self.body.contains(&cell)
    }

    /// Move one step: `head` becomes the new head and the tail is vacated.
    pub(crate) fn slither(&mut self, head: Cell) {
        self.body.push_front(self.head);
        self.head = head;
        let _ = self.body.pop_back();
    }

    /// Move one step without vacating the tail, growing by one cell
    pub(crate) fn grow(&mut self, head: Cell) {
        self.body.push_front(self.head);
        self.head = head;
    }

    /// Does any cell of the snake appear more than once?
    pub(crate) fn is_self_intersecting(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.len());
        !self.cells().all(|c| seen.insert(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snake {
        Snake::new([Cell::new(10, 10), Cell::new(10, 11), Cell::new(10, 12)])
    }

    #[test]
    fn head_and_tail() {
        let snake = sample();
        assert_eq!(snake.head(), Cell::new(10, 10));
        assert_eq!(snake.tail(), Cell::new(10, 12));
        assert_eq!(snake.len(), 3);
        assert_eq!(
            snake.body().iter().copied().collect::<Vec<_>>(),
            [Cell::new(10, 11), Cell::new(10, 12)]
        );
    }

    #[test]
    fn slither_keeps_length() {
        let mut snake = sample();
        snake.slither(Cell::new(10, 9));
        assert_eq!(
            snake.cells().collect::<Vec<_>>(),
            [Cell::new(10, 9), Cell::new(10, 10), Cell::new(10, 11)]
        );
        assert_eq!(snake.len(), 3);
    }

    #[test]
    fn grow_keeps_tail() {
        let mut snake = sample();
        snake.grow(Cell::new(10, 9));
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.head(), Cell::new(10, 9));
        assert_eq!(snake.tail(), Cell::new(10, 12));
    }

    #[test]
    fn single_cell_slither() {
        let mut snake = Snake::new([Cell::new(0, 0)]);
        assert_eq!(snake.tail(), Cell::new(0, 0));
        snake.slither(Cell::new(1, 0));
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Cell::new(1, 0));
        assert_eq!(snake.tail(), Cell::new(1, 0));
        assert!(!snake.contains(Cell::new(0, 0)));
    }

    #[test]
    fn self_intersection() {
        assert!(!sample().is_self_intersecting());
        let snake = Snake::new([Cell::new(1, 1), Cell::new(1, 2), Cell::new(1, 1)]);
        assert!(snake.is_self_intersecting());
    }

    #[test]
    #[should_panic(expected = "a snake needs at least one cell")]
    fn empty_snake() {
        let _ = Snake::new(Vec::<Cell>::new());
    }
}

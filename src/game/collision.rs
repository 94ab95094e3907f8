use super::geometry::{Bounds, Cell};
use super::snake::Snake;

/// What would happen if the snake's head moved to a given cell
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Collision {
    /// The cell is off the playfield
    Wall,
    /// The cell is occupied by the snake's own body
    SelfHit,
    /// The cell is empty
    Free,
    /// The cell holds the food
    Eat(Cell),
}

/// Classify a move of the snake's head to `proposed`.
///
/// The checks run in a fixed order: bounds first, then the body, then the
/// food.  The body is taken as it is before this move's tail is vacated,
/// minus the tail cell itself, since a move that doesn't eat frees that cell
/// in the same step.  Food is never placed on the snake, so a move onto the
/// tail is never an eating move.
pub(crate) fn resolve(proposed: Cell, snake: &Snake, food: Cell, bounds: Bounds) -> Collision {
    if !bounds.contains(proposed) {
        return Collision::Wall;
    }
    if proposed != snake.tail() && snake.contains(proposed) {
        return Collision::SelfHit;
    }
    if proposed == food {
        Collision::Eat(food)
    } else {
        Collision::Free
    }
}

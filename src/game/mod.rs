mod collision;
mod direction;
mod food;
mod geometry;
mod snake;
pub(crate) use self::direction::Direction;
pub(crate) use self::geometry::Cell;
use self::collision::{resolve, Collision};
use self::geometry::Bounds;
use self::snake::Snake;
use crate::consts;
use crate::util::center_rect;
use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Margin, Rect, Size},
    style::Style,
    text::{Line, Span},
    widgets::{
        block::{Block, Padding},
        Clear, Widget,
    },
};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// The game-loop state machine: owns the snake, the food, and the score, and
/// advances them one tick at a time while the game is being played.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Game<R = rand::rngs::ThreadRng> {
    rng: R,
    bounds: Bounds,
    snake: Snake,
    food: Cell,
    /// The direction the snake will move in on the next tick
    direction: Direction,
    /// The direction the snake moved in on the most recent tick.  Turn
    /// requests are checked against this rather than `direction` so that two
    /// quick turns between ticks can't reverse the snake into itself.
    applied: Direction,
    status: Status,
    score: u32,
    tick_period: Duration,
    id: GameId,
}

impl Game<rand::rngs::ThreadRng> {
    pub(crate) fn new() -> Self {
        Game::new_with_rng(rand::rng())
    }
}

impl<R: Rng> Game<R> {
    /// Create a game in the [`Status::Idle`] state, showing the starting
    /// snake and food
    pub(crate) fn new_with_rng(rng: R) -> Game<R> {
        Game {
            rng,
            bounds: Bounds::square(consts::GRID_SIZE),
            snake: Snake::new(consts::INITIAL_SNAKE),
            food: consts::INITIAL_FOOD,
            direction: consts::INITIAL_DIRECTION,
            applied: consts::INITIAL_DIRECTION,
            status: Status::Idle,
            score: 0,
            tick_period: consts::INITIAL_TICK_PERIOD,
            id: GameId::default(),
        }
    }

    /// Respond to the player's start/pause button according to the current
    /// status, and return what was done.
    pub(crate) fn request_action(&mut self) -> Action {
        let action = Action::for_status(self.status);
        match action {
            // A turn requested while idle was checked against the starting
            // direction, so it stands.
            Action::Start => self.reset(),
            Action::Retry => {
                self.direction = consts::INITIAL_DIRECTION;
                self.reset();
            }
            Action::Pause => self.status = Status::Paused,
            Action::Resume => self.status = Status::Playing,
        }
        action
    }

    /// Advance the game by one tick.  Does nothing unless the game is being
    /// played.  If the snake dies on this tick, the game enters
    /// [`Status::GameOver`] and a summary of the finished game is returned.
    pub(crate) fn step(&mut self) -> Option<GameOver> {
        if self.status != Status::Playing {
            return None;
        }
        let direction = self.direction;
        let proposed = self.snake.head().step(direction);
        match resolve(proposed, &self.snake, self.food, self.bounds) {
            Collision::Wall => return Some(self.die(DeathCause::Wall)),
            Collision::SelfHit => return Some(self.die(DeathCause::SelfHit)),
            Collision::Eat(food) => {
                self.snake.grow(food);
                self.applied = direction;
                self.score += 1;
                self.tick_period = speed_up(self.tick_period);
                if !self.place_food() {
                    return Some(self.die(DeathCause::Exhausted));
                }
            }
            Collision::Free => {
                self.snake.slither(proposed);
                self.applied = direction;
            }
        }
        debug_assert!(
            !self.snake.is_self_intersecting(),
            "snake overlaps itself after a legal move: {:?}",
            self.snake
        );
        None
    }

    fn reset(&mut self) {
        self.snake = Snake::new(consts::INITIAL_SNAKE);
        self.applied = consts::INITIAL_DIRECTION;
        self.score = 0;
        self.tick_period = consts::INITIAL_TICK_PERIOD;
        self.id = self.id.next();
        self.status = Status::Playing;
        let placed = self.place_food();
        debug_assert!(placed, "a fresh board should have room for food");
    }

    /// Move the food to a random cell not occupied by the snake.  Returns
    /// `false` if there is no such cell.
    fn place_food(&mut self) -> bool {
        let mut occupied = HashSet::with_capacity(self.snake.len());
        occupied.extend(self.snake.cells());
        match food::place(&mut self.rng, self.bounds, &occupied) {
            Some(cell) => {
                self.food = cell;
                true
            }
            None => false,
        }
    }
}

impl<R> Game<R> {
    /// Ask the snake to turn.  Ignored if `direction` is the reverse of the
    /// direction the snake last moved in.  Accepted in every status; while
    /// the game is idle or paused, the turn is applied once play resumes.
    pub(crate) fn request_direction(&mut self, direction: Direction) {
        if !direction.is_reverse_of(self.applied) {
            self.direction = direction;
        }
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub(crate) fn snake(&self) -> &Snake {
        &self.snake
    }

    pub(crate) fn food(&self) -> Cell {
        self.food
    }

    /// Return the glyph to use for drawing the snake's head.  It shows the
    /// direction of the last move, not a turn that is still pending.
    fn head_symbol(&self) -> char {
        match self.applied {
            Direction::Up => consts::SNAKE_HEAD_UP_SYMBOL,
            Direction::Down => consts::SNAKE_HEAD_DOWN_SYMBOL,
            Direction::Left => consts::SNAKE_HEAD_LEFT_SYMBOL,
            Direction::Right => consts::SNAKE_HEAD_RIGHT_SYMBOL,
        }
    }

    fn die(&mut self, cause: DeathCause) -> GameOver {
        self.status = Status::GameOver(cause);
        GameOver {
            game: self.id,
            score: self.score,
            cause,
        }
    }
}

/// Shorten a tick period after the snake eats, never going below the
/// minimum
fn speed_up(period: Duration) -> Duration {
    period
        .saturating_sub(consts::TICK_PERIOD_STEP)
        .max(consts::MIN_TICK_PERIOD)
}

/// Identifies one play-through, from start or retry until game over
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct GameId(u64);

impl GameId {
    pub(crate) fn next(self) -> GameId {
        GameId(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Status {
    /// No game has been started yet
    Idle,
    Playing,
    Paused,
    /// The snake has died; stays this way until the player retries
    GameOver(DeathCause),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DeathCause {
    /// The snake ran into the edge of the playfield
    Wall,
    /// The snake ran into its own body
    SelfHit,
    /// The snake has filled the board and there is nowhere left to place
    /// food.
    Exhausted,
}

impl DeathCause {
    /// Short human-readable reason, as passed to the commentary service
    pub(crate) fn reason(self) -> &'static str {
        match self {
            DeathCause::Wall => "wall",
            DeathCause::SelfHit => "self",
            DeathCause::Exhausted => "board full",
        }
    }

    fn headline(self) -> &'static str {
        match self {
            DeathCause::Wall => "You hit the wall!",
            DeathCause::SelfHit => "You bit yourself!",
            DeathCause::Exhausted => "You filled the board!",
        }
    }
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.reason())
    }
}

/// What the action button does, depending on the current [`Status`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Action {
    Start,
    Pause,
    Resume,
    Retry,
}

impl Action {
    pub(crate) fn for_status(status: Status) -> Action {
        match status {
            Status::Idle => Action::Start,
            Status::Playing => Action::Pause,
            Status::Paused => Action::Resume,
            Status::GameOver(_) => Action::Retry,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Action::Start => "Start",
            Action::Pause => "Pause",
            Action::Resume => "Resume",
            Action::Retry => "Retry",
        }
    }

    /// Does this action begin a new game?
    pub(crate) fn starts_game(self) -> bool {
        matches!(self, Action::Start | Action::Retry)
    }
}

/// Summary of a game that has just ended
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GameOver {
    pub(crate) game: GameId,
    pub(crate) score: u32,
    pub(crate) cause: DeathCause,
}

/// The size of the `Rect` that should be passed to `Game::render()`: the
/// playfield plus a one-cell border
pub(crate) fn board_size() -> Size {
    let cells = u16::try_from(consts::GRID_SIZE).unwrap_or(u16::MAX);
    Size {
        width: cells.saturating_mul(consts::CELL_WIDTH).saturating_add(2),
        height: cells.saturating_add(2),
    }
}

impl<R> Widget for &Game<R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::bordered()
            .title(" NEON SNAKE ")
            .title_alignment(Alignment::Center)
            .render(area, buf);
        let mut board = Canvas {
            area: area.inner(Margin::new(1, 1)),
            buf,
        };
        for &c in self.snake().body() {
            board.draw_cell(c, consts::SNAKE_BODY_SYMBOL, consts::SNAKE_BODY_STYLE);
        }
        board.draw_cell(self.food(), consts::FOOD_SYMBOL, consts::FOOD_STYLE);
        // Draw the head last so that, if it's a collision, we overwrite
        // whatever it's colliding with
        if matches!(
            self.status,
            Status::GameOver(DeathCause::Wall | DeathCause::SelfHit)
        ) {
            board.draw_cell(
                self.snake().head(),
                consts::COLLISION_SYMBOL,
                consts::COLLISION_STYLE,
            );
        } else {
            board.draw_cell(
                self.snake().head(),
                self.head_symbol(),
                consts::SNAKE_HEAD_STYLE,
            );
        }

        let popup = match self.status {
            Status::Playing => return,
            Status::Idle => Popup {
                title: " WELCOME ",
                lines: vec![
                    Line::from("Steer with ← ↓ ↑ →"),
                    Line::from("    or with w a s d"),
                    Line::from("Eat the food, but"),
                    Line::from("avoid walls & yourself!"),
                ],
            },
            Status::Paused => Popup {
                title: " PAUSED ",
                lines: vec![Line::from_iter([
                    Span::raw("Press "),
                    Span::styled("space", consts::KEY_STYLE),
                    Span::raw(" to resume"),
                ])],
            },
            Status::GameOver(cause) => Popup {
                title: " GAME OVER ",
                lines: vec![
                    Line::from(cause.headline()),
                    Line::from(format!("Final score: {}", self.score)),
                ],
            },
        };
        popup.render(area, buf);
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Canvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    fn draw_cell(&mut self, cell: Cell, symbol: char, style: Style) {
        let Some(pos) = cell.to_position() else {
            return;
        };
        let Some(x) = pos
            .x
            .checked_mul(consts::CELL_WIDTH)
            .and_then(|x| self.area.x.checked_add(x))
        else {
            return;
        };
        let Some(y) = self.area.y.checked_add(pos.y) else {
            return;
        };
        if !self.area.contains((x, y).into()) {
            return;
        }
        if let Some(c) = self.buf.cell_mut((x, y)) {
            c.set_char(symbol);
            c.set_style(Style::reset().patch(style));
        }
    }
}

/// A bordered message box drawn over the middle of the board
#[derive(Clone, Debug, Eq, PartialEq)]
struct Popup {
    title: &'static str,
    lines: Vec<Line<'static>>,
}

impl Widget for Popup {
    // `area` is here the area of the whole board, not the area for just the
    // popup proper.
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text_width = self.lines.iter().map(Line::width).max().unwrap_or(0);
        let size = Size {
            width: u16::try_from(text_width)
                .unwrap_or(u16::MAX)
                .saturating_add(4),
            height: u16::try_from(self.lines.len())
                .unwrap_or(u16::MAX)
                .saturating_add(2),
        };
        let popup_area = center_rect(area, size);
        let block = Block::bordered()
            .title(self.title)
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(1))
            .style(Style::reset());
        let inner = block.inner(popup_area);
        Clear.render(popup_area, buf);
        block.render(popup_area, buf);
        for (line, row) in self.lines.into_iter().zip(inner.rows()) {
            line.render(row, buf);
        }
    }
}

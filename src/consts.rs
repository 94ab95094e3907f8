//! Assorted constants & hard-coded configuration
use crate::game::{Cell, Direction};
use ratatui::{
    layout::Size,
    style::{Color, Modifier, Style},
};
use std::time::Duration;

/// Width and height of the (square) playfield, in cells
pub(crate) const GRID_SIZE: i32 = 20;

/// Time between movements of the snake at the start of a game
pub(crate) const INITIAL_TICK_PERIOD: Duration = Duration::from_millis(150);

/// The tick period never drops below this, however high the score
pub(crate) const MIN_TICK_PERIOD: Duration = Duration::from_millis(60);

/// How much the tick period shrinks each time the snake eats
pub(crate) const TICK_PERIOD_STEP: Duration = Duration::from_millis(2);

/// The snake at the start of every game, head first
pub(crate) const INITIAL_SNAKE: [Cell; 3] = [
    Cell::new(10, 10),
    Cell::new(10, 11),
    Cell::new(10, 12),
];

pub(crate) const INITIAL_DIRECTION: Direction = Direction::Up;

/// Where the food sits before the first game has been started
pub(crate) const INITIAL_FOOD: Cell = Cell::new(5, 5);

/// Number of random draws made when placing food before falling back to a
/// scan of every free cell
pub(crate) const MAX_FOOD_ATTEMPTS: usize = 64;

/// Maximum number of entries kept in the score history
pub(crate) const HISTORY_CAPACITY: usize = 20;

/// Scores below this get a consolation comment
pub(crate) const LOW_SCORE_THRESHOLD: u32 = 5;

/// Scores above this get a congratulatory comment
pub(crate) const HIGH_SCORE_THRESHOLD: u32 = 20;

/// Default limit on how long to wait for remote commentary
pub(crate) const COMMENTARY_TIMEOUT: Duration = Duration::from_secs(8);

/// Longest commentary timeout honoured; larger configured values are capped
pub(crate) const MAX_COMMENTARY_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub(crate) const DEFAULT_COMMENTARY_MODEL: &str = "gemini-2.5-flash";

pub(crate) const DEFAULT_COMMENTARY_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable consulted for the commentary API key when the
/// configuration file doesn't set one
pub(crate) const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// How often the event loop wakes up to check for finished commentary while
/// nothing else is scheduled
pub(crate) const IDLE_POLL_PERIOD: Duration = Duration::from_millis(50);

/// Draw everything inside a rectangle of this size in the center of the
/// terminal window.
///
/// Cf. [`crate::util::get_display_area()`]
pub(crate) const DISPLAY_SIZE: Size = Size {
    width: 80,
    height: 24,
};

/// Each cell of the playfield is drawn this many terminal columns wide so
/// that the board looks roughly square
pub(crate) const CELL_WIDTH: u16 = 2;

/// Glyph for the snake's head when it is moving up
pub(crate) const SNAKE_HEAD_UP_SYMBOL: char = 'v';

/// Glyph for the snake's head when it is moving down
pub(crate) const SNAKE_HEAD_DOWN_SYMBOL: char = '^';

/// Glyph for the snake's head when it is moving right
pub(crate) const SNAKE_HEAD_RIGHT_SYMBOL: char = '<';

/// Glyph for the snake's head when it is moving left
pub(crate) const SNAKE_HEAD_LEFT_SYMBOL: char = '>';

/// Glyph for the parts of the snake's body
pub(crate) const SNAKE_BODY_SYMBOL: char = '⚬';

/// Glyph for the food
pub(crate) const FOOD_SYMBOL: char = '●';

/// Glyph for the snake's head when it's collided with a wall or itself
pub(crate) const COLLISION_SYMBOL: char = '×';

/// Style for the snake's head
pub(crate) const SNAKE_HEAD_STYLE: Style = Style::new()
    .fg(Color::LightGreen)
    .add_modifier(Modifier::BOLD);

/// Style for the snake's body
pub(crate) const SNAKE_BODY_STYLE: Style = Style::new().fg(Color::Green);

/// Style for the food
pub(crate) const FOOD_STYLE: Style = Style::new().fg(Color::LightRed);

/// Style for [`COLLISION_SYMBOL`]
pub(crate) const COLLISION_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::REVERSED);

/// Style for key codes shown in the interface
pub(crate) const KEY_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for the score bar at the top of the screen
pub(crate) const SCORE_BAR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Style for the top-ranked entry in the history panel
pub(crate) const TOP_SCORE_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

/// Style for commentary text in the history panel
pub(crate) const COMMENT_STYLE: Style = Style::new()
    .fg(Color::Gray)
    .add_modifier(Modifier::ITALIC);

/// Style for the "thinking" indicator shown while commentary is pending
pub(crate) const THINKING_STYLE: Style = Style::new().fg(Color::LightGreen);

//! Tetris
//!
//! The board is a row-major grid of color ids (0 = empty). Gravity runs off an
//! internal millisecond counter so the drop speed is independent of the frame
//! rate; the loop driver only supplies elapsed time.

use glam::IVec2;
use log::{debug, info};
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::consts::SIM_DT;
use crate::renderer::{Color, Frame, GridLayout, shapes};
use crate::settings::Settings;
use crate::sim::state::{Command, Progress, RngState, Spin, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

/// Gravity interval at level 1 (ms)
pub const BASE_DROP_MS: f32 = 1000.0;
/// Gravity interval lost per level (ms)
pub const DROP_MS_PER_LEVEL: f32 = 100.0;
/// Fastest gravity interval (ms)
pub const MIN_DROP_MS: f32 = 100.0;
/// Points for the first row of a sweep; each further row in the same sweep doubles
pub const LINE_POINTS: u64 = 10;
pub const POINTS_PER_LEVEL: u64 = 100;

pub type Matrix = Vec<Vec<u8>>;

/// The seven tetrominoes; the non-zero value is the color id
pub fn shape(id: u8) -> Matrix {
    match id {
        1 => vec![vec![0, 0, 0], vec![1, 1, 1], vec![0, 1, 0]],
        2 => vec![vec![2, 2], vec![2, 2]],
        3 => vec![vec![0, 3, 0], vec![0, 3, 0], vec![0, 3, 3]],
        4 => vec![vec![0, 4, 0], vec![0, 4, 0], vec![4, 4, 0]],
        5 => vec![
            vec![0, 5, 0, 0],
            vec![0, 5, 0, 0],
            vec![0, 5, 0, 0],
            vec![0, 5, 0, 0],
        ],
        6 => vec![vec![0, 6, 6], vec![6, 6, 0], vec![0, 0, 0]],
        _ => vec![vec![7, 7, 0], vec![0, 7, 7], vec![0, 0, 0]],
    }
}

/// Rotate a square matrix a quarter turn
pub fn rotate_matrix(matrix: &Matrix, spin: Spin) -> Matrix {
    let n = matrix.len();
    let mut out: Matrix = (0..n)
        .map(|y| {
            (0..n)
                .map(|x| matrix.get(x).and_then(|row| row.get(y)).copied().unwrap_or(0))
                .collect()
        })
        .collect();
    match spin {
        Spin::Clockwise => out.iter_mut().for_each(|row| row.reverse()),
        Spin::CounterClockwise => out.reverse(),
    }
    out
}

/// Falling tetromino
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub shape: Matrix,
    /// Board position of the matrix's top-left cell (x = column, y = row)
    pub pos: IVec2,
}

impl Piece {
    /// Occupied board cells
    pub fn cells(&self) -> impl Iterator<Item = (IVec2, u8)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(x, v)| (self.pos + IVec2::new(x as i32, y as i32), *v))
        })
    }

    pub fn width(&self) -> i32 {
        self.shape.first().map_or(0, |row| row.len() as i32)
    }
}

#[derive(Debug, Clone)]
pub struct Tetris {
    cols: usize,
    rows: usize,
    rng_state: RngState,
    rng: Pcg32,
    /// `board[row][col]`
    pub board: Matrix,
    pub piece: Piece,
    pub score: u64,
    /// Milliseconds since the last gravity step
    pub drop_counter: f32,
    /// Set when a new piece spawned into occupied cells
    pub topped_out: bool,
}

impl Tetris {
    pub fn new(settings: &Settings, _width: f32, _height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let (cols, rows) = settings.board_size;
        let mut tetris = Self {
            cols: cols as usize,
            rows: rows as usize,
            rng_state,
            rng,
            board: Vec::new(),
            piece: Piece {
                shape: shape(1),
                pos: IVec2::ZERO,
            },
            score: 0,
            drop_counter: 0.0,
            topped_out: false,
        };
        tetris.init_game();
        tetris
    }

    pub fn level(&self) -> u32 {
        (self.score / POINTS_PER_LEVEL) as u32 + 1
    }

    /// Gravity interval for the current level (ms)
    pub fn drop_interval(&self) -> f32 {
        let level = self.level().saturating_sub(1) as f32;
        (BASE_DROP_MS - level * DROP_MS_PER_LEVEL).max(MIN_DROP_MS)
    }

    /// True if the piece overlaps a filled cell or leaves the board
    pub fn collide(&self, piece: &Piece) -> bool {
        piece.cells().any(|(cell, _)| {
            if cell.x < 0 || cell.y < 0 {
                return true;
            }
            let (x, y) = (cell.x as usize, cell.y as usize);
            self.board
                .get(y)
                .and_then(|row| row.get(x))
                .is_none_or(|v| *v != 0)
        })
    }

    /// Spawn a random piece centered at row 0
    pub fn reset_piece(&mut self) -> Progress {
        let id = self.rng.random_range(1..=7);
        let shape = shape(id);
        let x = self.cols as i32 / 2 - shape[0].len() as i32 / 2;
        self.piece = Piece {
            shape,
            pos: IVec2::new(x, 0),
        };
        if self.collide(&self.piece) {
            self.topped_out = true;
            info!("Tetris topped out at {}", self.score);
            return Progress::GameOver;
        }
        Progress::Continue
    }

    /// Shift sideways; blocked moves are no-ops
    pub fn shift(&mut self, dx: i32) {
        self.piece.pos.x += dx;
        if self.collide(&self.piece) {
            self.piece.pos.x -= dx;
        }
    }

    /// Rotate with wall kicks of +1, -2, +3, ... columns. Reverts if no kick
    /// within the piece width clears the overlap.
    pub fn rotate(&mut self, spin: Spin) {
        let original = self.piece.clone();
        self.piece.shape = rotate_matrix(&self.piece.shape, spin);

        let width = self.piece.width();
        let mut offset: i32 = 1;
        while self.collide(&self.piece) {
            if offset.abs() > width {
                debug!("Rotation blocked, reverting");
                self.piece = original;
                return;
            }
            self.piece.pos.x += offset;
            offset = -(offset + offset.signum());
        }
    }

    /// Move down one row; lock, sweep and respawn when blocked
    pub fn drop(&mut self) -> Progress {
        self.drop_counter = 0.0;
        self.piece.pos.y += 1;
        if !self.collide(&self.piece) {
            return Progress::Continue;
        }
        self.piece.pos.y -= 1;
        self.lock()
    }

    /// Drop straight to the floor and lock
    pub fn hard_drop(&mut self) -> Progress {
        self.drop_counter = 0.0;
        while !self.collide(&self.piece) {
            self.piece.pos.y += 1;
        }
        self.piece.pos.y -= 1;
        self.lock()
    }

    fn lock(&mut self) -> Progress {
        self.merge();
        self.sweep();
        self.reset_piece()
    }

    fn merge(&mut self) {
        let cells: Vec<(IVec2, u8)> = self.piece.cells().collect();
        for (cell, value) in cells {
            if let Some(slot) = self
                .board
                .get_mut(cell.y as usize)
                .and_then(|row| row.get_mut(cell.x as usize))
            {
                *slot = value;
            }
        }
    }

    /// Clear full rows bottom-up. Returns the number of rows cleared.
    pub fn sweep(&mut self) -> u32 {
        let mut cleared = 0;
        let mut points = LINE_POINTS;
        let mut y = self.rows;
        while y > 0 {
            let row = y - 1;
            if self.board[row].iter().all(|v| *v != 0) {
                self.board.remove(row);
                self.board.insert(0, vec![0; self.cols]);
                self.score += points;
                points *= 2;
                cleared += 1;
                // Same index now holds the row that was above
                continue;
            }
            y -= 1;
        }
        if cleared > 0 {
            debug!("Cleared {} rows, score {}", cleared, self.score);
        }
        cleared
    }
}

impl Game for Tetris {
    fn kind(&self) -> GameKind {
        GameKind::Tetris
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame { step: SIM_DT }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        self.board = vec![vec![0; self.cols]; self.rows];
        self.score = 0;
        self.drop_counter = 0.0;
        self.topped_out = false;
        self.reset_piece();
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        if self.topped_out {
            return Progress::GameOver;
        }
        for command in &input.commands {
            let progress = match command {
                Command::MoveLeft => {
                    self.shift(-1);
                    Progress::Continue
                }
                Command::MoveRight => {
                    self.shift(1);
                    Progress::Continue
                }
                Command::MoveDown => self.drop(),
                Command::MoveUp => {
                    self.rotate(Spin::Clockwise);
                    Progress::Continue
                }
                Command::Rotate(spin) => {
                    self.rotate(*spin);
                    Progress::Continue
                }
                Command::Fire => self.hard_drop(),
                _ => Progress::Continue,
            };
            if progress != Progress::Continue {
                return progress;
            }
        }

        self.drop_counter += dt * 1000.0;
        if self.drop_counter > self.drop_interval() {
            return self.drop();
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);
        let layout = GridLayout::fit(frame.width, frame.height, self.cols as u32, self.rows as u32);
        for (y, row) in self.board.iter().enumerate() {
            for (x, value) in row.iter().enumerate() {
                if *value != 0 {
                    let cell = layout.cell_rect(y as u32, x as u32, 1.0);
                    frame.fill_rect(cell, shapes::palette(*value));
                }
            }
        }
        if !self.topped_out {
            for (cell, value) in self.piece.cells() {
                if cell.x >= 0 && cell.y >= 0 {
                    frame.fill_rect(
                        layout.cell_rect(cell.y as u32, cell.x as u32, 1.0),
                        shapes::palette(value),
                    );
                }
            }
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.score,
            lives: None,
            level: Some(self.level()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetris() -> Tetris {
        Tetris::new(&Settings::for_game(GameKind::Tetris), 300.0, 600.0)
    }

    fn vertical_i(x: i32, y: i32) -> Piece {
        Piece {
            shape: shape(5),
            pos: IVec2::new(x, y),
        }
    }

    #[test]
    fn test_spawn_centered_at_top() {
        let game = tetris();
        assert_eq!(game.piece.pos.y, 0);
        let width = game.piece.width();
        assert_eq!(game.piece.pos.x, 5 - width / 2);
        assert!(!game.collide(&game.piece));
    }

    #[test]
    fn test_rotate_matrix_quarter_turns() {
        let t = shape(1);
        let cw = rotate_matrix(&t, Spin::Clockwise);
        assert_eq!(cw, vec![vec![0, 1, 0], vec![1, 1, 0], vec![0, 1, 0]]);
        let back = rotate_matrix(&cw, Spin::CounterClockwise);
        assert_eq!(back, t);
    }

    #[test]
    fn test_sweep_removes_single_full_row() {
        let mut game = tetris();
        game.board[19] = vec![1; 10];
        game.board[18][0] = 3;
        game.board[17][4] = 6;

        assert_eq!(game.sweep(), 1);
        assert_eq!(game.board[19][0], 3);
        assert_eq!(game.board[18][4], 6);
        assert!(game.board[0].iter().all(|v| *v == 0));
        assert_eq!(game.board.len(), 20);
        assert_eq!(game.score, 10);
    }

    #[test]
    fn test_sweep_doubles_per_row() {
        let mut game = tetris();
        for row in 16..20 {
            game.board[row] = vec![2; 10];
        }
        assert_eq!(game.sweep(), 4);
        // 10 + 20 + 40 + 80
        assert_eq!(game.score, 150);
        assert!(game.board.iter().flatten().all(|v| *v == 0));
    }

    #[test]
    fn test_sweep_skips_partial_rows() {
        let mut game = tetris();
        game.board[19] = vec![1; 10];
        game.board[18] = vec![1; 10];
        game.board[18][5] = 0;
        game.board[17] = vec![1; 10];
        assert_eq!(game.sweep(), 2);
        assert_eq!(game.board[19][5], 0);
        assert_eq!(game.score, 30);
    }

    #[test]
    fn test_spawn_collision_ends_game_without_dropping() {
        let mut game = tetris();
        for row in 0..4 {
            game.board[row] = vec![4; 10];
            game.board[row][0] = 0;
        }
        assert_eq!(game.reset_piece(), Progress::GameOver);
        assert!(game.topped_out);

        let spawned = game.piece.pos;
        assert_eq!(game.update(&TickInput::default(), 5.0), Progress::GameOver);
        assert_eq!(game.piece.pos, spawned);
        assert_eq!(game.drop_counter, 0.0);
    }

    #[test]
    fn test_wall_kick_pushes_off_wall() {
        let mut game = tetris();
        // Vertical I hugging the left wall: its column 1 sits on board column 0
        game.piece = vertical_i(-1, 5);
        assert!(!game.collide(&game.piece));
        game.rotate(Spin::Clockwise);
        assert_eq!(game.piece.pos.x, 0);
        assert!(!game.collide(&game.piece));
    }

    /// T piece at (3, 5); rotating clockwise puts its stem at row 5
    fn t_piece_over_blocks(blocked: &[usize]) -> Tetris {
        let mut game = tetris();
        for &x in blocked {
            game.board[5][x] = 9;
        }
        game.piece = Piece {
            shape: shape(1),
            pos: IVec2::new(3, 5),
        };
        assert!(!game.collide(&game.piece));
        game
    }

    #[test]
    fn test_wall_kick_tries_left() {
        // Net +0 and +1 collide, net -1 is free
        let mut game = t_piece_over_blocks(&[4, 5]);
        game.rotate(Spin::Clockwise);
        assert_eq!(game.piece.pos.x, 2);
        assert_ne!(game.piece.shape, shape(1));
        assert!(!game.collide(&game.piece));
    }

    #[test]
    fn test_wall_kick_reaches_last_offset() {
        // Net +0, +1 and -1 collide; the third kick (+3, net +2) is within width 3
        let mut game = t_piece_over_blocks(&[3, 4, 5]);
        game.rotate(Spin::Clockwise);
        assert_eq!(game.piece.pos.x, 5);
        assert!(!game.collide(&game.piece));
    }

    #[test]
    fn test_blocked_rotation_reverts() {
        let settings = Settings {
            board_size: (3, 20),
            ..Settings::for_game(GameKind::Tetris)
        };
        let mut game = Tetris::new(&settings, 90.0, 600.0);
        game.piece = vertical_i(0, 5);
        let before = game.piece.clone();
        game.rotate(Spin::CounterClockwise);
        assert_eq!(game.piece, before);
    }

    #[test]
    fn test_shift_blocked_by_wall() {
        let mut game = tetris();
        for _ in 0..20 {
            game.shift(-1);
        }
        let leftmost = game.piece.cells().map(|(c, _)| c.x).min().unwrap();
        assert_eq!(leftmost, 0);
    }

    #[test]
    fn test_gravity_follows_drop_interval() {
        let mut game = tetris();
        let y = game.piece.pos.y;
        game.update(&TickInput::default(), 0.5);
        assert_eq!(game.piece.pos.y, y);
        game.update(&TickInput::default(), 0.51);
        assert_eq!(game.piece.pos.y, y + 1);
        assert_eq!(game.drop_counter, 0.0);
    }

    #[test]
    fn test_level_and_interval() {
        let mut game = tetris();
        assert_eq!(game.drop_interval(), 1000.0);
        game.score = 250;
        assert_eq!(game.level(), 3);
        assert_eq!(game.drop_interval(), 800.0);
        game.score = 5000;
        assert_eq!(game.drop_interval(), MIN_DROP_MS);
    }

    #[test]
    fn test_hard_drop_locks_at_floor() {
        let mut game = tetris();
        let input = TickInput::with_commands([Command::Fire]);
        assert_eq!(game.update(&input, SIM_DT), Progress::Continue);
        assert!(game.board[19].iter().any(|v| *v != 0));
        assert_eq!(game.piece.pos.y, 0);
    }

    #[test]
    fn test_soft_drop_moves_one_row() {
        let mut game = tetris();
        let y = game.piece.pos.y;
        game.update(&TickInput::with_commands([Command::MoveDown]), SIM_DT);
        assert_eq!(game.piece.pos.y, y + 1);
    }
}

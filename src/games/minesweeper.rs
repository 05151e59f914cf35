//! Minesweeper

use log::debug;
use rand::seq::index;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::renderer::{Align, Color, Frame, GridLayout};
use crate::settings::Settings;
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    pub mine: bool,
    pub revealed: bool,
    pub flagged: bool,
    /// Mines in the Moore neighborhood
    pub adjacent: u8,
}

#[derive(Debug, Clone)]
pub struct Minesweeper {
    width: f32,
    height: f32,
    cols: u32,
    rows: u32,
    mine_count: u32,
    interval_ms: u32,
    rng_state: RngState,
    rng: Pcg32,
    /// Row-major
    pub tiles: Vec<Tile>,
    pub flags: u32,
    /// Total single-cell reveals this match
    pub reveals: u32,
    pub exploded: Option<(u32, u32)>,
}

impl Minesweeper {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let (cols, rows) = settings.grid_dimensions;
        let mut game = Self {
            width,
            height,
            cols,
            rows,
            mine_count: settings.mine_count,
            interval_ms: settings.interval_ms,
            rng_state,
            rng,
            tiles: Vec::new(),
            flags: 0,
            reveals: 0,
            exploded: None,
        };
        game.init_game();
        game
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.rows && col < self.cols)
            .then(|| row as usize * self.cols as usize + col as usize)
    }

    pub fn tile(&self, row: u32, col: u32) -> Option<&Tile> {
        self.index(row, col).map(|i| &self.tiles[i])
    }

    fn neighbors(&self, row: u32, col: u32) -> impl Iterator<Item = (u32, u32)> + use<> {
        let (rows, cols) = (self.rows as i64, self.cols as i64);
        let (r, c) = (row as i64, col as i64);
        (-1..=1)
            .flat_map(move |dr| (-1..=1).map(move |dc| (r + dr, c + dc)))
            .filter(move |&(nr, nc)| {
                (nr, nc) != (r, c) && nr >= 0 && nc >= 0 && nr < rows && nc < cols
            })
            .map(|(nr, nc)| (nr as u32, nc as u32))
    }

    /// Replace the minefield and recompute neighbor counts
    pub fn set_mines(&mut self, mines: &[(u32, u32)]) {
        self.tiles = vec![Tile::default(); self.rows as usize * self.cols as usize];
        for &(r, c) in mines {
            if let Some(i) = self.index(r, c) {
                self.tiles[i].mine = true;
            }
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let count = self
                    .neighbors(row, col)
                    .filter(|&(nr, nc)| self.tile(nr, nc).is_some_and(|t| t.mine))
                    .count();
                if let Some(i) = self.index(row, col) {
                    self.tiles[i].adjacent = count as u8;
                }
            }
        }
        self.mine_count = self.tiles.iter().filter(|t| t.mine).count() as u32;
    }

    /// Safe cells still hidden
    pub fn hidden_safe(&self) -> usize {
        self.tiles.iter().filter(|t| !t.mine && !t.revealed).count()
    }

    pub fn flags_left(&self) -> u32 {
        self.mine_count.saturating_sub(self.flags)
    }

    /// Reveal a cell, flood-filling from zero-count cells. Revealed and
    /// flagged cells are no-ops.
    pub fn reveal(&mut self, row: u32, col: u32) -> Progress {
        let Some(i) = self.index(row, col) else {
            return Progress::Continue;
        };
        let tile = self.tiles[i];
        if tile.revealed || tile.flagged {
            return Progress::Continue;
        }
        if tile.mine {
            self.exploded = Some((row, col));
            for t in self.tiles.iter_mut().filter(|t| t.mine) {
                t.revealed = true;
            }
            return Progress::GameOver;
        }

        let mut work = vec![(row, col)];
        while let Some((r, c)) = work.pop() {
            let Some(j) = self.index(r, c) else { continue };
            let t = &mut self.tiles[j];
            if t.revealed || t.flagged || t.mine {
                continue;
            }
            t.revealed = true;
            self.reveals += 1;
            if t.adjacent == 0 {
                work.extend(self.neighbors(r, c));
            }
        }

        if self.hidden_safe() == 0 {
            Progress::Victory
        } else {
            Progress::Continue
        }
    }

    /// Toggle a flag on a hidden cell; placing is limited to the mine count
    pub fn toggle_flag(&mut self, row: u32, col: u32) {
        let Some(i) = self.index(row, col) else { return };
        let flags_left = self.flags_left();
        let tile = &mut self.tiles[i];
        if tile.revealed {
            return;
        }
        if tile.flagged {
            tile.flagged = false;
            self.flags -= 1;
        } else if flags_left > 0 {
            tile.flagged = true;
            self.flags += 1;
        } else {
            debug!("No flags left");
        }
    }

    fn layout(&self) -> GridLayout {
        GridLayout::fit(self.width, self.height, self.cols, self.rows)
    }
}

impl Game for Minesweeper {
    fn kind(&self) -> GameKind {
        GameKind::Minesweeper
    }

    fn cadence(&self) -> Cadence {
        Cadence::Fixed {
            interval_ms: self.interval_ms,
        }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        let cells = self.rows as usize * self.cols as usize;
        let amount = (self.mine_count as usize).min(cells);
        let mines: Vec<(u32, u32)> = index::sample(&mut self.rng, cells, amount)
            .into_iter()
            .map(|i| (i as u32 / self.cols, i as u32 % self.cols))
            .collect();
        self.set_mines(&mines);
        self.flags = 0;
        self.reveals = 0;
        self.exploded = None;
    }

    fn update(&mut self, input: &TickInput, _dt: f32) -> Progress {
        for command in &input.commands {
            let progress = match *command {
                Command::Reveal(r, c) => self.reveal(r, c),
                Command::Flag(r, c) => {
                    self.toggle_flag(r, c);
                    Progress::Continue
                }
                _ => Progress::Continue,
            };
            if progress != Progress::Continue {
                return progress;
            }
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::DARK);
        let layout = self.layout();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let Some(tile) = self.tile(row, col) else { continue };
                let rect = layout.cell_rect(row, col, 1.0);
                let center = layout.cell_center(row, col);
                let size = layout.cell * 0.6;
                if !tile.revealed {
                    frame.fill_rect(rect, Color::GREY);
                    if tile.flagged {
                        frame.text(center, "F", size, Color::RED, Align::Center);
                    }
                } else if tile.mine {
                    let color = if self.exploded == Some((row, col)) {
                        Color::RED
                    } else {
                        Color::WHITE
                    };
                    frame.fill_rect(rect, color);
                    frame.circle(center, layout.cell * 0.3, Color::BLACK);
                } else {
                    frame.fill_rect(rect, Color::WHITE);
                    if tile.adjacent > 0 {
                        let digits = tile.adjacent.to_string();
                        frame.text(center, digits, size, Color::BLUE, Align::Center);
                    }
                }
            }
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.tiles.iter().filter(|t| t.revealed && !t.mine).count() as u64,
            lives: None,
            level: None,
        }
    }

    fn pointer_grid(&self) -> Option<GridLayout> {
        Some(self.layout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(cols: u32, rows: u32, mines: &[(u32, u32)]) -> Minesweeper {
        let settings = Settings {
            grid_dimensions: (cols, rows),
            mine_count: 0,
            ..Settings::for_game(GameKind::Minesweeper)
        };
        let mut game = Minesweeper::new(&settings, 300.0, 300.0);
        game.set_mines(mines);
        game
    }

    #[test]
    fn test_random_placement_count() {
        let game = Minesweeper::new(&Settings::for_game(GameKind::Minesweeper), 300.0, 300.0);
        assert_eq!(game.tiles.iter().filter(|t| t.mine).count(), 10);
        assert_eq!(game.tiles.len(), 81);
    }

    #[test]
    fn test_adjacent_counts() {
        let game = board(3, 3, &[(0, 0), (2, 2)]);
        assert_eq!(game.tile(1, 1).unwrap().adjacent, 2);
        assert_eq!(game.tile(0, 1).unwrap().adjacent, 1);
        assert_eq!(game.tile(0, 2).unwrap().adjacent, 0);
    }

    #[test]
    fn test_flood_fill_reveals_each_cell_once() {
        let mut game = board(30, 30, &[]);
        assert_eq!(game.reveal(15, 15), Progress::Victory);
        assert_eq!(game.reveals, 900);
        assert!(game.tiles.iter().all(|t| t.revealed));
    }

    #[test]
    fn test_flood_stops_at_numbers() {
        // Mine in the far corner: the fill stops at its numbered neighbors
        let mut game = board(4, 4, &[(3, 3)]);
        assert_eq!(game.reveal(0, 0), Progress::Victory);
        assert!(!game.tile(3, 3).unwrap().revealed);
        assert_eq!(game.reveals, 15);
    }

    #[test]
    fn test_flood_respects_flags() {
        let mut game = board(3, 3, &[]);
        game.toggle_flag(2, 2);
        assert_eq!(game.flags, 0, "no budget on a mine-free board");

        let mut game = board(3, 3, &[(2, 2)]);
        game.toggle_flag(0, 2);
        assert_eq!(game.reveal(0, 0), Progress::Continue);
        assert!(!game.tile(0, 2).unwrap().revealed);
    }

    #[test]
    fn test_mine_reveals_all_mines() {
        let mut game = board(3, 3, &[(0, 0), (2, 2)]);
        assert_eq!(game.reveal(0, 0), Progress::GameOver);
        assert!(game.tile(2, 2).unwrap().revealed);
        assert_eq!(game.exploded, Some((0, 0)));
    }

    #[test]
    fn test_repeat_reveal_is_noop() {
        let mut game = board(3, 3, &[(0, 0)]);
        game.reveal(2, 2);
        let reveals = game.reveals;
        assert_eq!(game.reveal(2, 2), Progress::Continue);
        assert_eq!(game.reveals, reveals);
        assert_eq!(game.reveal(9, 9), Progress::Continue);
    }

    #[test]
    fn test_flag_budget() {
        let mut game = board(3, 3, &[(0, 0)]);
        game.toggle_flag(1, 1);
        game.toggle_flag(1, 2);
        assert_eq!(game.flags, 1);
        assert!(!game.tile(1, 2).unwrap().flagged);
        game.toggle_flag(1, 1);
        assert_eq!(game.flags, 0);
        assert_eq!(game.flags_left(), 1);
    }

    #[test]
    fn test_flagged_cell_cannot_be_revealed() {
        let mut game = board(3, 3, &[(0, 0)]);
        game.toggle_flag(0, 0);
        assert_eq!(game.reveal(0, 0), Progress::Continue);
        assert!(game.exploded.is_none());
    }

    #[test]
    fn test_commands_drive_reveal() {
        let mut game = board(2, 2, &[(0, 0)]);
        let input = TickInput::with_commands([
            Command::Reveal(1, 1),
            Command::Reveal(0, 1),
            Command::Reveal(1, 0),
        ]);
        assert_eq!(game.update(&input, 0.1), Progress::Victory);
    }
}

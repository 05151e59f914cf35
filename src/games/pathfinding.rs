//! Breadth-first search on a walkable grid, plus an interactive demo
//!
//! Coordinates are `IVec2 { x: col, y: row }`. Visited and path cells are
//! display state only; the search result is the source of truth.

use std::collections::VecDeque;

use glam::IVec2;
use log::{debug, info};

use super::GameKind;
use crate::renderer::{Color, Frame, GridLayout};
use crate::settings::Settings;
use crate::sim::state::{Command, Progress, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

/// Cells revealed per animation tick
pub const VISITS_PER_TICK: usize = 3;

const STEPS: [IVec2; 4] = [IVec2::NEG_Y, IVec2::X, IVec2::Y, IVec2::NEG_X];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Empty,
    Wall,
    Start,
    End,
    Visited,
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub cols: i32,
    pub rows: i32,
    walls: Vec<bool>,
}

impl Grid {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols: cols as i32,
            rows: rows as i32,
            walls: vec![false; cols as usize * rows as usize],
        }
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        (cell.x >= 0 && cell.y >= 0 && cell.x < self.cols && cell.y < self.rows)
            .then(|| cell.y as usize * self.cols as usize + cell.x as usize)
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        self.index(cell).is_some()
    }

    pub fn is_wall(&self, cell: IVec2) -> bool {
        self.index(cell).is_some_and(|i| self.walls[i])
    }

    pub fn walkable(&self, cell: IVec2) -> bool {
        self.index(cell).is_some_and(|i| !self.walls[i])
    }

    pub fn set_wall(&mut self, cell: IVec2, wall: bool) {
        if let Some(i) = self.index(cell) {
            self.walls[i] = wall;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Cells in the order they were dequeued
    pub visited: Vec<IVec2>,
    /// Start to end inclusive, if reachable
    pub path: Option<Vec<IVec2>>,
}

/// 4-connected BFS from `start` to `end`
pub fn bfs(grid: &Grid, start: IVec2, end: IVec2) -> SearchResult {
    let mut result = SearchResult::default();
    let (Some(start_idx), Some(_)) = (grid.index(start), grid.index(end)) else {
        return result;
    };
    if !grid.walkable(start) || !grid.walkable(end) {
        return result;
    }

    let mut parent: Vec<Option<IVec2>> = vec![None; grid.walls.len()];
    let mut seen = vec![false; grid.walls.len()];
    let mut queue = VecDeque::from([start]);
    seen[start_idx] = true;

    while let Some(cell) = queue.pop_front() {
        result.visited.push(cell);
        if cell == end {
            let mut path = vec![end];
            let mut cursor = end;
            while let Some(prev) = grid.index(cursor).and_then(|i| parent[i]) {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            result.path = Some(path);
            return result;
        }
        for step in STEPS {
            let next = cell + step;
            let Some(i) = grid.index(next) else { continue };
            if seen[i] || grid.walls[i] {
                continue;
            }
            seen[i] = true;
            parent[i] = Some(cell);
            queue.push_back(next);
        }
    }
    result
}

/// Wall-drawing BFS visualizer
#[derive(Debug, Clone)]
pub struct PathfindingDemo {
    width: f32,
    height: f32,
    interval_ms: u32,
    pub grid: Grid,
    pub start: IVec2,
    pub end: IVec2,
    pub search: Option<SearchResult>,
    /// Animation cursor over `visited` then `path`
    pub shown: usize,
}

impl PathfindingDemo {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let (cols, rows) = settings.grid_dimensions;
        let mut demo = Self {
            width,
            height,
            interval_ms: settings.interval_ms,
            grid: Grid::new(cols, rows),
            start: IVec2::ZERO,
            end: IVec2::ZERO,
            search: None,
            shown: 0,
        };
        demo.init_game();
        demo
    }

    /// Toggle a wall. Start and end cells can't be walled.
    pub fn toggle_wall(&mut self, row: u32, col: u32) {
        let cell = IVec2::new(col as i32, row as i32);
        if cell == self.start || cell == self.end || !self.grid.contains(cell) {
            return;
        }
        let wall = !self.grid.is_wall(cell);
        self.grid.set_wall(cell, wall);
        // Old results no longer describe the grid
        self.search = None;
        self.shown = 0;
    }

    pub fn run_search(&mut self) {
        let result = bfs(&self.grid, self.start, self.end);
        match &result.path {
            Some(path) => info!(
                "BFS found a {}-step path after {} visits",
                path.len() - 1,
                result.visited.len()
            ),
            None => info!("BFS found no path after {} visits", result.visited.len()),
        }
        self.search = Some(result);
        self.shown = 0;
    }

    /// Display kind of a cell at the current animation step
    pub fn node(&self, cell: IVec2) -> NodeKind {
        if cell == self.start {
            return NodeKind::Start;
        }
        if cell == self.end {
            return NodeKind::End;
        }
        if self.grid.is_wall(cell) {
            return NodeKind::Wall;
        }
        let Some(search) = &self.search else {
            return NodeKind::Empty;
        };
        let visits = search.visited.len();
        let on_path = search.path.as_ref().is_some_and(|path| {
            self.shown > visits && path[..(self.shown - visits).min(path.len())].contains(&cell)
        });
        if on_path {
            NodeKind::Path
        } else if search.visited[..self.shown.min(visits)].contains(&cell) {
            NodeKind::Visited
        } else {
            NodeKind::Empty
        }
    }

    fn animation_len(&self) -> usize {
        self.search
            .as_ref()
            .map_or(0, |s| s.visited.len() + s.path.as_ref().map_or(0, Vec::len))
    }

    fn layout(&self) -> GridLayout {
        GridLayout::fit(self.width, self.height, self.grid.cols as u32, self.grid.rows as u32)
    }
}

impl Game for PathfindingDemo {
    fn kind(&self) -> GameKind {
        GameKind::Pathfinding
    }

    fn cadence(&self) -> Cadence {
        Cadence::Fixed {
            interval_ms: self.interval_ms,
        }
    }

    fn init_game(&mut self) {
        let (cols, rows) = (self.grid.cols, self.grid.rows);
        self.grid = Grid::new(cols as u32, rows as u32);
        self.start = IVec2::new(1.min(cols - 1), rows / 2);
        self.end = IVec2::new((cols - 2).max(0), rows / 2);
        self.search = None;
        self.shown = 0;
    }

    fn update(&mut self, input: &TickInput, _dt: f32) -> Progress {
        for command in &input.commands {
            match *command {
                Command::PlaceWall(r, c) => self.toggle_wall(r, c),
                Command::Fire => self.run_search(),
                _ => {}
            }
        }
        let total = self.animation_len();
        if self.shown < total {
            self.shown = (self.shown + VISITS_PER_TICK).min(total);
            if self.shown == total {
                debug!("Search animation finished");
            }
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::WHITE);
        let layout = self.layout();
        for y in 0..self.grid.rows {
            for x in 0..self.grid.cols {
                let color = match self.node(IVec2::new(x, y)) {
                    NodeKind::Empty => Color::rgb(0xF4, 0xF4, 0xF4),
                    NodeKind::Wall => Color::DARK,
                    NodeKind::Start => Color::GREEN,
                    NodeKind::End => Color::RED,
                    NodeKind::Visited => Color::rgb(0xAF, 0xD8, 0xF8),
                    NodeKind::Path => Color::YELLOW,
                };
                frame.fill_rect(layout.cell_rect(y as u32, x as u32, 0.5), color);
            }
        }
    }

    fn stats(&self) -> Stats {
        let path_len = self
            .search
            .as_ref()
            .and_then(|s| s.path.as_ref())
            .map_or(0, |p| p.len().saturating_sub(1));
        Stats {
            score: path_len as u64,
            lives: None,
            level: None,
        }
    }

    fn pointer_grid(&self) -> Option<GridLayout> {
        Some(self.layout())
    }
}

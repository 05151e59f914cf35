//! Game loop driver
//!
//! Owns the phase state machine and exactly one scheduled continuation per
//! mounted game. Each continuation drains the command queue, steps the
//! simulation, renders, publishes a snapshot and reschedules itself.

use std::collections::VecDeque;

use log::{debug, info, trace};

use super::scheduler::{FrameHandle, ManualScheduler, Scheduler, Wake};
use super::state::{Command, GamePhase, HeldControls, Progress, Snapshot, Stats, TickInput};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};
use crate::games::GameKind;
use crate::input::{InputAdapter, RawEvent};
use crate::renderer::{Frame, GridLayout, RenderSurface, shapes};

/// Commands queued beyond this are dropped until the next tick drains them
const MAX_PENDING_COMMANDS: usize = 64;

/// How often a game's simulation runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cadence {
    /// One step of exactly `interval_ms` per continuation
    Fixed { interval_ms: u32 },
    /// One continuation per display frame; elapsed time is consumed in
    /// fixed `step`-second substeps
    Frame { step: f32 },
}

/// Simulation rules of one game
pub trait Game {
    fn kind(&self) -> GameKind;
    fn cadence(&self) -> Cadence;
    /// Rebuild every entity for a fresh match
    fn init_game(&mut self);
    /// Advance by `dt` seconds
    fn update(&mut self, input: &TickInput, dt: f32) -> Progress;
    /// Describe the current state; must not change it
    fn render(&self, frame: &mut Frame);
    fn stats(&self) -> Stats;
    /// Cell layout for pointer hit-testing, if the game is grid-addressed
    fn pointer_grid(&self) -> Option<GridLayout> {
        None
    }
}

pub struct GameLoop<S: Scheduler, R: RenderSurface> {
    game: Box<dyn Game>,
    scheduler: S,
    surface: R,
    phase: GamePhase,
    pending: Option<FrameHandle>,
    last_timestamp: Option<f64>,
    accumulator: f32,
    queue: VecDeque<Command>,
    undelivered: Vec<Command>,
    input: InputAdapter,
    frame: Frame,
    snapshot: Snapshot,
}

impl<S: Scheduler, R: RenderSurface> GameLoop<S, R> {
    /// Mount a game in the `Start` phase and present its first frame
    pub fn new(game: Box<dyn Game>, scheduler: S, surface: R) -> Self {
        let (w, h) = surface.size();
        let kind = game.kind();
        let snapshot = Snapshot::new(game.stats(), GamePhase::Start);
        let mut game_loop = Self {
            game,
            scheduler,
            surface,
            phase: GamePhase::Start,
            pending: None,
            last_timestamp: None,
            accumulator: 0.0,
            queue: VecDeque::new(),
            undelivered: Vec::new(),
            input: InputAdapter::for_kind(kind),
            frame: Frame::new(w, h),
            snapshot,
        };
        game_loop.render_and_publish();
        game_loop
    }

    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Latest published projection; the simulation never reads it
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// True while a continuation is scheduled
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_handle(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn game(&self) -> &dyn Game {
        self.game.as_ref()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    /// `Start -> Playing`: initialize entities and schedule the first tick.
    /// A no-op while a continuation is already pending or outside `Start`.
    pub fn start(&mut self) {
        if self.pending.is_some() {
            debug!("{} already running, start ignored", self.kind().name());
            return;
        }
        if self.phase != GamePhase::Start {
            debug!("{} not in Start phase ({:?}), start ignored", self.kind().name(), self.phase);
            return;
        }

        self.game.init_game();
        self.phase = GamePhase::Playing;
        self.accumulator = 0.0;
        self.last_timestamp = None;
        self.queue.clear();
        self.undelivered.clear();
        self.input.release_all();
        info!("{} started", self.kind().name());

        self.render_and_publish();
        self.schedule_next();
    }

    /// Cancel the pending continuation. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
            info!("{} stopped", self.kind().name());
        }
    }

    /// `stop()` then `start()` from a fresh `Start` phase
    pub fn reset(&mut self) {
        self.stop();
        self.phase = GamePhase::Start;
        info!("{} reset", self.kind().name());
        self.start();
    }

    /// Queue a command for the next tick
    pub fn handle_input(&mut self, command: Command) {
        if self.queue.len() >= MAX_PENDING_COMMANDS {
            debug!("command queue full, dropping {command:?}");
            return;
        }
        self.queue.push_back(command);
    }

    /// Translate a raw event and queue the resulting command, if any
    pub fn handle_event(&mut self, event: RawEvent) {
        let layout = self.game.pointer_grid();
        if let Some(command) = self.input.translate(event, layout.as_ref(), self.surface.size()) {
            self.handle_input(command);
        }
    }

    /// Run one scheduled continuation. Returns false (and does nothing) for
    /// any handle other than the single pending one.
    pub fn tick(&mut self, handle: FrameHandle, timestamp_ms: f64) -> bool {
        if self.pending != Some(handle) {
            debug!("dropping stale continuation {}", handle.id());
            return false;
        }
        self.pending = None;

        let dt = match self.last_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.last_timestamp = Some(timestamp_ms);

        while let Some(command) = self.queue.pop_front() {
            if command == Command::Pause {
                self.toggle_pause();
            } else if self.phase == GamePhase::Playing {
                self.undelivered.push(command);
            }
        }

        if self.phase == GamePhase::Playing {
            let held = self.input.held();
            let progress = match self.game.cadence() {
                Cadence::Fixed { interval_ms } => {
                    let input = TickInput {
                        commands: std::mem::take(&mut self.undelivered),
                        held,
                    };
                    self.game.update(&input, interval_ms as f32 / 1000.0)
                }
                Cadence::Frame { step } => self.run_substeps(dt, step, held),
            };
            self.apply_progress(progress);
        }

        self.render_and_publish();

        if self.phase.is_terminal() {
            debug!("{} parked in {:?}", self.kind().name(), self.phase);
        } else {
            self.schedule_next();
        }
        true
    }

    fn run_substeps(&mut self, dt: f32, step: f32, held: HeldControls) -> Progress {
        if step <= 0.0 {
            return Progress::Continue;
        }
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= step && substeps < MAX_SUBSTEPS {
            // One-shot commands only reach the first substep
            let input = TickInput {
                commands: std::mem::take(&mut self.undelivered),
                held,
            };
            let progress = self.game.update(&input, step);
            self.accumulator -= step;
            substeps += 1;
            if progress != Progress::Continue {
                self.accumulator = 0.0;
                return progress;
            }
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of spiralling
            self.accumulator = self.accumulator.min(step);
        }
        trace!("{} substeps", substeps);
        Progress::Continue
    }

    fn apply_progress(&mut self, progress: Progress) {
        let stats = self.game.stats();
        match progress {
            Progress::Continue => {}
            Progress::GameOver => {
                self.phase = GamePhase::GameOver;
                info!("{} game over (score {})", self.kind().name(), stats.score);
            }
            Progress::Victory => {
                self.phase = GamePhase::Victory;
                info!("{} victory (score {})", self.kind().name(), stats.score);
            }
        }
    }

    fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => {
                self.phase = GamePhase::Paused;
                self.input.release_all();
                info!("{} paused", self.kind().name());
            }
            GamePhase::Paused => {
                self.phase = GamePhase::Playing;
                self.accumulator = 0.0;
                info!("{} resumed", self.kind().name());
            }
            _ => {}
        }
    }

    fn schedule_next(&mut self) {
        let wake = match self.game.cadence() {
            Cadence::Fixed { interval_ms } => Wake::After(interval_ms),
            Cadence::Frame { .. } => Wake::NextFrame,
        };
        self.pending = Some(self.scheduler.schedule(wake));
    }

    fn render_and_publish(&mut self) {
        let (w, h) = self.surface.size();
        self.frame.width = w;
        self.frame.height = h;
        self.frame.commands.clear();

        self.game.render(&mut self.frame);
        let stats = self.game.stats();
        shapes::hud(&mut self.frame, stats.score, stats.lives, stats.level);
        shapes::phase_banner(&mut self.frame, self.phase);
        self.surface.present(&self.frame);

        self.snapshot = Snapshot::new(stats, self.phase);
    }
}

impl<R: RenderSurface> GameLoop<ManualScheduler, R> {
    /// Fire every continuation due within the next `ms` of virtual time
    pub fn advance(&mut self, ms: f64) {
        let end = self.scheduler.now() + ms;
        while self.scheduler.next_due().is_some_and(|due| due <= end) {
            let Some((handle, at)) = self.scheduler.fire_next() else {
                break;
            };
            self.tick(handle, at);
        }
        self.scheduler.set_now(end);
    }
}

impl<S: Scheduler, R: RenderSurface> Drop for GameLoop<S, R> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::consts::SIM_DT;
    use crate::renderer::{Align, Color, RecordingSurface};
    use glam::Vec2;

    /// Counts what the driver does to it
    struct StepCounter {
        cadence: Cadence,
        inits: u32,
        updates: u32,
        simulated: f32,
        commands_seen: Rc<RefCell<Vec<(u32, Command)>>>,
        finish_after: Option<u32>,
    }

    impl StepCounter {
        fn new(cadence: Cadence) -> Self {
            Self {
                cadence,
                inits: 0,
                updates: 0,
                simulated: 0.0,
                commands_seen: Rc::default(),
                finish_after: None,
            }
        }
    }

    impl Game for StepCounter {
        fn kind(&self) -> GameKind {
            GameKind::Pong
        }

        fn cadence(&self) -> Cadence {
            self.cadence
        }

        fn init_game(&mut self) {
            self.inits += 1;
            self.updates = 0;
            self.simulated = 0.0;
        }

        fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
            self.updates += 1;
            self.simulated += dt;
            for cmd in &input.commands {
                self.commands_seen.borrow_mut().push((self.updates, *cmd));
            }
            match self.finish_after {
                Some(n) if self.updates >= n => Progress::GameOver,
                _ => Progress::Continue,
            }
        }

        fn render(&self, frame: &mut Frame) {
            let label = format!("updates {}", self.updates);
            frame.text(Vec2::ZERO, label, 10.0, Color::WHITE, Align::Left);
        }

        fn stats(&self) -> Stats {
            Stats {
                score: self.updates as u64,
                lives: None,
                level: None,
            }
        }
    }

    fn frame_loop() -> GameLoop<ManualScheduler, RecordingSurface> {
        GameLoop::new(
            Box::new(StepCounter::new(Cadence::Frame { step: SIM_DT })),
            ManualScheduler::new(1000.0 / 60.0),
            RecordingSurface::new(100.0, 100.0),
        )
    }

    fn stats_of<S: Scheduler, R: RenderSurface>(lp: &GameLoop<S, R>) -> Stats {
        lp.game().stats()
    }

    #[test]
    fn test_mount_presents_start_frame() {
        let lp = frame_loop();
        assert_eq!(lp.phase(), GamePhase::Start);
        assert_eq!(lp.surface().presented(), 1);
        assert!(!lp.is_running());
        assert_eq!(lp.snapshot().phase, GamePhase::Start);
    }

    #[test]
    fn test_start_schedules_single_continuation() {
        let mut lp = frame_loop();
        lp.start();
        lp.start();
        assert_eq!(lp.phase(), GamePhase::Playing);
        assert_eq!(lp.scheduler().pending(), 1);
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let mut lp = frame_loop();
        lp.start();
        let handle = lp.pending_handle().unwrap();
        assert!(lp.tick(handle, 16.0));
        // Same continuation delivered twice
        assert!(!lp.tick(handle, 32.0));
        assert_eq!(lp.scheduler().pending(), 1);
    }

    #[test]
    fn test_stop_cancels_pending() {
        let mut lp = frame_loop();
        lp.start();
        let handle = lp.pending_handle().unwrap();
        lp.stop();
        lp.stop();
        assert!(!lp.is_running());
        assert_eq!(lp.scheduler().pending(), 0);
        assert!(!lp.tick(handle, 16.0));
        assert_eq!(stats_of(&lp).score, 0);
    }

    #[test]
    fn test_drop_cancels_shared_scheduler() {
        let shared = Rc::new(RefCell::new(ManualScheduler::default()));
        {
            let mut lp = GameLoop::new(
                Box::new(StepCounter::new(Cadence::Frame { step: SIM_DT })),
                Rc::clone(&shared),
                RecordingSurface::new(10.0, 10.0),
            );
            lp.start();
            assert_eq!(shared.borrow().pending(), 1);
        }
        assert_eq!(shared.borrow().pending(), 0);
    }

    #[test]
    fn test_frame_rate_independent() {
        let mut fast = frame_loop();
        let mut slow = GameLoop::new(
            Box::new(StepCounter::new(Cadence::Frame { step: SIM_DT })),
            ManualScheduler::new(1000.0 / 30.0),
            RecordingSurface::new(100.0, 100.0),
        );
        fast.start();
        slow.start();
        fast.advance(1000.0);
        slow.advance(1000.0);

        let fast_updates = stats_of(&fast).score as i64;
        let slow_updates = stats_of(&slow).score as i64;
        // Both simulate ~1s minus the first zero-dt frame
        assert!((fast_updates - slow_updates).abs() <= 5, "{fast_updates} vs {slow_updates}");
        assert!(fast_updates >= 110 && fast_updates <= 120);
    }

    #[test]
    fn test_fixed_cadence_one_step_per_tick() {
        let mut lp = GameLoop::new(
            Box::new(StepCounter::new(Cadence::Fixed { interval_ms: 100 })),
            ManualScheduler::default(),
            RecordingSurface::new(10.0, 10.0),
        );
        lp.start();
        lp.advance(1000.0);
        assert_eq!(stats_of(&lp).score, 10);
    }

    #[test]
    fn test_commands_reach_first_substep_only() {
        let game = StepCounter::new(Cadence::Frame { step: SIM_DT });
        let seen = Rc::clone(&game.commands_seen);
        let mut lp = GameLoop::new(
            Box::new(game),
            ManualScheduler::new(1000.0 / 30.0),
            RecordingSurface::new(10.0, 10.0),
        );
        lp.start();
        lp.advance(40.0);
        let before = stats_of(&lp).score as u32;

        lp.handle_input(Command::Fire);
        lp.advance(35.0);

        // A 30 Hz frame runs four 120 Hz substeps; the command lands on the first
        assert!(stats_of(&lp).score as u32 >= before + 3);
        assert_eq!(*seen.borrow(), vec![(before + 1, Command::Fire)]);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut lp = frame_loop();
        lp.start();
        lp.advance(100.0);
        lp.handle_input(Command::Pause);
        lp.advance(20.0);
        assert_eq!(lp.phase(), GamePhase::Paused);
        let frozen = stats_of(&lp).score;
        lp.advance(500.0);
        assert_eq!(stats_of(&lp).score, frozen);

        lp.handle_input(Command::Pause);
        lp.advance(100.0);
        assert_eq!(lp.phase(), GamePhase::Playing);
        assert!(stats_of(&lp).score > frozen);
    }

    #[test]
    fn test_terminal_progress_parks_loop() {
        let mut game = StepCounter::new(Cadence::Fixed { interval_ms: 50 });
        game.finish_after = Some(3);
        let mut lp = GameLoop::new(
            Box::new(game),
            ManualScheduler::default(),
            RecordingSurface::new(10.0, 10.0),
        );
        lp.start();
        lp.advance(1000.0);
        assert_eq!(lp.phase(), GamePhase::GameOver);
        assert!(!lp.is_running());
        assert_eq!(lp.snapshot().phase, GamePhase::GameOver);
        assert_eq!(lp.snapshot().score, 3);
        let frame = lp.surface().last_frame().unwrap();
        assert!(frame.texts().any(|t| t == "GAME OVER"));
    }

    #[test]
    fn test_reset_reinitializes() {
        let mut game = StepCounter::new(Cadence::Fixed { interval_ms: 50 });
        game.finish_after = Some(2);
        let mut lp = GameLoop::new(
            Box::new(game),
            ManualScheduler::default(),
            RecordingSurface::new(10.0, 10.0),
        );
        lp.start();
        lp.advance(500.0);
        assert_eq!(lp.phase(), GamePhase::GameOver);

        // Terminal phases only leave through reset
        lp.start();
        assert_eq!(lp.phase(), GamePhase::GameOver);

        lp.reset();
        assert_eq!(lp.phase(), GamePhase::Playing);
        assert_eq!(stats_of(&lp).score, 0);
        assert_eq!(lp.scheduler().pending(), 1);
    }

    #[test]
    fn test_input_dropped_while_paused() {
        let game = StepCounter::new(Cadence::Frame { step: SIM_DT });
        let seen = Rc::clone(&game.commands_seen);
        let mut lp = GameLoop::new(
            Box::new(game),
            ManualScheduler::default(),
            RecordingSurface::new(10.0, 10.0),
        );
        lp.start();
        lp.handle_input(Command::Pause);
        lp.handle_input(Command::Fire);
        lp.advance(50.0);
        lp.handle_input(Command::Pause);
        lp.advance(50.0);
        assert_eq!(lp.phase(), GamePhase::Playing);
        assert!(seen.borrow().is_empty());
    }
}

//! Input adapter
//!
//! Turns raw keyboard, pointer and touch events into normalized `Command`s
//! and held-control state. Nothing here touches simulation state; the loop
//! driver queues the output until the next tick.

use std::collections::HashSet;

use glam::Vec2;

use crate::games::GameKind;
use crate::renderer::GridLayout;
use crate::sim::state::{Command, HeldControls, Spin};

/// Physical keys the games care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    KeyDown(Key),
    KeyUp(Key),
    Pointer { pos: Vec2, button: PointerButton },
    Swipe(SwipeDir),
}

/// What a pointer press means for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Ignore,
    Reveal,
    Flag,
    PlaceWall,
    /// Screen quadrant -> `Press(0..4)`
    Quadrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    /// Letters become `Type(c)` instead of movement/rotation
    pub letters_are_text: bool,
    /// Movement keys only update held controls (continuous-motion games)
    pub held_movement: bool,
    pub primary: PointerAction,
    pub secondary: PointerAction,
}

impl Bindings {
    pub fn for_kind(kind: GameKind) -> Self {
        let held_movement = matches!(
            kind,
            GameKind::Pong | GameKind::Breakout | GameKind::Asteroids | GameKind::Invaders
        );
        let (letters_are_text, primary, secondary) = match kind {
            GameKind::Minesweeper => (false, PointerAction::Reveal, PointerAction::Flag),
            GameKind::Pathfinding => (false, PointerAction::PlaceWall, PointerAction::Ignore),
            GameKind::Simon => (false, PointerAction::Quadrant, PointerAction::Ignore),
            GameKind::Typing => (true, PointerAction::Ignore, PointerAction::Ignore),
            _ => (false, PointerAction::Ignore, PointerAction::Ignore),
        };
        Self {
            letters_are_text,
            held_movement,
            primary,
            secondary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputAdapter {
    bindings: Bindings,
    held: HeldControls,
    down: HashSet<Key>,
}

impl InputAdapter {
    pub fn new(bindings: Bindings) -> Self {
        Self {
            bindings,
            held: HeldControls::default(),
            down: HashSet::new(),
        }
    }

    pub fn for_kind(kind: GameKind) -> Self {
        Self::new(Bindings::for_kind(kind))
    }

    pub fn held(&self) -> HeldControls {
        self.held
    }

    /// Forget every held key (focus loss, reset)
    pub fn release_all(&mut self) {
        self.held = HeldControls::default();
        self.down.clear();
    }

    /// Translate one event. `layout` maps pointer positions to cells and
    /// `surface` is the drawable size used for quadrant hits.
    pub fn translate(
        &mut self,
        event: RawEvent,
        layout: Option<&GridLayout>,
        surface: (f32, f32),
    ) -> Option<Command> {
        match event {
            RawEvent::KeyDown(key) => {
                // Auto-repeat of a held key
                if !self.down.insert(key) {
                    return None;
                }
                self.set_held(key, true);
                self.key_command(key)
            }
            RawEvent::KeyUp(key) => {
                self.down.remove(&key);
                self.set_held(key, false);
                None
            }
            RawEvent::Pointer { pos, button } => {
                let action = match button {
                    PointerButton::Primary => self.bindings.primary,
                    PointerButton::Secondary => self.bindings.secondary,
                };
                pointer_command(action, pos, layout, surface)
            }
            RawEvent::Swipe(dir) => Some(match dir {
                SwipeDir::Up => Command::MoveUp,
                SwipeDir::Down => Command::MoveDown,
                SwipeDir::Left => Command::MoveLeft,
                SwipeDir::Right => Command::MoveRight,
            }),
        }
    }

    fn key_command(&self, key: Key) -> Option<Command> {
        if self.bindings.letters_are_text {
            return match key {
                Key::Char(c) if c.is_alphabetic() => Some(Command::Type(c.to_ascii_lowercase())),
                Key::Escape => Some(Command::Pause),
                _ => None,
            };
        }
        let movement = matches!(
            key,
            Key::Up | Key::Down | Key::Left | Key::Right | Key::Char('w' | 'a' | 's' | 'd')
        );
        if movement && self.bindings.held_movement {
            return None;
        }
        match key {
            Key::Up | Key::Char('w') => Some(Command::MoveUp),
            Key::Down | Key::Char('s') => Some(Command::MoveDown),
            Key::Left | Key::Char('a') => Some(Command::MoveLeft),
            Key::Right | Key::Char('d') => Some(Command::MoveRight),
            Key::Space => Some(Command::Fire),
            Key::Char('x') | Key::Char('e') => Some(Command::Rotate(Spin::Clockwise)),
            Key::Char('z') | Key::Char('q') => Some(Command::Rotate(Spin::CounterClockwise)),
            Key::Char('p') | Key::Escape => Some(Command::Pause),
            Key::Char(c @ '1'..='4') => Some(Command::Press(c as u8 - b'1')),
            Key::Char(_) => None,
        }
    }

    fn set_held(&mut self, key: Key, pressed: bool) {
        if self.bindings.letters_are_text && matches!(key, Key::Char(_)) {
            return;
        }
        match key {
            Key::Up | Key::Char('w') => self.held.up = pressed,
            Key::Down | Key::Char('s') => self.held.down = pressed,
            Key::Left | Key::Char('a') => self.held.left = pressed,
            Key::Right | Key::Char('d') => self.held.right = pressed,
            Key::Space => self.held.fire = pressed,
            _ => {}
        }
    }
}

fn pointer_command(
    action: PointerAction,
    pos: Vec2,
    layout: Option<&GridLayout>,
    surface: (f32, f32),
) -> Option<Command> {
    let cell = || layout.and_then(|l| l.cell_at(pos));
    match action {
        PointerAction::Ignore => None,
        PointerAction::Reveal => cell().map(|(r, c)| Command::Reveal(r, c)),
        PointerAction::Flag => cell().map(|(r, c)| Command::Flag(r, c)),
        PointerAction::PlaceWall => cell().map(|(r, c)| Command::PlaceWall(r, c)),
        PointerAction::Quadrant => {
            let (w, h) = surface;
            if pos.x < 0.0 || pos.y < 0.0 || pos.x >= w || pos.y >= h {
                return None;
            }
            let right = (pos.x >= w * 0.5) as u8;
            let bottom = (pos.y >= h * 0.5) as u8;
            Some(Command::Press(right + 2 * bottom))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: (f32, f32) = (400.0, 400.0);

    #[test]
    fn test_arrow_keys_emit_and_hold() {
        let mut input = InputAdapter::for_kind(GameKind::Snake);
        let cmd = input.translate(RawEvent::KeyDown(Key::Up), None, SURFACE);
        assert_eq!(cmd, Some(Command::MoveUp));
        assert!(input.held().up);

        input.translate(RawEvent::KeyUp(Key::Up), None, SURFACE);
        assert!(!input.held().up);
    }

    #[test]
    fn test_paddle_games_hold_without_commands() {
        let mut input = InputAdapter::for_kind(GameKind::Pong);
        assert_eq!(input.translate(RawEvent::KeyDown(Key::Down), None, SURFACE), None);
        assert!(input.held().down);
        assert_eq!(
            input.translate(RawEvent::KeyDown(Key::Space), None, SURFACE),
            Some(Command::Fire)
        );
    }

    #[test]
    fn test_key_repeat_not_reemitted() {
        let mut input = InputAdapter::for_kind(GameKind::Tetris);
        assert!(input.translate(RawEvent::KeyDown(Key::Left), None, SURFACE).is_some());
        assert!(input.translate(RawEvent::KeyDown(Key::Left), None, SURFACE).is_none());
        input.translate(RawEvent::KeyUp(Key::Left), None, SURFACE);
        assert!(input.translate(RawEvent::KeyDown(Key::Left), None, SURFACE).is_some());
    }

    #[test]
    fn test_typing_letters_become_text() {
        let mut input = InputAdapter::for_kind(GameKind::Typing);
        let cmd = input.translate(RawEvent::KeyDown(Key::Char('W')), None, SURFACE);
        assert_eq!(cmd, Some(Command::Type('w')));
        assert!(!input.held().up);
    }

    #[test]
    fn test_minesweeper_pointer_maps_cells() {
        let mut input = InputAdapter::for_kind(GameKind::Minesweeper);
        let layout = GridLayout::fit(90.0, 90.0, 3, 3);
        let reveal = RawEvent::Pointer {
            pos: Vec2::new(45.0, 75.0),
            button: PointerButton::Primary,
        };
        assert_eq!(input.translate(reveal, Some(&layout), SURFACE), Some(Command::Reveal(2, 1)));

        let flag = RawEvent::Pointer {
            pos: Vec2::new(5.0, 5.0),
            button: PointerButton::Secondary,
        };
        assert_eq!(input.translate(flag, Some(&layout), SURFACE), Some(Command::Flag(0, 0)));
    }

    #[test]
    fn test_pointer_outside_grid_dropped() {
        let mut input = InputAdapter::for_kind(GameKind::Pathfinding);
        let layout = GridLayout::fit(90.0, 90.0, 3, 3);
        let click = RawEvent::Pointer {
            pos: Vec2::new(200.0, 5.0),
            button: PointerButton::Primary,
        };
        assert_eq!(input.translate(click, Some(&layout), SURFACE), None);
    }

    #[test]
    fn test_simon_quadrants() {
        let mut input = InputAdapter::for_kind(GameKind::Simon);
        let press = |pos| RawEvent::Pointer {
            pos,
            button: PointerButton::Primary,
        };
        assert_eq!(
            input.translate(press(Vec2::new(10.0, 10.0)), None, SURFACE),
            Some(Command::Press(0))
        );
        assert_eq!(
            input.translate(press(Vec2::new(390.0, 10.0)), None, SURFACE),
            Some(Command::Press(1))
        );
        assert_eq!(
            input.translate(press(Vec2::new(10.0, 390.0)), None, SURFACE),
            Some(Command::Press(2))
        );
        assert_eq!(
            input.translate(press(Vec2::new(390.0, 390.0)), None, SURFACE),
            Some(Command::Press(3))
        );
    }

    #[test]
    fn test_swipe_and_release_all() {
        let mut input = InputAdapter::for_kind(GameKind::Merge2048);
        assert_eq!(
            input.translate(RawEvent::Swipe(SwipeDir::Left), None, SURFACE),
            Some(Command::MoveLeft)
        );
        input.translate(RawEvent::KeyDown(Key::Space), None, SURFACE);
        assert!(input.held().fire);
        input.release_all();
        assert!(!input.held().fire);
    }
}

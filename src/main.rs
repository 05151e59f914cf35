//! Arcade Sim headless runner
//!
//! Mounts a game on a virtual clock and a recording surface, feeds it a
//! short scripted input sequence and prints snapshots as JSON.
//!
//! Usage: `arcade-sim [game|all|routes] [millis] [difficulty]`

use glam::Vec2;
use log::{error, info};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use arcade_sim::games::routing::{nearest_neighbor_tour, tour_length, two_opt};
use arcade_sim::renderer::RecordingSurface;
use arcade_sim::sim::scheduler::ManualScheduler;
use arcade_sim::sim::state::{Command, Spin};
use arcade_sim::{Difficulty, GameKind, Settings, mount};

const SURFACE: (f32, f32) = (800.0, 600.0);
/// Snapshot and scripted-input period (ms)
const REPORT_MS: f64 = 1000.0;

/// A command sequence that exercises each game a little
fn script(kind: GameKind) -> Vec<Command> {
    match kind {
        GameKind::Pong | GameKind::Invaders | GameKind::Asteroids => vec![Command::Fire],
        GameKind::Breakout => vec![Command::Fire],
        GameKind::Snake => vec![
            Command::MoveUp,
            Command::MoveLeft,
            Command::MoveDown,
            Command::MoveRight,
        ],
        GameKind::Tetris => vec![
            Command::MoveLeft,
            Command::Rotate(Spin::Clockwise),
            Command::Fire,
            Command::MoveRight,
            Command::Fire,
        ],
        GameKind::Minesweeper => {
            vec![Command::Reveal(4, 4), Command::Reveal(0, 0), Command::Flag(8, 8)]
        }
        GameKind::Merge2048 => vec![
            Command::MoveLeft,
            Command::MoveUp,
            Command::MoveRight,
            Command::MoveDown,
        ],
        GameKind::Pathfinding => (0..10)
            .map(|row| Command::PlaceWall(row, 10))
            .chain([Command::Fire])
            .collect(),
        GameKind::Typing => "rustcrate".chars().map(Command::Type).collect(),
        GameKind::Simon => (0..4).map(Command::Press).collect(),
    }
}

fn run(kind: GameKind, millis: f64, settings: &Settings) -> bool {
    let surface = RecordingSurface::new(SURFACE.0, SURFACE.1);
    let mut game = match mount(kind, surface, ManualScheduler::default(), settings) {
        Ok(game) => game,
        Err(e) => {
            error!("Cannot mount {}: {}", kind.name(), e);
            return false;
        }
    };
    game.start();

    let mut commands = script(kind).into_iter().cycle();
    let mut elapsed = 0.0;
    while elapsed < millis && !game.phase().is_terminal() {
        if let Some(command) = commands.next() {
            game.handle_input(command);
        }
        game.advance(REPORT_MS.min(millis - elapsed));
        elapsed += REPORT_MS;
        info!("{} t={}ms {}", kind.name(), elapsed.min(millis), game.snapshot().to_json());
    }
    println!(
        "{{\"game\":\"{}\",\"frames\":{},\"snapshot\":{}}}",
        kind.name(),
        game.surface().presented(),
        game.snapshot().to_json()
    );
    true
}

/// Per-game defaults, rescaled only when a preset was asked for
fn settings_for(kind: GameKind, preset: Option<Difficulty>) -> Settings {
    let mut settings = Settings::for_game(kind);
    if let Some(preset) = preset {
        settings.apply_preset(preset);
    }
    settings
}

/// Random stops, greedy tour, then 2-opt
fn routes(seed: u64) {
    let mut rng = Pcg32::seed_from_u64(seed);
    let points: Vec<Vec2> = (0..40)
        .map(|_| Vec2::new(rng.random_range(0.0..SURFACE.0), rng.random_range(0.0..SURFACE.1)))
        .collect();
    let greedy = nearest_neighbor_tour(&points, 0);
    let greedy_len = tour_length(&points, &greedy);
    let improved = two_opt(&points, greedy);
    let improved_len = tour_length(&points, &improved);
    info!("Nearest neighbor {:.1}, after 2-opt {:.1}", greedy_len, improved_len);
    println!(
        "{{\"stops\":{},\"nearest_neighbor\":{:.1},\"two_opt\":{:.1}}}",
        points.len(),
        greedy_len,
        improved_len
    );
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let target = args.first().map(String::as_str).unwrap_or("all");
    let millis = args.get(1).and_then(|s| s.parse::<f64>().ok()).unwrap_or(10_000.0);
    let difficulty = args.get(2).and_then(|s| Difficulty::from_str(s));

    if target.eq_ignore_ascii_case("routes") {
        routes(Settings::default().seed);
        return;
    }

    let kinds: Vec<GameKind> = if target.eq_ignore_ascii_case("all") {
        GameKind::ALL.to_vec()
    } else if let Some(kind) = GameKind::from_str(target) {
        vec![kind]
    } else {
        error!("Unknown game '{}'", target);
        eprintln!("usage: arcade-sim [game|all|routes] [millis] [easy|normal|hard]");
        std::process::exit(2);
    };

    info!("Arcade Sim (headless) running {} game(s) for {}ms", kinds.len(), millis);
    let mut failed = false;
    for kind in kinds {
        failed |= !run(kind, millis, &settings_for(kind, difficulty));
    }
    if failed {
        std::process::exit(1);
    }
}

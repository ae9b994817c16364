//! The nine arcade games
//!
//! Each game is a `Simulation` built from a `RunConfig`. Difficulty picks a
//! row from the game's config table once, at construction.

pub mod asteroids;
pub mod bricks;
pub mod dodger;
pub mod memory;
pub mod pong;
pub mod rhythm;
pub mod runner;
pub mod survival;
pub mod tiles;

pub use asteroids::AsteroidsPulse;
pub use bricks::BrickBreaker;
pub use dodger::NeonDodger;
pub use memory::MemoryMatch;
pub use pong::PongNeon;
pub use rhythm::RhythmTap;
pub use runner::PrecisionRunner;
pub use survival::VoidSurvival;
pub use tiles::Fusion2048;

use glam::Vec2;

use super::{GameId, RunConfig, Simulation};
use crate::consts::{HEIGHT, WIDTH};
use crate::input::{Action, InputManager};
use crate::renderer::{Painter, TextAlign, colors};

/// Build the simulation for `config.game`
pub fn create(config: &RunConfig) -> Box<dyn Simulation> {
    log::info!(
        "Starting {} ({}, {}, seed {})",
        config.game.as_str(),
        config.difficulty.as_str(),
        config.mode,
        config.seed
    );
    match config.game {
        GameId::NeonDodger => Box::new(NeonDodger::new(config)),
        GameId::AsteroidsPulse => Box::new(AsteroidsPulse::new(config)),
        GameId::BrickBreakerBlitz => Box::new(BrickBreaker::new(config)),
        GameId::VoidSurvival => Box::new(VoidSurvival::new(config)),
        GameId::RhythmTap => Box::new(RhythmTap::new(config)),
        GameId::PrecisionRunner => Box::new(PrecisionRunner::new(config)),
        GameId::Fusion2048 => Box::new(Fusion2048::new(config)),
        GameId::MemoryMatch => Box::new(MemoryMatch::new(config)),
        GameId::PongNeon => Box::new(PongNeon::new(config)),
    }
}

/// -1, 0 or 1 from a pair of opposing actions
pub(crate) fn axis(input: &InputManager, negative: Action, positive: Action) -> f32 {
    (input.is_down(positive) as i32 - input.is_down(negative) as i32) as f32
}

/// Dark field with a slowly drifting neon grid
pub(crate) fn backdrop(painter: &mut dyn Painter, time: f32) {
    const SPACING: f32 = 26.0;
    painter.clear(colors::BACKGROUND);
    let offset = (time * 45.0) % SPACING;
    let mut x = -SPACING + offset;
    while x < WIDTH + SPACING {
        painter.line(Vec2::new(x, 0.0), Vec2::new(x, HEIGHT), colors::GRID, 1.0);
        x += SPACING;
    }
    let mut y = -SPACING + offset;
    while y < HEIGHT + SPACING {
        painter.line(Vec2::new(0.0, y), Vec2::new(WIDTH, y), colors::GRID, 1.0);
        y += SPACING;
    }
}

/// Small label row along the top edge
pub(crate) fn hud(painter: &mut dyn Painter, items: &[(&str, String)]) {
    let mut x = 18.0;
    for (label, value) in items {
        let text = format!("{label} {value}");
        painter.text(&text, Vec2::new(x, 26.0), 16.0, colors::TEXT, TextAlign::Left);
        x += 16.0 + text.chars().count() as f32 * 10.0;
    }
}

/// Screen-shake translation; deterministic in `time` so drawing stays pure
pub(crate) fn shake_offset(shake: f32, time: f32) -> Vec2 {
    if shake <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new((time * 97.0).sin(), (time * 131.0).cos()) * shake
}


#[cfg(test)]
mod tests {
    use super::testing::Rig;
    use super::*;
    use crate::settings::Difficulty;

    fn scripted_run(game: GameId, seed: u32) -> (u32, Option<crate::sim::RunResult>, Vec<crate::renderer::DrawCommand>) {
        let config = RunConfig::new(game, Difficulty::Normal, seed);
        let mut sim = create(&config);
        let mut rig = Rig::new();
        for i in 0..600 {
            // Deterministic input script: sweep left/right and tap primary
            match (i / 40) % 3 {
                0 => rig.input.set_virtual(Action::Left, true),
                1 => {
                    rig.input.set_virtual(Action::Left, false);
                    rig.input.set_virtual(Action::Right, true);
                }
                _ => rig.input.clear_virtual(),
            }
            if i % 25 == 0 {
                rig.input.set_virtual(Action::Action, true);
            } else if i % 25 == 5 {
                rig.input.set_virtual(Action::Action, false);
            }
            rig.tick(sim.as_mut(), 1.0 / 60.0);
        }
        sim.draw(&mut rig.painter, 10.0);
        (sim.score(), sim.latch().result().cloned(), rig.painter.commands.clone())
    }

    #[test]
    fn test_every_game_is_deterministic() {
        for game in GameId::ALL {
            let a = scripted_run(game, 20240601);
            let b = scripted_run(game, 20240601);
            assert_eq!(a.0, b.0, "{} score diverged", game.as_str());
            assert_eq!(a.1, b.1, "{} result diverged", game.as_str());
            assert_eq!(a.2, b.2, "{} frame diverged", game.as_str());
        }
    }

    #[test]
    fn test_registry_builds_matching_ids() {
        for game in GameId::ALL {
            let sim = create(&RunConfig::new(game, Difficulty::Easy, 1));
            assert_eq!(sim.id(), game);
            assert!(!sim.latch().is_ended());
        }
    }

    #[test]
    fn test_every_game_draws() {
        let mut rig = Rig::new();
        for game in GameId::ALL {
            let sim = create(&RunConfig::new(game, Difficulty::Hard, 77));
            sim.draw(&mut rig.painter, 0.0);
            assert!(rig.painter.commands.len() > 1, "{} drew nothing", game.as_str());
        }
    }
}

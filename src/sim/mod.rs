//! Deterministic game simulations
//!
//! Every game lives here behind the `Simulation` trait. Simulations must be
//! deterministic for a given seed:
//! - Seeded RNG only (`rng::SeededRng`)
//! - Ordered `Vec` entity lists, first match wins
//! - Difficulty is a lookup at construction, never adaptive
//! - No platform dependencies; drawing goes through `Painter`

pub mod collision;
pub mod frame_loop;
pub mod games;
pub mod particles;
pub mod rng;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use collision::{Rect, circle_hits_circle, circle_hits_rect, dist};
pub use frame_loop::{FrameReport, GameRunner};
pub use games::create;
pub use particles::{Burst, ParticleSystem};
pub use rng::{SeededRng, hash_string};

use crate::audio::AudioManager;
use crate::input::{InputEvent, InputManager};
use crate::renderer::Painter;
use crate::settings::{Difficulty, QualityPreset, Settings};

/// Terminal outcome of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunResult {
    pub score: u32,
    pub won: bool,
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
}

impl RunResult {
    pub fn new(score: u32, won: bool) -> Self {
        Self {
            score,
            won,
            stats: BTreeMap::new(),
        }
    }

    pub fn with_stat(mut self, key: &str, value: f64) -> Self {
        self.stats.insert(key.to_string(), value);
        self
    }

    pub fn stat(&self, key: &str) -> Option<f64> {
        self.stats.get(key).copied()
    }
}

/// Round a float score accumulator for reporting
pub fn whole_score(score: f32) -> u32 {
    score.max(0.0).round() as u32
}

/// Holds the first terminal result; later ones are ignored
#[derive(Debug, Clone, Default)]
pub struct EndLatch {
    result: Option<RunResult>,
}

impl EndLatch {
    /// Record the result. Returns false (and changes nothing) if already ended.
    pub fn end(&mut self, result: RunResult) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result);
        true
    }

    pub fn is_ended(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }
}

/// Game identifiers in library order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameId {
    #[serde(rename = "neon-dodger")]
    NeonDodger,
    #[serde(rename = "asteroids-pulse")]
    AsteroidsPulse,
    #[serde(rename = "brick-breaker-blitz")]
    BrickBreakerBlitz,
    #[serde(rename = "void-survival")]
    VoidSurvival,
    #[serde(rename = "rhythm-tap")]
    RhythmTap,
    #[serde(rename = "precision-runner")]
    PrecisionRunner,
    #[serde(rename = "game-2048")]
    Fusion2048,
    #[serde(rename = "memory-match")]
    MemoryMatch,
    #[serde(rename = "pong-neon")]
    PongNeon,
}

impl GameId {
    pub const ALL: [GameId; 9] = [
        GameId::NeonDodger,
        GameId::AsteroidsPulse,
        GameId::BrickBreakerBlitz,
        GameId::VoidSurvival,
        GameId::RhythmTap,
        GameId::PrecisionRunner,
        GameId::Fusion2048,
        GameId::MemoryMatch,
        GameId::PongNeon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::NeonDodger => "neon-dodger",
            GameId::AsteroidsPulse => "asteroids-pulse",
            GameId::BrickBreakerBlitz => "brick-breaker-blitz",
            GameId::VoidSurvival => "void-survival",
            GameId::RhythmTap => "rhythm-tap",
            GameId::PrecisionRunner => "precision-runner",
            GameId::Fusion2048 => "game-2048",
            GameId::MemoryMatch => "memory-match",
            GameId::PongNeon => "pong-neon",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::NeonDodger => "Neon Dodger",
            GameId::AsteroidsPulse => "Asteroids Pulse",
            GameId::BrickBreakerBlitz => "Brick Breaker Blitz",
            GameId::VoidSurvival => "Void Survival",
            GameId::RhythmTap => "Rhythm Tap",
            GameId::PrecisionRunner => "Precision Runner",
            GameId::Fusion2048 => "Fusion 2048",
            GameId::MemoryMatch => "Memory Match",
            GameId::PongNeon => "Pong Neon",
        }
    }

    /// Play modes; the first is the fallback
    pub fn modes(&self) -> &'static [&'static str] {
        match self {
            GameId::PongNeon => &["single", "duel"],
            _ => &["single"],
        }
    }

    pub fn default_mode(&self) -> &'static str {
        self.modes()[0]
    }

    /// Short how-to-play lines for the tutorial card
    pub fn tutorial(&self) -> &'static [&'static str] {
        match self {
            GameId::NeonDodger => &[
                "Dodge the falling blocks. Speed ramps the longer you last.",
                "Grab yellow cores for bonus points.",
                "Move: Arrows / WASD",
            ],
            GameId::AsteroidsPulse => &[
                "Shoot asteroids to split them into faster fragments.",
                "Your ship drifts and wraps across the edges.",
                "Rotate: Left/Right  Thrust: Up  Brake: Down  Fire: Space",
            ],
            GameId::BrickBreakerBlitz => &[
                "Break every brick to advance. Clear all levels to win.",
                "Catch power-ups: wide paddle, multi-ball, slow ball.",
                "Move: Left/Right",
            ],
            GameId::VoidSurvival => &[
                "You auto-fire at the nearest enemy. Keep moving.",
                "Collect green orbs for XP and random upgrades.",
                "Move: Arrows / WASD",
            ],
            GameId::RhythmTap => &[
                "Hit notes as they cross the line.",
                "Perfect timing grows your combo faster.",
                "Lanes: D F J K or tap",
            ],
            GameId::PrecisionRunner => &[
                "You sprint automatically. Jump over obstacles.",
                "Each obstacle cleared extends your streak.",
                "Jump: Space / Up",
            ],
            GameId::Fusion2048 => &[
                "Slide all tiles in one direction. Equal tiles merge.",
                "Reach the target tile before the board locks up.",
                "Move: Arrows / WASD or swipe",
            ],
            GameId::MemoryMatch => &[
                "Reveal two cards at a time and find the pairs.",
                "Consecutive matches raise your combo bonus.",
                "Click cards, or Arrows + Space",
            ],
            GameId::PongNeon => &[
                "First to 7 points wins.",
                "Single: right paddle is AI. Duel: P1 W/S, P2 Up/Down.",
                "Move: W/S or Up/Down",
            ],
        }
    }
}

/// Everything a simulation is constructed from
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub game: GameId,
    pub difficulty: Difficulty,
    pub mode: String,
    pub seed: u32,
    pub settings: Settings,
}

impl RunConfig {
    pub fn new(game: GameId, difficulty: Difficulty, seed: u32) -> Self {
        Self {
            game,
            difficulty,
            mode: game.default_mode().to_string(),
            seed,
            settings: Settings::default(),
        }
    }

    /// Build from loosely typed launcher input; unknown difficulty or mode
    /// fall back to the first available.
    pub fn resolve(
        game: GameId,
        difficulty: &str,
        mode: Option<&str>,
        seed: u32,
        settings: Settings,
    ) -> Self {
        let mode = match mode {
            Some(m) if game.modes().contains(&m) => m.to_string(),
            Some(m) => {
                log::warn!("Unknown mode {:?} for {}, using {}", m, game.as_str(), game.default_mode());
                game.default_mode().to_string()
            }
            None => game.default_mode().to_string(),
        };
        Self {
            game,
            difficulty: Difficulty::parse_or_default(difficulty),
            mode,
            seed,
            settings,
        }
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        if self.game.modes().contains(&mode) {
            self.mode = mode.to_string();
        }
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

/// Per-frame context handed to `Simulation::update`
pub struct Frame<'a> {
    pub input: &'a mut InputManager,
    pub audio: &'a mut AudioManager,
    /// Raw events queued since the last update, oldest first
    pub events: &'a [InputEvent],
}

/// The contract every game honors
pub trait Simulation {
    fn id(&self) -> GameId;

    /// Advance by `dt` seconds (already clamped by the runner)
    fn update(&mut self, dt: f32, frame: &mut Frame<'_>);

    /// Render the current state; `time` is simulated seconds for animation
    fn draw(&self, painter: &mut dyn Painter, time: f32);

    /// Live score for the HUD
    fn score(&self) -> u32;

    fn latch(&self) -> &EndLatch;

    /// Graphics quality for particles spawned from now on
    fn set_quality(&mut self, _quality: QualityPreset) {}

    /// Release anything held beyond the struct itself
    fn dispose(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_first_wins() {
        let mut latch = EndLatch::default();
        assert!(latch.end(RunResult::new(10, true)));
        assert!(!latch.end(RunResult::new(99, false)));
        assert_eq!(latch.result(), Some(&RunResult::new(10, true)));
    }

    #[test]
    fn test_game_id_round_trip_and_order() {
        for id in GameId::ALL {
            assert_eq!(GameId::from_str(id.as_str()), Some(id));
        }
        assert_eq!(GameId::ALL[0].as_str(), "neon-dodger");
        assert_eq!(GameId::ALL[8].as_str(), "pong-neon");
        assert_eq!(GameId::from_str("tetris"), None);
        assert_eq!(serde_json::to_string(&GameId::Fusion2048).unwrap(), "\"game-2048\"");
    }

    #[test]
    fn test_config_fallbacks() {
        let cfg = RunConfig::resolve(GameId::PongNeon, "impossible", Some("squad"), 5, Settings::default());
        assert_eq!(cfg.difficulty, Difficulty::Easy);
        assert_eq!(cfg.mode, "single");
        let cfg = RunConfig::resolve(GameId::PongNeon, "hard", Some("duel"), 5, Settings::default());
        assert_eq!(cfg.difficulty, Difficulty::Hard);
        assert_eq!(cfg.mode, "duel");
        let cfg = RunConfig::resolve(GameId::NeonDodger, "normal", None, 5, Settings::default());
        assert_eq!(cfg.mode, "single");
    }

    #[test]
    fn test_result_stats() {
        let r = RunResult::new(5, false).with_stat("run", 14.0);
        assert_eq!(r.stat("run"), Some(14.0));
        assert_eq!(r.stat("tile"), None);
        assert_eq!(whole_score(12.6), 13);
        assert_eq!(whole_score(-3.0), 0);
    }
}

//! Neon Arcade - a hub of nine seeded arcade mini-games
//!
//! Core modules:
//! - `sim`: Deterministic game simulations, frame loop host, RNG, particles
//! - `input`: Keyboard + virtual button action mapping
//! - `audio`: Synthesized sound effects and procedural music
//! - `renderer`: Painter abstraction over Canvas2D
//! - `session`: Per-play host that owns input/audio across restarts
//! - `progress` / `achievements` / `daily`: Collaborators fed by run results

pub mod achievements;
pub mod audio;
pub mod daily;
pub mod error;
pub mod fps;
pub mod input;
pub mod progress;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{ArcadeError, Result};
pub use progress::ProgressState;
pub use settings::{Difficulty, QualityPreset, Settings};

/// Shared arcade constants
pub mod consts {
    /// Logical playfield size every game draws into
    pub const WIDTH: f32 = 900.0;
    pub const HEIGHT: f32 = 540.0;

    /// Largest simulated step per frame (one 30 fps frame)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// How often score/fps are pushed to the HUD
    pub const HUD_REFRESH_SECS: f32 = 0.1;

    /// Downward acceleration applied to particles (units/s²)
    pub const PARTICLE_GRAVITY: f32 = 100.0;

    /// Procedural music note interval
    pub const MUSIC_INTERVAL_SECS: f32 = 0.28;
}

/// Clamp `v` into `[lo, hi]`.
///
/// Written as `min(hi, max(lo, v))` so an inverted range never panics.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    hi.min(lo.max(v))
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Wrap a coordinate around a toroidal axis of length `max`
#[inline]
pub fn wrap(v: f32, max: f32) -> f32 {
    if v < 0.0 {
        v + max
    } else if v > max {
        v - max
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(12.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(-2.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(4.0, 0.0, 10.0), 4.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
        assert_eq!(lerp(10.0, 20.0, 0.5), 15.0);
        assert_eq!(lerp(10.0, 20.0, 1.0), 20.0);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(-5.0, 900.0), 895.0);
        assert_eq!(wrap(905.0, 900.0), 5.0);
        assert_eq!(wrap(450.0, 900.0), 450.0);
        // Exactly on the edge stays put
        assert_eq!(wrap(900.0, 900.0), 900.0);
    }
}

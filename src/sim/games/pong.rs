//! Pong Neon - first to seven, against the AI or a second player

use glam::Vec2;

use crate::audio::SoundEffect;
use crate::clamp;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::{Action, InputManager};
use crate::renderer::{Painter, TextAlign, colors, fade};
use crate::settings::Difficulty;
use crate::sim::{EndLatch, Frame, GameId, RunConfig, RunResult, SeededRng, Simulation};

const PADDLE_W: f32 = 14.0;
const PADDLE_H: f32 = 110.0;
/// Paddle inset from the side walls
const PADDLE_INSET: f32 = 30.0;
const PADDLE_MARGIN: f32 = 16.0;
const PLAYER_SPEED: f32 = 360.0;
const BALL_RADIUS: f32 = 8.0;
const MAX_BALL_SPEED: f32 = 640.0;
const MAX_BALL_VY: f32 = 420.0;
/// AI holds still while the ball is this close to its paddle center
const AI_DEADZONE: f32 = 8.0;
pub const WIN_SCORE: u32 = 7;

#[derive(Debug, Clone, Copy)]
pub struct PongConfig {
    pub ball_speed: f32,
    pub ai_speed: f32,
}

impl PongConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                ball_speed: 240.0,
                ai_speed: 180.0,
            },
            Difficulty::Normal => Self {
                ball_speed: 280.0,
                ai_speed: 240.0,
            },
            Difficulty::Hard => Self {
                ball_speed: 320.0,
                ai_speed: 300.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PongMode {
    /// Right paddle is AI controlled
    Single,
    /// Two players on one keyboard
    Duel,
}

impl PongMode {
    pub fn from_str(s: &str) -> Self {
        match s {
            "duel" => PongMode::Duel,
            _ => PongMode::Single,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Paddle {
    /// Top edge
    y: f32,
    score: u32,
}

impl Paddle {
    fn center(&self) -> f32 {
        self.y + PADDLE_H * 0.5
    }

    fn drive(&mut self, direction: f32, speed: f32, dt: f32) {
        self.y = clamp(self.y + direction * speed * dt, PADDLE_MARGIN, HEIGHT - PADDLE_H - PADDLE_MARGIN);
    }

    fn spans(&self, ball_y: f32) -> bool {
        ball_y + BALL_RADIUS >= self.y && ball_y - BALL_RADIUS <= self.y + PADDLE_H
    }
}

/// 1 toward +y, -1 toward -y
fn direction(down: bool, up: bool) -> f32 {
    (down as i32 - up as i32) as f32
}

pub struct PongNeon {
    cfg: PongConfig,
    mode: PongMode,
    rng: SeededRng,
    latch: EndLatch,
    left: Paddle,
    right: Paddle,
    ball: Vec2,
    vel: Vec2,
    rally: u32,
    longest_rally: u32,
}

impl PongNeon {
    pub fn new(config: &RunConfig) -> Self {
        let cfg = PongConfig::for_difficulty(config.difficulty);
        let mut rng = SeededRng::new(config.seed);
        let side = if rng.next_f32() > 0.5 { 1.0 } else { -1.0 };
        let vy = rng.range(-120.0, 120.0);
        let start = HEIGHT * 0.5 - PADDLE_H * 0.5;
        Self {
            cfg,
            mode: PongMode::from_str(&config.mode),
            rng,
            latch: EndLatch::default(),
            left: Paddle { y: start, score: 0 },
            right: Paddle { y: start, score: 0 },
            ball: Vec2::new(WIDTH * 0.5, HEIGHT * 0.5),
            vel: Vec2::new(cfg.ball_speed * side, vy),
            rally: 0,
            longest_rally: 0,
        }
    }

    pub fn mode(&self) -> PongMode {
        self.mode
    }

    fn reset_ball(&mut self, toward_right: bool) {
        self.ball = Vec2::new(WIDTH * 0.5, HEIGHT * 0.5);
        self.vel.x = self.cfg.ball_speed * if toward_right { 1.0 } else { -1.0 };
        self.vel.y = self.rng.range(-140.0, 140.0);
        self.rally = 0;
    }

    /// Left paddle: W/S always; arrows and touch only when no one else owns them
    fn left_direction(&self, input: &InputManager) -> f32 {
        match self.mode {
            PongMode::Single => direction(
                input.is_key_down("s") || input.is_down(Action::Down),
                input.is_key_down("w") || input.is_down(Action::Up),
            ),
            PongMode::Duel => {
                let keys = direction(input.is_key_down("s"), input.is_key_down("w"));
                if keys != 0.0 {
                    keys
                } else {
                    direction(input.is_virtual_down(Action::Down), input.is_virtual_down(Action::Up))
                }
            }
        }
    }

    /// Right paddle in duel mode: arrows, or the two action buttons on touch
    fn right_direction(&self, input: &InputManager) -> f32 {
        let keys = direction(input.is_key_down("arrowdown"), input.is_key_down("arrowup"));
        if keys != 0.0 {
            keys
        } else {
            direction(input.is_virtual_down(Action::Action2), input.is_virtual_down(Action::Action))
        }
    }

    fn ai_direction(&self) -> f32 {
        let center = self.right.center();
        if self.ball.y > center + AI_DEADZONE {
            1.0
        } else if self.ball.y < center - AI_DEADZONE {
            -1.0
        } else {
            0.0
        }
    }

    /// Speed up, bend by hit offset, count the rally
    fn return_ball(&mut self, paddle: Paddle, dir: f32, frame: &mut Frame<'_>) {
        let offset = (self.ball.y - paddle.center()) / (PADDLE_H * 0.5);
        self.vel.x = dir * (self.vel.x.abs() * 1.04 + 8.0).min(MAX_BALL_SPEED);
        self.vel.y = clamp(self.vel.y + offset * 140.0, -MAX_BALL_VY, MAX_BALL_VY);
        self.rally += 1;
        self.longest_rally = self.longest_rally.max(self.rally);
        frame.audio.play(SoundEffect::Hit);
    }

    fn score_value(&self) -> u32 {
        self.left.score * 100 + self.longest_rally
    }
}

impl Simulation for PongNeon {
    fn id(&self) -> GameId {
        GameId::PongNeon
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        let left = self.left_direction(frame.input);
        self.left.drive(left, PLAYER_SPEED, dt);
        match self.mode {
            PongMode::Single => {
                let ai = self.ai_direction();
                self.right.drive(ai, self.cfg.ai_speed, dt);
            }
            PongMode::Duel => {
                let right = self.right_direction(frame.input);
                self.right.drive(right, PLAYER_SPEED, dt);
            }
        }

        self.ball += self.vel * dt;
        if self.ball.y - BALL_RADIUS <= 0.0 || self.ball.y + BALL_RADIUS >= HEIGHT {
            self.vel.y = -self.vel.y;
            self.ball.y = clamp(self.ball.y, BALL_RADIUS + 1.0, HEIGHT - BALL_RADIUS - 1.0);
            frame.audio.play(SoundEffect::Ui);
        }

        let left_face = PADDLE_INSET + PADDLE_W;
        let hit_left = self.ball.x - BALL_RADIUS <= left_face
            && self.ball.x + BALL_RADIUS >= PADDLE_INSET
            && self.left.spans(self.ball.y);
        if hit_left && self.vel.x < 0.0 {
            self.ball.x = left_face + BALL_RADIUS + 0.5;
            self.return_ball(self.left, 1.0, frame);
        }

        let right_face = WIDTH - PADDLE_INSET - PADDLE_W;
        let hit_right = self.ball.x + BALL_RADIUS >= right_face
            && self.ball.x - BALL_RADIUS <= WIDTH - PADDLE_INSET
            && self.right.spans(self.ball.y);
        if hit_right && self.vel.x > 0.0 {
            self.ball.x = right_face - BALL_RADIUS - 0.5;
            self.return_ball(self.right, -1.0, frame);
        }

        if self.ball.x < -20.0 {
            self.right.score += 1;
            frame.audio.play(SoundEffect::Explosion);
            self.reset_ball(true);
        } else if self.ball.x > WIDTH + 20.0 {
            self.left.score += 1;
            frame.audio.play(SoundEffect::Explosion);
            self.reset_ball(false);
        }

        if self.left.score >= WIN_SCORE || self.right.score >= WIN_SCORE {
            let result = RunResult::new(self.score_value(), self.left.score > self.right.score)
                .with_stat("run", self.longest_rally as f64);
            self.latch.end(result);
        }
    }

    fn draw(&self, painter: &mut dyn Painter, _time: f32) {
        painter.clear(colors::BACKGROUND);
        let mut y = 0.0;
        while y < HEIGHT {
            painter.line(
                Vec2::new(WIDTH * 0.5, y),
                Vec2::new(WIDTH * 0.5, (y + 10.0).min(HEIGHT)),
                fade(colors::CYAN, 0.2),
                2.0,
            );
            y += 22.0;
        }

        painter.set_glow(14.0, colors::CYAN);
        painter.fill_rect(PADDLE_INSET, self.left.y, PADDLE_W, PADDLE_H, colors::CYAN);
        painter.set_glow(14.0, colors::ORANGE);
        painter.fill_rect(WIDTH - PADDLE_INSET - PADDLE_W, self.right.y, PADDLE_W, PADDLE_H, colors::ORANGE);
        painter.set_glow(10.0, colors::TEXT);
        painter.fill_circle(self.ball, BALL_RADIUS, colors::TEXT);
        painter.set_glow(0.0, colors::BACKGROUND);

        painter.text(&self.left.score.to_string(), Vec2::new(WIDTH * 0.5 - 60.0, 64.0), 36.0, colors::TEXT, TextAlign::Center);
        painter.text(&self.right.score.to_string(), Vec2::new(WIDTH * 0.5 + 60.0, 64.0), 36.0, colors::TEXT, TextAlign::Center);
        painter.text(
            &format!("Rally {} (best {})", self.rally, self.longest_rally),
            Vec2::new(WIDTH * 0.5, 92.0),
            14.0,
            colors::DIM,
            TextAlign::Center,
        );
    }

    fn score(&self) -> u32 {
        self.score_value()
    }

    fn latch(&self) -> &EndLatch {
        &self.latch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::games::testing::Rig;

    fn game(difficulty: Difficulty, mode: &str) -> PongNeon {
        PongNeon::new(&RunConfig::new(GameId::PongNeon, difficulty, 8).with_mode(mode))
    }

    #[test]
    fn test_mode_from_config() {
        assert_eq!(game(Difficulty::Easy, "single").mode(), PongMode::Single);
        assert_eq!(game(Difficulty::Easy, "duel").mode(), PongMode::Duel);
        assert_eq!(PongMode::from_str("chaos"), PongMode::Single);
    }

    #[test]
    fn test_paddle_return_speeds_up_and_bends() {
        let mut g = game(Difficulty::Normal, "duel");
        let mut rig = Rig::new();
        g.ball = Vec2::new(PADDLE_INSET + PADDLE_W + BALL_RADIUS + 1.0, g.left.center() + 27.5);
        g.vel = Vec2::new(-300.0, 0.0);
        rig.tick(&mut g, 0.01);
        assert!((g.vel.x - (300.0 * 1.04 + 8.0)).abs() < 1e-3);
        assert!((g.vel.y - 70.0).abs() < 2.0, "half offset bends by ~70, got {}", g.vel.y);
        assert_eq!(g.rally, 1);
    }

    #[test]
    fn test_ball_speed_is_capped() {
        let mut g = game(Difficulty::Hard, "duel");
        let mut rig = Rig::new();
        g.ball = Vec2::new(WIDTH - PADDLE_INSET - PADDLE_W - BALL_RADIUS, g.right.center());
        g.vel = Vec2::new(630.0, 0.0);
        rig.tick(&mut g, 0.001);
        assert_eq!(g.vel.x, -MAX_BALL_SPEED);
    }

    #[test]
    fn test_miss_scores_and_resets() {
        let mut g = game(Difficulty::Easy, "single");
        let mut rig = Rig::new();
        g.rally = 4;
        g.ball = Vec2::new(WIDTH + 19.0, 200.0);
        g.vel = Vec2::new(300.0, 0.0);
        rig.tick(&mut g, 0.01);
        assert_eq!(g.left.score, 1);
        assert_eq!(g.ball, Vec2::new(WIDTH * 0.5, HEIGHT * 0.5));
        assert!(g.vel.x < 0.0, "serve goes to the side that scored");
        assert_eq!(g.rally, 0);
    }

    #[test]
    fn test_ai_tracks_ball() {
        let mut g = game(Difficulty::Normal, "single");
        let mut rig = Rig::new();
        g.ball = Vec2::new(WIDTH * 0.5, 60.0);
        g.vel = Vec2::ZERO;
        let before = g.right.y;
        rig.tick(&mut g, 0.1);
        assert!((before - g.right.y - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_duel_keys_drive_each_side() {
        let mut g = game(Difficulty::Easy, "duel");
        let mut rig = Rig::new();
        g.vel = Vec2::ZERO;
        let (l, r) = (g.left.y, g.right.y);
        rig.input.key_down("w");
        rig.input.key_down("ArrowDown");
        rig.tick(&mut g, 0.1);
        assert!(g.left.y < l);
        assert!(g.right.y > r);

        // Touch buttons drive the right paddle when its keys are idle
        rig.input.key_up("ArrowDown");
        rig.input.set_virtual(Action::Action, true);
        let r = g.right.y;
        rig.tick(&mut g, 0.1);
        assert!(g.right.y < r);
    }

    #[test]
    fn test_first_to_seven() {
        let mut g = game(Difficulty::Easy, "single");
        let mut rig = Rig::new();
        g.left.score = 6;
        g.longest_rally = 9;
        g.ball = Vec2::new(WIDTH + 19.0, 200.0);
        g.vel = Vec2::new(300.0, 0.0);
        rig.tick(&mut g, 0.01);
        let result = g.latch.result().expect("seven reached");
        assert!(result.won);
        assert_eq!(result.score, 709);
        assert_eq!(result.stat("run"), Some(9.0));
    }
}

//! Brick Breaker Blitz - paddle, ball, bricks, falling power-ups

use glam::Vec2;

use super::{axis, hud};
use crate::audio::SoundEffect;
use crate::clamp;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::Action;
use crate::renderer::{Color, Painter, colors, fade};
use crate::settings::{Difficulty, QualityPreset};
use crate::sim::{
    Burst, EndLatch, Frame, GameId, ParticleSystem, Rect, RunConfig, RunResult, SeededRng,
    Simulation, circle_hits_rect, whole_score,
};

const COLS: usize = 12;
const MAX_ROWS: u32 = 8;
const MARGIN_X: f32 = 42.0;
const TOP: f32 = 56.0;
const GAP: f32 = 6.0;
const BRICK_H: f32 = 22.0;

const PADDLE_Y: f32 = HEIGHT - 38.0;
const PADDLE_H: f32 = 14.0;
const PADDLE_W: f32 = 128.0;
const PADDLE_WIDE_W: f32 = 180.0;
const PADDLE_SPEED: f32 = 470.0;
const BALL_RADIUS: f32 = 7.0;
/// Horizontal speed at the paddle tips
const DEFLECT: f32 = 320.0;

const DROP_CHANCE: f32 = 0.12;
const POWER_FALL: f32 = 130.0;
const WIDE_SECS: f32 = 8.0;
const SLOW_SECS: f32 = 6.0;
const SLOW_FACTOR: f32 = 0.72;

const HIT_SCORE: f32 = 30.0;
const BREAK_SCORE: f32 = 55.0;
const LEVEL_SCORE: f32 = 300.0;

#[derive(Debug, Clone, Copy)]
pub struct BrickConfig {
    pub lives: u32,
    pub ball_speed: f32,
    /// Rows on level 1; each level adds one
    pub rows: u32,
    pub max_level: u32,
}

impl BrickConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                lives: 4,
                ball_speed: 230.0,
                rows: 4,
                max_level: 3,
            },
            Difficulty::Normal => Self {
                lives: 3,
                ball_speed: 260.0,
                rows: 5,
                max_level: 4,
            },
            Difficulty::Hard => Self {
                lives: 2,
                ball_speed: 300.0,
                rows: 6,
                max_level: 5,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    Wide,
    Multi,
    Slow,
}

impl PowerUpKind {
    const ALL: [PowerUpKind; 3] = [PowerUpKind::Wide, PowerUpKind::Multi, PowerUpKind::Slow];

    fn color(&self) -> Color {
        match self {
            PowerUpKind::Wide => colors::GREEN,
            PowerUpKind::Multi => colors::ORANGE,
            PowerUpKind::Slow => colors::BLUE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ball {
    pos: Vec2,
    vel: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Brick {
    rect: Rect,
    hp: u32,
    color: Color,
}

#[derive(Debug, Clone, Copy)]
struct PowerUp {
    pos: Vec2,
    kind: PowerUpKind,
}

pub struct BrickBreaker {
    cfg: BrickConfig,
    rng: SeededRng,
    particles: ParticleSystem,
    latch: EndLatch,
    paddle_x: f32,
    paddle_w: f32,
    wide_timer: f32,
    slow_timer: f32,
    balls: Vec<Ball>,
    bricks: Vec<Brick>,
    power_ups: Vec<PowerUp>,
    level: u32,
    lives: u32,
    score: f32,
}

impl BrickBreaker {
    pub fn new(config: &RunConfig) -> Self {
        let cfg = BrickConfig::for_difficulty(config.difficulty);
        let mut game = Self {
            cfg,
            rng: SeededRng::new(config.seed),
            particles: ParticleSystem::new(config.seed, config.settings.quality),
            latch: EndLatch::default(),
            paddle_x: WIDTH * 0.5,
            paddle_w: PADDLE_W,
            wide_timer: 0.0,
            slow_timer: 0.0,
            balls: Vec::new(),
            bricks: Vec::new(),
            power_ups: Vec::new(),
            level: 1,
            lives: cfg.lives,
            score: 0.0,
        };
        game.build_level();
        game.launch_ball();
        game
    }

    fn paddle_rect(&self) -> Rect {
        Rect::new(self.paddle_x - self.paddle_w * 0.5, PADDLE_Y, self.paddle_w, PADDLE_H)
    }

    fn launch_ball(&mut self) {
        let vx = self.rng.range(-180.0, 180.0);
        self.balls.push(Ball {
            pos: Vec2::new(self.paddle_x, PADDLE_Y - 16.0),
            vel: Vec2::new(vx, -self.cfg.ball_speed),
        });
    }

    fn build_level(&mut self) {
        self.bricks.clear();
        let rows = (self.cfg.rows + self.level - 1).min(MAX_ROWS);
        let brick_w = (WIDTH - MARGIN_X * 2.0 - GAP * (COLS as f32 - 1.0)) / COLS as f32;
        for r in 0..rows {
            for c in 0..COLS {
                self.bricks.push(Brick {
                    rect: Rect::new(
                        MARGIN_X + c as f32 * (brick_w + GAP),
                        TOP + r as f32 * (BRICK_H + GAP),
                        brick_w,
                        BRICK_H,
                    ),
                    hp: if r > 3 { 2 } else { 1 },
                    color: colors::BRICK_ROWS[r as usize % colors::BRICK_ROWS.len()],
                });
            }
        }
    }

    fn finish(&mut self, won: bool) {
        let result =
            RunResult::new(whole_score(self.score), won).with_stat("level", self.level as f64);
        if self.latch.end(result) {
            log::debug!("Brick breaker finished on level {}", self.level);
        }
    }

    fn move_balls(&mut self, dt: f32, frame: &mut Frame<'_>) {
        let speed_factor = if self.slow_timer > 0.0 { SLOW_FACTOR } else { 1.0 };
        let paddle = self.paddle_rect();

        for i in (0..self.balls.len()).rev() {
            let ball = &mut self.balls[i];
            ball.pos += ball.vel * dt * speed_factor;

            if ball.pos.x - BALL_RADIUS <= 0.0 || ball.pos.x + BALL_RADIUS >= WIDTH {
                ball.vel.x = -ball.vel.x;
                ball.pos.x = clamp(ball.pos.x, BALL_RADIUS + 1.0, WIDTH - BALL_RADIUS - 1.0);
            }
            if ball.pos.y - BALL_RADIUS <= 0.0 {
                ball.vel.y = ball.vel.y.abs();
            }
            if ball.pos.y - BALL_RADIUS > HEIGHT {
                self.balls.remove(i);
                continue;
            }

            if ball.vel.y > 0.0 && circle_hits_rect(ball.pos, BALL_RADIUS, &paddle) {
                let offset = (ball.pos.x - self.paddle_x) / (self.paddle_w * 0.5);
                ball.vel.x = offset * DEFLECT;
                ball.vel.y = -ball.vel.y.abs() - 16.0;
                frame.audio.play(SoundEffect::Ui);
            }

            let pos = ball.pos;
            // One brick per ball per frame
            let Some(j) = self
                .bricks
                .iter()
                .rposition(|b| circle_hits_rect(pos, BALL_RADIUS, &b.rect))
            else {
                continue;
            };
            self.balls[i].vel.y = -self.balls[i].vel.y;
            self.score += HIT_SCORE;
            let brick = &mut self.bricks[j];
            brick.hp = brick.hp.saturating_sub(1);
            if brick.hp == 0 {
                let brick = self.bricks.remove(j);
                self.score += BREAK_SCORE;
                let center = brick.rect.center();
                self.particles.burst(
                    Burst::new(center, brick.color, 14)
                        .speed(70.0, 220.0)
                        .life(0.45)
                        .size(2.4),
                );
                if self.rng.chance(DROP_CHANCE) {
                    let kind = PowerUpKind::ALL[self.rng.index(PowerUpKind::ALL.len())];
                    self.power_ups.push(PowerUp { pos: center, kind });
                }
            }
            frame.audio.play(SoundEffect::Hit);
        }
    }

    fn collect_power_ups(&mut self, dt: f32, frame: &mut Frame<'_>) {
        for i in (0..self.power_ups.len()).rev() {
            self.power_ups[i].pos.y += POWER_FALL * dt;
            let item = self.power_ups[i];
            if item.pos.y > HEIGHT + 20.0 {
                self.power_ups.remove(i);
                continue;
            }

            let half = self.paddle_w * 0.5;
            let caught = (self.paddle_x - half..=self.paddle_x + half).contains(&item.pos.x)
                && (PADDLE_Y - 8.0..=PADDLE_Y + PADDLE_H + 8.0).contains(&item.pos.y);
            if !caught {
                continue;
            }

            self.power_ups.remove(i);
            frame.audio.play(SoundEffect::Power);
            match item.kind {
                PowerUpKind::Wide => self.wide_timer = WIDE_SECS,
                PowerUpKind::Multi => {
                    let clones: Vec<Ball> = self
                        .balls
                        .iter()
                        .take(2)
                        .map(|b| Ball {
                            pos: b.pos,
                            vel: Vec2::new(-b.vel.x, b.vel.y),
                        })
                        .collect();
                    self.balls.extend(clones);
                }
                PowerUpKind::Slow => self.slow_timer = SLOW_SECS,
            }
        }
    }
}

impl Simulation for BrickBreaker {
    fn id(&self) -> GameId {
        GameId::BrickBreakerBlitz
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        self.wide_timer = (self.wide_timer - dt).max(0.0);
        self.slow_timer = (self.slow_timer - dt).max(0.0);
        self.paddle_w = if self.wide_timer > 0.0 { PADDLE_WIDE_W } else { PADDLE_W };

        let half = self.paddle_w * 0.5;
        let mv = axis(frame.input, Action::Left, Action::Right);
        self.paddle_x = clamp(self.paddle_x + mv * PADDLE_SPEED * dt, half, WIDTH - half);

        self.move_balls(dt, frame);
        self.collect_power_ups(dt, frame);

        if self.balls.is_empty() {
            self.lives = self.lives.saturating_sub(1);
            frame.audio.play(SoundEffect::Explosion);
            if self.lives == 0 {
                self.finish(false);
                return;
            }
            self.launch_ball();
        }

        if self.bricks.is_empty() {
            self.level += 1;
            self.score += LEVEL_SCORE;
            frame.audio.play(SoundEffect::Power);
            if self.level > self.cfg.max_level {
                self.finish(true);
                return;
            }
            self.build_level();
            self.launch_ball();
        }

        self.particles.update(dt);
    }

    fn draw(&self, painter: &mut dyn Painter, _time: f32) {
        painter.clear(colors::BACKGROUND);
        let mut y = 0.0;
        while y < HEIGHT {
            painter.line(Vec2::new(0.0, y), Vec2::new(WIDTH, y), fade(colors::CYAN, 0.12), 1.0);
            y += 28.0;
        }

        for brick in &self.bricks {
            let alpha = if brick.hp >= 2 { 0.7 } else { 1.0 };
            painter.fill(&brick.rect, fade(brick.color, alpha));
        }

        painter.set_glow(10.0, colors::TEXT);
        for ball in &self.balls {
            painter.fill_circle(ball.pos, BALL_RADIUS, colors::TEXT);
        }
        painter.set_glow(14.0, colors::CYAN);
        painter.fill(&self.paddle_rect(), colors::CYAN);
        for item in &self.power_ups {
            painter.set_glow(10.0, item.kind.color());
            painter.fill_circle(item.pos, 8.0, item.kind.color());
        }
        painter.set_glow(0.0, colors::BACKGROUND);

        self.particles.draw(painter);
        hud(
            painter,
            &[
                ("SCORE", self.score().to_string()),
                ("LIVES", self.lives.to_string()),
                ("LEVEL", self.level.to_string()),
            ],
        );
    }

    fn score(&self) -> u32 {
        whole_score(self.score)
    }

    fn latch(&self) -> &EndLatch {
        &self.latch
    }

    fn set_quality(&mut self, quality: QualityPreset) {
        self.particles.set_quality(quality);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::games::testing::Rig;

    fn game(difficulty: Difficulty) -> BrickBreaker {
        BrickBreaker::new(&RunConfig::new(GameId::BrickBreakerBlitz, difficulty, 11))
    }

    #[test]
    fn test_level_layout() {
        let g = game(Difficulty::Easy);
        assert_eq!(g.bricks.len(), 4 * COLS);
        assert!(g.bricks.iter().all(|b| b.hp == 1));
        let hard = game(Difficulty::Hard);
        assert_eq!(hard.bricks.len(), 6 * COLS);
        assert_eq!(hard.bricks.iter().filter(|b| b.hp == 2).count(), 2 * COLS);
        let last = hard.bricks.last().map(|b| b.rect.right()).unwrap_or_default();
        assert!((last - (WIDTH - MARGIN_X)).abs() < 0.01);
    }

    #[test]
    fn test_paddle_deflection_follows_offset() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        g.bricks.truncate(1);
        g.bricks[0].rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        g.balls = vec![Ball {
            pos: Vec2::new(g.paddle_x + 32.0, PADDLE_Y - 4.0),
            vel: Vec2::new(0.0, 100.0),
        }];
        rig.tick(&mut g, 0.01);
        let ball = g.balls[0];
        assert!((ball.vel.x - 0.5 * DEFLECT).abs() < 1.0);
        assert!(ball.vel.y < -100.0);
    }

    #[test]
    fn test_two_hit_brick() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        g.bricks = vec![
            Brick {
                rect: Rect::new(400.0, 200.0, 60.0, 22.0),
                hp: 2,
                color: colors::PINK,
            },
            Brick {
                rect: Rect::new(0.0, 0.0, 1.0, 1.0),
                hp: 1,
                color: colors::PINK,
            },
        ];
        g.balls = vec![Ball {
            pos: Vec2::new(430.0, 226.0),
            vel: Vec2::new(0.0, -50.0),
        }];
        rig.tick(&mut g, 0.01);
        assert_eq!(g.bricks[0].hp, 1);
        assert_eq!(g.score(), 30);
        assert!(g.balls[0].vel.y > 0.0);

        g.balls[0].vel.y = -50.0;
        rig.tick(&mut g, 0.01);
        assert_eq!(g.bricks.len(), 1);
        assert_eq!(g.score(), 30 + 30 + 55);
    }

    #[test]
    fn test_power_ups() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        let at_paddle = Vec2::new(g.paddle_x, PADDLE_Y);
        g.power_ups.push(PowerUp { pos: at_paddle, kind: PowerUpKind::Wide });
        g.power_ups.push(PowerUp { pos: at_paddle, kind: PowerUpKind::Slow });
        g.power_ups.push(PowerUp { pos: at_paddle, kind: PowerUpKind::Multi });
        rig.tick(&mut g, 0.0);
        assert_eq!(g.wide_timer, WIDE_SECS);
        assert_eq!(g.slow_timer, SLOW_SECS);
        assert_eq!(g.balls.len(), 2);
        assert!(g.power_ups.is_empty());

        rig.tick(&mut g, 0.01);
        assert_eq!(g.paddle_w, PADDLE_WIDE_W);
    }

    #[test]
    fn test_losing_last_ball_costs_a_life() {
        let mut g = game(Difficulty::Hard);
        let mut rig = Rig::new();
        g.balls[0].pos.y = HEIGHT + 20.0;
        rig.tick(&mut g, 0.0);
        assert_eq!(g.lives, 1);
        assert_eq!(g.balls.len(), 1);

        g.balls[0].pos.y = HEIGHT + 20.0;
        rig.tick(&mut g, 0.0);
        let result = g.latch.result().expect("no lives left");
        assert!(!result.won);
        assert_eq!(result.stat("level"), Some(1.0));
    }

    #[test]
    fn test_clearing_final_level_wins() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        g.level = g.cfg.max_level;
        g.bricks.clear();
        rig.tick(&mut g, 0.0);
        let result = g.latch.result().expect("last level cleared");
        assert!(result.won);
        assert_eq!(result.score, 300);
    }

    #[test]
    fn test_level_advance_adds_a_row() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        g.bricks.clear();
        rig.tick(&mut g, 0.0);
        assert_eq!(g.level, 2);
        assert_eq!(g.bricks.len(), 5 * COLS);
        assert_eq!(g.balls.len(), 2);
    }
}

//! Neon Dodger - survive a ramping rain of falling blocks

use glam::Vec2;

use super::{axis, backdrop, hud, shake_offset};
use crate::audio::SoundEffect;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::Action;
use crate::renderer::{Painter, colors};
use crate::settings::{Difficulty, QualityPreset};
use crate::sim::{
    Burst, EndLatch, Frame, GameId, ParticleSystem, Rect, RunConfig, RunResult, SeededRng,
    Simulation, circle_hits_circle, circle_hits_rect, whole_score,
};

const PLAYER_RADIUS: f32 = 14.0;
/// Keep-out margin from the playfield edge
const EDGE: f32 = 10.0;
const PICKUP_EVERY: f32 = 2.6;
const PICKUP_RADIUS: f32 = 8.0;
const PASS_SCORE: f32 = 15.0;
const PICKUP_SCORE: f32 = 120.0;
const SCORE_PER_SEC: f32 = 40.0;

#[derive(Debug, Clone, Copy)]
pub struct DodgerConfig {
    pub player_speed: f32,
    /// Seconds between obstacle spawns
    pub spawn_every: f32,
    /// Base fall speed
    pub speed: f32,
    /// Fall speed gained per second survived
    pub ramp: f32,
}

impl DodgerConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                player_speed: 320.0,
                spawn_every: 1.1,
                speed: 120.0,
                ramp: 16.0,
            },
            Difficulty::Normal => Self {
                player_speed: 350.0,
                spawn_every: 0.9,
                speed: 150.0,
                ramp: 22.0,
            },
            Difficulty::Hard => Self {
                player_speed: 380.0,
                spawn_every: 0.72,
                speed: 180.0,
                ramp: 30.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Obstacle {
    rect: Rect,
    speed: f32,
}

#[derive(Debug, Clone, Copy)]
struct Pickup {
    pos: Vec2,
    speed: f32,
}

pub struct NeonDodger {
    cfg: DodgerConfig,
    shake_enabled: bool,
    rng: SeededRng,
    particles: ParticleSystem,
    latch: EndLatch,
    player: Vec2,
    obstacles: Vec<Obstacle>,
    pickups: Vec<Pickup>,
    obstacle_timer: f32,
    pickup_timer: f32,
    elapsed: f32,
    score: f32,
    shake: f32,
}

impl NeonDodger {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            cfg: DodgerConfig::for_difficulty(config.difficulty),
            shake_enabled: config.settings.screen_shake(),
            rng: SeededRng::new(config.seed),
            particles: ParticleSystem::new(config.seed, config.settings.quality),
            latch: EndLatch::default(),
            player: Vec2::new(WIDTH * 0.5, HEIGHT * 0.84),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            obstacle_timer: 0.0,
            pickup_timer: 0.0,
            elapsed: 0.0,
            score: 0.0,
            shake: 0.0,
        }
    }

    /// Current fall speed before per-obstacle variance
    pub fn level_speed(&self) -> f32 {
        self.cfg.speed + self.elapsed * self.cfg.ramp
    }

    fn spawn_obstacle(&mut self) {
        let w = self.rng.range(24.0, 78.0);
        let h = self.rng.range(18.0, 90.0);
        let x = self.rng.range(EDGE, WIDTH - w - EDGE);
        let speed = self.level_speed() * self.rng.range(0.8, 1.35);
        self.obstacles.push(Obstacle {
            rect: Rect::new(x, -h, w, h),
            speed,
        });
    }

    fn spawn_pickup(&mut self) {
        let x = self.rng.range(28.0, WIDTH - 28.0);
        self.pickups.push(Pickup {
            pos: Vec2::new(x, -15.0),
            speed: self.level_speed() * 0.7,
        });
    }

    fn crash(&mut self, frame: &mut Frame<'_>) {
        self.shake = 10.0;
        self.particles.burst(
            Burst::new(self.player, colors::PINK, 28)
                .speed(110.0, 380.0)
                .life(0.6)
                .size(3.0),
        );
        let result = RunResult::new(whole_score(self.score), false)
            .with_stat("time", self.elapsed as f64);
        if self.latch.end(result) {
            frame.audio.play(SoundEffect::Explosion);
        }
    }
}

impl Simulation for NeonDodger {
    fn id(&self) -> GameId {
        GameId::NeonDodger
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        let move_x = axis(frame.input, Action::Left, Action::Right);
        let move_y = axis(frame.input, Action::Up, Action::Down);
        let lo = PLAYER_RADIUS + EDGE;
        self.player.x = crate::clamp(self.player.x + move_x * self.cfg.player_speed * dt, lo, WIDTH - lo);
        self.player.y = crate::clamp(self.player.y + move_y * self.cfg.player_speed * dt, lo, HEIGHT - lo);

        self.elapsed += dt;
        self.obstacle_timer += dt;
        self.pickup_timer += dt;

        if self.obstacle_timer >= self.cfg.spawn_every {
            self.obstacle_timer = 0.0;
            self.spawn_obstacle();
        }
        if self.pickup_timer >= PICKUP_EVERY {
            self.pickup_timer = 0.0;
            self.spawn_pickup();
        }

        for i in (0..self.obstacles.len()).rev() {
            let ob = &mut self.obstacles[i];
            ob.rect.y += ob.speed * dt;
            if circle_hits_rect(self.player, PLAYER_RADIUS, &ob.rect) {
                self.crash(frame);
                return;
            }
            if ob.rect.y > HEIGHT + ob.rect.h {
                self.obstacles.remove(i);
                self.score += PASS_SCORE;
            }
        }

        for i in (0..self.pickups.len()).rev() {
            let pickup = &mut self.pickups[i];
            pickup.pos.y += pickup.speed * dt;
            let pos = pickup.pos;
            if circle_hits_circle(self.player, PLAYER_RADIUS, pos, PICKUP_RADIUS) {
                self.pickups.remove(i);
                self.score += PICKUP_SCORE;
                frame.audio.play(SoundEffect::Power);
                self.particles.burst(
                    Burst::new(pos, colors::GOLD, 16)
                        .speed(80.0, 260.0)
                        .life(0.48)
                        .size(3.0),
                );
            } else if pos.y > HEIGHT + 20.0 {
                self.pickups.remove(i);
            }
        }

        self.score += dt * SCORE_PER_SEC;
        self.shake = (self.shake - dt * 20.0).max(0.0);
        self.particles.update(dt);
    }

    fn draw(&self, painter: &mut dyn Painter, time: f32) {
        backdrop(painter, time);
        if self.shake_enabled {
            painter.set_offset(shake_offset(self.shake, time));
        }

        painter.set_glow(12.0, colors::PINK);
        for ob in &self.obstacles {
            painter.fill(&ob.rect, colors::PINK);
        }
        painter.set_glow(10.0, colors::GOLD);
        for pickup in &self.pickups {
            painter.fill_circle(pickup.pos, PICKUP_RADIUS, colors::GOLD);
        }
        if !self.latch.is_ended() {
            painter.set_glow(16.0, colors::CYAN);
            painter.fill_circle(self.player, PLAYER_RADIUS, colors::CYAN);
        }
        painter.set_glow(0.0, colors::BACKGROUND);
        self.particles.draw(painter);

        painter.set_offset(Vec2::ZERO);
        hud(
            painter,
            &[
                ("SCORE", self.score().to_string()),
                ("TIME", format!("{:.1}", self.elapsed)),
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

//! Asteroids Pulse - vector ship, splitting rocks, wrap-around field

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use super::{axis, hud};
use crate::audio::SoundEffect;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::Action;
use crate::renderer::{Painter, colors};
use crate::settings::{Difficulty, QualityPreset};
use crate::sim::{
    Burst, EndLatch, Frame, GameId, ParticleSystem, RunConfig, RunResult, SeededRng, Simulation,
    circle_hits_circle, whole_score,
};
use crate::{clamp, wrap};

const ROTATE_SPEED: f32 = 4.2;
const THRUST: f32 = 210.0;
const BRAKE: f32 = 0.96;
const DRAG: f32 = 0.992;
const MAX_VEL: f32 = 280.0;
const SHIP_RADIUS: f32 = 12.0;
const RESPAWN_GRACE: f32 = 2.0;

const FIRE_COOLDOWN: f32 = 0.19;
const BULLET_SPEED: f32 = 420.0;
const BULLET_LIFE: f32 = 1.2;
const BULLET_RADIUS: f32 = 2.0;
const WAVE_BONUS: f32 = 500.0;

#[derive(Debug, Clone, Copy)]
pub struct AsteroidsConfig {
    /// Large rocks per wave
    pub asteroids: u32,
    pub speed: f32,
    pub lives: u32,
}

impl AsteroidsConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                asteroids: 5,
                speed: 55.0,
                lives: 3,
            },
            Difficulty::Normal => Self {
                asteroids: 7,
                speed: 74.0,
                lives: 3,
            },
            Difficulty::Hard => Self {
                asteroids: 9,
                speed: 92.0,
                lives: 2,
            },
        }
    }
}

/// Rock generation, 3 = large
fn rock_radius(size: u8) -> f32 {
    match size {
        3 => 34.0,
        2 => 24.0,
        _ => 14.0,
    }
}

fn rock_score(size: u8) -> f32 {
    match size {
        3 => 120.0,
        2 => 180.0,
        _ => 260.0,
    }
}

#[derive(Debug, Clone, Copy)]
struct Ship {
    pos: Vec2,
    vel: Vec2,
    angle: f32,
    invulnerable: f32,
    lives: u32,
}

impl Ship {
    fn heading(&self) -> Vec2 {
        Vec2::new(self.angle.cos(), self.angle.sin())
    }

    fn respawn(&mut self) {
        self.pos = Vec2::new(WIDTH * 0.5, HEIGHT * 0.5);
        self.vel = Vec2::ZERO;
        self.invulnerable = RESPAWN_GRACE;
    }
}

#[derive(Debug, Clone, Copy)]
struct Bullet {
    pos: Vec2,
    vel: Vec2,
    life: f32,
}

#[derive(Debug, Clone, Copy)]
struct Rock {
    pos: Vec2,
    vel: Vec2,
    size: u8,
    radius: f32,
}

pub struct AsteroidsPulse {
    cfg: AsteroidsConfig,
    rng: SeededRng,
    particles: ParticleSystem,
    latch: EndLatch,
    ship: Ship,
    bullets: Vec<Bullet>,
    rocks: Vec<Rock>,
    cooldown: f32,
    waves: u32,
    score: f32,
}

impl AsteroidsPulse {
    pub fn new(config: &RunConfig) -> Self {
        let cfg = AsteroidsConfig::for_difficulty(config.difficulty);
        let mut game = Self {
            cfg,
            rng: SeededRng::new(config.seed),
            particles: ParticleSystem::new(config.seed, config.settings.quality),
            latch: EndLatch::default(),
            ship: Ship {
                pos: Vec2::new(WIDTH * 0.5, HEIGHT * 0.5),
                vel: Vec2::ZERO,
                angle: -FRAC_PI_2,
                invulnerable: RESPAWN_GRACE,
                lives: cfg.lives,
            },
            bullets: Vec::new(),
            rocks: Vec::new(),
            cooldown: 0.0,
            waves: 0,
            score: 0.0,
        };
        game.spawn_wave();
        game
    }

    fn spawn_wave(&mut self) {
        for _ in 0..self.cfg.asteroids {
            self.spawn_rock(3, None);
        }
    }

    /// Random heading; random position unless `at` is given
    fn spawn_rock(&mut self, size: u8, at: Option<Vec2>) {
        let boost = if size == 1 { 1.5 } else { 1.0 };
        let speed = self.cfg.speed * self.rng.range(0.9, 1.35) * boost;
        let angle = self.rng.angle();
        let pos = match at {
            Some(p) => p,
            None => {
                let x = self.rng.range(0.0, WIDTH);
                let y = self.rng.range(0.0, HEIGHT);
                Vec2::new(x, y)
            }
        };
        self.rocks.push(Rock {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            size,
            radius: rock_radius(size),
        });
    }

    fn steer(&mut self, dt: f32, frame: &mut Frame<'_>) {
        let ship = &mut self.ship;
        ship.angle += axis(frame.input, Action::Left, Action::Right) * ROTATE_SPEED * dt;
        if frame.input.is_down(Action::Up) {
            ship.vel += ship.heading() * THRUST * dt;
        }
        if frame.input.is_down(Action::Down) {
            ship.vel *= BRAKE;
        }
        ship.vel.x = clamp(ship.vel.x, -MAX_VEL, MAX_VEL);
        ship.vel.y = clamp(ship.vel.y, -MAX_VEL, MAX_VEL);
        ship.pos.x = wrap(ship.pos.x + ship.vel.x * dt, WIDTH);
        ship.pos.y = wrap(ship.pos.y + ship.vel.y * dt, HEIGHT);
        ship.vel *= DRAG;
    }

    fn fire(&mut self, frame: &mut Frame<'_>) {
        let trigger = frame.input.is_down(Action::Action) || frame.input.consume_press(Action::Action);
        if !trigger || self.cooldown > 0.0 {
            return;
        }
        self.cooldown = FIRE_COOLDOWN;
        let dir = self.ship.heading();
        self.bullets.push(Bullet {
            pos: self.ship.pos + dir * 14.0,
            vel: dir * BULLET_SPEED + self.ship.vel,
            life: BULLET_LIFE,
        });
        frame.audio.play(SoundEffect::Ui);
    }

    fn resolve_hits(&mut self, dt: f32, frame: &mut Frame<'_>) {
        for i in (0..self.rocks.len()).rev() {
            let rock = &mut self.rocks[i];
            rock.pos.x = wrap(rock.pos.x + rock.vel.x * dt, WIDTH);
            rock.pos.y = wrap(rock.pos.y + rock.vel.y * dt, HEIGHT);
            let rock = *rock;

            let Some(j) = self
                .bullets
                .iter()
                .rposition(|b| circle_hits_circle(rock.pos, rock.radius, b.pos, BULLET_RADIUS))
            else {
                continue;
            };
            self.bullets.remove(j);
            self.rocks.remove(i);
            if rock.size > 1 {
                for _ in 0..2 {
                    self.spawn_rock(rock.size - 1, Some(rock.pos));
                }
            }
            self.score += rock_score(rock.size);
            frame.audio.play(SoundEffect::Hit);
            self.particles.burst(
                Burst::new(rock.pos, colors::CYAN, 22)
                    .speed(80.0, 260.0)
                    .life(0.5)
                    .size(2.5),
            );
        }
    }

    /// Returns true if the run ended
    fn check_ship(&mut self, frame: &mut Frame<'_>) -> bool {
        if self.ship.invulnerable > 0.0 {
            return false;
        }
        let ship = self.ship.pos;
        if !self
            .rocks
            .iter()
            .any(|r| circle_hits_circle(r.pos, r.radius, ship, SHIP_RADIUS))
        {
            return false;
        }
        self.ship.lives = self.ship.lives.saturating_sub(1);
        frame.audio.play(SoundEffect::Explosion);
        self.particles.burst(
            Burst::new(ship, colors::RED, 30)
                .speed(110.0, 320.0)
                .life(0.7)
                .size(3.0),
        );
        if self.ship.lives == 0 {
            let result = RunResult::new(whole_score(self.score), false)
                .with_stat("waves", self.waves as f64);
            self.latch.end(result);
            return true;
        }
        self.ship.respawn();
        false
    }
}

impl Simulation for AsteroidsPulse {
    fn id(&self) -> GameId {
        GameId::AsteroidsPulse
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.ship.invulnerable = (self.ship.invulnerable - dt).max(0.0);

        self.steer(dt, frame);
        self.fire(frame);

        self.bullets.retain_mut(|b| {
            b.life -= dt;
            if b.life <= 0.0 {
                return false;
            }
            b.pos.x = wrap(b.pos.x + b.vel.x * dt, WIDTH);
            b.pos.y = wrap(b.pos.y + b.vel.y * dt, HEIGHT);
            true
        });

        self.resolve_hits(dt, frame);
        if self.check_ship(frame) {
            return;
        }

        if self.rocks.is_empty() {
            self.waves += 1;
            self.spawn_wave();
            self.score += WAVE_BONUS;
        }
        self.particles.update(dt);
    }

    fn draw(&self, painter: &mut dyn Painter, _time: f32) {
        painter.clear(colors::BACKGROUND);
        for i in 0..80 {
            let x = (i as f32 * 137.21) % WIDTH;
            let y = (i as f32 * 89.7) % HEIGHT;
            painter.fill_rect(x, y, 1.0, 1.0, [1.0, 1.0, 1.0, 0.3]);
        }

        painter.set_glow(12.0, colors::PINK);
        for rock in &self.rocks {
            let outline: Vec<Vec2> = (0..8)
                .map(|i| {
                    let angle = TAU * i as f32 / 8.0;
                    let wobble = 1.0 + (i as f32 * 1.8 + rock.pos.x * 0.01).sin() * 0.16;
                    rock.pos + Vec2::new(angle.cos(), angle.sin()) * rock.radius * wobble
                })
                .collect();
            painter.polygon(&outline, colors::PINK, 2.0);
        }

        painter.set_glow(10.0, colors::CYAN);
        for b in &self.bullets {
            painter.fill_circle(b.pos, 2.2, colors::TEXT);
        }

        if !self.latch.is_ended() {
            let color = if self.ship.invulnerable > 0.0 { colors::GOLD } else { colors::CYAN };
            let (sin, cos) = (self.ship.angle + FRAC_PI_2).sin_cos();
            let hull: Vec<Vec2> = [(0.0, -14.0), (-10.0, 10.0), (0.0, 6.0), (10.0, 10.0)]
                .iter()
                .map(|&(x, y)| self.ship.pos + Vec2::new(x * cos - y * sin, x * sin + y * cos))
                .collect();
            painter.set_glow(14.0, color);
            painter.polygon(&hull, color, 2.0);
        }

        painter.set_glow(0.0, colors::BACKGROUND);
        self.particles.draw(painter);
        hud(
            painter,
            &[
                ("SCORE", self.score().to_string()),
                ("LIVES", self.ship.lives.to_string()),
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

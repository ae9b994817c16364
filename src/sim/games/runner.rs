//! Precision Runner - auto-scrolling jumper, one hit ends the run

use glam::Vec2;

use super::hud;
use crate::audio::SoundEffect;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::{Action, InputEvent};
use crate::renderer::{Painter, colors, fade};
use crate::settings::{Difficulty, QualityPreset};
use crate::sim::{
    Burst, EndLatch, Frame, GameId, ParticleSystem, Rect, RunConfig, RunResult, SeededRng,
    Simulation, circle_hits_rect, whole_score,
};

const GROUND_Y: f32 = 430.0;
const GRAVITY: f32 = 1300.0;
const PLAYER_X: f32 = 160.0;
const PLAYER_W: f32 = 34.0;
const PLAYER_H: f32 = 44.0;
/// Scroll speed gained per unit of distance
const SPEED_RAMP: f32 = 0.04;

#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub speed: f32,
    /// Initial upward velocity of a jump
    pub jump: f32,
    pub spawn_every: f32,
}

impl RunnerConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                speed: 250.0,
                jump: 490.0,
                spawn_every: 1.2,
            },
            Difficulty::Normal => Self {
                speed: 290.0,
                jump: 520.0,
                spawn_every: 0.98,
            },
            Difficulty::Hard => Self {
                speed: 330.0,
                jump: 560.0,
                spawn_every: 0.84,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Obstacle {
    x: f32,
    w: f32,
    h: f32,
    passed: bool,
}

impl Obstacle {
    fn rect(&self) -> Rect {
        Rect::new(self.x, GROUND_Y - self.h, self.w, self.h)
    }
}

pub struct PrecisionRunner {
    cfg: RunnerConfig,
    rng: SeededRng,
    particles: ParticleSystem,
    latch: EndLatch,
    /// Top of the player box
    player_y: f32,
    vy: f32,
    grounded: bool,
    obstacles: Vec<Obstacle>,
    spawn_timer: f32,
    distance: f32,
    streak: u32,
    best_streak: u32,
    score: f32,
}

impl PrecisionRunner {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            cfg: RunnerConfig::for_difficulty(config.difficulty),
            rng: SeededRng::new(config.seed),
            particles: ParticleSystem::new(config.seed, config.settings.quality),
            latch: EndLatch::default(),
            player_y: GROUND_Y - PLAYER_H,
            vy: 0.0,
            grounded: true,
            obstacles: Vec::new(),
            spawn_timer: 0.0,
            distance: 0.0,
            streak: 0,
            best_streak: 0,
            score: 0.0,
        }
    }

    pub fn scroll_speed(&self) -> f32 {
        self.cfg.speed + self.distance * SPEED_RAMP
    }

    fn hitbox_center(&self) -> Vec2 {
        Vec2::new(PLAYER_X + PLAYER_W * 0.5, self.player_y + PLAYER_H * 0.5)
    }

    fn jump(&mut self, frame: &mut Frame<'_>) {
        if !self.grounded {
            return;
        }
        self.vy = -self.cfg.jump;
        self.grounded = false;
        frame.audio.play(SoundEffect::Ui);
    }

    fn crash(&mut self, frame: &mut Frame<'_>) {
        let result = RunResult::new(whole_score(self.score), false)
            .with_stat("run", self.best_streak as f64);
        if self.latch.end(result) {
            frame.audio.play(SoundEffect::Explosion);
            self.particles.burst(
                Burst::new(self.hitbox_center(), colors::PINK, 24)
                    .speed(90.0, 300.0)
                    .life(0.6)
                    .size(3.0),
            );
        }
    }
}

impl Simulation for PrecisionRunner {
    fn id(&self) -> GameId {
        GameId::PrecisionRunner
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        let tapped = frame.events.iter().any(|e| matches!(e, InputEvent::PointerDown(_)));
        let pressed = frame.input.consume_press(Action::Action) | frame.input.consume_press(Action::Up);
        if tapped || pressed {
            self.jump(frame);
        }

        self.spawn_timer += dt;
        let speed = self.scroll_speed();
        if self.spawn_timer >= self.cfg.spawn_every {
            self.spawn_timer = 0.0;
            let w = self.rng.range(28.0, 58.0);
            let h = self.rng.range(34.0, 82.0);
            self.obstacles.push(Obstacle {
                x: WIDTH + 20.0,
                w,
                h,
                passed: false,
            });
        }

        self.vy += GRAVITY * dt;
        self.player_y += self.vy * dt;
        if self.player_y >= GROUND_Y - PLAYER_H {
            self.player_y = GROUND_Y - PLAYER_H;
            self.vy = 0.0;
            self.grounded = true;
        }

        let center = self.hitbox_center();
        for i in (0..self.obstacles.len()).rev() {
            let ob = &mut self.obstacles[i];
            ob.x -= speed * dt;

            if !ob.passed && ob.x + ob.w < PLAYER_X {
                ob.passed = true;
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
                self.score += 25.0 + self.streak as f32 * 3.0;
                self.particles.burst(
                    Burst::new(Vec2::new(PLAYER_X + PLAYER_W * 0.5, self.player_y + PLAYER_H), colors::CYAN, 8)
                        .speed(60.0, 130.0)
                        .life(0.25)
                        .size(2.0),
                );
            }

            let ob = self.obstacles[i];
            if circle_hits_rect(center, PLAYER_W * 0.45, &ob.rect()) {
                self.crash(frame);
                return;
            }
            if ob.x + ob.w < -20.0 {
                self.obstacles.remove(i);
            }
        }

        self.distance += speed * dt * 0.08;
        self.score += dt * 10.0;
        self.particles.update(dt);
    }

    fn draw(&self, painter: &mut dyn Painter, _time: f32) {
        painter.clear(colors::BACKGROUND);
        for i in 0..20 {
            let x = (i as f32 * 80.0 - self.distance * 2.0).rem_euclid(WIDTH);
            painter.fill_rect(x, 40.0, 42.0, 4.0, fade(colors::CYAN, 0.07));
        }
        painter.fill_rect(0.0, GROUND_Y, WIDTH, HEIGHT - GROUND_Y, fade(colors::BLUE, 0.18));
        painter.line(Vec2::new(0.0, GROUND_Y), Vec2::new(WIDTH, GROUND_Y), colors::CYAN, 2.0);

        painter.set_glow(12.0, colors::PINK);
        for ob in &self.obstacles {
            painter.fill(&ob.rect(), colors::PINK);
        }
        if !self.latch.is_ended() {
            painter.set_glow(14.0, colors::CYAN);
            painter.fill_rect(PLAYER_X, self.player_y, PLAYER_W, PLAYER_H, colors::CYAN);
        }
        painter.set_glow(0.0, colors::BACKGROUND);
        self.particles.draw(painter);

        hud(
            painter,
            &[
                ("SCORE", self.score().to_string()),
                ("STREAK", self.streak.to_string()),
                ("BEST", self.best_streak.to_string()),
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

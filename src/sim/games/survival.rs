//! Void Survival - auto-firing arena survivor with XP upgrades

use glam::Vec2;

use super::{axis, hud};
use crate::audio::SoundEffect;
use crate::clamp;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::Action;
use crate::renderer::{Painter, colors, fade};
use crate::settings::{Difficulty, QualityPreset};
use crate::sim::{
    Burst, EndLatch, Frame, GameId, ParticleSystem, RunConfig, RunResult, SeededRng, Simulation,
    circle_hits_circle, dist, whole_score,
};

const PLAYER_RADIUS: f32 = 14.0;
const BULLET_RADIUS: f32 = 3.0;
const BULLET_SPEED: f32 = 340.0;
const BULLET_LIFE: f32 = 1.3;
/// Contact damage per second
const CONTACT_DPS: f32 = 20.0;
const ORB_VALUE: u32 = 22;
const ORB_PULL_RANGE: f32 = 110.0;
const ORB_PULL_SPEED: f32 = 180.0;
const FIRST_UPGRADE_XP: u32 = 120;
const UPGRADE_XP_STEP: u32 = 70;

#[derive(Debug, Clone, Copy)]
pub struct SurvivalConfig {
    pub enemy_speed: f32,
    /// Seconds between enemy spawns
    pub spawn_every: f32,
    pub enemy_hp: f32,
}

impl SurvivalConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                enemy_speed: 55.0,
                spawn_every: 1.1,
                enemy_hp: 24.0,
            },
            Difficulty::Normal => Self {
                enemy_speed: 70.0,
                spawn_every: 0.85,
                enemy_hp: 32.0,
            },
            Difficulty::Hard => Self {
                enemy_speed: 86.0,
                spawn_every: 0.72,
                enemy_hp: 42.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Speed,
    FireRate,
    Damage,
    Health,
}

impl Upgrade {
    const ALL: [Upgrade; 4] = [Upgrade::Speed, Upgrade::FireRate, Upgrade::Damage, Upgrade::Health];
}

#[derive(Debug, Clone, Copy)]
struct Player {
    pos: Vec2,
    speed: f32,
    hp: f32,
    max_hp: f32,
    /// Seconds between shots
    fire_rate: f32,
    fire_timer: f32,
    damage: f32,
}

impl Player {
    fn apply(&mut self, upgrade: Upgrade) {
        match upgrade {
            Upgrade::Speed => self.speed += 18.0,
            Upgrade::FireRate => self.fire_rate = (self.fire_rate - 0.03).max(0.15),
            Upgrade::Damage => self.damage += 4.0,
            Upgrade::Health => {
                self.max_hp += 8.0;
                self.hp = (self.hp + 12.0).min(self.max_hp);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Enemy {
    pos: Vec2,
    hp: f32,
    radius: f32,
}

#[derive(Debug, Clone, Copy)]
struct Bullet {
    pos: Vec2,
    vel: Vec2,
    life: f32,
}

pub struct VoidSurvival {
    cfg: SurvivalConfig,
    rng: SeededRng,
    particles: ParticleSystem,
    latch: EndLatch,
    player: Player,
    enemies: Vec<Enemy>,
    bullets: Vec<Bullet>,
    orbs: Vec<Vec2>,
    spawn_timer: f32,
    elapsed: f32,
    kills: u32,
    xp: u32,
    next_upgrade: u32,
    level_flash: f32,
    score: f32,
}

impl VoidSurvival {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            cfg: SurvivalConfig::for_difficulty(config.difficulty),
            rng: SeededRng::new(config.seed),
            particles: ParticleSystem::new(config.seed, config.settings.quality),
            latch: EndLatch::default(),
            player: Player {
                pos: Vec2::new(WIDTH * 0.5, HEIGHT * 0.5),
                speed: 250.0,
                hp: 100.0,
                max_hp: 100.0,
                fire_rate: 0.4,
                fire_timer: 0.0,
                damage: 16.0,
            },
            enemies: Vec::new(),
            bullets: Vec::new(),
            orbs: Vec::new(),
            spawn_timer: 0.0,
            elapsed: 0.0,
            kills: 0,
            xp: 0,
            next_upgrade: FIRST_UPGRADE_XP,
            level_flash: 0.0,
            score: 0.0,
        }
    }

    /// Just outside a random edge
    fn spawn_enemy(&mut self) {
        let pos = match self.rng.index(4) {
            0 => Vec2::new(self.rng.range(0.0, WIDTH), -20.0),
            1 => Vec2::new(WIDTH + 20.0, self.rng.range(0.0, HEIGHT)),
            2 => Vec2::new(self.rng.range(0.0, WIDTH), HEIGHT + 20.0),
            _ => Vec2::new(-20.0, self.rng.range(0.0, HEIGHT)),
        };
        let radius = self.rng.range(12.0, 20.0);
        self.enemies.push(Enemy {
            pos,
            hp: self.cfg.enemy_hp + self.elapsed * 0.3,
            radius,
        });
    }

    /// Nearest enemy; ties go to the earliest spawned
    fn target(&self) -> Option<Vec2> {
        let me = self.player.pos;
        self.enemies
            .iter()
            .map(|e| e.pos)
            .fold(None, |best: Option<(f32, Vec2)>, pos| {
                let d = dist(me, pos);
                match best {
                    Some((bd, _)) if bd <= d => best,
                    _ => Some((d, pos)),
                }
            })
            .map(|(_, pos)| pos)
    }

    fn auto_fire(&mut self, frame: &mut Frame<'_>) {
        if self.player.fire_timer > 0.0 {
            return;
        }
        let Some(target) = self.target() else {
            return;
        };
        let dir = (target - self.player.pos).normalize_or(Vec2::X);
        self.bullets.push(Bullet {
            pos: self.player.pos,
            vel: dir * BULLET_SPEED,
            life: BULLET_LIFE,
        });
        self.player.fire_timer = self.player.fire_rate;
        frame.audio.play(SoundEffect::Ui);
    }

    fn move_bullets(&mut self, dt: f32, frame: &mut Frame<'_>) {
        for i in (0..self.bullets.len()).rev() {
            let b = &mut self.bullets[i];
            b.life -= dt;
            if b.life <= 0.0 {
                self.bullets.remove(i);
                continue;
            }
            b.pos += b.vel * dt;
            let pos = b.pos;
            if pos.x < -10.0 || pos.x > WIDTH + 10.0 || pos.y < -10.0 || pos.y > HEIGHT + 10.0 {
                self.bullets.remove(i);
                continue;
            }

            let Some(j) = self
                .enemies
                .iter()
                .rposition(|e| circle_hits_circle(e.pos, e.radius, pos, BULLET_RADIUS))
            else {
                continue;
            };
            self.bullets.remove(i);
            self.enemies[j].hp -= self.player.damage;
            if self.enemies[j].hp <= 0.0 {
                let enemy = self.enemies.remove(j);
                self.kills += 1;
                self.score += 40.0;
                self.orbs.push(enemy.pos);
                self.particles.burst(
                    Burst::new(enemy.pos, colors::RED, 16)
                        .speed(80.0, 240.0)
                        .life(0.5)
                        .size(2.8),
                );
                frame.audio.play(SoundEffect::Hit);
            }
        }
    }

    fn chase(&mut self, dt: f32) {
        let speed = self.cfg.enemy_speed + self.elapsed * 0.45;
        let me = self.player.pos;
        for enemy in self.enemies.iter_mut() {
            let dir = (me - enemy.pos).normalize_or_zero();
            enemy.pos += dir * speed * dt;
            if circle_hits_circle(enemy.pos, enemy.radius, me, PLAYER_RADIUS) {
                self.player.hp -= CONTACT_DPS * dt;
                self.particles.burst(
                    Burst::new(me, colors::GOLD, 4)
                        .speed(40.0, 120.0)
                        .life(0.2)
                        .size(2.0),
                );
            }
        }
    }

    fn collect_orbs(&mut self, dt: f32) {
        let me = self.player.pos;
        for i in (0..self.orbs.len()).rev() {
            let orb = &mut self.orbs[i];
            let delta = me - *orb;
            let distance = delta.length();
            if distance < ORB_PULL_RANGE {
                *orb += delta / distance.max(1.0) * ORB_PULL_SPEED * dt;
            }
            if distance < PLAYER_RADIUS + 6.0 {
                self.xp += ORB_VALUE;
                self.score += 12.0;
                self.orbs.remove(i);
            }
        }
    }

    fn level_up(&mut self, frame: &mut Frame<'_>) {
        if self.xp < self.next_upgrade {
            return;
        }
        self.xp -= self.next_upgrade;
        self.next_upgrade += UPGRADE_XP_STEP;
        let upgrade = Upgrade::ALL[self.rng.index(Upgrade::ALL.len())];
        self.player.apply(upgrade);
        self.level_flash = 1.0;
        frame.audio.play(SoundEffect::Power);
        log::debug!("Void survival upgrade: {:?}", upgrade);
    }
}

impl Simulation for VoidSurvival {
    fn id(&self) -> GameId {
        GameId::VoidSurvival
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        self.elapsed += dt;
        self.spawn_timer += dt;
        self.player.fire_timer -= dt;
        self.level_flash = (self.level_flash - dt * 1.4).max(0.0);

        let mv = Vec2::new(
            axis(frame.input, Action::Left, Action::Right),
            axis(frame.input, Action::Up, Action::Down),
        );
        let p = &mut self.player;
        p.pos.x = clamp(p.pos.x + mv.x * p.speed * dt, 20.0, WIDTH - 20.0);
        p.pos.y = clamp(p.pos.y + mv.y * p.speed * dt, 20.0, HEIGHT - 20.0);

        if self.spawn_timer >= self.cfg.spawn_every {
            self.spawn_timer = 0.0;
            self.spawn_enemy();
        }

        self.auto_fire(frame);
        self.move_bullets(dt, frame);
        self.chase(dt);
        self.collect_orbs(dt);
        self.level_up(frame);

        if self.player.hp <= 0.0 {
            let result = RunResult::new(whole_score(self.score), false)
                .with_stat("time", self.elapsed.round() as f64)
                .with_stat("kills", self.kills as f64);
            if self.latch.end(result) {
                frame.audio.play(SoundEffect::Explosion);
            }
            return;
        }

        self.score += dt * 24.0 + self.kills as f32 * dt * 2.0;
        self.particles.update(dt);
    }

    fn draw(&self, painter: &mut dyn Painter, _time: f32) {
        painter.clear(colors::BACKGROUND);
        let mut x = 0.0;
        while x < WIDTH {
            painter.line(Vec2::new(x, 0.0), Vec2::new(x, HEIGHT), fade(colors::CYAN, 0.14), 1.0);
            x += 30.0;
        }

        painter.set_glow(10.0, colors::RED);
        for enemy in &self.enemies {
            painter.fill_circle(enemy.pos, enemy.radius, colors::RED);
        }
        painter.set_glow(6.0, colors::TEXT);
        for b in &self.bullets {
            painter.fill_circle(b.pos, BULLET_RADIUS, colors::TEXT);
        }
        painter.set_glow(8.0, colors::GREEN);
        for orb in &self.orbs {
            painter.fill_circle(*orb, 5.0, colors::GREEN);
        }
        let color = if self.level_flash > 0.0 { colors::GOLD } else { colors::CYAN };
        painter.set_glow(16.0, color);
        painter.fill_circle(self.player.pos, PLAYER_RADIUS, color);
        painter.set_glow(0.0, colors::BACKGROUND);
        self.particles.draw(painter);

        hud(
            painter,
            &[
                ("SCORE", self.score().to_string()),
                ("HP", format!("{:.0}/{:.0}", self.player.hp.max(0.0), self.player.max_hp)),
                ("KILLS", self.kills.to_string()),
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

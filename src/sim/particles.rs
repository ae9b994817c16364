//! Cosmetic particle bursts
//!
//! Particles draw from their own RNG stream so a burst never shifts the
//! gameplay sequence of a seeded run.

use glam::Vec2;

use super::rng::{PARTICLE_STREAM, SeededRng};
use crate::consts::PARTICLE_GRAVITY;
use crate::renderer::{Color, Painter, fade};
use crate::settings::QualityPreset;

/// A single particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    pub color: Color,
}

/// Burst parameters
#[derive(Debug, Clone, Copy)]
pub struct Burst {
    pub pos: Vec2,
    pub color: Color,
    pub count: u32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub life: f32,
    pub size: f32,
}

impl Burst {
    pub fn new(pos: Vec2, color: Color, count: u32) -> Self {
        Self {
            pos,
            color,
            count,
            min_speed: 60.0,
            max_speed: 240.0,
            life: 0.5,
            size: 3.0,
        }
    }

    pub fn speed(mut self, min: f32, max: f32) -> Self {
        self.min_speed = min;
        self.max_speed = max;
        self
    }

    pub fn life(mut self, life: f32) -> Self {
        self.life = life;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// Quality-scaled particle pool owned by one simulation
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    quality: QualityPreset,
    rng: SeededRng,
}

impl ParticleSystem {
    pub fn new(seed: u32, quality: QualityPreset) -> Self {
        Self {
            particles: Vec::new(),
            quality,
            rng: SeededRng::with_stream(seed, PARTICLE_STREAM),
        }
    }

    /// Affects subsequent bursts only
    pub fn set_quality(&mut self, quality: QualityPreset) {
        self.quality = quality;
    }

    pub fn quality(&self) -> QualityPreset {
        self.quality
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Spawn `round(count × multiplier)` particles; returns how many were added
    pub fn burst(&mut self, burst: Burst) -> usize {
        let total = (burst.count as f32 * self.quality.burst_multiplier()).round() as usize;
        let room = self.quality.max_particles().saturating_sub(self.particles.len());
        let total = total.min(room);

        for _ in 0..total {
            let angle = self.rng.angle();
            let speed = self.rng.range(burst.min_speed, burst.max_speed);
            let size = self.rng.range(burst.size * 0.55, burst.size * 1.25);
            self.particles.push(Particle {
                pos: burst.pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: burst.life,
                max_life: burst.life,
                size,
                color: burst.color,
            });
        }
        total
    }

    pub fn update(&mut self, dt: f32) {
        self.particles.retain_mut(|p| {
            p.life -= dt;
            if p.life <= 0.0 {
                return false;
            }
            p.vel.y += PARTICLE_GRAVITY * dt;
            p.pos += p.vel * dt;
            true
        });
    }

    pub fn draw(&self, painter: &mut dyn Painter) {
        for p in &self.particles {
            let alpha = if p.max_life > 0.0 { p.life / p.max_life } else { 0.0 };
            painter.fill_circle(p.pos, p.size, fade(p.color, alpha));
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DisplayList, DrawCommand, colors};

    #[test]
    fn test_burst_scales_with_quality() {
        let mut low = ParticleSystem::new(1, QualityPreset::Low);
        let mut high = ParticleSystem::new(1, QualityPreset::High);
        assert_eq!(low.burst(Burst::new(Vec2::ZERO, colors::CYAN, 20)), 11);
        assert_eq!(high.burst(Burst::new(Vec2::ZERO, colors::CYAN, 20)), 30);
    }

    #[test]
    fn test_burst_attributes_in_range() {
        let mut ps = ParticleSystem::new(9, QualityPreset::Medium);
        ps.burst(
            Burst::new(Vec2::new(100.0, 100.0), colors::GOLD, 40)
                .speed(80.0, 260.0)
                .size(4.0),
        );
        for p in ps.particles() {
            let speed = p.vel.length();
            assert!(speed >= 79.9 && speed <= 260.1, "speed {speed}");
            assert!(p.size >= 4.0 * 0.55 - 1e-4 && p.size <= 4.0 * 1.25 + 1e-4);
        }
    }

    #[test]
    fn test_quality_change_not_retroactive() {
        let mut ps = ParticleSystem::new(2, QualityPreset::High);
        ps.burst(Burst::new(Vec2::ZERO, colors::PINK, 10));
        assert_eq!(ps.len(), 15);
        ps.set_quality(QualityPreset::Low);
        assert_eq!(ps.len(), 15);
        ps.burst(Burst::new(Vec2::ZERO, colors::PINK, 10));
        assert_eq!(ps.len(), 15 + 6);
    }

    #[test]
    fn test_update_applies_gravity_and_expires() {
        let mut ps = ParticleSystem::new(3, QualityPreset::Medium);
        ps.burst(Burst::new(Vec2::ZERO, colors::CYAN, 1).speed(0.0, 0.0).life(0.1));
        ps.update(0.05);
        let p = ps.particles()[0];
        assert!((p.vel.y - 5.0).abs() < 1e-4);
        assert!(p.pos.y > 0.0);
        ps.update(0.06);
        assert!(ps.is_empty());
    }

    #[test]
    fn test_draw_fades_by_remaining_life() {
        let mut ps = ParticleSystem::new(4, QualityPreset::Medium);
        ps.burst(Burst::new(Vec2::ZERO, colors::CYAN, 1).life(1.0));
        ps.update(0.5);
        let mut list = DisplayList::new();
        ps.draw(&mut list);
        match &list.commands[0] {
            DrawCommand::FillCircle { color, .. } => assert!((color[3] - 0.5).abs() < 1e-4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pool_cap() {
        let mut ps = ParticleSystem::new(5, QualityPreset::Low);
        for _ in 0..100 {
            ps.burst(Burst::new(Vec2::ZERO, colors::CYAN, 20));
        }
        assert_eq!(ps.len(), QualityPreset::Low.max_particles());
    }
}

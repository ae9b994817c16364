//! Rhythm Tap - four-lane note highway judged against a song clock

use glam::Vec2;

use crate::audio::SoundEffect;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::InputEvent;
use crate::renderer::{Painter, TextAlign, colors, fade};
use crate::settings::Difficulty;
use crate::sim::{EndLatch, Frame, GameId, RunConfig, RunResult, SeededRng, Simulation, whole_score};

pub const LANES: usize = 4;
const LANE_KEYS: [&str; LANES] = ["d", "f", "j", "k"];
const HIT_Y: f32 = HEIGHT - 96.0;
/// Seconds a note is visible before reaching the hit line
const TRAVEL_TIME: f32 = 1.8;
const FIRST_NOTE: f32 = 1.2;

/// Max distance from a note's time that still counts as a hit
pub const JUDGE_WINDOW: f32 = 0.15;
pub const PERFECT_WINDOW: f32 = 0.06;
/// Hit ratio above which the run counts as won
const PASS_ACCURACY: f32 = 0.65;

#[derive(Debug, Clone, Copy)]
pub struct RhythmConfig {
    pub bpm: f32,
    /// Chance each beat carries a note
    pub density: f32,
    /// Song length in seconds
    pub length: f32,
}

impl RhythmConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                bpm: 96.0,
                density: 0.82,
                length: 42.0,
            },
            Difficulty::Normal => Self {
                bpm: 118.0,
                density: 0.9,
                length: 50.0,
            },
            Difficulty::Hard => Self {
                bpm: 136.0,
                density: 0.98,
                length: 58.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Note {
    lane: usize,
    time: f32,
    judged: bool,
    hit: bool,
}

pub struct RhythmTap {
    cfg: RhythmConfig,
    latch: EndLatch,
    notes: Vec<Note>,
    time: f32,
    combo: u32,
    max_combo: u32,
    misses: u32,
    score: f32,
    combo_glow: f32,
}

impl RhythmTap {
    pub fn new(config: &RunConfig) -> Self {
        let cfg = RhythmConfig::for_difficulty(config.difficulty);
        let mut rng = SeededRng::new(config.seed);
        let beat = 60.0 / cfg.bpm;
        let mut notes = Vec::new();
        let mut time = FIRST_NOTE;
        while time < cfg.length {
            if rng.chance(cfg.density) {
                notes.push(Note {
                    lane: rng.index(LANES),
                    time,
                    judged: false,
                    hit: false,
                });
            }
            time += beat;
        }
        log::debug!("Rhythm chart: {} notes at {} bpm", notes.len(), cfg.bpm);

        Self {
            cfg,
            latch: EndLatch::default(),
            notes,
            time: 0.0,
            combo: 0,
            max_combo: 0,
            misses: 0,
            score: 0.0,
            combo_glow: 0.0,
        }
    }

    fn lane_for_key(key: &str) -> Option<usize> {
        let key = key.to_lowercase();
        LANE_KEYS.iter().position(|k| *k == key)
    }

    fn lane_for_x(x: f32) -> usize {
        let lane_w = WIDTH / LANES as f32;
        ((x / lane_w).floor().max(0.0) as usize).min(LANES - 1)
    }

    /// Judge a tap in `lane` against the nearest unjudged note
    pub fn tap(&mut self, lane: usize, frame: &mut Frame<'_>) {
        if self.latch.is_ended() {
            return;
        }
        let now = self.time;
        let closest = self
            .notes
            .iter_mut()
            .filter(|n| !n.judged && n.lane == lane)
            .map(|n| ((n.time - now).abs(), n))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        let Some((delta, note)) = closest.filter(|(d, _)| *d <= JUDGE_WINDOW) else {
            self.combo = 0;
            self.misses += 1;
            frame.audio.play(SoundEffect::Hit);
            return;
        };

        note.judged = true;
        note.hit = true;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo_glow = 1.0;
        self.score += if delta <= PERFECT_WINDOW {
            180.0 + self.combo as f32 * 3.0
        } else {
            110.0 + self.combo as f32 * 2.0
        };
        frame.audio.play(SoundEffect::Ui);
    }

    pub fn accuracy(&self) -> f32 {
        if self.notes.is_empty() {
            return 0.0;
        }
        self.notes.iter().filter(|n| n.hit).count() as f32 / self.notes.len() as f32
    }

    fn finish(&mut self) {
        let result = RunResult::new(whole_score(self.score), self.accuracy() > PASS_ACCURACY)
            .with_stat("combo", self.max_combo as f64)
            .with_stat("misses", self.misses as f64);
        self.latch.end(result);
    }
}

impl Simulation for RhythmTap {
    fn id(&self) -> GameId {
        GameId::RhythmTap
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        // Taps are judged against the clock they were made under
        for event in frame.events {
            let lane = match event {
                InputEvent::Key(key) => Self::lane_for_key(key),
                InputEvent::PointerDown(p) => Some(Self::lane_for_x(p.x)),
                InputEvent::PointerUp(_) => None,
            };
            if let Some(lane) = lane {
                self.tap(lane, frame);
            }
        }

        self.time += dt;
        self.combo_glow = (self.combo_glow - dt * 2.0).max(0.0);

        for note in self.notes.iter_mut() {
            if !note.judged && self.time - note.time > JUDGE_WINDOW {
                note.judged = true;
                self.combo = 0;
                self.misses += 1;
            }
        }

        let song_over = self.time > self.cfg.length + 1.0;
        let all_judged = self.notes.iter().all(|n| n.judged && self.time > n.time + 0.2);
        if song_over || all_judged {
            self.finish();
        }
    }

    fn draw(&self, painter: &mut dyn Painter, _time: f32) {
        painter.clear(colors::BACKGROUND);
        let lane_w = WIDTH / LANES as f32;
        for lane in 0..LANES {
            let shade = if lane % 2 == 0 { 0.10 } else { 0.06 };
            painter.fill_rect(lane as f32 * lane_w, 0.0, lane_w, HEIGHT, fade(colors::BLUE, shade));
            painter.text(
                &LANE_KEYS[lane].to_uppercase(),
                Vec2::new(lane as f32 * lane_w + lane_w * 0.5, HEIGHT - 40.0),
                18.0,
                colors::DIM,
                TextAlign::Center,
            );
        }
        painter.line(Vec2::new(0.0, HIT_Y), Vec2::new(WIDTH, HIT_Y), fade(colors::CYAN, 0.22), 3.0);

        for note in &self.notes {
            if note.judged && !note.hit {
                continue;
            }
            let progress = (note.time - self.time) / TRAVEL_TIME;
            let y = HIT_Y - (1.0 - progress) * (HIT_Y - 40.0);
            if !(-30.0..=HEIGHT + 30.0).contains(&y) {
                continue;
            }
            let color = if note.hit { colors::GREEN } else { colors::CYAN };
            let center = note.lane as f32 * lane_w + lane_w * 0.5;
            painter.set_glow(18.0, color);
            painter.fill_rect(center - 48.0, y - 14.0, 96.0, 24.0, color);
        }
        painter.set_glow(0.0, colors::BACKGROUND);

        let combo_color = if self.combo_glow > 0.0 { colors::GOLD } else { colors::TEXT };
        painter.text(&format!("COMBO {}", self.combo), Vec2::new(20.0, 36.0), 22.0, combo_color, TextAlign::Left);
        painter.text(&format!("Misses {}", self.misses), Vec2::new(20.0, 58.0), 14.0, colors::TEXT, TextAlign::Left);
        painter.text(
            &format!("SCORE {}", self.score()),
            Vec2::new(WIDTH - 20.0, 36.0),
            18.0,
            colors::TEXT,
            TextAlign::Right,
        );
    }

    fn score(&self) -> u32 {
        whole_score(self.score)
    }

    fn latch(&self) -> &EndLatch {
        &self.latch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::games::testing::Rig;

    fn game(difficulty: Difficulty) -> RhythmTap {
        RhythmTap::new(&RunConfig::new(GameId::RhythmTap, difficulty, 4242))
    }

    fn tap_at(g: &mut RhythmTap, rig: &mut Rig, time: f32, lane: usize) {
        g.time = time;
        let mut frame = Frame {
            input: &mut rig.input,
            audio: &mut rig.audio,
            events: &[],
        };
        g.tap(lane, &mut frame);
    }

    #[test]
    fn test_chart_is_seeded_and_on_beat() {
        let a = game(Difficulty::Normal);
        let b = game(Difficulty::Normal);
        assert_eq!(a.notes, b.notes);
        let beat = 60.0 / 118.0;
        for note in &a.notes {
            let beats = (note.time - FIRST_NOTE) / beat;
            assert!((beats - beats.round()).abs() < 1e-2);
            assert!(note.lane < LANES);
            assert!(note.time < 50.0);
        }
        // ~90 % of the 97 beats carry a note
        assert!(a.notes.len() > 70);
    }

    #[test]
    fn test_perfect_and_good_hits() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        let first = g.notes[0];
        tap_at(&mut g, &mut rig, first.time + 0.03, first.lane);
        assert_eq!(g.score(), 183);
        assert_eq!(g.combo, 1);

        let second = g.notes[1];
        tap_at(&mut g, &mut rig, second.time - 0.1, second.lane);
        assert_eq!(g.score(), 183 + 114);
        assert_eq!(g.max_combo, 2);
    }

    #[test]
    fn test_stray_tap_is_a_miss() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        g.combo = 4;
        tap_at(&mut g, &mut rig, 0.0, 0);
        assert_eq!(g.misses, 1);
        assert_eq!(g.combo, 0);
        assert_eq!(g.score(), 0);
    }

    #[test]
    fn test_key_and_pointer_lanes() {
        assert_eq!(RhythmTap::lane_for_key("J"), Some(2));
        assert_eq!(RhythmTap::lane_for_key("x"), None);
        assert_eq!(RhythmTap::lane_for_x(-5.0), 0);
        assert_eq!(RhythmTap::lane_for_x(WIDTH * 0.6), 2);
        assert_eq!(RhythmTap::lane_for_x(WIDTH + 10.0), 3);
    }

    #[test]
    fn test_key_event_judged_at_frame_start() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        let first = g.notes[0];
        g.time = first.time;
        let key = LANE_KEYS[first.lane].to_string();
        rig.tick_with(&mut g, 0.016, &[InputEvent::Key(key)]);
        assert!(g.notes[0].hit);
        assert_eq!(g.score(), 183);
    }

    #[test]
    fn test_idle_song_is_lost() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        rig.run_until_end(&mut g, 60.0);
        let result = g.latch.result().expect("song ends");
        assert!(!result.won);
        assert_eq!(result.stat("misses"), Some(g.notes.len() as f64));
        assert_eq!(result.stat("combo"), Some(0.0));
    }

    #[test]
    fn test_perfect_play_wins() {
        let mut g = game(Difficulty::Easy);
        let mut rig = Rig::new();
        for i in 0..g.notes.len() {
            let note = g.notes[i];
            tap_at(&mut g, &mut rig, note.time, note.lane);
        }
        g.time = g.cfg.length + 1.0;
        rig.tick(&mut g, 0.016);
        let result = g.latch.result().expect("all notes judged");
        assert!(result.won);
        assert_eq!(result.stat("combo"), Some(g.notes.len() as f64));
    }
}

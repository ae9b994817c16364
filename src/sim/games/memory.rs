//! Memory Match - flip cards in pairs against the clock

use glam::Vec2;

use super::{backdrop, hud};
use crate::audio::SoundEffect;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::{Action, InputEvent};
use crate::renderer::{Painter, TextAlign, colors, fade};
use crate::settings::{Difficulty, QualityPreset};
use crate::sim::{
    Burst, EndLatch, Frame, GameId, ParticleSystem, Rect, RunConfig, RunResult, SeededRng,
    Simulation,
};

const SYMBOLS: [&str; 12] = ["▲", "◆", "◉", "☀", "✦", "⬢", "✚", "☯", "✿", "◈", "✪", "✺"];

const MATCH_SCORE: u32 = 80;
const COMBO_SCORE: u32 = 15;
const TIME_BONUS: u32 = 8;
/// A mismatched pair stays face up this long
const FLIP_BACK_SECS: f32 = 0.52;

const BOARD_TOP: f32 = 56.0;
const BOARD_MARGIN: f32 = 24.0;
const CARD_GAP: f32 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct MemoryConfig {
    pub pairs: usize,
    /// Seconds on the clock
    pub time: f32,
    pub columns: usize,
}

impl MemoryConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                pairs: 8,
                time: 130.0,
                columns: 4,
            },
            Difficulty::Normal => Self {
                pairs: 10,
                time: 115.0,
                columns: 5,
            },
            Difficulty::Hard => Self {
                pairs: 12,
                time: 95.0,
                columns: 6,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Card {
    symbol: &'static str,
    flipped: bool,
    matched: bool,
}

impl Card {
    fn face_up(&self) -> bool {
        self.flipped || self.matched
    }
}

pub struct MemoryMatch {
    cfg: MemoryConfig,
    particles: ParticleSystem,
    latch: EndLatch,
    cards: Vec<Card>,
    open: Vec<usize>,
    flip_back: Option<f32>,
    cursor: usize,
    time_left: f32,
    moves: u32,
    combo: u32,
    best_combo: u32,
    score: u32,
}

impl MemoryMatch {
    pub fn new(config: &RunConfig) -> Self {
        let cfg = MemoryConfig::for_difficulty(config.difficulty);
        let mut rng = SeededRng::new(config.seed);

        let mut symbols = SYMBOLS;
        rng.shuffle(&mut symbols);
        let picked = &symbols[..cfg.pairs];
        let mut cards: Vec<Card> = picked
            .iter()
            .chain(picked)
            .map(|&symbol| Card {
                symbol,
                flipped: false,
                matched: false,
            })
            .collect();
        rng.shuffle(&mut cards);

        Self {
            cfg,
            particles: ParticleSystem::new(config.seed, config.settings.quality),
            latch: EndLatch::default(),
            cards,
            open: Vec::with_capacity(2),
            flip_back: None,
            cursor: 0,
            time_left: cfg.time,
            moves: 0,
            combo: 0,
            best_combo: 0,
            score: 0,
        }
    }

    fn rows(&self) -> usize {
        self.cards.len().div_ceil(self.cfg.columns)
    }

    /// Card pitch and the top-left of the grid
    fn layout(&self) -> (f32, Vec2) {
        let cols = self.cfg.columns as f32;
        let rows = self.rows() as f32;
        let pitch = ((WIDTH - BOARD_MARGIN * 2.0) / cols).min((HEIGHT - BOARD_TOP - BOARD_MARGIN) / rows);
        let origin = Vec2::new((WIDTH - pitch * cols) * 0.5, BOARD_TOP);
        (pitch, origin)
    }

    fn card_rect(&self, index: usize) -> Rect {
        let (pitch, origin) = self.layout();
        let col = (index % self.cfg.columns) as f32;
        let row = (index / self.cfg.columns) as f32;
        Rect::new(
            origin.x + col * pitch + CARD_GAP * 0.5,
            origin.y + row * pitch + CARD_GAP * 0.5,
            pitch - CARD_GAP,
            pitch - CARD_GAP,
        )
    }

    fn card_at(&self, point: Vec2) -> Option<usize> {
        (0..self.cards.len()).find(|&i| self.card_rect(i).contains(point))
    }

    fn matched_count(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count()
    }

    /// Flip one card. Ignored while a mismatched pair is showing.
    pub fn reveal(&mut self, index: usize, frame: &mut Frame<'_>) {
        if self.latch.is_ended() || self.open.len() >= 2 {
            return;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        if card.face_up() {
            return;
        }
        card.flipped = true;
        self.open.push(index);
        frame.audio.play(SoundEffect::Ui);
        if self.open.len() < 2 {
            return;
        }

        self.moves += 1;
        let (a, b) = (self.open[0], self.open[1]);
        if self.cards[a].symbol == self.cards[b].symbol {
            self.cards[a].matched = true;
            self.cards[b].matched = true;
            self.open.clear();
            self.score += MATCH_SCORE + self.combo * COMBO_SCORE;
            self.combo += 1;
            self.best_combo = self.best_combo.max(self.combo);
            frame.audio.play(SoundEffect::Power);
            let center = self.card_rect(b).center();
            self.particles.burst(Burst::new(center, colors::CYAN, 10).speed(60.0, 180.0).life(0.4));
        } else {
            self.combo = 0;
            self.flip_back = Some(FLIP_BACK_SECS);
        }
    }

    fn move_cursor(&mut self, input: &mut crate::input::InputManager) {
        let cols = self.cfg.columns;
        let len = self.cards.len();
        let (col, row) = (self.cursor % cols, self.cursor / cols);
        if input.consume_press(Action::Left) && col > 0 {
            self.cursor -= 1;
        }
        if input.consume_press(Action::Right) && col + 1 < cols && self.cursor + 1 < len {
            self.cursor += 1;
        }
        if input.consume_press(Action::Up) && row > 0 {
            self.cursor -= cols;
        }
        if input.consume_press(Action::Down) && self.cursor + cols < len {
            self.cursor += cols;
        }
    }

    fn result(&self, won: bool) -> RunResult {
        RunResult::new(self.score, won)
            .with_stat("combo", self.best_combo as f64)
            .with_stat("moves", self.moves as f64)
    }
}

impl Simulation for MemoryMatch {
    fn id(&self) -> GameId {
        GameId::MemoryMatch
    }

    fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
        self.particles.update(dt);
        if self.latch.is_ended() {
            return;
        }

        if let Some(t) = self.flip_back.as_mut() {
            *t -= dt;
            if *t <= 0.0 {
                self.flip_back = None;
                for i in self.open.drain(..) {
                    self.cards[i].flipped = false;
                }
            }
        }

        for event in frame.events {
            if let InputEvent::PointerDown(p) = event {
                if let Some(i) = self.card_at(*p) {
                    self.cursor = i;
                    self.reveal(i, frame);
                }
            }
        }
        self.move_cursor(frame.input);
        if frame.input.consume_press(Action::Action) {
            self.reveal(self.cursor, frame);
        }

        self.time_left = (self.time_left - dt).max(0.0);

        if self.matched_count() == self.cards.len() {
            self.score += self.time_left.ceil() as u32 * TIME_BONUS;
            self.latch.end(self.result(true));
            self.particles.burst(
                Burst::new(Vec2::new(WIDTH * 0.5, HEIGHT * 0.4), colors::GOLD, 24)
                    .speed(120.0, 340.0)
                    .life(1.0)
                    .size(3.0),
            );
        } else if self.time_left <= 0.0 {
            self.latch.end(self.result(false));
            frame.audio.play(SoundEffect::Explosion);
        }
    }

    fn draw(&self, painter: &mut dyn Painter, time: f32) {
        backdrop(painter, time * 0.3);
        for (i, card) in self.cards.iter().enumerate() {
            let rect = self.card_rect(i);
            if card.face_up() {
                let color = if card.matched { colors::CYAN } else { colors::GOLD };
                painter.set_glow(12.0, color);
                painter.fill(&rect, color);
                painter.set_glow(0.0, colors::BACKGROUND);
                painter.text(
                    card.symbol,
                    rect.center() + Vec2::new(0.0, rect.h * 0.14),
                    rect.h * 0.4,
                    colors::BACKGROUND,
                    TextAlign::Center,
                );
            } else {
                painter.fill(&rect, fade(colors::BLUE, 0.25));
                painter.text("?", rect.center() + Vec2::new(0.0, rect.h * 0.12), rect.h * 0.34, colors::DIM, TextAlign::Center);
            }
            if i == self.cursor {
                painter.stroke_rect(rect.x - 3.0, rect.y - 3.0, rect.w + 6.0, rect.h + 6.0, colors::PINK, 2.0);
            }
        }
        self.particles.draw(painter);
        hud(
            painter,
            &[
                ("SCORE", self.score.to_string()),
                ("TIME", format!("{}", self.time_left.ceil() as u32)),
                ("MOVES", self.moves.to_string()),
                ("COMBO", self.combo.to_string()),
            ],
        );
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn latch(&self) -> &EndLatch {
        &self.latch
    }

    fn set_quality(&mut self, quality: QualityPreset) {
        self.particles.set_quality(quality);
    }
}

//! Fusion 2048 - slide and merge tiles toward a target value
//!
//! Moves are turn based; the frame loop only delivers them. Every direction
//! runs the same left-slide after rotating the board.

use glam::Vec2;

use super::{backdrop, hud};
use crate::audio::SoundEffect;
use crate::consts::{HEIGHT, WIDTH};
use crate::input::{Action, InputEvent};
use crate::renderer::{Color, Painter, TextAlign, colors, fade};
use crate::settings::Difficulty;
use crate::sim::{EndLatch, Frame, GameId, RunConfig, RunResult, SeededRng, Simulation};

/// Minimum pointer travel for a swipe
const SWIPE_MIN: f32 = 20.0;
const CELL: f32 = 84.0;
const CELL_GAP: f32 = 8.0;

#[derive(Debug, Clone, Copy)]
pub struct TileConfig {
    pub target: u32,
    pub size: usize,
}

impl TileConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self { target: 1024, size: 4 },
            Difficulty::Normal => Self { target: 2048, size: 4 },
            Difficulty::Hard => Self { target: 4096, size: 5 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Clockwise quarter turns that bring this direction to "left"
    fn turns(&self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Down => 1,
            Direction::Right => 2,
            Direction::Up => 3,
        }
    }

    fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            _ => None,
        }
    }

    fn from_swipe(delta: Vec2) -> Option<Self> {
        if delta.x.abs() < SWIPE_MIN && delta.y.abs() < SWIPE_MIN {
            return None;
        }
        Some(if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 { Direction::Right } else { Direction::Left }
        } else if delta.y > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        })
    }
}

/// Square grid of tile values, row major, 0 = empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<u32>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    pub fn from_rows(rows: &[&[u32]]) -> Self {
        Self {
            size: rows.len(),
            cells: rows.iter().flat_map(|r| r.iter().copied()).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.size + x]
    }

    pub fn sum(&self) -> u32 {
        self.cells.iter().sum()
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    fn rotate_clockwise(&self) -> Self {
        let n = self.size;
        let mut next = Self::new(n);
        for y in 0..n {
            for x in 0..n {
                next.cells[x * n + (n - 1 - y)] = self.get(x, y);
            }
        }
        next
    }

    fn rotated(&self, turns: usize) -> Self {
        (0..turns % 4).fold(self.clone(), |b, _| b.rotate_clockwise())
    }

    /// Slide every row left. Returns the merge score, or None if nothing moved.
    fn slide_left(&mut self) -> Option<u32> {
        let n = self.size;
        let mut moved = false;
        let mut gained = 0;
        for row in self.cells.chunks_mut(n) {
            let (merged, g) = merge_line(row);
            gained += g;
            if merged != row {
                moved = true;
                row.copy_from_slice(&merged);
            }
        }
        moved.then_some(gained)
    }

    /// Apply a move. None means the board did not change.
    pub fn slide(&mut self, dir: Direction) -> Option<u32> {
        let turns = dir.turns();
        let mut working = self.rotated(turns);
        let gained = working.slide_left()?;
        *self = working.rotated((4 - turns) % 4);
        Some(gained)
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        (0..self.cells.len()).filter(|&i| self.cells[i] == 0).collect()
    }

    /// Drop a 2 (90 %) or 4 into a random empty cell; returns the value placed
    pub fn spawn(&mut self, rng: &mut SeededRng) -> Option<u32> {
        let spaces = self.empty_cells();
        if spaces.is_empty() {
            return None;
        }
        let at = spaces[rng.index(spaces.len())];
        let value = if rng.chance(0.9) { 2 } else { 4 };
        self.cells[at] = value;
        Some(value)
    }

    pub fn has_moves(&self) -> bool {
        let n = self.size;
        (0..n).any(|y| {
            (0..n).any(|x| {
                let v = self.get(x, y);
                v == 0 || (x + 1 < n && v == self.get(x + 1, y)) || (y + 1 < n && v == self.get(x, y + 1))
            })
        })
    }
}

/// Compress, merge each equal pair once, compress again
fn merge_line(line: &[u32]) -> (Vec<u32>, u32) {
    let mut working: Vec<u32> = line.iter().copied().filter(|&v| v != 0).collect();
    let mut gained = 0;
    for i in 0..working.len().saturating_sub(1) {
        if working[i] != 0 && working[i] == working[i + 1] {
            working[i] *= 2;
            gained += working[i];
            working[i + 1] = 0;
        }
    }
    working.retain(|&v| v != 0);
    working.resize(line.len(), 0);
    (working, gained)
}

fn tile_color(value: u32) -> Color {
    const RAMP: [Color; 6] = [
        colors::BLUE,
        colors::CYAN,
        colors::GREEN,
        colors::GOLD,
        colors::ORANGE,
        colors::PINK,
    ];
    if value == 0 {
        return fade(colors::DIM, 0.12);
    }
    let step = (value.trailing_zeros() as usize).saturating_sub(1) / 2;
    RAMP[step.min(RAMP.len() - 1)]
}

pub struct Fusion2048 {
    cfg: TileConfig,
    rng: SeededRng,
    latch: EndLatch,
    board: Board,
    score: u32,
    moves: u32,
    swipe_start: Option<Vec2>,
}

impl Fusion2048 {
    pub fn new(config: &RunConfig) -> Self {
        let cfg = TileConfig::for_difficulty(config.difficulty);
        let mut rng = SeededRng::new(config.seed);
        let mut board = Board::new(cfg.size);
        board.spawn(&mut rng);
        board.spawn(&mut rng);
        Self {
            cfg,
            rng,
            latch: EndLatch::default(),
            board,
            score: 0,
            moves: 0,
            swipe_start: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Apply one move; returns true if the board changed
    pub fn apply_move(&mut self, dir: Direction, frame: &mut Frame<'_>) -> bool {
        if self.latch.is_ended() {
            return false;
        }
        let Some(gained) = self.board.slide(dir) else {
            return false;
        };
        self.board.spawn(&mut self.rng);
        self.score += gained;
        self.moves += 1;
        if gained > 0 {
            frame.audio.play(SoundEffect::Hit);
        }

        // Reaching the target on the last open cell is still a win
        let tile = self.board.max_tile();
        let won = tile >= self.cfg.target;
        if won || !self.board.has_moves() {
            let result = RunResult::new(self.score, won).with_stat("tile", tile as f64);
            self.latch.end(result);
            frame.audio.play(if won { SoundEffect::Power } else { SoundEffect::Explosion });
        }
        true
    }

    fn origin(&self) -> Vec2 {
        let span = self.board.size() as f32 * (CELL + CELL_GAP) - CELL_GAP;
        Vec2::new((WIDTH - span) * 0.5, (HEIGHT - span) * 0.5 + 16.0)
    }
}

impl Simulation for Fusion2048 {
    fn id(&self) -> GameId {
        GameId::Fusion2048
    }

    fn update(&mut self, _dt: f32, frame: &mut Frame<'_>) {
        let mut queued = Vec::new();
        for event in frame.events {
            match event {
                InputEvent::PointerDown(p) => self.swipe_start = Some(*p),
                InputEvent::PointerUp(p) => {
                    if let Some(dir) = self.swipe_start.take().and_then(|s| Direction::from_swipe(*p - s)) {
                        queued.push(dir);
                    }
                }
                InputEvent::Key(_) => {}
            }
        }
        for action in [Action::Left, Action::Right, Action::Up, Action::Down] {
            if frame.input.consume_press(action) {
                queued.extend(Direction::from_action(action));
            }
        }
        for dir in queued {
            self.apply_move(dir, frame);
        }
    }

    fn draw(&self, painter: &mut dyn Painter, time: f32) {
        backdrop(painter, time * 0.2);
        let origin = self.origin();
        let n = self.board.size();
        let span = n as f32 * (CELL + CELL_GAP) - CELL_GAP;
        painter.fill_rect(origin.x - 10.0, origin.y - 10.0, span + 20.0, span + 20.0, colors::OVERLAY);
        for y in 0..n {
            for x in 0..n {
                let value = self.board.get(x, y);
                let pos = origin + Vec2::new(x as f32, y as f32) * (CELL + CELL_GAP);
                let color = tile_color(value);
                painter.set_glow(if value >= 512 { 14.0 } else { 0.0 }, color);
                painter.fill_rect(pos.x, pos.y, CELL, CELL, fade(color, if value == 0 { 1.0 } else { 0.85 }));
                if value > 0 {
                    let size = if value >= 1000 { 24.0 } else { 30.0 };
                    painter.text(
                        &value.to_string(),
                        pos + Vec2::new(CELL * 0.5, CELL * 0.5 + size * 0.35),
                        size,
                        colors::BACKGROUND,
                        TextAlign::Center,
                    );
                }
            }
        }
        painter.set_glow(0.0, colors::BACKGROUND);
        hud(
            painter,
            &[
                ("SCORE", self.score.to_string()),
                ("TILE", self.board.max_tile().to_string()),
                ("TARGET", self.cfg.target.to_string()),
            ],
        );
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn latch(&self) -> &EndLatch {
        &self.latch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::games::testing::Rig;

    fn game(difficulty: Difficulty, seed: u32) -> Fusion2048 {
        Fusion2048::new(&RunConfig::new(GameId::Fusion2048, difficulty, seed))
    }

    #[test]
    fn test_merge_line() {
        assert_eq!(merge_line(&[2, 2, 2, 2]), (vec![4, 4, 0, 0], 8));
        assert_eq!(merge_line(&[2, 0, 2, 4]), (vec![4, 4, 0, 0], 4));
        // A merged tile does not merge again in the same move
        assert_eq!(merge_line(&[4, 4, 8, 0]), (vec![8, 8, 0, 0], 8));
        assert_eq!(merge_line(&[2, 4, 8, 16]), (vec![2, 4, 8, 16], 0));
    }

    #[test]
    fn test_slide_directions() {
        let board = Board::from_rows(&[&[2, 0, 0, 2], &[0, 0, 0, 0], &[0, 4, 0, 0], &[0, 4, 0, 0]]);

        let mut right = board.clone();
        assert_eq!(right.slide(Direction::Right), Some(4));
        assert_eq!(right.get(3, 0), 4);

        let mut down = board.clone();
        assert_eq!(down.slide(Direction::Down), Some(8));
        assert_eq!(down.get(1, 3), 8);
        assert_eq!(down.get(0, 3), 2);

        let mut up = board.clone();
        assert_eq!(up.slide(Direction::Up), Some(8));
        assert_eq!(up.get(1, 0), 8);
        assert_eq!(up.get(3, 0), 2);
    }

    #[test]
    fn test_blocked_move_changes_nothing() {
        let mut board = Board::from_rows(&[&[2, 4], &[8, 16]]);
        let before = board.clone();
        assert_eq!(board.slide(Direction::Left), None);
        assert_eq!(board, before);
        assert!(!board.has_moves());
    }

    #[test]
    fn test_sum_and_score_accounting() {
        let mut g = game(Difficulty::Normal, 5);
        let mut rig = Rig::new();
        let mut frame = Frame {
            input: &mut rig.input,
            audio: &mut rig.audio,
            events: &[],
        };
        for dir in [Direction::Left, Direction::Up, Direction::Right, Direction::Down].into_iter().cycle().take(40) {
            if g.latch.is_ended() {
                break;
            }
            let sum = g.board.sum();
            let score = g.score;
            if g.apply_move(dir, &mut frame) {
                let spawned = g.board.sum() - sum;
                assert!(spawned == 2 || spawned == 4, "merges conserve value");
                assert!(g.score >= score);
            } else {
                assert_eq!(g.board.sum(), sum, "no spawn on a blocked move");
                assert_eq!(g.score, score);
            }
        }
    }

    #[test]
    fn test_reaching_target_on_full_board_wins() {
        let mut g = game(Difficulty::Easy, 1);
        let mut rig = Rig::new();
        g.board = Board::from_rows(&[&[512, 512, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        let mut frame = Frame {
            input: &mut rig.input,
            audio: &mut rig.audio,
            events: &[],
        };
        assert!(g.apply_move(Direction::Left, &mut frame));
        let result = g.latch.result().expect("target reached");
        assert!(result.won);
        assert_eq!(result.score, 1024);
        assert_eq!(result.stat("tile"), Some(1024.0));
        assert!(!g.apply_move(Direction::Right, &mut frame), "ended runs ignore moves");
    }

    #[test]
    fn test_stuck_board_loses() {
        let mut g = game(Difficulty::Easy, 1);
        let mut rig = Rig::new();
        // Left merges the 2s; the spawn fills the only gap with no moves left
        g.board = Board::from_rows(&[&[2, 2, 8, 16], &[16, 32, 64, 128], &[32, 64, 128, 256], &[64, 128, 256, 512]]);
        let mut frame = Frame {
            input: &mut rig.input,
            audio: &mut rig.audio,
            events: &[],
        };
        assert!(g.apply_move(Direction::Left, &mut frame));
        assert!(!g.board.has_moves());
        let result = g.latch.result().expect("board is stuck");
        assert!(!result.won);
        assert_eq!(result.score, 4);
        assert_eq!(result.stat("tile"), Some(512.0));
    }

    #[test]
    fn test_swipe_and_key_moves() {
        let mut g = game(Difficulty::Normal, 9);
        let mut rig = Rig::new();
        let before = g.board.clone();
        rig.tick_with(
            &mut g,
            0.016,
            &[
                InputEvent::PointerDown(Vec2::new(400.0, 300.0)),
                InputEvent::PointerUp(Vec2::new(405.0, 308.0)),
            ],
        );
        assert_eq!(g.board, before, "short drags are not swipes");

        rig.input.key_down("ArrowLeft");
        rig.input.key_down("ArrowRight");
        rig.tick(&mut g, 0.016);
        assert!(g.moves >= 1);
    }

    #[test]
    fn test_seed_reproduces_board() {
        let a = game(Difficulty::Hard, 77);
        let b = game(Difficulty::Hard, 77);
        assert_eq!(a.board, b.board);
        assert_eq!(a.board.size(), 5);
        assert_eq!(a.board.empty_cells().len(), 23);
    }
}

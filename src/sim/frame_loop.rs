//! Frame loop host
//!
//! Drives one simulation at animation-frame cadence: clamps delta time,
//! applies pause, delivers queued events, always redraws, reports HUD values
//! at a fixed cadence and surfaces the terminal result exactly once.

use super::{Frame, RunResult, Simulation};
use crate::audio::AudioManager;
use crate::consts::{HUD_REFRESH_SECS, MAX_FRAME_DT};
use crate::fps::RollingFps;
use crate::input::{Action, InputEvent, InputManager};
use crate::renderer::Painter;
use crate::settings::QualityPreset;

/// What happened during one `step`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Set at HUD cadence and on the final frame
    pub score: Option<u32>,
    /// Set at HUD cadence
    pub fps: Option<f64>,
    /// The terminal result, on the one frame it first appears
    pub result: Option<RunResult>,
    /// The pause key toggled pause this frame
    pub pause_toggled: bool,
    /// False once the run has ended or the runner was disposed
    pub keep_running: bool,
}

/// Clamped step in seconds between two frame timestamps (ms)
pub fn clamp_dt(prev_ms: f64, now_ms: f64) -> f32 {
    (((now_ms - prev_ms) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT)
}

pub struct GameRunner {
    sim: Box<dyn Simulation>,
    last_ms: Option<f64>,
    /// Simulated seconds, for draw animation
    clock: f32,
    hud_timer: f32,
    fps: RollingFps,
    paused: bool,
    pending: Vec<InputEvent>,
    finished: bool,
    disposed: bool,
}

impl GameRunner {
    pub fn new(sim: Box<dyn Simulation>) -> Self {
        Self {
            sim,
            last_ms: None,
            clock: 0.0,
            hud_timer: 0.0,
            fps: RollingFps::new(),
            paused: false,
            pending: Vec::new(),
            finished: false,
            disposed: false,
        }
    }

    pub fn simulation(&self) -> &dyn Simulation {
        self.sim.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.finished || self.paused == paused {
            return;
        }
        self.paused = paused;
        log::info!("{} {}", self.sim.id().as_str(), if paused { "paused" } else { "resumed" });
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Queue a raw event for the next update
    pub fn queue_event(&mut self, event: InputEvent) {
        if !self.disposed && !self.finished {
            self.pending.push(event);
        }
    }

    pub fn set_quality(&mut self, quality: QualityPreset) {
        self.sim.set_quality(quality);
    }

    /// Run one animation frame. `hold` suspends updates on behalf of the
    /// host (tutorial or result overlay) without touching the pause flag.
    pub fn step(
        &mut self,
        now_ms: f64,
        hold: bool,
        input: &mut InputManager,
        audio: &mut AudioManager,
        painter: &mut dyn Painter,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        if self.disposed {
            return report;
        }

        let dt = match self.last_ms.replace(now_ms) {
            Some(prev) => clamp_dt(prev, now_ms),
            None => 0.0,
        };
        let fps = self.fps.tick(now_ms);

        if input.consume_press(Action::Pause) && !self.finished && !hold {
            self.toggle_pause();
            report.pause_toggled = true;
        }

        if self.paused || hold || self.sim.latch().is_ended() {
            self.pending.clear();
        } else {
            self.clock += dt;
            let events = std::mem::take(&mut self.pending);
            let mut frame = Frame {
                input,
                audio,
                events: &events,
            };
            self.sim.update(dt, &mut frame);
        }

        self.sim.draw(painter, self.clock);

        self.hud_timer += dt;
        if self.hud_timer >= HUD_REFRESH_SECS {
            self.hud_timer = 0.0;
            report.score = Some(self.sim.score());
            report.fps = Some(fps);
        }

        if !self.finished {
            if let Some(result) = self.sim.latch().result() {
                self.finished = true;
                self.pending.clear();
                log::info!(
                    "{} finished: score {} ({})",
                    self.sim.id().as_str(),
                    result.score,
                    if result.won { "won" } else { "lost" }
                );
                report.score = Some(result.score);
                report.result = Some(result.clone());
            }
        }

        report.keep_running = !self.finished;
        report
    }

    /// Stop for good. Safe to call any number of times, mid-run or after.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pending.clear();
        self.sim.dispose();
        log::debug!("{} runner disposed", self.sim.id().as_str());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::renderer::{DisplayList, colors};
    use crate::sim::{EndLatch, GameId};

    /// What the stopwatch observed, shared with the test
    #[derive(Default)]
    struct Seen {
        steps: Vec<f32>,
        events: Vec<InputEvent>,
        disposed: u32,
    }

    /// Counts updates and ends once `limit` simulated seconds pass
    struct Stopwatch {
        elapsed: f32,
        limit: f32,
        seen: Rc<RefCell<Seen>>,
        latch: EndLatch,
    }

    fn stopwatch(limit: f32) -> (GameRunner, Rc<RefCell<Seen>>) {
        let seen = Rc::new(RefCell::new(Seen::default()));
        let sim = Stopwatch {
            elapsed: 0.0,
            limit,
            seen: seen.clone(),
            latch: EndLatch::default(),
        };
        (GameRunner::new(Box::new(sim)), seen)
    }

    impl Simulation for Stopwatch {
        fn id(&self) -> GameId {
            GameId::NeonDodger
        }

        fn update(&mut self, dt: f32, frame: &mut Frame<'_>) {
            let mut seen = self.seen.borrow_mut();
            seen.steps.push(dt);
            seen.events.extend(frame.events.iter().cloned());
            self.elapsed += dt;
            if self.elapsed >= self.limit {
                self.latch.end(RunResult::new(seen.steps.len() as u32, true));
            }
        }

        fn draw(&self, painter: &mut dyn Painter, _time: f32) {
            painter.clear(colors::BACKGROUND);
        }

        fn score(&self) -> u32 {
            self.seen.borrow().steps.len() as u32
        }

        fn latch(&self) -> &EndLatch {
            &self.latch
        }

        fn dispose(&mut self) {
            self.seen.borrow_mut().disposed += 1;
        }
    }

    struct Harness {
        input: InputManager,
        audio: AudioManager,
        painter: DisplayList,
    }

    impl Harness {
        fn new() -> Self {
            let mut input = InputManager::new();
            input.attach();
            Self {
                input,
                audio: AudioManager::silent(),
                painter: DisplayList::new(),
            }
        }

        fn step(&mut self, runner: &mut GameRunner, now: f64, hold: bool) -> FrameReport {
            runner.step(now, hold, &mut self.input, &mut self.audio, &mut self.painter)
        }
    }

    #[test]
    fn test_dt_is_clamped() {
        assert_eq!(clamp_dt(0.0, 5000.0), MAX_FRAME_DT);
        assert_eq!(clamp_dt(100.0, 90.0), 0.0);
        assert!((clamp_dt(0.0, 16.0) - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_backgrounded_tab_advances_one_clamped_step() {
        let mut h = Harness::new();
        let (mut runner, seen) = stopwatch(100.0);
        h.step(&mut runner, 0.0, false);
        h.step(&mut runner, 5000.0, false);
        assert_eq!(seen.borrow().steps, vec![0.0, MAX_FRAME_DT]);
    }

    #[test]
    fn test_pause_suspends_update_but_draws() {
        let mut h = Harness::new();
        let (mut runner, seen) = stopwatch(100.0);
        h.step(&mut runner, 0.0, false);
        h.input.key_down("p");
        let report = h.step(&mut runner, 16.0, false);
        assert!(report.pause_toggled);
        assert!(runner.is_paused());
        let frames_before = h.painter.frames();
        h.step(&mut runner, 32.0, false);
        h.step(&mut runner, 48.0, false);
        assert_eq!(seen.borrow().steps.len(), 1);
        assert_eq!(h.painter.frames(), frames_before + 2);

        // Held key does not re-toggle; release and press again resumes
        h.step(&mut runner, 64.0, false);
        assert!(runner.is_paused());
        h.input.key_up("p");
        h.input.key_down("p");
        h.step(&mut runner, 80.0, false);
        assert!(!runner.is_paused());
        assert_eq!(seen.borrow().steps.len(), 2);
    }

    #[test]
    fn test_hold_suspends_without_pausing() {
        let mut h = Harness::new();
        let (mut runner, seen) = stopwatch(100.0);
        h.step(&mut runner, 0.0, true);
        h.step(&mut runner, 16.0, true);
        assert!(seen.borrow().steps.is_empty());
        assert!(!runner.is_paused());
        h.step(&mut runner, 32.0, false);
        assert_eq!(seen.borrow().steps.len(), 1);
    }

    #[test]
    fn test_result_emitted_once_then_stops() {
        let mut h = Harness::new();
        let (mut runner, seen) = stopwatch(0.05);
        let mut results = Vec::new();
        let mut t = 0.0;
        let mut last = FrameReport::default();
        for _ in 0..10 {
            last = h.step(&mut runner, t, false);
            if let Some(r) = last.result.clone() {
                results.push(r);
            }
            t += 20.0;
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 4);
        assert!(!last.keep_running);
        assert!(runner.is_finished());
        assert_eq!(seen.borrow().steps.len(), 4);
    }

    #[test]
    fn test_events_delivered_next_update_and_dropped_while_paused() {
        let mut h = Harness::new();
        let (mut runner, seen) = stopwatch(100.0);
        h.step(&mut runner, 0.0, false);
        runner.queue_event(InputEvent::Key("d".into()));
        h.step(&mut runner, 16.0, false);
        runner.set_paused(true);
        runner.queue_event(InputEvent::Key("f".into()));
        h.step(&mut runner, 32.0, false);
        runner.set_paused(false);
        h.step(&mut runner, 48.0, false);
        assert_eq!(seen.borrow().events, vec![InputEvent::Key("d".into())]);
    }

    #[test]
    fn test_hud_cadence() {
        let mut h = Harness::new();
        let (mut runner, _seen) = stopwatch(100.0);
        let mut reports = 0;
        let mut t = 0.0;
        for _ in 0..61 {
            if h.step(&mut runner, t, false).score.is_some() {
                reports += 1;
            }
            t += 1000.0 / 60.0;
        }
        // ~1 s of frames -> roughly ten HUD refreshes
        assert!((8..=10).contains(&reports), "reports {reports}");
    }

    #[test]
    fn test_dispose_idempotent() {
        let mut h = Harness::new();
        let (mut runner, seen) = stopwatch(100.0);
        h.step(&mut runner, 0.0, false);
        runner.dispose();
        runner.dispose();
        let report = h.step(&mut runner, 16.0, false);
        assert!(!report.keep_running);
        assert!(runner.is_disposed());
        assert_eq!(seen.borrow().disposed, 1);
        assert_eq!(seen.borrow().steps.len(), 1);
    }
}

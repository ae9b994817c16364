//! Play session host
//!
//! One `GameSession` per launched game. It owns the input and audio managers
//! for the whole session and rebuilds only the simulation on restart. The
//! host forwards browser events here and calls `frame` once per animation
//! frame.

use glam::Vec2;

use crate::audio::{AudioManager, SoundEffect};
use crate::consts::{HEIGHT, WIDTH};
use crate::input::{Action, InputEvent, InputManager};
use crate::renderer::{Color, Painter, TextAlign, colors};
use crate::settings::Settings;
use crate::sim::frame_loop::clamp_dt;
use crate::sim::{FrameReport, GameRunner, RunConfig, RunResult, games};

const SCANLINE: Color = [0.0, 0.0, 0.0, 0.18];

pub struct GameSession {
    config: RunConfig,
    input: InputManager,
    audio: AudioManager,
    runner: GameRunner,
    tutorial_open: bool,
    final_result: Option<RunResult>,
    /// Bumped on every restart
    run_id: u32,
    score: u32,
    fps: f64,
    last_ms: Option<f64>,
    quit: bool,
}

impl GameSession {
    /// Start a session. With `show_tutorial` the run is held behind the
    /// how-to-play card until the player dismisses it.
    pub fn new(config: RunConfig, audio: AudioManager, show_tutorial: bool) -> Self {
        let mut input = InputManager::new();
        input.attach();

        let mut audio = audio;
        audio.set_enabled(config.settings.sound);
        audio.set_music_enabled(config.settings.music);

        let runner = GameRunner::new(games::create(&config));
        Self {
            config,
            input,
            audio,
            runner,
            tutorial_open: show_tutorial,
            final_result: None,
            run_id: 0,
            score: 0,
            fps: 0.0,
            last_ms: None,
            quit: false,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn run_id(&self) -> u32 {
        self.run_id
    }

    /// Last score pushed to the HUD
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.final_result.as_ref()
    }

    pub fn is_tutorial_open(&self) -> bool {
        self.tutorial_open
    }

    pub fn is_paused(&self) -> bool {
        self.runner.is_paused()
    }

    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// The host keeps requesting frames while this holds
    pub fn keep_running(&self) -> bool {
        !self.quit && self.final_result.is_none()
    }

    /// One animation frame: step the runner, gate music, draw overlays.
    pub fn frame(&mut self, now_ms: f64, painter: &mut dyn Painter) -> FrameReport {
        if self.quit {
            return FrameReport::default();
        }
        let dt = match self.last_ms.replace(now_ms) {
            Some(prev) => clamp_dt(prev, now_ms),
            None => 0.0,
        };

        let hold = self.tutorial_open || self.final_result.is_some();
        let report = self
            .runner
            .step(now_ms, hold, &mut self.input, &mut self.audio, painter);

        if let Some(score) = report.score {
            self.score = score;
        }
        if let Some(fps) = report.fps {
            self.fps = fps;
        }
        if let Some(result) = &report.result {
            self.final_result = Some(result.clone());
        }

        self.sync_music();
        self.audio.pump(dt);
        self.draw_overlay(painter);
        report
    }

    fn sync_music(&mut self) {
        let wanted = !self.runner.is_paused() && !self.tutorial_open && self.final_result.is_none();
        if wanted {
            self.audio.start_music(self.config.seed);
        } else {
            self.audio.stop_music();
        }
    }

    /// Close the tutorial card. This is a user gesture, so audio is unlocked here.
    pub fn dismiss_tutorial(&mut self) {
        if !self.tutorial_open {
            return;
        }
        self.tutorial_open = false;
        self.audio.unlock();
        self.audio.play(SoundEffect::Ui);
        log::info!("{} tutorial dismissed", self.config.game.as_str());
    }

    /// Pause button. Ignored behind the tutorial or result overlay.
    pub fn toggle_pause(&mut self) {
        if self.quit || self.tutorial_open || self.final_result.is_some() {
            return;
        }
        self.runner.toggle_pause();
        self.audio.play(SoundEffect::Ui);
    }

    /// Window lost focus
    pub fn blur(&mut self) {
        if self.quit {
            return;
        }
        self.input.release_all();
        if !self.tutorial_open && self.final_result.is_none() {
            self.runner.set_paused(true);
        }
    }

    /// Fresh simulation from the same config and seed
    pub fn restart(&mut self) {
        if self.quit {
            return;
        }
        self.runner.dispose();
        self.runner = GameRunner::new(games::create(&self.config));
        self.final_result = None;
        self.score = 0;
        self.last_ms = None;
        self.run_id += 1;
        self.input.release_all();
        self.audio.stop_music();
        log::info!("{} restarted (run {})", self.config.game.as_str(), self.run_id);
    }

    /// Key pressed. Returns true when the host should suppress the browser default.
    pub fn key_down(&mut self, key: &str) -> bool {
        if self.quit {
            return false;
        }
        if self.tutorial_open {
            if matches!(Action::from_key(key), Some(Action::Action)) {
                self.dismiss_tutorial();
                return true;
            }
            return Action::from_key(key).is_some();
        }
        if self.final_result.is_some() && key.eq_ignore_ascii_case("r") {
            self.restart();
            return true;
        }

        self.audio.unlock();
        let mapped = self.input.key_down(key);
        self.runner.queue_event(InputEvent::Key(key.to_string()));
        mapped
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        if self.quit {
            return false;
        }
        self.input.key_up(key)
    }

    /// Pointer pressed, already mapped into playfield coordinates
    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.quit {
            return;
        }
        if self.tutorial_open {
            self.dismiss_tutorial();
            return;
        }
        self.audio.unlock();
        self.runner.queue_event(InputEvent::PointerDown(pos));
    }

    pub fn pointer_up(&mut self, pos: Vec2) {
        if !self.quit {
            self.runner.queue_event(InputEvent::PointerUp(pos));
        }
    }

    /// On-screen touch button
    pub fn set_virtual(&mut self, action: Action, down: bool) {
        if self.quit {
            return;
        }
        if self.tutorial_open {
            if down && action == Action::Action {
                self.dismiss_tutorial();
            }
            return;
        }
        if down {
            self.audio.unlock();
        }
        self.input.set_virtual(action, down);
    }

    /// Settings changed mid-session. Quality applies to new particles only.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.audio.set_enabled(settings.sound);
        self.audio.set_music_enabled(settings.music);
        self.runner.set_quality(settings.quality);
        self.config.settings = settings;
    }

    /// Tear down runner, listeners and audio. Idempotent.
    pub fn quit(&mut self) {
        if self.quit {
            return;
        }
        self.quit = true;
        self.runner.dispose();
        self.input.detach();
        self.audio.dispose();
        log::info!("{} session closed", self.config.game.as_str());
    }

    fn draw_overlay(&self, painter: &mut dyn Painter) {
        painter.set_offset(Vec2::ZERO);
        painter.set_glow(0.0, colors::TEXT);
        let center = Vec2::new(WIDTH / 2.0, HEIGHT / 2.0);

        if self.tutorial_open {
            painter.fill_rect(0.0, 0.0, WIDTH, HEIGHT, colors::OVERLAY);
            painter.text(
                self.config.game.title(),
                center - Vec2::new(0.0, 90.0),
                34.0,
                colors::CYAN,
                TextAlign::Center,
            );
            for (i, line) in self.config.game.tutorial().iter().enumerate() {
                let pos = center + Vec2::new(0.0, -30.0 + i as f32 * 30.0);
                painter.text(line, pos, 18.0, colors::TEXT, TextAlign::Center);
            }
            painter.text(
                "Press Space or tap to start",
                center + Vec2::new(0.0, 110.0),
                18.0,
                colors::GOLD,
                TextAlign::Center,
            );
        } else if let Some(result) = &self.final_result {
            painter.fill_rect(0.0, 0.0, WIDTH, HEIGHT, colors::OVERLAY);
            let (headline, color) = if result.won {
                ("YOU WIN", colors::GREEN)
            } else {
                ("GAME OVER", colors::RED)
            };
            painter.set_glow(18.0, color);
            painter.text(headline, center - Vec2::new(0.0, 40.0), 42.0, color, TextAlign::Center);
            painter.set_glow(0.0, color);
            painter.text(
                &format!("Score {}", result.score),
                center + Vec2::new(0.0, 10.0),
                24.0,
                colors::TEXT,
                TextAlign::Center,
            );
            painter.text(
                "Press R to play again",
                center + Vec2::new(0.0, 60.0),
                16.0,
                colors::DIM,
                TextAlign::Center,
            );
        } else if self.runner.is_paused() {
            painter.fill_rect(0.0, 0.0, WIDTH, HEIGHT, colors::OVERLAY);
            painter.text("PAUSED", center, 40.0, colors::CYAN, TextAlign::Center);
            painter.text(
                "Press P to resume",
                center + Vec2::new(0.0, 44.0),
                16.0,
                colors::DIM,
                TextAlign::Center,
            );
        }

        if self.config.settings.scanlines {
            let mut y = 0.0;
            while y < HEIGHT {
                painter.fill_rect(0.0, y, WIDTH, 1.0, SCANLINE);
                y += 3.0;
            }
        }

        if self.config.settings.show_fps {
            painter.text(
                &format!("{:.0} FPS", self.fps),
                Vec2::new(WIDTH - 16.0, 26.0),
                14.0,
                colors::DIM,
                TextAlign::Right,
            );
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Played, Recorder};
    use crate::renderer::{DisplayList, DrawCommand};
    use crate::settings::Difficulty;
    use crate::sim::GameId;

    const FRAME_MS: f64 = 1000.0 / 30.0;

    struct Host {
        session: GameSession,
        painter: DisplayList,
        now: f64,
    }

    impl Host {
        fn new(game: GameId, difficulty: Difficulty, tutorial: bool, rec: &Recorder) -> Self {
            let config = RunConfig::new(game, difficulty, 99);
            Self {
                session: GameSession::new(config, rec.manager(), tutorial),
                painter: DisplayList::new(),
                now: 0.0,
            }
        }

        fn frames(&mut self, n: usize) -> Vec<FrameReport> {
            (0..n)
                .map(|_| {
                    let report = self.session.frame(self.now, &mut self.painter);
                    self.now += FRAME_MS;
                    report
                })
                .collect()
        }
    }

    #[test]
    fn test_tutorial_holds_run_and_music() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::NeonDodger, Difficulty::Easy, true, &rec);
        host.frames(30);
        assert!(host.session.is_tutorial_open());
        assert!(!host.session.audio().is_music_playing());
        assert!(host.painter.text_dump().contains("Neon Dodger"));
        assert!(rec.take().is_empty());

        // Dismissing unlocks audio and blips; the key is not forwarded
        assert!(host.session.key_down(" "));
        assert!(!host.session.is_tutorial_open());
        let played = rec.take();
        assert_eq!(played.first(), Some(&Played::Resume));
        assert!(played.iter().any(|p| matches!(p, Played::Tone(_))));
        assert!(!host.session.input().is_down(Action::Action));

        host.frames(60);
        assert!(host.session.audio().is_music_playing());
        assert!(!rec.music_notes().is_empty());
    }

    #[test]
    fn test_pointer_dismisses_tutorial() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::RhythmTap, Difficulty::Easy, true, &rec);
        host.session.pointer_down(Vec2::new(100.0, 100.0));
        assert!(!host.session.is_tutorial_open());
    }

    #[test]
    fn test_pause_stops_music() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::NeonDodger, Difficulty::Easy, false, &rec);
        host.frames(5);
        assert!(host.session.audio().is_music_playing());

        host.session.key_down("p");
        host.frames(1);
        assert!(host.session.is_paused());
        assert!(!host.session.audio().is_music_playing());
        assert!(host.painter.text_dump().contains("PAUSED"));

        host.session.key_up("p");
        host.session.key_down("p");
        host.frames(1);
        assert!(!host.session.is_paused());
        assert!(host.session.audio().is_music_playing());
    }

    #[test]
    fn test_blur_pauses_and_releases_keys() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::NeonDodger, Difficulty::Easy, false, &rec);
        host.frames(2);
        host.session.key_down("ArrowLeft");
        assert!(host.session.input().is_down(Action::Left));
        host.session.blur();
        assert!(host.session.is_paused());
        assert!(!host.session.input().is_down(Action::Left));
    }

    #[test]
    fn test_result_surfaces_once_then_restart() {
        let rec = Recorder::default();
        // Untouched memory board runs out of time
        let mut host = Host::new(GameId::MemoryMatch, Difficulty::Hard, false, &rec);
        let mut results = 0;
        for _ in 0..4000 {
            if host.frames(1)[0].result.is_some() {
                results += 1;
            }
        }
        assert_eq!(results, 1);
        let result = host.session.result().cloned().expect("timed out");
        assert!(!result.won);
        assert!(!host.session.keep_running());
        assert!(!host.session.audio().is_music_playing());
        assert!(host.painter.text_dump().contains("GAME OVER"));

        assert!(host.session.key_down("r"));
        assert_eq!(host.session.run_id(), 1);
        assert!(host.session.result().is_none());
        assert!(host.session.keep_running());
        host.frames(1);
        assert!(!host.painter.text_dump().contains("GAME OVER"));
    }

    #[test]
    fn test_restart_replays_same_seed() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::NeonDodger, Difficulty::Normal, false, &rec);
        host.frames(90);
        let first = host.painter.commands.clone();

        host.session.restart();
        host.now = 0.0;
        host.frames(90);
        assert_eq!(host.painter.commands, first);
    }

    #[test]
    fn test_settings_apply_mid_session() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::NeonDodger, Difficulty::Easy, false, &rec);
        host.frames(3);
        assert!(host.session.audio().is_music_playing());

        host.session.apply_settings(Settings {
            sound: false,
            music: false,
            show_fps: true,
            ..Settings::default()
        });
        host.frames(3);
        assert!(!host.session.audio().is_music_playing());
        assert!(host.painter.text_dump().contains("FPS"));
    }

    #[test]
    fn test_scanlines_follow_settings() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::Fusion2048, Difficulty::Easy, false, &rec);
        let is_scanline = |c: &DrawCommand| matches!(c, DrawCommand::FillRect { h, color, .. } if *h == 1.0 && *color == SCANLINE);
        host.frames(1);
        assert_eq!(host.painter.count(is_scanline), 180);

        host.session.apply_settings(Settings {
            scanlines: false,
            ..Settings::default()
        });
        host.frames(1);
        assert_eq!(host.painter.count(is_scanline), 0);
    }

    #[test]
    fn test_quit_is_idempotent() {
        let rec = Recorder::default();
        let mut host = Host::new(GameId::PongNeon, Difficulty::Easy, false, &rec);
        host.session.key_down("w");
        host.frames(3);
        host.session.quit();
        host.session.quit();
        assert!(host.session.is_quit());
        assert!(!host.session.input().is_attached());
        assert_eq!(rec.take().iter().filter(|p| **p == Played::Close).count(), 1);

        let report = host.frames(1).remove(0);
        assert!(!report.keep_running);
        assert!(!host.session.key_down("w"));
    }
}

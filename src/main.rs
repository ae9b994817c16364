//! Neon Arcade entry point
//!
//! In the browser this is the play-page shell: it reads the launch query
//! string, attaches the canvas, wires listeners and drives the frame loop.
//! Natively it plays every game headlessly and logs the results.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Launch parameters (`game`, `difficulty`, `mode`, `seed`, `daily`)
mod launch {
    use chrono::NaiveDate;
    use neon_arcade::daily::{self, DailyChallenge};
    use neon_arcade::sim::{GameId, RunConfig};
    use neon_arcade::{ArcadeError, Difficulty, Result, Settings};

    pub struct Launch {
        pub config: RunConfig,
        /// Set when launched as today's challenge
        pub daily: Option<DailyChallenge>,
    }

    /// Resolve a run from loosely typed parameters. `daily=1` overrides both
    /// game and seed; an unknown game id is an error, anything else falls back.
    pub fn resolve(
        param: &dyn Fn(&str) -> Option<String>,
        today: NaiveDate,
        fallback_seed: u32,
        settings: Settings,
    ) -> Result<Launch> {
        let daily = match param("daily").as_deref() {
            Some("1") => daily::pick_daily_challenge(&GameId::ALL, today),
            _ => None,
        };

        let game = match (&daily, param("game")) {
            (Some(challenge), _) => challenge.game,
            (None, Some(id)) => {
                GameId::from_str(&id).ok_or_else(|| ArcadeError::UnknownGame(id.clone()))?
            }
            (None, None) => GameId::ALL[0],
        };

        let seed = match &daily {
            Some(challenge) => challenge.seed,
            None => param("seed")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(fallback_seed),
        };

        let difficulty = param("difficulty").unwrap_or_else(|| Difficulty::default().as_str().to_string());
        let mode = param("mode");
        let config = RunConfig::resolve(game, &difficulty, mode.as_deref(), seed, settings);
        Ok(Launch { config, daily })
    }

    #[cfg(test)]
    mod tests {
        use std::collections::HashMap;

        use super::*;

        fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        }

        fn run(pairs: &[(&str, &str)]) -> Result<Launch> {
            let map = params(pairs);
            let today = NaiveDate::from_ymd_opt(2026, 2, 13).expect("valid date");
            resolve(&|name| map.get(name).cloned(), today, 7, Settings::default())
        }

        #[test]
        fn test_explicit_launch() {
            let launch = run(&[("game", "pong-neon"), ("difficulty", "hard"), ("mode", "duel"), ("seed", "42")])
                .expect("valid launch");
            assert_eq!(launch.config.game, GameId::PongNeon);
            assert_eq!(launch.config.difficulty, Difficulty::Hard);
            assert_eq!(launch.config.mode, "duel");
            assert_eq!(launch.config.seed, 42);
            assert!(launch.daily.is_none());
        }

        #[test]
        fn test_defaults_and_fallbacks() {
            let launch = run(&[("difficulty", "insane"), ("mode", "duel"), ("seed", "x")]).expect("valid launch");
            assert_eq!(launch.config.game, GameId::NeonDodger);
            assert_eq!(launch.config.difficulty, Difficulty::Easy);
            assert_eq!(launch.config.mode, "single");
            assert_eq!(launch.config.seed, 7);
        }

        #[test]
        fn test_daily_overrides_game_and_seed() {
            let launch = run(&[("daily", "1"), ("game", "pong-neon"), ("seed", "5")]).expect("valid launch");
            let challenge = launch.daily.expect("daily challenge");
            assert_eq!(challenge.date_key, "2026-02-13");
            assert_eq!(launch.config.game, challenge.game);
            assert_eq!(launch.config.seed, challenge.seed);
        }

        #[test]
        fn test_unknown_game_is_rejected() {
            assert!(matches!(run(&[("game", "tetris")]), Err(ArcadeError::UnknownGame(id)) if id == "tetris"));
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web_shell {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, Event, EventTarget, KeyboardEvent, PointerEvent, UrlSearchParams, Window};

    use neon_arcade::audio::AudioManager;
    use neon_arcade::daily::{self, DailyChallenge};
    use neon_arcade::input::Action;
    use neon_arcade::renderer::Canvas2dPainter;
    use neon_arcade::session::GameSession;
    use neon_arcade::sim::RunResult;
    use neon_arcade::{ArcadeError, ProgressState, Result, Settings, achievements};

    use super::launch;

    const CANVAS_ID: &str = "arcade";

    thread_local! {
        static SHELL: RefCell<Option<Rc<RefCell<Shell>>>> = const { RefCell::new(None) };
    }

    /// A registered DOM listener; dropping it unregisters the callback
    struct Listener {
        target: EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    }

    impl Listener {
        fn new(target: &EventTarget, kind: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self> {
            let callback = Closure::<dyn FnMut(Event)>::new(handler);
            target
                .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
                .map_err(|_| ArcadeError::Browser(format!("cannot listen for {kind}")))?;
            Ok(Self {
                target: target.clone(),
                kind,
                callback,
            })
        }
    }

    impl Drop for Listener {
        fn drop(&mut self) {
            let _ = self
                .target
                .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
        }
    }

    /// Everything the play page holds for one session
    struct Shell {
        session: GameSession,
        painter: Canvas2dPainter,
        progress: ProgressState,
        daily: Option<DailyChallenge>,
        raf: Option<i32>,
        listeners: Vec<Listener>,
    }

    impl Shell {
        /// Feed a finished run to progress, daily best and achievements
        fn record(&mut self, result: &RunResult) {
            let config = self.session.config();
            let game = config.game;
            self.progress.record_result(game, config.difficulty, result);

            if let Some(challenge) = &self.daily {
                if self.progress.record_daily_best(&challenge.date_key, game, result.score) {
                    log::info!("New daily best: {}", result.score);
                }
            }

            let unlocked = achievements::evaluate(&self.progress, game, &config.mode, result);
            for id in &unlocked {
                if let Some(achievement) = achievements::find(id) {
                    log::info!("Achievement unlocked: {}", achievement.title);
                }
            }
            self.progress.unlock_achievements(&unlocked);

            if let Err(e) = self.progress.save() {
                log::warn!("Progress not saved: {}", e);
            }
        }

        fn cancel_frame(&mut self) {
            if let (Some(id), Some(window)) = (self.raf.take(), web_sys::window()) {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }

    impl Drop for Shell {
        fn drop(&mut self) {
            self.cancel_frame();
            self.listeners.clear();
            self.session.quit();
        }
    }

    pub fn run() -> Result<()> {
        let window = web_sys::window().ok_or_else(|| ArcadeError::Browser("no window".into()))?;
        let search = window.location().search().unwrap_or_default();
        let params = UrlSearchParams::new_with_str(&search)
            .map_err(|_| ArcadeError::Browser("unreadable query string".into()))?;

        let fallback_seed = js_sys::Date::now() as u64 as u32;
        let launch = launch::resolve(&|name| params.get(name), daily::today(), fallback_seed, Settings::load())?;
        let painter = Canvas2dPainter::attach(CANVAS_ID)?;

        let mut progress = ProgressState::load();
        let game = launch.config.game;
        let show_tutorial = !progress.tutorial_seen(game);
        if show_tutorial {
            progress.mark_tutorial_seen(game);
            if let Err(e) = progress.save() {
                log::warn!("Progress not saved: {}", e);
            }
        }

        let session = GameSession::new(launch.config, AudioManager::default(), show_tutorial);
        let shell = Rc::new(RefCell::new(Shell {
            session,
            painter,
            progress,
            daily: launch.daily,
            raf: None,
            listeners: Vec::new(),
        }));

        let listeners = listen(&window, &shell)?;
        shell.borrow_mut().listeners = listeners;
        SHELL.with(|slot| *slot.borrow_mut() = Some(shell.clone()));
        schedule(&shell);

        log::info!("{} running", game.title());
        Ok(())
    }

    /// Put a launch failure where the player can see it
    pub fn show_error(error: &ArcadeError) {
        let status = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("status"));
        if let Some(el) = status {
            el.set_text_content(Some(&error.to_string()));
        }
    }

    /// Tear the session down. Later calls are no-ops.
    fn quit() {
        let shell = SHELL.with(|slot| slot.borrow_mut().take());
        if shell.is_some() {
            log::info!("Leaving play page");
        }
    }

    fn schedule(shell: &Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let weak = Rc::downgrade(shell);
        let callback = Closure::once_into_js(move |time: f64| {
            if let Some(shell) = weak.upgrade() {
                tick(&shell, time);
            }
        });
        match window.request_animation_frame(callback.unchecked_ref()) {
            Ok(id) => shell.borrow_mut().raf = Some(id),
            Err(_) => log::error!("requestAnimationFrame refused"),
        }
    }

    fn tick(shell: &Rc<RefCell<Shell>>, time: f64) {
        let keep_running = {
            let mut guard = shell.borrow_mut();
            let s = &mut *guard;
            s.raf = None;
            let report = s.session.frame(time, &mut s.painter);
            if let Some(result) = &report.result {
                s.record(result);
            }
            s.session.keep_running()
        };
        if keep_running {
            schedule(shell);
        }
    }

    /// Restart the frame loop if a key brought a finished run back
    fn resume_if_idle(shell: &Rc<RefCell<Shell>>) {
        let idle = {
            let s = shell.borrow();
            s.raf.is_none() && s.session.keep_running()
        };
        if idle {
            schedule(shell);
        }
    }

    fn action_named(name: &str) -> Option<Action> {
        match name {
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "up" => Some(Action::Up),
            "down" => Some(Action::Down),
            "action" => Some(Action::Action),
            "action2" => Some(Action::Action2),
            "pause" => Some(Action::Pause),
            _ => None,
        }
    }

    fn with_shell<E: JsCast>(weak: &Weak<RefCell<Shell>>, event: &Event, f: impl FnOnce(&Rc<RefCell<Shell>>, &E)) {
        if let (Some(shell), Some(event)) = (weak.upgrade(), event.dyn_ref::<E>()) {
            f(&shell, event);
        }
    }

    fn listen(window: &Window, shell: &Rc<RefCell<Shell>>) -> Result<Vec<Listener>> {
        let document = window
            .document()
            .ok_or_else(|| ArcadeError::Browser("no document".into()))?;
        let canvas = shell.borrow().painter.canvas().clone();
        let mut listeners = Vec::new();

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(window, "keydown", move |event| {
            with_shell::<KeyboardEvent>(&weak, &event, |shell, event| {
                let key = event.key();
                let handled = {
                    let mut s = shell.borrow_mut();
                    if event.repeat() {
                        Action::from_key(&key).is_some()
                    } else {
                        s.session.key_down(&key)
                    }
                };
                if handled {
                    event.prevent_default();
                }
                resume_if_idle(shell);
            });
        })?);

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(window, "keyup", move |event| {
            with_shell::<KeyboardEvent>(&weak, &event, |shell, event| {
                if shell.borrow_mut().session.key_up(&event.key()) {
                    event.prevent_default();
                }
            });
        })?);

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(&canvas, "pointerdown", move |event| {
            with_shell::<PointerEvent>(&weak, &event, |shell, event| {
                event.prevent_default();
                let mut s = shell.borrow_mut();
                let pos = s.painter.to_playfield(event.client_x() as f64, event.client_y() as f64);
                s.session.pointer_down(pos);
            });
        })?);

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(&canvas, "pointerup", move |event| {
            with_shell::<PointerEvent>(&weak, &event, |shell, event| {
                let mut s = shell.borrow_mut();
                let pos = s.painter.to_playfield(event.client_x() as f64, event.client_y() as f64);
                s.session.pointer_up(pos);
            });
        })?);

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(window, "blur", move |_| {
            if let Some(shell) = weak.upgrade() {
                shell.borrow_mut().session.blur();
                log::info!("Auto-paused (window blur)");
            }
        })?);

        let weak = Rc::downgrade(shell);
        let doc = document.clone();
        listeners.push(Listener::new(&document, "visibilitychange", move |_| {
            if doc.visibility_state() != web_sys::VisibilityState::Hidden {
                return;
            }
            if let Some(shell) = weak.upgrade() {
                shell.borrow_mut().session.blur();
                log::info!("Auto-paused (tab hidden)");
            }
        })?);

        listeners.push(Listener::new(window, "pagehide", |_| quit())?);

        // On-screen touch buttons: <button data-action="left">
        let buttons = document
            .query_selector_all("[data-action]")
            .map_err(|_| ArcadeError::Browser("touch button query failed".into()))?;
        for i in 0..buttons.length() {
            let Some(button) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let Some(action) = button.get_attribute("data-action").as_deref().and_then(action_named) else {
                continue;
            };
            for (kind, down) in [
                ("pointerdown", true),
                ("pointerup", false),
                ("pointerleave", false),
                ("pointercancel", false),
            ] {
                let weak = Rc::downgrade(shell);
                listeners.push(Listener::new(&button, kind, move |event| {
                    if down {
                        event.prevent_default();
                    }
                    if let Some(shell) = weak.upgrade() {
                        shell.borrow_mut().session.set_virtual(action, down);
                    }
                })?);
            }
        }

        log::debug!("{} listeners attached", listeners.len());
        Ok(listeners)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }

    log::info!("Neon Arcade starting...");
    if let Err(e) = web_shell::run() {
        log::error!("Launch failed: {}", e);
        web_shell::show_error(&e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

/// Longest simulated time a headless run gets before it is abandoned
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_LIMIT_MS: f64 = 180_000.0;

/// Headless tour: `neon-arcade [game=<id>] [difficulty=..] [mode=..] [seed=..] [daily=1]`.
/// Without a game every cabinet is played untouched and its result logged.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::collections::HashMap;

    use neon_arcade::audio::AudioManager;
    use neon_arcade::sim::{GameId, RunConfig};
    use neon_arcade::{ProgressState, Settings, daily};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Neon Arcade (native) starting...");

    let args: HashMap<String, String> = std::env::args()
        .skip(1)
        .filter_map(|arg| arg.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect();

    let configs = if args.contains_key("game") || args.contains_key("daily") {
        match launch::resolve(&|name| args.get(name).cloned(), daily::today(), 1, Settings::default()) {
            Ok(launch) => vec![launch.config],
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(2);
            }
        }
    } else {
        GameId::ALL
            .into_iter()
            .map(|game| {
                let difficulty = args.get("difficulty").map(String::as_str).unwrap_or("normal");
                let seed = args.get("seed").and_then(|s| s.parse().ok()).unwrap_or(1);
                RunConfig::resolve(game, difficulty, None, seed, Settings::default())
            })
            .collect()
    };

    let mut progress = ProgressState::new();
    for config in configs {
        play_headless(config, AudioManager::silent(), &mut progress);
    }

    if let Some(challenge) = daily::pick_daily_challenge(&GameId::ALL, daily::today()) {
        log::info!(
            "Daily challenge {}: {} (seed {})",
            challenge.date_key,
            challenge.game.title(),
            challenge.seed
        );
    }
    if !progress.achievements.is_empty() {
        log::info!("Achievements: {}", progress.achievements.join(", "));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn play_headless(
    config: neon_arcade::sim::RunConfig,
    audio: neon_arcade::audio::AudioManager,
    progress: &mut neon_arcade::ProgressState,
) {
    use neon_arcade::achievements;
    use neon_arcade::renderer::DisplayList;
    use neon_arcade::session::GameSession;

    let game = config.game;
    let difficulty = config.difficulty;
    let mode = config.mode.clone();
    let mut session = GameSession::new(config, audio, false);
    let mut painter = DisplayList::new();

    let mut now = 0.0;
    let mut outcome = None;
    while now <= HEADLESS_LIMIT_MS {
        if let Some(result) = session.frame(now, &mut painter).result {
            outcome = Some(result);
            break;
        }
        now += 1000.0 / 60.0;
    }
    session.quit();

    match outcome {
        Some(result) => {
            log::info!(
                "{:<20} {:>7} {:<4} after {:>5.1}s {:?}",
                game.title(),
                result.score,
                if result.won { "won" } else { "lost" },
                now / 1000.0,
                result.stats
            );
            progress.record_result(game, difficulty, &result);
            let unlocked = achievements::evaluate(progress, game, &mode, &result);
            progress.unlock_achievements(&unlocked);
        }
        None => log::info!(
            "{:<20} still running after {}s without input",
            game.title(),
            HEADLESS_LIMIT_MS / 1000.0
        ),
    }
}

//! Input manager
//!
//! Folds keyboard and on-screen (virtual) buttons into a fixed set of logical
//! actions with held and edge-triggered queries.

use std::collections::HashSet;

use glam::Vec2;

/// Logical actions every game reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Primary action (fire, jump, flip)
    Action,
    /// Secondary action
    Action2,
    Pause,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Action,
        Action::Action2,
        Action::Pause,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Fixed key binding. Tries the exact key name first, then lowercase.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::lookup(key).or_else(|| Self::lookup(&key.to_lowercase()))
    }

    fn lookup(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" => Some(Action::Left),
            "ArrowRight" | "d" => Some(Action::Right),
            "ArrowUp" | "w" => Some(Action::Up),
            "ArrowDown" | "s" => Some(Action::Down),
            " " | "Enter" => Some(Action::Action),
            "Shift" | "e" => Some(Action::Action2),
            "Escape" | "p" => Some(Action::Pause),
            _ => None,
        }
    }
}

/// One flag per action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet([bool; 7]);

impl ActionSet {
    pub fn contains(&self, action: Action) -> bool {
        self.0[action.index()]
    }

    pub fn insert(&mut self, action: Action) {
        self.0[action.index()] = true;
    }

    pub fn remove(&mut self, action: Action) -> bool {
        std::mem::replace(&mut self.0[action.index()], false)
    }

    pub fn clear(&mut self) {
        self.0 = [false; 7];
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&b| b)
    }
}

/// Raw events delivered to a simulation at the start of its next update,
/// in playfield coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Key name as reported by the browser (`"d"`, `"ArrowUp"`, ...)
    Key(String),
    PointerDown(Vec2),
    PointerUp(Vec2),
}

/// Keyboard + virtual button state for one play session
#[derive(Debug, Default)]
pub struct InputManager {
    down: ActionSet,
    pressed: ActionSet,
    virtual_down: ActionSet,
    /// Lowercased physical key names currently held
    raw_keys: HashSet<String>,
    attached: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting key events. Idempotent.
    pub fn attach(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        log::debug!("Input attached");
    }

    /// Stop accepting key events and drop all held/pressed state. Idempotent.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.down.clear();
        self.pressed.clear();
        self.virtual_down.clear();
        self.raw_keys.clear();
        log::debug!("Input detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Key pressed. Returns true if the key maps to an action, so the host
    /// can suppress the browser default (page scroll on arrows/space).
    pub fn key_down(&mut self, key: &str) -> bool {
        if !self.attached {
            return false;
        }
        self.raw_keys.insert(key.to_lowercase());
        let Some(action) = Action::from_key(key) else {
            return false;
        };
        // Auto-repeat must not re-arm the edge
        if !self.down.contains(action) {
            self.pressed.insert(action);
        }
        self.down.insert(action);
        true
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        if !self.attached {
            return false;
        }
        self.raw_keys.remove(&key.to_lowercase());
        match Action::from_key(key) {
            Some(action) => {
                self.down.remove(action);
                true
            }
            None => false,
        }
    }

    /// Held by keyboard or virtual button
    pub fn is_down(&self, action: Action) -> bool {
        self.down.contains(action) || self.virtual_down.contains(action)
    }

    /// True once per press
    pub fn consume_press(&mut self, action: Action) -> bool {
        self.pressed.remove(action)
    }

    /// Hold or release a touch button; an up→down transition raises a press edge
    pub fn set_virtual(&mut self, action: Action, down: bool) {
        if down {
            if !self.virtual_down.contains(action) {
                self.pressed.insert(action);
            }
            self.virtual_down.insert(action);
        } else {
            self.virtual_down.remove(action);
        }
    }

    pub fn clear_virtual(&mut self) {
        self.virtual_down.clear();
    }

    /// Forget every held key and pending press (focus lost, run restarted)
    pub fn release_all(&mut self) {
        self.down.clear();
        self.pressed.clear();
        self.virtual_down.clear();
        self.raw_keys.clear();
    }

    pub fn is_virtual_down(&self, action: Action) -> bool {
        self.virtual_down.contains(action)
    }

    /// Physical key held, by lowercased browser key name (`"w"`, `"arrowup"`)
    pub fn is_key_down(&self, key: &str) -> bool {
        self.raw_keys.contains(&key.to_lowercase())
    }
}

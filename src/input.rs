//! Keyboard and touch input
//!
//! Event handlers only record which key codes are down; the frame loop turns
//! that map into a [`TickInput`] once per frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sim::{Heading, TickInput};

/// Currently held key codes (`KeyboardEvent.code` values)
#[derive(Debug, Clone, Default)]
pub struct KeysHeld {
    held: HashMap<String, bool>,
}

impl KeysHeld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key state; the last write wins
    pub fn set(&mut self, code: &str, down: bool) {
        self.held.insert(code.to_owned(), down);
    }

    pub fn press(&mut self, code: &str) {
        self.set(code, true);
    }

    pub fn release(&mut self, code: &str) {
        self.set(code, false);
    }

    pub fn is_held(&self, code: &str) -> bool {
        self.held.get(code).copied().unwrap_or(false)
    }

    /// Release everything (focus loss)
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Key codes bound to each action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub fire: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let codes = |list: &[&str]| -> Vec<String> { list.iter().map(|c| c.to_string()).collect() };
        Self {
            up: codes(&["ArrowUp", "KeyW"]),
            down: codes(&["ArrowDown", "KeyS"]),
            left: codes(&["ArrowLeft", "KeyA"]),
            right: codes(&["ArrowRight", "KeyD"]),
            fire: codes(&["Space"]),
        }
    }
}

impl KeyBindings {
    /// Whether `code` is bound to any action (used to suppress page scrolling)
    pub fn is_bound(&self, code: &str) -> bool {
        [&self.up, &self.down, &self.left, &self.right, &self.fire]
            .iter()
            .any(|list| list.iter().any(|c| c == code))
    }
}

fn any_held(keys: &KeysHeld, codes: &[String]) -> bool {
    codes.iter().any(|code| keys.is_held(code))
}

impl TickInput {
    /// Resolve held keys into one step's input.
    ///
    /// Only one direction applies per step; when several are held the
    /// priority is Up, Down, Left, Right.
    pub fn from_keys(keys: &KeysHeld, bindings: &KeyBindings) -> Self {
        let direction = if any_held(keys, &bindings.up) {
            Some(Heading::Up)
        } else if any_held(keys, &bindings.down) {
            Some(Heading::Down)
        } else if any_held(keys, &bindings.left) {
            Some(Heading::Left)
        } else if any_held(keys, &bindings.right) {
            Some(Heading::Right)
        } else {
            None
        };

        Self {
            direction,
            fire: any_held(keys, &bindings.fire),
        }
    }
}

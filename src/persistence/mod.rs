//! Key-value persistence
//!
//! Everything the game keeps between visits is JSON under a handful of
//! versioned keys in a string key-value store: LocalStorage in the browser,
//! an in-memory map natively and in tests.

pub mod profiles;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::session::GameMode;

pub use profiles::{ProfileError, ProfileStore};

/// Storage keys
pub mod keys {
    pub const USERS: &str = "tank_strike_users_v3";
    pub const RANKING: &str = "tank_strike_ranking_v3";
    pub const SESSION: &str = "tank_strike_session_v3";
    pub const GAME_STATE: &str = "tank_strike_game_state_v3";
    pub const SETTINGS: &str = "tank_strike_settings_v3";
}

/// Errors from the storage backend
#[derive(Debug)]
pub enum StorageError {
    /// No storage available (private browsing, no window)
    Unavailable,
    /// The backend rejected the operation (quota, security)
    Backend(String),
    /// A value could not be encoded
    Encode(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "storage unavailable"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {}", msg),
            StorageError::Encode(err) => write!(f, "failed to encode value: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encode(err)
    }
}

/// String key-value store
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// In-memory store for native builds and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsValue;

    use super::{Storage, StorageError};

    fn backend(err: JsValue) -> StorageError {
        StorageError::Backend(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
    }

    /// Browser `window.localStorage`
    #[derive(Clone)]
    pub struct LocalStorage {
        inner: web_sys::Storage,
    }

    impl LocalStorage {
        pub fn open() -> Result<Self, StorageError> {
            let inner = web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or(StorageError::Unavailable)?;
            Ok(Self { inner })
        }
    }

    impl Storage for LocalStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key).map_err(backend)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value).map_err(backend)
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key).map_err(backend)
        }
    }
}

/// Read and decode a JSON value. Malformed data is logged and reads as `None`.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(json) = storage.get_item(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&json) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            log::warn!("Ignoring malformed data under {}: {}", key, err);
            Ok(None)
        }
    }
}

/// Encode and store a JSON value
pub fn write_json<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.set_item(key, &json)
}

/// Resumable snapshot of a match in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedGame {
    pub player_round_wins: u32,
    pub enemy_round_wins: u32,
    pub current_round: u32,
    pub is_game_over: bool,
    pub is_paused: bool,
    pub high_score: u64,
    pub mode: GameMode,
    pub lives: u8,
    pub current_level: u32,
    pub score: u64,
}

impl Default for SavedGame {
    fn default() -> Self {
        Self {
            player_round_wins: 0,
            enemy_round_wins: 0,
            current_round: 1,
            is_game_over: false,
            is_paused: false,
            high_score: 0,
            mode: GameMode::Offline,
            lives: crate::consts::START_LIVES,
            current_level: 1,
            score: 0,
        }
    }
}

impl SavedGame {
    /// Saved game, or the default when missing, malformed or unreadable
    pub fn load(storage: &dyn Storage) -> Self {
        match read_json(storage, keys::GAME_STATE) {
            Ok(Some(saved)) => saved,
            Ok(None) => Self::default(),
            Err(err) => {
                log::warn!("Failed to read saved game: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        write_json(storage, keys::GAME_STATE, self)
    }

    pub fn clear(storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.remove_item(keys::GAME_STATE)
    }

    /// Whether there is an unfinished match worth resuming
    pub fn is_resumable(&self) -> bool {
        self.is_intact() && !self.is_game_over && (self.current_level > 1 || self.score > 0)
    }

    /// Whether the counters are in range for a real match
    pub fn is_intact(&self) -> bool {
        (1..=crate::consts::MAX_SAVED_LEVEL).contains(&self.current_level)
    }
}

//! User profiles, the signed-in session and ranking sync

use std::fmt;

use super::{SavedGame, Storage, StorageError, keys, read_json, write_json};
use crate::progression::{Gender, MatchReport, UserProfile};
use crate::ranking::Leaderboard;
use crate::sim::MatchOutcome;

#[derive(Debug)]
pub enum ProfileError {
    UnknownUser(String),
    AlreadyExists(String),
    /// A social action aimed at the acting user
    SelfTarget(String),
    Storage(StorageError),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::UnknownUser(name) => write!(f, "unknown user: {}", name),
            ProfileError::AlreadyExists(name) => write!(f, "user already exists: {}", name),
            ProfileError::SelfTarget(name) => write!(f, "{} cannot target themselves", name),
            ProfileError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for ProfileError {
    fn from(err: StorageError) -> Self {
        ProfileError::Storage(err)
    }
}

/// Demo opponents added to an otherwise empty roster:
/// (username, level, high score, likes, victory points, max level, bio, gender, age)
const DEMO_ROSTER: [(&str, u32, u64, u32, u64, u32, &str, Gender, u32); 4] = [
    ("NOVA_PRIME", 300, 950_000, 250, 500, 120, "Iron Marshal.", Gender::Female, 28),
    ("IRON_FIST", 150, 65_000, 82, 120, 55, "Armored Major.", Gender::Male, 34),
    ("SHADOW_REAPER", 80, 22_000, 14, 40, 18, "Shadow Lieutenant.", Gender::Male, 19),
    ("CYBER_VULCAN", 25, 98_000, 142, 210, 82, "Artillery Corporal.", Gender::Other, 25),
];

/// Add `name` when absent, remove it when present. Returns whether it was added.
fn toggle_name(list: &mut Vec<String>, name: &str) -> bool {
    if let Some(idx) = list.iter().position(|n| n == name) {
        list.remove(idx);
        false
    } else {
        list.push(name.to_owned());
        true
    }
}

/// Profile records on top of a key-value store
pub struct ProfileStore<S> {
    storage: S,
}

impl<S: Storage> ProfileStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    pub fn users(&self) -> Result<Vec<UserProfile>, ProfileError> {
        let users: Option<Vec<UserProfile>> = read_json(&self.storage, keys::USERS)?;
        Ok(users.unwrap_or_default())
    }

    fn save_users(&mut self, users: &[UserProfile]) -> Result<(), ProfileError> {
        write_json(&mut self.storage, keys::USERS, &users)?;
        Ok(())
    }

    pub fn get(&self, username: &str) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self
            .users()?
            .into_iter()
            .find(|u| u.username == username))
    }

    /// Add a new profile stamped with `now_ms` as its join time
    pub fn register(
        &mut self,
        mut profile: UserProfile,
        now_ms: f64,
    ) -> Result<UserProfile, ProfileError> {
        let mut users = self.users()?;
        if users.iter().any(|u| u.username == profile.username) {
            return Err(ProfileError::AlreadyExists(profile.username));
        }
        profile.joined_at = now_ms;
        profile.xp = 0;
        profile.reports_count = 0;
        users.push(profile.clone());
        self.save_users(&users)?;
        self.sync_ranking(&profile, now_ms)?;
        log::info!("Registered {}", profile.username);
        Ok(profile)
    }

    /// Replace a stored profile, refreshing the session copy and the ranking
    pub fn update(&mut self, profile: UserProfile, now_ms: f64) -> Result<UserProfile, ProfileError> {
        let mut users = self.users()?;
        let Some(slot) = users.iter_mut().find(|u| u.username == profile.username) else {
            return Err(ProfileError::UnknownUser(profile.username));
        };
        *slot = profile.clone();
        self.save_users(&users)?;

        if self
            .session()?
            .is_some_and(|s| s.username == profile.username)
        {
            self.set_session(&profile)?;
        }
        self.sync_ranking(&profile, now_ms)?;
        Ok(profile)
    }

    /// Apply a finished match to `username` and drop the resumable save
    pub fn record_match(
        &mut self,
        username: &str,
        outcome: &MatchOutcome,
        now_ms: f64,
    ) -> Result<(UserProfile, MatchReport), ProfileError> {
        SavedGame::clear(&mut self.storage)?;
        let mut profile = self.require(username)?;
        let report = profile.record_match(outcome);
        log::info!(
            "{}: +{} XP, +{} VP, level {}",
            username,
            report.xp_gained,
            report.victory_points_gained,
            profile.level
        );
        let profile = self.update(profile, now_ms)?;
        Ok((profile, report))
    }

    fn require(&self, username: &str) -> Result<UserProfile, ProfileError> {
        self.get(username)?
            .ok_or_else(|| ProfileError::UnknownUser(username.to_owned()))
    }

    /// Fill a roster that has at most one user with the demo opponents.
    /// Returns how many were added.
    pub fn seed_demo_roster(&mut self, now_ms: f64) -> Result<usize, ProfileError> {
        let users = self.users()?;
        if users.len() > 1 {
            return Ok(0);
        }
        let mut added = 0;
        for (username, level, high_score, likes, victory_points, max_level, bio, gender, age) in
            DEMO_ROSTER
        {
            if users.iter().any(|u| u.username == username) {
                continue;
            }
            let profile = UserProfile {
                level,
                high_score,
                likes,
                victory_points,
                max_level_reached: max_level,
                bio: bio.to_owned(),
                gender,
                age,
                ..UserProfile::new(username, now_ms)
            };
            self.register(profile, now_ms)?;
            added += 1;
        }
        log::debug!("Seeded {} demo profiles", added);
        Ok(added)
    }

    /// Like or unlike `target` on behalf of `liker`
    pub fn toggle_like(
        &mut self,
        target: &str,
        liker: &str,
        now_ms: f64,
    ) -> Result<UserProfile, ProfileError> {
        if target == liker {
            return Err(ProfileError::SelfTarget(liker.to_owned()));
        }
        let mut profile = self.require(target)?;
        toggle_name(&mut profile.liked_by, liker);
        profile.likes = profile.liked_by.len() as u32;
        self.update(profile, now_ms)
    }

    /// Follow or unfollow `target`. Returns whether `follower` now follows.
    pub fn toggle_follow(
        &mut self,
        target: &str,
        follower: &str,
        now_ms: f64,
    ) -> Result<bool, ProfileError> {
        if target == follower {
            return Err(ProfileError::SelfTarget(follower.to_owned()));
        }
        let mut followed = self.require(target)?;
        let mut following = self.require(follower)?;
        let now_following = toggle_name(&mut followed.followers, follower);
        following.following.retain(|n| n != target);
        if now_following {
            following.following.push(target.to_owned());
        }
        self.update(followed, now_ms)?;
        self.update(following, now_ms)?;
        Ok(now_following)
    }

    /// Make or break a mutual friendship. Returns whether they are now friends.
    pub fn toggle_friend(&mut self, a: &str, b: &str, now_ms: f64) -> Result<bool, ProfileError> {
        if a == b {
            return Err(ProfileError::SelfTarget(a.to_owned()));
        }
        let mut first = self.require(a)?;
        let mut second = self.require(b)?;
        let friends = toggle_name(&mut first.friends, b);
        second.friends.retain(|n| n != a);
        if friends {
            second.friends.push(a.to_owned());
        }
        self.update(first, now_ms)?;
        self.update(second, now_ms)?;
        Ok(friends)
    }

    pub fn session(&self) -> Result<Option<UserProfile>, ProfileError> {
        Ok(read_json(&self.storage, keys::SESSION)?)
    }

    pub fn set_session(&mut self, profile: &UserProfile) -> Result<(), ProfileError> {
        write_json(&mut self.storage, keys::SESSION, profile)?;
        Ok(())
    }

    /// Sign out. The resumable save belongs to the session and goes with it.
    pub fn clear_session(&mut self) -> Result<(), ProfileError> {
        self.storage.remove_item(keys::SESSION)?;
        SavedGame::clear(&mut self.storage)?;
        Ok(())
    }

    pub fn leaderboard(&self) -> Result<Leaderboard, ProfileError> {
        Ok(Leaderboard::load(&self.storage)?)
    }

    fn sync_ranking(&mut self, profile: &UserProfile, now_ms: f64) -> Result<(), ProfileError> {
        let mut board = Leaderboard::load(&self.storage)?;
        board.sync(profile, now_ms);
        board.save(&mut self.storage)?;
        Ok(())
    }
}

//! Profile progression: XP, victory points, level-ups and military ranks

use serde::{Deserialize, Serialize};

use crate::sim::MatchOutcome;

/// Victory points per cleared level
pub const VP_PER_LEVEL: u64 = 5;
/// XP per cleared level
pub const XP_PER_LEVEL: u64 = 200;
/// Score points per XP point
pub const SCORE_PER_XP: u64 = 5;

/// What a finished match is worth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewards {
    pub xp: u64,
    pub victory_points: u64,
}

pub fn rewards(levels_cleared: u32, final_score: u64) -> Rewards {
    let levels = u64::from(levels_cleared);
    Rewards {
        xp: final_score / SCORE_PER_XP + levels * XP_PER_LEVEL,
        victory_points: levels * VP_PER_LEVEL,
    }
}

/// XP needed to leave `level`
pub fn xp_threshold(level: u32) -> u64 {
    u64::from(level) * 1000
}

/// Add `gained` XP and roll over as many level-ups as it pays for.
/// Returns the new `(level, xp)`.
pub fn apply_xp(level: u32, xp: u64, gained: u64) -> (u32, u64) {
    // Level 0 would have a zero threshold
    let mut level = level.max(1);
    let mut xp = xp + gained;
    while xp >= xp_threshold(level) {
        xp -= xp_threshold(level);
        level += 1;
    }
    (level, xp)
}

/// A military rank title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilitaryRank {
    pub min_level: u32,
    pub title: &'static str,
}

/// Ranks from highest to lowest
pub const MILITARY_RANKS: [MilitaryRank; 10] = [
    MilitaryRank { min_level: 300, title: "Supreme Marshal" },
    MilitaryRank { min_level: 250, title: "Stellar Division General" },
    MilitaryRank { min_level: 210, title: "Elite Colonel" },
    MilitaryRank { min_level: 170, title: "Assault Major" },
    MilitaryRank { min_level: 130, title: "Division Captain" },
    MilitaryRank { min_level: 90, title: "Tactical Lieutenant" },
    MilitaryRank { min_level: 60, title: "Veteran Sergeant" },
    MilitaryRank { min_level: 30, title: "Infantry Corporal" },
    MilitaryRank { min_level: 10, title: "Private" },
    MilitaryRank { min_level: 0, title: "Recruit" },
];

/// Highest rank whose minimum level is at most `level`
pub fn rank_for_level(level: u32) -> MilitaryRank {
    MILITARY_RANKS
        .iter()
        .copied()
        .find(|rank| level >= rank.min_level)
        .unwrap_or(MILITARY_RANKS[MILITARY_RANKS.len() - 1])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "O")]
    Other,
}

/// A player profile as stored in the users list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub username: String,
    pub bio: String,
    pub gender: Gender,
    pub age: u32,
    pub high_score: u64,
    pub victory_points: u64,
    /// Unix timestamp (ms) of registration
    pub joined_at: f64,
    pub avatar: Option<String>,
    pub level: u32,
    pub xp: u64,
    pub max_level_reached: u32,
    pub likes: u32,
    pub liked_by: Vec<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub friends: Vec<String>,
    pub reports_count: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            username: String::new(),
            bio: "Tank loaded and ready.".to_string(),
            gender: Gender::Other,
            age: 20,
            high_score: 0,
            victory_points: 0,
            joined_at: 0.0,
            avatar: None,
            level: 1,
            xp: 0,
            max_level_reached: 0,
            likes: 0,
            liked_by: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
            friends: Vec::new(),
            reports_count: 0,
        }
    }
}

/// Progress summary shown after a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchReport {
    pub xp_gained: u64,
    pub victory_points_gained: u64,
    pub levels_gained: u32,
    pub new_high_score: bool,
}

impl UserProfile {
    pub fn new(username: impl Into<String>, joined_at: f64) -> Self {
        Self {
            username: username.into(),
            joined_at,
            ..Self::default()
        }
    }

    pub fn rank(&self) -> MilitaryRank {
        rank_for_level(self.level)
    }

    /// Fold a finished match into the profile
    pub fn record_match(&mut self, outcome: &MatchOutcome) -> MatchReport {
        let gained = rewards(outcome.levels_cleared, outcome.final_score);
        let old_level = self.level;
        let (level, xp) = apply_xp(self.level, self.xp, gained.xp);
        self.level = level;
        self.xp = xp;
        self.victory_points += gained.victory_points;
        self.max_level_reached = self.max_level_reached.max(outcome.levels_cleared);

        let new_high_score = outcome.final_score > self.high_score;
        self.high_score = self.high_score.max(outcome.final_score);

        MatchReport {
            xp_gained: gained.xp,
            victory_points_gained: gained.victory_points,
            levels_gained: level.saturating_sub(old_level),
            new_high_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn outcome(final_score: u64, levels_cleared: u32) -> MatchOutcome {
        MatchOutcome {
            player_won: false,
            final_score,
            levels_cleared,
        }
    }

    #[test]
    fn test_rewards() {
        assert_eq!(
            rewards(2, 1500),
            Rewards {
                xp: 700,
                victory_points: 10
            }
        );
        assert_eq!(rewards(4, 0).victory_points, 20);
        assert_eq!(rewards(0, 499).xp, 99);
    }

    #[test]
    fn test_level_up_carries_remainder() {
        assert_eq!(apply_xp(1, 900, 700), (2, 600));
        // 1000 to leave level 1, 2000 to leave level 2
        assert_eq!(apply_xp(1, 0, 3000), (3, 0));
        assert_eq!(apply_xp(1, 0, 999), (1, 999));
    }

    #[test]
    fn test_record_match_updates_profile() {
        let mut profile = UserProfile::new("ACE", 0.0);
        profile.xp = 900;
        profile.high_score = 1000;
        profile.max_level_reached = 3;

        let report = profile.record_match(&outcome(1500, 2));
        assert_eq!(profile.level, 2);
        assert_eq!(profile.xp, 600);
        assert_eq!(profile.victory_points, 10);
        assert_eq!(profile.high_score, 1500);
        assert_eq!(profile.max_level_reached, 3);
        assert_eq!(
            report,
            MatchReport {
                xp_gained: 700,
                victory_points_gained: 10,
                levels_gained: 1,
                new_high_score: true,
            }
        );
    }

    #[test]
    fn test_lower_score_keeps_high_score() {
        let mut profile = UserProfile::new("ACE", 0.0);
        profile.high_score = 5000;
        let report = profile.record_match(&outcome(200, 5));
        assert_eq!(profile.high_score, 5000);
        assert!(!report.new_high_score);
        assert_eq!(profile.max_level_reached, 5);
    }

    #[test]
    fn test_rank_ladder() {
        assert_eq!(rank_for_level(0).title, "Recruit");
        assert_eq!(rank_for_level(9).title, "Recruit");
        assert_eq!(rank_for_level(10).title, "Private");
        assert_eq!(rank_for_level(299).title, "Stellar Division General");
        assert_eq!(rank_for_level(300).title, "Supreme Marshal");
        assert_eq!(rank_for_level(u32::MAX).title, "Supreme Marshal");
    }

    #[test]
    fn test_profile_json_defaults() {
        let profile: UserProfile = serde_json::from_str(r#"{"username":"ACE","gender":"F"}"#).unwrap();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.age, 20);
        assert_eq!(profile.gender, Gender::Female);
        assert!(profile.friends.is_empty());
    }

    proptest! {
        #[test]
        fn prop_apply_xp_leaves_xp_below_threshold(level in 1u32..50, xp in 0u64..1000, gained in 0u64..1_000_000) {
            let (new_level, new_xp) = apply_xp(level, xp, gained);
            prop_assert!(new_level >= level);
            prop_assert!(new_xp < xp_threshold(new_level));
        }

        #[test]
        fn prop_apply_xp_conserves_total(level in 1u32..20, gained in 0u64..200_000) {
            let (new_level, new_xp) = apply_xp(level, 0, gained);
            let spent: u64 = (level..new_level).map(xp_threshold).sum();
            prop_assert_eq!(spent + new_xp, gained);
        }

        #[test]
        fn prop_rank_min_level_not_above_level(level in 0u32..1000) {
            prop_assert!(rank_for_level(level).min_level <= level);
        }
    }
}

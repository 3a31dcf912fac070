//! Match controller
//!
//! Owns the simulation for one match, turns host animation frames into
//! simulation steps and reports the outcome exactly once.

use serde::{Deserialize, Serialize};

use crate::audio::{AudioCues, Silent};
use crate::consts::{MAX_SUBSTEPS, SIM_DT, START_LIVES};
use crate::input::{KeyBindings, KeysHeld};
use crate::persistence::SavedGame;
use crate::settings::{Settings, TimestepMode};
use crate::sim::{GameEvent, MatchOutcome, Session, SimulationState, TickInput, tick};

/// Match mode. `Online` is carried for the profile layer only; every match
/// is simulated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    #[default]
    Offline,
    Online,
}

/// What the profile layer hands the game when a match starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    pub mode: GameMode,
    pub player_name: String,
    /// Seed for terrain and AI
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Offline,
            player_name: "PLAYER".to_string(),
            seed: 0,
        }
    }
}

type GameOverCallback = Box<dyn FnMut(MatchOutcome)>;

/// Drives one match from host frames
pub struct MatchController {
    config: MatchConfig,
    state: SimulationState,
    audio: Box<dyn AudioCues>,
    /// Taken on first use so the outcome is reported once
    on_game_over: Option<GameOverCallback>,
    bindings: KeyBindings,
    timestep: TimestepMode,
    accumulator: f32,
    last_time: Option<f64>,
    /// Best score known when the match began
    prior_high_score: u64,
    /// Events from the most recent frame
    recent: Vec<GameEvent>,
}

impl MatchController {
    /// Fresh match at level 1
    pub fn start(
        config: MatchConfig,
        settings: &Settings,
        on_game_over: impl FnMut(MatchOutcome) + 'static,
    ) -> Self {
        Self::with_session(config, Session::default(), 0, settings, Box::new(on_game_over))
    }

    /// Continue from a saved snapshot: level, lives and score carry over,
    /// the grid is generated afresh. A finished save starts a new match.
    pub fn resume(
        config: MatchConfig,
        saved: &SavedGame,
        settings: &Settings,
        on_game_over: impl FnMut(MatchOutcome) + 'static,
    ) -> Self {
        let session = if !saved.is_intact() {
            log::warn!(
                "Saved game has level {} out of range, starting fresh",
                saved.current_level
            );
            Session::default()
        } else if saved.is_game_over || saved.lives == 0 {
            log::info!("Saved game already finished, starting fresh");
            Session::default()
        } else {
            Session {
                level: saved.current_level,
                lives: saved.lives.min(START_LIVES),
                score: saved.score,
                base_alive: true,
            }
        };
        Self::with_session(
            config,
            session,
            saved.high_score,
            settings,
            Box::new(on_game_over),
        )
    }

    fn with_session(
        config: MatchConfig,
        session: Session,
        prior_high_score: u64,
        settings: &Settings,
        on_game_over: GameOverCallback,
    ) -> Self {
        let mut state = SimulationState::with_session(config.seed, session);
        state.max_particles = settings.max_particles();
        log::info!(
            "Match for {} ({:?}) at level {}, seed {}",
            config.player_name,
            config.mode,
            state.session.level,
            config.seed
        );
        if config.mode == GameMode::Online {
            log::warn!("Online mode selected; simulating locally");
        }
        Self {
            config,
            state,
            audio: Box::new(Silent),
            on_game_over: Some(on_game_over),
            bindings: settings.key_bindings.clone(),
            timestep: settings.timestep,
            accumulator: 0.0,
            last_time: None,
            prior_high_score,
            recent: Vec::new(),
        }
    }

    /// Route sound cues to `audio`
    pub fn with_audio(mut self, audio: Box<dyn AudioCues>) -> Self {
        self.audio = audio;
        self
    }

    /// Advance the match for one host frame at `now_ms`.
    /// Returns whether the host should schedule another frame.
    pub fn frame(&mut self, keys: &KeysHeld, now_ms: f64) -> bool {
        self.recent.clear();
        if self.state.is_over() {
            return false;
        }

        let input = TickInput::from_keys(keys, &self.bindings);
        let steps = self.steps_for(now_ms);
        for _ in 0..steps {
            tick(&mut self.state, &input, now_ms, self.audio.as_mut());
            if self.state.is_over() {
                break;
            }
        }

        self.process_events();
        !self.state.is_over()
    }

    /// Number of simulation steps owed for a frame at `now_ms`
    fn steps_for(&mut self, now_ms: f64) -> u32 {
        let elapsed = self
            .last_time
            .map(|last| ((now_ms - last) / 1000.0) as f32)
            .unwrap_or(SIM_DT);
        self.last_time = Some(now_ms);

        match self.timestep {
            TimestepMode::PerFrame => 1,
            TimestepMode::Fixed => {
                self.accumulator += elapsed.clamp(0.0, 0.1);
                let mut substeps = 0;
                while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                    self.accumulator -= SIM_DT;
                    substeps += 1;
                }
                if substeps == MAX_SUBSTEPS {
                    // Drop the backlog rather than fast-forward later
                    self.accumulator = 0.0;
                }
                substeps
            }
        }
    }

    fn process_events(&mut self) {
        self.recent = self.state.drain_events();
        for event in &self.recent {
            match *event {
                GameEvent::LevelCleared { new_level } => {
                    log::debug!("Level {} started", new_level);
                }
                GameEvent::PlayerHit { lives_left } => {
                    log::debug!("Player hit, {} lives left", lives_left);
                }
                GameEvent::GameOver(outcome) => {
                    if let Some(mut callback) = self.on_game_over.take() {
                        callback(outcome);
                    }
                }
                _ => {}
            }
        }
    }

    /// Events produced during the most recent frame
    pub fn recent_events(&self) -> &[GameEvent] {
        &self.recent
    }

    /// Whether the last frame changed anything a saved game records
    /// (score, lives or level) while the match is still running
    pub fn snapshot_due(&self) -> bool {
        !self.state.is_over()
            && self.recent.iter().any(|e| {
                matches!(
                    e,
                    GameEvent::EnemyDestroyed { .. }
                        | GameEvent::LevelCleared { .. }
                        | GameEvent::PlayerHit { .. }
                )
            })
    }

    /// Resumable snapshot of the match
    pub fn snapshot(&self) -> SavedGame {
        let session = &self.state.session;
        SavedGame {
            is_game_over: self.state.is_over(),
            high_score: self.prior_high_score.max(session.score),
            mode: self.config.mode,
            lives: session.lives,
            current_level: session.level,
            score: session.score,
            ..SavedGame::default()
        }
    }

    pub fn score(&self) -> u64 {
        self.state.session.score
    }

    pub fn lives(&self) -> u8 {
        self.state.session.lives
    }

    pub fn level(&self) -> u32 {
        self.state.session.level
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Direct access for scripted scenarios and tooling
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }
}

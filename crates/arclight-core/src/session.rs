//! Session state machine: the top-level game state.
//!
//! The session gates everything else: gameplay subsystems (including the
//! phase sequencer) receive update ticks only while the state is
//! [`SessionState::Playing`] or [`SessionState::Dying`], and the session
//! is the single source of the time-dilation factor.
//!
//! Transition functions mutate only session state and return [`Effect`]s
//! for the orchestrator to execute, so every transition is independently
//! testable. Invalid transition requests (input and timers can race the
//! machine) are silent no-ops, never errors.
//!
//! # Transitions
//!
//! ```text
//! Title     --play-->  Playing
//! GameOver  --play-->  Playing        (full session restart, via effect)
//! Playing   --pause--> Paused         (toggle; the only two-way input)
//! Playing   --boss gate--> BossDialog
//! BossDialog --dialog complete--> Playing  (sequencer start() only now)
//! Playing   --player death--> Dying   (timed; elapsed counter freezes)
//! Dying     --timer--> Playing (life left) | GameOver
//! Playing   --encounter complete--> LevelCleared (terminal success)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::effect::{Effect, MusicCmd, SoundCue};

// =============================================================================
// Tuning constants
// =============================================================================

/// Dilation factor forced while the session is dying.
pub const DYING_DILATION: f32 = 0.2;

/// Dilation factor while the player's slow-motion ability runs.
pub const ABILITY_DILATION: f32 = 0.3;

/// How long the slow-motion ability lasts, in real ticks.
pub const ABILITY_DURATION_TICKS: f32 = 240.0;

/// Cooldown between ability activations, in real ticks.
pub const ABILITY_COOLDOWN_TICKS: f32 = 600.0;

/// Length of the dying sub-state, in real ticks.
pub const DYING_DURATION_TICKS: f32 = 150.0;

/// Lives at session start.
pub const STARTING_LIVES: u32 = 3;

/// Bombs at session start.
pub const STARTING_BOMBS: u32 = 2;

// =============================================================================
// State
// =============================================================================

/// The single enumerated session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Title screen; nothing updates.
    Title,
    /// Active gameplay.
    Playing,
    /// Gameplay frozen, HUD controls hidden, music paused.
    Paused,
    /// Timed sub-state after player death; dilation forced low, the
    /// elapsed-time counter freezes, most subsystems still update.
    Dying,
    /// Boss intro dialog; gameplay does not update, dialog does.
    BossDialog,
    /// Terminal success state of an encounter.
    LevelCleared,
    /// Out of lives.
    GameOver,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Dying => "dying",
            Self::BossDialog => "boss-dialog",
            Self::LevelCleared => "level-cleared",
            Self::GameOver => "game-over",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Session
// =============================================================================

/// Top-level session: state plus the counters scoped to "playing".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    state: SessionState,
    elapsed_ticks: f32,
    lives: u32,
    bombs: u32,
    score: u32,
    high_score: u32,
    cheat_used: bool,
    ability_remaining: f32,
    ability_cooldown: f32,
    dying_remaining: f32,
}

impl Session {
    /// Creates a session on the title screen with a previously persisted
    /// high score (0 when none was saved).
    #[must_use]
    pub fn new(high_score: u32) -> Self {
        Self {
            state: SessionState::Title,
            elapsed_ticks: 0.0,
            lives: STARTING_LIVES,
            bombs: STARTING_BOMBS,
            score: 0,
            high_score,
            cheat_used: false,
            ability_remaining: 0.0,
            ability_cooldown: 0.0,
            dying_remaining: 0.0,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the elapsed playing time, in ticks (frozen while dying).
    #[must_use]
    pub const fn elapsed_ticks(&self) -> f32 {
        self.elapsed_ticks
    }

    /// Returns the current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Returns the best score seen, persisted or achieved this session.
    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Returns the remaining lives.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Returns the remaining bombs.
    #[must_use]
    pub const fn bombs(&self) -> u32 {
        self.bombs
    }

    /// Returns `true` once a cheat has been used this session.
    #[must_use]
    pub const fn cheat_used(&self) -> bool {
        self.cheat_used
    }

    /// Returns `true` while gameplay subsystems receive update ticks.
    #[must_use]
    pub const fn gameplay_active(&self) -> bool {
        matches!(self.state, SessionState::Playing | SessionState::Dying)
    }

    /// Returns the active time-dilation factor.
    ///
    /// Dying forces a fixed low factor regardless of the ability's own
    /// state; otherwise the ability's factor applies while its timer runs.
    #[must_use]
    pub fn dilation_factor(&self) -> f32 {
        if matches!(self.state, SessionState::Dying) {
            DYING_DILATION
        } else if self.ability_remaining > 0.0 {
            ABILITY_DILATION
        } else {
            1.0
        }
    }

    fn transition(&mut self, to: SessionState) {
        tracing::debug!(from = %self.state, to = %to, "session transition");
        self.state = to;
    }

    // -------------------------------------------------------------------------
    // Input-driven transitions
    // -------------------------------------------------------------------------

    /// The "play" action: start from the title, resume from pause, or
    /// request a full restart from game over.
    pub fn play(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Title => {
                self.transition(SessionState::Playing);
                vec![
                    Effect::HudVisible(true),
                    Effect::Music(MusicCmd::Resume),
                    Effect::RefreshStatus {
                        lives: self.lives,
                        bombs: self.bombs,
                    },
                ]
            }
            SessionState::Paused => {
                self.transition(SessionState::Playing);
                vec![Effect::HudVisible(true), Effect::Music(MusicCmd::Resume)]
            }
            SessionState::GameOver => vec![Effect::RestartRequested],
            _ => Vec::new(),
        }
    }

    /// The "pause" action: the only transition with toggle semantics
    /// triggered by a single input.
    pub fn pause(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Playing => {
                self.transition(SessionState::Paused);
                vec![Effect::HudVisible(false), Effect::Music(MusicCmd::Pause)]
            }
            SessionState::Paused => {
                self.transition(SessionState::Playing);
                vec![Effect::HudVisible(true), Effect::Music(MusicCmd::Resume)]
            }
            _ => Vec::new(),
        }
    }

    /// Engages the slow-motion ability, if off cooldown.
    pub fn use_ability(&mut self) -> Vec<Effect> {
        if !matches!(self.state, SessionState::Playing) || self.ability_cooldown > 0.0 {
            return Vec::new();
        }
        self.ability_remaining = ABILITY_DURATION_TICKS;
        self.ability_cooldown = ABILITY_COOLDOWN_TICKS;
        vec![Effect::Sound(SoundCue::DilationEngaged)]
    }

    /// Consumes one bomb. Returns `false` (without effects) when none
    /// remain or gameplay is not running; the caller applies the damage.
    pub fn take_bomb(&mut self) -> bool {
        if !matches!(self.state, SessionState::Playing) || self.bombs == 0 {
            return false;
        }
        self.bombs -= 1;
        true
    }

    // -------------------------------------------------------------------------
    // Scripted transitions
    // -------------------------------------------------------------------------

    /// Enters the boss dialog from gameplay.
    pub fn begin_boss_dialog(&mut self) -> Vec<Effect> {
        if !matches!(self.state, SessionState::Playing) {
            return Vec::new();
        }
        self.transition(SessionState::BossDialog);
        Vec::new()
    }

    /// Returns to gameplay when the dialog finishes. Only after this may
    /// the phase sequencer receive its `start()` call.
    pub fn dialog_complete(&mut self) -> Vec<Effect> {
        if !matches!(self.state, SessionState::BossDialog) {
            return Vec::new();
        }
        self.transition(SessionState::Playing);
        Vec::new()
    }

    /// Enters the timed dying sub-state.
    pub fn notify_player_death(&mut self) -> Vec<Effect> {
        if !matches!(self.state, SessionState::Playing) {
            return Vec::new();
        }
        self.dying_remaining = DYING_DURATION_TICKS;
        self.transition(SessionState::Dying);
        vec![Effect::Sound(SoundCue::PlayerDown)]
    }

    /// Enters the terminal success state.
    pub fn level_cleared(&mut self) -> Vec<Effect> {
        if !matches!(self.state, SessionState::Playing) {
            return Vec::new();
        }
        self.transition(SessionState::LevelCleared);
        let mut effects = vec![Effect::Music(MusicCmd::Pause)];
        if !self.cheat_used && self.score >= self.high_score && self.score > 0 {
            effects.push(Effect::SaveHighScore(self.high_score));
        }
        effects
    }

    // -------------------------------------------------------------------------
    // Per-tick counters
    // -------------------------------------------------------------------------

    /// Advances session counters by `dt` real ticks.
    ///
    /// Only meaningful in Playing and Dying; callers gate on
    /// [`Self::gameplay_active`]. The elapsed counter freezes while dying.
    pub fn update(&mut self, dt: f32) -> Vec<Effect> {
        match self.state {
            SessionState::Playing => {
                self.elapsed_ticks += dt;
                self.ability_remaining = (self.ability_remaining - dt).max(0.0);
                self.ability_cooldown = (self.ability_cooldown - dt).max(0.0);
                Vec::new()
            }
            SessionState::Dying => {
                self.ability_cooldown = (self.ability_cooldown - dt).max(0.0);
                self.dying_remaining -= dt;
                if self.dying_remaining > 0.0 {
                    return Vec::new();
                }
                self.ability_remaining = 0.0;
                if self.lives > 0 {
                    self.lives -= 1;
                    self.transition(SessionState::Playing);
                    vec![Effect::RefreshStatus {
                        lives: self.lives,
                        bombs: self.bombs,
                    }]
                } else {
                    self.transition(SessionState::GameOver);
                    let mut effects =
                        vec![Effect::HudVisible(false), Effect::Music(MusicCmd::Pause)];
                    if !self.cheat_used && self.score >= self.high_score && self.score > 0 {
                        effects.push(Effect::SaveHighScore(self.high_score));
                    }
                    effects
                }
            }
            _ => Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Score
    // -------------------------------------------------------------------------

    /// Adds points, guarded by the cheat flag.
    ///
    /// Score and high-score mutation are suppressed entirely once a cheat
    /// has been used; the display refresh is emitted either way so the HUD
    /// always matches the guarded value.
    pub fn add_score(&mut self, points: u32) -> Vec<Effect> {
        if !self.cheat_used {
            self.score = self.score.saturating_add(points);
            if self.score > self.high_score {
                self.high_score = self.score;
            }
        }
        vec![Effect::RefreshScore {
            score: self.score,
            high_score: self.high_score,
        }]
    }

    /// Marks the session as cheated. One-way; cleared only by restart.
    pub fn mark_cheat_used(&mut self) {
        if !self.cheat_used {
            tracing::warn!("cheat used, score mutation suppressed for this session");
        }
        self.cheat_used = true;
    }

    // -------------------------------------------------------------------------
    // Restart
    // -------------------------------------------------------------------------

    /// Full session reset into Playing (not Title). The high score is the
    /// only value that survives.
    pub fn restart(&mut self) -> Vec<Effect> {
        let high_score = self.high_score;
        *self = Self::new(high_score);
        self.transition(SessionState::Playing);
        vec![
            Effect::HudVisible(true),
            Effect::Music(MusicCmd::Resume),
            Effect::RefreshScore {
                score: self.score,
                high_score: self.high_score,
            },
            Effect::RefreshStatus {
                lives: self.lives,
                bombs: self.bombs,
            },
        ]
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Effect system: side-effect proposals emitted by the state machines.
//!
//! The state machines (session, phase sequencer, scripted sequencer) stay
//! pure with respect to side effects: instead of touching audio, HUD, or
//! storage directly, their transition functions return [`Effect`] values.
//! The orchestrator is the single place where effects are executed —
//! presentation effects route to collaborator interfaces, sequencing
//! effects feed back into the machines.
//!
//! # Architecture
//!
//! Effects fall into two categories, reported by [`Effect::kind`]:
//! - [`EffectKind::Presentation`]: fire-and-forget calls on collaborators
//!   (sound cues, HUD refreshes, explosion spawns, score persistence)
//! - [`EffectKind::Sequencing`]: internal commands that drive further state
//!   machine transitions (dialog completion, encounter completion)
//!
//! # Example
//!
//! ```
//! use arclight_core::effect::{Effect, EffectKind, SoundCue};
//!
//! let cue = Effect::Sound(SoundCue::PhaseCleared);
//! assert_eq!(cue.kind(), EffectKind::Presentation);
//!
//! let done = Effect::EncounterComplete;
//! assert_eq!(done.kind(), EffectKind::Sequencing);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Sound and Music
// =============================================================================

/// Sound cues the core emits at defined trigger points.
///
/// Cues are fire-and-forget: the core never waits on playback completion,
/// and a missing audio asset is a silent no-op on the collaborator side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// A vulnerable part took damage without being destroyed.
    PartHit,
    /// A part's hit points reached zero.
    PartDestroyed,
    /// A phase's last part was destroyed.
    PhaseCleared,
    /// A dialog page advanced.
    DialogAdvance,
    /// The time-dilation ability engaged.
    DilationEngaged,
    /// The player went down.
    PlayerDown,
    /// One burst of the scripted boss explosion chain.
    ExplosionBurst,
    /// The final large explosion at the end of the chain.
    ExplosionFinal,
}

impl SoundCue {
    /// Returns the stable asset key the audio collaborator resolves.
    #[must_use]
    pub const fn asset_key(self) -> &'static str {
        match self {
            Self::PartHit => "part_hit",
            Self::PartDestroyed => "part_destroyed",
            Self::PhaseCleared => "phase_cleared",
            Self::DialogAdvance => "dialog_advance",
            Self::DilationEngaged => "dilation_engaged",
            Self::PlayerDown => "player_down",
            Self::ExplosionBurst => "explosion_burst",
            Self::ExplosionFinal => "explosion_final",
        }
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.asset_key())
    }
}

/// Background music control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicCmd {
    /// Begin or resume the session music.
    Resume,
    /// Pause the session music.
    Pause,
}

// =============================================================================
// Effect
// =============================================================================

/// Category of an effect, used by the orchestrator's dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Routed to a collaborator interface; never re-enters the machines.
    Presentation,
    /// Feeds back into the state machines for further transitions.
    Sequencing,
}

/// A side-effect proposal returned by a state machine transition.
///
/// Effects are data: they carry everything the orchestrator needs to
/// execute them, and they can be buffered, inspected in tests, or dropped
/// (a missing collaborator degrades to a no-op).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Play a fire-and-forget sound cue.
    Sound(SoundCue),
    /// Control the background music.
    Music(MusicCmd),
    /// Show or hide the gameplay HUD.
    HudVisible(bool),
    /// Refresh the score display.
    RefreshScore {
        /// Current session score.
        score: u32,
        /// Best score seen this install.
        high_score: u32,
    },
    /// Refresh the consumable counters on the HUD.
    RefreshStatus {
        /// Remaining lives.
        lives: u32,
        /// Remaining bombs.
        bombs: u32,
    },
    /// Spawn a cosmetic explosion at a world position.
    SpawnExplosion {
        /// World position of the burst.
        at: Vec2,
        /// Relative size of the burst.
        magnitude: f32,
    },
    /// Persist a new high score.
    SaveHighScore(u32),
    /// The boss dialog finished its last page.
    DialogComplete,
    /// The phase sequencer entered its terminal state.
    EncounterComplete,
    /// The scripted boss-death chain finished; the level is cleared.
    LevelCleared,
    /// A full session restart was requested from a terminal state.
    RestartRequested,
}

impl Effect {
    /// Returns the dispatch category of this effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::Sound(_)
            | Self::Music(_)
            | Self::HudVisible(_)
            | Self::RefreshScore { .. }
            | Self::RefreshStatus { .. }
            | Self::SpawnExplosion { .. }
            | Self::SaveHighScore(_) => EffectKind::Presentation,
            Self::DialogComplete
            | Self::EncounterComplete
            | Self::LevelCleared
            | Self::RestartRequested => EffectKind::Sequencing,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

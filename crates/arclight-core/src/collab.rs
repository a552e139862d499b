//! Collaborator interfaces: the narrow seams to the outside world.
//!
//! The core never draws, plays audio, touches the DOM, or persists state
//! itself. Each of those concerns sits behind one small trait, and every
//! trait has a null implementation so a missing collaborator degrades to a
//! no-op instead of failing the session.

use glam::Vec2;

use crate::effect::{MusicCmd, SoundCue};
use crate::error::StoreError;
use crate::part::{HitRegion, PartName};

/// Drawing surface the core delegates rendering to.
///
/// No drawing logic lives in the core; the active phase walks its part
/// trees and hands each node to the surface.
pub trait Surface {
    /// Draws one part at its current hit region.
    fn draw_part(&mut self, name: &PartName, region: HitRegion, destroyed: bool);
}

/// Fire-and-forget audio playback.
pub trait AudioSink: Send {
    /// Plays a sound cue. The core never waits on completion.
    fn play(&mut self, cue: SoundCue);

    /// Controls the background music.
    fn music(&mut self, cmd: MusicCmd);
}

/// Cosmetic explosion spawning.
pub trait FxSink: Send {
    /// Spawns an explosion burst at a world position.
    fn spawn_explosion(&mut self, at: Vec2, magnitude: f32);
}

/// Gameplay HUD surface.
pub trait Hud: Send {
    /// Shows or hides the HUD controls.
    fn set_visible(&mut self, visible: bool);

    /// Refreshes the score display.
    fn show_score(&mut self, score: u32, high_score: u32);

    /// Refreshes the consumable counters.
    fn show_status(&mut self, lives: u32, bombs: u32);
}

/// High-score persistence, keyed by a fixed identifier client-side.
pub trait ScoreStore: Send {
    /// Loads the persisted high score, `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store is unavailable; the
    /// caller treats that as "no high score".
    fn load(&mut self) -> Result<Option<u32>, StoreError>;

    /// Persists a new high score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write failure; the caller treats that as
    /// "save skipped".
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
}

// =============================================================================
// Null implementations
// =============================================================================

/// Audio sink that drops every cue.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
    fn music(&mut self, _cmd: MusicCmd) {}
}

/// Effect sink that drops every burst.
#[derive(Debug, Default)]
pub struct NullFx;

impl FxSink for NullFx {
    fn spawn_explosion(&mut self, _at: Vec2, _magnitude: f32) {}
}

/// HUD that displays nothing.
#[derive(Debug, Default)]
pub struct NullHud;

impl Hud for NullHud {
    fn set_visible(&mut self, _visible: bool) {}
    fn show_score(&mut self, _score: u32, _high_score: u32) {}
    fn show_status(&mut self, _lives: u32, _bombs: u32) {}
}

/// Store with no backing storage: loads nothing, saves nowhere.
#[derive(Debug, Default)]
pub struct NullStore;

impl ScoreStore for NullStore {
    fn load(&mut self) -> Result<Option<u32>, StoreError> {
        Ok(None)
    }

    fn save(&mut self, _score: u32) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The full set of collaborators the orchestrator dispatches effects to.
pub struct Collaborators {
    /// Audio playback.
    pub audio: Box<dyn AudioSink>,
    /// Explosion visuals.
    pub fx: Box<dyn FxSink>,
    /// Gameplay HUD.
    pub hud: Box<dyn Hud>,
    /// High-score persistence.
    pub store: Box<dyn ScoreStore>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            audio: Box::new(NullAudio),
            fx: Box::new(NullFx),
            hud: Box::new(NullHud),
            store: Box::new(NullStore),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

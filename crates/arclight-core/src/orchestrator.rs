//! Per-frame driver: ties the session, sequencer, and scripted sequences
//! together.
//!
//! The orchestrator is invoked once per frame callback. It computes real
//! elapsed time since the previous callback, converts it to nominal ticks,
//! pulls the dilation factor from the session, and drives every subsystem
//! in a fixed dependency order:
//!
//! 1. Death-sequence bookkeeping (scripted steps, real ticks)
//! 2. Session counters (elapsed time, ability timers, dying countdown)
//! 3. Level progression (the boss-dialog gate)
//! 4. Encounter update (sequencer → active phase → parts, dilation-scaled)
//! 5. Effect dispatch (collaborators last, HUD refresh included)
//!
//! Collision resolution is external: the collision system queries
//! [`UpdateOrchestrator::vulnerable_parts`] / [`UpdateOrchestrator::part_at_point`]
//! and applies damage through [`UpdateOrchestrator::damage_part_at`]
//! between frames. Because the sequencer commits a phase completion inside
//! its own update, a just-completed phase is never rendered or hittable
//! later in the same tick.
//!
//! No operation here blocks; every wait is a decrementing counter checked
//! once per tick.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::collab::{Collaborators, Surface};
use crate::effect::{Effect, EffectKind, SoundCue};
use crate::script::{schedule_boss_death, DialogScript, ScriptedSequencer};
use crate::sequencer::{EncounterDef, PhaseSequencer, SequencerState};
use crate::session::{Session, SessionState};
use crate::time::{TimeStep, MS_PER_TICK};

// =============================================================================
// Tuning constants
// =============================================================================

/// Upper bound on one frame's tick advance; a long stall (tab switch,
/// debugger pause) must not replay as one huge step.
pub const MAX_FRAME_TICKS: f32 = 3.0;

/// Points awarded for destroying a part.
pub const PART_DESTROYED_SCORE: u32 = 500;

/// Damage a bomb applies to every vulnerable part.
pub const BOMB_DAMAGE: f32 = 25.0;

// =============================================================================
// Input
// =============================================================================

/// Discrete action events delivered by the input collaborator.
///
/// The core exposes one handler per action and is agnostic to the
/// originating device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    /// Start from the title, resume from pause, or restart from game over.
    Start,
    /// Toggle pause.
    Pause,
    /// Engage the slow-motion ability.
    Dilation,
    /// Detonate a bomb.
    Bomb,
    /// Advance the boss dialog one page.
    AdvanceDialog,
    /// Restart the session in place.
    Restart,
}

// =============================================================================
// UpdateOrchestrator
// =============================================================================

/// The per-frame driver for one game session.
#[derive(Debug)]
pub struct UpdateOrchestrator {
    session: Session,
    sequencer: PhaseSequencer,
    script: ScriptedSequencer,
    dialog: DialogScript,
    gate_triggered: bool,
    encounter: EncounterDef,
    collab: Collaborators,
    rng: ChaCha8Rng,
    seed: u64,
    target: Vec2,
    last_frame_ms: Option<f64>,
}

impl UpdateOrchestrator {
    /// Creates an orchestrator for one encounter.
    ///
    /// The persisted high score is loaded up front; a failing store
    /// degrades to "no high score" and the session stays playable.
    #[must_use]
    pub fn new(
        seed: u64,
        encounter: EncounterDef,
        autoplay_dialog: bool,
        mut collab: Collaborators,
    ) -> Self {
        let high_score = match collab.store.load() {
            Ok(Some(score)) => score,
            Ok(None) => 0,
            Err(error) => {
                tracing::warn!(%error, "high score unavailable, starting from zero");
                0
            }
        };
        let sequencer = encounter.instantiate();
        let dialog = DialogScript::new(encounter.dialog_pages.clone(), autoplay_dialog);
        Self {
            session: Session::new(high_score),
            sequencer,
            script: ScriptedSequencer::new(),
            dialog,
            gate_triggered: false,
            encounter,
            collab,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            target: Vec2::ZERO,
            last_frame_ms: None,
        }
    }

    /// Returns the session state machine.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the phase sequencer.
    #[must_use]
    pub const fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    /// Returns the boss dialog.
    #[must_use]
    pub const fn dialog(&self) -> &DialogScript {
        &self.dialog
    }

    /// Sets the position part behaviors aim at (the player).
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    // -------------------------------------------------------------------------
    // Frame loop
    // -------------------------------------------------------------------------

    /// Frame callback entry point: computes elapsed real time and advances.
    pub fn frame(&mut self, now_ms: f64) {
        let dt = match self.last_frame_ms {
            #[allow(clippy::cast_possible_truncation)]
            Some(prev) => (((now_ms - prev) / MS_PER_TICK) as f32).clamp(0.0, MAX_FRAME_TICKS),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.advance(dt);
    }

    /// Advances the session by `dt` nominal ticks.
    ///
    /// Gameplay subsystems update only while the session is Playing or
    /// Dying; the dialog updates while the session is in the boss dialog;
    /// every other state receives no ticks at all.
    pub fn advance(&mut self, dt: f32) {
        let mut effects = Vec::new();
        match self.session.state() {
            SessionState::Playing | SessionState::Dying => {
                // Death-sequence bookkeeping runs on real ticks.
                effects.extend(self.script.update(dt));
                // Session counters (elapsed, ability, dying countdown).
                effects.extend(self.session.update(dt));
                // Level progression: the boss gate opens the intro dialog.
                if !self.gate_triggered
                    && matches!(self.session.state(), SessionState::Playing)
                    && matches!(self.sequencer.state(), SequencerState::NotStarted)
                    && self.session.elapsed_ticks() >= self.encounter.gate_after_ticks
                {
                    self.gate_triggered = true;
                    effects.extend(self.session.begin_boss_dialog());
                    effects.extend(self.dialog.begin());
                }
                // Encounter update, dilation-scaled.
                if self.session.gameplay_active() {
                    let step = TimeStep::new(dt, self.session.dilation_factor());
                    effects.extend(self.sequencer.update(self.target, step));
                }
            }
            SessionState::BossDialog => effects.extend(self.dialog.update(dt)),
            SessionState::Title
            | SessionState::Paused
            | SessionState::LevelCleared
            | SessionState::GameOver => {}
        }
        self.dispatch(effects);
    }

    // -------------------------------------------------------------------------
    // Input and external events
    // -------------------------------------------------------------------------

    /// Handles one discrete input action.
    pub fn handle_input(&mut self, action: InputAction) {
        let effects = match action {
            InputAction::Start => self.session.play(),
            InputAction::Pause => self.session.pause(),
            InputAction::Dilation => self.session.use_ability(),
            InputAction::Bomb => self.use_bomb(),
            InputAction::AdvanceDialog => self.dialog.advance(),
            InputAction::Restart => {
                if matches!(self.session.state(), SessionState::Title) {
                    Vec::new()
                } else {
                    vec![Effect::RestartRequested]
                }
            }
        };
        self.dispatch(effects);
    }

    /// Visibility-loss safety: backgrounding forces a pause so elapsed
    /// time cannot accumulate unboundedly off-screen.
    pub fn set_visible(&mut self, visible: bool) {
        if !visible && matches!(self.session.state(), SessionState::Playing) {
            let effects = self.session.pause();
            self.dispatch(effects);
        }
    }

    /// Marks the session as cheated (debug/cheat input).
    pub fn mark_cheat_used(&mut self) {
        self.session.mark_cheat_used();
    }

    /// Reports that the player was hit (external collision system).
    ///
    /// Enters the timed dying sub-state; the session resolves it to a
    /// respawn or game over on its own.
    pub fn notify_player_death(&mut self) {
        let effects = self.session.notify_player_death();
        self.dispatch(effects);
    }

    fn use_bomb(&mut self) -> Vec<Effect> {
        if !self.session.take_bomb() {
            return Vec::new();
        }
        // Bombs sweep every vulnerable part and award no score.
        self.sequencer.damage_vulnerable(BOMB_DAMAGE);
        vec![
            Effect::Sound(SoundCue::ExplosionBurst),
            Effect::SpawnExplosion {
                at: self.encounter.boss_origin,
                magnitude: crate::script::DEATH_BURST_MAGNITUDE,
            },
            Effect::RefreshStatus {
                lives: self.session.lives(),
                bombs: self.session.bombs(),
            },
        ]
    }

    // -------------------------------------------------------------------------
    // Collision surface
    // -------------------------------------------------------------------------

    /// Every part collision may currently damage.
    #[must_use]
    pub fn vulnerable_parts(&self) -> Vec<&crate::part::DestructiblePart> {
        self.sequencer.vulnerable_parts()
    }

    /// Hit-tests the active phase.
    #[must_use]
    pub fn part_at_point(&self, point: Vec2) -> Option<&crate::part::DestructiblePart> {
        self.sequencer.part_at_point(point)
    }

    /// Applies collision damage at a point. Returns `true` when a
    /// vulnerable part was hit.
    ///
    /// Awards score on destruction (guarded by the session's cheat flag)
    /// and emits the corresponding sound cue.
    pub fn damage_part_at(&mut self, point: Vec2, amount: f32) -> bool {
        if !matches!(self.session.state(), SessionState::Playing) {
            return false;
        }
        let Some(part) = self.sequencer.part_at_point_mut(point) else {
            return false;
        };
        if !part.is_vulnerable() {
            return false;
        }
        let destroyed = part.apply_damage(amount);
        let mut effects = vec![Effect::Sound(if destroyed {
            SoundCue::PartDestroyed
        } else {
            SoundCue::PartHit
        })];
        if destroyed {
            effects.extend(self.session.add_score(PART_DESTROYED_SCORE));
        }
        self.dispatch(effects);
        true
    }

    /// Renders the active phase onto the surface.
    pub fn render(&self, surface: &mut dyn Surface) {
        self.sequencer.render(surface);
    }

    // -------------------------------------------------------------------------
    // Effect dispatch
    // -------------------------------------------------------------------------

    /// Executes effects: presentation effects route to collaborators,
    /// sequencing effects feed back into the machines until the queue
    /// drains.
    fn dispatch(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect.kind() {
                EffectKind::Presentation => self.present(&effect),
                EffectKind::Sequencing => {
                    let more = self.sequence(&effect);
                    queue.extend(more);
                }
            }
        }
    }

    fn present(&mut self, effect: &Effect) {
        match effect {
            Effect::Sound(cue) => self.collab.audio.play(*cue),
            Effect::Music(cmd) => self.collab.audio.music(*cmd),
            Effect::HudVisible(visible) => self.collab.hud.set_visible(*visible),
            Effect::RefreshScore { score, high_score } => {
                self.collab.hud.show_score(*score, *high_score);
            }
            Effect::RefreshStatus { lives, bombs } => {
                self.collab.hud.show_status(*lives, *bombs);
            }
            Effect::SpawnExplosion { at, magnitude } => {
                self.collab.fx.spawn_explosion(*at, *magnitude);
            }
            Effect::SaveHighScore(score) => {
                if let Err(error) = self.collab.store.save(*score) {
                    tracing::warn!(%error, "high score save skipped");
                }
            }
            Effect::DialogComplete
            | Effect::EncounterComplete
            | Effect::LevelCleared
            | Effect::RestartRequested => {}
        }
    }

    fn sequence(&mut self, effect: &Effect) -> Vec<Effect> {
        match effect {
            Effect::DialogComplete => {
                // The boss is not constructed until the dialog finishes;
                // only now does the sequencer receive start().
                let mut fx = self.session.dialog_complete();
                fx.extend(self.sequencer.start());
                fx
            }
            Effect::EncounterComplete => {
                schedule_boss_death(&mut self.script, self.encounter.boss_origin, &mut self.rng);
                Vec::new()
            }
            Effect::LevelCleared => self.session.level_cleared(),
            Effect::RestartRequested => self.perform_restart(),
            _ => Vec::new(),
        }
    }

    /// Full session restart: every sequencer and phase returns to its
    /// initial state before the next tick, pending script steps are
    /// cancelled, and the RNG is reseeded. The high score survives.
    fn perform_restart(&mut self) -> Vec<Effect> {
        tracing::debug!("session restart");
        self.sequencer = self.encounter.instantiate();
        self.script.reset();
        self.dialog.reset();
        self.gate_triggered = false;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.session.restart()
    }
}

//! Phase sequencer: ordered boss-fight progression with a buffered gap
//! between phases.
//!
//! The sequencer is the only component with authority to activate and
//! deactivate phases. It is an explicit state machine:
//!
//! ```text
//! NotStarted --start()--> Active(0)
//! Active(i)  --complete--> Transitioning{i+1}  (60-tick buffer)
//! Transitioning{i+1} --countdown--> Active(i+1)
//! Active(last) --complete--> Complete
//! ```
//!
//! During the transition buffer nothing is active, rendered, or hittable —
//! the intended "breather" between phases. Instantaneous swaps would let
//! residual collision queries or rendering reach a half-constructed next
//! phase; the fixed buffer guarantees a clean boundary and gives the
//! presentation layer a window for a cut. The countdown decrements by the
//! dilation-scaled step, so slow motion stretches the buffer too.
//!
//! # Determinism
//!
//! Completion is detected and the transition committed within the same
//! tick the last part is destroyed, and the sequencer's render/hit-test
//! delegation happens after the update in the frame order — a
//! just-completed phase never renders and is never hittable in the tick it
//! completes. The phase index strictly increases; a sequencer never
//! re-enters a prior phase.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collab::Surface;
use crate::effect::{Effect, SoundCue};
use crate::part::DestructiblePart;
use crate::phase::{Phase, PhaseDef};
use crate::time::TimeStep;

/// Length of the inter-phase transition buffer, in dilation-adjusted ticks
/// (one second at the nominal tick rate).
pub const TRANSITION_TICKS: f32 = 60.0;

// =============================================================================
// State
// =============================================================================

/// Explicit sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SequencerState {
    /// `start()` has not been called yet.
    NotStarted,
    /// The phase at this index is active.
    Active(usize),
    /// Between phases: nothing is active or hittable.
    Transitioning {
        /// Index of the phase that activates when the countdown ends.
        next: usize,
        /// Remaining buffer, in dilation-adjusted ticks.
        remaining: f32,
    },
    /// The index advanced past the last phase; terminal.
    Complete,
}

// =============================================================================
// PhaseSequencer
// =============================================================================

/// Ordered list of phases, advanced on completion with a buffered gap.
#[derive(Debug)]
pub struct PhaseSequencer {
    phases: Vec<Phase>,
    state: SequencerState,
}

impl PhaseSequencer {
    /// Creates a sequencer over an ordered phase list.
    #[must_use]
    pub fn new(phases: Vec<Phase>) -> Self {
        Self {
            phases,
            state: SequencerState::NotStarted,
        }
    }

    /// Returns the current sequencer state.
    #[must_use]
    pub const fn state(&self) -> SequencerState {
        self.state
    }

    /// Returns the number of phases.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Returns `true` once the sequence has run to completion.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SequencerState::Complete)
    }

    /// Returns the active phase, if any. `None` while transitioning.
    #[must_use]
    pub fn current_phase(&self) -> Option<&Phase> {
        match self.state {
            SequencerState::Active(i) => self.phases.get(i),
            _ => None,
        }
    }

    /// Activates the first phase.
    ///
    /// No-op on an empty phase list (callers must not rely on completion
    /// events in that case) and on repeat calls.
    pub fn start(&mut self) -> Vec<Effect> {
        if !matches!(self.state, SequencerState::NotStarted) || self.phases.is_empty() {
            return Vec::new();
        }
        self.state = SequencerState::Active(0);
        tracing::debug!(phase = %self.phases[0].name(), "sequencer start");
        self.phases[0].enter()
    }

    /// Advances past the current phase.
    ///
    /// Called from within [`Self::update`] upon detecting completion.
    /// Guarded: while already transitioning (or in any non-active state)
    /// the call is a silent no-op, so a double advance within one tick
    /// cannot skip a phase index.
    pub fn advance(&mut self) -> Vec<Effect> {
        let SequencerState::Active(index) = self.state else {
            return Vec::new();
        };
        let mut effects = self.phases[index].exit();
        effects.push(Effect::Sound(SoundCue::PhaseCleared));

        let next = index + 1;
        if next < self.phases.len() {
            self.state = SequencerState::Transitioning {
                next,
                remaining: TRANSITION_TICKS,
            };
        } else {
            self.state = SequencerState::Complete;
            tracing::debug!("sequencer complete");
            effects.push(Effect::EncounterComplete);
        }
        effects
    }

    /// Drives the sequencer by one step.
    ///
    /// While transitioning, only the countdown advances (scaled by
    /// dilation) and no phase is touched this tick; the deferred phase
    /// activates when the countdown reaches zero. While a phase is active
    /// it is updated, then completion is checked and the advance happens
    /// within the same tick — the transition buffer begins on the very
    /// tick the last part is destroyed.
    pub fn update(&mut self, target: Vec2, step: TimeStep) -> Vec<Effect> {
        match self.state {
            SequencerState::Transitioning { next, remaining } => {
                let remaining = remaining - step.scaled();
                if remaining <= 0.0 {
                    self.state = SequencerState::Active(next);
                    self.phases[next].enter()
                } else {
                    self.state = SequencerState::Transitioning { next, remaining };
                    Vec::new()
                }
            }
            SequencerState::Active(index) => {
                self.phases[index].update(target, step);
                if self.phases[index].is_complete() {
                    self.advance()
                } else {
                    Vec::new()
                }
            }
            SequencerState::NotStarted | SequencerState::Complete => Vec::new(),
        }
    }

    /// Collects vulnerable parts from the active phase only.
    #[must_use]
    pub fn vulnerable_parts(&self) -> Vec<&DestructiblePart> {
        self.current_phase()
            .map(Phase::vulnerable_parts)
            .unwrap_or_default()
    }

    /// Hit-tests the active phase only.
    #[must_use]
    pub fn part_at_point(&self, point: Vec2) -> Option<&DestructiblePart> {
        self.current_phase().and_then(|p| p.part_at_point(point))
    }

    /// Mutable variant of [`Self::part_at_point`], for damage application.
    #[must_use]
    pub fn part_at_point_mut(&mut self, point: Vec2) -> Option<&mut DestructiblePart> {
        match self.state {
            SequencerState::Active(i) => self.phases[i].part_at_point_mut(point),
            _ => None,
        }
    }

    /// Damages every currently vulnerable part in the active phase (bomb
    /// sweep), returning how many were destroyed. Nothing during the
    /// buffer.
    pub fn damage_vulnerable(&mut self, amount: f32) -> u32 {
        match self.state {
            SequencerState::Active(i) => self.phases[i].damage_vulnerable(amount),
            _ => 0,
        }
    }

    /// Renders the active phase only; nothing during the buffer.
    pub fn render(&self, surface: &mut dyn Surface) {
        if let Some(phase) = self.current_phase() {
            phase.render(surface);
        }
    }
}

// =============================================================================
// Definition (data-driven authoring)
// =============================================================================

/// Declarative definition of a whole encounter.
///
/// This doubles as the restart blueprint: restarting a session
/// re-instantiates the sequencer from the definition, so every phase and
/// part comes back in its initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDef {
    /// World position the boss is anchored at (death bursts radiate from
    /// here).
    pub boss_origin: Vec2,
    /// Playing time, in ticks, before the boss dialog gate opens.
    pub gate_after_ticks: f32,
    /// Dialog pages shown before the encounter starts.
    pub dialog_pages: Vec<String>,
    /// Ordered phase definitions.
    pub phases: Vec<PhaseDef>,
}

impl EncounterDef {
    /// Instantiates a fresh sequencer in its initial state.
    #[must_use]
    pub fn instantiate(&self) -> PhaseSequencer {
        PhaseSequencer::new(self.phases.iter().map(PhaseDef::instantiate).collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Scripted sequences: ordered, delayed side effects.
//!
//! Two users: the boss-dialog intro (page advancement, optionally
//! auto-played) and the scripted boss-death sequence (delayed explosion
//! bursts followed by one final large explosion and the level-cleared
//! transition).
//!
//! Steps accumulate against an update-driven clock in real ticks —
//! deliberately *not* dilation-scaled, since these are cosmetic sequences
//! with no determinism contract. Nothing here suspends: all waiting is a
//! clock comparison checked once per tick.
//!
//! # Cancellation
//!
//! Every scheduled step carries the sequencer's generation at schedule
//! time. [`ScriptedSequencer::reset`] bumps the generation and clears the
//! queue, and the generation is re-checked when a step comes due — a step
//! scheduled before a session restart can never fire against post-restart
//! state.

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::effect::{Effect, SoundCue};

// =============================================================================
// Tuning constants
// =============================================================================

/// Auto-advance interval for dialog pages, in ticks (500 ms at 60 Hz).
pub const DIALOG_AUTO_ADVANCE_TICKS: f32 = 30.0;

/// Number of small bursts in the boss-death chain.
pub const DEATH_BURST_COUNT: usize = 6;

/// Spacing between consecutive bursts, in ticks.
pub const DEATH_BURST_SPACING_TICKS: f32 = 12.0;

/// Offset radius of the first burst; later bursts spread further out.
pub const DEATH_BURST_BASE_SPREAD: f32 = 8.0;

/// Additional spread per burst.
pub const DEATH_BURST_SPREAD_STEP: f32 = 6.0;

/// Magnitude of the small bursts.
pub const DEATH_BURST_MAGNITUDE: f32 = 1.0;

/// Magnitude of the final explosion.
pub const DEATH_FINAL_MAGNITUDE: f32 = 4.0;

/// Pause after the final explosion before the level clears, in ticks.
pub const DEATH_LINGER_TICKS: f32 = 45.0;

// =============================================================================
// ScriptedSequencer
// =============================================================================

#[derive(Debug, Clone)]
struct PendingStep {
    fire_at: f32,
    effect: Effect,
    generation: u64,
}

/// Timer-driven executor for ordered, delayed side effects.
#[derive(Debug, Default)]
pub struct ScriptedSequencer {
    clock: f32,
    generation: u64,
    pending: Vec<PendingStep>,
}

impl ScriptedSequencer {
    /// Creates an idle sequencer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current cancellation generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` when no steps are pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedules an effect to fire `delay` ticks from now.
    pub fn schedule_in(&mut self, delay: f32, effect: Effect) {
        self.pending.push(PendingStep {
            fire_at: self.clock + delay.max(0.0),
            effect,
            generation: self.generation,
        });
    }

    /// Advances the clock and returns every step that came due, in firing
    /// order. Steps from a previous generation are dropped, not fired.
    pub fn update(&mut self, dt: f32) -> Vec<Effect> {
        self.clock += dt;
        let clock = self.clock;
        let generation = self.generation;

        let mut due: Vec<PendingStep> = Vec::new();
        self.pending.retain(|step| {
            if step.fire_at <= clock {
                due.push(step.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));

        due.into_iter()
            .filter(|step| {
                if step.generation == generation {
                    true
                } else {
                    tracing::debug!(generation = step.generation, "dropping stale script step");
                    false
                }
            })
            .map(|step| step.effect)
            .collect()
    }

    /// Cancels every pending step and bumps the generation.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.clock = 0.0;
        self.generation += 1;
    }
}

/// Schedules the scripted boss-death chain: `DEATH_BURST_COUNT` bursts at
/// increasing offsets from `origin`, one final large explosion, then the
/// level-cleared transition.
pub fn schedule_boss_death(script: &mut ScriptedSequencer, origin: Vec2, rng: &mut ChaCha8Rng) {
    for i in 0..DEATH_BURST_COUNT {
        #[allow(clippy::cast_precision_loss)]
        let spread = DEATH_BURST_SPREAD_STEP.mul_add(i as f32, DEATH_BURST_BASE_SPREAD);
        let offset = Vec2::new(
            rng.gen_range(-spread..=spread),
            rng.gen_range(-spread..=spread),
        );
        #[allow(clippy::cast_precision_loss)]
        let at = DEATH_BURST_SPACING_TICKS * (i + 1) as f32;
        script.schedule_in(at, Effect::Sound(SoundCue::ExplosionBurst));
        script.schedule_in(
            at,
            Effect::SpawnExplosion {
                at: origin + offset,
                magnitude: DEATH_BURST_MAGNITUDE,
            },
        );
    }

    #[allow(clippy::cast_precision_loss)]
    let final_at = DEATH_BURST_SPACING_TICKS * (DEATH_BURST_COUNT + 1) as f32;
    script.schedule_in(final_at, Effect::Sound(SoundCue::ExplosionFinal));
    script.schedule_in(
        final_at,
        Effect::SpawnExplosion {
            at: origin,
            magnitude: DEATH_FINAL_MAGNITUDE,
        },
    );
    script.schedule_in(final_at + DEATH_LINGER_TICKS, Effect::LevelCleared);
}

// =============================================================================
// DialogScript
// =============================================================================

/// Boss intro dialog: a page list advanced by input or auto-play.
#[derive(Debug, Clone)]
pub struct DialogScript {
    pages: Vec<String>,
    page: usize,
    active: bool,
    autoplay: bool,
    accum: f32,
}

impl DialogScript {
    /// Creates a dialog over the given pages.
    #[must_use]
    pub fn new(pages: Vec<String>, autoplay: bool) -> Self {
        Self {
            pages,
            page: 0,
            active: false,
            autoplay,
            accum: 0.0,
        }
    }

    /// Returns `true` while pages are being shown.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the page currently shown, if any.
    #[must_use]
    pub fn current_page(&self) -> Option<&str> {
        if !self.active {
            return None;
        }
        self.pages.get(self.page).map(String::as_str)
    }

    /// Starts showing pages from the beginning.
    ///
    /// An empty page list completes immediately.
    pub fn begin(&mut self) -> Vec<Effect> {
        self.page = 0;
        self.accum = 0.0;
        if self.pages.is_empty() {
            self.active = false;
            return vec![Effect::DialogComplete];
        }
        self.active = true;
        Vec::new()
    }

    /// Advances one page. Silent no-op when inactive (input can race the
    /// state machine). Emits [`Effect::DialogComplete`] past the last page.
    pub fn advance(&mut self) -> Vec<Effect> {
        if !self.active {
            return Vec::new();
        }
        self.page += 1;
        if self.page >= self.pages.len() {
            self.active = false;
            vec![
                Effect::Sound(SoundCue::DialogAdvance),
                Effect::DialogComplete,
            ]
        } else {
            vec![Effect::Sound(SoundCue::DialogAdvance)]
        }
    }

    /// Accumulates update time and auto-advances exactly once per
    /// [`DIALOG_AUTO_ADVANCE_TICKS`] of it, independent of frame rate.
    /// No-op unless active and auto-play is enabled.
    pub fn update(&mut self, dt: f32) -> Vec<Effect> {
        if !self.active || !self.autoplay {
            return Vec::new();
        }
        let mut effects = Vec::new();
        self.accum += dt;
        while self.accum >= DIALOG_AUTO_ADVANCE_TICKS && self.active {
            self.accum -= DIALOG_AUTO_ADVANCE_TICKS;
            effects.extend(self.advance());
        }
        effects
    }

    /// Abandons the dialog without completing it (session restart).
    pub fn reset(&mut self) {
        self.active = false;
        self.page = 0;
        self.accum = 0.0;
    }
}

// =============================================================================
// Tests
// =============================================================================

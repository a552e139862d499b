//! # Arclight Core
//!
//! Encounter-orchestration core for the Arclight arcade shooter.
//!
//! This crate provides the nested state machines that sequence a boss
//! fight: hierarchically destructible parts, ordered phases with a
//! buffered transition gap, the top-level session state machine, and the
//! timer-driven scripted sequences (boss-dialog intro, scripted boss
//! death) — all driven by a single per-frame orchestrator with
//! dilation-aware timing.
//!
//! ## Architecture
//!
//! - **Parts** ([`part`]): named composite destructible nodes; pure
//!   recursive aggregation for completeness and vulnerability
//! - **Phases** ([`phase`]): sets of parts active simultaneously, with
//!   enter/exit hooks returning effects
//! - **Sequencer** ([`sequencer`]): the only authority to activate and
//!   deactivate phases; buffers each transition by a fixed countdown
//! - **Session** ([`session`]): title/playing/paused/dying/dialog/
//!   cleared/game-over, plus the dilation factor and the score guard
//! - **Scripts** ([`script`]): ordered delayed side effects with
//!   generation-counted cancellation
//! - **Orchestrator** ([`orchestrator`]): the frame loop, fixed update
//!   order, and effect dispatch to the collaborator seams ([`collab`])
//!
//! State machines return [`effect::Effect`] proposals instead of
//! performing side effects; the orchestrator is the single executor.
//!
//! ## Example
//!
//! ```
//! use arclight_core::collab::Collaborators;
//! use arclight_core::orchestrator::{InputAction, UpdateOrchestrator};
//! use arclight_core::part::{HitRegion, PartDef};
//! use arclight_core::phase::PhaseDef;
//! use arclight_core::sequencer::EncounterDef;
//! use glam::Vec2;
//!
//! let encounter = EncounterDef {
//!     boss_origin: Vec2::new(120.0, 40.0),
//!     gate_after_ticks: 0.0,
//!     dialog_pages: vec!["I have been waiting.".to_string()],
//!     phases: vec![PhaseDef {
//!         name: "opening".to_string(),
//!         parts: vec![PartDef {
//!             name: "hull".to_string(),
//!             max_hp: 100.0,
//!             region: HitRegion::new(Vec2::new(120.0, 40.0), Vec2::splat(16.0)),
//!             guard: arclight_core::part::GuardPolicy::Exposed,
//!             motion: arclight_core::part::Motion::Stationary,
//!             animate_debris: false,
//!             children: vec![],
//!         }],
//!     }],
//! };
//!
//! let mut game = UpdateOrchestrator::new(42, encounter, false, Collaborators::default());
//! game.handle_input(InputAction::Start);
//! game.advance(1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collab;
pub mod effect;
pub mod error;
pub mod orchestrator;
pub mod part;
pub mod phase;
pub mod script;
pub mod sequencer;
pub mod session;
pub mod time;

pub use collab::Collaborators;
pub use effect::{Effect, SoundCue};
pub use orchestrator::{InputAction, UpdateOrchestrator};
pub use part::{DestructiblePart, GuardPolicy, HitRegion, PartName};
pub use phase::{Phase, PhaseScript};
pub use sequencer::{EncounterDef, PhaseSequencer, SequencerState};
pub use session::{Session, SessionState};
pub use time::TimeStep;

#[cfg(test)]
mod tests;

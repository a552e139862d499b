//! Phases: the unit of boss-fight progression.
//!
//! A [`Phase`] owns a mapping of named top-level [`DestructiblePart`]s that
//! are active simultaneously. It is complete when every owned part is
//! completely destroyed, and it exposes aggregate vulnerability and
//! hit-test queries only while active — deactivation is the mechanism by
//! which an exited phase stops being interactive without deleting its
//! state.
//!
//! Enter/exit hooks are supplied as a [`PhaseScript`] trait object. Hooks
//! return [`Effect`]s rather than performing side effects, so phase content
//! (music cues, spawning extra parts) stays testable.

use glam::Vec2;

use crate::collab::Surface;
use crate::effect::Effect;
use crate::part::{DestructiblePart, PartDef, PartMap, PartName};
use crate::time::TimeStep;

// =============================================================================
// Phase scripts
// =============================================================================

/// Enter/exit lifecycle hooks for a phase.
///
/// `on_enter` runs exactly once when the sequencer activates the phase;
/// `on_exit` runs exactly once, before the next phase's `on_enter`, when
/// completion is detected. Single invocation is guaranteed by the caller.
/// Both hooks may mutate the part map (e.g. spawn extra parts) and return
/// effects for the orchestrator to execute.
pub trait PhaseScript: Send {
    /// Called when the phase activates.
    fn on_enter(&mut self, parts: &mut PartMap) -> Vec<Effect> {
        let _ = parts;
        Vec::new()
    }

    /// Called when the phase completes.
    fn on_exit(&mut self, parts: &mut PartMap) -> Vec<Effect> {
        let _ = parts;
        Vec::new()
    }
}

// =============================================================================
// Phase
// =============================================================================

/// A set of parts active simultaneously.
pub struct Phase {
    name: String,
    parts: PartMap,
    active: bool,
    completed: bool,
    script: Option<Box<dyn PhaseScript>>,
}

impl std::fmt::Debug for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("parts", &self.parts)
            .field("active", &self.active)
            .field("completed", &self.completed)
            .field("script", &self.script.as_ref().map(|_| "<script>"))
            .finish()
    }
}

impl Phase {
    /// Creates a phase from its initial part set.
    #[must_use]
    pub fn new(name: &str, parts: impl IntoIterator<Item = DestructiblePart>) -> Self {
        let parts = parts
            .into_iter()
            .map(|p| (p.name().clone(), p))
            .collect::<PartMap>();
        Self {
            name: name.to_string(),
            parts,
            active: false,
            completed: false,
            script: None,
        }
    }

    /// Attaches enter/exit hooks.
    #[must_use]
    pub fn with_script(mut self, script: Box<dyn PhaseScript>) -> Self {
        self.script = Some(script);
        self
    }

    /// Returns the phase name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` while the phase is the active one.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` once the phase has exited.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the owned top-level parts.
    #[must_use]
    pub const fn parts(&self) -> &PartMap {
        &self.parts
    }

    /// Activates the phase. Called exactly once by the sequencer.
    pub fn enter(&mut self) -> Vec<Effect> {
        self.active = true;
        self.completed = false;
        tracing::debug!(phase = %self.name, "phase enter");
        match self.script.as_mut() {
            Some(script) => script.on_enter(&mut self.parts),
            None => Vec::new(),
        }
    }

    /// Deactivates the phase. Called exactly once by the sequencer, before
    /// the next phase's [`Self::enter`]. No further update or render calls
    /// are made afterwards (enforced by the sequencer).
    pub fn exit(&mut self) -> Vec<Effect> {
        self.active = false;
        self.completed = true;
        tracing::debug!(phase = %self.name, "phase exit");
        match self.script.as_mut() {
            Some(script) => script.on_exit(&mut self.parts),
            None => Vec::new(),
        }
    }

    /// Updates every owned part. No-op while inactive.
    pub fn update(&mut self, target: Vec2, step: TimeStep) {
        if !self.active {
            return;
        }
        for part in self.parts.values_mut() {
            part.update(target, step);
        }
    }

    /// Returns `true` iff every owned top-level part is completely
    /// destroyed. Re-evaluated by the sequencer every tick, never cached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.parts
            .values()
            .all(DestructiblePart::is_completely_destroyed)
    }

    /// Collects every currently vulnerable part. Empty while inactive.
    #[must_use]
    pub fn vulnerable_parts(&self) -> Vec<&DestructiblePart> {
        if !self.active {
            return Vec::new();
        }
        self.parts
            .values()
            .flat_map(DestructiblePart::vulnerable_parts)
            .collect()
    }

    /// Damages every currently vulnerable part by `amount` (bomb sweep),
    /// returning how many were destroyed. No-op while inactive.
    pub fn damage_vulnerable(&mut self, amount: f32) -> u32 {
        if !self.active {
            return 0;
        }
        self.parts
            .values_mut()
            .map(|p| p.damage_vulnerable(amount))
            .sum()
    }

    /// Returns the deepest live part containing the point. `None` while
    /// inactive.
    #[must_use]
    pub fn part_at_point(&self, point: Vec2) -> Option<&DestructiblePart> {
        if !self.active {
            return None;
        }
        self.parts.values().find_map(|p| p.part_at_point(point))
    }

    /// Mutable variant of [`Self::part_at_point`].
    #[must_use]
    pub fn part_at_point_mut(&mut self, point: Vec2) -> Option<&mut DestructiblePart> {
        if !self.active {
            return None;
        }
        let owner: Option<PartName> = self
            .parts
            .iter()
            .find(|(_, p)| p.part_at_point(point).is_some())
            .map(|(name, _)| name.clone());
        owner.and_then(move |name| {
            self.parts
                .get_mut(&name)
                .and_then(|p| p.part_at_point_mut(point))
        })
    }

    /// Renders the part trees. No-op while inactive.
    pub fn render(&self, surface: &mut dyn Surface) {
        if !self.active {
            return;
        }
        for part in self.parts.values() {
            part.render(surface);
        }
    }
}

// =============================================================================
// Definition (data-driven authoring)
// =============================================================================

/// Declarative definition of a phase.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhaseDef {
    /// Phase name.
    pub name: String,
    /// Top-level part definitions.
    pub parts: Vec<PartDef>,
}

impl PhaseDef {
    /// Instantiates the definition into a live phase (no script attached).
    #[must_use]
    pub fn instantiate(&self) -> Phase {
        Phase::new(self.name.as_str(), self.parts.iter().map(PartDef::instantiate))
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Destructible part trees: the composite entities a boss is built from.
//!
//! A [`DestructiblePart`] is a named node that may own child parts. Damage
//! is applied to individual nodes by the external collision system, and
//! completeness/vulnerability aggregate over the tree with pure recursive
//! queries:
//!
//! - A part is *completely destroyed* iff its own `DESTROYED` flag is set
//!   AND every child is completely destroyed (recursive, post-order).
//! - A part is *vulnerable* iff it is not completely destroyed and its
//!   [`GuardPolicy`] allows damage (an armored core only opens up once its
//!   shielding children are gone — the policy belongs to the entity, not
//!   to the aggregator).
//!
//! Each part is exclusively owned by its parent; there are no shared
//! references between siblings. Child storage is a `BTreeMap` keyed by
//! [`PartName`], so every traversal is deterministic across platforms.
//!
//! # Example
//!
//! ```
//! use arclight_core::part::{DestructiblePart, GuardPolicy, HitRegion};
//! use glam::Vec2;
//!
//! let core = DestructiblePart::new("core", 100.0, HitRegion::new(Vec2::ZERO, Vec2::splat(8.0)))
//!     .with_guard(GuardPolicy::ShieldedByChildren)
//!     .with_child(DestructiblePart::new(
//!         "shield",
//!         40.0,
//!         HitRegion::new(Vec2::new(0.0, -16.0), Vec2::splat(12.0)),
//!     ));
//!
//! // The core is armored until the shield falls.
//! assert!(!core.is_vulnerable());
//! assert_eq!(core.vulnerable_parts().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collab::Surface;
use crate::time::TimeStep;

/// Top-level and child part storage: name → exclusively-owned part.
pub type PartMap = BTreeMap<PartName, DestructiblePart>;

// =============================================================================
// Identity
// =============================================================================

/// Name of a part, unique within its parent's child map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartName(String);

impl PartName {
    /// Creates a new part name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PartName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Status, guard policy, hit region, motion
// =============================================================================

bitflags! {
    /// Per-part status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PartFlags: u8 {
        /// Local hit points reached zero.
        const DESTROYED = 1 << 0;
        /// Keep advancing motion after destruction (debris/despawn animation).
        const ANIMATE_DEBRIS = 1 << 1;
    }
}

impl Default for PartFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Local vulnerability policy, supplied by the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuardPolicy {
    /// Damageable whenever the part itself is alive.
    #[default]
    Exposed,
    /// Damageable only once every child is completely destroyed.
    ShieldedByChildren,
}

/// Axis-aligned hit region for point containment queries.
///
/// The core performs no geometric hit-testing beyond this containment
/// delegation; concrete per-part geometry is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRegion {
    /// World-space center of the region.
    pub center: Vec2,
    /// Half extents along each axis.
    pub half_extents: Vec2,
}

impl HitRegion {
    /// Creates a new hit region.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Returns `true` if the point lies inside the region (inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let d = point - self.center;
        d.x.abs() <= self.half_extents.x && d.y.abs() <= self.half_extents.y
    }
}

/// Per-tick behavior of a part, advanced by the dilation-scaled step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// No local behavior.
    Stationary,
    /// Turret-style aim: heading slews toward the target at a fixed rate.
    TrackTarget {
        /// Maximum turn rate in radians per tick.
        turn_rate: f32,
        /// Current heading in radians (counter-clockwise from +X).
        heading: f32,
    },
    /// Sinusoidal sway around a fixed origin.
    Oscillate {
        /// Rest position of the region center.
        origin: Vec2,
        /// Peak displacement along each axis.
        amplitude: Vec2,
        /// Full oscillation period in ticks.
        period_ticks: f32,
        /// Accumulated scaled time.
        elapsed: f32,
    },
}

impl Motion {
    fn update(&mut self, region: &mut HitRegion, target: Vec2, step: TimeStep) {
        match self {
            Self::Stationary => {}
            Self::TrackTarget { turn_rate, heading } => {
                let to_target = target - region.center;
                let desired = to_target.y.atan2(to_target.x);
                let mut delta = desired - *heading;
                // Wrap into (-PI, PI] so the turret takes the short way round.
                while delta > std::f32::consts::PI {
                    delta -= std::f32::consts::TAU;
                }
                while delta < -std::f32::consts::PI {
                    delta += std::f32::consts::TAU;
                }
                let max = *turn_rate * step.scaled();
                *heading += delta.clamp(-max, max);
            }
            Self::Oscillate {
                origin,
                amplitude,
                period_ticks,
                elapsed,
            } => {
                *elapsed += step.scaled();
                if *period_ticks > 0.0 {
                    let angle = std::f32::consts::TAU * (*elapsed / *period_ticks);
                    region.center = *origin + *amplitude * angle.sin();
                }
            }
        }
    }
}

// =============================================================================
// DestructiblePart
// =============================================================================

/// A named, possibly-composite destructible entity within a boss.
///
/// Parts are created when their owning phase is constructed, mutated by
/// damage application and their own per-tick behavior, and discarded en
/// masse with the phase. They are never destroyed individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestructiblePart {
    name: PartName,
    hp: f32,
    max_hp: f32,
    flags: PartFlags,
    guard: GuardPolicy,
    region: HitRegion,
    motion: Motion,
    children: PartMap,
}

impl DestructiblePart {
    /// Creates a new part with full hit points and no children.
    #[must_use]
    pub fn new(name: impl Into<PartName>, max_hp: f32, region: HitRegion) -> Self {
        Self {
            name: name.into(),
            hp: max_hp,
            max_hp,
            flags: PartFlags::empty(),
            guard: GuardPolicy::Exposed,
            region,
            motion: Motion::Stationary,
            children: PartMap::new(),
        }
    }

    /// Sets the vulnerability policy.
    #[must_use]
    pub fn with_guard(mut self, guard: GuardPolicy) -> Self {
        self.guard = guard;
        self
    }

    /// Sets the per-tick behavior.
    #[must_use]
    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    /// Sets status flags (e.g. [`PartFlags::ANIMATE_DEBRIS`]).
    #[must_use]
    pub fn with_flags(mut self, flags: PartFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Adds a child part, keyed by its name.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.insert(child.name.clone(), child);
        self
    }

    /// Returns the part's name.
    #[must_use]
    pub fn name(&self) -> &PartName {
        &self.name
    }

    /// Returns the remaining hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Returns the maximum hit points (for damage-state presentation).
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Returns the current status flags.
    #[must_use]
    pub const fn flags(&self) -> PartFlags {
        self.flags
    }

    /// Returns the current hit region.
    #[must_use]
    pub const fn region(&self) -> HitRegion {
        self.region
    }

    /// Returns the child parts.
    #[must_use]
    pub const fn children(&self) -> &PartMap {
        &self.children
    }

    /// Returns `true` if this node's own hit points reached zero.
    ///
    /// This is the *local* flag only; see [`Self::is_completely_destroyed`]
    /// for the aggregate.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.flags.contains(PartFlags::DESTROYED)
    }

    /// Returns `true` iff this part and every descendant are destroyed.
    ///
    /// Pure query with no side effects, safe to call every frame.
    #[must_use]
    pub fn is_completely_destroyed(&self) -> bool {
        self.is_destroyed()
            && self
                .children
                .values()
                .all(DestructiblePart::is_completely_destroyed)
    }

    /// Returns `true` if damage may currently be applied to this node.
    #[must_use]
    pub fn is_vulnerable(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        match self.guard {
            GuardPolicy::Exposed => true,
            GuardPolicy::ShieldedByChildren => self
                .children
                .values()
                .all(DestructiblePart::is_completely_destroyed),
        }
    }

    /// Advances local behavior, scaled by the step's dilation factor.
    ///
    /// Invoked on every active part unconditionally; a destroyed part keeps
    /// animating only while [`PartFlags::ANIMATE_DEBRIS`] is set.
    pub fn update(&mut self, target: Vec2, step: TimeStep) {
        if !self.is_destroyed() || self.flags.contains(PartFlags::ANIMATE_DEBRIS) {
            self.motion.update(&mut self.region, target, step);
        }
        for child in self.children.values_mut() {
            child.update(target, step);
        }
    }

    /// Applies damage, returning `true` if this call destroyed the part.
    ///
    /// Damage against a part that is not currently vulnerable is a silent
    /// no-op: collision queries can race destruction within a tick.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.is_vulnerable() {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.flags.insert(PartFlags::DESTROYED);
            tracing::debug!(part = %self.name, "part destroyed");
            return true;
        }
        false
    }

    /// Damages every currently vulnerable part in the tree by `amount`,
    /// returning how many were destroyed.
    ///
    /// Vulnerability is sampled before descendants are damaged, so a
    /// shielded core is not opened up and hit by the same sweep that
    /// removed its shields.
    pub fn damage_vulnerable(&mut self, amount: f32) -> u32 {
        let was_vulnerable = self.is_vulnerable();
        let mut destroyed = 0;
        for child in self.children.values_mut() {
            destroyed += child.damage_vulnerable(amount);
        }
        if was_vulnerable && self.apply_damage(amount) {
            destroyed += 1;
        }
        destroyed
    }

    /// Collects, depth-first, every part (including self) that is currently
    /// vulnerable.
    ///
    /// Used both for rendering highlight and for restricting which parts
    /// collision may damage.
    #[must_use]
    pub fn vulnerable_parts(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        self.collect_vulnerable(&mut out);
        out
    }

    fn collect_vulnerable<'a>(&'a self, out: &mut Vec<&'a Self>) {
        if self.is_vulnerable() {
            out.push(self);
        }
        for child in self.children.values() {
            child.collect_vulnerable(out);
        }
    }

    /// Returns the deepest live part whose hit region contains the point.
    ///
    /// Children are tested before the parent is considered a match, so
    /// child hit regions take precedence; among children the first match in
    /// name order wins. Completely destroyed subtrees are transparent.
    #[must_use]
    pub fn part_at_point(&self, point: Vec2) -> Option<&Self> {
        for child in self.children.values() {
            if let Some(hit) = child.part_at_point(point) {
                return Some(hit);
            }
        }
        if !self.is_completely_destroyed() && self.region.contains(point) {
            return Some(self);
        }
        None
    }

    /// Mutable variant of [`Self::part_at_point`], for damage application.
    #[must_use]
    pub fn part_at_point_mut(&mut self, point: Vec2) -> Option<&mut Self> {
        // Resolve the hit immutably first so the borrow checker accepts a
        // single mutable traversal along the matched path.
        let in_child = self
            .children
            .iter()
            .find(|(_, c)| c.part_at_point(point).is_some())
            .map(|(name, _)| name.clone());
        if let Some(name) = in_child {
            return self
                .children
                .get_mut(&name)
                .and_then(|c| c.part_at_point_mut(point));
        }
        if !self.is_completely_destroyed() && self.region.contains(point) {
            return Some(self);
        }
        None
    }

    /// Draws this part and its children onto the surface, parent first.
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.draw_part(&self.name, self.region, self.is_destroyed());
        for child in self.children.values() {
            child.render(surface);
        }
    }
}

// =============================================================================
// Definition (data-driven authoring)
// =============================================================================

/// Declarative definition of a part tree, instantiated per phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDef {
    /// Part name, unique among siblings.
    pub name: String,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Initial hit region.
    pub region: HitRegion,
    /// Vulnerability policy.
    #[serde(default)]
    pub guard: GuardPolicy,
    /// Per-tick behavior.
    #[serde(default = "PartDef::default_motion")]
    pub motion: Motion,
    /// Keep animating after destruction.
    #[serde(default)]
    pub animate_debris: bool,
    /// Child part definitions.
    #[serde(default)]
    pub children: Vec<PartDef>,
}

impl PartDef {
    fn default_motion() -> Motion {
        Motion::Stationary
    }

    /// Instantiates the definition into a live part tree.
    #[must_use]
    pub fn instantiate(&self) -> DestructiblePart {
        let mut flags = PartFlags::empty();
        if self.animate_debris {
            flags |= PartFlags::ANIMATE_DEBRIS;
        }
        let mut part = DestructiblePart::new(self.name.as_str(), self.max_hp, self.region)
            .with_guard(self.guard)
            .with_motion(self.motion.clone())
            .with_flags(flags);
        for child in &self.children {
            part = part.with_child(child.instantiate());
        }
        part
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, hp: f32) -> DestructiblePart {
        DestructiblePart::new(name, hp, HitRegion::new(Vec2::ZERO, Vec2::splat(4.0)))
    }

    fn destroy(part: &mut DestructiblePart) {
        while !part.is_destroyed() && part.is_vulnerable() {
            part.apply_damage(part.hp());
        }
    }

    mod aggregation_tests {
        use super::*;

        #[test]
        fn leaf_completeness_follows_local_flag() {
            let mut part = leaf("pod", 10.0);
            assert!(!part.is_completely_destroyed());

            assert!(part.apply_damage(10.0));
            assert!(part.is_completely_destroyed());
        }

        #[test]
        fn destroying_only_the_parent_is_not_complete() {
            let mut part = leaf("hull", 10.0).with_child(leaf("fin", 5.0));
            destroy(&mut part);

            assert!(part.is_destroyed());
            assert!(!part.is_completely_destroyed());
        }

        #[test]
        fn two_level_tree_completes_bottom_up() {
            let mut part = leaf("hull", 10.0).with_child(leaf("fin", 5.0));

            let fin = PartName::new("fin");
            destroy(part.children.get_mut(&fin).unwrap());
            assert!(!part.is_completely_destroyed());

            destroy(&mut part);
            assert!(part.is_completely_destroyed());
        }
    }

    mod vulnerability_tests {
        use super::*;

        #[test]
        fn shielded_core_opens_after_children_fall() {
            let mut core = leaf("core", 50.0)
                .with_guard(GuardPolicy::ShieldedByChildren)
                .with_child(leaf("shield", 10.0));

            assert!(!core.is_vulnerable());
            // Damage against an armored core is swallowed.
            assert!(!core.apply_damage(25.0));
            assert!((core.hp() - 50.0).abs() < f32::EPSILON);

            destroy(core.children.get_mut(&PartName::new("shield")).unwrap());
            assert!(core.is_vulnerable());
            assert!(!core.apply_damage(25.0));
            assert!(core.apply_damage(25.0));
        }

        #[test]
        fn vulnerable_parts_walks_the_whole_tree() {
            let tree = leaf("hull", 10.0)
                .with_child(leaf("left", 5.0))
                .with_child(leaf("right", 5.0));

            let names: Vec<_> = tree
                .vulnerable_parts()
                .iter()
                .map(|p| p.name().as_str().to_string())
                .collect();
            assert_eq!(names, vec!["hull", "left", "right"]);
        }

        #[test]
        fn destroyed_parts_drop_out_of_vulnerable_set() {
            let mut tree = leaf("hull", 10.0).with_child(leaf("fin", 5.0));
            destroy(tree.children.get_mut(&PartName::new("fin")).unwrap());

            let names: Vec<_> = tree
                .vulnerable_parts()
                .iter()
                .map(|p| p.name().as_str().to_string())
                .collect();
            assert_eq!(names, vec!["hull"]);
        }
    }

    mod hit_test_tests {
        use super::*;

        #[test]
        fn child_regions_take_precedence() {
            let tree = DestructiblePart::new(
                "hull",
                10.0,
                HitRegion::new(Vec2::ZERO, Vec2::splat(20.0)),
            )
            .with_child(DestructiblePart::new(
                "turret",
                5.0,
                HitRegion::new(Vec2::new(5.0, 5.0), Vec2::splat(2.0)),
            ));

            let hit = tree.part_at_point(Vec2::new(5.0, 5.0)).unwrap();
            assert_eq!(hit.name().as_str(), "turret");

            let hit = tree.part_at_point(Vec2::new(-10.0, 0.0)).unwrap();
            assert_eq!(hit.name().as_str(), "hull");
        }

        #[test]
        fn miss_returns_none() {
            let tree = leaf("hull", 10.0);
            assert!(tree.part_at_point(Vec2::new(100.0, 100.0)).is_none());
        }

        #[test]
        fn completely_destroyed_subtrees_are_transparent() {
            let mut tree = leaf("hull", 10.0);
            destroy(&mut tree);
            assert!(tree.part_at_point(Vec2::ZERO).is_none());
        }

        #[test]
        fn mutable_lookup_matches_immutable() {
            let mut tree = DestructiblePart::new(
                "hull",
                10.0,
                HitRegion::new(Vec2::ZERO, Vec2::splat(20.0)),
            )
            .with_child(DestructiblePart::new(
                "turret",
                5.0,
                HitRegion::new(Vec2::new(5.0, 5.0), Vec2::splat(2.0)),
            ));

            let hit = tree.part_at_point_mut(Vec2::new(5.0, 5.0)).unwrap();
            assert_eq!(hit.name().as_str(), "turret");
            assert!(hit.apply_damage(5.0));
        }
    }

    mod motion_tests {
        use super::*;

        #[test]
        fn oscillation_scales_with_dilation() {
            let motion = Motion::Oscillate {
                origin: Vec2::ZERO,
                amplitude: Vec2::new(10.0, 0.0),
                period_ticks: 60.0,
                elapsed: 0.0,
            };
            let mut fast = leaf("a", 1.0).with_motion(motion.clone());
            let mut slow = leaf("b", 1.0).with_motion(motion);

            // 15 undilated ticks vs 75 ticks at 0.2 dilation: same scaled time.
            for _ in 0..15 {
                fast.update(Vec2::ZERO, TimeStep::ONE);
            }
            for _ in 0..75 {
                slow.update(Vec2::ZERO, TimeStep::new(1.0, 0.2));
            }

            let d = fast.region().center - slow.region().center;
            assert!(d.length() < 0.001);
        }

        #[test]
        fn destroyed_part_stops_unless_flagged_for_debris() {
            let motion = Motion::Oscillate {
                origin: Vec2::ZERO,
                amplitude: Vec2::new(10.0, 0.0),
                period_ticks: 60.0,
                elapsed: 0.0,
            };
            let mut frozen = leaf("a", 1.0).with_motion(motion.clone());
            let mut debris = leaf("b", 1.0)
                .with_motion(motion)
                .with_flags(PartFlags::ANIMATE_DEBRIS);
            destroy(&mut frozen);
            destroy(&mut debris);

            for _ in 0..15 {
                frozen.update(Vec2::ZERO, TimeStep::ONE);
                debris.update(Vec2::ZERO, TimeStep::ONE);
            }

            assert_eq!(frozen.region().center, Vec2::ZERO);
            assert!(debris.region().center.length() > 0.1);
        }

        #[test]
        fn turret_slews_toward_target() {
            let mut turret = leaf("turret", 1.0).with_motion(Motion::TrackTarget {
                turn_rate: 0.1,
                heading: 0.0,
            });
            for _ in 0..30 {
                turret.update(Vec2::new(0.0, 100.0), TimeStep::ONE);
            }
            if let Motion::TrackTarget { heading, .. } = turret.motion {
                assert!((heading - std::f32::consts::FRAC_PI_2).abs() < 0.01);
            } else {
                unreachable!();
            }
        }
    }

    mod def_tests {
        use super::*;

        #[test]
        fn instantiate_builds_the_tree() {
            let def = PartDef {
                name: "hull".to_string(),
                max_hp: 100.0,
                region: HitRegion::new(Vec2::ZERO, Vec2::splat(16.0)),
                guard: GuardPolicy::ShieldedByChildren,
                motion: Motion::Stationary,
                animate_debris: false,
                children: vec![PartDef {
                    name: "fin".to_string(),
                    max_hp: 20.0,
                    region: HitRegion::new(Vec2::new(16.0, 0.0), Vec2::splat(4.0)),
                    guard: GuardPolicy::Exposed,
                    motion: Motion::Stationary,
                    animate_debris: true,
                    children: vec![],
                }],
            };

            let part = def.instantiate();
            assert_eq!(part.name().as_str(), "hull");
            assert_eq!(part.children().len(), 1);
            assert!(!part.is_vulnerable());
            let fin = part.children().get(&PartName::new("fin")).unwrap();
            assert!(fin.flags().contains(PartFlags::ANIMATE_DEBRIS));
        }

        #[test]
        fn serialization_roundtrip() {
            let def = PartDef {
                name: "pod".to_string(),
                max_hp: 30.0,
                region: HitRegion::new(Vec2::new(1.0, 2.0), Vec2::splat(3.0)),
                guard: GuardPolicy::Exposed,
                motion: Motion::Oscillate {
                    origin: Vec2::new(1.0, 2.0),
                    amplitude: Vec2::new(4.0, 0.0),
                    period_ticks: 90.0,
                    elapsed: 0.0,
                },
                animate_debris: false,
                children: vec![],
            };
            let json = serde_json::to_string(&def).unwrap();
            let deserialized: PartDef = serde_json::from_str(&json).unwrap();
            assert_eq!(def, deserialized);
        }
    }
}

//! Test helper functions: encounter builders and recording collaborators.

use std::sync::{Arc, Mutex};

use glam::Vec2;

use crate::collab::{AudioSink, Collaborators, FxSink, Hud, ScoreStore};
use crate::effect::{MusicCmd, SoundCue};
use crate::error::StoreError;
use crate::orchestrator::UpdateOrchestrator;
use crate::part::{GuardPolicy, HitRegion, Motion, PartDef};
use crate::phase::PhaseDef;
use crate::sequencer::EncounterDef;

// =============================================================================
// Recording collaborators
// =============================================================================

/// Records every collaborator call so tests can assert on presentation
/// effects. Clones share storage, so one recorder can serve all four
/// collaborator slots and stay readable from the test.
#[derive(Debug, Default, Clone)]
pub struct Recording {
    pub cues: Arc<Mutex<Vec<SoundCue>>>,
    pub music: Arc<Mutex<Vec<MusicCmd>>>,
    pub explosions: Arc<Mutex<Vec<(Vec2, f32)>>>,
    pub hud_visible: Arc<Mutex<Vec<bool>>>,
    pub scores: Arc<Mutex<Vec<(u32, u32)>>>,
    pub high_score: Arc<Mutex<Option<u32>>>,
    pub saved: Arc<Mutex<Vec<u32>>>,
}

impl Recording {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            audio: Box::new(self.clone()),
            fx: Box::new(self.clone()),
            hud: Box::new(self.clone()),
            store: Box::new(self.clone()),
        }
    }

    pub fn cue_count(&self, cue: SoundCue) -> usize {
        self.cues.lock().unwrap().iter().filter(|c| **c == cue).count()
    }

    pub fn explosion_count(&self) -> usize {
        self.explosions.lock().unwrap().len()
    }

    pub fn last_score(&self) -> Option<(u32, u32)> {
        self.scores.lock().unwrap().last().copied()
    }
}

impl AudioSink for Recording {
    fn play(&mut self, cue: SoundCue) {
        self.cues.lock().unwrap().push(cue);
    }

    fn music(&mut self, cmd: MusicCmd) {
        self.music.lock().unwrap().push(cmd);
    }
}

impl FxSink for Recording {
    fn spawn_explosion(&mut self, at: Vec2, magnitude: f32) {
        self.explosions.lock().unwrap().push((at, magnitude));
    }
}

impl Hud for Recording {
    fn set_visible(&mut self, visible: bool) {
        self.hud_visible.lock().unwrap().push(visible);
    }

    fn show_score(&mut self, score: u32, high_score: u32) {
        self.scores.lock().unwrap().push((score, high_score));
    }

    fn show_status(&mut self, _lives: u32, _bombs: u32) {}
}

impl ScoreStore for Recording {
    fn load(&mut self) -> Result<Option<u32>, StoreError> {
        Ok(*self.high_score.lock().unwrap())
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(score);
        *self.high_score.lock().unwrap() = Some(score);
        Ok(())
    }
}

/// Store whose every operation fails, for degradation tests.
#[derive(Debug, Default)]
pub struct FailingStore;

impl ScoreStore for FailingStore {
    fn load(&mut self) -> Result<Option<u32>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn save(&mut self, _score: u32) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

// =============================================================================
// Encounter builders
// =============================================================================

fn stationary(name: &str, max_hp: f32, center: Vec2, radius: f32) -> PartDef {
    PartDef {
        name: name.to_string(),
        max_hp,
        region: HitRegion::new(center, Vec2::splat(radius)),
        guard: GuardPolicy::Exposed,
        motion: Motion::Stationary,
        animate_debris: false,
        children: vec![],
    }
}

/// Standard two-phase test encounter.
///
/// - Phase "vanguard": two exposed turrets.
/// - Phase "citadel": an armored core that opens up once both shields fall.
///
/// Regions do not overlap except where a hierarchy intends them to, so
/// aiming at a vulnerable part's center always hits that part.
pub fn boss_encounter(gate_after_ticks: f32) -> EncounterDef {
    EncounterDef {
        boss_origin: Vec2::new(0.0, 60.0),
        gate_after_ticks,
        dialog_pages: vec![
            "So you fought your way here.".to_string(),
            "The citadel does not fall twice.".to_string(),
        ],
        phases: vec![
            PhaseDef {
                name: "vanguard".to_string(),
                parts: vec![
                    stationary("turret-left", 20.0, Vec2::new(-40.0, 60.0), 8.0),
                    stationary("turret-right", 20.0, Vec2::new(40.0, 60.0), 8.0),
                ],
            },
            PhaseDef {
                name: "citadel".to_string(),
                parts: vec![PartDef {
                    name: "core".to_string(),
                    max_hp: 60.0,
                    region: HitRegion::new(Vec2::new(0.0, 60.0), Vec2::splat(10.0)),
                    guard: GuardPolicy::ShieldedByChildren,
                    motion: Motion::Stationary,
                    animate_debris: false,
                    children: vec![
                        stationary("shield-left", 30.0, Vec2::new(-20.0, 60.0), 8.0),
                        stationary("shield-right", 30.0, Vec2::new(20.0, 60.0), 8.0),
                    ],
                }],
            },
        ],
    }
}

/// Parts destroyed over a full run of [`boss_encounter`].
pub const BOSS_ENCOUNTER_PART_COUNT: u32 = 5;

// =============================================================================
// Harness
// =============================================================================

/// Builds an orchestrator wired to recording collaborators.
pub fn harness(seed: u64, gate_after_ticks: f32, autoplay: bool) -> (UpdateOrchestrator, Recording) {
    let recording = Recording::default();
    let game = UpdateOrchestrator::new(
        seed,
        boss_encounter(gate_after_ticks),
        autoplay,
        recording.collaborators(),
    );
    (game, recording)
}

/// Advances the orchestrator `n` whole ticks.
pub fn run_ticks(game: &mut UpdateOrchestrator, n: usize) {
    for _ in 0..n {
        game.advance(1.0);
    }
}

/// Destroys every part of the active phase through the collision surface.
pub fn destroy_active_phase(game: &mut UpdateOrchestrator) {
    loop {
        let targets: Vec<(Vec2, f32)> = game
            .vulnerable_parts()
            .iter()
            .map(|p| (p.region().center, p.hp()))
            .collect();
        if targets.is_empty() {
            break;
        }
        for (at, hp) in targets {
            game.damage_part_at(at, hp);
        }
    }
}

/// Walks the session through the dialog into the running encounter.
pub fn skip_dialog(game: &mut UpdateOrchestrator) {
    use crate::orchestrator::InputAction;
    while game.dialog().is_active() {
        game.handle_input(InputAction::AdvanceDialog);
    }
}

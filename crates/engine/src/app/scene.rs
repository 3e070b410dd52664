use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::warn;

use super::input::GestureEvent;
use super::sequencer::{Scheduler, Sequence, TimerId, TimerTag};
use super::stage::{ElementId, Stage};
use crate::state::GameState;

const SCENE_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    SelectPet,
    WakeUp,
    Care,
    Mission,
    Play,
    Bath,
    Bedtime,
}

impl SceneKey {
    /// Where every failed navigation ends up.
    pub const DEFAULT: SceneKey = SceneKey::SelectPet;

    pub const ALL: [SceneKey; SCENE_COUNT] = [
        SceneKey::SelectPet,
        SceneKey::WakeUp,
        SceneKey::Care,
        SceneKey::Mission,
        SceneKey::Play,
        SceneKey::Bath,
        SceneKey::Bedtime,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SceneKey::SelectPet => "selectPet",
            SceneKey::WakeUp => "wakeUp",
            SceneKey::Care => "care",
            SceneKey::Mission => "mission",
            SceneKey::Play => "play",
            SceneKey::Bath => "bath",
            SceneKey::Bedtime => "bedtime",
        }
    }

    /// Accepts the current names and the legacy `selectPup`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "selectPup" {
            return Some(SceneKey::SelectPet);
        }
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    const fn index(self) -> usize {
        match self {
            SceneKey::SelectPet => 0,
            SceneKey::WakeUp => 1,
            SceneKey::Care => 2,
            SceneKey::Mission => 3,
            SceneKey::Play => 4,
            SceneKey::Bath => 5,
            SceneKey::Bedtime => 6,
        }
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional data handed to the next scene's mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenePayload {
    pub message: Option<String>,
}

impl ScenePayload {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    Gesture {
        element: ElementId,
        gesture: GestureEvent,
    },
    Timer(TimerTag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NavTarget {
    Key(SceneKey),
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NavRequest {
    pub(crate) target: NavTarget,
    pub(crate) payload: Option<ScenePayload>,
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("scene {scene} requires a selected pet")]
    MissingPet { scene: SceneKey },
    #[error("scene {scene} failed to mount: {reason}")]
    Failed { scene: SceneKey, reason: String },
}

#[derive(Debug, Error)]
#[error("cleanup of scene {scene} failed: {reason}")]
pub struct CleanupError {
    pub scene: SceneKey,
    pub reason: String,
}

/// Shared "is this mount still live" bit. The controller already cancels a
/// released scene's timers and clears the stage; a scene that keeps its own
/// view state across mounts can hold a clone and ignore events once it drops.
#[derive(Debug, Clone, Default)]
pub struct ActiveFlag(Rc<Cell<bool>>);

impl ActiveFlag {
    fn live() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.get()
    }

    fn deactivate(&self) {
        self.0.set(false);
    }
}

type CleanupAction = Box<dyn FnOnce() -> Result<(), String>>;

/// Teardown guard for one mounted scene. Released exactly once: explicitly by
/// the controller, or on drop if it was abandoned.
pub struct SceneHandle {
    scene: SceneKey,
    active: ActiveFlag,
    actions: Vec<CleanupAction>,
    released: bool,
}

impl fmt::Debug for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneHandle")
            .field("scene", &self.scene)
            .field("active", &self.active.is_active())
            .field("actions", &self.actions.len())
            .field("released", &self.released)
            .finish()
    }
}

impl SceneHandle {
    pub fn new(scene: SceneKey) -> Self {
        Self {
            scene,
            active: ActiveFlag::live(),
            actions: Vec::new(),
            released: false,
        }
    }

    pub fn scene(&self) -> SceneKey {
        self.scene
    }

    pub fn active_flag(&self) -> ActiveFlag {
        self.active.clone()
    }

    pub fn on_release(mut self, action: impl FnOnce() -> Result<(), String> + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Runs every action even if an earlier one fails; reports the first failure.
    pub fn release(mut self) -> Result<(), CleanupError> {
        self.run_release()
    }

    fn run_release(&mut self) -> Result<(), CleanupError> {
        self.released = true;
        self.active.deactivate();
        let mut first_failure = None;
        for action in self.actions.drain(..) {
            if let Err(reason) = action() {
                first_failure.get_or_insert(reason);
            }
        }
        match first_failure {
            Some(reason) => Err(CleanupError {
                scene: self.scene,
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for SceneHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = self.run_release() {
            warn!(error = %error, "scene_cleanup_failed");
        }
    }
}

/// Everything a scene may touch while mounting or handling an event.
pub struct SceneContext<'a> {
    pub stage: &'a mut Stage,
    pub state: &'a mut GameState,
    scheduler: &'a mut Scheduler,
    epoch: u64,
    requests: &'a mut VecDeque<NavRequest>,
}

impl<'a> SceneContext<'a> {
    pub(crate) fn new(
        stage: &'a mut Stage,
        state: &'a mut GameState,
        scheduler: &'a mut Scheduler,
        epoch: u64,
        requests: &'a mut VecDeque<NavRequest>,
    ) -> Self {
        Self {
            stage,
            state,
            scheduler,
            epoch,
            requests,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Timers are owned by the current mount and die with it.
    pub fn after(&mut self, delay_ms: u64, tag: TimerTag) -> TimerId {
        self.scheduler.schedule(self.epoch, delay_ms, tag)
    }

    pub fn play(&mut self, sequence: Sequence) -> Vec<TimerId> {
        self.scheduler.schedule_sequence(self.epoch, sequence)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.scheduler.cancel(id)
    }

    /// Queued behind the transition in flight; processed in request order.
    pub fn navigate_to(&mut self, scene: SceneKey, payload: Option<ScenePayload>) {
        self.requests.push_back(NavRequest {
            target: NavTarget::Key(scene),
            payload,
        });
    }
}

pub trait Scene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError>;

    fn on_event(&mut self, _event: &SceneEvent, _cx: &mut SceneContext<'_>) {}

    fn debug_title(&self) -> Option<String> {
        None
    }
}

/// Fixed dispatch table from scene key to scene. Entries may be missing; the
/// controller treats a missing entry as a broken reference.
pub struct SceneRegistry {
    entries: [Option<Box<dyn Scene>>; SCENE_COUNT],
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self {
            entries: std::array::from_fn(|_| None),
        }
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl SceneRegistry {
    pub fn with(mut self, key: SceneKey, scene: Box<dyn Scene>) -> Self {
        self.register(key, scene);
        self
    }

    /// Returns the scene previously registered under `key`, if any.
    pub fn register(&mut self, key: SceneKey, scene: Box<dyn Scene>) -> Option<Box<dyn Scene>> {
        self.entries[key.index()].replace(scene)
    }

    pub fn contains(&self, key: SceneKey) -> bool {
        self.entries[key.index()].is_some()
    }

    pub fn keys(&self) -> Vec<SceneKey> {
        SceneKey::ALL
            .into_iter()
            .filter(|key| self.contains(*key))
            .collect()
    }

    pub fn get(&self, key: SceneKey) -> Option<&dyn Scene> {
        self.entries[key.index()].as_deref()
    }

    pub(crate) fn get_mut(&mut self, key: SceneKey) -> Option<&mut Box<dyn Scene>> {
        self.entries[key.index()].as_mut()
    }
}

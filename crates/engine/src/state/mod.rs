mod atomic_io;
mod record;
mod storage;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::SceneKey;
use crate::content::{DataProvider, Pet};

use record::{encode_save_record, parse_save_record, SaveRecord};

pub use record::RecordError;
pub use storage::{FileStore, MemoryStore, StateStore, StoreError, STATE_KEY};

/// Care tasks plus mission, play and bath.
const NON_TASK_ACTIVITIES: usize = 3;

/// Debug view of the state, shaped for logging and the console.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub scene: &'static str,
    pub pet: String,
    pub day: u32,
    pub progress: String,
    pub tasks: BTreeMap<String, bool>,
    pub mission: bool,
    pub play: bool,
    pub bath: bool,
    pub sound: bool,
}

/// The single source of truth for progress. Every mutation is persisted
/// immediately through the owned store.
pub struct GameState {
    scene: SceneKey,
    selected_pet: Option<Pet>,
    day: u32,
    care_tasks: BTreeMap<String, bool>,
    mission_completed: bool,
    play_completed: bool,
    bath_completed: bool,
    sound_enabled: bool,
    last_saved: Option<DateTime<Utc>>,
    store: Box<dyn StateStore>,
    data: Rc<dyn DataProvider>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("summary", &self.summary())
            .field("last_saved", &self.last_saved)
            .finish()
    }
}

impl GameState {
    /// Startup path: load whatever is stored, then normalize legacy data.
    pub fn init(store: Box<dyn StateStore>, data: Rc<dyn DataProvider>) -> Self {
        let mut state = Self::load(store, data);
        state.migrate();
        info!(day = state.day, scene = state.scene.as_str(), "state_initialized");
        state
    }

    /// Never fails: unreadable or corrupt data is logged and treated as
    /// "no save".
    pub fn load(store: Box<dyn StateStore>, data: Rc<dyn DataProvider>) -> Self {
        let mut state = Self::with_defaults(store, data);
        let raw = match state.store.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("no saved state found, using defaults");
                return state;
            }
            Err(error) => {
                warn!(error = %error, "load_failed");
                return state;
            }
        };
        match parse_save_record(&raw) {
            Ok(record) => {
                state.apply_record(record);
                info!(day = state.day, "state_loaded");
            }
            Err(error) => warn!(error = %error, "load_failed"),
        }
        state
    }

    fn with_defaults(store: Box<dyn StateStore>, data: Rc<dyn DataProvider>) -> Self {
        let care_tasks = default_care_tasks(data.as_ref());
        Self {
            scene: SceneKey::DEFAULT,
            selected_pet: None,
            day: 1,
            care_tasks,
            mission_completed: false,
            play_completed: false,
            bath_completed: false,
            sound_enabled: true,
            last_saved: None,
            store,
            data,
        }
    }

    fn apply_record(&mut self, record: SaveRecord) {
        self.scene = match SceneKey::from_name(&record.scene) {
            Some(scene) => scene,
            None => {
                if !record.scene.is_empty() {
                    warn!(scene = %record.scene, "unknown saved scene, using default");
                }
                SceneKey::DEFAULT
            }
        };
        self.selected_pet = record.selected_pet;
        if record.day == 0 {
            warn!("saved day was 0, clamping to 1");
        }
        self.day = record.day.max(1);
        for (task_id, done) in self.care_tasks.iter_mut() {
            *done = record.care_tasks.get(task_id).copied().unwrap_or(false);
        }
        for task_id in record.care_tasks.keys() {
            if !self.care_tasks.contains_key(task_id) {
                debug!(task = %task_id, "dropping unknown saved care task");
            }
        }
        self.mission_completed = record.mission_completed;
        self.play_completed = record.play_completed;
        self.bath_completed = record.bath_completed;
        self.sound_enabled = record.sound_enabled;
        self.last_saved = record.last_saved;
    }

    fn to_record(&self, saved_at: DateTime<Utc>) -> SaveRecord {
        SaveRecord {
            scene: self.scene.as_str().to_string(),
            selected_pet: self.selected_pet.clone(),
            day: self.day,
            care_tasks: self.care_tasks.clone(),
            mission_completed: self.mission_completed,
            play_completed: self.play_completed,
            bath_completed: self.bath_completed,
            sound_enabled: self.sound_enabled,
            last_saved: Some(saved_at),
        }
    }

    /// Best-effort: a failed write is logged and gameplay continues with the
    /// in-memory state. Returns whether the write landed.
    pub fn save(&mut self) -> bool {
        let saved_at = Utc::now();
        let encoded = match encode_save_record(&self.to_record(saved_at)) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(error = %error, "save_failed");
                return false;
            }
        };
        match self.store.write(&encoded) {
            Ok(()) => {
                self.last_saved = Some(saved_at);
                debug!("state_saved");
                true
            }
            Err(error) => {
                warn!(error = %error, "save_failed");
                false
            }
        }
    }

    /// Rewrites legacy pet ids to their current equivalents. Running it again
    /// is a no-op.
    pub fn migrate(&mut self) -> bool {
        let Some(pet) = self.selected_pet.as_ref() else {
            return false;
        };
        let Some(&(_, new_id)) = self
            .data
            .legacy_pet_renames()
            .iter()
            .find(|(old_id, _)| *old_id == pet.id)
        else {
            return false;
        };
        let Some(current) = self.data.pet_by_id(new_id) else {
            warn!(old = %pet.id, new = new_id, "legacy pet rename target missing");
            return false;
        };
        info!(old = %pet.id, new = new_id, "migrated legacy pet");
        self.selected_pet = Some(current);
        self.save();
        true
    }

    pub fn set_scene(&mut self, scene: SceneKey) {
        debug!(from = self.scene.as_str(), to = scene.as_str(), "scene_change");
        self.scene = scene;
        self.save();
    }

    /// Fails (returns false) when the id does not resolve to a pet.
    pub fn select_pet(&mut self, pet_id: &str) -> bool {
        let Some(pet) = self.data.pet_by_id(pet_id) else {
            warn!(pet = pet_id, "unknown pet id");
            return false;
        };
        info!(pet = %pet.name, "pet_selected");
        self.selected_pet = Some(pet);
        self.save();
        true
    }

    /// Fails (returns false) for ids that are not care tasks; never adds keys.
    pub fn complete_task(&mut self, task_id: &str) -> bool {
        let Some(done) = self.care_tasks.get_mut(task_id) else {
            warn!(task = task_id, "unknown care task");
            return false;
        };
        *done = true;
        info!(task = task_id, "task_completed");
        self.save();
        true
    }

    pub fn complete_mission(&mut self) {
        self.mission_completed = true;
        info!("mission_completed");
        self.save();
    }

    pub fn complete_play(&mut self) {
        self.play_completed = true;
        info!("play_completed");
        self.save();
    }

    pub fn complete_bath(&mut self) {
        self.bath_completed = true;
        info!("bath_completed");
        self.save();
    }

    /// Next day: clears every completion flag, keeps scene, pet and settings.
    pub fn advance_day(&mut self) {
        self.day = self.day.saturating_add(1);
        self.clear_daily_flags();
        info!(day = self.day, "day_started");
        self.save();
    }

    fn clear_daily_flags(&mut self) {
        for done in self.care_tasks.values_mut() {
            *done = false;
        }
        self.mission_completed = false;
        self.play_completed = false;
        self.bath_completed = false;
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        info!(enabled = self.sound_enabled, "sound_toggled");
        self.save();
        self.sound_enabled
    }

    /// Clears durable storage and restores the default record. The empty store
    /// is left as-is, so a reload yields the same defaults.
    pub fn reset(&mut self) {
        if let Err(error) = self.store.clear() {
            warn!(error = %error, "clear_failed");
        }
        self.scene = SceneKey::DEFAULT;
        self.selected_pet = None;
        self.day = 1;
        self.clear_daily_flags();
        self.sound_enabled = true;
        self.last_saved = None;
        info!("state_reset");
    }

    pub fn scene(&self) -> SceneKey {
        self.scene
    }

    pub fn selected_pet(&self) -> Option<&Pet> {
        self.selected_pet.as_ref()
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn is_task_completed(&self, task_id: &str) -> bool {
        self.care_tasks.get(task_id).copied().unwrap_or(false)
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.care_tasks.values().all(|done| *done)
    }

    pub fn completed_tasks_count(&self) -> usize {
        self.care_tasks.values().filter(|done| **done).count()
    }

    pub fn total_tasks_count(&self) -> usize {
        self.care_tasks.len()
    }

    pub fn mission_completed(&self) -> bool {
        self.mission_completed
    }

    pub fn play_completed(&self) -> bool {
        self.play_completed
    }

    pub fn bath_completed(&self) -> bool {
        self.bath_completed
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn data(&self) -> &Rc<dyn DataProvider> {
        &self.data
    }

    pub fn progress_fraction(&self) -> f32 {
        let total = self.total_tasks_count() + NON_TASK_ACTIVITIES;
        let done = self.completed_tasks_count()
            + [
                self.mission_completed,
                self.play_completed,
                self.bath_completed,
            ]
            .iter()
            .filter(|flag| **flag)
            .count();
        done as f32 / total as f32
    }

    pub fn progress_percent(&self) -> u32 {
        (self.progress_fraction() * 100.0).round() as u32
    }

    pub fn summary(&self) -> StateSummary {
        StateSummary {
            scene: self.scene.as_str(),
            pet: self
                .selected_pet
                .as_ref()
                .map(|pet| pet.name.clone())
                .unwrap_or_else(|| "None".to_string()),
            day: self.day,
            progress: format!("{}%", self.progress_percent()),
            tasks: self.care_tasks.clone(),
            mission: self.mission_completed,
            play: self.play_completed,
            bath: self.bath_completed,
            sound: self.sound_enabled,
        }
    }
}

fn default_care_tasks(data: &dyn DataProvider) -> BTreeMap<String, bool> {
    data.care_tasks()
        .iter()
        .map(|task| (task.id.to_string(), false))
        .collect()
}

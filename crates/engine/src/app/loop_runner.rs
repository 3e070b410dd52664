use tracing::{debug, info, warn};

use super::controller::SceneController;
use super::input::{GestureConfig, GestureRecognizer, PointerEvent};
use super::scene::{SceneKey, ScenePayload, SceneRegistry};
use super::stage::Stage;
use crate::state::GameState;
use crate::GameConfig;

/// Headless runtime: owns the persisted state, the scene controller and the
/// gesture recognizer, and runs them on an externally supplied clock.
pub struct GameLoop {
    state: GameState,
    controller: SceneController,
    gestures: GestureRecognizer,
    autosave_interval_ms: u64,
    next_autosave_ms: Option<u64>,
    now_ms: u64,
    started: bool,
}

impl GameLoop {
    pub fn new(config: &GameConfig, state: GameState, registry: SceneRegistry) -> Self {
        let stage = Stage::new(config.stage_width, config.row_height);
        let autosave_interval_ms = config.autosave_interval_ms;
        Self {
            state,
            controller: SceneController::new(registry, stage),
            gestures: GestureRecognizer::new(GestureConfig::from(config)),
            autosave_interval_ms,
            next_autosave_ms: (autosave_interval_ms > 0).then_some(autosave_interval_ms),
            now_ms: 0,
            started: false,
        }
    }

    /// Mounts the scene recorded in the state. Calling it twice is a no-op.
    pub fn start(&mut self) {
        if self.started {
            warn!("game loop already started");
            return;
        }
        self.started = true;
        let scene = self.state.scene();
        info!(
            scene = scene.as_str(),
            day = self.state.day(),
            autosave_interval_ms = self.autosave_interval_ms,
            "game_started"
        );
        self.controller.navigate_to(&mut self.state, scene, None);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stage(&self) -> &Stage {
        self.controller.stage()
    }

    pub fn controller(&self) -> &SceneController {
        &self.controller
    }

    pub fn active_scene(&self) -> Option<SceneKey> {
        self.controller.active_scene()
    }

    /// Advances the clock to the event time, then feeds the event through the
    /// recognizer. Returns how many gestures reached a listener.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> usize {
        self.advance_to(event.at_ms());
        let mut delivered = 0;
        for gesture in self.gestures.handle(event) {
            if self.controller.handle_gesture(&mut self.state, gesture) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Fires due scene timers and the auto-save. Time never moves backwards.
    pub fn advance_to(&mut self, now_ms: u64) -> usize {
        let now_ms = now_ms.max(self.now_ms);
        let fired = self.controller.advance_to(&mut self.state, now_ms);
        self.now_ms = now_ms;
        self.run_autosave();
        fired
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> usize {
        self.advance_to(self.now_ms.saturating_add(delta_ms))
    }

    fn run_autosave(&mut self) {
        let Some(due_ms) = self.next_autosave_ms else {
            return;
        };
        if self.now_ms < due_ms {
            return;
        }
        let saved = self.state.save();
        debug!(saved, now_ms = self.now_ms, "autosave");
        self.next_autosave_ms = Some(self.now_ms.saturating_add(self.autosave_interval_ms));
    }

    pub fn navigate_to(&mut self, scene: SceneKey, payload: Option<ScenePayload>) {
        self.controller.navigate_to(&mut self.state, scene, payload);
    }

    pub fn navigate_to_named(&mut self, name: &str) {
        self.controller.navigate_to_named(&mut self.state, name, None);
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.state.toggle_sound()
    }

    /// Wipes the saved game and starts over from pet selection.
    pub fn reset_game(&mut self) {
        info!(day = self.state.day(), "game_reset");
        self.state.reset();
        self.controller.reset(&mut self.state);
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
        let saved = self.state.save();
        info!(saved, "shutdown");
    }
}

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::input::GestureEvent;
use super::scene::{
    MountError, NavRequest, NavTarget, SceneContext, SceneEvent, SceneHandle, SceneKey,
    ScenePayload, SceneRegistry,
};
use super::sequencer::Scheduler;
use super::stage::{ElementId, Listen, Stage};
use crate::state::GameState;

#[derive(Debug, Error)]
enum TransitionError {
    #[error("scene '{0}' does not exist")]
    UnknownName(String),
    #[error("scene {0} is not registered")]
    NotRegistered(SceneKey),
    #[error(transparent)]
    Mount(#[from] MountError),
}

#[derive(Debug)]
struct ActiveMount {
    key: SceneKey,
    epoch: u64,
    handle: SceneHandle,
}

/// Drives transitions between scenes. At most one scene is mounted at a time,
/// its handle is released before the next mount, and navigation requests are
/// processed strictly in arrival order.
pub struct SceneController {
    registry: SceneRegistry,
    stage: Stage,
    scheduler: Scheduler,
    active: Option<ActiveMount>,
    queue: VecDeque<NavRequest>,
    transitioning: bool,
    next_epoch: u64,
    drag_capture: Option<ElementId>,
}

impl SceneController {
    pub fn new(registry: SceneRegistry, stage: Stage) -> Self {
        Self {
            registry,
            stage,
            scheduler: Scheduler::default(),
            active: None,
            queue: VecDeque::new(),
            transitioning: false,
            next_epoch: 0,
            drag_capture: None,
        }
    }

    pub fn active_scene(&self) -> Option<SceneKey> {
        self.active.as_ref().map(|active| active.key)
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn pending_requests(&self) -> usize {
        self.queue.len()
    }

    pub fn debug_title(&self) -> Option<String> {
        let active = self.active.as_ref()?;
        self.registry
            .get(active.key)
            .and_then(|scene| scene.debug_title())
    }

    pub fn navigate_to(
        &mut self,
        state: &mut GameState,
        scene: SceneKey,
        payload: Option<ScenePayload>,
    ) {
        self.request(
            state,
            NavRequest {
                target: NavTarget::Key(scene),
                payload,
            },
        );
    }

    /// Navigation by identifier; an unknown name falls back to the default scene.
    pub fn navigate_to_named(
        &mut self,
        state: &mut GameState,
        name: &str,
        payload: Option<ScenePayload>,
    ) {
        self.request(
            state,
            NavRequest {
                target: NavTarget::Named(name.to_string()),
                payload,
            },
        );
    }

    fn request(&mut self, state: &mut GameState, request: NavRequest) {
        self.queue.push_back(request);
        if self.transitioning {
            debug!(queued = self.queue.len(), "navigate_queued");
            return;
        }
        self.process_queue(state);
    }

    fn process_queue(&mut self, state: &mut GameState) {
        while let Some(request) = self.queue.pop_front() {
            self.transitioning = true;
            self.transition(state, request);
            self.transitioning = false;
        }
    }

    fn transition(&mut self, state: &mut GameState, request: NavRequest) {
        self.release_active();

        let outcome = match request.target {
            NavTarget::Key(key) => {
                state.set_scene(key);
                self.mount(state, key, request.payload.as_ref())
                    .map_err(|error| (Some(key), error))
            }
            NavTarget::Named(name) => match SceneKey::from_name(&name) {
                Some(key) => {
                    state.set_scene(key);
                    self.mount(state, key, request.payload.as_ref())
                        .map_err(|error| (Some(key), error))
                }
                None => Err((None, TransitionError::UnknownName(name))),
            },
        };

        let Err((failed, error)) = outcome else {
            return;
        };
        error!(error = %error, "scene_load_failed");
        if failed == Some(SceneKey::DEFAULT) {
            error!("default scene unavailable; leaving stage empty");
            return;
        }
        state.set_scene(SceneKey::DEFAULT);
        if let Err(error) = self.mount(state, SceneKey::DEFAULT, None) {
            error!(error = %error, "default_scene_failed");
        }
    }

    fn mount(
        &mut self,
        state: &mut GameState,
        key: SceneKey,
        payload: Option<&ScenePayload>,
    ) -> Result<(), TransitionError> {
        let Some(scene) = self.registry.get_mut(key) else {
            return Err(TransitionError::NotRegistered(key));
        };

        self.stage.clear();
        let epoch = self.next_epoch;
        self.next_epoch = self.next_epoch.saturating_add(1);
        let queued_before = self.queue.len();
        let mut cx = SceneContext::new(
            &mut self.stage,
            state,
            &mut self.scheduler,
            epoch,
            &mut self.queue,
        );
        match scene.mount(&mut cx, payload) {
            Ok(handle) => {
                info!(
                    scene = key.as_str(),
                    elements = self.stage.elements().len(),
                    "scene_mounted"
                );
                self.active = Some(ActiveMount { key, epoch, handle });
                Ok(())
            }
            Err(error) => {
                // A failed mount leaves nothing behind.
                self.scheduler.cancel_epoch(epoch);
                self.queue.truncate(queued_before);
                self.stage.clear();
                Err(error.into())
            }
        }
    }

    fn release_active(&mut self) {
        self.drag_capture = None;
        let Some(active) = self.active.take() else {
            return;
        };
        let cancelled = self.scheduler.cancel_epoch(active.epoch);
        if let Err(error) = active.handle.release() {
            warn!(error = %error, "scene_cleanup_failed");
        }
        self.stage.clear();
        debug!(
            scene = active.key.as_str(),
            cancelled_timers = cancelled,
            "scene_released"
        );
    }

    /// Delivers an event to the mounted scene, then runs any navigation it asked for.
    pub fn dispatch(&mut self, state: &mut GameState, event: SceneEvent) -> bool {
        let Some((key, epoch)) = self.active.as_ref().map(|active| (active.key, active.epoch))
        else {
            return false;
        };
        let Some(scene) = self.registry.get_mut(key) else {
            return false;
        };
        let mut cx = SceneContext::new(
            &mut self.stage,
            state,
            &mut self.scheduler,
            epoch,
            &mut self.queue,
        );
        scene.on_event(&event, &mut cx);
        self.process_queue(state);
        true
    }

    /// Routes a recognized gesture to the element listening for it. Drags are
    /// captured by the element under the press point until release.
    pub fn handle_gesture(&mut self, state: &mut GameState, gesture: GestureEvent) -> bool {
        let (element, listen) = match gesture {
            GestureEvent::Tap { x, y, .. } => match self.stage.hit_test(x, y, Listen::Tap) {
                Some(element) => (element, Listen::Tap),
                None => return false,
            },
            GestureEvent::Start { x, y, .. } => {
                self.drag_capture = self
                    .stage
                    .hit_test(x, y, Listen::Drag)
                    .or_else(|| self.stage.hit_test(x, y, Listen::Wiggle));
                match self.drag_capture {
                    Some(element) => (element, Listen::Drag),
                    None => return false,
                }
            }
            GestureEvent::Move { .. } => match self.drag_capture {
                Some(element) => (element, Listen::Drag),
                None => return false,
            },
            GestureEvent::Wiggle { .. } => match self.drag_capture {
                Some(element) => (element, Listen::Wiggle),
                None => return false,
            },
            GestureEvent::End { .. } => match self.drag_capture.take() {
                Some(element) => (element, Listen::Drag),
                None => return false,
            },
        };
        if !self.stage.is_listening(element, listen) {
            return false;
        }
        self.dispatch(state, SceneEvent::Gesture { element, gesture })
    }

    /// Fires every scene timer due by `now_ms`, in due order. Timers left over
    /// from a scene that is no longer mounted are dropped unfired.
    pub fn advance_to(&mut self, state: &mut GameState, now_ms: u64) -> usize {
        let mut fired = 0;
        while let Some(due) = self.scheduler.pop_due(now_ms) {
            let live = self
                .active
                .as_ref()
                .is_some_and(|active| active.epoch == due.epoch);
            if !live {
                debug!(tag = due.tag.name, "stray_timer_dropped");
                continue;
            }
            self.dispatch(state, SceneEvent::Timer(due.tag));
            fired += 1;
        }
        self.scheduler.settle_at(now_ms);
        fired
    }

    /// Drops pending requests, tears down the mounted scene and returns to the
    /// default scene.
    pub fn reset(&mut self, state: &mut GameState) {
        self.queue.clear();
        self.release_active();
        self.navigate_to(state, SceneKey::DEFAULT, None);
    }

    pub fn shutdown(&mut self) {
        self.queue.clear();
        self.release_active();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::{ActiveFlag, Scene, TimerTag};
    use crate::state::MemoryStore;
    use crate::test_support::FixtureData;

    type Log = Rc<RefCell<Vec<String>>>;

    const PING: TimerTag = TimerTag::new("ping");

    #[derive(Default)]
    struct Recorder {
        log: Log,
        fail_mount: bool,
        fail_cleanup: bool,
        navigate_on_mount: Option<SceneKey>,
        navigate_on_tap: Vec<SceneKey>,
        ping_after_ms: Option<u64>,
    }

    impl Recorder {
        fn new(log: &Log) -> Self {
            Self {
                log: log.clone(),
                ..Self::default()
            }
        }
    }

    impl Scene for Recorder {
        fn mount(
            &mut self,
            cx: &mut SceneContext<'_>,
            payload: Option<&ScenePayload>,
        ) -> Result<SceneHandle, MountError> {
            let key = cx.state.scene();
            if let Some(delay_ms) = self.ping_after_ms {
                cx.after(delay_ms, PING);
            }
            if self.fail_mount {
                self.log.borrow_mut().push(format!("fail {key}"));
                return Err(MountError::Failed {
                    scene: key,
                    reason: "boom".to_string(),
                });
            }
            let button = cx.stage.button(key.as_str());
            cx.stage.listen(button, Listen::Tap);
            if let Some(message) = payload.and_then(|payload| payload.message.clone()) {
                cx.stage.text(message);
            }
            if let Some(next) = self.navigate_on_mount {
                cx.navigate_to(next, None);
            }
            self.log.borrow_mut().push(format!("mount {key}"));
            let log = self.log.clone();
            let fail_cleanup = self.fail_cleanup;
            Ok(SceneHandle::new(key).on_release(move || {
                log.borrow_mut().push(format!("release {key}"));
                if fail_cleanup {
                    Err("cleanup exploded".to_string())
                } else {
                    Ok(())
                }
            }))
        }

        fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
            match event {
                SceneEvent::Timer(tag) => {
                    self.log
                        .borrow_mut()
                        .push(format!("timer {} {}", cx.state.scene(), tag.name));
                }
                SceneEvent::Gesture { .. } => {
                    for next in &self.navigate_on_tap {
                        cx.navigate_to(*next, None);
                    }
                }
            }
        }
    }

    fn state() -> GameState {
        GameState::load(
            Box::new(MemoryStore::default()),
            Rc::new(FixtureData::default()),
        )
    }

    fn registry_of(log: &Log, keys: &[SceneKey]) -> SceneRegistry {
        let mut registry = SceneRegistry::default();
        for key in keys {
            registry.register(*key, Box::new(Recorder::new(log)));
        }
        registry
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    fn tap_first_button(controller: &mut SceneController, state: &mut GameState) -> bool {
        let (x, y) = controller.stage().elements()[0].bounds.center();
        controller.handle_gesture(
            state,
            GestureEvent::Tap {
                x,
                y,
                kind: crate::app::PointerKind::Mouse,
            },
        )
    }

    /// Keeps the flag of its most recent mount where the test can see it.
    struct FlagKeeper {
        held: Rc<RefCell<Option<ActiveFlag>>>,
    }

    impl Scene for FlagKeeper {
        fn mount(
            &mut self,
            cx: &mut SceneContext<'_>,
            _payload: Option<&ScenePayload>,
        ) -> Result<SceneHandle, MountError> {
            let handle = SceneHandle::new(cx.state.scene());
            *self.held.borrow_mut() = Some(handle.active_flag());
            Ok(handle)
        }

        fn on_event(&mut self, _event: &SceneEvent, _cx: &mut SceneContext<'_>) {}
    }

    #[test]
    fn held_flag_goes_dark_when_scene_is_left() {
        let held = Rc::new(RefCell::new(None));
        let log = Log::default();
        let registry = SceneRegistry::default()
            .with(
                SceneKey::Bedtime,
                Box::new(FlagKeeper { held: held.clone() }),
            )
            .with(SceneKey::SelectPet, Box::new(Recorder::new(&log)));
        let mut state = state();
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Bedtime, None);
        let flag = held.borrow().clone().expect("bedtime mounted");
        assert!(flag.is_active());

        controller.navigate_to(&mut state, SceneKey::SelectPet, None);
        assert!(!flag.is_active());

        controller.navigate_to(&mut state, SceneKey::Bedtime, None);
        assert!(!flag.is_active());
        assert!(held.borrow().as_ref().is_some_and(ActiveFlag::is_active));
    }

    #[test]
    fn navigation_releases_previous_scene_before_mounting_next() {
        let log = Log::default();
        let mut state = state();
        let mut controller = SceneController::new(
            registry_of(&log, &[SceneKey::SelectPet, SceneKey::Care]),
            Stage::default(),
        );

        controller.navigate_to(&mut state, SceneKey::SelectPet, None);
        controller.navigate_to(&mut state, SceneKey::Care, Some(ScenePayload::message("hi")));

        assert_eq!(
            entries(&log),
            vec!["mount selectPet", "release selectPet", "mount care"]
        );
        assert_eq!(controller.active_scene(), Some(SceneKey::Care));
        assert_eq!(state.scene(), SceneKey::Care);
        let labels: Vec<&str> = controller
            .stage()
            .elements()
            .iter()
            .map(|element| element.label.as_str())
            .collect();
        assert_eq!(labels, vec!["care", "hi"]);
        assert!(!controller.is_transitioning());
    }

    #[test]
    fn back_to_back_requests_mount_in_order_with_one_cleanup_between() {
        let log = Log::default();
        let mut state = state();
        let mut registry = registry_of(&log, &[SceneKey::Mission, SceneKey::Bath]);
        let mut racer = Recorder::new(&log);
        racer.navigate_on_tap = vec![SceneKey::Mission, SceneKey::Bath];
        registry.register(SceneKey::Play, Box::new(racer));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Play, None);
        assert!(tap_first_button(&mut controller, &mut state));

        assert_eq!(
            entries(&log),
            vec![
                "mount play",
                "release play",
                "mount mission",
                "release mission",
                "mount bath",
            ]
        );
        assert_eq!(controller.active_scene(), Some(SceneKey::Bath));
        assert_eq!(controller.pending_requests(), 0);
        assert_eq!(controller.stage().elements().len(), 1);
    }

    #[test]
    fn request_made_during_mount_runs_after_that_mount_completes() {
        let log = Log::default();
        let mut state = state();
        let mut registry = registry_of(&log, &[SceneKey::SelectPet]);
        let mut bouncer = Recorder::new(&log);
        bouncer.navigate_on_mount = Some(SceneKey::SelectPet);
        registry.register(SceneKey::WakeUp, Box::new(bouncer));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::WakeUp, None);

        assert_eq!(
            entries(&log),
            vec!["mount wakeUp", "release wakeUp", "mount selectPet"]
        );
        assert_eq!(controller.active_scene(), Some(SceneKey::SelectPet));
    }

    #[test]
    fn unknown_scene_name_falls_back_to_default() {
        let log = Log::default();
        let mut state = state();
        let mut controller = SceneController::new(
            registry_of(&log, &[SceneKey::SelectPet, SceneKey::Care]),
            Stage::default(),
        );
        controller.navigate_to(&mut state, SceneKey::Care, None);

        controller.navigate_to_named(&mut state, "nonexistentScene", None);

        assert_eq!(
            entries(&log),
            vec!["mount care", "release care", "mount selectPet"]
        );
        assert_eq!(controller.active_scene(), Some(SceneKey::SelectPet));
        assert_eq!(state.scene(), SceneKey::SelectPet);
    }

    #[test]
    fn unregistered_scene_falls_back_to_default() {
        let log = Log::default();
        let mut state = state();
        let mut controller =
            SceneController::new(registry_of(&log, &[SceneKey::SelectPet]), Stage::default());

        controller.navigate_to(&mut state, SceneKey::Bedtime, None);

        assert_eq!(entries(&log), vec!["mount selectPet"]);
        assert_eq!(state.scene(), SceneKey::SelectPet);
    }

    #[test]
    fn mount_failure_falls_back_and_cancels_its_timers() {
        let log = Log::default();
        let mut state = state();
        let mut registry = registry_of(&log, &[SceneKey::SelectPet]);
        let mut broken = Recorder::new(&log);
        broken.fail_mount = true;
        broken.ping_after_ms = Some(10);
        registry.register(SceneKey::Bath, Box::new(broken));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Bath, None);
        assert_eq!(controller.advance_to(&mut state, 100), 0);

        assert_eq!(entries(&log), vec!["fail bath", "mount selectPet"]);
        assert_eq!(controller.active_scene(), Some(SceneKey::SelectPet));
        assert_eq!(controller.stage().elements()[0].label, "selectPet");
    }

    #[test]
    fn failing_default_scene_does_not_loop() {
        let log = Log::default();
        let mut state = state();
        let mut broken = Recorder::new(&log);
        broken.fail_mount = true;
        let registry = SceneRegistry::default().with(SceneKey::SelectPet, Box::new(broken));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Care, None);

        assert_eq!(entries(&log), vec!["fail selectPet"]);
        assert_eq!(controller.active_scene(), None);
        assert!(controller.stage().is_empty());
    }

    #[test]
    fn cleanup_failure_does_not_block_transition() {
        let log = Log::default();
        let mut state = state();
        let mut registry = registry_of(&log, &[SceneKey::Care]);
        let mut messy = Recorder::new(&log);
        messy.fail_cleanup = true;
        registry.register(SceneKey::Play, Box::new(messy));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Play, None);
        controller.navigate_to(&mut state, SceneKey::Care, None);

        assert_eq!(entries(&log), vec!["mount play", "release play", "mount care"]);
        assert_eq!(controller.active_scene(), Some(SceneKey::Care));
    }

    #[test]
    fn timers_die_with_their_scene() {
        let log = Log::default();
        let mut state = state();
        let mut registry = registry_of(&log, &[SceneKey::Care]);
        let mut pinger = Recorder::new(&log);
        pinger.ping_after_ms = Some(500);
        registry.register(SceneKey::Bath, Box::new(pinger));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Bath, None);
        assert_eq!(controller.advance_to(&mut state, 500), 1);
        controller.navigate_to(&mut state, SceneKey::Bath, None);
        controller.navigate_to(&mut state, SceneKey::Care, None);
        assert_eq!(controller.scheduler().pending(), 0);
        assert_eq!(controller.advance_to(&mut state, 5_000), 0);

        let timers: Vec<String> = entries(&log)
            .into_iter()
            .filter(|entry| entry.starts_with("timer"))
            .collect();
        assert_eq!(timers, vec!["timer bath ping"]);
    }

    #[test]
    fn released_scene_stops_receiving_input() {
        let log = Log::default();
        let mut state = state();
        let mut registry = registry_of(&log, &[SceneKey::Care]);
        let mut racer = Recorder::new(&log);
        racer.navigate_on_tap = vec![SceneKey::Care];
        registry.register(SceneKey::Play, Box::new(racer));
        let mut controller = SceneController::new(registry, Stage::default());

        controller.navigate_to(&mut state, SceneKey::Play, None);
        let stale = controller.stage().elements()[0].clone();
        controller.navigate_to(&mut state, SceneKey::Care, None);
        let (x, y) = stale.bounds.center();
        // The care button now sits at the same spot but does not navigate.
        assert!(controller.handle_gesture(
            &mut state,
            GestureEvent::Tap {
                x,
                y,
                kind: crate::app::PointerKind::Touch,
            },
        ));
        assert_eq!(controller.active_scene(), Some(SceneKey::Care));
        assert!(!controller.stage().is_listening(stale.id, Listen::Tap));
    }

    #[test]
    fn reset_returns_to_default_scene() {
        let log = Log::default();
        let mut state = state();
        let mut controller = SceneController::new(
            registry_of(&log, &[SceneKey::SelectPet, SceneKey::Bedtime]),
            Stage::default(),
        );
        controller.navigate_to(&mut state, SceneKey::Bedtime, None);
        controller.reset(&mut state);
        assert_eq!(controller.active_scene(), Some(SceneKey::SelectPet));

        controller.shutdown();
        assert_eq!(controller.active_scene(), None);
        assert_eq!(
            entries(&log),
            vec![
                "mount bedtime",
                "release bedtime",
                "mount selectPet",
                "release selectPet",
            ]
        );
    }
}

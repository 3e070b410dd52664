use pup_engine::{
    ElementId, GestureEvent, Listen, Mission, MissionKind, MountError, Scene, SceneContext,
    SceneEvent, SceneHandle, SceneKey, ScenePayload, TimerTag,
};
use tracing::info;

use super::{play_sfx, require_pet, show_fact};

const MISSION_DONE: TimerTag = TimerTag::new("mission_done");
const PLAY_DELAY_MS: u64 = 1000;
const STAR_COUNT: usize = 5;
const TREAT_COUNT: usize = 3;

#[derive(Debug)]
struct View {
    mission: Mission,
    targets: Vec<ElementId>,
    collected: usize,
    counter: Option<ElementId>,
    done: bool,
}

impl View {
    fn counter_line(&self) -> String {
        match self.mission.kind {
            MissionKind::Fetch => String::new(),
            MissionKind::Stars => format!("⭐ {}/{STAR_COUNT} stars collected", self.collected),
            MissionKind::Treats => format!("🦴 {}/{TREAT_COUNT} treats found", self.collected),
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct MissionScene {
    view: Option<View>,
}

impl Scene for MissionScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.view = None;
        let pet = require_pet(cx, SceneKey::Mission)?;
        let mission = cx.state.data().random_mission();
        info!(mission = mission.name, "mission_started");

        cx.stage.heading(mission.name);
        cx.stage
            .text(format!("{} is ready for a mission!", pet.name));
        cx.stage.text(mission.description);
        show_fact(cx, payload);

        let labels: Vec<String> = match mission.kind {
            MissionKind::Fetch => vec![format!("{} Start Fetch Game", mission.icon)],
            MissionKind::Stars => (1..=STAR_COUNT)
                .map(|n| format!("{} Star {n}", mission.icon))
                .collect(),
            MissionKind::Treats => (1..=TREAT_COUNT)
                .map(|n| format!("{} Treat {n}", mission.icon))
                .collect(),
        };
        let targets: Vec<ElementId> = labels
            .into_iter()
            .map(|label| {
                let target = cx.stage.button(label);
                cx.stage.listen(target, Listen::Tap);
                target
            })
            .collect();

        let mut view = View {
            mission,
            targets,
            collected: 0,
            counter: None,
            done: false,
        };
        if view.mission.kind != MissionKind::Fetch {
            view.counter = Some(cx.stage.text(view.counter_line()));
        }
        self.view = Some(view);
        Ok(SceneHandle::new(SceneKey::Mission))
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        match event {
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Tap { .. },
            } => {
                if view.done || !view.targets.contains(element) {
                    return;
                }
                play_sfx(cx, "tap");
                view.collected += 1;
                cx.stage.set_enabled(*element, false);
                cx.stage.set_label(*element, "✨");
                if let Some(counter) = view.counter {
                    cx.stage.set_label(counter, view.counter_line());
                }
                if view.collected < view.targets.len() {
                    return;
                }
                view.done = true;
                cx.state.complete_mission();
                play_sfx(cx, "cheer");
                cx.stage.text("🎉 Mission complete!");
                info!(mission = view.mission.name, "mission_completed");
                cx.after(PLAY_DELAY_MS, MISSION_DONE);
            }
            SceneEvent::Timer(tag) if *tag == MISSION_DONE => {
                cx.navigate_to(SceneKey::Play, None);
            }
            _ => {}
        }
    }

    fn debug_title(&self) -> Option<String> {
        self.view.as_ref().map(|view| {
            format!(
                "Mission: {} ({}/{})",
                view.mission.name,
                view.collected,
                view.targets.len()
            )
        })
    }
}

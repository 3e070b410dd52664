use pup_engine::{
    ElementId, FactCategory, GestureEvent, Listen, MountError, Scene, SceneContext, SceneEvent,
    SceneHandle, SceneKey, ScenePayload, TimerTag,
};
use tracing::info;

use super::{play_sfx, require_pet, show_fact};

const BATH_DONE: TimerTag = TimerTag::new("bath_done");
const BUBBLE_TARGET: u32 = 20;
const BUBBLE_INTERVAL_MS: u64 = 100;
const BEDTIME_DELAY_MS: u64 = 2000;

#[derive(Debug)]
struct View {
    pet_name: String,
    tub: ElementId,
    counter: ElementId,
    bubbles: u32,
    last_bubble_ms: Option<u64>,
    clean: bool,
}

impl View {
    fn counter_line(&self) -> String {
        format!("Bubbles: {}/{BUBBLE_TARGET}", self.bubbles)
    }
}

#[derive(Debug, Default)]
pub(super) struct BathScene {
    view: Option<View>,
}

impl Scene for BathScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.view = None;
        let pet = require_pet(cx, SceneKey::Bath)?;

        cx.stage.heading(format!("Bath Time for {}!", pet.name));
        cx.stage
            .text("🛁 Let's get squeaky clean! Drag around to create bubbles and scrub.");
        show_fact(cx, payload);
        let tub = cx.stage.drag_surface(format!("{} in the tub", pet.emoji));
        cx.stage.listen(tub, Listen::Drag);
        let mut view = View {
            pet_name: pet.name,
            tub,
            counter: tub,
            bubbles: 0,
            last_bubble_ms: None,
            clean: false,
        };
        view.counter = cx.stage.text(view.counter_line());
        self.view = Some(view);
        Ok(SceneHandle::new(SceneKey::Bath))
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        match event {
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Move { .. },
            } if *element == view.tub => {
                if view.clean {
                    return;
                }
                let now_ms = cx.now_ms();
                let ready = view
                    .last_bubble_ms
                    .map_or(true, |last| now_ms.saturating_sub(last) >= BUBBLE_INTERVAL_MS);
                if !ready {
                    return;
                }
                view.last_bubble_ms = Some(now_ms);
                view.bubbles += 1;
                play_sfx(cx, "bubblePop");
                cx.stage.set_label(view.counter, view.counter_line());

                if view.bubbles >= BUBBLE_TARGET {
                    view.clean = true;
                    play_sfx(cx, "success");
                    cx.stage
                        .text(format!("✨ {} is squeaky clean!", view.pet_name));
                    info!(pet = %view.pet_name, "bath_completed");
                    cx.after(BEDTIME_DELAY_MS, BATH_DONE);
                }
            }
            SceneEvent::Timer(tag) if *tag == BATH_DONE => {
                cx.state.complete_bath();
                let fact = cx.state.data().random_fact(FactCategory::Bathing);
                cx.navigate_to(SceneKey::Bedtime, Some(ScenePayload::message(fact)));
            }
            _ => {}
        }
    }

    fn debug_title(&self) -> Option<String> {
        self.view
            .as_ref()
            .map(|view| format!("Bath ({}/{BUBBLE_TARGET})", view.bubbles))
    }
}

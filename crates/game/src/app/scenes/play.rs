use pup_engine::{
    ElementId, GestureEvent, Listen, MountError, Scene, SceneContext, SceneEvent, SceneHandle,
    SceneKey, ScenePayload, TimerTag,
};
use tracing::info;

use super::{play_sfx, require_pet, show_fact};

const DISC_LANDED: TimerTag = TimerTag::new("disc_landed");
const PLAY_DONE: TimerTag = TimerTag::new("play_done");
const DISC_FLIGHT_MS: u64 = 800;
const BATH_DELAY_MS: u64 = 1000;

#[derive(Debug)]
struct View {
    pet_name: String,
    throw: ElementId,
    status: ElementId,
    thrown: bool,
}

#[derive(Debug, Default)]
pub(super) struct PlayScene {
    view: Option<View>,
}

impl Scene for PlayScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.view = None;
        let pet = require_pet(cx, SceneKey::Play)?;

        cx.stage.heading(format!("Play Time with {}!", pet.name));
        let status = cx
            .stage
            .text("🎾 Time for some fun! Let's play fetch with the disc.");
        show_fact(cx, payload);
        let throw = cx.stage.button("🥏 Throw the disc");
        cx.stage.listen(throw, Listen::Tap);

        self.view = Some(View {
            pet_name: pet.name,
            throw,
            status,
            thrown: false,
        });
        Ok(SceneHandle::new(SceneKey::Play))
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        match event {
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Tap { .. },
            } if *element == view.throw && !view.thrown => {
                view.thrown = true;
                play_sfx(cx, "discThrow");
                cx.stage.set_enabled(view.throw, false);
                cx.stage.set_label(
                    view.status,
                    format!("The disc is flying... {} is running!", view.pet_name),
                );
                cx.after(DISC_FLIGHT_MS, DISC_LANDED);
            }
            SceneEvent::Timer(tag) if *tag == DISC_LANDED => {
                cx.state.complete_play();
                play_sfx(cx, "discCatch");
                cx.stage.set_label(
                    view.status,
                    format!(
                        "🏆 {} caught the disc perfectly! What a superstar!",
                        view.pet_name
                    ),
                );
                info!(pet = %view.pet_name, "play_completed");
                cx.after(BATH_DELAY_MS, PLAY_DONE);
            }
            SceneEvent::Timer(tag) if *tag == PLAY_DONE => {
                cx.navigate_to(SceneKey::Bath, None);
            }
            _ => {}
        }
    }
}

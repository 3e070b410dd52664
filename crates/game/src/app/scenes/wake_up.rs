use pup_engine::{
    ElementId, FactCategory, GestureEvent, Listen, MountError, Scene, SceneContext, SceneEvent,
    SceneHandle, SceneKey, ScenePayload, TimerTag,
};
use tracing::{debug, info};

use super::{play_sfx, require_pet, show_fact};

const AWAKE: TimerTag = TimerTag::new("awake");
const WIGGLES_TO_WAKE: u32 = 3;
const CARE_DELAY_MS: u64 = 2000;

#[derive(Debug)]
struct View {
    pet_name: String,
    surface: ElementId,
    status: ElementId,
    wiggles: u32,
    awake: bool,
}

#[derive(Debug, Default)]
pub(super) struct WakeUpScene {
    view: Option<View>,
}

impl Scene for WakeUpScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.view = None;
        let pet = require_pet(cx, SceneKey::WakeUp)?;

        cx.stage.heading(format!("Wake up {}!", pet.name));
        let surface = cx.stage.drag_surface(format!("{} zzz", pet.emoji));
        cx.stage.listen(surface, Listen::Wiggle);
        let status = cx
            .stage
            .text(format!("💤 {} is sleeping peacefully...", pet.name));
        cx.stage.text("Swipe left and right to gently wake them up!");
        show_fact(cx, payload);

        self.view = Some(View {
            pet_name: pet.name,
            surface,
            status,
            wiggles: 0,
            awake: false,
        });
        Ok(SceneHandle::new(SceneKey::WakeUp))
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        match event {
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Wiggle { .. },
            } if *element == view.surface => {
                if view.awake {
                    return;
                }
                view.wiggles += 1;
                debug!(wiggles = view.wiggles, "wiggle");

                let encouragements = [
                    format!("{} is stirring...", view.pet_name),
                    format!("Keep going! {} is waking up...", view.pet_name),
                ];
                if let Some(line) = encouragements.get(view.wiggles as usize - 1) {
                    cx.stage.set_label(view.status, line.as_str());
                }

                if view.wiggles >= WIGGLES_TO_WAKE {
                    view.awake = true;
                    play_sfx(cx, "wakeUp");
                    cx.stage
                        .set_label(view.status, format!("🌅 Good morning, {}!", view.pet_name));
                    cx.stage
                        .set_label(view.surface, format!("{} awake", view.pet_name));
                    info!(pet = %view.pet_name, "pet_woke_up");
                    cx.after(CARE_DELAY_MS, AWAKE);
                }
            }
            SceneEvent::Timer(tag) if *tag == AWAKE => {
                let fact = cx.state.data().random_fact(FactCategory::General);
                cx.navigate_to(SceneKey::Care, Some(ScenePayload::message(fact)));
            }
            _ => {}
        }
    }

    fn debug_title(&self) -> Option<String> {
        self.view
            .as_ref()
            .map(|view| format!("Wake up ({}/{WIGGLES_TO_WAKE})", view.wiggles))
    }
}

#[cfg(test)]
mod tests {
    use pup_engine::{MemoryStore, SceneKey};

    use crate::app::console::harness::{has, run, session_from, wait, wiggle};
    use crate::app::console::{ConsoleCommand, Session};

    fn sleeping_rover() -> Session {
        let save = r#"{"scene":"wakeUp","selectedPet":{"id":"rover","name":"Rover"}}"#;
        session_from(MemoryStore::with_contents(save)).0
    }

    #[test]
    fn three_wiggles_wake_the_pet_and_lead_to_care() {
        let mut session = sleeping_rover();
        assert_eq!(session.game().active_scene(), Some(SceneKey::WakeUp));

        wiggle(&mut session, "zzz");
        assert!(has(&session, "Rover is stirring..."));
        wiggle(&mut session, "zzz");
        assert!(has(&session, "Keep going!"));
        wiggle(&mut session, "zzz");
        assert!(has(&session, "Good morning, Rover!"));

        // The third wiggle lands mid-drag, a little before the release.
        wait(&mut session, 1900);
        assert_eq!(session.game().active_scene(), Some(SceneKey::WakeUp));
        wait(&mut session, 100);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Care));
        assert!(has(&session, "Did you know?"));
    }

    #[test]
    fn sliding_one_way_never_wakes() {
        let mut session = sleeping_rover();
        let (x, y) = session
            .game()
            .stage()
            .find_by_label("zzz")
            .map(|element| element.bounds.center())
            .expect("surface");
        run(&mut session, ConsoleCommand::Press { x, y });
        for step in 1..10 {
            run(&mut session, ConsoleCommand::Wait { ms: 50 });
            run(
                &mut session,
                ConsoleCommand::Move {
                    x: x + step as f32 * 40.0,
                    y,
                },
            );
        }
        run(&mut session, ConsoleCommand::Release { x, y });
        assert!(has(&session, "sleeping peacefully"));
    }

    #[test]
    fn leaving_after_waking_drops_the_pending_transition() {
        let mut session = sleeping_rover();
        wiggle(&mut session, "zzz");
        wiggle(&mut session, "zzz");
        wiggle(&mut session, "zzz");
        run(
            &mut session,
            ConsoleCommand::Go {
                scene: "play".to_string(),
            },
        );
        wait(&mut session, 5000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Play));
    }
}

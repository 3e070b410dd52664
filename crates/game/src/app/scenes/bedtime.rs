use pup_engine::{
    ActiveFlag, ElementId, GestureEvent, Listen, MountError, Scene, SceneContext, SceneEvent,
    SceneHandle, SceneKey, ScenePayload, Sequence, TimerTag,
};
use tracing::info;

use super::{play_sfx, require_pet, show_fact};

const SNORE: TimerTag = TimerTag::new("snore");
const FALLING_ASLEEP: TimerTag = TimerTag::new("falling_asleep");
const SWEET_DREAMS: TimerTag = TimerTag::new("sweet_dreams");
const OFFER_NEW_DAY: TimerTag = TimerTag::new("offer_new_day");
const NEW_DAY: TimerTag = TimerTag::new("new_day");
const NEW_DAY_DELAY_MS: u64 = 300;

fn lullaby() -> Sequence {
    Sequence::new()
        .then(1000, SNORE)
        .then(1000, FALLING_ASLEEP)
        .then(2000, SWEET_DREAMS)
        .then(2000, OFFER_NEW_DAY)
}

/// "Are you sure?" row shown before progress is wiped.
#[derive(Debug)]
struct Confirm {
    prompt: ElementId,
    yes: ElementId,
    no: ElementId,
}

#[derive(Debug)]
struct View {
    live: ActiveFlag,
    pet_name: String,
    status: ElementId,
    new_day: ElementId,
    choose_again: ElementId,
    confirm: Option<Confirm>,
    confirming: bool,
    offered: bool,
    leaving: bool,
}

impl View {
    fn ask_to_choose_again(&mut self, cx: &mut SceneContext<'_>) {
        self.confirming = true;
        let prompt = format!(
            "Choose a different pup? This will reset your progress with {}.",
            self.pet_name
        );
        if let Some(confirm) = &self.confirm {
            cx.stage.set_label(confirm.prompt, prompt);
            cx.stage.set_enabled(confirm.yes, true);
            cx.stage.set_enabled(confirm.no, true);
            return;
        }
        let prompt = cx.stage.text(prompt);
        let yes = cx.stage.button("✅ Yes, choose again");
        cx.stage.listen(yes, Listen::Tap);
        let no = cx.stage.button("↩️ Keep playing");
        cx.stage.listen(no, Listen::Tap);
        self.confirm = Some(Confirm { prompt, yes, no });
    }

    fn keep_playing(&mut self, cx: &mut SceneContext<'_>) {
        self.confirming = false;
        if let Some(confirm) = &self.confirm {
            cx.stage
                .set_label(confirm.prompt, format!("{} is glad you stayed!", self.pet_name));
            cx.stage.set_enabled(confirm.yes, false);
            cx.stage.set_enabled(confirm.no, false);
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct BedtimeScene {
    view: Option<View>,
}

impl Scene for BedtimeScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.view = None;
        let pet = require_pet(cx, SceneKey::Bedtime)?;

        cx.stage.heading(format!("Good Night, {}!", pet.name));
        let status = cx
            .stage
            .text(format!("😴 {} is getting sleepy...", pet.name));
        cx.stage.text(format!(
            "Day {} Complete! Tasks {}/{}",
            cx.state.day(),
            cx.state.completed_tasks_count(),
            cx.state.total_tasks_count()
        ));
        show_fact(cx, payload);

        // Offered once the lullaby has finished.
        let new_day = cx.stage.button("🌅 Start New Day");
        cx.stage.set_enabled(new_day, false);
        let choose_again = cx.stage.button("🔄 Choose Different Pup");
        cx.stage.listen(choose_again, Listen::Tap);

        cx.play(lullaby());
        let handle = SceneHandle::new(SceneKey::Bedtime);
        self.view = Some(View {
            live: handle.active_flag(),
            pet_name: pet.name,
            status,
            new_day,
            choose_again,
            confirm: None,
            confirming: false,
            offered: false,
            leaving: false,
        });
        Ok(handle)
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if !view.live.is_active() {
            return;
        }
        match event {
            SceneEvent::Timer(tag) if *tag == SNORE => play_sfx(cx, "snore"),
            SceneEvent::Timer(tag) if *tag == FALLING_ASLEEP => {
                cx.stage.set_label(
                    view.status,
                    format!("💤 {} is falling asleep...", view.pet_name),
                );
            }
            SceneEvent::Timer(tag) if *tag == SWEET_DREAMS => {
                cx.stage
                    .set_label(view.status, format!("🌙 Sweet dreams, {}!", view.pet_name));
            }
            SceneEvent::Timer(tag) if *tag == OFFER_NEW_DAY => {
                view.offered = true;
                cx.stage.set_label(
                    view.status,
                    format!("☀️ Ready for another day with {}?", view.pet_name),
                );
                cx.stage.set_enabled(view.new_day, true);
                cx.stage.listen(view.new_day, Listen::Tap);
            }
            SceneEvent::Timer(tag) if *tag == NEW_DAY => {
                cx.state.advance_day();
                info!(day = cx.state.day(), pet = %view.pet_name, "new_day");
                cx.navigate_to(SceneKey::WakeUp, None);
            }
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Tap { .. },
            } if !view.leaving => {
                if *element == view.new_day && view.offered {
                    view.leaving = true;
                    play_sfx(cx, "tap");
                    cx.stage.set_enabled(view.new_day, false);
                    cx.after(NEW_DAY_DELAY_MS, NEW_DAY);
                    return;
                }
                if *element == view.choose_again {
                    view.ask_to_choose_again(cx);
                    return;
                }
                let Some((yes, no)) = view.confirm.as_ref().map(|confirm| (confirm.yes, confirm.no))
                else {
                    return;
                };
                if *element == no {
                    view.keep_playing(cx);
                } else if *element == yes && view.confirming {
                    view.leaving = true;
                    info!(pet = %view.pet_name, "choose_different_pet");
                    cx.state.reset();
                    cx.navigate_to(SceneKey::SelectPet, None);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pup_engine::{MemoryStore, SceneKey};

    use crate::app::console::harness::{has, session_from, tap, wait};
    use crate::app::console::Session;

    const NIGHT: &str = r#"{"scene":"bedtime","day":3,"selectedPet":{"id":"trooper","name":"Trooper"},
        "careTasks":{"feed":true,"water":true,"brush":true,"clothes":false},
        "missionCompleted":true,"playCompleted":true,"bathCompleted":true}"#;

    fn bedtime() -> (Session, MemoryStore) {
        session_from(MemoryStore::with_contents(NIGHT))
    }

    fn new_day_enabled(session: &Session) -> bool {
        session
            .game()
            .stage()
            .find_by_label("Start New Day")
            .is_some_and(|element| element.enabled)
    }

    #[test]
    fn lullaby_plays_before_the_new_day_is_offered() {
        let (mut session, _store) = bedtime();
        assert!(has(&session, "Trooper is getting sleepy..."));
        assert!(has(&session, "Day 3 Complete! Tasks 3/4"));
        assert!(!new_day_enabled(&session));

        wait(&mut session, 1999);
        assert!(!has(&session, "falling asleep"));
        wait(&mut session, 1);
        assert!(has(&session, "Trooper is falling asleep..."));
        wait(&mut session, 2000);
        assert!(has(&session, "Sweet dreams, Trooper!"));
        wait(&mut session, 1999);
        assert!(!new_day_enabled(&session));
        wait(&mut session, 1);
        assert!(has(&session, "Ready for another day with Trooper?"));
        assert!(new_day_enabled(&session));
    }

    #[test]
    fn early_new_day_taps_are_ignored() {
        let (mut session, _store) = bedtime();
        tap(&mut session, "Start New Day");
        wait(&mut session, 1000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Bedtime));
        assert_eq!(session.game().state().day(), 3);
    }

    #[test]
    fn new_day_clears_progress_and_wakes_the_pet() {
        let (mut session, store) = bedtime();
        wait(&mut session, 6000);
        tap(&mut session, "Start New Day");
        wait(&mut session, 299);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Bedtime));
        wait(&mut session, 1);

        let state = session.game().state();
        assert_eq!(session.game().active_scene(), Some(SceneKey::WakeUp));
        assert_eq!(state.day(), 4);
        assert_eq!(state.completed_tasks_count(), 0);
        assert!(!state.bath_completed());
        assert_eq!(state.selected_pet().map(|pet| pet.id.as_str()), Some("trooper"));
        assert!(store.contents().unwrap_or_default().contains("\"day\": 4"));
    }

    #[test]
    fn choosing_a_different_pet_asks_before_wiping_progress() {
        let (mut session, store) = bedtime();
        tap(&mut session, "Choose Different Pup");

        assert_eq!(session.game().active_scene(), Some(SceneKey::Bedtime));
        assert_eq!(session.game().state().day(), 3);
        assert_eq!(
            session.game().state().selected_pet().map(|pet| pet.id.as_str()),
            Some("trooper")
        );
        assert!(has(&session, "This will reset your progress with Trooper."));
        assert!(store.contents().unwrap_or_default().contains("\"day\": 3"));
    }

    #[test]
    fn keep_playing_dismisses_the_question() {
        let (mut session, _store) = bedtime();
        tap(&mut session, "Choose Different Pup");
        tap(&mut session, "Keep playing");
        assert!(has(&session, "Trooper is glad you stayed!"));

        // The dismissed "yes" no longer answers.
        tap(&mut session, "Yes, choose again");
        assert_eq!(session.game().active_scene(), Some(SceneKey::Bedtime));
        assert_eq!(session.game().state().day(), 3);

        // Asking again re-arms the same row.
        tap(&mut session, "Choose Different Pup");
        tap(&mut session, "Yes, choose again");
        assert_eq!(session.game().active_scene(), Some(SceneKey::SelectPet));
    }

    #[test]
    fn confirming_resets_the_game() {
        let (mut session, _store) = bedtime();
        tap(&mut session, "Choose Different Pup");
        tap(&mut session, "Yes, choose again");

        let state = session.game().state();
        assert_eq!(session.game().active_scene(), Some(SceneKey::SelectPet));
        assert!(state.selected_pet().is_none());
        assert_eq!(state.day(), 1);
        assert!(has(&session, "Choose Your Pup Pal!"));

        // The lullaby died with the scene.
        wait(&mut session, 10_000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::SelectPet));
    }
}

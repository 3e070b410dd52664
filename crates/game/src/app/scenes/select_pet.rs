use pup_engine::{
    ElementId, GestureEvent, Listen, MountError, Scene, SceneContext, SceneEvent, SceneHandle,
    SceneKey, ScenePayload, TimerTag,
};
use tracing::{info, warn};

use super::{play_sfx, show_fact};

const PET_CHOSEN: TimerTag = TimerTag::new("pet_chosen");
const WAKE_UP_DELAY_MS: u64 = 1500;

#[derive(Debug, Default)]
pub(super) struct SelectPetScene {
    cards: Vec<(ElementId, String)>,
    chosen: bool,
}

impl Scene for SelectPetScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.cards.clear();
        self.chosen = false;

        cx.stage.heading("Choose Your Pup Pal!");
        cx.stage.text("Select a furry friend to start your adventure");
        show_fact(cx, payload);
        for pet in cx.state.data().list_all_pets() {
            let card = cx
                .stage
                .button(format!("{} {} ({})", pet.emoji, pet.name, pet.breed));
            cx.stage.listen(card, Listen::Tap);
            self.cards.push((card, pet.id));
        }
        Ok(SceneHandle::new(SceneKey::SelectPet))
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        match event {
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Tap { .. },
            } => {
                if self.chosen {
                    return;
                }
                let Some((_, pet_id)) = self.cards.iter().find(|(card, _)| card == element) else {
                    return;
                };
                if !cx.state.select_pet(pet_id) {
                    warn!(pet = %pet_id, "pet_selection_rejected");
                    return;
                }
                self.chosen = true;
                play_sfx(cx, "tap");
                for (card, _) in &self.cards {
                    if card != element {
                        cx.stage.set_enabled(*card, false);
                    }
                }
                let name = cx
                    .state
                    .selected_pet()
                    .map(|pet| pet.name.clone())
                    .unwrap_or_default();
                info!(pet = %pet_id, "pet_selected");
                cx.stage.text(format!("{name} selected!"));
                cx.after(WAKE_UP_DELAY_MS, PET_CHOSEN);
            }
            SceneEvent::Timer(tag) if *tag == PET_CHOSEN => {
                cx.navigate_to(SceneKey::WakeUp, None);
            }
            _ => {}
        }
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!("Select pet ({} choices)", self.cards.len()))
    }
}

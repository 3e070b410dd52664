use pup_engine::{MountError, Pet, SceneContext, SceneKey, ScenePayload, SceneRegistry};
use tracing::debug;

mod bath;
mod bedtime;
mod care;
mod mission;
mod play;
mod select_pet;
mod wake_up;

use bath::BathScene;
use bedtime::BedtimeScene;
use care::CareScene;
use mission::MissionScene;
use play::PlayScene;
use select_pet::SelectPetScene;
use wake_up::WakeUpScene;

pub(crate) fn build_scene_registry() -> SceneRegistry {
    SceneRegistry::default()
        .with(SceneKey::SelectPet, Box::<SelectPetScene>::default())
        .with(SceneKey::WakeUp, Box::<WakeUpScene>::default())
        .with(SceneKey::Care, Box::<CareScene>::default())
        .with(SceneKey::Mission, Box::<MissionScene>::default())
        .with(SceneKey::Play, Box::<PlayScene>::default())
        .with(SceneKey::Bath, Box::<BathScene>::default())
        .with(SceneKey::Bedtime, Box::<BedtimeScene>::default())
}

/// Every scene after pet selection needs a pet to talk about.
fn require_pet(cx: &SceneContext<'_>, scene: SceneKey) -> Result<Pet, MountError> {
    cx.state
        .selected_pet()
        .cloned()
        .ok_or(MountError::MissingPet { scene })
}

fn show_fact(cx: &mut SceneContext<'_>, payload: Option<&ScenePayload>) {
    if let Some(message) = payload.and_then(|payload| payload.message.as_deref()) {
        cx.stage.text(format!("💡 Did you know? {message}"));
    }
}

fn play_sfx(cx: &SceneContext<'_>, name: &'static str) {
    if cx.state.sound_enabled() {
        debug!(sfx = name, "sfx");
    }
}

#[cfg(test)]
mod tests {
    use pup_engine::{MemoryStore, SceneKey};

    use super::build_scene_registry;
    use crate::app::console::harness::{has, session, session_from, tap, wait, wiggle};

    #[test]
    fn every_scene_is_registered() {
        let registry = build_scene_registry();
        assert_eq!(registry.keys(), SceneKey::ALL.to_vec());
    }

    #[test]
    fn scenes_without_a_pet_send_the_player_to_selection() {
        for scene in ["wakeUp", "care", "mission", "play", "bath", "bedtime"] {
            let save = format!(r#"{{"scene":"{scene}"}}"#);
            let (session, _store) = session_from(MemoryStore::with_contents(save));
            assert_eq!(session.game().active_scene(), Some(SceneKey::SelectPet));
            assert_eq!(session.game().state().scene(), SceneKey::SelectPet);
        }
    }

    #[test]
    fn a_whole_day_from_selection_to_bedtime() {
        let (mut session, store) = session();
        tap(&mut session, "Trooper");
        wait(&mut session, 1500);
        assert_eq!(session.game().active_scene(), Some(SceneKey::WakeUp));

        for _ in 0..3 {
            wiggle(&mut session, "zzz");
        }
        wait(&mut session, 2000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Care));
        assert!(has(&session, "Did you know?"));

        for task in ["Feed", "Water", "Brush Teeth", "Get Dressed"] {
            tap(&mut session, task);
        }
        wait(&mut session, 3000);
        assert!(session.game().state().all_tasks_completed());
        wait(&mut session, 1000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Mission));

        super::mission::tests::finish_mission(&mut session);
        wait(&mut session, 1000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Play));

        tap(&mut session, "Throw");
        wait(&mut session, 800);
        wait(&mut session, 1000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Bath));

        super::bath::tests::scrub(&mut session, 20);
        wait(&mut session, 2000);
        assert_eq!(session.game().active_scene(), Some(SceneKey::Bedtime));
        assert_eq!(session.game().state().progress_percent(), 100);

        let saved = store.contents().unwrap_or_default();
        assert!(saved.contains("\"scene\": \"bedtime\""));
        assert!(saved.contains("\"bathCompleted\": true"));
    }
}

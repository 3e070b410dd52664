use pup_engine::{
    ElementId, GestureEvent, Listen, MountError, Scene, SceneContext, SceneEvent, SceneHandle,
    SceneKey, ScenePayload, TimerTag,
};
use tracing::{info, warn};

use super::{play_sfx, require_pet, show_fact};

const TASK_DONE: &str = "task_done";
const ALL_DONE: TimerTag = TimerTag::new("all_done");
const MISSION_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskButton {
    Ready,
    Working,
    Done,
}

#[derive(Debug)]
struct View {
    pet_name: String,
    progress: ElementId,
    fact: Option<ElementId>,
    buttons: Vec<(ElementId, TaskButton)>,
    finishing: bool,
}

#[derive(Debug, Default)]
pub(super) struct CareScene {
    view: Option<View>,
}

fn progress_line(cx: &SceneContext<'_>) -> String {
    format!(
        "{}/{} tasks completed",
        cx.state.completed_tasks_count(),
        cx.state.total_tasks_count()
    )
}

impl CareScene {
    fn finish_if_done(view: &mut View, cx: &mut SceneContext<'_>) {
        if view.finishing || !cx.state.all_tasks_completed() {
            return;
        }
        view.finishing = true;
        cx.stage.text(format!(
            "🎉 {} is all taken care of and ready for an adventure!",
            view.pet_name
        ));
        cx.after(MISSION_DELAY_MS, ALL_DONE);
    }
}

impl Scene for CareScene {
    fn mount(
        &mut self,
        cx: &mut SceneContext<'_>,
        payload: Option<&ScenePayload>,
    ) -> Result<SceneHandle, MountError> {
        self.view = None;
        let pet = require_pet(cx, SceneKey::Care)?;
        let data = cx.state.data().clone();

        cx.stage.heading(format!("Take Care of {}", pet.name));
        cx.stage
            .text("Complete all care tasks to unlock the next activity!");
        let line = progress_line(cx);
        let progress = cx.stage.text(line);
        show_fact(cx, payload);

        let mut buttons = Vec::new();
        for task in data.care_tasks() {
            let button = if cx.state.is_task_completed(task.id) {
                let button = cx.stage.button(format!("✅ {}", task.name));
                cx.stage.set_enabled(button, false);
                (button, TaskButton::Done)
            } else {
                let button = cx.stage.button(format!("{} {}", task.icon, task.name));
                cx.stage.listen(button, Listen::Tap);
                (button, TaskButton::Ready)
            };
            buttons.push(button);
        }

        let mut view = View {
            pet_name: pet.name,
            progress,
            fact: None,
            buttons,
            finishing: false,
        };
        // Resuming a day whose chores are already done.
        Self::finish_if_done(&mut view, cx);
        self.view = Some(view);
        Ok(SceneHandle::new(SceneKey::Care))
    }

    fn on_event(&mut self, event: &SceneEvent, cx: &mut SceneContext<'_>) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let data = cx.state.data().clone();
        let tasks = data.care_tasks();

        match event {
            SceneEvent::Gesture {
                element,
                gesture: GestureEvent::Tap { .. },
            } => {
                let Some(index) = view
                    .buttons
                    .iter()
                    .position(|(button, status)| button == element && *status == TaskButton::Ready)
                else {
                    return;
                };
                let Some(task) = tasks.get(index) else {
                    return;
                };
                view.buttons[index].1 = TaskButton::Working;
                cx.stage.set_enabled(*element, false);
                cx.stage.set_label(*element, "⏳ Working...");
                info!(task = task.id, duration_ms = task.duration_ms, "task_started");
                cx.after(task.duration_ms, TimerTag::indexed(TASK_DONE, index));
            }
            SceneEvent::Timer(tag) if tag.name == TASK_DONE => {
                let (Some(task), Some((button, status))) =
                    (tasks.get(tag.index), view.buttons.get_mut(tag.index))
                else {
                    return;
                };
                if !cx.state.complete_task(task.id) {
                    warn!(task = task.id, "task_completion_rejected");
                    return;
                }
                *status = TaskButton::Done;
                play_sfx(cx, task.id);
                cx.stage.set_label(*button, "✅ Done!");
                let line = progress_line(cx);
                cx.stage.set_label(view.progress, line);

                let fact = format!(
                    "💡 Did you know? {}",
                    data.random_fact(task.fact_category)
                );
                match view.fact {
                    Some(line) => {
                        cx.stage.set_label(line, fact);
                    }
                    None => view.fact = Some(cx.stage.text(fact)),
                }
                Self::finish_if_done(view, cx);
            }
            SceneEvent::Timer(tag) if *tag == ALL_DONE => {
                cx.navigate_to(SceneKey::Mission, None);
            }
            _ => {}
        }
    }

    fn debug_title(&self) -> Option<String> {
        let view = self.view.as_ref()?;
        let done = view
            .buttons
            .iter()
            .filter(|(_, status)| *status == TaskButton::Done)
            .count();
        Some(format!("Care ({done}/{})", view.buttons.len()))
    }
}

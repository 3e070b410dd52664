mod controller;
mod input;
mod loop_runner;
mod scene;
mod sequencer;
mod stage;

pub use controller::SceneController;
pub use input::{
    Direction, GestureConfig, GestureEvent, GestureRecognizer, PointerEvent, PointerKind,
    WiggleDetector,
};
pub use loop_runner::GameLoop;
pub use scene::{
    ActiveFlag, CleanupError, MountError, Scene, SceneContext, SceneEvent, SceneHandle, SceneKey,
    ScenePayload, SceneRegistry,
};
pub use sequencer::{DueTimer, Scheduler, Sequence, TimerId, TimerTag};
pub use stage::{Element, ElementId, ElementKind, Listen, ListenerId, Rect, Stage};

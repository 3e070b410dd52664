mod types;

pub use types::{CareTask, DataProvider, FactCategory, Mission, MissionKind, Pet};

use serde::{Deserialize, Serialize};

/// A pet as it is stored inside the save record (by value, not just by id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub personality: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareTask {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub duration_ms: u64,
    pub fact_category: FactCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactCategory {
    Feeding,
    Water,
    Dental,
    Grooming,
    Play,
    Bathing,
    Sleep,
    General,
}

impl FactCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            FactCategory::Feeding => "feeding",
            FactCategory::Water => "water",
            FactCategory::Dental => "dental",
            FactCategory::Grooming => "grooming",
            FactCategory::Play => "play",
            FactCategory::Bathing => "bathing",
            FactCategory::Sleep => "sleep",
            FactCategory::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionKind {
    Fetch,
    Stars,
    Treats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub kind: MissionKind,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Lookup tables the core consumes. Implemented by the game's static data.
pub trait DataProvider {
    fn pet_by_id(&self, id: &str) -> Option<Pet>;
    fn list_all_pets(&self) -> Vec<Pet>;
    /// Unknown buckets fall back to the general facts.
    fn random_fact(&self, category: FactCategory) -> String;
    fn random_mission(&self) -> Mission;
    /// The fixed set of per-day care tasks, in display order.
    fn care_tasks(&self) -> &[CareTask];
    /// Legacy pet id -> current pet id.
    fn legacy_pet_renames(&self) -> &[(&'static str, &'static str)] {
        &[]
    }
}

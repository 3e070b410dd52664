use std::cell::RefCell;

use pup_engine::{CareTask, DataProvider, FactCategory, Mission, MissionKind, Pet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct PetDef {
    id: &'static str,
    name: &'static str,
    breed: &'static str,
    emoji: &'static str,
    color: &'static str,
    personality: &'static str,
}

const PETS: [PetDef; 3] = [
    PetDef {
        id: "rover",
        name: "Rover",
        breed: "Golden Retriever",
        emoji: "🐕",
        color: "#F5A623",
        personality: "Friendly and energetic",
    },
    PetDef {
        id: "trooper",
        name: "Trooper",
        breed: "German Shepherd",
        emoji: "🐕‍🦺",
        color: "#4A90E2",
        personality: "Loyal and brave",
    },
    PetDef {
        id: "bluey",
        name: "Bluey",
        breed: "Blue Heeler",
        emoji: "🦮",
        color: "#7ED321",
        personality: "Playful and curious",
    },
];

const CARE_TASKS: [CareTask; 4] = [
    CareTask {
        id: "feed",
        name: "Feed",
        icon: "🍖",
        description: "Give your pup a nutritious meal",
        duration_ms: 2000,
        fact_category: FactCategory::Feeding,
    },
    CareTask {
        id: "water",
        name: "Water",
        icon: "💧",
        description: "Fresh water for hydration",
        duration_ms: 1500,
        fact_category: FactCategory::Water,
    },
    CareTask {
        id: "brush",
        name: "Brush Teeth",
        icon: "🪥",
        description: "Keep those teeth sparkling clean",
        duration_ms: 3000,
        fact_category: FactCategory::Dental,
    },
    CareTask {
        id: "clothes",
        name: "Get Dressed",
        icon: "👕",
        description: "Put on comfortable clothes",
        duration_ms: 2500,
        fact_category: FactCategory::Grooming,
    },
];

const MISSIONS: [Mission; 3] = [
    Mission {
        kind: MissionKind::Fetch,
        name: "Fetch the Disc",
        description: "Help your pup catch the flying disc!",
        icon: "🥏",
    },
    Mission {
        kind: MissionKind::Stars,
        name: "Collect Stars",
        description: "Tap all the twinkling stars!",
        icon: "⭐",
    },
    Mission {
        kind: MissionKind::Treats,
        name: "Find Treats",
        description: "Help your pup find hidden treats!",
        icon: "🦴",
    },
];

const LEGACY_RENAMES: [(&str, &str); 2] = [("rofa", "rover"), ("bingo", "trooper")];

const FEEDING: &[&str] = &[
    "Dogs have about 1,700 taste buds compared to humans who have about 9,000!",
    "A dog's digestive system is much shorter than ours: food moves through in about 8-10 hours.",
    "Dogs can't taste sweet flavors as well as we can, but they're great at tasting meat and fat!",
];
const WATER: &[&str] = &[
    "Dogs need about 1 ounce of water per pound of body weight each day.",
    "A dog's tongue acts like a tiny ladle, curling backward to scoop up water efficiently.",
    "Dogs can survive much longer without food than without water, so staying hydrated is super important!",
];
const DENTAL: &[&str] = &[
    "Adult dogs have 42 teeth: that's 10 more than adult humans!",
    "Dogs lose their baby teeth just like we do, usually between 3-6 months old.",
    "A dog's bite force can be 200-400 pounds per square inch, which is why dental care matters!",
];
const GROOMING: &[&str] = &[
    "Dogs have a double coat: a soft undercoat for warmth and a tougher outer coat for protection.",
    "A dog's fur grows in cycles, which is why they shed seasonally.",
    "Some dog breeds don't shed much because their hair keeps growing like ours does!",
];
const PLAY: &[&str] = &[
    "Play fighting helps puppies learn bite control and social skills.",
    "Dogs play to bond with each other and release energy. It's exercise and friendship combined!",
    "When dogs play bow (front down, rear up), they're saying 'everything I do now is just for fun!'",
];
const BATHING: &[&str] = &[
    "Dogs naturally produce oils in their skin that help keep them waterproof and healthy.",
    "A dog's skin is much thinner than human skin, so gentle products are important.",
    "Most dogs only need baths every 6-12 weeks unless they get extra dirty or smelly!",
];
const SLEEP: &[&str] = &[
    "Dogs sleep 12-14 hours a day on average. They're professional nappers!",
    "Dogs dream just like we do, and you might see them moving their legs while dreaming of running.",
    "Puppies and senior dogs need even more sleep to help their bodies grow and recover.",
];
const GENERAL: &[&str] = &[
    "Dogs have an incredible sense of smell, about 10,000 to 100,000 times better than ours!",
    "A dog's nose print is unique, just like our fingerprints.",
    "Dogs can hear sounds at frequencies twice as high as humans can detect.",
    "The average dog can learn about 150 words and can count up to 4 or 5!",
];

fn facts_for(category: FactCategory) -> &'static [&'static str] {
    let facts = match category {
        FactCategory::Feeding => FEEDING,
        FactCategory::Water => WATER,
        FactCategory::Dental => DENTAL,
        FactCategory::Grooming => GROOMING,
        FactCategory::Play => PLAY,
        FactCategory::Bathing => BATHING,
        FactCategory::Sleep => SLEEP,
        FactCategory::General => GENERAL,
    };
    if facts.is_empty() {
        GENERAL
    } else {
        facts
    }
}

/// Static pet, task, fact and mission tables with a seedable picker.
pub(crate) struct PupData {
    rng: RefCell<StdRng>,
}

impl PupData {
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: RefCell::new(rng),
        }
    }

    fn pick(&self, len: usize) -> usize {
        self.rng.borrow_mut().gen_range(0..len.max(1))
    }
}

fn to_pet(def: &PetDef) -> Pet {
    Pet {
        id: def.id.to_string(),
        name: def.name.to_string(),
        breed: def.breed.to_string(),
        emoji: def.emoji.to_string(),
        color: def.color.to_string(),
        personality: def.personality.to_string(),
    }
}

impl DataProvider for PupData {
    fn pet_by_id(&self, id: &str) -> Option<Pet> {
        PETS.iter().find(|def| def.id == id).map(to_pet)
    }

    fn list_all_pets(&self) -> Vec<Pet> {
        PETS.iter().map(to_pet).collect()
    }

    fn random_fact(&self, category: FactCategory) -> String {
        let facts = facts_for(category);
        facts[self.pick(facts.len())].to_string()
    }

    fn random_mission(&self) -> Mission {
        MISSIONS[self.pick(MISSIONS.len())].clone()
    }

    fn care_tasks(&self) -> &[CareTask] {
        &CARE_TASKS
    }

    fn legacy_pet_renames(&self) -> &[(&'static str, &'static str)] {
        &LEGACY_RENAMES
    }
}

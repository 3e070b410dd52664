use std::rc::Rc;

use pup_engine::{
    resolve_app_paths, FileStore, GameConfig, GameLoop, GameState, MemoryStore, StateStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::data::PupData;
use super::scenes::build_scene_registry;

const AUTOSAVE_ENV_VAR: &str = "PUPPAL_AUTOSAVE_MS";
const SEED_ENV_VAR: &str = "PUPPAL_SEED";

pub(crate) struct AppWiring {
    pub(crate) config: GameConfig,
    pub(crate) game: GameLoop,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Pup Pal Startup ===");

    let mut config = GameConfig::default();
    if let Some(interval_ms) = env_u64(AUTOSAVE_ENV_VAR) {
        config.autosave_interval_ms = interval_ms;
    }
    let seed = env_u64(SEED_ENV_VAR);

    let data = Rc::new(PupData::new(seed));
    let state = GameState::init(open_store(), data);
    let game = GameLoop::new(&config, state, build_scene_registry());
    info!(
        autosave_interval_ms = config.autosave_interval_ms,
        seeded = seed.is_some(),
        "app_wired"
    );

    AppWiring { config, game }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the stage.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn open_store() -> Box<dyn StateStore> {
    match resolve_app_paths() {
        Ok(paths) => {
            let store = FileStore::in_dir(&paths.save_dir);
            info!(path = %store.path().display(), "save_file");
            Box::new(store)
        }
        Err(error) => {
            warn!(error = %error, "save_dir_unavailable, progress will not persist");
            Box::new(MemoryStore::default())
        }
    }
}

fn env_u64(var: &str) -> Option<u64> {
    let raw = std::env::var(var).ok()?;
    parse_u64_value(var, &raw)
}

fn parse_u64_value(var: &str, raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u64>() {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(var, value = %raw, error = %error, "ignoring invalid env value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_u64_value;

    #[test]
    fn numeric_values_parse_with_surrounding_whitespace() {
        assert_eq!(parse_u64_value("PUPPAL_SEED", " 42 "), Some(42));
        assert_eq!(parse_u64_value("PUPPAL_AUTOSAVE_MS", "0"), Some(0));
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        assert_eq!(parse_u64_value("PUPPAL_SEED", "   "), None);
        assert_eq!(parse_u64_value("PUPPAL_SEED", "-3"), None);
        assert_eq!(parse_u64_value("PUPPAL_AUTOSAVE_MS", "5s"), None);
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod state;

pub use app::{
    ActiveFlag, CleanupError, Direction, DueTimer, Element, ElementId, ElementKind, GameLoop,
    GestureConfig, GestureEvent, GestureRecognizer, Listen, ListenerId, MountError, PointerEvent,
    PointerKind, Rect, Scene, SceneContext, SceneController, SceneEvent, SceneHandle, SceneKey,
    ScenePayload, SceneRegistry, Scheduler, Sequence, Stage, TimerId, TimerTag, WiggleDetector,
};
pub use content::{CareTask, DataProvider, FactCategory, Mission, MissionKind, Pet};
pub use state::{
    FileStore, GameState, MemoryStore, StateStore, StateSummary, StoreError, STATE_KEY,
};

pub const ROOT_ENV_VAR: &str = "PUPPAL_ROOT";

/// Tuning knobs for input recognition, the stage and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Minimum horizontal travel between samples that counts as a direction change.
    pub wiggle_threshold: f32,
    pub wiggle_time_window_ms: u64,
    pub wiggle_min_moves: usize,
    pub tap_max_distance: f32,
    pub tap_max_duration_ms: u64,
    /// 0 disables auto-save.
    pub autosave_interval_ms: u64,
    pub stage_width: f32,
    pub row_height: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            wiggle_threshold: 30.0,
            wiggle_time_window_ms: 5000,
            wiggle_min_moves: 3,
            tap_max_distance: 10.0,
            tap_max_duration_ms: 300,
            autosave_interval_ms: 5000,
            stage_width: 320.0,
            row_height: 40.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub save_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "PUPPAL_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and crates/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Set {env_var} explicitly, for example: export {env_var}=\"/path/to/pup-pal\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Resolves the project root and makes sure `<root>/saves` exists.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let save_dir = root.join("saves");
    fs::create_dir_all(&save_dir).map_err(|source| StartupError::CreateSaveDir {
        path: save_dir.clone(),
        source,
    })?;
    Ok(AppPaths { root, save_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("crates").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

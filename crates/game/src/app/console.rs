use pup_engine::{ElementId, GameConfig, GameLoop, PointerEvent, PointerKind};
use thiserror::Error;
use tracing::debug;

const TAP_HOLD_MS: u64 = 50;
const WIGGLE_STEP_MS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConsoleCommand {
    Press { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Release { x: f32, y: f32 },
    Tap { element: u32 },
    Wiggle { element: u32 },
    Wait { ms: u64 },
    Go { scene: String },
    State,
    Sound,
    /// Only `reset yes` wipes progress; a bare `reset` asks first.
    Reset { confirmed: bool },
    Help,
    Quit,
}

#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error("unknown command '{0}'. try: help")]
    Unknown(String),
    #[error("missing argument {arg}. usage: {usage}")]
    MissingArg {
        arg: &'static str,
        usage: &'static str,
    },
    #[error("invalid {arg} '{value}'. usage: {usage}")]
    InvalidArg {
        arg: &'static str,
        value: String,
        usage: &'static str,
    },
    #[error("too many arguments. usage: {usage}")]
    TooManyArgs { usage: &'static str },
    #[error("no element with id {0} on stage")]
    NoSuchElement(u32),
    #[error("failed to render state summary: {0}")]
    Summary(#[from] serde_json::Error),
}

struct CommandSpec {
    name: &'static str,
    usage: &'static str,
    help: &'static str,
}

// Help output follows this order.
const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "press",
        usage: "press <x> <y>",
        help: "Put the pointer down",
    },
    CommandSpec {
        name: "move",
        usage: "move <x> <y>",
        help: "Move the pointer",
    },
    CommandSpec {
        name: "release",
        usage: "release <x> <y>",
        help: "Lift the pointer",
    },
    CommandSpec {
        name: "tap",
        usage: "tap <id>",
        help: "Tap the centre of an element",
    },
    CommandSpec {
        name: "wiggle",
        usage: "wiggle <id>",
        help: "Shake left and right on an element",
    },
    CommandSpec {
        name: "wait",
        usage: "wait <ms>",
        help: "Let time pass",
    },
    CommandSpec {
        name: "go",
        usage: "go <scene>",
        help: "Navigate to a scene by name",
    },
    CommandSpec {
        name: "state",
        usage: "state",
        help: "Print the saved game summary",
    },
    CommandSpec {
        name: "sound",
        usage: "sound",
        help: "Toggle sound effects",
    },
    CommandSpec {
        name: "reset",
        usage: "reset [yes]",
        help: "Wipe progress and pick a new pet",
    },
    CommandSpec {
        name: "help",
        usage: "help",
        help: "List commands",
    },
    CommandSpec {
        name: "quit",
        usage: "quit",
        help: "Save and exit",
    },
];

pub(crate) fn help_lines() -> Vec<String> {
    COMMANDS
        .iter()
        .map(|spec| format!("{} - {}", spec.usage, spec.help))
        .collect()
}

/// Blank lines and `#` comments parse to `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return Ok(None);
    };
    let lower = name.to_ascii_lowercase();
    let Some(spec) = COMMANDS.iter().find(|spec| spec.name == lower) else {
        return Err(CommandError::Unknown(name.to_string()));
    };
    let args: Vec<&str> = tokens.collect();
    let usage = spec.usage;

    let command = match spec.name {
        "press" | "move" | "release" => {
            expect_arity(&args, 2, usage)?;
            let x = parse_arg::<f32>(&args, 0, "<x>", usage)?;
            let y = parse_arg::<f32>(&args, 1, "<y>", usage)?;
            match spec.name {
                "press" => ConsoleCommand::Press { x, y },
                "move" => ConsoleCommand::Move { x, y },
                _ => ConsoleCommand::Release { x, y },
            }
        }
        "tap" | "wiggle" => {
            expect_arity(&args, 1, usage)?;
            let element = parse_arg::<u32>(&args, 0, "<id>", usage)?;
            if spec.name == "tap" {
                ConsoleCommand::Tap { element }
            } else {
                ConsoleCommand::Wiggle { element }
            }
        }
        "wait" => {
            expect_arity(&args, 1, usage)?;
            ConsoleCommand::Wait {
                ms: parse_arg::<u64>(&args, 0, "<ms>", usage)?,
            }
        }
        "go" => {
            expect_arity(&args, 1, usage)?;
            ConsoleCommand::Go {
                scene: parse_arg::<String>(&args, 0, "<scene>", usage)?,
            }
        }
        "reset" => {
            expect_arity(&args, 1, usage)?;
            match args.first() {
                None => ConsoleCommand::Reset { confirmed: false },
                Some(answer) if answer.eq_ignore_ascii_case("yes") => {
                    ConsoleCommand::Reset { confirmed: true }
                }
                Some(answer) => {
                    return Err(CommandError::InvalidArg {
                        arg: "[yes]",
                        value: (*answer).to_string(),
                        usage,
                    })
                }
            }
        }
        "state" | "sound" | "help" | "quit" => {
            expect_arity(&args, 0, usage)?;
            match spec.name {
                "state" => ConsoleCommand::State,
                "sound" => ConsoleCommand::Sound,
                "help" => ConsoleCommand::Help,
                _ => ConsoleCommand::Quit,
            }
        }
        _ => return Err(CommandError::Unknown(name.to_string())),
    };
    Ok(Some(command))
}

fn expect_arity(args: &[&str], expected: usize, usage: &'static str) -> Result<(), CommandError> {
    if args.len() > expected {
        return Err(CommandError::TooManyArgs { usage });
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(
    args: &[&str],
    index: usize,
    arg: &'static str,
    usage: &'static str,
) -> Result<T, CommandError> {
    let raw = args
        .get(index)
        .ok_or(CommandError::MissingArg { arg, usage })?;
    raw.parse().map_err(|_| CommandError::InvalidArg {
        arg,
        value: (*raw).to_string(),
        usage,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    Lines(Vec<String>),
    Quit,
}

/// Drives a `GameLoop` from console commands on a simulated clock.
pub(crate) struct Session {
    game: GameLoop,
    pointer: PointerKind,
    wiggle_swing: f32,
    wiggle_moves: usize,
}

impl Session {
    pub(crate) fn new(game: GameLoop, config: &GameConfig) -> Self {
        Self {
            game,
            pointer: PointerKind::Mouse,
            wiggle_swing: config.wiggle_threshold + 15.0,
            wiggle_moves: config.wiggle_min_moves.max(1),
        }
    }

    pub(crate) fn game(&self) -> &GameLoop {
        &self.game
    }

    pub(crate) fn start(&mut self) {
        self.game.start();
    }

    pub(crate) fn shutdown(&mut self) {
        self.game.shutdown();
    }

    pub(crate) fn render(&self) -> Vec<String> {
        let scene = self
            .game
            .active_scene()
            .map_or("none", |scene| scene.as_str());
        let mut lines = vec![format!(
            "-- {scene} | day {} | {}% | t={}ms --",
            self.game.state().day(),
            self.game.state().progress_percent(),
            self.game.now_ms()
        )];
        if let Some(title) = self.game.controller().debug_title() {
            lines.push(format!("[{title}]"));
        }
        lines.extend(self.game.stage().render_lines());
        lines
    }

    pub(crate) fn execute(&mut self, command: ConsoleCommand) -> Result<Reply, CommandError> {
        debug!(command = ?command, now_ms = self.game.now_ms(), "console_command");
        match command {
            ConsoleCommand::Press { x, y } => {
                let at_ms = self.game.now_ms();
                self.send(PointerEvent::Press {
                    x,
                    y,
                    at_ms,
                    kind: self.pointer,
                });
            }
            ConsoleCommand::Move { x, y } => {
                let at_ms = self.game.now_ms();
                self.send(PointerEvent::Move {
                    x,
                    y,
                    at_ms,
                    kind: self.pointer,
                });
            }
            ConsoleCommand::Release { x, y } => {
                let at_ms = self.game.now_ms();
                self.send(PointerEvent::Release {
                    x,
                    y,
                    at_ms,
                    kind: self.pointer,
                });
            }
            ConsoleCommand::Tap { element } => {
                let (x, y) = self.element_center(element)?;
                self.tap_at(x, y);
            }
            ConsoleCommand::Wiggle { element } => {
                let (x, y) = self.element_center(element)?;
                self.wiggle_at(x, y);
            }
            ConsoleCommand::Wait { ms } => {
                self.game.advance_by(ms);
            }
            ConsoleCommand::Go { scene } => self.game.navigate_to_named(&scene),
            ConsoleCommand::State => {
                let summary = serde_json::to_string_pretty(&self.game.state().summary())?;
                return Ok(Reply::Lines(summary.lines().map(str::to_string).collect()));
            }
            ConsoleCommand::Sound => {
                let enabled = self.game.toggle_sound();
                let mut lines = vec![format!("sound {}", if enabled { "on" } else { "off" })];
                lines.extend(self.render());
                return Ok(Reply::Lines(lines));
            }
            ConsoleCommand::Reset { confirmed: false } => {
                return Ok(Reply::Lines(vec![
                    "This will reset all progress. Type 'reset yes' to confirm.".to_string(),
                ]));
            }
            ConsoleCommand::Reset { confirmed: true } => self.game.reset_game(),
            ConsoleCommand::Help => return Ok(Reply::Lines(help_lines())),
            ConsoleCommand::Quit => return Ok(Reply::Quit),
        }
        Ok(Reply::Lines(self.render()))
    }

    fn send(&mut self, event: PointerEvent) {
        self.game.handle_pointer(event);
    }

    fn element_center(&self, id: u32) -> Result<(f32, f32), CommandError> {
        self.game
            .stage()
            .element(ElementId(id))
            .map(|element| element.bounds.center())
            .ok_or(CommandError::NoSuchElement(id))
    }

    fn tap_at(&mut self, x: f32, y: f32) {
        let kind = self.pointer;
        let start = self.game.now_ms();
        self.send(PointerEvent::Press {
            x,
            y,
            at_ms: start,
            kind,
        });
        self.send(PointerEvent::Release {
            x,
            y,
            at_ms: start + TAP_HOLD_MS,
            kind,
        });
    }

    fn wiggle_at(&mut self, x: f32, y: f32) {
        let kind = self.pointer;
        let start = self.game.now_ms();
        self.send(PointerEvent::Press {
            x,
            y,
            at_ms: start,
            kind,
        });
        let mut last_x = x;
        let mut at_ms = start;
        for step in 0..self.wiggle_moves {
            at_ms += WIGGLE_STEP_MS;
            last_x = if step % 2 == 0 { x + self.wiggle_swing } else { x };
            self.send(PointerEvent::Move {
                x: last_x,
                y,
                at_ms,
                kind,
            });
        }
        self.send(PointerEvent::Release {
            x: last_x,
            y,
            at_ms: at_ms + WIGGLE_STEP_MS,
            kind,
        });
    }
}

#[cfg(test)]
pub(crate) mod harness {
    use std::rc::Rc;

    use pup_engine::{GameConfig, GameLoop, GameState, MemoryStore};

    use super::{ConsoleCommand, Reply, Session};
    use crate::app::data::PupData;
    use crate::app::scenes::build_scene_registry;

    pub(crate) const SEED: u64 = 7;

    pub(crate) fn session() -> (Session, MemoryStore) {
        session_from(MemoryStore::default())
    }

    pub(crate) fn session_from(store: MemoryStore) -> (Session, MemoryStore) {
        let config = GameConfig::default();
        let state = GameState::init(Box::new(store.clone()), Rc::new(PupData::new(Some(SEED))));
        let game = GameLoop::new(&config, state, build_scene_registry());
        let mut session = Session::new(game, &config);
        session.start();
        (session, store)
    }

    pub(crate) fn id_of(session: &Session, needle: &str) -> u32 {
        session
            .game()
            .stage()
            .find_by_label(needle)
            .map(|element| element.id.0)
            .unwrap_or_else(|| panic!("no element containing '{needle}' in {:?}", session.render()))
    }

    pub(crate) fn has(session: &Session, needle: &str) -> bool {
        session.game().stage().find_by_label(needle).is_some()
    }

    pub(crate) fn run(session: &mut Session, command: ConsoleCommand) {
        match session.execute(command) {
            Ok(Reply::Lines(_)) | Ok(Reply::Quit) => {}
            Err(error) => panic!("command failed: {error}"),
        }
    }

    pub(crate) fn tap(session: &mut Session, needle: &str) {
        let element = id_of(session, needle);
        run(session, ConsoleCommand::Tap { element });
    }

    pub(crate) fn wiggle(session: &mut Session, needle: &str) {
        let element = id_of(session, needle);
        run(session, ConsoleCommand::Wiggle { element });
    }

    pub(crate) fn wait(session: &mut Session, ms: u64) {
        run(session, ConsoleCommand::Wait { ms });
    }
}

use crate::GameConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Raw pointer input, timestamped in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press {
        x: f32,
        y: f32,
        at_ms: u64,
        kind: PointerKind,
    },
    Move {
        x: f32,
        y: f32,
        at_ms: u64,
        kind: PointerKind,
    },
    Release {
        x: f32,
        y: f32,
        at_ms: u64,
        kind: PointerKind,
    },
}

impl PointerEvent {
    pub fn at_ms(&self) -> u64 {
        match *self {
            PointerEvent::Press { at_ms, .. }
            | PointerEvent::Move { at_ms, .. }
            | PointerEvent::Release { at_ms, .. } => at_ms,
        }
    }
}

/// What scenes receive. Drag events carry the same payloads a touch-drag
/// handler would: positions, per-move deltas and the total on release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Start {
        x: f32,
        y: f32,
        kind: PointerKind,
    },
    Move {
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        kind: PointerKind,
    },
    End {
        x: f32,
        y: f32,
        total_dx: f32,
        total_dy: f32,
        kind: PointerKind,
    },
    Wiggle {
        kind: PointerKind,
    },
    Tap {
        x: f32,
        y: f32,
        kind: PointerKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub wiggle_threshold: f32,
    pub wiggle_time_window_ms: u64,
    pub wiggle_min_moves: usize,
    pub tap_max_distance: f32,
    pub tap_max_duration_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            wiggle_threshold: 30.0,
            wiggle_time_window_ms: 5000,
            wiggle_min_moves: 3,
            tap_max_distance: 10.0,
            tap_max_duration_ms: 300,
        }
    }
}

impl From<&GameConfig> for GestureConfig {
    fn from(config: &GameConfig) -> Self {
        Self {
            wiggle_threshold: config.wiggle_threshold,
            wiggle_time_window_ms: config.wiggle_time_window_ms,
            wiggle_min_moves: config.wiggle_min_moves,
            tap_max_distance: config.tap_max_distance,
            tap_max_duration_ms: config.tap_max_duration_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f32,
    at_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct GestureSession {
    window_start_ms: u64,
    samples: Vec<Sample>,
    directions: Vec<Direction>,
}

impl GestureSession {
    fn starting_at(sample: Sample) -> Self {
        Self {
            window_start_ms: sample.at_ms,
            samples: vec![sample],
            directions: Vec::new(),
        }
    }

    fn is_alternating(&self) -> bool {
        self.directions.windows(2).all(|pair| pair[0] != pair[1])
    }
}

/// Detects a left/right/left... shake inside a time window.
///
/// Consecutive steps in the same direction collapse into one token, so the
/// recorded tokens always alternate; the gesture fires once enough tokens
/// accumulate and the session is then discarded.
#[derive(Debug, Clone)]
pub struct WiggleDetector {
    threshold: f32,
    window_ms: u64,
    min_moves: usize,
    session: Option<GestureSession>,
}

impl WiggleDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            threshold: config.wiggle_threshold,
            window_ms: config.wiggle_time_window_ms,
            min_moves: config.wiggle_min_moves.max(1),
            session: None,
        }
    }

    /// Feeds one horizontal sample. Returns true exactly when the wiggle fires.
    pub fn push_sample(&mut self, x: f32, at_ms: u64) -> bool {
        let sample = Sample { x, at_ms };
        let Some(session) = self.session.as_mut() else {
            self.session = Some(GestureSession::starting_at(sample));
            return false;
        };

        if at_ms.saturating_sub(session.window_start_ms) > self.window_ms {
            *session = GestureSession::starting_at(sample);
            return false;
        }

        let previous = session.samples.last().copied().unwrap_or(sample);
        session.samples.push(sample);
        let displacement = sample.x - previous.x;
        if displacement.abs() > self.threshold {
            let direction = if displacement > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            };
            if session.directions.last() != Some(&direction) {
                session.directions.push(direction);
            }
        }
        debug_assert!(session.is_alternating());

        if session.directions.len() >= self.min_moves {
            self.session = None;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.session = None;
    }

    pub fn directions(&self) -> &[Direction] {
        self.session
            .as_ref()
            .map(|session| session.directions.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    x: f32,
    y: f32,
    at_ms: u64,
    last_x: f32,
    last_y: f32,
}

/// Turns raw pointer events into drag, wiggle and tap gestures.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    press: Option<Press>,
    wiggle: WiggleDetector,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        let wiggle = WiggleDetector::new(&config);
        Self {
            config,
            press: None,
            wiggle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some()
    }

    pub fn handle(&mut self, event: PointerEvent) -> Vec<GestureEvent> {
        match event {
            PointerEvent::Press { x, y, at_ms, kind } => {
                self.press = Some(Press {
                    x,
                    y,
                    at_ms,
                    last_x: x,
                    last_y: y,
                });
                self.wiggle.reset();
                self.wiggle.push_sample(x, at_ms);
                vec![GestureEvent::Start { x, y, kind }]
            }
            PointerEvent::Move { x, y, at_ms, kind } => {
                let Some(press) = self.press.as_mut() else {
                    return Vec::new();
                };
                let dx = x - press.last_x;
                let dy = y - press.last_y;
                press.last_x = x;
                press.last_y = y;
                let mut events = vec![GestureEvent::Move { x, y, dx, dy, kind }];
                if self.wiggle.push_sample(x, at_ms) {
                    events.push(GestureEvent::Wiggle { kind });
                }
                events
            }
            PointerEvent::Release { x, y, at_ms, kind } => {
                let Some(press) = self.press.take() else {
                    return Vec::new();
                };
                self.wiggle.reset();
                let mut events = vec![GestureEvent::End {
                    x,
                    y,
                    total_dx: x - press.x,
                    total_dy: y - press.y,
                    kind,
                }];
                if self.is_tap(&press, x, y, at_ms) {
                    events.push(GestureEvent::Tap { x, y, kind });
                }
                events
            }
        }
    }

    fn is_tap(&self, press: &Press, x: f32, y: f32, at_ms: u64) -> bool {
        let duration_ms = at_ms.saturating_sub(press.at_ms);
        if duration_ms > self.config.tap_max_duration_ms {
            return false;
        }
        let distance = ((x - press.x).powi(2) + (y - press.y).powi(2)).sqrt();
        distance <= self.config.tap_max_distance
    }
}

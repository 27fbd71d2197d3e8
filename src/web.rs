//! Browser bindings
//!
//! A JS front end owns rendering, audio and timers; it forwards pointer events
//! in canvas pixels and gets back the resulting notices as a JSON array.

use wasm_bindgen::prelude::*;

use crate::persistence::MemorySink;
use crate::round::{Notice, RoundInput, TimerId};
use crate::session::Session;
use crate::settings::{GameKind, GameSettings};
use crate::to_play_area;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Already initialized when several games share a page
    let _ = console_log::init_with_level(log::Level::Info);
}

impl TraceGame {
    fn feed(&mut self, input: RoundInput, now_ms: f64) -> String {
        encode(&self.session.handle(input, now_ms as u64))
    }
}

fn encode(notices: &[Notice]) -> String {
    serde_json::to_string(notices).unwrap_or_else(|e| {
        log::warn!("Failed to encode notices: {}", e);
        "[]".to_string()
    })
}

/// One session driven from JS
#[wasm_bindgen]
pub struct TraceGame {
    session: Session<(), MemorySink>,
}

#[wasm_bindgen]
impl TraceGame {
    /// New session of `game` (kebab-case name) with preset settings
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, seed: f64) -> Result<TraceGame, JsValue> {
        let kind = GameKind::from_str(game)
            .ok_or_else(|| JsValue::from_str(&format!("unknown game: {}", game)))?;
        let mut settings = kind.preset();
        settings.seed = seed as u64;
        log::info!("{} session created with seed {}", kind.as_str(), settings.seed);
        Ok(Self {
            session: Session::seeded(&settings, (), MemorySink::new()),
        })
    }

    /// New session from a settings JSON object
    pub fn with_settings(json: &str) -> Result<TraceGame, JsValue> {
        let settings: GameSettings =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        settings
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            session: Session::seeded(&settings, (), MemorySink::new()),
        })
    }

    pub fn begin(&mut self, now_ms: f64) -> String {
        self.feed(RoundInput::Begin, now_ms)
    }

    pub fn presentation_done(&mut self, now_ms: f64) -> String {
        self.feed(RoundInput::PresentationDone, now_ms)
    }

    pub fn drag_start(&mut self, x: f32, y: f32, width: f32, height: f32, now_ms: f64) -> String {
        self.feed(RoundInput::DragStart(to_play_area(x, y, width, height)), now_ms)
    }

    pub fn drag_move(&mut self, x: f32, y: f32, width: f32, height: f32, now_ms: f64) -> String {
        self.feed(RoundInput::DragMove(to_play_area(x, y, width, height)), now_ms)
    }

    pub fn drag_end(&mut self, x: f32, y: f32, width: f32, height: f32, now_ms: f64) -> String {
        self.feed(RoundInput::DragEnd(to_play_area(x, y, width, height)), now_ms)
    }

    pub fn tap(&mut self, now_ms: f64) -> String {
        self.feed(RoundInput::Tap, now_ms)
    }

    /// A timer id from an `armed` notice fired
    pub fn timer_fired(&mut self, timer: f64, now_ms: f64) -> String {
        self.feed(RoundInput::TimerFired(TimerId(timer as u64)), now_ms)
    }

    pub fn tick(&mut self, now_ms: f64) -> String {
        self.feed(RoundInput::Tick, now_ms)
    }

    pub fn cancel(&mut self, now_ms: f64) -> String {
        encode(&self.session.cancel(now_ms as u64))
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Final summary as JSON, once the session is complete
    pub fn summary_json(&self) -> Option<String> {
        self.session
            .summary()
            .and_then(|summary| serde_json::to_string(summary).ok())
    }
}

//! Trace trainer demo runner
//!
//! Plays one autoplayed session of a game and prints the summary as JSON.
//!
//! ```text
//! trace-trainer [game] [seed] [--settings path] [--log path]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use clap::Parser;
    use glam::Vec2;
    use trace_trainer::persistence::{JsonLinesSink, MemorySink, PersistError, ScoreSink};
    use trace_trainer::round::{Autoplayer, RoundResult, TrialSpec};
    use trace_trainer::{GameKind, GameSettings, Presenter, Session, SessionSummary};

    /// Play one autoplayed therapy-game session and print its summary
    #[derive(Parser, Debug, Clone, PartialEq)]
    #[clap(version, about)]
    pub struct Cli {
        /// game to play (e.g. path-follow, snake-slide, stop-on-signal)
        #[clap(value_parser = parse_game, default_value = "path-follow")]
        pub game: GameKind,

        /// trial generation seed (defaults to the settings seed)
        pub seed: Option<u64>,

        /// settings JSON file; falls back to the game preset when unreadable
        #[clap(long)]
        pub settings: Option<PathBuf>,

        /// append the session record to this JSON-lines file
        #[clap(long)]
        pub log: Option<PathBuf>,
    }

    fn parse_game(s: &str) -> Result<GameKind, String> {
        GameKind::from_str(s).ok_or_else(|| format!("unknown game: {}", s))
    }

    /// Logs each resolved attempt
    struct ConsolePresenter {
        warnings: u32,
    }

    impl Presenter for ConsolePresenter {
        fn on_track(&mut self, on_track: bool) {
            if !on_track {
                log::debug!("Off track");
            }
        }

        fn progress(&mut self, _progress: f32, _position: Vec2) {}

        fn round_resolved(&mut self, result: &RoundResult) {
            log::info!(
                "Round {} attempt {}: {:?} at {:.0}% after {} ms",
                result.round + 1,
                result.attempt,
                result.outcome,
                result.progress_at_end * 100.0,
                result.elapsed_ms
            );
        }

        fn session_complete(&mut self, summary: &SessionSummary) {
            log::info!(
                "Finished with {} off-track warnings, {:.1}% accuracy",
                self.warnings,
                summary.accuracy_pct
            );
        }

        fn instructions(&mut self, round: u32, trial: &TrialSpec) {
            match trial {
                TrialSpec::Tracking(_) => log::info!("Round {}: follow the path", round + 1),
                TrialSpec::Signal(_) => log::info!("Round {}: wait for the signal", round + 1),
            }
        }

        fn off_track_warning(&mut self, _distance: f32) {
            self.warnings += 1;
        }

        fn persistence_failed(&mut self, error: &PersistError) {
            log::warn!("Result not saved: {}", error);
        }
    }

    fn wall_clock_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn play<S: ScoreSink>(settings: &GameSettings, sink: S) -> Option<SessionSummary> {
        let mut session = Session::seeded(settings, ConsolePresenter { warnings: 0 }, sink);
        let start = wall_clock_ms();
        let end = Autoplayer::new(settings.seed).play(&mut session, start);
        log::info!("Session took {:.1} s of simulated time", (end - start) as f64 / 1000.0);
        session.summary().copied()
    }

    pub fn run(args: Cli) -> Result<(), String> {
        let mut settings = match &args.settings {
            Some(path) => GameSettings::load(path, args.game),
            None => args.game.preset(),
        };
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }
        settings.validate().map_err(|e| e.to_string())?;

        log::info!(
            "Playing {} ({} rounds, seed {})",
            settings.game.as_str(),
            settings.total_rounds,
            settings.seed
        );

        let summary = match args.log {
            Some(path) => play(&settings, JsonLinesSink::new(path)),
            None => play(&settings, MemorySink::new()),
        }
        .ok_or("session did not complete")?;

        let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{}", json);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Trace trainer (native) starting...");

    let cli = <native::Cli as clap::Parser>::parse();
    if let Err(e) = native::run(cli) {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

// The browser build is driven through `trace_trainer::web`
#[cfg(target_arch = "wasm32")]
fn main() {}

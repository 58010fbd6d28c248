//! Co-op Shooter headless driver
//!
//! Plays a full run with a simple autopilot on both ships and prints the
//! run summary. Useful for balance checks and as a reference for hosts
//! wiring the simulation into a real frame loop.
//!
//! Usage: `coop-shooter [TUNING.json] [--items ITEMS.json] [--seed N] [--frames N]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use glam::Vec2;

    use coop_shooter::consts::*;
    use coop_shooter::sim::{
        Clock, Collaborators, GamePhase, GameState, ItemDb, PlayerId, PlayerIntent, TickInput,
        TieredDrops, WaveSpawner, tick,
    };
    use coop_shooter::{HighScores, Tuning};

    /// Five minutes at 60 frames per second
    const DEFAULT_FRAMES: u64 = 60 * 60 * 5;

    struct Args {
        tuning: Option<PathBuf>,
        items: Option<PathBuf>,
        seed: u64,
        frames: u64,
    }

    fn parse_args() -> Result<Args> {
        let mut args = Args {
            tuning: None,
            items: None,
            seed: 0x00c0_ffee,
            frames: DEFAULT_FRAMES,
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = iter.next().context("--seed needs a value")?;
                    args.seed = value.parse().with_context(|| format!("bad seed '{value}'"))?;
                }
                "--frames" => {
                    let value = iter.next().context("--frames needs a value")?;
                    args.frames = value
                        .parse()
                        .with_context(|| format!("bad frame count '{value}'"))?;
                }
                "--items" => {
                    let value = iter.next().context("--items needs a path")?;
                    args.items = Some(PathBuf::from(value));
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                path => args.tuning = Some(PathBuf::from(path)),
            }
        }
        Ok(args)
    }

    fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading tuning from {}", path.display()))?;
        Tuning::from_json(&json).with_context(|| format!("loading tuning from {}", path.display()))
    }

    fn load_items(path: Option<&PathBuf>) -> Result<ItemDb> {
        let Some(path) = path else {
            return Ok(ItemDb::builtin());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading items from {}", path.display()))?;
        ItemDb::from_json(&json).with_context(|| format!("loading items from {}", path.display()))
    }

    /// Chase the closest target horizontally, keep firing, use items as
    /// soon as they are held
    fn autopilot(state: &GameState) -> TickInput {
        let mut input = TickInput::default();
        for character in state.characters.iter().filter(|c| c.is_alive()) {
            let target = state
                .living_enemies()
                .map(|e| e.pos)
                .chain(state.boss.as_ref().map(|b| b.pos))
                .min_by(|a, b| {
                    (a.x - character.pos.x)
                        .abs()
                        .total_cmp(&(b.x - character.pos.x).abs())
                });
            let move_dir = match target {
                Some(pos) if (pos.x - character.pos.x).abs() > 4.0 => {
                    Vec2::new((pos.x - character.pos.x).signum(), 0.0)
                }
                _ => Vec2::ZERO,
            };
            input.players[character.player] = PlayerIntent {
                move_dir,
                fire: true,
                use_item: state.active_item(character.player).is_some(),
                skill: true,
            };
        }
        input
    }

    /// Fixed-step loop state, mirroring a host's frame callback
    struct Driver {
        state: GameState,
        spawner: WaveSpawner,
        drops: TieredDrops,
        accumulator: f32,
        sim_ticks: u64,
    }

    impl Driver {
        fn new(seed: u64, tuning: Tuning, items: ItemDb) -> Self {
            let drop_chance = tuning.drop_chance;
            let mut state = GameState::new(seed, tuning, Clock::manual());
            let spawner = WaveSpawner::new(&mut state);
            let drops = TieredDrops::new(items, drop_chance, seed.wrapping_add(1));
            Self {
                state,
                spawner,
                drops,
                accumulator: 0.0,
                sim_ticks: 0,
            }
        }

        /// Run simulation ticks for one rendered frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.sim_ticks += 1;
                // Keep the manual clock in step with simulated time
                let now = self.sim_ticks * 1000 / 60;
                let clock = self.state.clock();
                clock.advance(now.saturating_sub(clock.now_ms()));

                let input = autopilot(&self.state);
                let mut collab = Collaborators {
                    spawner: &mut self.spawner,
                    drops: &mut self.drops,
                };
                tick(&mut self.state, &input, SIM_DT, &mut collab);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            for event in self.state.drain_events() {
                log::trace!("{event:?}");
            }
        }

        /// True once the run is over
        fn finished(&mut self) -> bool {
            match self.state.phase {
                GamePhase::GameOver => true,
                GamePhase::LevelCleared => {
                    if self.state.run.level >= self.state.tuning.final_level {
                        return true;
                    }
                    self.state.advance_level();
                    false
                }
                GamePhase::Playing | GamePhase::Paused => false,
            }
        }
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        log::info!("Co-op Shooter (headless) starting...");

        let args = parse_args()?;
        let tuning = load_tuning(args.tuning.as_ref())?;
        let items = load_items(args.items.as_ref())?;
        log::info!(
            "Difficulty {}, {:?}, {} item definitions",
            tuning.difficulty.as_str(),
            tuning.mode,
            items.len()
        );

        let mut driver = Driver::new(args.seed, tuning, items);
        let mut frames = 0;
        while frames < args.frames && !driver.finished() {
            driver.update(1.0 / 60.0);
            frames += 1;
        }
        if frames >= args.frames {
            log::warn!("Frame limit reached before the run ended");
        }

        let summary = driver.state.finish_run();
        println!("{}", serde_json::to_string_pretty(&summary)?);

        let mut scores = HighScores::new();
        match scores.record("CPU", &summary) {
            Some(rank) => println!("High score rank: #{rank}"),
            None => println!("No high score"),
        }
        for player in PlayerId::ALL.into_iter().filter(|p| driver.state.run.is_playing(*p)) {
            let tally = summary.players[player];
            println!(
                "P{}: {} points, {} shots, {} kills",
                player.number(),
                tally.score,
                tally.bullets_shot,
                tally.ships_destroyed
            );
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive the library directly; there is no binary entry point
}

//! Cellarena - headless cell arena runner.
//!
//! Usage: `cellarena [config.toml] [ticks]`. Runs until Ctrl+C, or for the
//! given number of ticks.

use anyhow::Context;
use engine::{Config, Simulation};
use futures_util::FutureExt;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const LEADERBOARD_SIZE: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,engine=debug")),
        )
        .init();

    info!("Cellarena v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let max_ticks = args
        .next()
        .map(|arg| arg.parse::<u64>())
        .transpose()
        .context("tick count must be a non-negative integer")?;

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;
    info!("Loaded configuration from {}", config_path);
    info!("  World: {}x{}", config.world.size, config.world.size);
    info!("  Tick interval: {}ms", config.simulation.tick_interval_ms);
    info!("  Bots: {}", config.bots.count);

    let tick_interval_ms = config.simulation.tick_interval_ms.max(1);
    let report_every = config.simulation.log_interval_ticks.max(1);

    let mut sim = Simulation::with_monotonic_clock(config)?;
    sim.populate();

    run(&mut sim, tick_interval_ms, report_every, max_ticks).await;

    let counts = sim.world().counts();
    info!(
        "Stopped after {} ticks: {} players, {} cells, {} food",
        sim.tick_count(),
        counts.players,
        counts.cells,
        counts.food
    );
    log_leaderboard(&sim);
    Ok(())
}

/// Drive the simulation on a fixed interval until Ctrl+C or `max_ticks`.
async fn run(sim: &mut Simulation, tick_interval_ms: u64, report_every: u64, max_ticks: Option<u64>) {
    let period = Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let scheduled = tokio::select! {
            scheduled = ticker.tick() => scheduled,
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutting down");
                break;
            }
        };

        // Drain any backlog so the tick runs against the most recent schedule.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let tick_start = std::time::Instant::now();
        let report = sim.tick();
        let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

        let tick_budget = tick_interval_ms as f64 * 0.9;
        if tick_ms > tick_budget {
            let counts = sim.world().counts();
            warn!(
                "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} cells total",
                report.tick, tick_ms, tick_budget, counts.players, counts.cells
            );
        }

        if report.tick % report_every == 0 {
            log_leaderboard(sim);
        }

        if max_ticks.is_some_and(|max| report.tick >= max) {
            info!("Reached {} ticks", report.tick);
            break;
        }
    }
}

fn log_leaderboard(sim: &Simulation) {
    let board = sim.world().leaderboard(LEADERBOARD_SIZE);
    if board.is_empty() {
        return;
    }
    info!("Leaderboard:");
    for (rank, entry) in board.iter().enumerate() {
        match sim.world().player(entry.id).and_then(|p| p.center()) {
            Some(at) => info!(
                "  {:>2}. {:<16} {:>8.1}  at ({:.0}, {:.0})",
                rank + 1,
                entry.name,
                entry.score,
                at.x,
                at.y
            ),
            None => info!("  {:>2}. {:<16} {:>8.1}", rank + 1, entry.name, entry.score),
        }
    }
}

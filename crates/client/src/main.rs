//! Headless tactical battle runner.
//!
//! Plays a demo battle between two scripted squads against the headless
//! render host, with an optional mirror runtime that replays the same battle
//! from the JSON event stream.
mod logging;
mod scenario;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use combat_runtime::{
    AdvanceAndStrikeProvider, Event, Runtime, RuntimeConfig, RuntimeMode, Topic, encode_event,
};
use scene::HeadlessHost;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Hard stop for the demo loop, in simulated milliseconds.
const MAX_BATTLE_MS: u64 = 30 * 60 * 1000;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut config = RuntimeConfig::from_env();
    if config.session_id == RuntimeConfig::DEFAULT_SESSION_ID {
        config.session_id = logging::default_session_id();
    }
    logging::setup_logging(&config.session_id)?;

    let with_mirror = std::env::var("TACTICS_MIRROR")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    run_battle(config, with_mirror).await
}

async fn run_battle(config: RuntimeConfig, with_mirror: bool) -> Result<()> {
    let frame_ms = config.frame_ms;
    let units = scenario::units(
        config.battle.grid_width,
        config.battle.grid_height,
    );

    let mut builder = Runtime::builder(HeadlessHost::new())
        .config(config.clone())
        .combat_id(scenario::COMBAT_ID)
        .participants(units.clone())
        .player_provider(AdvanceAndStrikeProvider)
        .npc_provider(AdvanceAndStrikeProvider);
    for (key, path) in scenario::ASSETS {
        builder = builder.asset(key, path);
    }
    let mut runtime = builder.build(0).context("failed to build runtime")?;

    let mut mirror = if with_mirror {
        let mut builder = Runtime::builder(HeadlessHost::new())
            .config(config.clone())
            .mode(RuntimeMode::Mirror)
            .combat_id(scenario::COMBAT_ID)
            .participants(units);
        for (key, path) in scenario::ASSETS {
            builder = builder.asset(key, path);
        }
        Some(builder.build(0).context("failed to build mirror runtime")?)
    } else {
        None
    };

    // Relay authoritative events to the mirror as JSON.
    let (wire_tx, mut wire_rx) = mpsc::unbounded_channel::<String>();
    let relay = mirror
        .is_some()
        .then(|| spawn_relay(runtime.subscribe(Topic::Combat), wire_tx));

    runtime.start(0)?;
    info!(session = %runtime.config().session_id, mirror = with_mirror, "battle started");

    let clock = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_millis(frame_ms));
    let mut frames: u64 = 0;
    loop {
        interval.tick().await;
        // Simulated time advances one frame per tick regardless of wall clock drift.
        frames += 1;
        let now = frames * frame_ms;

        let outcome = runtime.step(now).await?;
        if outcome.acted {
            debug!(now, phase = ?outcome.phase, active = ?runtime.active_unit(), "turn taken");
        }

        if let Some(mirror) = mirror.as_mut() {
            while let Ok(raw) = wire_rx.try_recv() {
                if let Err(err) = mirror.receive_remote(&raw) {
                    warn!(error = %err, "mirror dropped a message");
                }
            }
            mirror.flush_remote(now)?;
            mirror.step(now).await?;
        }

        let mirror_done = mirror.as_ref().is_none_or(|mirror| mirror.is_finished());
        if runtime.is_finished() && mirror_done {
            break;
        }
        if now >= MAX_BATTLE_MS {
            warn!(now, "battle exceeded the demo time limit");
            break;
        }
    }

    info!(
        frames,
        wall_ms = clock.elapsed().as_millis() as u64,
        winner = ?runtime.winner(),
        turn = runtime.engine().state().current_turn,
        "battle finished"
    );
    if let Err(err) = runtime.save_snapshot(None, frames * frame_ms) {
        warn!(error = %err, "failed to save final snapshot");
    }

    if let Some(mirror) = mirror {
        if mirror.winner() != runtime.winner() {
            warn!(
                authority = ?runtime.winner(),
                mirror = ?mirror.winner(),
                "mirror disagrees on the winner"
            );
        }
        let stats = mirror.shutdown();
        info!(units = stats.units, events = stats.events_handled, "mirror shut down");
    }
    let stats = runtime.shutdown();
    info!(
        units = stats.units,
        events = stats.events_handled,
        pools = stats.pool.pools,
        "runtime shut down"
    );
    if let Some(relay) = relay {
        relay.abort();
    }
    Ok(())
}

fn spawn_relay(
    mut combat: broadcast::Receiver<Event>,
    wire: mpsc::UnboundedSender<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match combat.recv().await {
                Ok(Event::Combat(event)) => match encode_event(&event) {
                    Ok(raw) => {
                        if wire.send(raw).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to encode combat event"),
                },
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "relay lagged behind the combat topic");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

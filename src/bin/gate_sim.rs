//! Desktop gate simulator.
//!
//! Runs the real door controller, dispatcher and motor loop against a
//! simulated STEP/DIR output and two simulated readers driven from stdin,
//! and serves the web UI:
//!
//! - Web UI: http://localhost:8080
//! - API:    http://localhost:8080/api/barn
//!
//! # Commands
//!
//! ```text
//! in <name|uid>    tap a tag on the entry reader
//! out <name|uid>   tap a tag on the exit reader
//! hold <in|out> <name|uid>   leave a tag on a reader
//! lift <in|out>    take it off again
//! open | close     manual door commands
//! status           print the barn
//! quit             stop
//! ```
//!
//! Tags are named from the herd (`in Bron`) or given as a UID
//! (`in DE:AD:BE:EF`) to try an unknown tag.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=barn_gate=debug cargo run --bin gate_sim
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use barn_gate::hal::SystemClock;
use barn_gate::services::{run_server_with_state, SharedGate, WebServerConfig};
use barn_gate::{
    spawn_motor_task, AccessDispatcher, Config, DoorController, MotorLoop, RampedStepper,
    StepDirection, StepOutput, TagId, TagReader, TagRegistry, WebConfig,
};

/// How long a tapped tag stays in the field.
const TAP_MS: u64 = 400;

// ============================================================================
// Simulated Hardware
// ============================================================================

/// STEP/DIR output that only counts pulses.
#[derive(Default)]
struct SimOutput {
    pulses: u64,
}

impl StepOutput for SimOutput {
    type Error = Infallible;

    fn step(&mut self, _direction: StepDirection) -> Result<(), Infallible> {
        self.pulses += 1;
        Ok(())
    }

    fn set_enabled(&mut self, _enabled: bool) -> Result<(), Infallible> {
        Ok(())
    }
}

type SimStepper = RampedStepper<SimOutput, SystemClock>;

/// Reader whose field is a slot shared with the stdin task.
#[derive(Clone, Default)]
struct SimReader {
    field: Arc<Mutex<Option<TagId>>>,
}

impl SimReader {
    fn place(&self, id: TagId) {
        *self.field.lock() = Some(id);
    }

    fn lift(&self) {
        *self.field.lock() = None;
    }
}

impl TagReader for SimReader {
    type Error = Infallible;

    fn read_tag(&mut self) -> Result<Option<TagId>, Infallible> {
        Ok(*self.field.lock())
    }

    fn acknowledge(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

// ============================================================================
// Commands
// ============================================================================

enum Command {
    Tap(SimReader, TagId),
    Hold(SimReader, TagId),
    Lift(SimReader),
    Open,
    Close,
    Status,
    Quit,
}

struct Readers {
    registry: TagRegistry,
    entry: SimReader,
    exit: SimReader,
}

impl Readers {
    fn side(&self, word: &str) -> anyhow::Result<SimReader> {
        match word {
            "in" => Ok(self.entry.clone()),
            "out" => Ok(self.exit.clone()),
            other => bail!("unknown reader '{other}', use in or out"),
        }
    }

    fn tag(&self, word: &str) -> anyhow::Result<TagId> {
        self.registry
            .records()
            .find(|record| record.name.eq_ignore_ascii_case(word))
            .map(|record| record.id)
            .or_else(|| TagId::from_hex(word))
            .ok_or_else(|| anyhow!("'{word}' is neither a herd name nor a 4-byte UID"))
    }

    fn parse(&self, line: &str) -> anyhow::Result<Option<Command>> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Ok(None),
            [side @ ("in" | "out"), tag] => Command::Tap(self.side(side)?, self.tag(tag)?),
            ["hold", side, tag] => Command::Hold(self.side(side)?, self.tag(tag)?),
            ["lift", side] => Command::Lift(self.side(side)?),
            ["open"] => Command::Open,
            ["close"] => Command::Close,
            ["status"] => Command::Status,
            ["quit" | "exit"] => Command::Quit,
            _ => bail!("unrecognized command: {line}"),
        };
        Ok(Some(command))
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::var("GATE_PORT") {
        Ok(port) => port.parse().context("GATE_PORT must be a port number")?,
        Err(_) => WebConfig::default().port,
    };
    let config = Config::default().with_web(WebConfig::default().with_port(port));

    let stepper: SimStepper = RampedStepper::new(SimOutput::default(), SystemClock::new());
    let door = DoorController::new(stepper, config.door)
        .map_err(|e| anyhow!("door init failed: {e:?}"))?;
    let gate = Arc::new(SharedGate::new(door));

    let readers = Readers {
        registry: TagRegistry::herd(),
        entry: SimReader::default(),
        exit: SimReader::default(),
    };
    let dispatcher =
        AccessDispatcher::new(readers.registry, readers.entry.clone(), readers.exit.clone());

    let motor = spawn_motor_task(MotorLoop::new(
        Arc::clone(&gate),
        dispatcher,
        config.scheduler,
    ))
    .context("failed to spawn motor thread")?;

    let web_config = WebServerConfig::from_config(&config.web);
    info!(url = %format!("http://{}", web_config.addr), "web UI");
    let web_gate = Arc::clone(&gate);
    tokio::spawn(async move {
        if let Err(e) = run_server_with_state(web_gate, web_config).await {
            warn!(error = %e, "web server stopped");
        }
    });

    info!("commands: in/out <name>, hold/lift, open, close, status, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match readers.parse(line.trim()) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        match command {
            Command::Tap(reader, id) => {
                reader.place(id);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(TAP_MS)).await;
                    reader.lift();
                });
            }
            Command::Hold(reader, id) => reader.place(id),
            Command::Lift(reader) => reader.lift(),
            Command::Open => {
                let outcome = gate.request_open(true);
                info!(?outcome, "manual open");
            }
            Command::Close => {
                let outcome = gate.request_close();
                info!(?outcome, "manual close");
            }
            Command::Status => {
                let status = gate.status();
                let door = gate.door_status();
                info!(
                    count = status.count,
                    goats = ?status.goats,
                    door = %status.door_status,
                    position = door.position,
                    moves = door.stats.moves,
                    failures = door.stats.failures,
                    "barn"
                );
            }
            Command::Quit => break,
        }
    }

    let stats = motor
        .shutdown()
        .map_err(|_| anyhow!("motor thread panicked"))?;
    info!(
        ticks = stats.ticks,
        events = stats.events,
        overruns = stats.overruns,
        max_gap_us = stats.max_gap_us,
        "stopped"
    );
    Ok(())
}

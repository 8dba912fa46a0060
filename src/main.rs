//! Headless TetrECS runner (default binary).
//!
//! Reads one command per line on stdin and drives a session:
//!
//! ```text
//! click <col> <row> | rotate | rotate-left | swap | status | opponents | quit
//! ```
//!
//! Flags: `--connect host:port` (or `TETRECS_SERVER_HOST`/`TETRECS_SERVER_PORT`
//! with `--multiplayer`), `--config path.json`, `--seed n`, `--legacy`, `-v`.
//! Logs go to stderr; command output goes to stdout.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn, Level};
use tracing_subscriber::prelude::*;

use tetrecs::engine::{
    spawn_session, ChannelListener, Game, GameConfig, GameSnapshot, LocalPieces, NoTelemetry,
    PlacementOutcome, SessionEvent, SessionHandle, TracingListener,
};
use tetrecs::net::{multiplayer_game, ConnectConfig, MessageChannel, MultiplayerSession, TcpChannel};
use tetrecs::types::{GameAction, GameEvent};

#[derive(Debug, Default)]
struct Args {
    connect: Option<ConnectConfig>,
    multiplayer: bool,
    config: Option<String>,
    seed: Option<u32>,
    legacy: bool,
    verbose: u8,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args::default();
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--connect" => {
                    let addr = it.next().context("--connect needs host:port")?;
                    let config = ConnectConfig::parse(&addr)
                        .with_context(|| format!("invalid address {:?}", addr))?;
                    args.connect = Some(config);
                }
                "--multiplayer" => args.multiplayer = true,
                "--config" => args.config = Some(it.next().context("--config needs a path")?),
                "--seed" => {
                    let seed = it.next().context("--seed needs a number")?;
                    args.seed = Some(seed.parse().context("--seed needs a number")?);
                }
                "--legacy" => args.legacy = true,
                "-v" | "--verbose" => args.verbose = args.verbose.saturating_add(1),
                "-vv" => args.verbose = args.verbose.saturating_add(2),
                other => bail!("unknown argument {:?}", other),
            }
        }
        Ok(args)
    }
}

fn init_logging(verbose: u8) {
    let level = std::env::var("TETRECS_LOG")
        .ok()
        .and_then(|s| Level::from_str(s.trim()).ok())
        .unwrap_or(match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let path = args.config.clone().or_else(|| {
        std::env::var("TETRECS_CONFIG")
            .ok()
            .filter(|s| !s.trim().is_empty())
    });
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            serde_json::from_str::<GameConfig>(&text)
                .with_context(|| format!("parsing config {}", path))?
        }
        None if args.legacy => GameConfig::legacy(),
        None => GameConfig::from_env(),
    };
    Ok(config.sanitized())
}

enum Mode {
    Local(JoinHandle<GameSnapshot>),
    Remote(MultiplayerSession),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;
    init_logging(args.verbose);
    let config = load_config(&args)?;

    let (listener, mut events) = ChannelListener::channel();

    let connect = args
        .connect
        .clone()
        .or_else(|| args.multiplayer.then(ConnectConfig::from_env));

    let (handle, mut mode) = match connect {
        Some(target) => {
            info!(server = %target.address(), "starting multiplayer");
            let channel: Arc<dyn MessageChannel> = Arc::new(TcpChannel::connect(&target).await?);
            let mut game = multiplayer_game(config, channel.clone());
            game.subscribe(TracingListener);
            game.subscribe(listener);
            let mp = MultiplayerSession::start(game, channel);
            (mp.session().clone(), Mode::Remote(mp))
        }
        None => {
            let mut game = match args.seed {
                Some(seed) => Game::single_player(config, seed),
                None => Game::new(config, LocalPieces::from_entropy(), NoTelemetry),
            };
            game.subscribe(TracingListener);
            game.subscribe(listener);
            let (handle, task) = spawn_session(game);
            (handle, Mode::Local(task))
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !run_command(line.trim(), &handle, &mut mode).await? {
                    break;
                }
            }
            Some(event) = events.recv() => {
                if let SessionEvent::Game(GameEvent::GameOver { score }) = event {
                    println!("game over, score {}", score);
                }
            }
        }
    }

    let last = match mode {
        Mode::Local(task) => {
            let _ = handle.shutdown();
            task.await?
        }
        Mode::Remote(mp) => mp.shutdown().await?,
    };
    println!("{}", serde_json::to_string(&last)?);
    Ok(())
}

/// Returns false when the session should end
async fn run_command(line: &str, handle: &SessionHandle, mode: &mut Mode) -> Result<bool> {
    match line {
        "" => {}
        "quit" | "exit" => return Ok(false),
        "status" => {
            let snap = handle.snapshot().await?;
            println!("{}", serde_json::to_string(&snap)?);
        }
        "opponents" => match mode {
            Mode::Remote(mp) => {
                let table = mp.opponents();
                let table = table.read().await;
                for (name, score) in table.leaderboard() {
                    let dead = if table.is_dead(&name) { " (dead)" } else { "" };
                    println!("{} {}{}", name, score, dead);
                }
                while let Some(update) = mp.try_update() {
                    tracing::debug!(?update, "peer update");
                }
            }
            Mode::Local(_) => println!("single player"),
        },
        other => match GameAction::parse(other) {
            Some(GameAction::Click { col, row }) => match handle.place(col, row).await? {
                PlacementOutcome::Placed { cleared: Some(c) } => {
                    println!("placed, cleared {} lines (+{})", c.lines, c.score_delta)
                }
                PlacementOutcome::Placed { cleared: None } => println!("placed"),
                PlacementOutcome::Rejected => println!("rejected"),
                PlacementOutcome::Starved => println!("waiting for pieces"),
                PlacementOutcome::Inactive => println!("not running"),
            },
            Some(action) => handle.action(action)?,
            None => {
                warn!(command = other, "unknown command");
                println!("unknown command {:?}", other);
            }
        },
    }
    Ok(true)
}

//! Chat Bridge console host
//!
//! Runs every bridge against a terminal instead of a game server:
//!
//! 1. **Output**: messages arriving from Telegram, Discord and live
//!    notifications are printed to stdout.
//!
//! 2. **Input**: each stdin line is sent out as global chat from a console
//!    player. Lines starting with `/` are treated as commands; `/reload`
//!    re-reads the settings file and rebuilds every bridge.
//!
//! 3. **Status**: with `--status-port`, `/health` and `/stats` are served
//!    over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use chat_bridge::error::Result;
use chat_bridge::{
    host, status, BridgeContext, BridgeSet, Capabilities, OnlinePlayers, OutboundMessage, PlayerRef,
    PlayerSurface, Scope, Settings, SkinRecord,
};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "chat-bridge", version, about = "Game chat bridge for Telegram, Discord and stream alerts")]
struct Args {
    /// JSON settings file. Without one every bridge uses its defaults.
    #[arg(short, long, env = "CHAT_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Serve /health and /stats on this port
    #[arg(long, env = "CHAT_BRIDGE_STATUS_PORT")]
    status_port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long, env = "CHAT_BRIDGE_LOG_JSON")]
    log_json: bool,

    /// Name shown for chat typed on stdin
    #[arg(long, default_value = "Console", env = "CHAT_BRIDGE_PLAYER")]
    player_name: String,
}

// ── Console Surface ───────────────────────────────────────────────────────────

/// Prints presented text; skins only get logged.
struct ConsoleSurface;

impl PlayerSurface for ConsoleSurface {
    fn present(&mut self, text: &str) {
        println!("{}", text);
    }

    fn set_textures(&mut self, player: &PlayerRef, record: &SkinRecord) -> Result<()> {
        tracing::info!(
            player = player.name.as_str(),
            texture = record.texture_url().as_deref().unwrap_or("-"),
            "[Console] Skin applied"
        );
        Ok(())
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply_env();
    Ok(settings)
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chat_bridge=info,tower_http=info".into());
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let settings = match load_settings(args.config.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load settings");
            std::process::exit(2);
        }
    };

    let caps = Capabilities::detect(None, None);
    let (handle, mut stage) = host::channel(&caps);
    let ctx = BridgeContext::new(handle);

    let online = OnlinePlayers::new();
    let console = PlayerRef::new(uuid::Uuid::new_v4(), args.player_name.clone(), "console");
    online.join(console.clone());

    let mut bridges = BridgeSet::start(settings, ctx, caps, Arc::new(online.clone()));
    bridges.on_player_join(console.clone());

    let (stats_tx, stats_rx) = watch::channel(bridges.stats());
    if let Some(port) = args.status_port {
        tokio::spawn(async move {
            if let Err(e) = status::serve(port, stats_rx).await {
                tracing::error!(port, error = %e, "[Status] Server stopped");
            }
        });
    }

    let mut surface = ConsoleSurface;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stats_tick = tokio::time::interval(Duration::from_secs(1));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("Chat bridge running, type to chat, Ctrl-C to quit");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Some(action) = stage.recv() => stage.apply(action, &mut surface),
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "/reload" {
                        match load_settings(args.config.as_ref()) {
                            Ok(settings) => bridges = bridges.reconfigure(settings),
                            Err(e) => tracing::warn!(error = %e, "Reload failed, keeping current settings"),
                        }
                    } else if line.starts_with('/') {
                        bridges.on_player_command(console.clone(), line);
                    } else {
                        bridges.send_from_game(&OutboundMessage::new(console.clone(), line, Scope::Global));
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "Stdin closed");
                    stdin_open = false;
                }
            },
            _ = stats_tick.tick() => {
                stats_tx.send_replace(bridges.stats());
            }
        }
    }

    online.quit(&console.id);
    bridges.on_player_quit(&console.id);
    bridges.stop();
}

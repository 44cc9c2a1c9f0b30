use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use linkmeet::client::{
    ClientConfig, DEFAULT_SERVER_URL, EndReason, HeadlessDevices, MediaConstraints,
    SessionUpdate, UserCommand, launch,
};
use linkmeet::model::IceServerConfig;
use linkmeet::server::{RelayConfig, parse_addr, serve};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linkmeet", version, about = "Two-party rooms over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    ///
    /// Defaults come from `LINKMEET_ADDR` and `TURN_*`; flags override them.
    Serve {
        /// Bind address [default: 0.0.0.0:3000]
        #[arg(long)]
        addr: Option<String>,

        #[arg(long)]
        turn_url: Option<String>,

        #[arg(long)]
        turn_username: Option<String>,

        #[arg(long)]
        turn_credential: Option<String>,
    },
    /// Join a room as a headless participant.
    Join {
        #[arg(long, env = "LINKMEET_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        room: Option<String>,

        /// Call the other participant as soon as they show up.
        #[arg(long)]
        call: bool,

        #[arg(long)]
        no_video: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            addr,
            turn_url,
            turn_username,
            turn_credential,
        } => {
            let mut config = RelayConfig::from_env()?;
            if let Some(addr) = addr {
                config.bind_addr = parse_addr(&addr)?;
            }
            if let Some(url) = turn_url {
                config.ice_servers.push(IceServerConfig {
                    urls: vec![url],
                    username: turn_username,
                    credential: turn_credential,
                });
            }

            println!("{}", "📡 Starting LinkMeet relay...".green().bold());
            serve(config).await.context("Relay stopped")?;
        }
        Commands::Join {
            server,
            email,
            room,
            call,
            no_video,
        } => {
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new()
                    .with_prompt("Email")
                    .interact_text()?,
            };
            let room = match room {
                Some(room) => room,
                None => Input::<String>::new()
                    .with_prompt("Room")
                    .interact_text()?,
            };

            let mut config = ClientConfig::new(email.clone(), room).with_server_url(server);
            config.constraints = MediaConstraints {
                audio: true,
                video: !no_video,
            };

            join(config, &email, call).await?;
        }
    }

    Ok(())
}

async fn join(config: ClientConfig, label: &str, call: bool) -> Result<()> {
    let devices = Arc::new(HeadlessDevices::new(label));
    let mut handle = launch(config, devices)
        .await
        .context("Failed to start session")?;

    println!("{} {}", "🔌 Connected as".cyan(), handle.id);

    loop {
        tokio::select! {
            update = handle.updates.recv() => {
                let Some(update) = update else { break };
                if let Some(cmd) = report(&update, call) {
                    handle.commands.send(cmd).await.context("Session stopped")?;
                }
                if matches!(update, SessionUpdate::Ended(_)) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving");
                handle.commands.send(UserCommand::Leave).await.context("Session stopped")?;
            }
        }
    }

    let reason = handle.task.await.context("Session task panicked")?;
    println!("{} {:?}", "👋 Session ended:".yellow(), reason);
    Ok(())
}

/// Prints an update and returns the command it calls for, if any.
fn report(update: &SessionUpdate, call: bool) -> Option<UserCommand> {
    match update {
        SessionUpdate::Welcome { id } => {
            println!("{} {}", "🔌 Identified as".cyan(), id);
            None
        }
        SessionUpdate::RoomJoined { room } => {
            println!("{} {}", "🚪 Joined room".green(), room);
            println!("{}", "   Waiting for someone to join...".dimmed());
            None
        }
        SessionUpdate::RoomFull { room } => {
            println!("{} {}", "⛔ Room is full:".red().bold(), room);
            Some(UserCommand::Leave)
        }
        SessionUpdate::PeerJoined { email, .. } => {
            println!("{} {}", "👤 Connected:".green(), email);
            call.then_some(UserCommand::StartCall)
        }
        SessionUpdate::LocalMediaReady { tracks } => {
            println!("{} {} track(s)", "🎙  Local media ready:".cyan(), tracks.len());
            None
        }
        SessionUpdate::MediaUnavailable { reason } => {
            println!("{} {}", "⚠️  Media unavailable:".red(), reason);
            None
        }
        SessionUpdate::CallEstablished { peer, initiated } => {
            println!("{} {}", "📞 In call with".green().bold(), peer);
            // The caller attaches its tracks on its own.
            (!initiated).then_some(UserCommand::SendStreams)
        }
        SessionUpdate::RemoteTrack(track) => {
            println!("{} {:?} ({})", "🎬 Remote track:".cyan(), track.kind, track.track_id);
            None
        }
        SessionUpdate::LocalAudio(on) => {
            println!("🎤 Microphone {}", if *on { "on" } else { "off" });
            None
        }
        SessionUpdate::LocalVideo(on) => {
            println!("📷 Camera {}", if *on { "on" } else { "off" });
            None
        }
        SessionUpdate::RemoteVideo(on) => {
            println!("📺 Peer camera {}", if *on { "on" } else { "off" });
            None
        }
        SessionUpdate::Ended(reason) => {
            let text = match reason {
                EndReason::LocalLeave => "left the room",
                EndReason::PeerLeft => "peer left",
                EndReason::TransportClosed => "relay connection lost",
                EndReason::ConnectionLost => "media connection lost",
            };
            println!("{} {}", "🔚".yellow(), text);
            None
        }
    }
}

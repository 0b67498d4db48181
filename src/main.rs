//! CLI for lotorelay
//!
//! Subcommands:
//! - `server`: run the WebSocket relay and the login API
//! - `client`: connect as a player and print what the relay sends (smoke test)

use clap::Parser;
use lotorelay::api::start_api_server;
use lotorelay::config::load_config;
use lotorelay::relay::Relay;
use lotorelay::transport::start_websocket_server;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "lotorelay")]
enum Command {
    /// Start the WebSocket relay and the login API
    Server,
    /// Connect to a relay, ping it and optionally pick a number
    Client {
        /// WebSocket relay URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:9001")]
        url: String,
        /// Sent as `clientName`; the admin token connects as admin
        #[arg(long)]
        name: Option<String>,
        /// Number to send in a `pick_number` event
        #[arg(long)]
        pick: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    match cmd {
        Command::Server => {
            if let Err(e) = run_server().await {
                // no-op when run_server already initialized logging
                lotorelay::utils::logging::init("info");
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url, name, pick } => {
            lotorelay::utils::logging::init("info");
            if let Err(e) = run_client(&url, name.as_deref(), pick).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    lotorelay::utils::logging::init(&config.logging.level);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let relay = Relay::new(config.relay.admin_token.clone()).shared();

    tokio::select! {
        res = start_websocket_server(addr, relay, config.relay.clone()) => {
            error!("WebSocket relay exited unexpectedly: {:?}", res);
        }
        res = start_api_server(&config.api, &config.relay.admin_token) => {
            error!("Login API exited unexpectedly: {:?}", res);
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run_client(
    url: &str,
    name: Option<&str>,
    pick: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use std::time::Duration;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let mut url = url::Url::parse(url)?;
    if let Some(name) = name {
        url.query_pairs_mut().append_pair("clientName", name);
    }

    let (mut ws_stream, _response) = connect_async(url.as_str()).await?;

    // 1. Welcome
    if let Some(Ok(WsMessage::Text(msg))) = ws_stream.next().await {
        println!("Welcome: {msg}");
    }

    // 2. Ping
    let ping = json!({ "type": "ping" });
    ws_stream
        .send(WsMessage::Text(ping.to_string().into()))
        .await?;

    // 3. Pick a number
    if let Some(number) = pick {
        let pick = json!({ "type": "pick_number", "data": { "number": number } });
        ws_stream
            .send(WsMessage::Text(pick.to_string().into()))
            .await?;
    }

    // Print whatever arrives until the relay goes quiet
    while let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(2), ws_stream.next()).await {
        if let WsMessage::Text(text) = msg {
            println!("Incoming: {text}");
        }
    }

    ws_stream.close(None).await?;
    Ok(())
}

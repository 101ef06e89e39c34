//! Relay server wired from environment variables
//!
//! Run with: cargo run --example relay_server
//!
//! Configuration (environment):
//!   SECRET_KEY           shared secret the producer must present (required)
//!   STREAM_PORT          ingest port (default 8081)
//!   WEBSOCKET_PORT       viewer port (default 8082)
//!   CAMERA_VIDEO_WIDTH   stream width for the viewer header (default 1920)
//!   CAMERA_VIDEO_HEIGHT  stream height for the viewer header (default 1080)
//!   RECORD_STREAM        "true" to record each session (default off)
//!   RECORDINGS_DIR       where recordings go (default "recordings")
//!
//! Push a stream into it with ffmpeg (MPEG-TS, as jsmpeg players expect):
//!   ffmpeg -rtsp_transport tcp -i rtsp://camera/stream \
//!     -f mpegts -codec:v mpeg1video -s 1920x1080 -r 30 \
//!     http://localhost:8081/<SECRET_KEY>/
//!
//! Then point any WebSocket client at ws://localhost:8082/

use std::net::SocketAddr;

use relay_rs::{RelayConfig, RelayServer};

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay_rs=info".parse()?)
                .add_directive("relay_server=info".parse()?),
        )
        .init();

    let secret = match std::env::var("SECRET_KEY") {
        Ok(s) if !s.is_empty() => s,
        _ => {
            eprintln!("SECRET_KEY must be set");
            std::process::exit(1);
        }
    };

    let stream_port: u16 = env_or("STREAM_PORT", 8081);
    let ws_port: u16 = env_or("WEBSOCKET_PORT", 8082);
    let width: u16 = env_or("CAMERA_VIDEO_WIDTH", 1920);
    let height: u16 = env_or("CAMERA_VIDEO_HEIGHT", 1080);
    let record = std::env::var("RECORD_STREAM").as_deref() == Ok("true");
    let recordings_dir =
        std::env::var("RECORDINGS_DIR").unwrap_or_else(|_| "recordings".into());

    let mut config = RelayConfig::with_secret(&secret)
        .stream_addr(SocketAddr::from(([0, 0, 0, 0], stream_port)))
        .ws_addr(SocketAddr::from(([0, 0, 0, 0], ws_port)))
        .dimensions(width, height);
    if record {
        config = config.record_to(recordings_dir);
    }

    let server = RelayServer::new(config)?;
    let handle = server.start().await?;

    println!(
        "Listening for incoming MPEG-TS stream on http://localhost:{}/{}",
        handle.stream_addr.port(),
        secret
    );
    println!(
        "Awaiting WebSocket connections on ws://localhost:{}/",
        handle.ws_addr.port()
    );
    println!();
    println!("Press Ctrl+C to stop the server...");

    tokio::select! {
        result = handle.wait() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}

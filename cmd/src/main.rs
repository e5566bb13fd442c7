use anyhow::{Context, Result};
use authdns::arena::Arena;
use authdns::auth::{AuthKey, MessageAuthenticator};
use authdns::config::Config;
use authdns::zonefile::load_zone;
use authdns::{answer_query, Namedb};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Authoritative-only DNS nameserver.
#[derive(Parser, Debug)]
#[command(name = "authdnsd", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "authdnsd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config).with_context(|| format!("loading config from {:?}", args.config))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db = Arc::new(Mutex::new(load_zones(&config)?));
    let authenticator = Arc::new(load_authenticator(&config)?);

    let mut sockets = Vec::new();
    for addr in &config.listen {
        let socket = UdpSocket::bind(addr).await.with_context(|| format!("binding {addr}"))?;
        info!(%addr, "listening");
        sockets.push(Arc::new(socket));
    }

    let mut tasks = Vec::new();
    for socket in sockets {
        let db = Arc::clone(&db);
        let authenticator = Arc::clone(&authenticator);
        let max_udp_payload = config.max_udp_payload;
        let chase_depth = config.chase_depth;
        tasks.push(tokio::spawn(async move {
            serve_udp(socket, db, max_udp_payload, authenticator, chase_depth).await;
        }));
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    for t in tasks {
        t.abort();
    }
    Ok(())
}

fn load_zones(config: &Config) -> Result<Namedb> {
    let mut db = Namedb::new();
    for zone in &config.zones {
        load_zone(&mut db, &zone.origin, &zone.file)
            .with_context(|| format!("loading zone {} from {:?}", zone.origin, zone.file))?;
        info!(origin = %zone.origin, file = ?zone.file, "zone loaded");
    }
    Ok(db)
}

fn load_authenticator(config: &Config) -> Result<MessageAuthenticator> {
    let mut keys = Vec::new();
    for key in &config.keys {
        let secret = key
            .secret_bytes()
            .with_context(|| format!("decoding secret for key {}", key.name))?;
        keys.push(AuthKey::new(key.name.clone(), secret));
    }
    Ok(MessageAuthenticator::new(keys))
}

async fn serve_udp(
    socket: Arc<UdpSocket>,
    db: Arc<Mutex<Namedb>>,
    max_udp_payload: usize,
    authenticator: Arc<MessageAuthenticator>,
    chase_depth: usize,
) {
    let mut request = vec![0u8; 65535];
    loop {
        let (len, peer) = match socket.recv_from(&mut request).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "recv_from failed");
                continue;
            }
        };

        // One arena per query: the response buffer is scratch space
        // that's thrown away as soon as the datagram is sent.
        let mut arena = Arena::new(max_udp_payload.max(512));
        let response = arena.alloc(max_udp_payload.max(512));
        let written = {
            let mut db = db.lock().expect("namedb mutex poisoned");
            answer_query(&mut db, &request[..len], response, max_udp_payload, &authenticator, chase_depth)
        };

        if let Err(e) = socket.send_to(&response[..written], peer).await {
            error!(error = %e, %peer, "send_to failed");
        }
    }
}

use shipsim::bus::{BusTx, Envelope};
use shipsim::config::SimulationConfig;
use shipsim::node::ShipNode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

const TCP_PORT: u16 = 8080;
const OUTBOUND_BROADCAST_BUFFER_SIZE: usize = 256;
const DEFAULT_SHIP_ID: &str = "1";

/// Stand-in transport front end: newline-delimited JSON envelopes over TCP.
/// Inbound lines are dispatched into the node; everything the node publishes
/// is fanned out to every connected client. The real deployment swaps this
/// for the external broker client.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let ship_id = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SHIP_ID.to_string());

    println!("Container Ship Stability Simulator");
    println!("==================================");

    let (bus, mut outbound_rx) = BusTx::channel();
    let node = ShipNode::new(&ship_id, SimulationConfig::default(), bus)?;
    let node = Arc::new(Mutex::new(node));
    {
        let mut node_guard = node.lock().await;
        node_guard.publish_startup();
        info!(ship_id = %node_guard.ship_id(), "subscribing topics: {:?}", node_guard.topics().inbound());
    }

    // Fan everything the node publishes out to the connected clients.
    let (outbound_tx, _) = broadcast::channel::<String>(OUTBOUND_BROADCAST_BUFFER_SIZE);
    let fanout_tx = outbound_tx.clone();
    let fanout = tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(line) => {
                    info!(topic = %envelope.topic, "OUT {line}");
                    // No subscribers is fine; messages are simply dropped.
                    let _ = fanout_tx.send(line);
                }
                Err(e) => error!("failed to serialize outbound envelope: {e}"),
            }
        }
    });

    let server_node = Arc::clone(&node);
    let server_outbound = outbound_tx.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = run_tcp_server(server_node, server_outbound).await {
            error!("TCP server error: {e}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    server.abort();
    fanout.abort();
    println!("Simulator stopped");

    Ok(())
}

async fn run_tcp_server(
    node: Arc<Mutex<ShipNode>>,
    outbound_tx: broadcast::Sender<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("127.0.0.1:{TCP_PORT}")).await?;
    info!("TCP server listening on port {TCP_PORT}");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("new client connected: {addr}");
                let client_node = Arc::clone(&node);
                let client_outbound = outbound_tx.subscribe();

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_node, client_outbound).await {
                        warn!("client {addr} error: {e}");
                    }
                    info!("client {addr} disconnected");
                });
            }
            Err(e) => {
                error!("failed to accept connection: {e}");
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    node: Arc<Mutex<ShipNode>>,
    mut outbound_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    // Stream the node's publications to this client.
    let writer_task = tokio::spawn(async move {
        while let Ok(line) = outbound_rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Envelope>(trimmed) {
                    Ok(envelope) => {
                        info!(topic = %envelope.topic, "IN {trimmed}");
                        // The full handler runs under the node lock, so no
                        // two mutations can ever interleave.
                        let mut node_guard = node.lock().await;
                        node_guard.handle_envelope(&envelope);
                    }
                    Err(e) => {
                        warn!("discarding undecodable line: {e}");
                    }
                }
            }
            Err(e) => {
                warn!("error reading from client: {e}");
                break;
            }
        }
    }

    writer_task.abort();
    Ok(())
}

//! TCP server for the room protocol
//!
//! Accepts connections, frames them as JSON lines and bridges them to the
//! coordinator through channels. Each connection gets a reader loop and a
//! writer task; the outbound dispatcher routes coordinator output to the
//! writer of each recipient.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::coordinator::Coordinator;
use crate::protocol::{parse_client_message, write_line, PlayerId, ServerMessage};
use crate::runtime::{InboundCommand, OutboundMessage};

type ClientMap = Arc<RwLock<HashMap<PlayerId, mpsc::UnboundedSender<ServerMessage>>>>;

/// Bind, spawn the coordinator and serve until the listener fails
pub async fn serve(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let (command_tx, command_rx) = mpsc::channel::<InboundCommand>(config.max_pending_commands.max(1));
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

    let coordinator = Coordinator::new(&config, out_tx);
    tokio::spawn(coordinator.run(command_rx, config.reap_interval));

    run_server(config, command_tx, out_rx, ready_tx).await
}

/// Start the TCP transport.
///
/// Client lines are forwarded to `command_tx`; everything read from `out_rx`
/// is delivered to the addressed connections.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    info!(%bound, "server listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let clients: ClientMap = Arc::new(RwLock::new(HashMap::new()));
    let mut client_id_counter: PlayerId = 0;

    // Outbound dispatcher.
    {
        let clients = Arc::clone(&clients);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let clients = clients.read().await;
                match msg {
                    OutboundMessage::ToClient { client_id, message } => {
                        if let Some(tx) = clients.get(&client_id) {
                            let _ = tx.send(message);
                        }
                    }
                    OutboundMessage::ToClients {
                        client_ids,
                        message,
                    } => {
                        for id in client_ids {
                            if let Some(tx) = clients.get(&id) {
                                let _ = tx.send(message.clone());
                            }
                        }
                    }
                }
            }
        });
    }

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!(client_id, %addr, "client connected");

        let clients = Arc::clone(&clients);
        let command_tx = command_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, &clients, &command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            clients.write().await.remove(&client_id);
            let _ = command_tx.send(InboundCommand::disconnected(client_id)).await;
            info!(client_id, "client disconnected");
        });
    }
}

/// Handle a single client connection until it closes
async fn handle_client(
    socket: TcpStream,
    client_id: PlayerId,
    clients: &ClientMap,
    command_tx: &mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    clients.write().await.insert(client_id, tx.clone());

    let write_task = tokio::spawn(async move {
        let mut buf = Vec::with_capacity(512);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if let Err(e) = write_line(&mut buf, &msg) {
                warn!(client_id, error = %e, "failed to encode message");
                continue;
            }
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(ServerMessage::Welcome {
        player_id: client_id,
    });

    let mut line = Vec::with_capacity(512);
    let result = loop {
        line.clear();
        let bytes_read = match reader.read_until(b'\n', &mut line).await {
            Ok(n) => n,
            Err(e) => {
                debug!(client_id, error = %e, "read failed");
                break Ok(());
            }
        };
        if bytes_read == 0 {
            break Ok(());
        }

        let text = match std::str::from_utf8(&line) {
            Ok(text) => text,
            Err(e) => {
                debug!(client_id, error = %e, "non-UTF-8 line");
                let _ = tx.send(ServerMessage::error(format!("JSON parse error: {e}")));
                continue;
            }
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_client_message(trimmed) {
            Ok(msg) => {
                debug!(client_id, ?msg, "received");
                if command_tx
                    .send(InboundCommand::message(client_id, msg))
                    .await
                    .is_err()
                {
                    break Err(anyhow::anyhow!("coordinator stopped"));
                }
            }
            Err(e) => {
                debug!(client_id, error = %e, "unparseable line");
                let _ = tx.send(ServerMessage::error(format!("JSON parse error: {e}")));
            }
        }
    };

    drop(tx);
    clients.write().await.remove(&client_id);
    let _ = write_task.await;
    result
}

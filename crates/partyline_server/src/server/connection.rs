#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use partyline_domain::Username;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::server::registry::ConnId;
use crate::server::router;
use crate::server::state::GlobalState;

/// Drive one client connection to completion: WebSocket handshake, writer
/// task, read loop, cleanup.
pub async fn handle_connection(
	conn_id: ConnId,
	stream: TcpStream,
	addr: SocketAddr,
	state: Arc<GlobalState>,
) -> anyhow::Result<()> {
	let ws = accept_async(stream).await?;
	info!(conn_id, remote = %addr, "client connected");

	let (mut ws_sink, mut ws_stream) = ws.split();
	let (tx, mut rx) = mpsc::unbounded_channel::<String>();

	// Writer task: drains this connection's outbound queue. Ends once the
	// registry entry (the only sender) is dropped and the queue is empty, so
	// frames queued before a disconnect still flush.
	let writer = tokio::spawn(async move {
		while let Some(frame) = rx.recv().await {
			if let Err(e) = ws_sink.send(Message::text(frame)).await {
				debug!(conn_id, error = %e, "outbound write failed");
				break;
			}
		}
	});

	state.registry.lock().await.insert_conn(conn_id, tx);

	let mut identity: Option<Username> = None;

	while let Some(msg) = ws_stream.next().await {
		match msg {
			Ok(Message::Text(text)) => {
				router::handle_frame(&state, conn_id, &mut identity, text.as_str()).await;
			}
			Ok(Message::Close(_)) => {
				debug!(conn_id, "close frame received");
				break;
			}
			Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
			Ok(other) => {
				debug!(conn_id, kind = ?other, "ignoring non-text message");
			}
			Err(e) => {
				// Transport errors get the same cleanup as a normal close.
				debug!(conn_id, error = %e, "transport error");
				break;
			}
		}
	}

	router::handle_disconnect(&state, conn_id, identity).await;

	let _ = writer.await;

	Ok(())
}

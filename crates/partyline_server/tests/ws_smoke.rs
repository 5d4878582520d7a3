#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use futures::{SinkExt, StreamExt};
use partyline_server::server::connection::handle_connection;
use partyline_server::server::persistence::GraphFile;
use partyline_server::server::social::SocialGraph;
use partyline_server::server::state::GlobalState;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bind an ephemeral port and run the real accept loop against it.
async fn spawn_relay() -> anyhow::Result<(SocketAddr, tempfile::TempDir)> {
	let dir = tempfile::tempdir().context("tempdir")?;
	let graph_file = GraphFile::new(dir.path().join("friend-data.json"));
	let state = Arc::new(GlobalState::new(SocialGraph::new(), graph_file));

	let listener = TcpListener::bind("127.0.0.1:0").await.context("bind listener")?;
	let addr = listener.local_addr().context("local addr")?;

	tokio::spawn(async move {
		let mut next_conn_id: u64 = 1;
		loop {
			let Ok((stream, peer)) = listener.accept().await else {
				break;
			};
			let conn_id = next_conn_id;
			next_conn_id += 1;

			let state = Arc::clone(&state);
			tokio::spawn(async move {
				let _ = handle_connection(conn_id, stream, peer, state).await;
			});
		}
	});

	Ok((addr, dir))
}

async fn connect_client(addr: SocketAddr) -> anyhow::Result<WsClient> {
	let (ws, _resp) = connect_async(format!("ws://{addr}")).await.context("client connect")?;
	Ok(ws)
}

/// Wait for the next text frame and assert it matches.
async fn expect_frame(ws: &mut WsClient, want: &str) -> anyhow::Result<()> {
	loop {
		let msg = timeout(Duration::from_secs(5), ws.next())
			.await
			.context("timeout waiting for frame")?
			.ok_or_else(|| anyhow!("stream ended"))?
			.context("transport error")?;

		if let Message::Text(text) = msg {
			assert_eq!(text.as_str(), want);
			return Ok(());
		}
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn friend_flow_over_real_websockets() -> anyhow::Result<()> {
	let (addr, _dir) = spawn_relay().await?;

	let mut alice = connect_client(addr).await?;
	let mut bob = connect_client(addr).await?;

	alice.send(Message::text("IDENTIFY|alice")).await?;
	bob.send(Message::text("IDENTIFY|bob")).await?;

	// Delivered directly if bob is already identified, or flushed from the
	// pending queue when his IDENTIFY lands; exactly one frame either way.
	alice.send(Message::text("FRIEND_REQUEST|alice|bob")).await?;
	expect_frame(&mut bob, "FRIEND_REQUEST|alice").await?;

	bob.send(Message::text("FRIEND_ACCEPT|bob|alice|req-7")).await?;
	expect_frame(&mut alice, "FRIEND_ACCEPT|bob|req-7|online|").await?;
	expect_frame(&mut bob, "FRIEND_ACCEPT|alice|req-7|online|").await?;

	alice.send(Message::text("FRIEND_MESSAGE|alice|bob|gg|wp")).await?;
	expect_frame(&mut bob, "FRIEND_MESSAGE|alice|gg|wp").await?;

	Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_fallback_reaches_other_clients_only() -> anyhow::Result<()> {
	let (addr, _dir) = spawn_relay().await?;

	let mut alice = connect_client(addr).await?;
	let mut bob = connect_client(addr).await?;

	alice.send(Message::text("IDENTIFY|alice")).await?;
	bob.send(Message::text("IDENTIFY|bob")).await?;

	// Barrier: once alice sees this request, the server has processed both
	// of bob's frames, so both connections are fully registered.
	bob.send(Message::text("FRIEND_REQUEST|bob|alice")).await?;
	expect_frame(&mut alice, "FRIEND_REQUEST|bob").await?;

	alice.send(Message::text("alice|hello everyone")).await?;
	expect_frame(&mut bob, "alice|hello everyone").await?;

	// The sender must not hear its own broadcast.
	let echo = timeout(Duration::from_millis(250), alice.next()).await;
	assert!(echo.is_err(), "sender unexpectedly received its own broadcast");

	Ok(())
}

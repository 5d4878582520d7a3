#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use partyline_server::config;
use partyline_server::server::connection::handle_connection;
use partyline_server::server::health::spawn_health_server;
use partyline_server::server::persistence::GraphFile;
use partyline_server::server::social::SocialGraph;
use partyline_server::server::state::GlobalState;
use partyline_util::endpoint::WsEndpoint;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn usage_and_exit() -> ! {
	eprintln!(
		"Usage: partyline_server [--bind ws://host:port]\n\
\n\
Options:\n\
\t--bind    Bind endpoint (default: ws://0.0.0.0:10000)\n\
\t         Format: ws://host:port\n\
\t--help   Show this help\n\
"
	);
	std::process::exit(2)
}

fn parse_args() -> Option<SocketAddr> {
	let mut bind_override = None;

	let mut it = std::env::args().skip(1);
	while let Some(arg) = it.next() {
		match arg.as_str() {
			"--help" | "-h" => usage_and_exit(),
			"--bind" | "--listen" => {
				let v = it.next().unwrap_or_else(|| usage_and_exit());
				if v.trim().is_empty() {
					eprintln!("--bind must be non-empty (expected ws://host:port)");
					usage_and_exit();
				}
				bind_override = Some(v);
			}
			other => {
				eprintln!("Unknown argument: {other}");
				usage_and_exit();
			}
		}
	}

	bind_override.map(|v| {
		let bind = WsEndpoint::parse(&v).unwrap_or_else(|e| {
			eprintln!("{e}");
			usage_and_exit();
		});

		bind.to_socket_addr_if_ip_literal().unwrap_or_else(|e| {
			eprintln!("{e}");
			usage_and_exit();
		})
	})
}

fn init_tracing() {
	let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,partyline_server=debug".to_string());

	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::new(filter))
		.with(tracing_subscriber::fmt::layer().with_target(false))
		.init();
}

fn init_metrics(bind: Option<&str>) {
	let Some(bind) = bind else {
		return;
	};

	match bind.parse::<SocketAddr>() {
		Ok(addr) => {
			if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
				.with_http_listener(addr)
				.install()
			{
				warn!(error = %e, "failed to start metrics exporter");
			} else {
				info!(%addr, "metrics exporter listening");
			}
		}
		Err(e) => {
			warn!(error = %e, %bind, "invalid metrics bind address (expected host:port)");
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();

	let bind_override = parse_args();

	let config_path = config::default_config_path()?;
	let mut server_cfg = config::load_server_config_from_path(&config_path)?;
	info!(path = %config_path.display(), "loaded server config (toml + env overrides)");

	if let Some(addr) = bind_override {
		server_cfg.server.ws_bind = addr.to_string();
	}

	init_metrics(server_cfg.server.metrics_bind.as_deref());

	match server_cfg.server.health_bind.parse::<SocketAddr>() {
		Ok(addr) => {
			spawn_health_server(addr);
			info!(%addr, "health server listening");
		}
		Err(e) => warn!(
			error = %e,
			bind = %server_cfg.server.health_bind,
			"invalid health bind address (expected host:port)"
		),
	}

	let graph_file = GraphFile::new(server_cfg.server.data_path.clone());
	let social = match graph_file.load() {
		Ok(Some(graph)) => {
			info!(
				path = %graph_file.path().display(),
				pending_users = graph.pending_map().len(),
				"loaded social graph from file"
			);
			graph
		}
		Ok(None) => SocialGraph::new(),
		Err(e) => {
			warn!(
				error = %e,
				path = %graph_file.path().display(),
				"failed to load social graph, starting empty"
			);
			SocialGraph::new()
		}
	};

	let state = Arc::new(GlobalState::new(social, graph_file));

	let listener = TcpListener::bind(server_cfg.server.ws_bind.as_str())
		.await
		.with_context(|| format!("bind websocket listener on {}", server_cfg.server.ws_bind))?;
	info!(bind = %server_cfg.server.ws_bind, "relay listening");

	let mut next_conn_id: u64 = 1;

	loop {
		let (stream, addr) = listener.accept().await?;

		let conn_id = next_conn_id;
		next_conn_id += 1;
		metrics::counter!("partyline_server_connections_total").increment(1);

		let state = Arc::clone(&state);
		tokio::spawn(async move {
			if let Err(e) = handle_connection(conn_id, stream, addr, state).await {
				warn!(conn_id, error = %e, "connection handler exited with error");
			}
		});
	}
}

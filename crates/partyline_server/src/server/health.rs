#![forbid(unsafe_code)]

use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, header};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::warn;

/// Fixed body returned to every probe, whatever the method or path.
const LIVENESS_BODY: &[u8] = b"partyline relay is running";

pub fn spawn_health_server(bind: SocketAddr) {
	tokio::spawn(async move {
		if let Err(err) = run_health_server(bind).await {
			warn!(error = %err, "health server stopped");
		}
	});
}

async fn run_health_server(bind: SocketAddr) -> anyhow::Result<()> {
	let listener = TcpListener::bind(bind).await?;
	loop {
		let (stream, _addr) = listener.accept().await?;
		let io = TokioIo::new(stream);
		tokio::spawn(async move {
			let service = service_fn(handle_probe);
			if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
				warn!(error = %err, "health connection error");
			}
		});
	}
}

async fn handle_probe(_req: Request<Incoming>) -> Result<Response<Full<Bytes>>, hyper::Error> {
	Ok(Response::builder()
		.status(StatusCode::OK)
		.header(header::CONTENT_TYPE, "text/plain")
		.body(Full::new(Bytes::from_static(LIVENESS_BODY)))
		.unwrap())
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode, header};
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info};

mod metrics;

use scrivener::api::{Reply, StatusQuery, SubmitRequest};
use scrivener::{EngineKind, Gateway, Scrivener, worker};

#[derive(Parser, Debug)]
#[command(name = "scrivener-server")]
#[command(about = "HTTP job server for audio transcription")]
struct Params {
    /// Path to a whisper.cpp model file (e.g. `ggml-large-v3.bin`).
    #[arg(short = 'm', long = "model", required = true)]
    model_path: String,

    /// Transcription engine variant.
    #[arg(short = 'e', long = "engine", value_enum, default_value_t = EngineKind::Whisper)]
    engine: EngineKind,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "0.0.0.0")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 5000)]
    port: u16,

    /// Bearer token clients must present on `/transcribe` requests.
    #[arg(long = "token", required = true)]
    token: String,

    /// GPU device index to load the model onto.
    #[arg(long = "gpu-device", default_value_t = 0)]
    gpu_device: i32,

    /// Worker sleep between queue polls when idle (milliseconds).
    #[arg(long = "poll-interval-ms", default_value_t = 1000)]
    poll_interval_ms: u64,
}

#[derive(Clone)]
struct AppState {
    gateway: Arc<Gateway>,
}

#[tokio::main]
async fn main() {
    scrivener::logging::init();

    if let Err(err) = run().await {
        error!(error = ?err, "scrivener-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    metrics::init();

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let core = Scrivener::new(params.engine, &params.model_path, params.gpu_device)
        .context("failed to initialize transcription engine")?;

    let worker = worker::spawn(core.clone(), Duration::from_millis(params.poll_interval_ms));

    let state = AppState {
        gateway: Arc::new(Gateway::new(core, params.token)),
    };

    let transcribe_routes = Router::new()
        .route("/transcribe", get(task_status).post(submit_task))
        .route_layer(from_fn_with_state(state.clone(), require_token));

    let app = Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics::prometheus_metrics))
        .merge(transcribe_routes)
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, engine = ?params.engine, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    worker.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}

async fn root() -> &'static str {
    "scrivener-server: POST /transcribe (json: task_id, input_audio)"
}

async fn task_status(State(state): State<AppState>, Query(query): Query<StatusQuery>) -> Response {
    reply_response(state.gateway.status(query.task_id))
}

async fn submit_task(State(state): State<AppState>, Json(request): Json<SubmitRequest>) -> Response {
    reply_response(state.gateway.submit(&request))
}

/// Reject `/transcribe` requests that do not carry the configured token.
///
/// The check happens before the handlers run, so an unauthorized request
/// never touches the registry.
async fn require_token(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.gateway.auth_reply(value) {
        Some(reply) => reply_response(reply),
        None => next.run(req).await,
    }
}

fn reply_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply)).into_response()
}

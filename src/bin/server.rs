use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use treasurer_tools::{
    AppState, MediaStorage, build_router, graceful_shutdown, logging_middleware,
};

/// The web server for treasurer_tools.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: String,

    /// Directory that uploaded attachments are stored in.
    #[arg(long, env = "MEDIA_ROOT", default_value = "media")]
    media_root: String,

    /// The IP address to listen on.
    #[arg(short, long, env = "ADDRESS", default_value = "127.0.0.1")]
    address: std::net::IpAddr,

    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Canonical timezone name used for dates, e.g. "America/Edmonton".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// Secret used to derive the cookie key.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from((args.address, args.port));

    let connection = Connection::open(&args.db_path)
        .unwrap_or_else(|error| panic!("Could not open database at {}: {error}", args.db_path));
    let state = AppState::new(
        connection,
        &args.secret,
        &args.timezone,
        MediaStorage::new(&args.media_root),
    )
    .expect("Could not initialize the application state");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Server stopped unexpectedly");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(filter::LevelFilter::INFO);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(stdout_log.and_then(debug_log))
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are turned into responses.
        .on_failure(());

    router.layer(tracing_layer)
}

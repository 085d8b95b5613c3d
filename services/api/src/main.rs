mod config;
mod database;
mod modules;
mod server;

use config::app_config;
use sea_orm::{Database, DatabaseConnection};
use shared::{
    job::SEND_QUEUE_NAME,
    queue::{JobQueue, RedisJobQueue},
};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tracing::info;

#[tokio::main]
async fn main() {
    shared::tracer::init("mailgate-api");

    let cfg = app_config();

    let db = Database::connect(&cfg.database_url)
        .await
        .expect("failed to connect to postgres");

    let queue: Arc<dyn JobQueue> = Arc::new(
        RedisJobQueue::connect(&cfg.redis_url, SEND_QUEUE_NAME)
            .await
            .expect("failed to connect to redis"),
    );

    listen_to_shutdown_signals(db.clone());

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), cfg.api_port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|_| panic!("[API] failed to bind to address {addr}"));

    info!(%addr, "api listening");

    let server = server::controller::new(db, queue);

    axum::serve(listener, server)
        .await
        .unwrap_or_else(|_| panic!("[API] failed to serve app on address {addr}"));
}

/// Listens for `SIGINT`/`SIGTERM`, closing the DB pool before exit.
#[allow(clippy::never_loop)]
fn listen_to_shutdown_signals(db: DatabaseConnection) {
    let mut signals = Signals::new([SIGINT, SIGTERM]).expect("failed to setup signals hook");

    tokio::spawn(async move {
        for sig in signals.forever() {
            info!(signal = sig, "shutting down");

            if let Err(err) = db.close().await {
                tracing::error!(error = %err, "failed to close db connection");
            }

            std::process::exit(sig)
        }
    });
}

mod config;
mod mailer;
mod processor;

use config::app_config;
use mailer::Mailer;
use sea_orm::Database;
use shared::job::SEND_QUEUE_NAME;
use shared::queue::{JobQueue, RedisJobQueue};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    shared::tracer::init("mailgate-worker");

    let cfg = app_config();

    let db = Database::connect(&cfg.database_url)
        .await
        .expect("failed to connect to postgres");

    let queue: Arc<dyn JobQueue> = Arc::new(
        RedisJobQueue::connect(&cfg.redis_url, SEND_QUEUE_NAME)
            .await
            .expect("failed to connect to redis"),
    );

    let mailer = Arc::new(Mailer::new());
    let semaphore = Arc::new(Semaphore::new(cfg.worker_concurrency));

    listen_to_shutdown_signals(db.clone());

    spawn_delayed_promotion(queue.clone());

    info!(concurrency = cfg.worker_concurrency, "worker started");

    let mut tasks = JoinSet::new();

    loop {
        let permit = semaphore.clone().acquire_owned().await.expect("semaphore closed");

        let Ok(Some(delivery)) = queue.dequeue(5).await else {
            drop(permit);
            continue;
        };

        let queue = queue.clone();
        let db = db.clone();
        let mailer = mailer.clone();

        tasks.spawn(async move {
            let _permit = permit;
            handle_delivery(delivery, queue, db, mailer).await;
        });

        while tasks.try_join_next().is_some() {}
    }
}

async fn handle_delivery(
    delivery: shared::queue::Delivery,
    queue: Arc<dyn JobQueue>,
    db: sea_orm::DatabaseConnection,
    mailer: Arc<Mailer>,
) {
    let job_id = delivery.job_id.clone();
    let is_terminal = delivery.is_terminal_attempt();
    let attempt = delivery.attempt;

    match processor::process(&delivery, &db, &mailer).await {
        Ok(true) => {}
        Ok(false) if is_terminal => {
            error!(job_id, attempt, "send job exhausted its retries");
        }
        Ok(false) => {
            let backoff = Duration::from_secs(1 << attempt.min(6));
            if let Err(err) = queue.retry(delivery, backoff).await {
                error!(job_id, error = %err, "failed to schedule retry");
            }
        }
        Err(err) => {
            error!(job_id, error = %err, "send job payload could not be decoded, dropping");
        }
    }
}

fn spawn_delayed_promotion(queue: Arc<dyn JobQueue>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));

        loop {
            interval.tick().await;

            if let Err(err) = queue.promote_delayed().await {
                error!(error = %err, "failed to promote delayed retries");
            }
        }
    });
}

/// Listen to shutdown signals `SIGINT` and `SIGTERM`, closing the DB pool
/// before exit. In-flight jobs are not force-cancelled; they finish their
/// current delivery since each is a short-lived detached task.
#[allow(clippy::never_loop)]
fn listen_to_shutdown_signals(db: sea_orm::DatabaseConnection) {
    let mut signals = Signals::new([SIGINT, SIGTERM]).expect("failed to setup signals hook");

    tokio::spawn(async move {
        for sig in signals.forever() {
            info!(signal = sig, "shutting down");

            if let Err(e) = db.close().await {
                error!(error = %e, "failed to close db connection");
            }

            std::process::exit(sig)
        }
    });
}

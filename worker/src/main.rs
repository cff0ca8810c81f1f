use anyhow::Result;
use chrono::Utc;
use crates::{
    domain::repositories::{mailer::Mailer, subscriptions::SubscriptionRepository},
    infra::{
        db::{postgres::postgres_connection, repositories::subscriptions::SubscriptionPostgres},
        mailer::AppMailer,
    },
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{
    config,
    usecases::{
        reconcile_expired_subscriptions::ReconcileExpiredSubscriptionsUseCase,
        send_subscription_reminders::{
            SendSubscriptionRemindersParams, SendSubscriptionRemindersUseCase,
        },
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
}

/// One sweep per invocation; scheduling is left to cron.
async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync> =
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool_arc)));
    let mailer: Arc<dyn Mailer + Send + Sync> =
        Arc::new(AppMailer::from_config(dotenvy_env.mailer.as_ref())?);

    let now = Utc::now();

    if dotenvy_env.reconcile.enabled {
        ReconcileExpiredSubscriptionsUseCase::new(Arc::clone(&subscription_repository))
            .run(now)
            .await?;
    }

    let reminders = SendSubscriptionRemindersUseCase::new(subscription_repository, mailer)
        .run(SendSubscriptionRemindersParams {
            reference: now,
            horizon_days: dotenvy_env.reminders.horizon_days,
            utc_offset: dotenvy_env.reminders.utc_offset,
        })
        .await?;

    info!(
        sent = reminders.sent,
        failed = reminders.failed,
        "Worker finished"
    );

    Ok(())
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::{
            app_users::AppUserRepository, mailer::Mailer, payments::PaymentRepository,
            plans::PlanRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::payments::RecordPaymentRequest,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                app_users::AppUserPostgres, payments::PaymentPostgres, plans::PlanPostgres,
                subscriptions::SubscriptionPostgres,
            },
        },
        mailer::AppMailer,
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{auth::AuthUser, usecases::payments::PaymentUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>, mailer: Arc<AppMailer>) -> Router {
    let payment_repository = PaymentPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let user_repository = AppUserPostgres::new(Arc::clone(&db_pool));

    let usecase = PaymentUseCase::new(
        Arc::new(payment_repository),
        Arc::new(subscription_repository),
        Arc::new(plan_repository),
        Arc::new(user_repository),
        mailer,
    );

    Router::new()
        .route("/", get(list_payments).post(record_payment))
        .route("/:id", get(get_payment))
        .with_state(Arc::new(usecase))
}

pub async fn record_payment<Pay, S, P, U, M>(
    State(usecase): State<Arc<PaymentUseCase<Pay, S, P, U, M>>>,
    auth: AuthUser,
    Json(request): Json<RecordPaymentRequest>,
) -> impl IntoResponse
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }
    info!(admin_id = %auth.user_id, subscription_id = ?request.subscription_id, "payments: record request received");

    match usecase.record_payment(request).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_payments<Pay, S, P, U, M>(
    State(usecase): State<Arc<PaymentUseCase<Pay, S, P, U, M>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.list_payments().await {
        Ok(payments) => Json(payments).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_payment<Pay, S, P, U, M>(
    State(usecase): State<Arc<PaymentUseCase<Pay, S, P, U, M>>>,
    auth: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.get_payment(payment_id).await {
        Ok(payment) => Json(payment).into_response(),
        Err(err) => err.into_response(),
    }
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use crates::{
    domain::{
        repositories::{
            app_users::AppUserRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::subscriptions::{CreateSubscriptionRequest, UpdateSubscriptionRequest},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            app_users::AppUserPostgres, plans::PlanPostgres, subscriptions::SubscriptionPostgres,
        },
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{auth::AuthUser, usecases::subscriptions::SubscriptionUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let user_repository = AppUserPostgres::new(Arc::clone(&db_pool));

    let usecase = SubscriptionUseCase::new(
        Arc::new(subscription_repository),
        Arc::new(plan_repository),
        Arc::new(user_repository),
    );

    Router::new()
        .route("/", get(list_subscriptions).post(create_subscription))
        .route("/my-subscriptions", get(my_subscriptions))
        .route("/my-subscriptions/advisories", get(my_advisories))
        .route(
            "/:id",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
        .route("/:id/renew", post(renew))
        .with_state(Arc::new(usecase))
}

pub async fn my_subscriptions<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    match usecase.my_subscriptions(auth.user_id, Utc::now()).await {
        Ok(subscriptions) => Json(subscriptions).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn my_advisories<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    match usecase.my_advisories(auth.user_id, Utc::now()).await {
        Ok(advisories) => Json(advisories).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn renew<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    info!(%subscription_id, user_id = %auth.user_id, "subscriptions: renew request received");

    match usecase.renew(subscription_id, &auth).await {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_subscriptions<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.list_subscriptions().await {
        Ok(subscriptions) => Json(subscriptions).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_subscription<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.get_subscription(subscription_id).await {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn create_subscription<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
    Json(request): Json<CreateSubscriptionRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.create_subscription(request).await {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_subscription<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.update_subscription(subscription_id, request).await {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_subscription<S, P, U>(
    State(usecase): State<Arc<SubscriptionUseCase<S, P, U>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.delete_subscription(subscription_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

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
        repositories::plans::PlanRepository,
        value_objects::plans::{CreatePlanRequest, UpdatePlanRequest},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::plans::PlanPostgres,
    },
};
use uuid::Uuid;

use crate::{auth::AuthUser, usecases::plans::PlanUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let usecase = PlanUseCase::new(Arc::new(plan_repository));

    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/by-name/:name", get(find_by_name))
        .route(
            "/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .with_state(Arc::new(usecase))
}

/// Public: the plan catalogue is shown before sign-in.
pub async fn list_plans<P>(State(usecase): State<Arc<PlanUseCase<P>>>) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    match usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    _auth: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    match usecase.get_plan(plan_id).await {
        Ok(plan) => Json(plan).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn find_by_name<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    _auth: AuthUser,
    Path(name): Path<String>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    match usecase.find_by_name(&name).await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn create_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    auth: AuthUser,
    Json(request): Json<CreatePlanRequest>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.create_plan(request).await {
        Ok(plan) => (StatusCode::CREATED, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    auth: AuthUser,
    Path(plan_id): Path<Uuid>,
    Json(request): Json<UpdatePlanRequest>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.update_plan(plan_id, request).await {
        Ok(plan) => Json(plan).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_plan<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    auth: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.delete_plan(plan_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

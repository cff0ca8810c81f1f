use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use chrono::Utc;
use crates::{
    domain::repositories::reports::ReportRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::reports::ReportPostgres,
    },
};

use crate::{auth::AuthUser, usecases::reports::ReportUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let report_repository = ReportPostgres::new(Arc::clone(&db_pool));
    let usecase = ReportUseCase::new(Arc::new(report_repository));

    Router::new()
        .route("/dashboard-stats", get(dashboard_stats))
        .with_state(Arc::new(usecase))
}

pub async fn dashboard_stats<R>(
    State(usecase): State<Arc<ReportUseCase<R>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    R: ReportRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.dashboard_stats(Utc::now()).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => err.into_response(),
    }
}

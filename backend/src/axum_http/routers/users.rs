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
        repositories::app_users::AppUserRepository,
        value_objects::app_users::{RegisterUserRequest, UpdateUserRequest},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::app_users::AppUserPostgres,
    },
};

use uuid::Uuid;

use crate::{auth::AuthUser, usecases::users::UserUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let user_repository = AppUserPostgres::new(Arc::clone(&db_pool));
    let usecase = UserUseCase::new(Arc::new(user_repository));

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(me))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .with_state(Arc::new(usecase))
}

pub async fn create_user<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    auth: AuthUser,
    Json(request): Json<RegisterUserRequest>,
) -> impl IntoResponse
where
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.create_user(request).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_users<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn me<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    U: AppUserRepository + Send + Sync + 'static,
{
    match usecase.me(user_id).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_user<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse
where
    U: AppUserRepository + Send + Sync + 'static,
{
    match usecase.get_user(user_id, &auth).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_user<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> impl IntoResponse
where
    U: AppUserRepository + Send + Sync + 'static,
{
    match usecase.update_user(user_id, request, &auth).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_user<U>(
    State(usecase): State<Arc<UserUseCase<U>>>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse
where
    U: AppUserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.ensure_admin() {
        return err.into_response();
    }

    match usecase.delete_user(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

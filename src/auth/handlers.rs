use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    guard::{enforce_access, Access, AuthUser, RouteGuard},
    services,
};
use crate::{error::AppResult, extract::JsonBody, state::AppState};

pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let public = RouteGuard::new(state, Access::Public);
    let authed = RouteGuard::new(state, Access::Authenticated);
    Router::new()
        .route(
            "/auth/register",
            post(register).route_layer(from_fn_with_state(public.clone(), enforce_access)),
        )
        .route(
            "/auth/login",
            post(login).route_layer(from_fn_with_state(public, enforce_access)),
        )
        .route(
            "/auth/me",
            get(get_me).route_layer(from_fn_with_state(authed, enforce_access)),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let response = services::register(&state, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<PublicUser>> {
    Ok(Json(services::current_user(&state, user.id).await?))
}

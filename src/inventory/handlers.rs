use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{dto::RestockRequest, services};
use crate::{
    auth::{
        guard::{enforce_access, RouteGuard},
        Access, Role,
    },
    error::AppResult,
    extract::{parse_id, JsonBody},
    state::AppState,
    sweets::Sweet,
};

/// Any signed-in user may purchase; restocking needs ADMIN.
pub fn inventory_routes(state: &AppState) -> Router<AppState> {
    let authed = RouteGuard::new(state, Access::Authenticated);
    let admin = RouteGuard::new(state, Access::RequiresRole(Role::Admin));

    Router::new()
        .route(
            "/inventory/:id/purchase",
            post(purchase).route_layer(from_fn_with_state(authed, enforce_access)),
        )
        .route(
            "/inventory/:id/restock",
            post(restock).route_layer(from_fn_with_state(admin, enforce_access)),
        )
}

#[instrument(skip(state))]
pub async fn purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Sweet>> {
    let id = parse_id(&id, "Sweet")?;
    Ok(Json(services::purchase(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn restock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<RestockRequest>,
) -> AppResult<Json<Sweet>> {
    let id = parse_id(&id, "Sweet")?;
    Ok(Json(services::restock(&state, id, payload.amount).await?))
}

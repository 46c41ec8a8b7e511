use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateSweetRequest, SearchQuery, UpdateSweetRequest},
    repo_types::{Sweet, SweetFilter},
    services,
};
use crate::{
    auth::{
        guard::{enforce_access, RouteGuard},
        Access, Role,
    },
    error::AppResult,
    extract::{parse_id, JsonBody},
    state::AppState,
};

/// Reads are public, writes need a token, delete needs ADMIN.
pub fn sweets_routes(state: &AppState) -> Router<AppState> {
    let public = RouteGuard::new(state, Access::Public);
    let authed = RouteGuard::new(state, Access::Authenticated);
    let admin = RouteGuard::new(state, Access::RequiresRole(Role::Admin));

    Router::new()
        .route(
            "/sweets",
            get(list_sweets)
                .route_layer(from_fn_with_state(public.clone(), enforce_access))
                .merge(
                    post(create_sweet)
                        .route_layer(from_fn_with_state(authed.clone(), enforce_access)),
                ),
        )
        .route(
            "/sweets/search",
            get(search_sweets).route_layer(from_fn_with_state(public.clone(), enforce_access)),
        )
        .route(
            "/sweets/:id",
            get(get_sweet)
                .route_layer(from_fn_with_state(public, enforce_access))
                .merge(
                    put(update_sweet)
                        .route_layer(from_fn_with_state(authed, enforce_access)),
                )
                .merge(
                    delete(delete_sweet)
                        .route_layer(from_fn_with_state(admin, enforce_access)),
                ),
        )
}

#[instrument(skip(state))]
pub async fn list_sweets(State(state): State<AppState>) -> AppResult<Json<Vec<Sweet>>> {
    Ok(Json(services::find_all(&state).await?))
}

#[instrument(skip(state))]
pub async fn search_sweets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Sweet>>> {
    let filter = SweetFilter::try_from(query)?;
    Ok(Json(services::search(&state, &filter).await?))
}

#[instrument(skip(state))]
pub async fn get_sweet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Sweet>> {
    let id = parse_id(&id, "Sweet")?;
    Ok(Json(services::find_one(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_sweet(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateSweetRequest>,
) -> AppResult<(StatusCode, Json<Sweet>)> {
    let sweet = services::create(&state, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(sweet)))
}

#[instrument(skip(state, payload))]
pub async fn update_sweet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateSweetRequest>,
) -> AppResult<Json<Sweet>> {
    let id = parse_id(&id, "Sweet")?;
    Ok(Json(services::update(&state, id, payload.into()).await?))
}

#[instrument(skip(state))]
pub async fn delete_sweet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Sweet>> {
    let id = parse_id(&id, "Sweet")?;
    Ok(Json(services::remove(&state, id).await?))
}

use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{NewSweet, StockUpdate, Sweet, SweetFilter, SweetPatch};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

fn check_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn check_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::validation("Price must be positive"));
    }
    Ok(())
}

fn check_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    Ok(())
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Sweet with ID {id} not found"))
}

pub async fn create(state: &AppState, input: NewSweet) -> AppResult<Sweet> {
    check_text("name", &input.name)?;
    check_text("category", &input.category)?;
    check_price(input.price)?;
    check_quantity(input.quantity)?;

    let sweet = state.sweets.insert(input).await?;
    info!(sweet_id = %sweet.id, name = %sweet.name, "sweet created");
    Ok(sweet)
}

pub async fn find_all(state: &AppState) -> AppResult<Vec<Sweet>> {
    state.sweets.list().await
}

pub async fn search(state: &AppState, filter: &SweetFilter) -> AppResult<Vec<Sweet>> {
    state.sweets.search(filter).await
}

pub async fn find_one(state: &AppState, id: Uuid) -> AppResult<Sweet> {
    state.sweets.find(id).await?.ok_or_else(|| not_found(id))
}

/// Applies only the supplied fields. Quantity may be set to any non-negative value.
pub async fn update(state: &AppState, id: Uuid, patch: SweetPatch) -> AppResult<Sweet> {
    find_one(state, id).await?;

    if let Some(name) = &patch.name {
        check_text("name", name)?;
    }
    if let Some(category) = &patch.category {
        check_text("category", category)?;
    }
    if let Some(price) = patch.price {
        check_price(price)?;
    }
    if let Some(quantity) = patch.quantity {
        check_quantity(quantity)?;
    }

    // A concurrent delete between the lookup and the write still reports 404.
    let sweet = state
        .sweets
        .update(id, patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(sweet_id = %sweet.id, "sweet updated");
    Ok(sweet)
}

pub async fn remove(state: &AppState, id: Uuid) -> AppResult<Sweet> {
    find_one(state, id).await?;
    let sweet = state.sweets.delete(id).await?.ok_or_else(|| not_found(id))?;
    info!(sweet_id = %sweet.id, "sweet deleted");
    Ok(sweet)
}

/// Atomically shifts stock by `delta`. Used by purchase (-1) and restock (+n).
pub async fn adjust_stock(state: &AppState, id: Uuid, delta: i32) -> AppResult<Sweet> {
    match state.sweets.adjust_quantity(id, delta).await? {
        StockUpdate::Applied(sweet) => {
            info!(sweet_id = %sweet.id, delta, quantity = sweet.quantity, "stock adjusted");
            Ok(sweet)
        }
        StockUpdate::Insufficient => {
            warn!(sweet_id = %id, delta, "stock adjustment below zero refused");
            Err(AppError::OutOfStock)
        }
        StockUpdate::NotFound => Err(not_found(id)),
    }
}

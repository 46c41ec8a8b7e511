use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    sweets::{services as catalog, Sweet},
};

/// Sells exactly one unit. Fails with `OutOfStock` when quantity is zero.
pub async fn purchase(state: &AppState, id: Uuid) -> AppResult<Sweet> {
    let sweet = catalog::adjust_stock(state, id, -1).await?;
    info!(sweet_id = %id, remaining = sweet.quantity, "sweet purchased");
    Ok(sweet)
}

pub async fn restock(state: &AppState, id: Uuid, amount: i32) -> AppResult<Sweet> {
    if amount <= 0 {
        warn!(sweet_id = %id, amount, "non-positive restock amount");
        return Err(AppError::validation("Restock amount must be positive"));
    }
    let sweet = catalog::adjust_stock(state, id, amount).await?;
    info!(sweet_id = %id, amount, quantity = sweet.quantity, "sweet restocked");
    Ok(sweet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweets::repo_types::NewSweet;

    async fn stocked(state: &AppState, quantity: i32) -> Sweet {
        catalog::create(
            state,
            NewSweet {
                name: "Candy".into(),
                category: "Hard Candy".into(),
                price: 2.99,
                quantity,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn purchase_decrements_by_one() {
        let state = AppState::fake();
        for n in [1, 2, 10] {
            let sweet = stocked(&state, n).await;
            let after = purchase(&state, sweet.id).await.unwrap();
            assert_eq!(after.quantity, n - 1);
        }
    }

    #[tokio::test]
    async fn purchase_out_of_stock_leaves_state_untouched() {
        let state = AppState::fake();
        let sweet = stocked(&state, 0).await;
        let err = purchase(&state, sweet.id).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfStock));
        assert_eq!(catalog::find_one(&state, sweet.id).await.unwrap(), sweet);
    }

    #[tokio::test]
    async fn purchase_unknown_sweet_is_not_found() {
        let state = AppState::fake();
        let err = purchase(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn restock_adds_amount() {
        let state = AppState::fake();
        let sweet = stocked(&state, 3).await;
        for (n, expected) in [(1, 4), (10, 14), (1000, 1014)] {
            let after = restock(&state, sweet.id, n).await.unwrap();
            assert_eq!(after.quantity, expected);
        }
    }

    #[tokio::test]
    async fn restock_rejects_non_positive_amounts_without_mutation() {
        let state = AppState::fake();
        let sweet = stocked(&state, 3).await;
        for amount in [0, -1, -100] {
            let err = restock(&state, sweet.id, amount).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(catalog::find_one(&state, sweet.id).await.unwrap(), sweet);
    }

    #[tokio::test]
    async fn restock_validates_amount_before_lookup() {
        let state = AppState::fake();
        let err = restock(&state, Uuid::new_v4(), 0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = restock(&state, Uuid::new_v4(), 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_purchases_of_last_unit_sell_it_once() {
        let state = AppState::fake();
        let sweet = stocked(&state, 1).await;

        let (a, b) = tokio::join!(purchase(&state, sweet.id), purchase(&state, sweet.id));
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!([a, b]
            .into_iter()
            .any(|r| matches!(r, Err(AppError::OutOfStock))));
        assert_eq!(catalog::find_one(&state, sweet.id).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn many_concurrent_purchases_never_oversell() {
        let state = AppState::fake();
        let sweet = stocked(&state, 5).await;

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let state = state.clone();
            tasks.push(tokio::spawn(async move { purchase(&state, sweet.id).await }));
        }
        let mut sold = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                sold += 1;
            }
        }
        assert_eq!(sold, 5);
        assert_eq!(catalog::find_one(&state, sweet.id).await.unwrap().quantity, 0);
    }
}

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewSweet, StockUpdate, Sweet, SweetFilter, SweetPatch};
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait SweetStore: Send + Sync {
    async fn insert(&self, new: NewSweet) -> AppResult<Sweet>;

    /// Every sweet, oldest first.
    async fn list(&self) -> AppResult<Vec<Sweet>>;

    async fn search(&self, filter: &SweetFilter) -> AppResult<Vec<Sweet>>;

    async fn find(&self, id: Uuid) -> AppResult<Option<Sweet>>;

    async fn update(&self, id: Uuid, patch: SweetPatch) -> AppResult<Option<Sweet>>;

    async fn delete(&self, id: Uuid) -> AppResult<Option<Sweet>>;

    /// Adds `delta` to the quantity in one atomic step, refusing to go below zero.
    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<StockUpdate>;
}

fn quantity_out_of_range() -> AppError {
    AppError::validation("quantity out of range")
}

/// Escapes LIKE metacharacters so user input matches literally.
fn like_pattern(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('%');
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Clone)]
pub struct PgSweetStore {
    db: PgPool,
}

impl PgSweetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SweetStore for PgSweetStore {
    async fn insert(&self, new: NewSweet) -> AppResult<Sweet> {
        let sweet = sqlx::query_as::<_, Sweet>(
            r#"
            INSERT INTO sweets (id, name, category, price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, category, price, quantity, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.category)
        .bind(new.price)
        .bind(new.quantity)
        .fetch_one(&self.db)
        .await?;
        Ok(sweet)
    }

    async fn list(&self) -> AppResult<Vec<Sweet>> {
        let rows = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, created_at, updated_at
            FROM sweets
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn search(&self, filter: &SweetFilter) -> AppResult<Vec<Sweet>> {
        let rows = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, created_at, updated_at
            FROM sweets
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND ($2::text IS NULL OR category ILIKE $2)
              AND ($3::float8 IS NULL OR price >= $3)
              AND ($4::float8 IS NULL OR price <= $4)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(filter.name.as_deref().map(like_pattern))
        .bind(filter.category.as_deref().map(like_pattern))
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Sweet>> {
        let row = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, created_at, updated_at
            FROM sweets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: SweetPatch) -> AppResult<Option<Sweet>> {
        let row = sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets
               SET name = COALESCE($2, name),
                   category = COALESCE($3, category),
                   price = COALESCE($4, price),
                   quantity = COALESCE($5, quantity),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, name, category, price, quantity, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.category)
        .bind(patch.price)
        .bind(patch.quantity)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Sweet>> {
        let row = sqlx::query_as::<_, Sweet>(
            r#"
            DELETE FROM sweets
             WHERE id = $1
            RETURNING id, name, category, price, quantity, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<StockUpdate> {
        let row = sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets
               SET quantity = quantity + $2,
                   updated_at = now()
             WHERE id = $1 AND quantity + $2 >= 0
            RETURNING id, name, category, price, quantity, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            // 22003: numeric_value_out_of_range
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some("22003") {
                    return quantity_out_of_range();
                }
            }
            AppError::from(e)
        })?;

        if let Some(sweet) = row {
            return Ok(StockUpdate::Applied(sweet));
        }
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sweets WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(if exists {
            StockUpdate::Insufficient
        } else {
            StockUpdate::NotFound
        })
    }
}

/// Process-local sweet store for tests and database-less runs.
#[derive(Default)]
pub struct MemorySweetStore {
    sweets: RwLock<Vec<Sweet>>,
}

#[async_trait]
impl SweetStore for MemorySweetStore {
    async fn insert(&self, new: NewSweet) -> AppResult<Sweet> {
        let now = OffsetDateTime::now_utc();
        let sweet = Sweet {
            id: Uuid::new_v4(),
            name: new.name,
            category: new.category,
            price: new.price,
            quantity: new.quantity,
            created_at: now,
            updated_at: now,
        };
        self.sweets.write().await.push(sweet.clone());
        Ok(sweet)
    }

    async fn list(&self) -> AppResult<Vec<Sweet>> {
        Ok(self.sweets.read().await.clone())
    }

    async fn search(&self, filter: &SweetFilter) -> AppResult<Vec<Sweet>> {
        let sweets = self.sweets.read().await;
        Ok(sweets.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Sweet>> {
        let sweets = self.sweets.read().await;
        Ok(sweets.iter().find(|s| s.id == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: SweetPatch) -> AppResult<Option<Sweet>> {
        let mut sweets = self.sweets.write().await;
        let Some(sweet) = sweets.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            sweet.name = name;
        }
        if let Some(category) = patch.category {
            sweet.category = category;
        }
        if let Some(price) = patch.price {
            sweet.price = price;
        }
        if let Some(quantity) = patch.quantity {
            sweet.quantity = quantity;
        }
        sweet.updated_at = OffsetDateTime::now_utc();
        Ok(Some(sweet.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Sweet>> {
        let mut sweets = self.sweets.write().await;
        Ok(sweets
            .iter()
            .position(|s| s.id == id)
            .map(|idx| sweets.remove(idx)))
    }

    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<StockUpdate> {
        let mut sweets = self.sweets.write().await;
        let Some(sweet) = sweets.iter_mut().find(|s| s.id == id) else {
            return Ok(StockUpdate::NotFound);
        };
        let next = sweet
            .quantity
            .checked_add(delta)
            .ok_or_else(quantity_out_of_range)?;
        if next < 0 {
            return Ok(StockUpdate::Insufficient);
        }
        sweet.quantity = next;
        sweet.updated_at = OffsetDateTime::now_utc();
        Ok(StockUpdate::Applied(sweet.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candy(quantity: i32) -> NewSweet {
        NewSweet {
            name: "Candy".into(),
            category: "Hard Candy".into(),
            price: 2.99,
            quantity,
        }
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("choc"), "%choc%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[tokio::test]
    async fn memory_store_keeps_insertion_order() {
        let store = MemorySweetStore::default();
        let a = store.insert(candy(1)).await.unwrap();
        let b = store.insert(candy(2)).await.unwrap();
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn memory_store_partial_update_keeps_other_fields() {
        let store = MemorySweetStore::default();
        let sweet = store.insert(candy(5)).await.unwrap();
        let updated = store
            .update(
                sweet.id,
                SweetPatch {
                    price: Some(3.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, 3.5);
        assert_eq!(updated.name, sweet.name);
        assert_eq!(updated.quantity, 5);
        assert!(updated.updated_at >= sweet.updated_at);
        assert!(store
            .update(Uuid::new_v4(), SweetPatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn memory_store_adjust_has_a_floor() {
        let store = MemorySweetStore::default();
        let sweet = store.insert(candy(1)).await.unwrap();

        assert_eq!(
            store.adjust_quantity(sweet.id, -2).await.unwrap(),
            StockUpdate::Insufficient
        );
        match store.adjust_quantity(sweet.id, -1).await.unwrap() {
            StockUpdate::Applied(s) => assert_eq!(s.quantity, 0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            store.adjust_quantity(Uuid::new_v4(), 1).await.unwrap(),
            StockUpdate::NotFound
        );
    }

    #[tokio::test]
    async fn memory_store_adjust_rejects_overflow() {
        let store = MemorySweetStore::default();
        let sweet = store.insert(candy(i32::MAX)).await.unwrap();
        let err = store.adjust_quantity(sweet.id, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.find(sweet.id).await.unwrap().unwrap().quantity, i32::MAX);
    }

    #[tokio::test]
    async fn memory_store_delete_returns_prior_state() {
        let store = MemorySweetStore::default();
        let sweet = store.insert(candy(3)).await.unwrap();
        assert_eq!(store.delete(sweet.id).await.unwrap(), Some(sweet.clone()));
        assert!(store.find(sweet.id).await.unwrap().is_none());
        assert!(store.delete(sweet.id).await.unwrap().is_none());
    }
}

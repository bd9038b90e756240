//! Partner repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::projekt::row_to_item;
use super::{like_pattern, windowed_sql};
use crate::db::DbPool;
use crate::models::{ListWindow, Partner, PartnerInput, SelectItem, SortColumns};

const SELECT: &str = r#"
    SELECT p.id, p.naziv, p.oib, p.adresa, p.email, p.vrsta_partnera_id,
           v.naziv AS vrsta_partnera
    FROM partner p
    JOIN vrsta_partnera v ON v.id = p.vrsta_partnera_id
"#;

pub const SORT: SortColumns =
    SortColumns::new("p.id", &["p.naziv", "p.oib", "v.naziv", "p.adresa", "p.email"]);

/// Partner repository trait
#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Partner>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Partner>>;

    async fn create(&self, input: &PartnerInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &PartnerInput) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Substring match on name or OIB
    async fn search(&self, term: &str, limit: i64) -> Result<Vec<SelectItem>>;
}

pub struct SqlxPartnerRepository {
    pool: DbPool,
}

impl SqlxPartnerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PartnerRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PartnerRepository for SqlxPartnerRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM partner")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count partners")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Partner>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list partners")?;

        Ok(rows.iter().map(row_to_partner).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Partner>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get partner by ID")?;

        Ok(row.as_ref().map(row_to_partner))
    }

    async fn create(&self, input: &PartnerInput) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO partner (naziv, oib, adresa, email, vrsta_partnera_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.naziv)
        .bind(&input.oib)
        .bind(&input.adresa)
        .bind(&input.email)
        .bind(input.vrsta_partnera_id)
        .execute(&self.pool)
        .await
        .context("Failed to create partner")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &PartnerInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE partner
            SET naziv = ?, oib = ?, adresa = ?, email = ?, vrsta_partnera_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.naziv)
        .bind(&input.oib)
        .bind(&input.adresa)
        .bind(&input.email)
        .bind(input.vrsta_partnera_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update partner")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM partner WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete partner")?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, term: &str, limit: i64) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, naziv || ' (' || oib || ')' AS label
            FROM partner
            WHERE naziv LIKE ?1 ESCAPE '\' OR oib LIKE ?1 ESCAPE '\'
            ORDER BY label
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search partners")?;

        Ok(rows.iter().map(row_to_item).collect())
    }
}

fn row_to_partner(row: &sqlx::sqlite::SqliteRow) -> Partner {
    Partner {
        id: row.get("id"),
        naziv: row.get("naziv"),
        oib: row.get("oib"),
        adresa: row.get("adresa"),
        email: row.get("email"),
        vrsta_partnera_id: row.get("vrsta_partnera_id"),
        vrsta_partnera: row.get("vrsta_partnera"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{lookup_id, migrated_pool};

    #[tokio::test]
    async fn test_crud_and_search() {
        let pool = migrated_pool().await;
        let vrsta = lookup_id(&pool, "vrsta_partnera").await;
        let repo = SqlxPartnerRepository::new(pool);

        let input = PartnerInput {
            naziv: "Građevina d.o.o.".to_string(),
            oib: "12345678903".to_string(),
            adresa: None,
            email: None,
            vrsta_partnera_id: vrsta,
        };
        let id = repo.create(&input).await.unwrap();
        let partner = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(partner.oib, "12345678903");
        assert!(!partner.vrsta_partnera.is_empty());

        let found = repo.search("5678", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Građevina d.o.o. (12345678903)");

        assert!(repo.create(&input).await.is_err());

        assert!(repo.delete(id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_partner() {
        let pool = migrated_pool().await;
        let vrsta = lookup_id(&pool, "vrsta_partnera").await;
        let repo = SqlxPartnerRepository::new(pool);

        let input = PartnerInput {
            naziv: "X".to_string(),
            oib: "12345678903".to_string(),
            adresa: None,
            email: None,
            vrsta_partnera_id: vrsta,
        };
        assert!(!repo.update(999, &input).await.unwrap());
    }
}

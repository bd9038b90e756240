//! Change request repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::projekt::row_to_item;
use super::windowed_sql;
use crate::db::DbPool;
use crate::models::{ListWindow, SelectItem, SortColumns, Zahtjev, ZahtjevInput};

const SELECT: &str = r#"
    SELECT z.id, z.projekt_id, p.kratica AS projekt_kratica, z.vrsta_zahtjeva_id,
           v.naziv AS vrsta_zahtjeva, z.naslov, z.opis, z.prioritet, z.datum_podnosenja
    FROM zahtjev z
    JOIN projekt p ON p.id = z.projekt_id
    JOIN vrsta_zahtjeva v ON v.id = z.vrsta_zahtjeva_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "z.id",
    &[
        "p.kratica",
        "z.naslov",
        "v.naziv",
        "z.prioritet",
        "z.datum_podnosenja",
        "z.opis",
    ],
);

#[async_trait]
pub trait ZahtjevRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Zahtjev>>;

    /// Requests of one project, most urgent first
    async fn list_by_projekt(&self, projekt_id: i64) -> Result<Vec<Zahtjev>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Zahtjev>>;

    /// Title match within a project; titles are not unique across projects
    async fn get_by_naslov(&self, projekt_id: i64, naslov: &str) -> Result<Option<Zahtjev>>;

    async fn create(&self, input: &ZahtjevInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &ZahtjevInput) -> Result<bool>;

    /// Tasks of the request are removed with it
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All requests as "KRATICA: naslov"
    async fn options(&self) -> Result<Vec<SelectItem>>;
}

pub struct SqlxZahtjevRepository {
    pool: DbPool,
}

impl SqlxZahtjevRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn ZahtjevRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ZahtjevRepository for SqlxZahtjevRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM zahtjev")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count requests")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Zahtjev>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list requests")?;

        Ok(rows.iter().map(row_to_zahtjev).collect())
    }

    async fn list_by_projekt(&self, projekt_id: i64) -> Result<Vec<Zahtjev>> {
        let rows = sqlx::query(&format!(
            "{} WHERE z.projekt_id = ? ORDER BY z.prioritet, z.datum_podnosenja, z.id",
            SELECT
        ))
        .bind(projekt_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list requests by project")?;

        Ok(rows.iter().map(row_to_zahtjev).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Zahtjev>> {
        let row = sqlx::query(&format!("{} WHERE z.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get request by ID")?;

        Ok(row.as_ref().map(row_to_zahtjev))
    }

    async fn get_by_naslov(&self, projekt_id: i64, naslov: &str) -> Result<Option<Zahtjev>> {
        let row = sqlx::query(&format!(
            "{} WHERE z.projekt_id = ? AND z.naslov = ? COLLATE NOCASE ORDER BY z.id LIMIT 1",
            SELECT
        ))
        .bind(projekt_id)
        .bind(naslov.trim())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get request by title")?;

        Ok(row.as_ref().map(row_to_zahtjev))
    }

    async fn create(&self, input: &ZahtjevInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO zahtjev (projekt_id, vrsta_zahtjeva_id, naslov, opis, prioritet, datum_podnosenja)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.projekt_id)
        .bind(input.vrsta_zahtjeva_id)
        .bind(&input.naslov)
        .bind(&input.opis)
        .bind(input.prioritet)
        .bind(input.datum_podnosenja)
        .execute(&self.pool)
        .await
        .context("Failed to create request")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &ZahtjevInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE zahtjev
            SET projekt_id = ?, vrsta_zahtjeva_id = ?, naslov = ?, opis = ?, prioritet = ?,
                datum_podnosenja = ?
            WHERE id = ?
            "#,
        )
        .bind(input.projekt_id)
        .bind(input.vrsta_zahtjeva_id)
        .bind(&input.naslov)
        .bind(&input.opis)
        .bind(input.prioritet)
        .bind(input.datum_podnosenja)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update request")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM zahtjev WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete request")?;

        Ok(result.rows_affected() > 0)
    }

    async fn options(&self) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(
            r#"
            SELECT z.id, p.kratica || ': ' || z.naslov AS label
            FROM zahtjev z
            JOIN projekt p ON p.id = z.projekt_id
            ORDER BY p.kratica, z.naslov
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list request options")?;

        Ok(rows.iter().map(row_to_item).collect())
    }
}

fn row_to_zahtjev(row: &sqlx::sqlite::SqliteRow) -> Zahtjev {
    Zahtjev {
        id: row.get("id"),
        projekt_id: row.get("projekt_id"),
        projekt_kratica: row.get("projekt_kratica"),
        vrsta_zahtjeva_id: row.get("vrsta_zahtjeva_id"),
        vrsta_zahtjeva: row.get("vrsta_zahtjeva"),
        naslov: row.get("naslov"),
        opis: row.get("opis"),
        prioritet: row.get("prioritet"),
        datum_podnosenja: row.get("datum_podnosenja"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{
        insert_projekt, insert_zahtjev, lookup_id, migrated_pool,
    };
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_crud_and_priority_order() {
        let pool = migrated_pool().await;
        let projekt_id = insert_projekt(&pool, "Portal", "PORT").await;
        let vrsta = lookup_id(&pool, "vrsta_zahtjeva").await;
        let repo = SqlxZahtjevRepository::new(pool);

        let mut input = ZahtjevInput {
            projekt_id,
            vrsta_zahtjeva_id: vrsta,
            naslov: "Prijava korisnika".to_string(),
            opis: None,
            prioritet: 4,
            datum_podnosenja: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        let id = repo.create(&input).await.unwrap();
        input.naslov = "Pad servera".to_string();
        input.prioritet = 1;
        repo.create(&input).await.unwrap();

        let list = repo.list_by_projekt(projekt_id).await.unwrap();
        assert_eq!(list[0].naslov, "Pad servera");
        assert_eq!(list[1].id, id);

        let found = repo
            .get_by_naslov(projekt_id, "prijava korisnika")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.label(), "PORT: Prijava korisnika");

        input.prioritet = 9;
        assert!(repo.update(id, &input).await.is_err());
    }

    #[tokio::test]
    async fn test_title_is_scoped_to_project() {
        let pool = migrated_pool().await;
        let first = insert_projekt(&pool, "Prvi", "P1").await;
        let second = insert_projekt(&pool, "Drugi", "P2").await;
        insert_zahtjev(&pool, first, "Izvještaj").await;
        let repo = SqlxZahtjevRepository::new(pool);

        assert!(repo
            .get_by_naslov(second, "Izvještaj")
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.options().await.unwrap()[0].label, "P1: Izvještaj");
    }

    #[tokio::test]
    async fn test_delete_cascades_tasks() {
        let pool = migrated_pool().await;
        let projekt_id = insert_projekt(&pool, "Portal", "PORT").await;
        let zahtjev_id = insert_zahtjev(&pool, projekt_id, "Izvoz").await;
        let status = lookup_id(&pool, "status").await;
        sqlx::query(
            "INSERT INTO zadatak (zahtjev_id, status_id, naziv, planirani_pocetak) VALUES (?, ?, 'Analiza', '2024-02-02')",
        )
        .bind(zahtjev_id)
        .bind(status)
        .execute(&pool)
        .await
        .unwrap();
        let repo = SqlxZahtjevRepository::new(pool.clone());

        assert!(repo.delete(zahtjev_id).await.unwrap());
        let row = sqlx::query("SELECT COUNT(*) AS count FROM zadatak")
            .fetch_one(&pool)
            .await
            .unwrap();
        let count: i64 = row.get("count");
        assert_eq!(count, 0);
    }
}

//! Project documentation repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::windowed_sql;
use crate::db::DbPool;
use crate::models::{Dokumentacija, DokumentacijaInput, ListWindow, SortColumns};

const SELECT: &str = r#"
    SELECT d.id, d.projekt_id, p.kratica AS projekt_kratica, d.vrsta_dok_id,
           v.naziv AS vrsta_dok, d.naziv, d.datum, d.putanja
    FROM dokumentacija d
    JOIN projekt p ON p.id = d.projekt_id
    JOIN vrsta_dokumentacije v ON v.id = d.vrsta_dok_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "d.id",
    &["p.kratica", "d.naziv", "v.naziv", "d.datum", "d.putanja"],
);

#[async_trait]
pub trait DokumentacijaRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Dokumentacija>>;

    async fn list_by_projekt(&self, projekt_id: i64) -> Result<Vec<Dokumentacija>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Dokumentacija>>;

    async fn create(&self, input: &DokumentacijaInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &DokumentacijaInput) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxDokumentacijaRepository {
    pool: DbPool,
}

impl SqlxDokumentacijaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn DokumentacijaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DokumentacijaRepository for SqlxDokumentacijaRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM dokumentacija")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count documents")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Dokumentacija>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list documents")?;

        Ok(rows.iter().map(row_to_dokumentacija).collect())
    }

    async fn list_by_projekt(&self, projekt_id: i64) -> Result<Vec<Dokumentacija>> {
        let rows = sqlx::query(&format!(
            "{} WHERE d.projekt_id = ? ORDER BY d.datum DESC, d.id",
            SELECT
        ))
        .bind(projekt_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list documents by project")?;

        Ok(rows.iter().map(row_to_dokumentacija).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Dokumentacija>> {
        let row = sqlx::query(&format!("{} WHERE d.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get document by ID")?;

        Ok(row.as_ref().map(row_to_dokumentacija))
    }

    async fn create(&self, input: &DokumentacijaInput) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO dokumentacija (projekt_id, vrsta_dok_id, naziv, datum, putanja) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(input.projekt_id)
        .bind(input.vrsta_dok_id)
        .bind(&input.naziv)
        .bind(input.datum)
        .bind(&input.putanja)
        .execute(&self.pool)
        .await
        .context("Failed to create document")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &DokumentacijaInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dokumentacija
            SET projekt_id = ?, vrsta_dok_id = ?, naziv = ?, datum = ?, putanja = ?
            WHERE id = ?
            "#,
        )
        .bind(input.projekt_id)
        .bind(input.vrsta_dok_id)
        .bind(&input.naziv)
        .bind(input.datum)
        .bind(&input.putanja)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update document")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dokumentacija WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete document")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_dokumentacija(row: &sqlx::sqlite::SqliteRow) -> Dokumentacija {
    Dokumentacija {
        id: row.get("id"),
        projekt_id: row.get("projekt_id"),
        projekt_kratica: row.get("projekt_kratica"),
        vrsta_dok_id: row.get("vrsta_dok_id"),
        vrsta_dok: row.get("vrsta_dok"),
        naziv: row.get("naziv"),
        datum: row.get("datum"),
        putanja: row.get("putanja"),
    }
}

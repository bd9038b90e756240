//! Project repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::{like_pattern, windowed_sql};
use crate::db::DbPool;
use crate::models::{ListWindow, Projekt, ProjektInput, SelectItem, SortColumns};

const SELECT: &str = r#"
    SELECT p.id, p.naziv, p.kratica, p.opis, p.datum_pocetka, p.datum_zavrsetka,
           p.vrsta_projekta_id, v.naziv AS vrsta_projekta
    FROM projekt p
    JOIN vrsta_projekta v ON v.id = p.vrsta_projekta_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "p.id",
    &[
        "p.naziv",
        "p.kratica",
        "v.naziv",
        "p.datum_pocetka",
        "p.datum_zavrsetka",
        "p.opis",
    ],
);

/// Project repository trait
#[async_trait]
pub trait ProjektRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Projekt>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Projekt>>;

    async fn get_by_kratica(&self, kratica: &str) -> Result<Option<Projekt>>;

    async fn create(&self, input: &ProjektInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &ProjektInput) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// All projects as "KRATICA - naziv", ordered by kratica
    async fn options(&self) -> Result<Vec<SelectItem>>;

    /// Case-insensitive substring match on naziv or kratica
    async fn search(&self, term: &str, limit: i64) -> Result<Vec<SelectItem>>;
}

pub struct SqlxProjektRepository {
    pool: DbPool,
}

impl SqlxProjektRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn ProjektRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProjektRepository for SqlxProjektRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM projekt")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count projects")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Projekt>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list projects")?;

        Ok(rows.iter().map(row_to_projekt).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Projekt>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get project by ID")?;

        Ok(row.as_ref().map(row_to_projekt))
    }

    async fn get_by_kratica(&self, kratica: &str) -> Result<Option<Projekt>> {
        let row = sqlx::query(&format!("{} WHERE p.kratica = ?", SELECT))
            .bind(kratica.trim())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get project by code")?;

        Ok(row.as_ref().map(row_to_projekt))
    }

    async fn create(&self, input: &ProjektInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO projekt (naziv, kratica, opis, datum_pocetka, datum_zavrsetka, vrsta_projekta_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.naziv)
        .bind(&input.kratica)
        .bind(&input.opis)
        .bind(input.datum_pocetka)
        .bind(input.datum_zavrsetka)
        .bind(input.vrsta_projekta_id)
        .execute(&self.pool)
        .await
        .context("Failed to create project")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &ProjektInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projekt
            SET naziv = ?, kratica = ?, opis = ?, datum_pocetka = ?, datum_zavrsetka = ?,
                vrsta_projekta_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.naziv)
        .bind(&input.kratica)
        .bind(&input.opis)
        .bind(input.datum_pocetka)
        .bind(input.datum_zavrsetka)
        .bind(input.vrsta_projekta_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update project")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // dokumentacija rows go with the project (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM projekt WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected() > 0)
    }

    async fn options(&self) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(
            "SELECT id, kratica || ' - ' || naziv AS label FROM projekt ORDER BY kratica",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list project options")?;

        Ok(rows.iter().map(row_to_item).collect())
    }

    async fn search(&self, term: &str, limit: i64) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kratica || ' - ' || naziv AS label
            FROM projekt
            WHERE naziv LIKE ?1 ESCAPE '\' OR kratica LIKE ?1 ESCAPE '\'
            ORDER BY label
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search projects")?;

        Ok(rows.iter().map(row_to_item).collect())
    }
}

fn row_to_projekt(row: &sqlx::sqlite::SqliteRow) -> Projekt {
    Projekt {
        id: row.get("id"),
        naziv: row.get("naziv"),
        kratica: row.get("kratica"),
        opis: row.get("opis"),
        datum_pocetka: row.get("datum_pocetka"),
        datum_zavrsetka: row.get("datum_zavrsetka"),
        vrsta_projekta_id: row.get("vrsta_projekta_id"),
        vrsta_projekta: row.get("vrsta_projekta"),
    }
}

pub(crate) fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> SelectItem {
    SelectItem {
        id: row.get("id"),
        label: row.get("label"),
    }
}

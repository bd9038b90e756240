//! Job assignment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::windowed_sql;
use crate::db::DbPool;
use crate::models::{ListWindow, Posao, PosaoInput, SortColumns};

const SELECT: &str = r#"
    SELECT j.id, j.projekt_id, p.kratica AS projekt_kratica,
           j.osoba_id, o.prezime || ' ' || o.ime AS osoba, o.oib AS osoba_oib,
           j.uloga_id, u.naziv AS uloga, j.vrsta_posla_id, v.naziv AS vrsta_posla,
           j.opis, j.satnica, j.datum_od, j.datum_do
    FROM posao j
    JOIN projekt p ON p.id = j.projekt_id
    JOIN osoba o ON o.id = j.osoba_id
    JOIN uloga u ON u.id = j.uloga_id
    JOIN vrsta_posla v ON v.id = j.vrsta_posla_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "j.id",
    &[
        "p.kratica",
        "o.prezime || ' ' || o.ime",
        "o.oib",
        "u.naziv",
        "v.naziv",
        "j.satnica",
        "j.datum_od",
        "j.datum_do",
        "j.opis",
    ],
);

/// Job repository trait
#[async_trait]
pub trait PosaoRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Posao>>;

    /// Jobs of one project, newest start date first
    async fn list_by_projekt(&self, projekt_id: i64) -> Result<Vec<Posao>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Posao>>;

    async fn create(&self, input: &PosaoInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &PosaoInput) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxPosaoRepository {
    pool: DbPool,
}

impl SqlxPosaoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PosaoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PosaoRepository for SqlxPosaoRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posao")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count jobs")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Posao>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list jobs")?;

        Ok(rows.iter().map(row_to_posao).collect())
    }

    async fn list_by_projekt(&self, projekt_id: i64) -> Result<Vec<Posao>> {
        let rows = sqlx::query(&format!(
            "{} WHERE j.projekt_id = ? ORDER BY j.datum_od DESC, j.id",
            SELECT
        ))
        .bind(projekt_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list jobs by project")?;

        Ok(rows.iter().map(row_to_posao).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Posao>> {
        let row = sqlx::query(&format!("{} WHERE j.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get job by ID")?;

        Ok(row.as_ref().map(row_to_posao))
    }

    async fn create(&self, input: &PosaoInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO posao (projekt_id, osoba_id, uloga_id, vrsta_posla_id, opis, satnica, datum_od, datum_do)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.projekt_id)
        .bind(input.osoba_id)
        .bind(input.uloga_id)
        .bind(input.vrsta_posla_id)
        .bind(&input.opis)
        .bind(input.satnica)
        .bind(input.datum_od)
        .bind(input.datum_do)
        .execute(&self.pool)
        .await
        .context("Failed to create job")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &PosaoInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posao
            SET projekt_id = ?, osoba_id = ?, uloga_id = ?, vrsta_posla_id = ?, opis = ?,
                satnica = ?, datum_od = ?, datum_do = ?
            WHERE id = ?
            "#,
        )
        .bind(input.projekt_id)
        .bind(input.osoba_id)
        .bind(input.uloga_id)
        .bind(input.vrsta_posla_id)
        .bind(&input.opis)
        .bind(input.satnica)
        .bind(input.datum_od)
        .bind(input.datum_do)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update job")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posao WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete job")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_posao(row: &sqlx::sqlite::SqliteRow) -> Posao {
    Posao {
        id: row.get("id"),
        projekt_id: row.get("projekt_id"),
        projekt_kratica: row.get("projekt_kratica"),
        osoba_id: row.get("osoba_id"),
        osoba: row.get("osoba"),
        osoba_oib: row.get("osoba_oib"),
        uloga_id: row.get("uloga_id"),
        uloga: row.get("uloga"),
        vrsta_posla_id: row.get("vrsta_posla_id"),
        vrsta_posla: row.get("vrsta_posla"),
        opis: row.get("opis"),
        satnica: row.get("satnica"),
        datum_od: row.get("datum_od"),
        datum_do: row.get("datum_do"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{
        insert_osoba, insert_projekt, lookup_id, migrated_pool,
    };
    use chrono::NaiveDate;

    async fn setup() -> (DbPool, SqlxPosaoRepository, PosaoInput) {
        let pool = migrated_pool().await;
        let projekt_id = insert_projekt(&pool, "Portal", "PORT").await;
        let osoba_id = insert_osoba(&pool, "Ana", "Horvat", "69435151530").await;
        let input = PosaoInput {
            projekt_id,
            osoba_id,
            uloga_id: lookup_id(&pool, "uloga").await,
            vrsta_posla_id: lookup_id(&pool, "vrsta_posla").await,
            opis: None,
            satnica: 2_500,
            datum_od: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            datum_do: None,
        };
        (pool.clone(), SqlxPosaoRepository::new(pool), input)
    }

    #[tokio::test]
    async fn test_create_with_joined_names() {
        let (_pool, repo, input) = setup().await;
        let id = repo.create(&input).await.unwrap();

        let posao = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(posao.projekt_kratica, "PORT");
        assert_eq!(posao.osoba, "Horvat Ana");
        assert_eq!(posao.osoba_oib, "69435151530");
        assert_eq!(posao.satnica, 2_500);
    }

    #[tokio::test]
    async fn test_list_by_projekt() {
        let (pool, repo, input) = setup().await;
        repo.create(&input).await.unwrap();
        let other = insert_projekt(&pool, "Drugi", "DR").await;
        let mut elsewhere = input.clone();
        elsewhere.projekt_id = other;
        repo.create(&elsewhere).await.unwrap();

        assert_eq!(repo.list_by_projekt(input.projekt_id).await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_project_with_jobs_cannot_be_deleted() {
        let (pool, repo, input) = setup().await;
        repo.create(&input).await.unwrap();

        let result = sqlx::query("DELETE FROM projekt WHERE id = ?")
            .bind(input.projekt_id)
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let (_pool, repo, mut input) = setup().await;
        input.datum_do = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(repo.create(&input).await.is_err());
    }
}

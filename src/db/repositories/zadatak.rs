//! Task repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::windowed_sql;
use crate::db::DbPool;
use crate::models::{ListWindow, SortColumns, Zadatak, ZadatakInput};

// the assignee is optional, hence the LEFT JOIN
const SELECT: &str = r#"
    SELECT t.id, t.zahtjev_id, z.naslov AS zahtjev_naslov, p.kratica AS projekt_kratica,
           t.status_id, s.naziv AS status, t.osoba_id,
           o.prezime || ' ' || o.ime AS osoba, o.oib AS osoba_oib,
           t.naziv, t.opis, t.planirani_pocetak, t.planirani_kraj, t.stvarni_kraj
    FROM zadatak t
    JOIN zahtjev z ON z.id = t.zahtjev_id
    JOIN projekt p ON p.id = z.projekt_id
    JOIN status s ON s.id = t.status_id
    LEFT JOIN osoba o ON o.id = t.osoba_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "t.id",
    &[
        "p.kratica",
        "z.naslov",
        "t.naziv",
        "s.naziv",
        "o.prezime || ' ' || o.ime",
        "o.oib",
        "t.planirani_pocetak",
        "t.planirani_kraj",
        "t.stvarni_kraj",
        "t.opis",
    ],
);

#[async_trait]
pub trait ZadatakRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Zadatak>>;

    /// Tasks of one request in planned order
    async fn list_by_zahtjev(&self, zahtjev_id: i64) -> Result<Vec<Zadatak>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Zadatak>>;

    async fn create(&self, input: &ZadatakInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &ZadatakInput) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxZadatakRepository {
    pool: DbPool,
}

impl SqlxZadatakRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn ZadatakRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ZadatakRepository for SqlxZadatakRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM zadatak")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count tasks")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Zadatak>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tasks")?;

        Ok(rows.iter().map(row_to_zadatak).collect())
    }

    async fn list_by_zahtjev(&self, zahtjev_id: i64) -> Result<Vec<Zadatak>> {
        let rows = sqlx::query(&format!(
            "{} WHERE t.zahtjev_id = ? ORDER BY t.planirani_pocetak, t.id",
            SELECT
        ))
        .bind(zahtjev_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tasks by request")?;

        Ok(rows.iter().map(row_to_zadatak).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Zadatak>> {
        let row = sqlx::query(&format!("{} WHERE t.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get task by ID")?;

        Ok(row.as_ref().map(row_to_zadatak))
    }

    async fn create(&self, input: &ZadatakInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO zadatak (zahtjev_id, status_id, osoba_id, naziv, opis, planirani_pocetak,
                                 planirani_kraj, stvarni_kraj)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.zahtjev_id)
        .bind(input.status_id)
        .bind(input.osoba_id)
        .bind(&input.naziv)
        .bind(&input.opis)
        .bind(input.planirani_pocetak)
        .bind(input.planirani_kraj)
        .bind(input.stvarni_kraj)
        .execute(&self.pool)
        .await
        .context("Failed to create task")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &ZadatakInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE zadatak
            SET zahtjev_id = ?, status_id = ?, osoba_id = ?, naziv = ?, opis = ?,
                planirani_pocetak = ?, planirani_kraj = ?, stvarni_kraj = ?
            WHERE id = ?
            "#,
        )
        .bind(input.zahtjev_id)
        .bind(input.status_id)
        .bind(input.osoba_id)
        .bind(&input.naziv)
        .bind(&input.opis)
        .bind(input.planirani_pocetak)
        .bind(input.planirani_kraj)
        .bind(input.stvarni_kraj)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update task")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM zadatak WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete task")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_zadatak(row: &sqlx::sqlite::SqliteRow) -> Zadatak {
    Zadatak {
        id: row.get("id"),
        zahtjev_id: row.get("zahtjev_id"),
        zahtjev_naslov: row.get("zahtjev_naslov"),
        projekt_kratica: row.get("projekt_kratica"),
        status_id: row.get("status_id"),
        status: row.get("status"),
        osoba_id: row.get("osoba_id"),
        osoba: row.get("osoba"),
        osoba_oib: row.get("osoba_oib"),
        naziv: row.get("naziv"),
        opis: row.get("opis"),
        planirani_pocetak: row.get("planirani_pocetak"),
        planirani_kraj: row.get("planirani_kraj"),
        stvarni_kraj: row.get("stvarni_kraj"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{
        insert_osoba, insert_projekt, insert_zahtjev, lookup_id, migrated_pool,
    };
    use chrono::NaiveDate;

    async fn setup() -> (DbPool, SqlxZadatakRepository, ZadatakInput) {
        let pool = migrated_pool().await;
        let projekt_id = insert_projekt(&pool, "Portal", "PORT").await;
        let zahtjev_id = insert_zahtjev(&pool, projekt_id, "Izvoz podataka").await;
        let input = ZadatakInput {
            zahtjev_id,
            status_id: lookup_id(&pool, "status").await,
            osoba_id: None,
            naziv: "Analiza".to_string(),
            opis: None,
            planirani_pocetak: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            planirani_kraj: NaiveDate::from_ymd_opt(2024, 3, 10),
            stvarni_kraj: None,
        };
        (pool.clone(), SqlxZadatakRepository::new(pool), input)
    }

    #[tokio::test]
    async fn test_unassigned_task() {
        let (_pool, repo, input) = setup().await;
        let id = repo.create(&input).await.unwrap();

        let zadatak = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(zadatak.osoba_id, None);
        assert_eq!(zadatak.osoba, None);
        assert_eq!(zadatak.zahtjev_naslov, "Izvoz podataka");
        assert_eq!(zadatak.projekt_kratica, "PORT");
    }

    #[tokio::test]
    async fn test_assign_and_list_by_request() {
        let (pool, repo, mut input) = setup().await;
        let id = repo.create(&input).await.unwrap();

        input.osoba_id = Some(insert_osoba(&pool, "Ana", "Horvat", "69435151530").await);
        input.stvarni_kraj = NaiveDate::from_ymd_opt(2024, 3, 8);
        assert!(repo.update(id, &input).await.unwrap());

        let list = repo.list_by_zahtjev(input.zahtjev_id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].osoba.as_deref(), Some("Horvat Ana"));
        assert_eq!(list[0].osoba_oib.as_deref(), Some("69435151530"));

        let all = repo.list(&ListWindow::all(5, true)).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_finish_before_start_rejected() {
        let (_pool, repo, mut input) = setup().await;
        input.stvarni_kraj = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(repo.create(&input).await.is_err());
    }

    #[tokio::test]
    async fn test_assigned_person_cannot_be_deleted() {
        let (pool, repo, mut input) = setup().await;
        let osoba = insert_osoba(&pool, "Ana", "Horvat", "69435151530").await;
        input.osoba_id = Some(osoba);
        repo.create(&input).await.unwrap();

        let result = sqlx::query("DELETE FROM osoba WHERE id = ?")
            .bind(osoba)
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }
}

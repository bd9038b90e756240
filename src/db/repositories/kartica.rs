//! Project card repository
//!
//! A card's `stanje` is the opening balance plus every transaction booked
//! against it. Editing the opening balance shifts `stanje` by the same
//! difference, and the shift is refused if the balance would go negative.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::projekt::row_to_item;
use super::{windowed_sql, BalanceChange};
use crate::db::DbPool;
use crate::models::{Kartica, KarticaInput, ListWindow, SelectItem, SortColumns};

const SELECT: &str = r#"
    SELECT k.id, k.projekt_id, p.kratica AS projekt_kratica, k.broj, k.banka,
           k.pocetno_stanje, k.stanje
    FROM kartica k
    JOIN projekt p ON p.id = k.projekt_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "k.id",
    &["k.broj", "p.kratica", "k.banka", "k.pocetno_stanje", "k.stanje"],
);

#[async_trait]
pub trait KarticaRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Kartica>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Kartica>>;

    /// The card of a project, if it has one
    async fn get_by_projekt(&self, projekt_id: i64) -> Result<Option<Kartica>>;

    async fn get_by_broj(&self, broj: &str) -> Result<Option<Kartica>>;

    /// Opens the card with `stanje` equal to the opening balance
    async fn create(&self, input: &KarticaInput) -> Result<i64>;

    /// `Applied(false)` if no card has this id
    async fn update(&self, id: i64, input: &KarticaInput) -> Result<BalanceChange<bool>>;

    /// Transactions of the card are removed with it
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All cards as "BROJ (KRATICA)"
    async fn options(&self) -> Result<Vec<SelectItem>>;
}

pub struct SqlxKarticaRepository {
    pool: DbPool,
}

impl SqlxKarticaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn KarticaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl KarticaRepository for SqlxKarticaRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM kartica")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count cards")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Kartica>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list cards")?;

        Ok(rows.iter().map(row_to_kartica).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Kartica>> {
        let row = sqlx::query(&format!("{} WHERE k.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get card by ID")?;

        Ok(row.as_ref().map(row_to_kartica))
    }

    async fn get_by_projekt(&self, projekt_id: i64) -> Result<Option<Kartica>> {
        let row = sqlx::query(&format!("{} WHERE k.projekt_id = ?", SELECT))
            .bind(projekt_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get card by project")?;

        Ok(row.as_ref().map(row_to_kartica))
    }

    async fn get_by_broj(&self, broj: &str) -> Result<Option<Kartica>> {
        let row = sqlx::query(&format!("{} WHERE k.broj = ?", SELECT))
            .bind(broj.trim())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get card by number")?;

        Ok(row.as_ref().map(row_to_kartica))
    }

    async fn create(&self, input: &KarticaInput) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO kartica (projekt_id, broj, banka, pocetno_stanje, stanje) VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(input.projekt_id)
        .bind(&input.broj)
        .bind(&input.banka)
        .bind(input.pocetno_stanje)
        .execute(&self.pool)
        .await
        .context("Failed to create card")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &KarticaInput) -> Result<BalanceChange<bool>> {
        // right-hand sides see the old row, so `stanje` shifts by new - old opening balance
        let result = sqlx::query(
            r#"
            UPDATE kartica
            SET projekt_id = ?1, broj = ?2, banka = ?3,
                stanje = stanje + (?4 - pocetno_stanje), pocetno_stanje = ?4
            WHERE id = ?5 AND stanje + (?4 - pocetno_stanje) >= 0
              AND typeof(stanje + (?4 - pocetno_stanje)) = 'integer'
            "#,
        )
        .bind(input.projekt_id)
        .bind(&input.broj)
        .bind(&input.banka)
        .bind(input.pocetno_stanje)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update card")?;

        if result.rows_affected() > 0 {
            return Ok(BalanceChange::Applied(true));
        }

        let row = sqlx::query("SELECT pocetno_stanje, stanje FROM kartica WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read card balance")?;

        let Some(row) = row else {
            return Ok(BalanceChange::Applied(false));
        };
        let pocetno: i64 = row.get("pocetno_stanje");
        let balance: i64 = row.get("stanje");
        let requested = pocetno
            .checked_sub(input.pocetno_stanje)
            .filter(|shift| balance.checked_sub(*shift).is_some())
            .context("Card balance out of range")?;
        if balance >= requested {
            bail!("Card {} balance out of range", id);
        }
        Ok(BalanceChange::Insufficient { balance, requested })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kartica WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete card")?;

        Ok(result.rows_affected() > 0)
    }

    async fn options(&self) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(
            r#"
            SELECT k.id, k.broj || ' (' || p.kratica || ')' AS label
            FROM kartica k
            JOIN projekt p ON p.id = k.projekt_id
            ORDER BY p.kratica
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list card options")?;

        Ok(rows.iter().map(row_to_item).collect())
    }
}

fn row_to_kartica(row: &sqlx::sqlite::SqliteRow) -> Kartica {
    Kartica {
        id: row.get("id"),
        projekt_id: row.get("projekt_id"),
        projekt_kratica: row.get("projekt_kratica"),
        broj: row.get("broj"),
        banka: row.get("banka"),
        pocetno_stanje: row.get("pocetno_stanje"),
        stanje: row.get("stanje"),
    }
}

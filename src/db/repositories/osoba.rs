//! Person repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::projekt::row_to_item;
use super::{like_pattern, windowed_sql};
use crate::db::DbPool;
use crate::models::{ListWindow, Osoba, OsobaInput, SelectItem, SortColumns};

const SELECT: &str = "SELECT id, ime, prezime, oib, email, telefon FROM osoba";

const LABEL: &str = "prezime || ' ' || ime || ' (' || oib || ')'";

pub const SORT: SortColumns =
    SortColumns::new("id", &["ime", "prezime", "oib", "email", "telefon"]);

/// Person repository trait
#[async_trait]
pub trait OsobaRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Osoba>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Osoba>>;

    async fn get_by_oib(&self, oib: &str) -> Result<Option<Osoba>>;

    async fn create(&self, input: &OsobaInput) -> Result<i64>;

    async fn update(&self, id: i64, input: &OsobaInput) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// All people as "Prezime Ime (OIB)"
    async fn options(&self) -> Result<Vec<SelectItem>>;

    /// Substring match on first name, last name or OIB
    async fn search(&self, term: &str, limit: i64) -> Result<Vec<SelectItem>>;
}

pub struct SqlxOsobaRepository {
    pool: DbPool,
}

impl SqlxOsobaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn OsobaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl OsobaRepository for SqlxOsobaRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM osoba")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count people")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Osoba>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list people")?;

        Ok(rows.iter().map(row_to_osoba).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Osoba>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get person by ID")?;

        Ok(row.as_ref().map(row_to_osoba))
    }

    async fn get_by_oib(&self, oib: &str) -> Result<Option<Osoba>> {
        let row = sqlx::query(&format!("{} WHERE oib = ?", SELECT))
            .bind(oib.trim())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get person by OIB")?;

        Ok(row.as_ref().map(row_to_osoba))
    }

    async fn create(&self, input: &OsobaInput) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO osoba (ime, prezime, oib, email, telefon) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.ime)
        .bind(&input.prezime)
        .bind(&input.oib)
        .bind(&input.email)
        .bind(&input.telefon)
        .execute(&self.pool)
        .await
        .context("Failed to create person")?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, input: &OsobaInput) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE osoba SET ime = ?, prezime = ?, oib = ?, email = ?, telefon = ? WHERE id = ?",
        )
        .bind(&input.ime)
        .bind(&input.prezime)
        .bind(&input.oib)
        .bind(&input.email)
        .bind(&input.telefon)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update person")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM osoba WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete person")?;

        Ok(result.rows_affected() > 0)
    }

    async fn options(&self) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(&format!(
            "SELECT id, {} AS label FROM osoba ORDER BY prezime, ime, id",
            LABEL
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list person options")?;

        Ok(rows.iter().map(row_to_item).collect())
    }

    async fn search(&self, term: &str, limit: i64) -> Result<Vec<SelectItem>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, {} AS label
            FROM osoba
            WHERE ime LIKE ?1 ESCAPE '\' OR prezime LIKE ?1 ESCAPE '\' OR oib LIKE ?1 ESCAPE '\'
            ORDER BY label
            LIMIT ?2
            "#,
            LABEL
        ))
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search people")?;

        Ok(rows.iter().map(row_to_item).collect())
    }
}

fn row_to_osoba(row: &sqlx::sqlite::SqliteRow) -> Osoba {
    Osoba {
        id: row.get("id"),
        ime: row.get("ime"),
        prezime: row.get("prezime"),
        oib: row.get("oib"),
        email: row.get("email"),
        telefon: row.get("telefon"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn input(ime: &str, prezime: &str, oib: &str) -> OsobaInput {
        OsobaInput {
            ime: ime.to_string(),
            prezime: prezime.to_string(),
            oib: oib.to_string(),
            email: None,
            telefon: None,
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let repo = SqlxOsobaRepository::new(migrated_pool().await);
        let id = repo
            .create(&input("Ana", "Horvat", "69435151530"))
            .await
            .unwrap();

        let osoba = repo.get_by_oib("69435151530").await.unwrap().unwrap();
        assert_eq!(osoba.id, id);

        let mut changed = input("Ana", "Kovač", "69435151530");
        changed.email = Some("ana@example.com".to_string());
        assert!(repo.update(id, &changed).await.unwrap());
        let osoba = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(osoba.prezime, "Kovač");
        assert_eq!(osoba.email.as_deref(), Some("ana@example.com"));

        assert!(repo.delete(id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_oib() {
        let repo = SqlxOsobaRepository::new(migrated_pool().await);
        repo.create(&input("Ana", "Horvat", "69435151530"))
            .await
            .unwrap();
        assert!(repo
            .create(&input("Ivo", "Ivić", "69435151530"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_search_by_name_and_oib() {
        let repo = SqlxOsobaRepository::new(migrated_pool().await);
        repo.create(&input("Ana", "Horvat", "69435151530"))
            .await
            .unwrap();
        repo.create(&input("Ivo", "Babić", "12345678903"))
            .await
            .unwrap();

        let found = repo.search("horv", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Horvat Ana (69435151530)");

        let found = repo.search("123456", 10).await.unwrap();
        assert_eq!(found.len(), 1);

        let options = repo.options().await.unwrap();
        assert_eq!(options[0].label, "Babić Ivo (12345678903)");
    }
}

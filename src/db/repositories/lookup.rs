//! Lookup repository
//!
//! One implementation serves all eight lookup tables. The table name comes
//! from `LookupKind`, never from user input.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::windowed_sql;
use crate::db::DbPool;
use crate::models::{ListWindow, Lookup, LookupInput, LookupKind, SortColumns};

pub const SORT: SortColumns = SortColumns::new("id", &["naziv"]);

/// Lookup repository trait
#[async_trait]
pub trait LookupRepository: Send + Sync {
    async fn count(&self, kind: LookupKind) -> Result<i64>;

    async fn list(&self, kind: LookupKind, window: &ListWindow) -> Result<Vec<Lookup>>;

    async fn get_by_id(&self, kind: LookupKind, id: i64) -> Result<Option<Lookup>>;

    /// Case-insensitive match on `naziv`
    async fn get_by_naziv(&self, kind: LookupKind, naziv: &str) -> Result<Option<Lookup>>;

    async fn create(&self, kind: LookupKind, input: &LookupInput) -> Result<i64>;

    /// Returns false if no row has this id
    async fn update(&self, kind: LookupKind, id: i64, input: &LookupInput) -> Result<bool>;

    /// Returns false if no row has this id
    async fn delete(&self, kind: LookupKind, id: i64) -> Result<bool>;
}

/// SQLx-based lookup repository implementation
pub struct SqlxLookupRepository {
    pool: DbPool,
}

impl SqlxLookupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn LookupRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LookupRepository for SqlxLookupRepository {
    async fn count(&self, kind: LookupKind) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", kind.table()))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", kind.table()))?;
        Ok(row.get("count"))
    }

    async fn list(&self, kind: LookupKind, window: &ListWindow) -> Result<Vec<Lookup>> {
        let sql = windowed_sql(
            &format!("SELECT id, naziv FROM {}", kind.table()),
            &SORT,
            window,
        );
        let rows = sqlx::query(&sql)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {}", kind.table()))?;

        Ok(rows.iter().map(row_to_lookup).collect())
    }

    async fn get_by_id(&self, kind: LookupKind, id: i64) -> Result<Option<Lookup>> {
        let row = sqlx::query(&format!("SELECT id, naziv FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get {} by ID", kind.table()))?;

        Ok(row.as_ref().map(row_to_lookup))
    }

    async fn get_by_naziv(&self, kind: LookupKind, naziv: &str) -> Result<Option<Lookup>> {
        let row = sqlx::query(&format!(
            "SELECT id, naziv FROM {} WHERE naziv = ? COLLATE NOCASE",
            kind.table()
        ))
        .bind(naziv.trim())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to get {} by name", kind.table()))?;

        Ok(row.as_ref().map(row_to_lookup))
    }

    async fn create(&self, kind: LookupKind, input: &LookupInput) -> Result<i64> {
        let result = sqlx::query(&format!("INSERT INTO {} (naziv) VALUES (?)", kind.table()))
            .bind(&input.naziv)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create {}", kind.table()))?;
        Ok(result.last_insert_rowid())
    }

    async fn update(&self, kind: LookupKind, id: i64, input: &LookupInput) -> Result<bool> {
        let result = sqlx::query(&format!("UPDATE {} SET naziv = ? WHERE id = ?", kind.table()))
            .bind(&input.naziv)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update {}", kind.table()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, kind: LookupKind, id: i64) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {}", kind.table()))?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_lookup(row: &sqlx::sqlite::SqliteRow) -> Lookup {
    Lookup {
        id: row.get("id"),
        naziv: row.get("naziv"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_projekt, migrated_pool};

    fn input(naziv: &str) -> LookupInput {
        LookupInput {
            naziv: naziv.to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let repo = SqlxLookupRepository::new(migrated_pool().await);
        let kind = LookupKind::Uloga;

        let before = repo.count(kind).await.unwrap();
        let id = repo.create(kind, &input("Tester")).await.unwrap();
        assert_eq!(repo.count(kind).await.unwrap(), before + 1);

        let found = repo.get_by_id(kind, id).await.unwrap().unwrap();
        assert_eq!(found.naziv, "Tester");

        assert!(repo.update(kind, id, &input("Ispitivač")).await.unwrap());
        let found = repo.get_by_id(kind, id).await.unwrap().unwrap();
        assert_eq!(found.naziv, "Ispitivač");

        assert!(repo.delete(kind, id).await.unwrap());
        assert!(repo.get_by_id(kind, id).await.unwrap().is_none());
        assert!(!repo.delete(kind, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_kinds_are_separate_tables() {
        let repo = SqlxLookupRepository::new(migrated_pool().await);
        repo.create(LookupKind::Status, &input("Blokiran")).await.unwrap();

        assert!(repo
            .get_by_naziv(LookupKind::Status, "blokiran")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_by_naziv(LookupKind::Uloga, "Blokiran")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_sorted_and_windowed() {
        let repo = SqlxLookupRepository::new(migrated_pool().await);
        let kind = LookupKind::VrstaPosla;

        let all = repo.list(kind, &ListWindow::all(1, true)).await.unwrap();
        let names: Vec<&str> = all.iter().map(|l| l.naziv.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let window = ListWindow {
            sort: 1,
            ascending: false,
            limit: 2,
            offset: 1,
        };
        let page = repo.list(kind, &window).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].naziv, all[all.len() - 2].naziv);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = SqlxLookupRepository::new(migrated_pool().await);
        let result = repo.create(LookupKind::Uloga, &input("VODITELJ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_referenced_row_fails() {
        let pool = migrated_pool().await;
        insert_projekt(&pool, "Projekt", "PR").await;
        let repo = SqlxLookupRepository::new(pool);

        let vrsta = repo
            .list(LookupKind::VrstaProjekta, &ListWindow::all(1, true))
            .await
            .unwrap();
        let mut any_failed = false;
        for row in vrsta {
            if repo.delete(LookupKind::VrstaProjekta, row.id).await.is_err() {
                any_failed = true;
            }
        }
        assert!(any_failed);
    }
}

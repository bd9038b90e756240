//! Lookup service
//!
//! Every form with a select reads whole lookup tables, so the full list of
//! each kind is cached under `lookup:<table>`. Writes to a kind drop its
//! cached entries.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult};
use super::import::RowImporter;
use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::LookupRepository;
use crate::models::{ListWindow, Lookup, LookupForm, LookupKind, SelectItem};
use crate::reports::{ImportRow, Tabular};

pub struct LookupService {
    repo: Arc<dyn LookupRepository>,
    cache: Arc<MemoryCache>,
}

impl LookupService {
    pub fn new(repo: Arc<dyn LookupRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn count(&self, kind: LookupKind) -> ServiceResult<i64> {
        Ok(self.repo.count(kind).await?)
    }

    pub async fn list(&self, kind: LookupKind, window: &ListWindow) -> ServiceResult<Vec<Lookup>> {
        Ok(self.repo.list(kind, window).await?)
    }

    /// Every row of the kind ordered by name, served from cache when possible
    pub async fn all(&self, kind: LookupKind) -> ServiceResult<Vec<Lookup>> {
        let key = kind.cache_key();
        if let Ok(Some(cached)) = self.cache.get::<Vec<Lookup>>(&key).await {
            return Ok(cached);
        }

        let rows = self.repo.list(kind, &ListWindow::all(1, true)).await?;
        if let Err(e) = self.cache.set(&key, &rows, self.cache.default_ttl()).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(rows)
    }

    pub async fn options(&self, kind: LookupKind) -> ServiceResult<Vec<SelectItem>> {
        Ok(self
            .all(kind)
            .await?
            .into_iter()
            .map(|l| SelectItem::new(l.id, l.naziv))
            .collect())
    }

    /// Id of the row whose name matches, ignoring case
    pub async fn resolve(&self, kind: LookupKind, naziv: &str) -> ServiceResult<Option<i64>> {
        let wanted = naziv.trim().to_lowercase();
        Ok(self
            .all(kind)
            .await?
            .into_iter()
            .find(|l| l.naziv.to_lowercase() == wanted)
            .map(|l| l.id))
    }

    pub async fn get(&self, kind: LookupKind, id: i64) -> ServiceResult<Lookup> {
        self.repo
            .get_by_id(kind, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} s ID-om {} ne postoji", kind.label(), id)))
    }

    /// SQLite's NOCASE folds ASCII only, so names like "Šef" and "šef" are compared here
    async fn ensure_unique(&self, kind: LookupKind, naziv: &str, except: Option<i64>) -> ServiceResult<()> {
        let wanted = naziv.to_lowercase();
        let taken = self
            .all(kind)
            .await?
            .iter()
            .any(|l| Some(l.id) != except && l.naziv.to_lowercase() == wanted);
        if taken {
            return Err(ServiceError::Conflict(format!(
                "{} '{}' već postoji",
                kind.label(),
                naziv
            )));
        }
        Ok(())
    }

    pub async fn create(&self, kind: LookupKind, form: &LookupForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.ensure_unique(kind, &input.naziv, None).await?;
        let id = self
            .repo
            .create(kind, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;

        self.invalidate(kind).await;
        tracing::info!(table = kind.table(), id, "Lookup created");
        Ok(id)
    }

    pub async fn update(&self, kind: LookupKind, id: i64, form: &LookupForm) -> ServiceResult<()> {
        let input = form.validate()?;
        self.ensure_unique(kind, &input.naziv, Some(id)).await?;
        let updated = self
            .repo
            .update(kind, id, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        if !updated {
            return Err(ServiceError::NotFound(format!(
                "{} s ID-om {} ne postoji",
                kind.label(),
                id
            )));
        }

        self.invalidate(kind).await;
        tracing::info!(table = kind.table(), id, "Lookup updated");
        Ok(())
    }

    pub async fn delete(&self, kind: LookupKind, id: i64) -> ServiceResult<()> {
        let in_use = format!("{} se koristi i ne može se obrisati", kind.label());
        let deleted = self
            .repo
            .delete(kind, id)
            .await
            .map_err(|e| on_delete(e, &in_use))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!(
                "{} s ID-om {} ne postoji",
                kind.label(),
                id
            )));
        }

        self.invalidate(kind).await;
        tracing::info!(table = kind.table(), id, "Lookup deleted");
        Ok(())
    }

    async fn invalidate(&self, kind: LookupKind) {
        let pattern = format!("{}*", kind.cache_key());
        if let Err(e) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!("Failed to invalidate {}: {}", pattern, e);
        }
    }

    /// Importer for one kind
    pub fn importer(self: &Arc<Self>, kind: LookupKind) -> LookupImporter {
        LookupImporter {
            service: Arc::clone(self),
            kind,
        }
    }
}

pub struct LookupImporter {
    service: Arc<LookupService>,
    kind: LookupKind,
}

#[async_trait]
impl RowImporter for LookupImporter {
    fn required(&self) -> &'static [&'static str] {
        Lookup::COLUMNS
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let form = LookupForm {
            naziv: row.get("Naziv").to_string(),
        };
        self.service.create(self.kind, &form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::test_support::{insert_projekt, migrated_pool};
    use crate::db::repositories::SqlxLookupRepository;
    use crate::db::DbPool;

    async fn service() -> (DbPool, Arc<MemoryCache>, LookupService) {
        let pool = migrated_pool().await;
        let cache = Arc::new(MemoryCache::new());
        let service = LookupService::new(SqlxLookupRepository::boxed(pool.clone()), cache.clone());
        (pool, cache, service)
    }

    fn form(naziv: &str) -> LookupForm {
        LookupForm {
            naziv: naziv.to_string(),
        }
    }

    #[tokio::test]
    async fn test_all_is_cached_and_invalidated() {
        let (_pool, cache, service) = service().await;
        let kind = LookupKind::Uloga;

        let before = service.all(kind).await.unwrap();
        let cached: Option<Vec<Lookup>> = cache.get(&kind.cache_key()).await.unwrap();
        assert_eq!(cached, Some(before.clone()));

        service.create(kind, &form("Arhitekt")).await.unwrap();
        let cached: Option<Vec<Lookup>> = cache.get(&kind.cache_key()).await.unwrap();
        assert!(cached.is_none());

        let after = service.all(kind).await.unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[0].naziv, "Arhitekt");
    }

    #[tokio::test]
    async fn test_resolve_ignores_case() {
        let (_pool, _cache, service) = service().await;
        let id = service.resolve(LookupKind::Status, "u TIJEKU").await.unwrap();
        assert!(id.is_some());
        assert_eq!(service.resolve(LookupKind::Status, "Nepoznat").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_validation_and_duplicates() {
        let (_pool, _cache, service) = service().await;
        let kind = LookupKind::VrstaPosla;

        assert!(matches!(
            service.create(kind, &form("   ")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.create(kind, &form("razvoj")).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_croatian_letters_compare_without_case() {
        let (_pool, _cache, service) = service().await;
        let kind = LookupKind::Uloga;

        let sef = service.create(kind, &form("Šef gradilišta")).await.unwrap();
        assert!(matches!(
            service.create(kind, &form("šef gradilišta")).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.create(kind, &form("ŠEF GRADILIŠTA")).await,
            Err(ServiceError::Conflict(_))
        ));

        let other = service.create(kind, &form("Čuvar")).await.unwrap();
        assert!(matches!(
            service.update(kind, other, &form("šef Gradilišta")).await,
            Err(ServiceError::Conflict(_))
        ));

        // renaming a row to a different case of its own name is allowed
        service.update(kind, sef, &form("ŠEF gradilišta")).await.unwrap();
        assert_eq!(service.get(kind, sef).await.unwrap().naziv, "ŠEF gradilišta");
        assert_eq!(
            service.resolve(kind, "šef gradilišta").await.unwrap(),
            Some(sef)
        );
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let (_pool, _cache, service) = service().await;
        let kind = LookupKind::Uloga;

        assert!(matches!(service.get(kind, 999).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            service.update(kind, 999, &form("X")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(service.delete(kind, 999).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_referenced_row_is_in_use() {
        let (pool, _cache, service) = service().await;
        insert_projekt(&pool, "Portal", "PORT").await;
        let kind = LookupKind::VrstaProjekta;
        let first = service.all(kind).await.unwrap();
        let used = first.iter().map(|l| l.id).min().unwrap();

        assert!(matches!(service.delete(kind, used).await, Err(ServiceError::InUse(_))));
    }
}

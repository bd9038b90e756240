//! Partner service

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult, UniqueMessages};
use super::import::{Keys, RowImporter};
use super::{LookupService, SEARCH_LIMIT};
use crate::db::repositories::PartnerRepository;
use crate::models::{ListWindow, LookupKind, Partner, PartnerForm, PartnerInput, SelectItem};
use crate::reports::ImportRow;

const UNIQUE: UniqueMessages = &[("partner.oib", "Partner s tim OIB-om već postoji")];

pub struct PartnerService {
    repo: Arc<dyn PartnerRepository>,
    lookups: Arc<LookupService>,
}

impl PartnerService {
    pub fn new(repo: Arc<dyn PartnerRepository>, lookups: Arc<LookupService>) -> Self {
        Self { repo, lookups }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Partner>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Partner> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Partner s ID-om {} ne postoji", id)))
    }

    pub async fn search(&self, term: &str) -> ServiceResult<Vec<SelectItem>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search(term, SEARCH_LIMIT).await?)
    }

    pub async fn create(&self, form: &PartnerForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &PartnerInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        tracing::info!(id, "Partner created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &PartnerForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Partner s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Partner updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| on_delete(e, "Partner se koristi i ne može se obrisati"))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Partner s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Partner deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for PartnerService {
    fn required(&self) -> &'static [&'static str] {
        &["Naziv", "OIB", "Vrsta partnera"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = PartnerForm {
            naziv: row.get("Naziv").to_string(),
            oib: row.get("OIB").to_string(),
            adresa: row.get("Adresa").to_string(),
            email: row.get("Email").to_string(),
            vrsta_partnera_id: keys
                .lookup(&self.lookups, LookupKind::VrstaPartnera, "vrsta_partnera_id")
                .await?,
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{lookup_id, migrated_pool};
    use crate::db::DbPool;
    use crate::services::test_support::services;

    async fn form(pool: &DbPool, naziv: &str, oib: &str) -> PartnerForm {
        PartnerForm {
            naziv: naziv.to_string(),
            oib: oib.to_string(),
            adresa: "Ilica 1, Zagreb".to_string(),
            email: "ured@firma.hr".to_string(),
            vrsta_partnera_id: lookup_id(pool, "vrsta_partnera").await.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let pool = migrated_pool().await;
        let service = services(&pool).partneri;

        let id = service
            .create(&form(&pool, "Firma d.o.o.", "12345678903").await)
            .await
            .unwrap();
        assert_eq!(service.get(id).await.unwrap().vrsta_partnera, "Naručitelj");

        service
            .update(id, &form(&pool, "Firma j.d.o.o.", "12345678903").await)
            .await
            .unwrap();
        assert_eq!(service.get(id).await.unwrap().naziv, "Firma j.d.o.o.");

        service.delete(id).await.unwrap();
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_oib_is_conflict() {
        let pool = migrated_pool().await;
        let service = services(&pool).partneri;
        service
            .create(&form(&pool, "Prva", "12345678903").await)
            .await
            .unwrap();

        let result = service.create(&form(&pool, "Druga", "12345678903").await).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_bad_email_rejected() {
        let pool = migrated_pool().await;
        let service = services(&pool).partneri;
        let mut bad = form(&pool, "Firma", "12345678903").await;
        bad.email = "nije-adresa".to_string();

        match service.create(&bad).await {
            Err(ServiceError::Validation(errors)) => assert!(errors.has("email")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search() {
        let pool = migrated_pool().await;
        let service = services(&pool).partneri;
        service
            .create(&form(&pool, "Firma d.o.o.", "12345678903").await)
            .await
            .unwrap();

        let found = service.search("firma").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Firma d.o.o. (12345678903)");
    }
}

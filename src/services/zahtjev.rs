//! Request service

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult};
use super::import::{Keys, RowImporter};
use super::LookupService;
use crate::db::repositories::{ProjektRepository, ZadatakRepository, ZahtjevRepository};
use crate::models::{
    ListWindow, LookupKind, SelectItem, Zadatak, Zahtjev, ZahtjevForm, ZahtjevInput,
};
use crate::reports::ImportRow;

/// A request with its tasks
#[derive(Debug, Clone)]
pub struct ZahtjevDetail {
    pub zahtjev: Zahtjev,
    pub zadaci: Vec<Zadatak>,
}

pub struct ZahtjevService {
    repo: Arc<dyn ZahtjevRepository>,
    zadaci: Arc<dyn ZadatakRepository>,
    projekti: Arc<dyn ProjektRepository>,
    lookups: Arc<LookupService>,
}

impl ZahtjevService {
    pub fn new(
        repo: Arc<dyn ZahtjevRepository>,
        zadaci: Arc<dyn ZadatakRepository>,
        projekti: Arc<dyn ProjektRepository>,
        lookups: Arc<LookupService>,
    ) -> Self {
        Self {
            repo,
            zadaci,
            projekti,
            lookups,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Zahtjev>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Zahtjev> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Zahtjev s ID-om {} ne postoji", id)))
    }

    pub async fn detail(&self, id: i64) -> ServiceResult<ZahtjevDetail> {
        let zahtjev = self.get(id).await?;
        let zadaci = self.zadaci.list_by_zahtjev(id).await?;
        Ok(ZahtjevDetail { zahtjev, zadaci })
    }

    pub async fn options(&self) -> ServiceResult<Vec<SelectItem>> {
        Ok(self.repo.options().await?)
    }

    pub async fn create(&self, form: &ZahtjevForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &ZahtjevInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        tracing::info!(id, projekt_id = input.projekt_id, "Zahtjev created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &ZahtjevForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Zahtjev s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Zahtjev updated");
        Ok(())
    }

    /// Tasks are deleted together with the request
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| on_delete(e, "Zahtjev se koristi i ne može se obrisati"))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Zahtjev s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Zahtjev deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for ZahtjevService {
    fn required(&self) -> &'static [&'static str] {
        &["Projekt", "Naslov", "Vrsta zahtjeva", "Prioritet", "Podnesen"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = ZahtjevForm {
            projekt_id: keys.projekt(self.projekti.as_ref(), "Projekt").await?,
            vrsta_zahtjeva_id: keys
                .lookup(&self.lookups, LookupKind::VrstaZahtjeva, "vrsta_zahtjeva_id")
                .await?,
            naslov: row.get("Naslov").to_string(),
            opis: row.get("Opis").to_string(),
            prioritet: row.get("Prioritet").to_string(),
            datum_podnosenja: row.get("Podnesen").to_string(),
            return_to: String::new(),
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_projekt, insert_zahtjev, migrated_pool};
    use crate::services::test_support::services;

    fn form(projekt_id: i64, naslov: &str, prioritet: &str) -> ZahtjevForm {
        ZahtjevForm {
            projekt_id: projekt_id.to_string(),
            vrsta_zahtjeva_id: "1".to_string(),
            naslov: naslov.to_string(),
            opis: String::new(),
            prioritet: prioritet.to_string(),
            datum_podnosenja: "10.02.2024".to_string(),
            return_to: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let pool = migrated_pool().await;
        let service = services(&pool).zahtjevi;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;

        let id = service.create(&form(projekt, "Prijava", "2")).await.unwrap();
        service
            .update(id, &form(projekt, "Prijava korisnika", "1"))
            .await
            .unwrap();

        let zahtjev = service.get(id).await.unwrap();
        assert_eq!(zahtjev.naslov, "Prijava korisnika");
        assert_eq!(zahtjev.prioritet, 1);
        assert_eq!(zahtjev.vrsta_zahtjeva, "Nova funkcionalnost");
    }

    #[tokio::test]
    async fn test_priority_out_of_range() {
        let pool = migrated_pool().await;
        let service = services(&pool).zahtjevi;
        match service.create(&form(1, "Prijava", "6")).await {
            Err(ServiceError::Validation(errors)) => assert!(errors.has("prioritet")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detail_and_cascade() {
        let pool = migrated_pool().await;
        let s = services(&pool);
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let zahtjev = insert_zahtjev(&pool, projekt, "Prijava").await;
        sqlx::query(
            "INSERT INTO zadatak (zahtjev_id, status_id, naziv, planirani_pocetak) VALUES (?, 1, 'Forma', '2024-02-02')",
        )
        .bind(zahtjev)
        .execute(&pool)
        .await
        .unwrap();

        let detail = s.zahtjevi.detail(zahtjev).await.unwrap();
        assert_eq!(detail.zadaci.len(), 1);

        s.zahtjevi.delete(zahtjev).await.unwrap();
        assert_eq!(s.zadaci.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_project_with_requests_cannot_be_deleted() {
        let pool = migrated_pool().await;
        let s = services(&pool);
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        insert_zahtjev(&pool, projekt, "Prijava").await;

        assert!(matches!(
            s.projekti.delete(projekt).await,
            Err(ServiceError::InUse(_))
        ));
    }
}

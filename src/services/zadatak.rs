//! Task service

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult};
use super::import::{Keys, RowImporter};
use super::LookupService;
use crate::db::repositories::{
    OsobaRepository, ProjektRepository, ZadatakRepository, ZahtjevRepository,
};
use crate::models::{ListWindow, LookupKind, Zadatak, ZadatakForm, ZadatakInput};
use crate::reports::ImportRow;

pub struct ZadatakService {
    repo: Arc<dyn ZadatakRepository>,
    zahtjevi: Arc<dyn ZahtjevRepository>,
    projekti: Arc<dyn ProjektRepository>,
    osobe: Arc<dyn OsobaRepository>,
    lookups: Arc<LookupService>,
}

impl ZadatakService {
    pub fn new(
        repo: Arc<dyn ZadatakRepository>,
        zahtjevi: Arc<dyn ZahtjevRepository>,
        projekti: Arc<dyn ProjektRepository>,
        osobe: Arc<dyn OsobaRepository>,
        lookups: Arc<LookupService>,
    ) -> Self {
        Self {
            repo,
            zahtjevi,
            projekti,
            osobe,
            lookups,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Zadatak>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Zadatak> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Zadatak s ID-om {} ne postoji", id)))
    }

    pub async fn create(&self, form: &ZadatakForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &ZadatakInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        tracing::info!(id, zahtjev_id = input.zahtjev_id, "Zadatak created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &ZadatakForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Zadatak s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Zadatak updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| on_delete(e, "Zadatak se koristi i ne može se obrisati"))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Zadatak s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Zadatak deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for ZadatakService {
    fn required(&self) -> &'static [&'static str] {
        &["Projekt", "Zahtjev", "Naziv", "Status", "Planirani početak"]
    }

    /// The assignee is matched by OIB; the "Osoba" name column is informative only
    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = ZadatakForm {
            zahtjev_id: keys
                .zahtjev(
                    self.projekti.as_ref(),
                    self.zahtjevi.as_ref(),
                    "Projekt",
                    "Zahtjev",
                )
                .await?,
            status_id: keys
                .lookup(&self.lookups, LookupKind::Status, "status_id")
                .await?,
            osoba_id: keys.osoba(self.osobe.as_ref(), "OIB osobe").await?,
            naziv: row.get("Naziv").to_string(),
            opis: row.get("Opis").to_string(),
            planirani_pocetak: row.get("Planirani početak").to_string(),
            planirani_kraj: row.get("Planirani kraj").to_string(),
            stvarni_kraj: row.get("Stvarni kraj").to_string(),
            return_to: String::new(),
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

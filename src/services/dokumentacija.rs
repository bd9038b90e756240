//! Documentation service

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult};
use super::import::{Keys, RowImporter};
use super::LookupService;
use crate::db::repositories::{DokumentacijaRepository, ProjektRepository};
use crate::models::{
    Dokumentacija, DokumentacijaForm, DokumentacijaInput, ListWindow, LookupKind,
};
use crate::reports::ImportRow;

pub struct DokumentacijaService {
    repo: Arc<dyn DokumentacijaRepository>,
    projekti: Arc<dyn ProjektRepository>,
    lookups: Arc<LookupService>,
}

impl DokumentacijaService {
    pub fn new(
        repo: Arc<dyn DokumentacijaRepository>,
        projekti: Arc<dyn ProjektRepository>,
        lookups: Arc<LookupService>,
    ) -> Self {
        Self {
            repo,
            projekti,
            lookups,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Dokumentacija>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Dokumentacija> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Dokumentacija s ID-om {} ne postoji", id))
        })
    }

    pub async fn create(&self, form: &DokumentacijaForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &DokumentacijaInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        tracing::info!(id, projekt_id = input.projekt_id, "Dokumentacija created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &DokumentacijaForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        if !updated {
            return Err(ServiceError::NotFound(format!(
                "Dokumentacija s ID-om {} ne postoji",
                id
            )));
        }
        tracing::info!(id, "Dokumentacija updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| on_delete(e, "Dokumentacija se koristi i ne može se obrisati"))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!(
                "Dokumentacija s ID-om {} ne postoji",
                id
            )));
        }
        tracing::info!(id, "Dokumentacija deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for DokumentacijaService {
    fn required(&self) -> &'static [&'static str] {
        &["Projekt", "Naziv", "Vrsta dokumentacije", "Datum"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = DokumentacijaForm {
            projekt_id: keys.projekt(self.projekti.as_ref(), "Projekt").await?,
            vrsta_dok_id: keys
                .lookup(&self.lookups, LookupKind::VrstaDok, "vrsta_dok_id")
                .await?,
            naziv: row.get("Naziv").to_string(),
            datum: row.get("Datum").to_string(),
            putanja: row.get("Putanja").to_string(),
            return_to: String::new(),
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

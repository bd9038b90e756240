//! Project service
//!
//! Besides plain CRUD this assembles the project detail page: its
//! documentation, its card and its jobs.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult, UniqueMessages};
use super::import::{Keys, RowImporter};
use super::{LookupService, SEARCH_LIMIT};
use crate::db::repositories::{
    DokumentacijaRepository, KarticaRepository, PosaoRepository, ProjektRepository,
};
use crate::models::{
    Dokumentacija, Kartica, ListWindow, LookupKind, Posao, Projekt, ProjektForm, ProjektInput,
    SelectItem,
};
use crate::reports::ImportRow;

const UNIQUE: UniqueMessages = &[
    ("projekt.naziv", "Projekt s tim nazivom već postoji"),
    ("projekt.kratica", "Projekt s tom kraticom već postoji"),
];

/// Everything the project detail page shows
#[derive(Debug, Clone)]
pub struct ProjektDetail {
    pub projekt: Projekt,
    pub dokumentacija: Vec<Dokumentacija>,
    pub kartica: Option<Kartica>,
    pub poslovi: Vec<Posao>,
}

pub struct ProjektService {
    repo: Arc<dyn ProjektRepository>,
    dokumentacija: Arc<dyn DokumentacijaRepository>,
    kartice: Arc<dyn KarticaRepository>,
    poslovi: Arc<dyn PosaoRepository>,
    lookups: Arc<LookupService>,
}

impl ProjektService {
    pub fn new(
        repo: Arc<dyn ProjektRepository>,
        dokumentacija: Arc<dyn DokumentacijaRepository>,
        kartice: Arc<dyn KarticaRepository>,
        poslovi: Arc<dyn PosaoRepository>,
        lookups: Arc<LookupService>,
    ) -> Self {
        Self {
            repo,
            dokumentacija,
            kartice,
            poslovi,
            lookups,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Projekt>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Projekt> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Projekt s ID-om {} ne postoji", id)))
    }

    pub async fn detail(&self, id: i64) -> ServiceResult<ProjektDetail> {
        let projekt = self.get(id).await?;
        let dokumentacija = self.dokumentacija.list_by_projekt(id).await?;
        let kartica = self.kartice.get_by_projekt(id).await?;
        let poslovi = self.poslovi.list_by_projekt(id).await?;

        Ok(ProjektDetail {
            projekt,
            dokumentacija,
            kartica,
            poslovi,
        })
    }

    pub async fn options(&self) -> ServiceResult<Vec<SelectItem>> {
        Ok(self.repo.options().await?)
    }

    /// Autocomplete on name and acronym
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<SelectItem>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search(term, SEARCH_LIMIT).await?)
    }

    pub async fn create(&self, form: &ProjektForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &ProjektInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        tracing::info!(id, kratica = %input.kratica, "Projekt created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &ProjektForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Projekt s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Projekt updated");
        Ok(())
    }

    /// Documentation goes with the project; jobs, a card or requests block the delete
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self.repo.delete(id).await.map_err(|e| {
            on_delete(
                e,
                "Projekt ima poslove, karticu ili zahtjeve i ne može se obrisati",
            )
        })?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Projekt s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Projekt deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for ProjektService {
    fn required(&self) -> &'static [&'static str] {
        &["Naziv", "Kratica", "Vrsta projekta", "Početak"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = ProjektForm {
            naziv: row.get("Naziv").to_string(),
            kratica: row.get("Kratica").to_string(),
            opis: row.get("Opis").to_string(),
            datum_pocetka: row.get("Početak").to_string(),
            datum_zavrsetka: row.get("Završetak").to_string(),
            vrsta_projekta_id: keys
                .lookup(&self.lookups, LookupKind::VrstaProjekta, "vrsta_projekta_id")
                .await?,
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

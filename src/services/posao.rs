//! Job service

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult};
use super::import::{Keys, RowImporter};
use super::LookupService;
use crate::db::repositories::{OsobaRepository, PosaoRepository, ProjektRepository};
use crate::models::{ListWindow, LookupKind, Posao, PosaoForm, PosaoInput};
use crate::reports::ImportRow;

pub struct PosaoService {
    repo: Arc<dyn PosaoRepository>,
    projekti: Arc<dyn ProjektRepository>,
    osobe: Arc<dyn OsobaRepository>,
    lookups: Arc<LookupService>,
}

impl PosaoService {
    pub fn new(
        repo: Arc<dyn PosaoRepository>,
        projekti: Arc<dyn ProjektRepository>,
        osobe: Arc<dyn OsobaRepository>,
        lookups: Arc<LookupService>,
    ) -> Self {
        Self {
            repo,
            projekti,
            osobe,
            lookups,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Posao>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Posao> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Posao s ID-om {} ne postoji", id)))
    }

    pub async fn create(&self, form: &PosaoForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &PosaoInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        tracing::info!(id, projekt_id = input.projekt_id, "Posao created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &PosaoForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Posao s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Posao updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| on_delete(e, "Posao se koristi i ne može se obrisati"))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Posao s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Posao deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for PosaoService {
    fn required(&self) -> &'static [&'static str] {
        &["Projekt", "OIB osobe", "Uloga", "Vrsta posla", "Satnica", "Od"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = PosaoForm {
            projekt_id: keys.projekt(self.projekti.as_ref(), "Projekt").await?,
            osoba_id: keys.osoba(self.osobe.as_ref(), "OIB osobe").await?,
            uloga_id: keys
                .lookup(&self.lookups, LookupKind::Uloga, "uloga_id")
                .await?,
            vrsta_posla_id: keys
                .lookup(&self.lookups, LookupKind::VrstaPosla, "vrsta_posla_id")
                .await?,
            opis: row.get("Opis").to_string(),
            satnica: row.get("Satnica").to_string(),
            datum_od: row.get("Od").to_string(),
            datum_do: row.get("Do").to_string(),
            return_to: String::new(),
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_osoba, insert_projekt, migrated_pool};
    use crate::reports::{to_xlsx, Report, Tabular};
    use crate::services::import::import_workbook;
    use crate::services::test_support::services;

    fn form(projekt_id: i64, osoba_id: i64, satnica: &str) -> PosaoForm {
        PosaoForm {
            projekt_id: projekt_id.to_string(),
            osoba_id: osoba_id.to_string(),
            uloga_id: "1".to_string(),
            vrsta_posla_id: "1".to_string(),
            opis: String::new(),
            satnica: satnica.to_string(),
            datum_od: "2024-01-01".to_string(),
            datum_do: String::new(),
            return_to: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_reads_joined_names() {
        let pool = migrated_pool().await;
        let service = services(&pool).poslovi;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let osoba = insert_osoba(&pool, "Ana", "Anić", "69435151530").await;

        let id = service.create(&form(projekt, osoba, "12,50")).await.unwrap();
        let posao = service.get(id).await.unwrap();
        assert_eq!(posao.projekt_kratica, "PORT");
        assert_eq!(posao.osoba, "Anić Ana");
        assert_eq!(posao.satnica, 1250);
    }

    #[tokio::test]
    async fn test_unknown_project_is_conflict() {
        let pool = migrated_pool().await;
        let service = services(&pool).poslovi;
        let osoba = insert_osoba(&pool, "Ana", "Anić", "69435151530").await;

        let result = service.create(&form(999, osoba, "10")).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_negative_rate_rejected() {
        let pool = migrated_pool().await;
        let service = services(&pool).poslovi;
        let result = service.create(&form(1, 1, "-5")).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_exported_jobs_import_again() {
        let pool = migrated_pool().await;
        let service = services(&pool).poslovi;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let osoba = insert_osoba(&pool, "Ana", "Anić", "69435151530").await;
        service.create(&form(projekt, osoba, "1.234,56")).await.unwrap();

        let rows = service.list(&ListWindow::all(1, true)).await.unwrap();
        let report = Report::from_rows("Poslovi", &rows);
        let bytes = to_xlsx(&report).unwrap();

        let summary = import_workbook(service.as_ref(), &bytes, 100).await.unwrap();
        assert_eq!((summary.added, summary.failed), (1, 0));

        let all = service.list(&ListWindow::all(1, true)).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.satnica == 123_456));
        assert_eq!(Posao::COLUMNS.len(), report.columns.len());
    }

    #[tokio::test]
    async fn test_import_unknown_oib() {
        let pool = migrated_pool().await;
        let service = services(&pool).poslovi;
        insert_projekt(&pool, "Portal", "PORT").await;

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let rows: [[&str; 6]; 2] = [
            ["Projekt", "OIB osobe", "Uloga", "Vrsta posla", "Satnica", "Od"],
            ["PORT", "98765432106", "Voditelj", "Razvoj", "10", "01.01.2024"],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        let bytes = workbook.save_to_buffer().unwrap();

        let summary = import_workbook(service.as_ref(), &bytes, 100).await.unwrap();
        assert_eq!(summary.failed, 1);
        let result = crate::reports::import::read_sheet(&summary.workbook, &[], 10).unwrap();
        assert_eq!(
            result.rows[0].get("Rezultat"),
            "OIB osobe: '98765432106' ne postoji"
        );
    }
}

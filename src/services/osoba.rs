//! Person service

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult, UniqueMessages};
use super::import::RowImporter;
use super::SEARCH_LIMIT;
use crate::db::repositories::OsobaRepository;
use crate::models::{ListWindow, Osoba, OsobaForm, OsobaInput, SelectItem};
use crate::reports::ImportRow;

const UNIQUE: UniqueMessages = &[("osoba.oib", "Osoba s tim OIB-om već postoji")];

pub struct OsobaService {
    repo: Arc<dyn OsobaRepository>,
}

impl OsobaService {
    pub fn new(repo: Arc<dyn OsobaRepository>) -> Self {
        Self { repo }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Osoba>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Osoba> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Osoba s ID-om {} ne postoji", id)))
    }

    pub async fn options(&self) -> ServiceResult<Vec<SelectItem>> {
        Ok(self.repo.options().await?)
    }

    /// Autocomplete on first name, last name and OIB
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<SelectItem>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search(term, SEARCH_LIMIT).await?)
    }

    pub async fn create(&self, form: &OsobaForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &OsobaInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        tracing::info!(id, "Osoba created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &OsobaForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let updated = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Osoba s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Osoba updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self.repo.delete(id).await.map_err(|e| {
            on_delete(e, "Osoba je zadužena na poslovima ili zadacima i ne može se obrisati")
        })?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Osoba s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Osoba deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for OsobaService {
    fn required(&self) -> &'static [&'static str] {
        &["Ime", "Prezime", "OIB"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let form = OsobaForm {
            ime: row.get("Ime").to_string(),
            prezime: row.get("Prezime").to_string(),
            oib: row.get("OIB").to_string(),
            email: row.get("Email").to_string(),
            telefon: row.get("Telefon").to_string(),
        };
        self.create(&form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_osoba, insert_projekt, migrated_pool};
    use crate::services::import::import_workbook;
    use crate::services::test_support::services;
    use rust_xlsxwriter::Workbook;

    fn form(ime: &str, prezime: &str, oib: &str) -> OsobaForm {
        OsobaForm {
            ime: ime.to_string(),
            prezime: prezime.to_string(),
            oib: oib.to_string(),
            email: String::new(),
            telefon: String::new(),
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let pool = migrated_pool().await;
        let service = services(&pool).osobe;

        let id = service.create(&form("Ana", "Anić", "69435151530")).await.unwrap();
        service
            .update(id, &form("Ana", "Horvat", "69435151530"))
            .await
            .unwrap();
        assert_eq!(service.get(id).await.unwrap().prezime, "Horvat");

        service.delete(id).await.unwrap();
        assert!(matches!(service.get(id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(service.delete(id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_oib_rejected() {
        let pool = migrated_pool().await;
        let service = services(&pool).osobe;

        match service.create(&form("Ana", "Anić", "12345678901")).await {
            Err(ServiceError::Validation(errors)) => assert!(errors.has("oib")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_oib_is_conflict() {
        let pool = migrated_pool().await;
        let service = services(&pool).osobe;
        insert_osoba(&pool, "Ana", "Anić", "69435151530").await;

        match service.create(&form("Iva", "Ivić", "69435151530")).await {
            Err(ServiceError::Conflict(msg)) => assert_eq!(msg, "Osoba s tim OIB-om već postoji"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_person_with_job_is_in_use() {
        let pool = migrated_pool().await;
        let service = services(&pool).osobe;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let osoba = insert_osoba(&pool, "Ana", "Anić", "69435151530").await;
        sqlx::query(
            "INSERT INTO posao (projekt_id, osoba_id, uloga_id, vrsta_posla_id, satnica, datum_od) VALUES (?, ?, 1, 1, 0, '2024-01-01')",
        )
        .bind(projekt)
        .bind(osoba)
        .execute(&pool)
        .await
        .unwrap();

        assert!(matches!(service.delete(osoba).await, Err(ServiceError::InUse(_))));
    }

    #[tokio::test]
    async fn test_search_limits_results() {
        let pool = migrated_pool().await;
        let service = services(&pool).osobe;
        let oibs = [
            "12345678903",
            "69435151530",
            "98765432106",
            "11111111119",
        ];
        for (i, oib) in oibs.iter().enumerate() {
            insert_osoba(&pool, &format!("Ime{}", i), "Perić", oib).await;
        }

        assert_eq!(service.search("perić").await.unwrap().len(), 4);
        assert!(service.search("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_reports_bad_rows() {
        let pool = migrated_pool().await;
        let service = services(&pool).osobe;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let rows: [[&str; 3]; 3] = [
            ["Ime", "Prezime", "OIB"],
            ["Ana", "Anić", "69435151530"],
            ["Iva", "Ivić", "123"],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        let bytes = workbook.save_to_buffer().unwrap();

        let summary = import_workbook(service.as_ref(), &bytes, 100).await.unwrap();
        assert_eq!((summary.added, summary.failed), (1, 1));
        assert_eq!(service.count().await.unwrap(), 1);
    }
}

//! Row-by-row Excel import
//!
//! Each entity service provides a `RowImporter`. `import_workbook` reads the
//! sheet, hands every row to it and collects one outcome per row; a failed
//! row never stops the rest.

use async_trait::async_trait;

use super::error::{ServiceError, ServiceResult};
use super::LookupService;
use crate::db::repositories::{
    KarticaRepository, OsobaRepository, ProjektRepository, ZahtjevRepository,
};
use crate::models::validation::normalize_iban;
use crate::models::{LookupKind, ValidationErrors};
use crate::reports::import::{read_sheet, write_result};
use crate::reports::{ImportRow, RowOutcome};

/// Imports single sheet rows of one entity
#[async_trait]
pub trait RowImporter: Send + Sync {
    /// Headers that must be present; other known headers are optional
    fn required(&self) -> &'static [&'static str];

    /// Validate and insert one row, returning the new id
    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64>;
}

/// Result of one import run
#[derive(Debug)]
pub struct ImportSummary {
    pub added: usize,
    pub failed: usize,
    /// Uploaded rows plus the `Rezultat` column
    pub workbook: Vec<u8>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!("Uvezeno redaka: {}, neuspješno: {}", self.added, self.failed)
    }
}

pub async fn import_workbook(
    importer: &dyn RowImporter,
    bytes: &[u8],
    max_rows: usize,
) -> ServiceResult<ImportSummary> {
    let sheet = read_sheet(bytes, importer.required(), max_rows)
        .map_err(|e| ServiceError::Validation(ValidationErrors::single("datoteka", e.to_string())))?;

    let mut outcomes = Vec::with_capacity(sheet.rows.len());
    for row in &sheet.rows {
        let outcome = match importer.import_row(row).await {
            Ok(id) => RowOutcome::Added(id),
            Err(ServiceError::Internal(e)) => {
                tracing::error!("Import of row {} failed: {:#}", row.line, e);
                RowOutcome::Failed("Greška pri spremanju".to_string())
            }
            Err(e) => RowOutcome::Failed(e.to_string()),
        };
        outcomes.push(outcome);
    }

    let added = outcomes.iter().filter(|o| o.is_added()).count();
    let failed = outcomes.len() - added;
    let workbook = write_result(&sheet, &outcomes)?;
    tracing::info!(added, failed, "Import finished");

    Ok(ImportSummary {
        added,
        failed,
        workbook,
    })
}

/// Resolves natural keys of an import row into the id strings a form posts
///
/// Unknown keys leave the field empty and record a message; `finish`
/// lets those messages replace the generic "required" ones.
pub struct Keys<'a> {
    row: &'a ImportRow,
    errors: ValidationErrors,
}

impl<'a> Keys<'a> {
    pub fn new(row: &'a ImportRow) -> Self {
        Self {
            row,
            errors: ValidationErrors::new(),
        }
    }

    fn record(&mut self, field: &str, column: &str, value: &str, found: Option<i64>) -> String {
        match found {
            Some(id) => id.to_string(),
            None => {
                self.errors
                    .add(field, format!("{}: '{}' ne postoji", column, value));
                String::new()
            }
        }
    }

    /// Lookup row by `naziv`; the column header is the kind's label
    pub async fn lookup(
        &mut self,
        lookups: &LookupService,
        kind: LookupKind,
        field: &str,
    ) -> ServiceResult<String> {
        let column = kind.label();
        let value = self.row.get(column);
        if value.is_empty() {
            return Ok(String::new());
        }
        let found = lookups.resolve(kind, value).await?;
        Ok(self.record(field, column, value, found))
    }

    pub async fn projekt(
        &mut self,
        repo: &dyn ProjektRepository,
        column: &str,
    ) -> ServiceResult<String> {
        let value = self.row.get(column);
        if value.is_empty() {
            return Ok(String::new());
        }
        let found = repo.get_by_kratica(value).await?.map(|p| p.id);
        Ok(self.record("projekt_id", column, value, found))
    }

    pub async fn osoba(
        &mut self,
        repo: &dyn OsobaRepository,
        column: &str,
    ) -> ServiceResult<String> {
        let value = self.row.get(column);
        if value.is_empty() {
            return Ok(String::new());
        }
        let found = repo.get_by_oib(value).await?.map(|o| o.id);
        Ok(self.record("osoba_id", column, value, found))
    }

    pub async fn kartica(
        &mut self,
        repo: &dyn KarticaRepository,
        column: &str,
    ) -> ServiceResult<String> {
        let value = self.row.get(column);
        if value.is_empty() {
            return Ok(String::new());
        }
        let found = repo.get_by_broj(&normalize_iban(value)).await?.map(|k| k.id);
        Ok(self.record("kartica_id", column, value, found))
    }

    /// Request by title within the project named in `projekt_column`
    pub async fn zahtjev(
        &mut self,
        projekti: &dyn ProjektRepository,
        zahtjevi: &dyn ZahtjevRepository,
        projekt_column: &str,
        column: &str,
    ) -> ServiceResult<String> {
        let value = self.row.get(column);
        if value.is_empty() {
            return Ok(String::new());
        }
        let kratica = self.row.get(projekt_column);
        let found = match projekti.get_by_kratica(kratica).await? {
            Some(projekt) => zahtjevi.get_by_naslov(projekt.id, value).await?.map(|z| z.id),
            None => None,
        };
        Ok(self.record("zahtjev_id", column, value, found))
    }

    pub fn finish<T>(self, validated: Result<T, ValidationErrors>) -> ServiceResult<T> {
        match validated {
            Ok(value) if self.errors.is_empty() => Ok(value),
            Ok(_) => Err(ServiceError::Validation(self.errors)),
            Err(mut errors) => {
                errors.override_with(self.errors);
                Err(ServiceError::Validation(errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::import::{ADDED, RESULT_COLUMN};
    use rust_xlsxwriter::Workbook;

    struct Numbers;

    #[async_trait]
    impl RowImporter for Numbers {
        fn required(&self) -> &'static [&'static str] {
            &["Broj"]
        }

        async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
            row.get("Broj").parse::<i64>().map_err(|_| {
                ServiceError::Validation(ValidationErrors::single("broj", "Broj: nije broj"))
            })
        }
    }

    fn workbook(rows: &[&str]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, value) in rows.iter().enumerate() {
            worksheet.write_string(r as u32, 0, *value).unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }

    #[tokio::test]
    async fn test_each_row_gets_an_outcome() {
        let bytes = workbook(&["Broj", "1", "x", "3"]);
        let summary = import_workbook(&Numbers, &bytes, 10).await.unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.message(), "Uvezeno redaka: 2, neuspješno: 1");

        let result = read_sheet(&summary.workbook, &[RESULT_COLUMN], 10).unwrap();
        assert_eq!(result.rows[0].get(RESULT_COLUMN), ADDED);
        assert_eq!(result.rows[1].get(RESULT_COLUMN), "Broj: nije broj");
    }

    #[tokio::test]
    async fn test_missing_header_rejects_file() {
        let bytes = workbook(&["Naziv", "1"]);
        match import_workbook(&Numbers, &bytes, 10).await {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.get("datoteka"), ["Nedostaju stupci: Broj"]);
            }
            other => panic!("unexpected {:?}", other.map(|s| s.added)),
        }
    }

    #[test]
    fn test_finish_prefers_key_errors() {
        let bytes = workbook(&["Projekt", "NEMA"]);
        let sheet = read_sheet(&bytes, &[], 10).unwrap();
        let mut keys = Keys::new(&sheet.rows[0]);
        let value = keys.record("projekt_id", "Projekt", "NEMA", None);
        assert_eq!(value, "");

        let form_errors = ValidationErrors::single("projekt_id", "Projekt: obavezan unos");
        match keys.finish::<()>(Err(form_errors)) {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.get("projekt_id"), ["Projekt: 'NEMA' ne postoji"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_finish_reports_unresolved_optional_key() {
        let bytes = workbook(&["OIB osobe", "123"]);
        let sheet = read_sheet(&bytes, &[], 10).unwrap();
        let mut keys = Keys::new(&sheet.rows[0]);
        keys.record("osoba_id", "OIB osobe", "123", None);

        assert!(matches!(keys.finish(Ok(())), Err(ServiceError::Validation(_))));
    }
}

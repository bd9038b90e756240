//! Card service
//!
//! `stanje` is never written from a form. Opening a card sets it to the
//! opening balance; changing the opening balance later shifts it by the
//! difference, which is refused when it would go below zero.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_delete, on_save, ServiceError, ServiceResult, UniqueMessages};
use super::import::{Keys, RowImporter};
use crate::db::repositories::{
    BalanceChange, KarticaRepository, ProjektRepository, TransakcijaRepository,
};
use crate::models::{Kartica, KarticaForm, KarticaInput, ListWindow, SelectItem, Transakcija};
use crate::reports::ImportRow;

const UNIQUE: UniqueMessages = &[
    ("kartica.projekt_id", "Projekt već ima karticu"),
    ("kartica.broj", "Kartica s tim brojem već postoji"),
];

/// A card with its transactions, newest first
#[derive(Debug, Clone)]
pub struct KarticaDetail {
    pub kartica: Kartica,
    pub transakcije: Vec<Transakcija>,
}

pub struct KarticaService {
    repo: Arc<dyn KarticaRepository>,
    transakcije: Arc<dyn TransakcijaRepository>,
    projekti: Arc<dyn ProjektRepository>,
}

impl KarticaService {
    pub fn new(
        repo: Arc<dyn KarticaRepository>,
        transakcije: Arc<dyn TransakcijaRepository>,
        projekti: Arc<dyn ProjektRepository>,
    ) -> Self {
        Self {
            repo,
            transakcije,
            projekti,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Kartica>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Kartica> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Kartica s ID-om {} ne postoji", id)))
    }

    pub async fn detail(&self, id: i64) -> ServiceResult<KarticaDetail> {
        let kartica = self.get(id).await?;
        let transakcije = self.transakcije.list_by_kartica(id).await?;
        Ok(KarticaDetail {
            kartica,
            transakcije,
        })
    }

    pub async fn options(&self) -> ServiceResult<Vec<SelectItem>> {
        Ok(self.repo.options().await?)
    }

    pub async fn create(&self, form: &KarticaForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &KarticaInput) -> ServiceResult<i64> {
        let id = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;
        tracing::info!(id, projekt_id = input.projekt_id, "Kartica created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, form: &KarticaForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let change = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, UNIQUE))?;

        match change {
            BalanceChange::Applied(true) => {
                tracing::info!(id, "Kartica updated");
                Ok(())
            }
            BalanceChange::Applied(false) => Err(ServiceError::NotFound(format!(
                "Kartica s ID-om {} ne postoji",
                id
            ))),
            BalanceChange::Insufficient { balance, requested } => {
                tracing::warn!(id, balance, requested, "Opening balance change refused");
                Err(ServiceError::InsufficientFunds { balance, requested })
            }
        }
    }

    /// Transactions are deleted together with the card
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| on_delete(e, "Kartica se koristi i ne može se obrisati"))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Kartica s ID-om {} ne postoji", id)));
        }
        tracing::info!(id, "Kartica deleted");
        Ok(())
    }
}

#[async_trait]
impl RowImporter for KarticaService {
    fn required(&self) -> &'static [&'static str] {
        &["Broj", "Projekt", "Banka", "Početno stanje"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = KarticaForm {
            projekt_id: keys.projekt(self.projekti.as_ref(), "Projekt").await?,
            broj: row.get("Broj").to_string(),
            banka: row.get("Banka").to_string(),
            pocetno_stanje: row.get("Početno stanje").to_string(),
            return_to: String::new(),
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_projekt, migrated_pool};
    use crate::services::test_support::services;

    const BROJ: &str = "HR1210010051863000160";

    fn form(projekt_id: i64, broj: &str, pocetno: &str) -> KarticaForm {
        KarticaForm {
            projekt_id: projekt_id.to_string(),
            broj: broj.to_string(),
            banka: "Zagrebačka banka".to_string(),
            pocetno_stanje: pocetno.to_string(),
            return_to: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_opens_with_initial_balance() {
        let pool = migrated_pool().await;
        let service = services(&pool).kartice;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;

        let id = service
            .create(&form(projekt, "hr12 1001 0051 8630 0016 0", "1.000,00"))
            .await
            .unwrap();
        let kartica = service.get(id).await.unwrap();
        assert_eq!(kartica.broj, BROJ);
        assert_eq!(kartica.pocetno_stanje, 100_000);
        assert_eq!(kartica.stanje, 100_000);
    }

    #[tokio::test]
    async fn test_second_card_for_project_is_conflict() {
        let pool = migrated_pool().await;
        let service = services(&pool).kartice;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        service.create(&form(projekt, BROJ, "0")).await.unwrap();

        match service
            .create(&form(projekt, "HR1723600001101234565", "0"))
            .await
        {
            Err(ServiceError::Conflict(msg)) => assert_eq!(msg, "Projekt već ima karticu"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lowering_opening_balance_below_spent_is_refused() {
        let pool = migrated_pool().await;
        let s = services(&pool);
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let id = s.kartice.create(&form(projekt, BROJ, "100")).await.unwrap();
        sqlx::query("UPDATE kartica SET stanje = 3000 WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let result = s.kartice.update(id, &form(projekt, BROJ, "50")).await;
        match result {
            Err(ServiceError::InsufficientFunds { balance, requested }) => {
                assert_eq!(balance, 3000);
                assert_eq!(requested, 5000);
            }
            other => panic!("unexpected {:?}", other),
        }

        s.kartice
            .update(id, &form(projekt, BROJ, "80"))
            .await
            .unwrap();
        let kartica = s.kartice.get(id).await.unwrap();
        assert_eq!(kartica.pocetno_stanje, 8000);
        assert_eq!(kartica.stanje, 1000);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = migrated_pool().await;
        let service = services(&pool).kartice;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let result = service.update(77, &form(projekt, BROJ, "0")).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_iban_rejected() {
        let pool = migrated_pool().await;
        let service = services(&pool).kartice;
        match service.create(&form(1, "DE1234", "0")).await {
            Err(ServiceError::Validation(errors)) => assert!(errors.has("broj")),
            other => panic!("unexpected {:?}", other),
        }
    }
}

//! Transaction service
//!
//! Every write moves the owning card's balance in the same database
//! transaction. A write that would leave a card below zero changes nothing
//! and comes back as `InsufficientFunds`.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{on_save, ServiceError, ServiceResult};
use super::import::{Keys, RowImporter};
use super::LookupService;
use crate::db::repositories::{BalanceChange, KarticaRepository, TransakcijaRepository};
use crate::models::{ListWindow, LookupKind, Transakcija, TransakcijaForm, TransakcijaInput};
use crate::reports::ImportRow;

fn not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Transakcija s ID-om {} ne postoji", id))
}

fn refused<T>(balance: i64, requested: i64) -> ServiceResult<T> {
    tracing::warn!(balance, requested, "Transaction refused, insufficient funds");
    Err(ServiceError::InsufficientFunds { balance, requested })
}

pub struct TransakcijaService {
    repo: Arc<dyn TransakcijaRepository>,
    kartice: Arc<dyn KarticaRepository>,
    lookups: Arc<LookupService>,
}

impl TransakcijaService {
    pub fn new(
        repo: Arc<dyn TransakcijaRepository>,
        kartice: Arc<dyn KarticaRepository>,
        lookups: Arc<LookupService>,
    ) -> Self {
        Self {
            repo,
            kartice,
            lookups,
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn list(&self, window: &ListWindow) -> ServiceResult<Vec<Transakcija>> {
        Ok(self.repo.list(window).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Transakcija> {
        self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, form: &TransakcijaForm) -> ServiceResult<i64> {
        let input = form.validate()?;
        self.insert(&input).await
    }

    async fn insert(&self, input: &TransakcijaInput) -> ServiceResult<i64> {
        let change = self
            .repo
            .create(input)
            .await
            .map_err(|e| on_save(e, &[]))?;

        match change {
            BalanceChange::Applied(id) => {
                tracing::info!(
                    id,
                    kartica_id = input.kartica_id,
                    delta = input.delta(),
                    "Transakcija created"
                );
                Ok(id)
            }
            BalanceChange::Insufficient { balance, requested } => refused(balance, requested),
        }
    }

    pub async fn update(&self, id: i64, form: &TransakcijaForm) -> ServiceResult<()> {
        let input = form.validate()?;
        let change = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| on_save(e, &[]))?;

        match change {
            BalanceChange::Applied(true) => {
                tracing::info!(id, kartica_id = input.kartica_id, "Transakcija updated");
                Ok(())
            }
            BalanceChange::Applied(false) => Err(not_found(id)),
            BalanceChange::Insufficient { balance, requested } => refused(balance, requested),
        }
    }

    /// Reverses the booking; refused if a deposit was already spent
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let change = self.repo.delete(id).await?;

        match change {
            BalanceChange::Applied(true) => {
                tracing::info!(id, "Transakcija deleted");
                Ok(())
            }
            BalanceChange::Applied(false) => Err(not_found(id)),
            BalanceChange::Insufficient { balance, requested } => refused(balance, requested),
        }
    }
}

#[async_trait]
impl RowImporter for TransakcijaService {
    fn required(&self) -> &'static [&'static str] {
        &["Kartica", "Smjer", "Iznos", "Datum", "Vrsta transakcije"]
    }

    async fn import_row(&self, row: &ImportRow) -> ServiceResult<i64> {
        let mut keys = Keys::new(row);
        let form = TransakcijaForm {
            kartica_id: keys.kartica(self.kartice.as_ref(), "Kartica").await?,
            smjer: row.get("Smjer").to_string(),
            iznos: row.get("Iznos").to_string(),
            datum: row.get("Datum").to_string(),
            vrsta_transakcije_id: keys
                .lookup(
                    &self.lookups,
                    LookupKind::VrstaTransakcije,
                    "vrsta_transakcije_id",
                )
                .await?,
            protustrana: row.get("Protustrana").to_string(),
            opis: row.get("Opis").to_string(),
            return_to: String::new(),
        };
        let input = keys.finish(form.validate())?;
        self.insert(&input).await
    }
}

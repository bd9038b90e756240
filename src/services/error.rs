//! Service error type
//!
//! Repositories report constraint violations as plain `sqlx` errors inside
//! an `anyhow` chain. Services turn the ones a user can cause into
//! `Conflict` / `InUse` with a readable message.

use sqlx::error::{DatabaseError, ErrorKind};

use crate::models::money::format_amount;
use crate::models::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    /// A unique constraint or a missing referenced row
    #[error("{0}")]
    Conflict(String),

    /// Delete refused because other rows reference this one
    #[error("{0}")]
    InUse(String),

    #[error(
        "Nedovoljno sredstava na kartici: stanje {}, potrebno {}",
        format_amount(*.balance),
        format_amount(*.requested)
    )]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Unique-constraint messages keyed by `table.column`
pub type UniqueMessages = &'static [(&'static str, &'static str)];

const DUPLICATE: &str = "Zapis s tim podacima već postoji";
const MISSING_REFERENCE: &str = "Odabrani povezani zapis ne postoji";
const CHECK_FAILED: &str = "Podaci nisu u dopuštenom rasponu";

fn database_error(err: &anyhow::Error) -> Option<&(dyn DatabaseError + 'static)> {
    err.chain().find_map(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => Some(&**db),
        _ => None,
    })
}

/// Map a failed insert or update
pub fn on_save(err: anyhow::Error, unique: UniqueMessages) -> ServiceError {
    let Some(db) = database_error(&err) else {
        return ServiceError::Internal(err);
    };
    match db.kind() {
        ErrorKind::UniqueViolation => {
            let message = db.message();
            let text = unique
                .iter()
                .find(|(column, _)| message.ends_with(column))
                .map_or(DUPLICATE, |(_, text)| text);
            ServiceError::Conflict(text.to_string())
        }
        ErrorKind::ForeignKeyViolation => ServiceError::Conflict(MISSING_REFERENCE.to_string()),
        ErrorKind::CheckViolation => ServiceError::Conflict(CHECK_FAILED.to_string()),
        _ => ServiceError::Internal(err),
    }
}

/// Map a failed delete; a foreign key violation means the row is referenced
pub fn on_delete(err: anyhow::Error, in_use: &str) -> ServiceError {
    match database_error(&err).map(|db| db.kind()) {
        Some(ErrorKind::ForeignKeyViolation) => ServiceError::InUse(in_use.to_string()),
        _ => ServiceError::Internal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use anyhow::Context;

    const UNIQUE: UniqueMessages = &[("osoba.oib", "Osoba s tim OIB-om već postoji")];

    async fn failing(sql: &str) -> anyhow::Error {
        let pool = migrated_pool().await;
        sqlx::query("INSERT INTO osoba (ime, prezime, oib) VALUES ('A', 'B', '69435151530')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(sql)
            .execute(&pool)
            .await
            .context("Failed to write")
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_unique_violation_uses_column_message() {
        let err = failing("INSERT INTO osoba (ime, prezime, oib) VALUES ('C', 'D', '69435151530')").await;
        match on_save(err, UNIQUE) {
            ServiceError::Conflict(msg) => assert_eq!(msg, "Osoba s tim OIB-om već postoji"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_foreign_key_on_save_is_conflict() {
        let err = failing(
            "INSERT INTO partner (naziv, oib, vrsta_partnera_id) VALUES ('P', '12345678903', 999)",
        )
        .await;
        assert!(matches!(on_save(err, UNIQUE), ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_foreign_key_on_delete_is_in_use() {
        let pool = migrated_pool().await;
        sqlx::query(
            "INSERT INTO partner (naziv, oib, vrsta_partnera_id) VALUES ('P', '12345678903', (SELECT MIN(id) FROM vrsta_partnera))",
        )
        .execute(&pool)
        .await
        .unwrap();
        let err = sqlx::query("DELETE FROM vrsta_partnera")
            .execute(&pool)
            .await
            .context("Failed to delete")
            .unwrap_err();
        match on_delete(err, "Vrsta je u upotrebi") {
            ServiceError::InUse(msg) => assert_eq!(msg, "Vrsta je u upotrebi"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plain_errors_are_internal() {
        let err = anyhow::anyhow!("disk full");
        assert!(matches!(on_save(err, UNIQUE), ServiceError::Internal(_)));
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = ServiceError::InsufficientFunds {
            balance: 1_000,
            requested: 250_000,
        };
        assert_eq!(
            err.to_string(),
            "Nedovoljno sredstava na kartici: stanje 10,00, potrebno 2.500,00"
        );
    }
}

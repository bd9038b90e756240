//! Card transaction repository
//!
//! Every write moves the owning card's balance in the same database
//! transaction. The balance move is always the first statement and is a
//! conditional UPDATE, so two concurrent withdrawals cannot both pass the
//! non-negative check.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;
use std::sync::Arc;

use super::{windowed_sql, BalanceChange};
use crate::db::DbPool;
use crate::models::{ListWindow, Smjer, SortColumns, Transakcija, TransakcijaInput};

const SELECT: &str = r#"
    SELECT t.id, t.kartica_id, k.broj AS kartica_broj, t.smjer, t.iznos, t.datum,
           t.vrsta_transakcije_id, v.naziv AS vrsta_transakcije, t.protustrana, t.opis
    FROM transakcija t
    JOIN kartica k ON k.id = t.kartica_id
    JOIN vrsta_transakcije v ON v.id = t.vrsta_transakcije_id
"#;

pub const SORT: SortColumns = SortColumns::new(
    "t.id",
    &[
        "k.broj",
        "t.smjer",
        "t.iznos",
        "t.datum",
        "v.naziv",
        "t.protustrana",
        "t.opis",
    ],
);

#[async_trait]
pub trait TransakcijaRepository: Send + Sync {
    async fn count(&self) -> Result<i64>;

    async fn list(&self, window: &ListWindow) -> Result<Vec<Transakcija>>;

    /// Transactions of one card, newest first
    async fn list_by_kartica(&self, kartica_id: i64) -> Result<Vec<Transakcija>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Transakcija>>;

    /// Books the transaction and moves the card balance
    async fn create(&self, input: &TransakcijaInput) -> Result<BalanceChange<i64>>;

    /// Reverses the old booking and applies the new one, possibly on another card.
    /// `Applied(false)` if no transaction has this id.
    async fn update(&self, id: i64, input: &TransakcijaInput) -> Result<BalanceChange<bool>>;

    /// Removes the transaction and reverses its effect on the card
    async fn delete(&self, id: i64) -> Result<BalanceChange<bool>>;
}

pub struct SqlxTransakcijaRepository {
    pool: DbPool,
}

impl SqlxTransakcijaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn TransakcijaRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Result of moving one card's balance
enum Move {
    Done,
    /// No card with that id; the following write reports the foreign key
    NoCard,
    Short { balance: i64 },
}

async fn move_balance(conn: &mut SqliteConnection, kartica_id: i64, delta: i64) -> Result<Move> {
    let result = sqlx::query(
        r#"
        UPDATE kartica SET stanje = stanje + ?1
        WHERE id = ?2 AND stanje + ?1 >= 0 AND typeof(stanje + ?1) = 'integer'
        "#,
    )
    .bind(delta)
    .bind(kartica_id)
    .execute(&mut *conn)
    .await
    .context("Failed to move card balance")?;

    if result.rows_affected() > 0 {
        return Ok(Move::Done);
    }

    let row = sqlx::query("SELECT stanje FROM kartica WHERE id = ?")
        .bind(kartica_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to read card balance")?;

    let Some(row) = row else {
        return Ok(Move::NoCard);
    };
    let balance: i64 = row.get("stanje");
    if balance.checked_add(delta).is_none() {
        bail!("Card {} balance out of range", kartica_id);
    }
    Ok(Move::Short { balance })
}

/// (kartica_id, signed effect) of a stored transaction
async fn booked(conn: &mut SqliteConnection, id: i64) -> Result<Option<(i64, i64)>> {
    let row = sqlx::query("SELECT kartica_id, smjer, iznos FROM transakcija WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to read transaction")?;

    Ok(row.map(|row| {
        let smjer: String = row.get("smjer");
        let iznos: i64 = row.get("iznos");
        let smjer = Smjer::parse(&smjer).unwrap_or(Smjer::Uplata);
        (row.get("kartica_id"), smjer.signed(iznos))
    }))
}

#[async_trait]
impl TransakcijaRepository for SqlxTransakcijaRepository {
    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM transakcija")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        Ok(row.get("count"))
    }

    async fn list(&self, window: &ListWindow) -> Result<Vec<Transakcija>> {
        let rows = sqlx::query(&windowed_sql(SELECT, &SORT, window))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        Ok(rows.iter().map(row_to_transakcija).collect())
    }

    async fn list_by_kartica(&self, kartica_id: i64) -> Result<Vec<Transakcija>> {
        let rows = sqlx::query(&format!(
            "{} WHERE t.kartica_id = ? ORDER BY t.datum DESC, t.id DESC",
            SELECT
        ))
        .bind(kartica_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions by card")?;

        Ok(rows.iter().map(row_to_transakcija).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Transakcija>> {
        let row = sqlx::query(&format!("{} WHERE t.id = ?", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get transaction by ID")?;

        Ok(row.as_ref().map(row_to_transakcija))
    }

    async fn create(&self, input: &TransakcijaInput) -> Result<BalanceChange<i64>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        if let Move::Short { balance } = move_balance(&mut tx, input.kartica_id, input.delta()).await? {
            return Ok(BalanceChange::Insufficient {
                balance,
                requested: input.iznos,
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO transakcija (kartica_id, smjer, iznos, datum, vrsta_transakcije_id, protustrana, opis)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.kartica_id)
        .bind(input.smjer.as_str())
        .bind(input.iznos)
        .bind(input.datum)
        .bind(input.vrsta_transakcije_id)
        .bind(&input.protustrana)
        .bind(&input.opis)
        .execute(&mut *tx)
        .await
        .context("Failed to create transaction")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(BalanceChange::Applied(result.last_insert_rowid()))
    }

    async fn update(&self, id: i64, input: &TransakcijaInput) -> Result<BalanceChange<bool>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let Some((old_kartica, old_delta)) = booked(&mut tx, id).await? else {
            return Ok(BalanceChange::Applied(false));
        };

        if old_kartica == input.kartica_id {
            let net = input
                .delta()
                .checked_sub(old_delta)
                .context("Transaction amount out of range")?;
            if let Move::Short { balance } = move_balance(&mut tx, old_kartica, net).await? {
                return Ok(BalanceChange::Insufficient {
                    balance,
                    requested: -net,
                });
            }
        } else {
            if let Move::Short { balance } = move_balance(&mut tx, old_kartica, -old_delta).await? {
                return Ok(BalanceChange::Insufficient {
                    balance,
                    requested: old_delta,
                });
            }
            if let Move::Short { balance } =
                move_balance(&mut tx, input.kartica_id, input.delta()).await?
            {
                return Ok(BalanceChange::Insufficient {
                    balance,
                    requested: input.iznos,
                });
            }
        }

        sqlx::query(
            r#"
            UPDATE transakcija
            SET kartica_id = ?, smjer = ?, iznos = ?, datum = ?, vrsta_transakcije_id = ?,
                protustrana = ?, opis = ?
            WHERE id = ?
            "#,
        )
        .bind(input.kartica_id)
        .bind(input.smjer.as_str())
        .bind(input.iznos)
        .bind(input.datum)
        .bind(input.vrsta_transakcije_id)
        .bind(&input.protustrana)
        .bind(&input.opis)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update transaction")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(BalanceChange::Applied(true))
    }

    async fn delete(&self, id: i64) -> Result<BalanceChange<bool>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let Some((kartica_id, delta)) = booked(&mut tx, id).await? else {
            return Ok(BalanceChange::Applied(false));
        };

        if let Move::Short { balance } = move_balance(&mut tx, kartica_id, -delta).await? {
            return Ok(BalanceChange::Insufficient {
                balance,
                requested: delta,
            });
        }

        sqlx::query("DELETE FROM transakcija WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete transaction")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(BalanceChange::Applied(true))
    }
}

fn row_to_transakcija(row: &sqlx::sqlite::SqliteRow) -> Transakcija {
    let smjer: String = row.get("smjer");
    Transakcija {
        id: row.get("id"),
        kartica_id: row.get("kartica_id"),
        kartica_broj: row.get("kartica_broj"),
        smjer: Smjer::parse(&smjer).unwrap_or(Smjer::Uplata),
        iznos: row.get("iznos"),
        datum: row.get("datum"),
        vrsta_transakcije_id: row.get("vrsta_transakcije_id"),
        vrsta_transakcije: row.get("vrsta_transakcije"),
        protustrana: row.get("protustrana"),
        opis: row.get("opis"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{
        insert_kartica, insert_projekt, lookup_id, migrated_pool,
    };
    use chrono::NaiveDate;

    struct Fixture {
        pool: DbPool,
        repo: SqlxTransakcijaRepository,
        kartica: i64,
        vrsta: i64,
    }

    async fn setup(stanje: i64) -> Fixture {
        let pool = migrated_pool().await;
        let projekt = insert_projekt(&pool, "Portal", "PORT").await;
        let kartica = insert_kartica(&pool, projekt, "HR1210010051863000160", stanje).await;
        let vrsta = lookup_id(&pool, "vrsta_transakcije").await;
        Fixture {
            repo: SqlxTransakcijaRepository::new(pool.clone()),
            pool,
            kartica,
            vrsta,
        }
    }

    fn input(f: &Fixture, smjer: Smjer, iznos: i64) -> TransakcijaInput {
        TransakcijaInput {
            kartica_id: f.kartica,
            smjer,
            iznos,
            datum: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            vrsta_transakcije_id: f.vrsta,
            protustrana: None,
            opis: None,
        }
    }

    async fn stanje(pool: &DbPool, kartica: i64) -> i64 {
        let row = sqlx::query("SELECT stanje FROM kartica WHERE id = ?")
            .bind(kartica)
            .fetch_one(pool)
            .await
            .unwrap();
        row.get("stanje")
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw_move_balance() {
        let f = setup(10_000).await;

        let deposit = f.repo.create(&input(&f, Smjer::Uplata, 5_000)).await.unwrap();
        assert!(matches!(deposit, BalanceChange::Applied(_)));
        assert_eq!(stanje(&f.pool, f.kartica).await, 15_000);

        f.repo
            .create(&input(&f, Smjer::Isplata, 15_000))
            .await
            .unwrap();
        assert_eq!(stanje(&f.pool, f.kartica).await, 0);

        let list = f.repo.list_by_kartica(f.kartica).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].smjer, Smjer::Isplata);
        assert_eq!(list[0].kartica_broj, "HR1210010051863000160");
    }

    #[tokio::test]
    async fn test_overdraft_refused_and_nothing_written() {
        let f = setup(1_000).await;

        let result = f.repo.create(&input(&f, Smjer::Isplata, 1_001)).await.unwrap();
        assert_eq!(
            result,
            BalanceChange::Insufficient {
                balance: 1_000,
                requested: 1_001
            }
        );
        assert_eq!(stanje(&f.pool, f.kartica).await, 1_000);
        assert_eq!(f.repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_applies_net_difference() {
        let f = setup(10_000).await;
        let BalanceChange::Applied(id) = f
            .repo
            .create(&input(&f, Smjer::Isplata, 4_000))
            .await
            .unwrap()
        else {
            panic!("withdrawal should be applied");
        };

        let changed = input(&f, Smjer::Uplata, 1_000);
        assert_eq!(
            f.repo.update(id, &changed).await.unwrap(),
            BalanceChange::Applied(true)
        );
        assert_eq!(stanje(&f.pool, f.kartica).await, 11_000);

        let t = f.repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(t.smjer, Smjer::Uplata);
        assert_eq!(t.iznos, 1_000);
    }

    #[tokio::test]
    async fn test_update_refused_when_card_would_go_negative() {
        let f = setup(5_000).await;
        let BalanceChange::Applied(id) = f
            .repo
            .create(&input(&f, Smjer::Isplata, 1_000))
            .await
            .unwrap()
        else {
            panic!("withdrawal should be applied");
        };

        let result = f
            .repo
            .update(id, &input(&f, Smjer::Isplata, 9_000))
            .await
            .unwrap();
        assert!(matches!(result, BalanceChange::Insufficient { balance: 4_000, .. }));
        assert_eq!(stanje(&f.pool, f.kartica).await, 4_000);
        assert_eq!(f.repo.get_by_id(id).await.unwrap().unwrap().iznos, 1_000);
    }

    #[tokio::test]
    async fn test_update_moves_to_another_card() {
        let f = setup(10_000).await;
        let other_projekt = insert_projekt(&f.pool, "Drugi", "DR").await;
        let other = insert_kartica(&f.pool, other_projekt, "HR1723600001101234565", 0).await;

        let BalanceChange::Applied(id) = f
            .repo
            .create(&input(&f, Smjer::Uplata, 3_000))
            .await
            .unwrap()
        else {
            panic!("deposit should be applied");
        };

        let mut moved = input(&f, Smjer::Uplata, 3_000);
        moved.kartica_id = other;
        f.repo.update(id, &moved).await.unwrap();

        assert_eq!(stanje(&f.pool, f.kartica).await, 10_000);
        assert_eq!(stanje(&f.pool, other).await, 3_000);
    }

    #[tokio::test]
    async fn test_delete_reverses_effect() {
        let f = setup(0).await;
        let BalanceChange::Applied(deposit) = f
            .repo
            .create(&input(&f, Smjer::Uplata, 2_000))
            .await
            .unwrap()
        else {
            panic!("deposit should be applied");
        };
        f.repo
            .create(&input(&f, Smjer::Isplata, 1_500))
            .await
            .unwrap();

        // removing the deposit would leave -1500
        assert!(matches!(
            f.repo.delete(deposit).await.unwrap(),
            BalanceChange::Insufficient { .. }
        ));
        assert_eq!(f.repo.count().await.unwrap(), 2);

        assert_eq!(
            f.repo.delete(999).await.unwrap(),
            BalanceChange::Applied(false)
        );
    }

    #[tokio::test]
    async fn test_balance_overflow_refused_and_card_still_readable() {
        let f = setup(i64::MAX - 100).await;

        assert!(f.repo.create(&input(&f, Smjer::Uplata, 101)).await.is_err());
        assert_eq!(stanje(&f.pool, f.kartica).await, i64::MAX - 100);
        assert_eq!(f.repo.count().await.unwrap(), 0);

        let kind: String = sqlx::query_scalar("SELECT typeof(stanje) FROM kartica WHERE id = ?")
            .bind(f.kartica)
            .fetch_one(&f.pool)
            .await
            .unwrap();
        assert_eq!(kind, "integer");

        f.repo.create(&input(&f, Smjer::Uplata, 100)).await.unwrap();
        assert_eq!(stanje(&f.pool, f.kartica).await, i64::MAX);
    }

    #[tokio::test]
    async fn test_unknown_card_is_an_error() {
        let f = setup(0).await;
        let mut orphan = input(&f, Smjer::Uplata, 100);
        orphan.kartica_id = 999;
        assert!(f.repo.create(&orphan).await.is_err());
    }
}

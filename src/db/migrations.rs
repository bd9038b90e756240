//! Database migrations
//!
//! Migrations are embedded directly in Rust code as SQL strings so the
//! binary carries its own schema.
//!
//! # Usage
//!
//! ```ignore
//! use projekti::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::Row;

use super::DbPool;

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements, separated by `;`
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: NaiveDateTime,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_lookup_tables",
        up: r#"
            CREATE TABLE IF NOT EXISTS vrsta_projekta (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS vrsta_dokumentacije (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS vrsta_partnera (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS vrsta_posla (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS vrsta_transakcije (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS vrsta_zahtjeva (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS uloga (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
            CREATE TABLE IF NOT EXISTS status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_projekt",
        up: r#"
            CREATE TABLE IF NOT EXISTS projekt (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL COLLATE NOCASE UNIQUE,
                kratica VARCHAR(20) NOT NULL UNIQUE,
                opis TEXT,
                datum_pocetka DATE NOT NULL,
                datum_zavrsetka DATE,
                vrsta_projekta_id INTEGER NOT NULL,
                FOREIGN KEY (vrsta_projekta_id) REFERENCES vrsta_projekta(id),
                CHECK (datum_zavrsetka IS NULL OR datum_zavrsetka >= datum_pocetka)
            );
            CREATE INDEX IF NOT EXISTS idx_projekt_vrsta ON projekt(vrsta_projekta_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_osoba",
        up: r#"
            CREATE TABLE IF NOT EXISTS osoba (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ime VARCHAR(50) NOT NULL,
                prezime VARCHAR(50) NOT NULL,
                oib CHAR(11) NOT NULL UNIQUE,
                email VARCHAR(100),
                telefon VARCHAR(20)
            );
            CREATE INDEX IF NOT EXISTS idx_osoba_prezime ON osoba(prezime, ime);
        "#,
    },
    Migration {
        version: 4,
        name: "create_partner",
        up: r#"
            CREATE TABLE IF NOT EXISTS partner (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naziv VARCHAR(100) NOT NULL,
                oib CHAR(11) NOT NULL UNIQUE,
                adresa VARCHAR(200),
                email VARCHAR(100),
                vrsta_partnera_id INTEGER NOT NULL,
                FOREIGN KEY (vrsta_partnera_id) REFERENCES vrsta_partnera(id)
            );
            CREATE INDEX IF NOT EXISTS idx_partner_vrsta ON partner(vrsta_partnera_id);
        "#,
    },
    Migration {
        version: 5,
        name: "create_posao",
        up: r#"
            CREATE TABLE IF NOT EXISTS posao (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                projekt_id INTEGER NOT NULL,
                osoba_id INTEGER NOT NULL,
                uloga_id INTEGER NOT NULL,
                vrsta_posla_id INTEGER NOT NULL,
                opis TEXT,
                satnica INTEGER NOT NULL DEFAULT 0 CHECK (satnica >= 0),
                datum_od DATE NOT NULL,
                datum_do DATE,
                FOREIGN KEY (projekt_id) REFERENCES projekt(id),
                FOREIGN KEY (osoba_id) REFERENCES osoba(id),
                FOREIGN KEY (uloga_id) REFERENCES uloga(id),
                FOREIGN KEY (vrsta_posla_id) REFERENCES vrsta_posla(id),
                CHECK (datum_do IS NULL OR datum_do >= datum_od)
            );
            CREATE INDEX IF NOT EXISTS idx_posao_projekt ON posao(projekt_id);
            CREATE INDEX IF NOT EXISTS idx_posao_osoba ON posao(osoba_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_dokumentacija",
        up: r#"
            CREATE TABLE IF NOT EXISTS dokumentacija (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                projekt_id INTEGER NOT NULL,
                vrsta_dok_id INTEGER NOT NULL,
                naziv VARCHAR(100) NOT NULL,
                datum DATE NOT NULL,
                putanja VARCHAR(255),
                FOREIGN KEY (projekt_id) REFERENCES projekt(id) ON DELETE CASCADE,
                FOREIGN KEY (vrsta_dok_id) REFERENCES vrsta_dokumentacije(id)
            );
            CREATE INDEX IF NOT EXISTS idx_dokumentacija_projekt ON dokumentacija(projekt_id);
        "#,
    },
    Migration {
        version: 7,
        name: "create_kartica",
        up: r#"
            CREATE TABLE IF NOT EXISTS kartica (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                projekt_id INTEGER NOT NULL UNIQUE,
                broj CHAR(21) NOT NULL UNIQUE,
                banka VARCHAR(100) NOT NULL,
                pocetno_stanje INTEGER NOT NULL DEFAULT 0 CHECK (pocetno_stanje >= 0),
                stanje INTEGER NOT NULL DEFAULT 0 CHECK (stanje >= 0),
                FOREIGN KEY (projekt_id) REFERENCES projekt(id)
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_transakcija",
        up: r#"
            CREATE TABLE IF NOT EXISTS transakcija (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kartica_id INTEGER NOT NULL,
                smjer VARCHAR(10) NOT NULL CHECK (smjer IN ('uplata', 'isplata')),
                iznos INTEGER NOT NULL CHECK (iznos > 0),
                datum DATE NOT NULL,
                vrsta_transakcije_id INTEGER NOT NULL,
                protustrana VARCHAR(100),
                opis TEXT,
                FOREIGN KEY (kartica_id) REFERENCES kartica(id) ON DELETE CASCADE,
                FOREIGN KEY (vrsta_transakcije_id) REFERENCES vrsta_transakcije(id)
            );
            CREATE INDEX IF NOT EXISTS idx_transakcija_kartica ON transakcija(kartica_id);
        "#,
    },
    Migration {
        version: 9,
        name: "create_zahtjev",
        up: r#"
            CREATE TABLE IF NOT EXISTS zahtjev (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                projekt_id INTEGER NOT NULL,
                vrsta_zahtjeva_id INTEGER NOT NULL,
                naslov VARCHAR(100) NOT NULL,
                opis TEXT,
                prioritet INTEGER NOT NULL CHECK (prioritet BETWEEN 1 AND 5),
                datum_podnosenja DATE NOT NULL,
                FOREIGN KEY (projekt_id) REFERENCES projekt(id),
                FOREIGN KEY (vrsta_zahtjeva_id) REFERENCES vrsta_zahtjeva(id)
            );
            CREATE INDEX IF NOT EXISTS idx_zahtjev_projekt ON zahtjev(projekt_id);
        "#,
    },
    Migration {
        version: 10,
        name: "create_zadatak",
        up: r#"
            CREATE TABLE IF NOT EXISTS zadatak (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                zahtjev_id INTEGER NOT NULL,
                status_id INTEGER NOT NULL,
                osoba_id INTEGER,
                naziv VARCHAR(100) NOT NULL,
                opis TEXT,
                planirani_pocetak DATE NOT NULL,
                planirani_kraj DATE,
                stvarni_kraj DATE,
                FOREIGN KEY (zahtjev_id) REFERENCES zahtjev(id) ON DELETE CASCADE,
                FOREIGN KEY (status_id) REFERENCES status(id),
                FOREIGN KEY (osoba_id) REFERENCES osoba(id),
                CHECK (planirani_kraj IS NULL OR planirani_kraj >= planirani_pocetak),
                CHECK (stvarni_kraj IS NULL OR stvarni_kraj >= planirani_pocetak)
            );
            CREATE INDEX IF NOT EXISTS idx_zadatak_zahtjev ON zadatak(zahtjev_id);
        "#,
    },
    Migration {
        version: 11,
        name: "seed_lookups",
        up: r#"
            INSERT OR IGNORE INTO vrsta_projekta (naziv) VALUES ('Istraživački'), ('Razvojni'), ('Infrastrukturni');
            INSERT OR IGNORE INTO vrsta_dokumentacije (naziv) VALUES ('Ugovor'), ('Specifikacija'), ('Izvještaj');
            INSERT OR IGNORE INTO vrsta_partnera (naziv) VALUES ('Naručitelj'), ('Dobavljač'), ('Podizvođač');
            INSERT OR IGNORE INTO vrsta_posla (naziv) VALUES ('Razvoj'), ('Testiranje'), ('Upravljanje');
            INSERT OR IGNORE INTO vrsta_transakcije (naziv) VALUES ('Plaća'), ('Materijal'), ('Usluga');
            INSERT OR IGNORE INTO vrsta_zahtjeva (naziv) VALUES ('Nova funkcionalnost'), ('Ispravak'), ('Podrška');
            INSERT OR IGNORE INTO uloga (naziv) VALUES ('Voditelj'), ('Razvojni inženjer'), ('Konzultant');
            INSERT OR IGNORE INTO status (naziv) VALUES ('Novi'), ('U tijeku'), ('Završen');
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DbPool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DbPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration inside a transaction
async fn apply_migration(pool: &DbPool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only chunks
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DbPool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DbPool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DbPool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_pending_count_and_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());
        assert!(!is_up_to_date(&pool).await.unwrap());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert_eq!(pending_count(&pool).await.unwrap(), 0);
        assert!(is_up_to_date(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_lookups_seeded() {
        let pool = migrated_pool().await;

        for table in [
            "vrsta_projekta",
            "vrsta_dokumentacije",
            "vrsta_partnera",
            "vrsta_posla",
            "vrsta_transakcije",
            "vrsta_zahtjeva",
            "uloga",
            "status",
        ] {
            let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", table))
                .fetch_one(&pool)
                .await
                .expect("Failed to count lookup rows");
            let count: i64 = row.get("count");
            assert_eq!(count, 3, "table {} should be seeded", table);
        }
    }

    #[tokio::test]
    async fn test_foreign_key_constraint_enforced() {
        let pool = migrated_pool().await;

        let result = sqlx::query(
            "INSERT INTO projekt (naziv, kratica, datum_pocetka, vrsta_projekta_id) VALUES (?, ?, ?, ?)",
        )
        .bind("Projekt")
        .bind("PRJ")
        .bind("2024-01-01")
        .bind(999i64)
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_project_date_range_check() {
        let pool = migrated_pool().await;

        let result = sqlx::query(
            "INSERT INTO projekt (naziv, kratica, datum_pocetka, datum_zavrsetka, vrsta_projekta_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("Projekt")
        .bind("PRJ")
        .bind("2024-05-01")
        .bind("2024-01-01")
        .bind(1i64)
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_card_balance_cannot_go_negative() {
        let pool = migrated_pool().await;

        sqlx::query(
            "INSERT INTO projekt (naziv, kratica, datum_pocetka, vrsta_projekta_id) VALUES ('P', 'P1', '2024-01-01', 1)",
        )
        .execute(&pool)
        .await
        .expect("Failed to create project");

        let result = sqlx::query(
            "INSERT INTO kartica (projekt_id, broj, banka, pocetno_stanje, stanje) VALUES (1, 'HR1210010051863000160', 'Banka', 0, -5)",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lookup_names_unique_case_insensitive() {
        let pool = migrated_pool().await;

        let result = sqlx::query("INSERT INTO uloga (naziv) VALUES ('voditelj')")
            .execute(&pool)
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_total_migrations() {
        assert_eq!(total_migrations(), 11);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }
}

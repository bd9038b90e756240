//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod dokumentacija;
pub mod kartica;
pub mod lookup;
pub mod osoba;
pub mod partner;
pub mod posao;
pub mod projekt;
pub mod transakcija;
pub mod zadatak;
pub mod zahtjev;

pub use dokumentacija::{DokumentacijaRepository, SqlxDokumentacijaRepository};
pub use kartica::{KarticaRepository, SqlxKarticaRepository};
pub use lookup::{LookupRepository, SqlxLookupRepository};
pub use osoba::{OsobaRepository, SqlxOsobaRepository};
pub use partner::{PartnerRepository, SqlxPartnerRepository};
pub use posao::{PosaoRepository, SqlxPosaoRepository};
pub use projekt::{ProjektRepository, SqlxProjektRepository};
pub use transakcija::{SqlxTransakcijaRepository, TransakcijaRepository};
pub use zadatak::{SqlxZadatakRepository, ZadatakRepository};
pub use zahtjev::{SqlxZahtjevRepository, ZahtjevRepository};

use crate::models::{ListWindow, SortColumns};

/// Outcome of a write that moves a card balance
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceChange<T> {
    Applied(T),
    /// Nothing was written; the balance would have dropped below zero
    Insufficient { balance: i64, requested: i64 },
}

/// `<select> ORDER BY .. LIMIT ? OFFSET ?`; bind `window.limit` then `window.offset`
pub(crate) fn windowed_sql(select: &str, sort: &SortColumns, window: &ListWindow) -> String {
    format!(
        "{} ORDER BY {} LIMIT ? OFFSET ?",
        select,
        sort.order_by(window.sort, window.ascending)
    )
}

/// `%term%` for `LIKE .. ESCAPE '\'`, with wildcards in the term escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

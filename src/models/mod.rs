//! Data models
//!
//! Entities as read from the database (with display names of referenced
//! rows joined in), the string-typed forms posted by the browser, and the
//! validated inputs services write.

pub mod money;
pub mod paging;
pub mod validation;

mod dokumentacija;
mod kartica;
mod lookup;
mod osoba;
mod partner;
mod posao;
mod projekt;
mod select;
mod transakcija;
mod zadatak;
mod zahtjev;

pub use dokumentacija::{Dokumentacija, DokumentacijaForm, DokumentacijaInput};
pub use kartica::{Kartica, KarticaForm, KarticaInput};
pub use lookup::{Lookup, LookupForm, LookupInput, LookupKind};
pub use osoba::{Osoba, OsobaForm, OsobaInput};
pub use paging::{ListQuery, ListWindow, PagingInfo, SortColumns};
pub use partner::{Partner, PartnerForm, PartnerInput};
pub use posao::{Posao, PosaoForm, PosaoInput};
pub use projekt::{Projekt, ProjektForm, ProjektInput};
pub use select::SelectItem;
pub use transakcija::{Smjer, Transakcija, TransakcijaForm, TransakcijaInput};
pub use validation::ValidationErrors;
pub use zadatak::{Zadatak, ZadatakForm, ZadatakInput};
pub use zahtjev::{Zahtjev, ZahtjevForm, ZahtjevInput};

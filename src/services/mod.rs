//! Services layer - Business logic
//!
//! Services validate posted forms, call the repositories and translate
//! database constraint failures into `ServiceError`s a page can show.
//! Web handlers and the Excel import go through the same methods.

pub mod dokumentacija;
pub mod error;
pub mod import;
pub mod kartica;
pub mod lookup;
pub mod osoba;
pub mod partner;
pub mod posao;
pub mod projekt;
pub mod transakcija;
pub mod zadatak;
pub mod zahtjev;

use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::db::repositories::{
    SqlxDokumentacijaRepository, SqlxKarticaRepository, SqlxLookupRepository,
    SqlxOsobaRepository, SqlxPartnerRepository, SqlxPosaoRepository, SqlxProjektRepository,
    SqlxTransakcijaRepository, SqlxZadatakRepository, SqlxZahtjevRepository,
};
use crate::db::DbPool;

pub use dokumentacija::DokumentacijaService;
pub use error::{ServiceError, ServiceResult};
pub use import::{import_workbook, ImportSummary, RowImporter};
pub use kartica::{KarticaDetail, KarticaService};
pub use lookup::LookupService;
pub use osoba::OsobaService;
pub use partner::PartnerService;
pub use posao::PosaoService;
pub use projekt::{ProjektDetail, ProjektService};
pub use transakcija::TransakcijaService;
pub use zadatak::ZadatakService;
pub use zahtjev::{ZahtjevDetail, ZahtjevService};

/// Autocomplete returns at most this many suggestions
pub const SEARCH_LIMIT: i64 = 10;

/// Every service, wired to one pool and one cache
#[derive(Clone)]
pub struct Services {
    pub lookups: Arc<LookupService>,
    pub projekti: Arc<ProjektService>,
    pub osobe: Arc<OsobaService>,
    pub partneri: Arc<PartnerService>,
    pub poslovi: Arc<PosaoService>,
    pub dokumentacija: Arc<DokumentacijaService>,
    pub kartice: Arc<KarticaService>,
    pub transakcije: Arc<TransakcijaService>,
    pub zahtjevi: Arc<ZahtjevService>,
    pub zadaci: Arc<ZadatakService>,
}

impl Services {
    pub fn new(pool: DbPool, cache: Arc<MemoryCache>) -> Self {
        let projekt_repo = SqlxProjektRepository::boxed(pool.clone());
        let osoba_repo = SqlxOsobaRepository::boxed(pool.clone());
        let posao_repo = SqlxPosaoRepository::boxed(pool.clone());
        let dokumentacija_repo = SqlxDokumentacijaRepository::boxed(pool.clone());
        let kartica_repo = SqlxKarticaRepository::boxed(pool.clone());
        let transakcija_repo = SqlxTransakcijaRepository::boxed(pool.clone());
        let zahtjev_repo = SqlxZahtjevRepository::boxed(pool.clone());
        let zadatak_repo = SqlxZadatakRepository::boxed(pool.clone());

        let lookups = Arc::new(LookupService::new(
            SqlxLookupRepository::boxed(pool.clone()),
            cache,
        ));

        Self {
            projekti: Arc::new(ProjektService::new(
                projekt_repo.clone(),
                dokumentacija_repo.clone(),
                kartica_repo.clone(),
                posao_repo.clone(),
                lookups.clone(),
            )),
            osobe: Arc::new(OsobaService::new(osoba_repo.clone())),
            partneri: Arc::new(PartnerService::new(
                SqlxPartnerRepository::boxed(pool),
                lookups.clone(),
            )),
            poslovi: Arc::new(PosaoService::new(
                posao_repo,
                projekt_repo.clone(),
                osoba_repo.clone(),
                lookups.clone(),
            )),
            dokumentacija: Arc::new(DokumentacijaService::new(
                dokumentacija_repo,
                projekt_repo.clone(),
                lookups.clone(),
            )),
            kartice: Arc::new(KarticaService::new(
                kartica_repo.clone(),
                transakcija_repo.clone(),
                projekt_repo.clone(),
            )),
            transakcije: Arc::new(TransakcijaService::new(
                transakcija_repo,
                kartica_repo,
                lookups.clone(),
            )),
            zahtjevi: Arc::new(ZahtjevService::new(
                zahtjev_repo.clone(),
                zadatak_repo.clone(),
                projekt_repo.clone(),
                lookups.clone(),
            )),
            zadaci: Arc::new(ZadatakService::new(
                zadatak_repo,
                zahtjev_repo,
                projekt_repo,
                osoba_repo,
                lookups.clone(),
            )),
            lookups,
        }
    }
}

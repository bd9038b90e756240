//! Lookup ("vrsta") tables
//!
//! Eight small code tables share one shape `(id, naziv)`. `LookupKind`
//! names the table, its route and its page titles.

use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    VrstaProjekta,
    VrstaDok,
    VrstaPartnera,
    VrstaPosla,
    VrstaTransakcije,
    VrstaZahtjeva,
    Uloga,
    Status,
}

impl LookupKind {
    pub const ALL: [LookupKind; 8] = [
        LookupKind::VrstaProjekta,
        LookupKind::VrstaDok,
        LookupKind::VrstaPartnera,
        LookupKind::VrstaPosla,
        LookupKind::VrstaTransakcije,
        LookupKind::VrstaZahtjeva,
        LookupKind::Uloga,
        LookupKind::Status,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            LookupKind::VrstaProjekta => "vrsta_projekta",
            LookupKind::VrstaDok => "vrsta_dokumentacije",
            LookupKind::VrstaPartnera => "vrsta_partnera",
            LookupKind::VrstaPosla => "vrsta_posla",
            LookupKind::VrstaTransakcije => "vrsta_transakcije",
            LookupKind::VrstaZahtjeva => "vrsta_zahtjeva",
            LookupKind::Uloga => "uloga",
            LookupKind::Status => "status",
        }
    }

    /// Route prefix, e.g. `/vrste-projekata`
    pub fn path(&self) -> &'static str {
        match self {
            LookupKind::VrstaProjekta => "/vrste-projekata",
            LookupKind::VrstaDok => "/vrste-dokumentacije",
            LookupKind::VrstaPartnera => "/vrste-partnera",
            LookupKind::VrstaPosla => "/vrste-poslova",
            LookupKind::VrstaTransakcije => "/vrste-transakcija",
            LookupKind::VrstaZahtjeva => "/vrste-zahtjeva",
            LookupKind::Uloga => "/uloge",
            LookupKind::Status => "/statusi",
        }
    }

    /// URL path segment, e.g. `vrste-projekata`
    pub fn slug(&self) -> &'static str {
        &self.path()[1..]
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Plural page title
    pub fn title(&self) -> &'static str {
        match self {
            LookupKind::VrstaProjekta => "Vrste projekata",
            LookupKind::VrstaDok => "Vrste dokumentacije",
            LookupKind::VrstaPartnera => "Vrste partnera",
            LookupKind::VrstaPosla => "Vrste poslova",
            LookupKind::VrstaTransakcije => "Vrste transakcija",
            LookupKind::VrstaZahtjeva => "Vrste zahtjeva",
            LookupKind::Uloga => "Uloge",
            LookupKind::Status => "Statusi",
        }
    }

    /// Singular name, also the column header other exports use for this kind
    pub fn label(&self) -> &'static str {
        match self {
            LookupKind::VrstaProjekta => "Vrsta projekta",
            LookupKind::VrstaDok => "Vrsta dokumentacije",
            LookupKind::VrstaPartnera => "Vrsta partnera",
            LookupKind::VrstaPosla => "Vrsta posla",
            LookupKind::VrstaTransakcije => "Vrsta transakcije",
            LookupKind::VrstaZahtjeva => "Vrsta zahtjeva",
            LookupKind::Uloga => "Uloga",
            LookupKind::Status => "Status",
        }
    }

    pub fn cache_key(&self) -> String {
        format!("lookup:{}", self.table())
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One lookup row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lookup {
    pub id: i64,
    pub naziv: String,
}

impl Tabular for Lookup {
    const COLUMNS: &'static [&'static str] = &["Naziv"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::text(&self.naziv)]
    }
}

/// Posted lookup form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupForm {
    pub naziv: String,
}

/// Validated lookup input
#[derive(Debug, Clone, PartialEq)]
pub struct LookupInput {
    pub naziv: String,
}

impl LookupForm {
    pub fn validate(&self) -> Result<LookupInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let naziv = check.required("naziv", "Naziv", &self.naziv, 100);

        let errors = check.into_errors();
        if errors.is_empty() {
            Ok(LookupInput { naziv })
        } else {
            Err(errors)
        }
    }
}

impl From<&Lookup> for LookupForm {
    fn from(lookup: &Lookup) -> Self {
        Self {
            naziv: lookup.naziv.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_roundtrip() {
        for kind in LookupKind::ALL {
            assert_eq!(LookupKind::from_slug(kind.slug()), Some(kind));
            assert_eq!(kind.path(), format!("/{}", kind.slug()));
        }
        assert_eq!(LookupKind::from_slug("nepostojece"), None);
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(LookupKind::Uloga.cache_key(), "lookup:uloga");
        assert_eq!(LookupKind::VrstaDok.cache_key(), "lookup:vrsta_dokumentacije");
    }

    #[test]
    fn test_form_trims_and_validates() {
        let form = LookupForm {
            naziv: "  Razvoj  ".to_string(),
        };
        assert_eq!(form.validate().unwrap().naziv, "Razvoj");

        let empty = LookupForm::default();
        assert!(empty.validate().unwrap_err().has("naziv"));

        let long = LookupForm {
            naziv: "x".repeat(101),
        };
        assert!(long.validate().is_err());
    }
}

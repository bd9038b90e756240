//! Card transaction model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::format_amount;
use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smjer {
    Uplata,
    Isplata,
}

impl Smjer {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Smjer::Uplata => "uplata",
            Smjer::Isplata => "isplata",
        }
    }

    /// Case-insensitive; accepts the capitalised labels used in exports
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "uplata" => Some(Smjer::Uplata),
            "isplata" => Some(Smjer::Isplata),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Smjer::Uplata => "Uplata",
            Smjer::Isplata => "Isplata",
        }
    }

    /// Effect of `iznos` on the card balance
    pub fn signed(&self, iznos: i64) -> i64 {
        match self {
            Smjer::Uplata => iznos,
            Smjer::Isplata => -iznos,
        }
    }
}

impl std::fmt::Display for Smjer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transakcija {
    pub id: i64,
    pub kartica_id: i64,
    pub kartica_broj: String,
    pub smjer: Smjer,
    /// Amount in cents, always positive
    pub iznos: i64,
    pub datum: NaiveDate,
    pub vrsta_transakcije_id: i64,
    pub vrsta_transakcije: String,
    pub protustrana: Option<String>,
    pub opis: Option<String>,
}

impl Tabular for Transakcija {
    const COLUMNS: &'static [&'static str] = &[
        "Kartica",
        "Smjer",
        "Iznos",
        "Datum",
        "Vrsta transakcije",
        "Protustrana",
        "Opis",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.kartica_broj),
            Cell::text(self.smjer.label()),
            Cell::Amount(self.iznos),
            Cell::Date(self.datum),
            Cell::text(&self.vrsta_transakcije),
            Cell::opt_text(self.protustrana.as_deref()),
            Cell::opt_text(self.opis.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransakcijaForm {
    pub kartica_id: String,
    pub smjer: String,
    pub iznos: String,
    pub datum: String,
    pub vrsta_transakcije_id: String,
    pub protustrana: String,
    pub opis: String,
    pub return_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransakcijaInput {
    pub kartica_id: i64,
    pub smjer: Smjer,
    pub iznos: i64,
    pub datum: NaiveDate,
    pub vrsta_transakcije_id: i64,
    pub protustrana: Option<String>,
    pub opis: Option<String>,
}

impl TransakcijaInput {
    /// Effect on the owning card's balance
    pub fn delta(&self) -> i64 {
        self.smjer.signed(self.iznos)
    }
}

impl TransakcijaForm {
    pub fn validate(&self) -> Result<TransakcijaInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let kartica_id = check.id("kartica_id", "Kartica", &self.kartica_id);
        let smjer = Smjer::parse(&self.smjer);
        if smjer.is_none() {
            check.error("smjer", "Smjer: odaberite uplatu ili isplatu");
        }
        let iznos = check.amount("iznos", "Iznos", &self.iznos, false);
        let datum = check.date("datum", "Datum", &self.datum);
        let vrsta_transakcije_id = check.id(
            "vrsta_transakcije_id",
            "Vrsta transakcije",
            &self.vrsta_transakcije_id,
        );
        let protustrana = check.optional("protustrana", "Protustrana", &self.protustrana, 100);
        let opis = check.optional("opis", "Opis", &self.opis, 1000);

        let errors = check.into_errors();
        match (kartica_id, smjer, iznos, datum, vrsta_transakcije_id) {
            (Some(kartica_id), Some(smjer), Some(iznos), Some(datum), Some(vrsta_transakcije_id))
                if errors.is_empty() =>
            {
                Ok(TransakcijaInput {
                    kartica_id,
                    smjer,
                    iznos,
                    datum,
                    vrsta_transakcije_id,
                    protustrana,
                    opis,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Transakcija> for TransakcijaForm {
    fn from(t: &Transakcija) -> Self {
        Self {
            kartica_id: t.kartica_id.to_string(),
            smjer: t.smjer.as_str().to_string(),
            iznos: format_amount(t.iznos),
            datum: t.datum.to_string(),
            vrsta_transakcije_id: t.vrsta_transakcije_id.to_string(),
            protustrana: t.protustrana.clone().unwrap_or_default(),
            opis: t.opis.clone().unwrap_or_default(),
            return_to: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form(smjer: &str, iznos: &str) -> TransakcijaForm {
        TransakcijaForm {
            kartica_id: "1".to_string(),
            smjer: smjer.to_string(),
            iznos: iznos.to_string(),
            datum: "2024-04-01".to_string(),
            vrsta_transakcije_id: "1".to_string(),
            protustrana: "Dobavljač d.o.o.".to_string(),
            opis: String::new(),
            return_to: String::new(),
        }
    }

    #[test]
    fn test_smjer_parse() {
        assert_eq!(Smjer::parse("Uplata"), Some(Smjer::Uplata));
        assert_eq!(Smjer::parse(" isplata "), Some(Smjer::Isplata));
        assert_eq!(Smjer::parse("povrat"), None);
    }

    #[test]
    fn test_delta_sign() {
        let uplata = valid_form("uplata", "10,00").validate().unwrap();
        assert_eq!(uplata.delta(), 1_000);
        let isplata = valid_form("isplata", "10,00").validate().unwrap();
        assert_eq!(isplata.delta(), -1_000);
    }

    #[test]
    fn test_amount_must_be_positive() {
        let errors = valid_form("uplata", "0").validate().unwrap_err();
        assert!(errors.has("iznos"));
    }

    #[test]
    fn test_unknown_direction() {
        let errors = valid_form("povrat", "1").validate().unwrap_err();
        assert!(errors.has("smjer"));
    }
}

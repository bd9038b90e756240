//! Project financial card (account)
//!
//! `stanje` always equals `pocetno_stanje` plus incoming minus outgoing
//! transactions and never goes below zero. Users never edit it directly.

use serde::{Deserialize, Serialize};

use super::money::format_amount;
use super::validation::{is_valid_iban, normalize_iban, FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Kartica {
    pub id: i64,
    pub projekt_id: i64,
    pub projekt_kratica: String,
    pub broj: String,
    pub banka: String,
    pub pocetno_stanje: i64,
    pub stanje: i64,
}

impl Kartica {
    pub fn label(&self) -> String {
        format!("{} ({})", self.broj, self.projekt_kratica)
    }
}

impl Tabular for Kartica {
    const COLUMNS: &'static [&'static str] =
        &["Broj", "Projekt", "Banka", "Početno stanje", "Stanje"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.broj),
            Cell::text(&self.projekt_kratica),
            Cell::text(&self.banka),
            Cell::Amount(self.pocetno_stanje),
            Cell::Amount(self.stanje),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KarticaForm {
    pub projekt_id: String,
    pub broj: String,
    pub banka: String,
    pub pocetno_stanje: String,
    pub return_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KarticaInput {
    pub projekt_id: i64,
    pub broj: String,
    pub banka: String,
    pub pocetno_stanje: i64,
}

impl KarticaForm {
    pub fn validate(&self) -> Result<KarticaInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let projekt_id = check.id("projekt_id", "Projekt", &self.projekt_id);
        let broj = normalize_iban(&self.broj);
        if broj.is_empty() {
            check.error("broj", "Broj: obavezan unos");
        } else if !is_valid_iban(&broj) {
            check.error("broj", "Broj: očekuje se HR i 19 znamenki");
        }
        let banka = check.required("banka", "Banka", &self.banka, 100);
        let pocetno_stanje =
            check.amount("pocetno_stanje", "Početno stanje", &self.pocetno_stanje, true);

        let errors = check.into_errors();
        match (projekt_id, pocetno_stanje) {
            (Some(projekt_id), Some(pocetno_stanje)) if errors.is_empty() => Ok(KarticaInput {
                projekt_id,
                broj,
                banka,
                pocetno_stanje,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Kartica> for KarticaForm {
    fn from(k: &Kartica) -> Self {
        Self {
            projekt_id: k.projekt_id.to_string(),
            broj: k.broj.clone(),
            banka: k.banka.clone(),
            pocetno_stanje: format_amount(k.pocetno_stanje),
            return_to: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> KarticaForm {
        KarticaForm {
            projekt_id: "1".to_string(),
            broj: "hr12 1001 0051 8630 0016 0".to_string(),
            banka: "Zagrebačka banka".to_string(),
            pocetno_stanje: "1.000,00".to_string(),
            return_to: String::new(),
        }
    }

    #[test]
    fn test_valid_card_normalizes_number() {
        let input = valid_form().validate().unwrap();
        assert_eq!(input.broj, "HR1210010051863000160");
        assert_eq!(input.pocetno_stanje, 100_000);
    }

    #[test]
    fn test_invalid_number() {
        let mut form = valid_form();
        form.broj = "HR123".to_string();
        assert!(form.validate().unwrap_err().has("broj"));
    }

    #[test]
    fn test_negative_opening_balance() {
        let mut form = valid_form();
        form.pocetno_stanje = "-5".to_string();
        assert!(form.validate().unwrap_err().has("pocetno_stanje"));
    }

    #[test]
    fn test_form_roundtrip_amount() {
        let kartica = Kartica {
            id: 1,
            projekt_id: 1,
            projekt_kratica: "P1".to_string(),
            broj: "HR1210010051863000160".to_string(),
            banka: "Banka".to_string(),
            pocetno_stanje: 123_456,
            stanje: 100,
        };
        let form = KarticaForm::from(&kartica);
        assert_eq!(form.validate().unwrap().pocetno_stanje, 123_456);
    }
}

//! Project documentation model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dokumentacija {
    pub id: i64,
    pub projekt_id: i64,
    pub projekt_kratica: String,
    pub vrsta_dok_id: i64,
    pub vrsta_dok: String,
    pub naziv: String,
    pub datum: NaiveDate,
    pub putanja: Option<String>,
}

impl Tabular for Dokumentacija {
    const COLUMNS: &'static [&'static str] = &[
        "Projekt",
        "Naziv",
        "Vrsta dokumentacije",
        "Datum",
        "Putanja",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.projekt_kratica),
            Cell::text(&self.naziv),
            Cell::text(&self.vrsta_dok),
            Cell::Date(self.datum),
            Cell::opt_text(self.putanja.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DokumentacijaForm {
    pub projekt_id: String,
    pub vrsta_dok_id: String,
    pub naziv: String,
    pub datum: String,
    pub putanja: String,
    pub return_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DokumentacijaInput {
    pub projekt_id: i64,
    pub vrsta_dok_id: i64,
    pub naziv: String,
    pub datum: NaiveDate,
    pub putanja: Option<String>,
}

impl DokumentacijaForm {
    pub fn validate(&self) -> Result<DokumentacijaInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let projekt_id = check.id("projekt_id", "Projekt", &self.projekt_id);
        let vrsta_dok_id = check.id("vrsta_dok_id", "Vrsta dokumentacije", &self.vrsta_dok_id);
        let naziv = check.required("naziv", "Naziv", &self.naziv, 100);
        let datum = check.date("datum", "Datum", &self.datum);
        let putanja = check.optional("putanja", "Putanja", &self.putanja, 255);

        let errors = check.into_errors();
        match (projekt_id, vrsta_dok_id, datum) {
            (Some(projekt_id), Some(vrsta_dok_id), Some(datum)) if errors.is_empty() => {
                Ok(DokumentacijaInput {
                    projekt_id,
                    vrsta_dok_id,
                    naziv,
                    datum,
                    putanja,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Dokumentacija> for DokumentacijaForm {
    fn from(d: &Dokumentacija) -> Self {
        Self {
            projekt_id: d.projekt_id.to_string(),
            vrsta_dok_id: d.vrsta_dok_id.to_string(),
            naziv: d.naziv.clone(),
            datum: d.datum.to_string(),
            putanja: d.putanja.clone().unwrap_or_default(),
            return_to: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_document() {
        let form = DokumentacijaForm {
            projekt_id: "1".to_string(),
            vrsta_dok_id: "2".to_string(),
            naziv: "Ugovor o djelu".to_string(),
            datum: "01.02.2024".to_string(),
            putanja: "\\\\server\\ugovori\\1.pdf".to_string(),
            return_to: String::new(),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.datum, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_path_too_long() {
        let form = DokumentacijaForm {
            projekt_id: "1".to_string(),
            vrsta_dok_id: "2".to_string(),
            naziv: "Ugovor".to_string(),
            datum: "2024-02-01".to_string(),
            putanja: "p".repeat(256),
            return_to: String::new(),
        };
        assert!(form.validate().unwrap_err().has("putanja"));
    }
}

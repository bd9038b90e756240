//! Task model: work done to fulfil a request

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zadatak {
    pub id: i64,
    pub zahtjev_id: i64,
    pub zahtjev_naslov: String,
    pub projekt_kratica: String,
    pub status_id: i64,
    pub status: String,
    pub osoba_id: Option<i64>,
    pub osoba: Option<String>,
    pub osoba_oib: Option<String>,
    pub naziv: String,
    pub opis: Option<String>,
    pub planirani_pocetak: NaiveDate,
    pub planirani_kraj: Option<NaiveDate>,
    pub stvarni_kraj: Option<NaiveDate>,
}

impl Tabular for Zadatak {
    const COLUMNS: &'static [&'static str] = &[
        "Projekt",
        "Zahtjev",
        "Naziv",
        "Status",
        "Osoba",
        "OIB osobe",
        "Planirani početak",
        "Planirani kraj",
        "Stvarni kraj",
        "Opis",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.projekt_kratica),
            Cell::text(&self.zahtjev_naslov),
            Cell::text(&self.naziv),
            Cell::text(&self.status),
            Cell::opt_text(self.osoba.as_deref()),
            Cell::opt_text(self.osoba_oib.as_deref()),
            Cell::Date(self.planirani_pocetak),
            Cell::opt_date(self.planirani_kraj),
            Cell::opt_date(self.stvarni_kraj),
            Cell::opt_text(self.opis.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZadatakForm {
    pub zahtjev_id: String,
    pub status_id: String,
    pub osoba_id: String,
    pub naziv: String,
    pub opis: String,
    pub planirani_pocetak: String,
    pub planirani_kraj: String,
    pub stvarni_kraj: String,
    pub return_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZadatakInput {
    pub zahtjev_id: i64,
    pub status_id: i64,
    pub osoba_id: Option<i64>,
    pub naziv: String,
    pub opis: Option<String>,
    pub planirani_pocetak: NaiveDate,
    pub planirani_kraj: Option<NaiveDate>,
    pub stvarni_kraj: Option<NaiveDate>,
}

impl ZadatakForm {
    pub fn validate(&self) -> Result<ZadatakInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let zahtjev_id = check.id("zahtjev_id", "Zahtjev", &self.zahtjev_id);
        let status_id = check.id("status_id", "Status", &self.status_id);
        let osoba_id = check.optional_id("osoba_id", "Osoba", &self.osoba_id);
        let naziv = check.required("naziv", "Naziv", &self.naziv, 100);
        let opis = check.optional("opis", "Opis", &self.opis, 1000);
        let planirani_pocetak =
            check.date("planirani_pocetak", "Planirani početak", &self.planirani_pocetak);
        let planirani_kraj =
            check.optional_date("planirani_kraj", "Planirani kraj", &self.planirani_kraj);
        let stvarni_kraj = check.optional_date("stvarni_kraj", "Stvarni kraj", &self.stvarni_kraj);
        check.not_before(
            "planirani_kraj",
            "Planirani kraj",
            planirani_kraj,
            planirani_pocetak,
            "Planirani početak",
        );
        check.not_before(
            "stvarni_kraj",
            "Stvarni kraj",
            stvarni_kraj,
            planirani_pocetak,
            "Planirani početak",
        );

        let errors = check.into_errors();
        match (zahtjev_id, status_id, planirani_pocetak) {
            (Some(zahtjev_id), Some(status_id), Some(planirani_pocetak)) if errors.is_empty() => {
                Ok(ZadatakInput {
                    zahtjev_id,
                    status_id,
                    osoba_id,
                    naziv,
                    opis,
                    planirani_pocetak,
                    planirani_kraj,
                    stvarni_kraj,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Zadatak> for ZadatakForm {
    fn from(z: &Zadatak) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        Self {
            zahtjev_id: z.zahtjev_id.to_string(),
            status_id: z.status_id.to_string(),
            osoba_id: z.osoba_id.map(|id| id.to_string()).unwrap_or_default(),
            naziv: z.naziv.clone(),
            opis: z.opis.clone().unwrap_or_default(),
            planirani_pocetak: z.planirani_pocetak.to_string(),
            planirani_kraj: date(z.planirani_kraj),
            stvarni_kraj: date(z.stvarni_kraj),
            return_to: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ZadatakForm {
        ZadatakForm {
            zahtjev_id: "1".to_string(),
            status_id: "1".to_string(),
            osoba_id: String::new(),
            naziv: "Napraviti predložak".to_string(),
            opis: String::new(),
            planirani_pocetak: "2024-06-01".to_string(),
            planirani_kraj: "2024-06-10".to_string(),
            stvarni_kraj: String::new(),
            return_to: String::new(),
        }
    }

    #[test]
    fn test_assignee_optional() {
        let input = valid_form().validate().unwrap();
        assert_eq!(input.osoba_id, None);
    }

    #[test]
    fn test_actual_end_not_before_planned_start() {
        let mut form = valid_form();
        form.stvarni_kraj = "2024-05-31".to_string();
        assert!(form.validate().unwrap_err().has("stvarni_kraj"));

        form.stvarni_kraj = "2024-06-01".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_planned_end_not_before_start() {
        let mut form = valid_form();
        form.planirani_kraj = "2024-05-01".to_string();
        assert!(form.validate().unwrap_err().has("planirani_kraj"));
    }
}

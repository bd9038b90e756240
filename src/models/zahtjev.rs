//! Request model: a piece of work requested on a project

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zahtjev {
    pub id: i64,
    pub projekt_id: i64,
    pub projekt_kratica: String,
    pub vrsta_zahtjeva_id: i64,
    pub vrsta_zahtjeva: String,
    pub naslov: String,
    pub opis: Option<String>,
    pub prioritet: i64,
    pub datum_podnosenja: NaiveDate,
}

impl Zahtjev {
    pub fn label(&self) -> String {
        format!("{}: {}", self.projekt_kratica, self.naslov)
    }
}

impl Tabular for Zahtjev {
    const COLUMNS: &'static [&'static str] = &[
        "Projekt",
        "Naslov",
        "Vrsta zahtjeva",
        "Prioritet",
        "Podnesen",
        "Opis",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.projekt_kratica),
            Cell::text(&self.naslov),
            Cell::text(&self.vrsta_zahtjeva),
            Cell::Int(self.prioritet),
            Cell::Date(self.datum_podnosenja),
            Cell::opt_text(self.opis.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZahtjevForm {
    pub projekt_id: String,
    pub vrsta_zahtjeva_id: String,
    pub naslov: String,
    pub opis: String,
    pub prioritet: String,
    pub datum_podnosenja: String,
    pub return_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZahtjevInput {
    pub projekt_id: i64,
    pub vrsta_zahtjeva_id: i64,
    pub naslov: String,
    pub opis: Option<String>,
    pub prioritet: i64,
    pub datum_podnosenja: NaiveDate,
}

impl ZahtjevForm {
    pub fn validate(&self) -> Result<ZahtjevInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let projekt_id = check.id("projekt_id", "Projekt", &self.projekt_id);
        let vrsta_zahtjeva_id =
            check.id("vrsta_zahtjeva_id", "Vrsta zahtjeva", &self.vrsta_zahtjeva_id);
        let naslov = check.required("naslov", "Naslov", &self.naslov, 100);
        let opis = check.optional("opis", "Opis", &self.opis, 1000);
        let prioritet = check.int_range("prioritet", "Prioritet", &self.prioritet, 1, 5);
        let datum_podnosenja = check.date("datum_podnosenja", "Podnesen", &self.datum_podnosenja);

        let errors = check.into_errors();
        match (projekt_id, vrsta_zahtjeva_id, prioritet, datum_podnosenja) {
            (Some(projekt_id), Some(vrsta_zahtjeva_id), Some(prioritet), Some(datum_podnosenja))
                if errors.is_empty() =>
            {
                Ok(ZahtjevInput {
                    projekt_id,
                    vrsta_zahtjeva_id,
                    naslov,
                    opis,
                    prioritet,
                    datum_podnosenja,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Zahtjev> for ZahtjevForm {
    fn from(z: &Zahtjev) -> Self {
        Self {
            projekt_id: z.projekt_id.to_string(),
            vrsta_zahtjeva_id: z.vrsta_zahtjeva_id.to_string(),
            naslov: z.naslov.clone(),
            opis: z.opis.clone().unwrap_or_default(),
            prioritet: z.prioritet.to_string(),
            datum_podnosenja: z.datum_podnosenja.to_string(),
            return_to: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(prioritet: &str) -> ZahtjevForm {
        ZahtjevForm {
            projekt_id: "1".to_string(),
            vrsta_zahtjeva_id: "1".to_string(),
            naslov: "Izvoz u PDF".to_string(),
            opis: String::new(),
            prioritet: prioritet.to_string(),
            datum_podnosenja: "2024-05-05".to_string(),
            return_to: String::new(),
        }
    }

    #[test]
    fn test_priority_bounds() {
        assert_eq!(form("1").validate().unwrap().prioritet, 1);
        assert_eq!(form("5").validate().unwrap().prioritet, 5);
        assert!(form("0").validate().unwrap_err().has("prioritet"));
        assert!(form("6").validate().unwrap_err().has("prioritet"));
        assert!(form("visok").validate().unwrap_err().has("prioritet"));
    }
}

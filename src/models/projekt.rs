//! Project model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

/// Project with its type name joined in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projekt {
    pub id: i64,
    pub naziv: String,
    pub kratica: String,
    pub opis: Option<String>,
    pub datum_pocetka: NaiveDate,
    pub datum_zavrsetka: Option<NaiveDate>,
    pub vrsta_projekta_id: i64,
    pub vrsta_projekta: String,
}

impl Projekt {
    /// Label used in selects and autocomplete
    pub fn label(&self) -> String {
        format!("{} - {}", self.kratica, self.naziv)
    }
}

impl Tabular for Projekt {
    const COLUMNS: &'static [&'static str] = &[
        "Naziv",
        "Kratica",
        "Vrsta projekta",
        "Početak",
        "Završetak",
        "Opis",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.naziv),
            Cell::text(&self.kratica),
            Cell::text(&self.vrsta_projekta),
            Cell::Date(self.datum_pocetka),
            Cell::opt_date(self.datum_zavrsetka),
            Cell::opt_text(self.opis.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjektForm {
    pub naziv: String,
    pub kratica: String,
    pub opis: String,
    pub datum_pocetka: String,
    pub datum_zavrsetka: String,
    pub vrsta_projekta_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjektInput {
    pub naziv: String,
    pub kratica: String,
    pub opis: Option<String>,
    pub datum_pocetka: NaiveDate,
    pub datum_zavrsetka: Option<NaiveDate>,
    pub vrsta_projekta_id: i64,
}

fn is_valid_kratica(kratica: &str) -> bool {
    kratica
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

impl ProjektForm {
    pub fn validate(&self) -> Result<ProjektInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let naziv = check.required("naziv", "Naziv", &self.naziv, 100);
        let kratica = check.required("kratica", "Kratica", &self.kratica, 20);
        if !kratica.is_empty() && kratica.chars().count() < 2 {
            check.error("kratica", "Kratica: najmanje 2 znaka");
        }
        if !is_valid_kratica(&kratica) {
            check.error(
                "kratica",
                "Kratica: dopuštena su velika slova, znamenke i '-'",
            );
        }
        let opis = check.optional("opis", "Opis", &self.opis, 1000);
        let datum_pocetka = check.date("datum_pocetka", "Početak", &self.datum_pocetka);
        let datum_zavrsetka =
            check.optional_date("datum_zavrsetka", "Završetak", &self.datum_zavrsetka);
        check.not_before(
            "datum_zavrsetka",
            "Završetak",
            datum_zavrsetka,
            datum_pocetka,
            "Početak",
        );
        let vrsta_projekta_id =
            check.id("vrsta_projekta_id", "Vrsta projekta", &self.vrsta_projekta_id);

        let errors = check.into_errors();
        match (datum_pocetka, vrsta_projekta_id) {
            (Some(datum_pocetka), Some(vrsta_projekta_id)) if errors.is_empty() => {
                Ok(ProjektInput {
                    naziv,
                    kratica,
                    opis,
                    datum_pocetka,
                    datum_zavrsetka,
                    vrsta_projekta_id,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Projekt> for ProjektForm {
    fn from(p: &Projekt) -> Self {
        Self {
            naziv: p.naziv.clone(),
            kratica: p.kratica.clone(),
            opis: p.opis.clone().unwrap_or_default(),
            datum_pocetka: p.datum_pocetka.to_string(),
            datum_zavrsetka: p.datum_zavrsetka.map(|d| d.to_string()).unwrap_or_default(),
            vrsta_projekta_id: p.vrsta_projekta_id.to_string(),
        }
    }
}

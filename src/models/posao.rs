//! Job model: a person's engagement on a project

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Posao {
    pub id: i64,
    pub projekt_id: i64,
    pub projekt_kratica: String,
    pub osoba_id: i64,
    pub osoba: String,
    pub osoba_oib: String,
    pub uloga_id: i64,
    pub uloga: String,
    pub vrsta_posla_id: i64,
    pub vrsta_posla: String,
    pub opis: Option<String>,
    /// Hourly rate in cents
    pub satnica: i64,
    pub datum_od: NaiveDate,
    pub datum_do: Option<NaiveDate>,
}

impl Tabular for Posao {
    const COLUMNS: &'static [&'static str] = &[
        "Projekt",
        "Osoba",
        "OIB osobe",
        "Uloga",
        "Vrsta posla",
        "Satnica",
        "Od",
        "Do",
        "Opis",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.projekt_kratica),
            Cell::text(&self.osoba),
            Cell::text(&self.osoba_oib),
            Cell::text(&self.uloga),
            Cell::text(&self.vrsta_posla),
            Cell::Amount(self.satnica),
            Cell::Date(self.datum_od),
            Cell::opt_date(self.datum_do),
            Cell::opt_text(self.opis.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PosaoForm {
    pub projekt_id: String,
    pub osoba_id: String,
    pub uloga_id: String,
    pub vrsta_posla_id: String,
    pub opis: String,
    pub satnica: String,
    pub datum_od: String,
    pub datum_do: String,
    pub return_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PosaoInput {
    pub projekt_id: i64,
    pub osoba_id: i64,
    pub uloga_id: i64,
    pub vrsta_posla_id: i64,
    pub opis: Option<String>,
    pub satnica: i64,
    pub datum_od: NaiveDate,
    pub datum_do: Option<NaiveDate>,
}

impl PosaoForm {
    pub fn validate(&self) -> Result<PosaoInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let projekt_id = check.id("projekt_id", "Projekt", &self.projekt_id);
        let osoba_id = check.id("osoba_id", "Osoba", &self.osoba_id);
        let uloga_id = check.id("uloga_id", "Uloga", &self.uloga_id);
        let vrsta_posla_id = check.id("vrsta_posla_id", "Vrsta posla", &self.vrsta_posla_id);
        let opis = check.optional("opis", "Opis", &self.opis, 1000);
        let satnica = check.amount("satnica", "Satnica", &self.satnica, true);
        let datum_od = check.date("datum_od", "Od", &self.datum_od);
        let datum_do = check.optional_date("datum_do", "Do", &self.datum_do);
        check.not_before("datum_do", "Do", datum_do, datum_od, "Od");

        let errors = check.into_errors();
        match (projekt_id, osoba_id, uloga_id, vrsta_posla_id, satnica, datum_od) {
            (
                Some(projekt_id),
                Some(osoba_id),
                Some(uloga_id),
                Some(vrsta_posla_id),
                Some(satnica),
                Some(datum_od),
            ) if errors.is_empty() => Ok(PosaoInput {
                projekt_id,
                osoba_id,
                uloga_id,
                vrsta_posla_id,
                opis,
                satnica,
                datum_od,
                datum_do,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Posao> for PosaoForm {
    fn from(p: &Posao) -> Self {
        Self {
            projekt_id: p.projekt_id.to_string(),
            osoba_id: p.osoba_id.to_string(),
            uloga_id: p.uloga_id.to_string(),
            vrsta_posla_id: p.vrsta_posla_id.to_string(),
            opis: p.opis.clone().unwrap_or_default(),
            satnica: super::money::format_amount(p.satnica),
            datum_od: p.datum_od.to_string(),
            datum_do: p.datum_do.map(|d| d.to_string()).unwrap_or_default(),
            return_to: String::new(),
        }
    }
}

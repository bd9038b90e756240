//! Business partner model

use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: i64,
    pub naziv: String,
    pub oib: String,
    pub adresa: Option<String>,
    pub email: Option<String>,
    pub vrsta_partnera_id: i64,
    pub vrsta_partnera: String,
}

impl Partner {
    pub fn label(&self) -> String {
        format!("{} ({})", self.naziv, self.oib)
    }
}

impl Tabular for Partner {
    const COLUMNS: &'static [&'static str] =
        &["Naziv", "OIB", "Vrsta partnera", "Adresa", "Email"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.naziv),
            Cell::text(&self.oib),
            Cell::text(&self.vrsta_partnera),
            Cell::opt_text(self.adresa.as_deref()),
            Cell::opt_text(self.email.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerForm {
    pub naziv: String,
    pub oib: String,
    pub adresa: String,
    pub email: String,
    pub vrsta_partnera_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerInput {
    pub naziv: String,
    pub oib: String,
    pub adresa: Option<String>,
    pub email: Option<String>,
    pub vrsta_partnera_id: i64,
}

impl PartnerForm {
    pub fn validate(&self) -> Result<PartnerInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let naziv = check.required("naziv", "Naziv", &self.naziv, 100);
        let oib = check.oib("oib", "OIB", &self.oib);
        let adresa = check.optional("adresa", "Adresa", &self.adresa, 200);
        let email = check.email("email", "Email", &self.email);
        let vrsta_partnera_id =
            check.id("vrsta_partnera_id", "Vrsta partnera", &self.vrsta_partnera_id);

        let errors = check.into_errors();
        match vrsta_partnera_id {
            Some(vrsta_partnera_id) if errors.is_empty() => Ok(PartnerInput {
                naziv,
                oib,
                adresa,
                email,
                vrsta_partnera_id,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Partner> for PartnerForm {
    fn from(p: &Partner) -> Self {
        Self {
            naziv: p.naziv.clone(),
            oib: p.oib.clone(),
            adresa: p.adresa.clone().unwrap_or_default(),
            email: p.email.clone().unwrap_or_default(),
            vrsta_partnera_id: p.vrsta_partnera_id.to_string(),
        }
    }
}

//! Person model

use serde::{Deserialize, Serialize};

use super::validation::{FormCheck, ValidationErrors};
use crate::reports::{Cell, Tabular};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Osoba {
    pub id: i64,
    pub ime: String,
    pub prezime: String,
    pub oib: String,
    pub email: Option<String>,
    pub telefon: Option<String>,
}

impl Osoba {
    /// "Prezime Ime (OIB)"
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.prezime, self.ime, self.oib)
    }
}

impl Tabular for Osoba {
    const COLUMNS: &'static [&'static str] = &["Ime", "Prezime", "OIB", "Email", "Telefon"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.ime),
            Cell::text(&self.prezime),
            Cell::text(&self.oib),
            Cell::opt_text(self.email.as_deref()),
            Cell::opt_text(self.telefon.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OsobaForm {
    pub ime: String,
    pub prezime: String,
    pub oib: String,
    pub email: String,
    pub telefon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsobaInput {
    pub ime: String,
    pub prezime: String,
    pub oib: String,
    pub email: Option<String>,
    pub telefon: Option<String>,
}

impl OsobaForm {
    pub fn validate(&self) -> Result<OsobaInput, ValidationErrors> {
        let mut check = FormCheck::new();
        let ime = check.required("ime", "Ime", &self.ime, 50);
        let prezime = check.required("prezime", "Prezime", &self.prezime, 50);
        let oib = check.oib("oib", "OIB", &self.oib);
        let email = check.email("email", "Email", &self.email);
        let telefon = check.optional("telefon", "Telefon", &self.telefon, 20);

        let errors = check.into_errors();
        if errors.is_empty() {
            Ok(OsobaInput {
                ime,
                prezime,
                oib,
                email,
                telefon,
            })
        } else {
            Err(errors)
        }
    }
}

impl From<&Osoba> for OsobaForm {
    fn from(o: &Osoba) -> Self {
        Self {
            ime: o.ime.clone(),
            prezime: o.prezime.clone(),
            oib: o.oib.clone(),
            email: o.email.clone().unwrap_or_default(),
            telefon: o.telefon.clone().unwrap_or_default(),
        }
    }
}

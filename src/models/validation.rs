//! Form validation
//!
//! HTML forms post every field as a string. `FormCheck` turns those strings
//! into typed values and collects per-field messages into
//! `ValidationErrors`, which the form templates render next to each input.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::money::parse_amount;

/// Largest accepted amount, 999.999.999.999,99
pub const MAX_AMOUNT: i64 = 99_999_999_999_999;

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single message on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }

    /// Messages in `other` replace the messages of the same fields here
    pub fn override_with(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.insert(field, messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All messages in field order
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.fields.values().flatten().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.messages().collect();
        write!(f, "{}", joined.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulating field parser used by every `*Form::validate`
#[derive(Debug, Default)]
pub struct FormCheck {
    errors: ValidationErrors,
}

impl FormCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// Trimmed, non-empty text of at most `max` characters
    pub fn required(&mut self, field: &str, label: &str, value: &str, max: usize) -> String {
        let value = value.trim();
        if value.is_empty() {
            self.error(field, format!("{}: obavezan unos", label));
        } else if value.chars().count() > max {
            self.error(field, format!("{}: najviše {} znakova", label, max));
        }
        value.to_string()
    }

    /// Trimmed text of at most `max` characters; empty becomes `None`
    pub fn optional(&mut self, field: &str, label: &str, value: &str, max: usize) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.chars().count() > max {
            self.error(field, format!("{}: najviše {} znakova", label, max));
        }
        Some(value.to_string())
    }

    pub fn date(&mut self, field: &str, label: &str, value: &str) -> Option<NaiveDate> {
        if value.trim().is_empty() {
            self.error(field, format!("{}: obavezan unos", label));
            return None;
        }
        self.optional_date(field, label, value)
    }

    pub fn optional_date(&mut self, field: &str, label: &str, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let parsed = parse_date(value);
        if parsed.is_none() {
            self.error(field, format!("{}: neispravan datum", label));
        }
        parsed
    }

    /// Reports an error unless `later` is on or after `earlier`
    pub fn not_before(
        &mut self,
        field: &str,
        label: &str,
        later: Option<NaiveDate>,
        earlier: Option<NaiveDate>,
        earlier_label: &str,
    ) {
        if let (Some(later), Some(earlier)) = (later, earlier) {
            if later < earlier {
                self.error(
                    field,
                    format!("{}: ne može biti prije datuma '{}'", label, earlier_label),
                );
            }
        }
    }

    /// Required foreign key chosen from a select
    pub fn id(&mut self, field: &str, label: &str, value: &str) -> Option<i64> {
        let value = value.trim();
        if value.is_empty() {
            self.error(field, format!("{}: odaberite vrijednost", label));
            return None;
        }
        self.optional_id(field, label, value)
    }

    pub fn optional_id(&mut self, field: &str, label: &str, value: &str) -> Option<i64> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                self.error(field, format!("{}: neispravan odabir", label));
                None
            }
        }
    }

    /// Integer within an inclusive range
    pub fn int_range(&mut self, field: &str, label: &str, value: &str, min: i64, max: i64) -> Option<i64> {
        let value = value.trim();
        if value.is_empty() {
            self.error(field, format!("{}: obavezan unos", label));
            return None;
        }
        match value.parse::<i64>() {
            Ok(n) if (min..=max).contains(&n) => Some(n),
            _ => {
                self.error(field, format!("{}: mora biti broj od {} do {}", label, min, max));
                None
            }
        }
    }

    /// Amount in cents up to `MAX_AMOUNT`; zero allowed only when `allow_zero`
    pub fn amount(&mut self, field: &str, label: &str, value: &str, allow_zero: bool) -> Option<i64> {
        if value.trim().is_empty() {
            self.error(field, format!("{}: obavezan unos", label));
            return None;
        }
        match parse_amount(value) {
            Some(cents) if cents > MAX_AMOUNT => {
                self.error(field, format!("{}: prevelik", label));
                None
            }
            Some(cents) if cents > 0 || (allow_zero && cents == 0) => Some(cents),
            Some(_) if allow_zero => {
                self.error(field, format!("{}: ne može biti negativan", label));
                None
            }
            Some(_) => {
                self.error(field, format!("{}: mora biti veći od nule", label));
                None
            }
            None => {
                self.error(field, format!("{}: neispravan iznos", label));
                None
            }
        }
    }

    pub fn oib(&mut self, field: &str, label: &str, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            self.error(field, format!("{}: obavezan unos", label));
        } else if !is_valid_oib(value) {
            self.error(field, format!("{}: neispravan OIB", label));
        }
        value.to_string()
    }

    pub fn email(&mut self, field: &str, label: &str, value: &str) -> Option<String> {
        let email = self.optional(field, label, value, 100)?;
        if !is_valid_email(&email) {
            self.error(field, format!("{}: neispravna adresa e-pošte", label));
        }
        Some(email)
    }
}

/// Parses `YYYY-MM-DD` (HTML date inputs) or `dd.mm.yyyy` with an optional trailing dot
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value.trim_end_matches('.'), "%d.%m.%Y"))
        .ok()
}

/// Croatian display format
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// OIB check: 11 digits, last one is the ISO 7064 MOD 11,10 check digit
pub fn is_valid_oib(oib: &str) -> bool {
    if oib.len() != 11 || !oib.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = oib.bytes().map(|b| u32::from(b - b'0')).collect();
    let mut acc = 10;
    for &digit in &digits[..10] {
        acc = (acc + digit) % 10;
        if acc == 0 {
            acc = 10;
        }
        acc = (acc * 2) % 11;
    }

    let check = match 11 - acc {
        10 => 0,
        n => n,
    };
    check == digits[10]
}

/// Croatian account number: "HR" followed by 19 digits
pub fn is_valid_iban(iban: &str) -> bool {
    match iban.strip_prefix("HR") {
        Some(rest) => rest.len() == 19 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Uppercases and removes spaces so "hr12 1001 ..." and "HR121001..." compare equal
pub fn normalize_iban(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

//! Select options and autocomplete suggestions

use serde::{Deserialize, Serialize};

/// `{ id, label }` pair shown in a select or returned by autocomplete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectItem {
    pub id: i64,
    pub label: String,
}

impl SelectItem {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

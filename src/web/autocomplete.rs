//! Autocomplete suggestions
//!
//! GET /autocomplete/{osobe|partneri|projekti}?term=..

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::error::{WebError, WebResult};
use super::middleware::AppState;
use crate::models::SelectItem;
use crate::services::ServiceError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TermQuery {
    pub term: String,
}

pub async fn suggest(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Query(query): Query<TermQuery>,
) -> WebResult<Json<Vec<SelectItem>>> {
    let term = query.term.trim();
    let items = match source.as_str() {
        "osobe" => state.services.osobe.search(term).await?,
        "partneri" => state.services.partneri.search(term).await?,
        "projekti" => state.services.projekti.search(term).await?,
        other => {
            return Err(WebError::NotFound(format!(
                "Nepoznat izvor prijedloga: {}",
                other
            )))
        }
    };
    Ok(Json(items))
}

/// Text shown next to a posted person id; unknown ids show nothing
pub async fn osoba_label(state: &AppState, id: &str) -> WebResult<String> {
    let Ok(id) = id.trim().parse::<i64>() else {
        return Ok(String::new());
    };
    match state.services.osobe.get(id).await {
        Ok(osoba) => Ok(osoba.label()),
        Err(ServiceError::NotFound(_)) => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

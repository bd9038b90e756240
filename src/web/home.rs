//! Home page: record counts and request statistics

use axum::{extract::State, response::Response};
use serde::Serialize;

use super::crud::{Listing, Resource};
use super::error::WebResult;
use super::flash::IncomingFlash;
use super::middleware::AppState;
use super::page::Page;
use super::{
    dokumentacija, kartice, osobe, partneri, poslovi, projekti, transakcije, zadaci, zahtjevi,
};
use crate::models::LookupKind;

#[derive(Debug, Serialize)]
struct Tile {
    title: &'static str,
    url: &'static str,
    count: i64,
}

async fn tile<L: Listing>(resource: &Resource, listing: &L) -> WebResult<Tile> {
    Ok(Tile {
        title: resource.title,
        url: resource.base,
        count: listing.count().await?,
    })
}

pub async fn home(State(state): State<AppState>, flash: IncomingFlash) -> WebResult<Response> {
    let services = &state.services;
    let entities = vec![
        tile(&projekti::RESOURCE, services.projekti.as_ref()).await?,
        tile(&osobe::RESOURCE, services.osobe.as_ref()).await?,
        tile(&partneri::RESOURCE, services.partneri.as_ref()).await?,
        tile(&poslovi::RESOURCE, services.poslovi.as_ref()).await?,
        tile(&dokumentacija::RESOURCE, services.dokumentacija.as_ref()).await?,
        tile(&kartice::RESOURCE, services.kartice.as_ref()).await?,
        tile(&transakcije::RESOURCE, services.transakcije.as_ref()).await?,
        tile(&zahtjevi::RESOURCE, services.zahtjevi.as_ref()).await?,
        tile(&zadaci::RESOURCE, services.zadaci.as_ref()).await?,
    ];

    let mut lookups = Vec::with_capacity(LookupKind::ALL.len());
    for kind in LookupKind::ALL {
        lookups.push(Tile {
            title: kind.title(),
            url: kind.path(),
            count: services.lookups.count(kind).await?,
        });
    }

    Page::new("home.html", "Projekti")
        .with("entities", &entities)
        .with("lookups", &lookups)
        .with("stats", &state.request_stats.snapshot())
        .render(&state, flash)
}

//! Shared list, detail, export and import plumbing
//!
//! Each entity module describes itself with a `Resource` and implements
//! `Listing` for its service; the handlers here do the rest.

use async_trait::async_trait;
use axum::extract::Multipart;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Local;
use serde::Serialize;

use super::common::{back_to, download, format_size, read_file_field, ReturnTo};
use super::error::{WebError, WebResult};
use super::flash::{Flash, IncomingFlash};
use super::middleware::AppState;
use super::page::Page;
use crate::models::{ListQuery, ListWindow, PagingInfo};
use crate::reports::{excel, pdf, DisplayRow, Report, Tabular};
use crate::services::{import_workbook, RowImporter, ServiceError, ServiceResult};

/// Routing and naming of one list
#[derive(Debug, Clone, Copy)]
pub struct Resource {
    pub title: &'static str,
    pub base: &'static str,
    /// Master entities have a detail page at `{base}/{id}`
    pub detail: bool,
}

impl Resource {
    /// File name stem for downloads, e.g. `projekti`
    pub fn file_stem(&self) -> &'static str {
        self.base.trim_start_matches('/')
    }

    pub fn edit_url(&self, id: i64) -> String {
        format!("{}/{}/edit", self.base, id)
    }

    pub fn detail_url(&self, id: i64) -> String {
        format!("{}/{}", self.base, id)
    }
}

/// Paged, sorted rows of one table
#[async_trait]
pub trait Listing: Send + Sync {
    type Row: Tabular + Send + Sync;

    async fn count(&self) -> ServiceResult<i64>;

    async fn rows(&self, window: &ListWindow) -> ServiceResult<Vec<Self::Row>>;

    fn id(row: &Self::Row) -> i64;
}

pub fn display_rows<L: Listing>(rows: &[L::Row]) -> Vec<DisplayRow> {
    rows.iter()
        .map(|row| DisplayRow::new(L::id(row), &row.cells()))
        .collect()
}

#[derive(Debug, Serialize)]
struct ColumnHead {
    label: &'static str,
    url: String,
    active: bool,
    ascending: bool,
}

/// Index page; a page past the end redirects to the last page
pub async fn index<L: Listing>(
    state: &AppState,
    resource: &Resource,
    listing: &L,
    query: ListQuery,
    flash: IncomingFlash,
) -> WebResult<Response> {
    let total = listing.count().await?;
    let paging = PagingInfo::new(
        &query,
        total,
        state.paging.page_size,
        <L::Row as Tabular>::COLUMNS.len(),
        resource.base,
    );
    if paging.is_past_end() {
        return Ok(Redirect::to(&paging.last_page_url()).into_response());
    }

    let rows = listing.rows(&paging.window()).await?;
    let columns: Vec<ColumnHead> = <L::Row as Tabular>::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, &label)| ColumnHead {
            label,
            url: paging.sort_url(i + 1),
            active: paging.sort == i + 1,
            ascending: paging.ascending,
        })
        .collect();

    Page::new("list.html", resource.title)
        .with("base", resource.base)
        .with("detail", &resource.detail)
        .with("columns", &columns)
        .with("rows", &display_rows::<L>(&rows))
        .with("pager", &paging.view())
        .with("sort", &paging.sort)
        .with("ascending", &paging.ascending)
        .with("current_url", &paging.url(paging.current_page))
        .render(state, flash)
}

async fn export_report<L: Listing>(
    resource: &Resource,
    listing: &L,
    query: &ListQuery,
) -> WebResult<Report> {
    let rows = listing
        .rows(&ListWindow::all(query.sort, query.ascending))
        .await?;
    Ok(Report::from_rows(resource.title, &rows))
}

pub async fn export_xlsx<L: Listing>(
    resource: &Resource,
    listing: &L,
    query: ListQuery,
) -> WebResult<Response> {
    let report = export_report(resource, listing, &query).await?;
    match excel::to_xlsx(&report) {
        Ok(bytes) => download(
            bytes,
            excel::CONTENT_TYPE,
            &format!("{}.xlsx", resource.file_stem()),
        ),
        Err(e) => {
            tracing::error!("Excel export of {} failed: {:#}", resource.base, e);
            Ok(Flash::error("Izvoz u Excel nije uspio").redirect(resource.base))
        }
    }
}

pub async fn export_pdf<L: Listing>(
    resource: &Resource,
    listing: &L,
    query: ListQuery,
) -> WebResult<Response> {
    let report = export_report(resource, listing, &query).await?;
    match pdf::to_pdf(&report, Local::now().date_naive()) {
        Ok(bytes) => download(
            bytes,
            pdf::CONTENT_TYPE,
            &format!("{}.pdf", resource.file_stem()),
        ),
        Err(e) => {
            tracing::error!("PDF export of {} failed: {:#}", resource.base, e);
            Ok(Flash::error("Izvoz u PDF nije uspio").redirect(resource.base))
        }
    }
}

/// Upload form listing the headers the importer understands
pub fn import_form(
    state: &AppState,
    resource: &Resource,
    required: &[&str],
    columns: &[&str],
    flash: IncomingFlash,
) -> WebResult<Response> {
    Page::new("import.html", &format!("Uvoz: {}", resource.title))
        .with("base", resource.base)
        .with("required", required)
        .with("columns", columns)
        .with("max_rows", &state.upload_config.max_import_rows)
        .with("max_size", &format_size(state.upload_config.max_file_size))
        .render(state, flash)
}

/// Import the uploaded workbook and send back the per-row result sheet
pub async fn import_upload(
    state: &AppState,
    resource: &Resource,
    importer: &dyn RowImporter,
    mut multipart: Multipart,
) -> WebResult<Response> {
    let back = format!("{}/import", resource.base);
    let max_size = state.upload_config.max_file_size;

    let bytes = match read_file_field(&mut multipart, "datoteka").await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Ok(Flash::error("Odaberite Excel datoteku").redirect(&back)),
        Err(e) => {
            tracing::warn!("Upload to {} rejected: {}", resource.base, e);
            return Ok(Flash::error(format!(
                "Datoteka nije primljena (najviše {})",
                format_size(max_size)
            ))
            .redirect(&back));
        }
    };
    if bytes.len() as u64 > max_size {
        return Ok(Flash::error(format!(
            "Datoteka je veća od dopuštenih {}",
            format_size(max_size)
        ))
        .redirect(&back));
    }

    match import_workbook(importer, &bytes, state.upload_config.max_import_rows).await {
        Ok(summary) => {
            let flash = if summary.failed == 0 {
                Flash::success(summary.message())
            } else {
                Flash::error(summary.message())
            };
            let mut response = download(
                summary.workbook,
                excel::CONTENT_TYPE,
                &format!("{}-rezultat.xlsx", resource.file_stem()),
            )?;
            flash.attach(&mut response);
            Ok(response)
        }
        Err(ServiceError::Validation(errors)) => Ok(Flash::error(errors.to_string()).redirect(&back)),
        Err(e) => Err(e.into()),
    }
}

/// Redirect after a delete; refusals come back as an error banner
pub fn deleted(
    result: ServiceResult<()>,
    resource: &Resource,
    back: &ReturnTo,
    message: &str,
) -> WebResult<Response> {
    let to = back.or(resource.base);
    match result {
        Ok(()) => Ok(Flash::success(message).redirect(to)),
        Err(ServiceError::Internal(e)) => Err(WebError::Internal(e)),
        Err(e) => Ok(Flash::error(e.to_string()).redirect(to)),
    }
}

#[derive(Debug, Serialize)]
pub struct Fact {
    pub label: &'static str,
    pub value: String,
}

/// Child rows listed on a master page
#[derive(Debug, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub base: &'static str,
    pub detail: bool,
    pub columns: &'static [&'static str],
    pub rows: Vec<DisplayRow>,
    pub create_url: Option<String>,
}

impl Section {
    pub fn new<T: Tabular>(
        resource: &Resource,
        rows: &[T],
        id: impl Fn(&T) -> i64,
    ) -> Self {
        Self {
            title: resource.title,
            base: resource.base,
            detail: resource.detail,
            columns: T::COLUMNS,
            rows: rows
                .iter()
                .map(|row| DisplayRow::new(id(row), &row.cells()))
                .collect(),
            create_url: None,
        }
    }

    /// "Dodaj" link preselecting the master, coming back here afterwards
    pub fn create_with(mut self, param: &str, master_id: i64, self_url: &str) -> Self {
        self.create_url = Some(format!(
            "{}/create?{}={}&return_to={}",
            self.base,
            param,
            master_id,
            urlencoding::encode(self_url)
        ));
        self
    }
}

/// Master record with its child sections
#[derive(Debug, Serialize)]
pub struct DetailView {
    pub facts: Vec<Fact>,
    pub sections: Vec<Section>,
    pub edit_url: String,
    pub delete_url: String,
    pub back_url: &'static str,
    pub self_url: String,
}

impl DetailView {
    /// Facts are the record's own list columns
    pub fn new<T: Tabular>(resource: &Resource, id: i64, record: &T) -> Self {
        let facts = T::COLUMNS
            .iter()
            .zip(record.cells())
            .map(|(&label, cell)| Fact {
                label,
                value: cell.display(),
            })
            .collect();
        Self {
            facts,
            sections: Vec::new(),
            edit_url: resource.edit_url(id),
            delete_url: format!("{}/{}/delete", resource.base, id),
            back_url: resource.base,
            self_url: resource.detail_url(id),
        }
    }

    pub fn fact(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.facts.push(Fact {
            label,
            value: value.into(),
        });
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn render(
        self,
        state: &AppState,
        title: &str,
        flash: IncomingFlash,
    ) -> WebResult<Response> {
        Page::new("detail.html", title)
            .with("detail", &self)
            .render(state, flash)
    }
}

/// Redirect after a successful save
pub fn saved(message: &str, return_to: &str, fallback: &str) -> Response {
    Flash::success(message).redirect(back_to(return_to, fallback))
}

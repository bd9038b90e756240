//! Paging and sorting for list pages
//!
//! Every index page takes `?page=&sort=&ascending=`. `sort` is a 1-based
//! column number; repositories turn it into SQL through a `SortColumns`
//! whitelist so only known expressions reach the query.

use serde::{Deserialize, Serialize};

fn default_page() -> i64 {
    1
}

fn default_sort() -> usize {
    1
}

fn default_ascending() -> bool {
    true
}

/// Query string of an index page
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_sort")]
    pub sort: usize,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            sort: default_sort(),
            ascending: default_ascending(),
        }
    }
}

/// Whitelisted ORDER BY expressions of one list, in column order
#[derive(Debug, Clone, Copy)]
pub struct SortColumns {
    id: &'static str,
    columns: &'static [&'static str],
}

impl SortColumns {
    pub const fn new(id: &'static str, columns: &'static [&'static str]) -> Self {
        Self { id, columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Out-of-range sort numbers fall back to the first column
    pub fn normalize(&self, sort: usize) -> usize {
        if sort >= 1 && sort <= self.columns.len() {
            sort
        } else {
            1
        }
    }

    /// `"<expr> ASC|DESC, <id> ASC"`; the id keeps paging stable on ties
    pub fn order_by(&self, sort: usize, ascending: bool) -> String {
        let direction = if ascending { "ASC" } else { "DESC" };
        match self.columns.get(self.normalize(sort) - 1) {
            Some(expr) => format!("{} {}, {} ASC", expr, direction, self.id),
            None => format!("{} ASC", self.id),
        }
    }
}

/// Sorted slice of rows; `limit = -1` is SQLite's "no limit"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListWindow {
    pub sort: usize,
    pub ascending: bool,
    pub limit: i64,
    pub offset: i64,
}

impl ListWindow {
    /// Every row, sorted
    pub fn all(sort: usize, ascending: bool) -> Self {
        Self {
            sort,
            ascending,
            limit: -1,
            offset: 0,
        }
    }
}

/// Paging state of one rendered list
#[derive(Debug, Clone, PartialEq)]
pub struct PagingInfo {
    pub current_page: u32,
    pub items_per_page: u32,
    pub total_items: i64,
    pub sort: usize,
    pub ascending: bool,
    pub base_url: String,
}

impl PagingInfo {
    /// Page numbers below 1 become 1; sort falls back to column 1 when out of range
    pub fn new(
        query: &ListQuery,
        total_items: i64,
        items_per_page: u32,
        columns: usize,
        base_url: impl Into<String>,
    ) -> Self {
        let current_page = query.page.clamp(1, i64::from(u32::MAX)) as u32;
        let sort = if query.sort >= 1 && query.sort <= columns {
            query.sort
        } else {
            1
        };

        Self {
            current_page,
            items_per_page: items_per_page.max(1),
            total_items: total_items.max(0),
            sort,
            ascending: query.ascending,
            base_url: base_url.into(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        let per_page = i64::from(self.items_per_page);
        ((self.total_items + per_page - 1) / per_page) as u32
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.current_page - 1) * i64::from(self.items_per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// True when rows exist but the requested page lies beyond the last one
    pub fn is_past_end(&self) -> bool {
        self.total_items > 0 && self.current_page > self.total_pages()
    }

    pub fn window(&self) -> ListWindow {
        ListWindow {
            sort: self.sort,
            ascending: self.ascending,
            limit: i64::from(self.items_per_page),
            offset: self.offset(),
        }
    }

    pub fn url(&self, page: u32) -> String {
        format!(
            "{}?page={}&sort={}&ascending={}",
            self.base_url, page, self.sort, self.ascending
        )
    }

    pub fn last_page_url(&self) -> String {
        self.url(self.total_pages().max(1))
    }

    /// Clicking the active column flips the direction; another column starts ascending
    pub fn sort_url(&self, column: usize) -> String {
        let ascending = if column == self.sort {
            !self.ascending
        } else {
            true
        };
        format!(
            "{}?page=1&sort={}&ascending={}",
            self.base_url, column, ascending
        )
    }

    /// Template-facing pager
    pub fn view(&self) -> PagerView {
        let total_pages = self.total_pages();
        let pages = (1..=total_pages)
            .map(|number| PageLink {
                number,
                url: self.url(number),
                active: number == self.current_page,
            })
            .collect();

        PagerView {
            current_page: self.current_page,
            total_pages,
            total_items: self.total_items,
            prev_url: self.has_prev().then(|| self.url(self.current_page - 1)),
            next_url: self.has_next().then(|| self.url(self.current_page + 1)),
            pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PagerView {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: i64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub pages: Vec<PageLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
    pub active: bool,
}

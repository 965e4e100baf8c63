//! This modules defines the common functionality for paging data.

use maud::{Markup, html};

use crate::{Error, html::LINK_STYLE};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of items to display per page.
    pub page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            max_pages: 5,
        }
    }
}

/// The query value that selects the last page.
pub const LAST_PAGE: &str = "last";

/// A page of data resolved from the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The current page number, starting from 1.
    pub number: u64,
    /// The total number of pages, at least 1.
    pub page_count: u64,
    /// The maximum number of items on the page.
    pub limit: u64,
    /// The number of items before the first item on the page.
    pub offset: u64,
}

impl Page {
    /// Resolve the requested page for a collection of `item_count` items.
    ///
    /// A missing page selects the first page and [LAST_PAGE] selects the last
    /// page. An empty collection has a single, empty page.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage] if `requested_page` is not a positive
    /// integer or is past the last page.
    pub fn resolve(
        requested_page: Option<&str>,
        item_count: u64,
        page_size: u64,
    ) -> Result<Self, Error> {
        let page_size = page_size.max(1);
        let page_count = item_count.div_ceil(page_size).max(1);

        let number = match requested_page.map(str::trim) {
            None | Some("") => 1,
            Some(LAST_PAGE) => page_count,
            Some(raw_page) => raw_page
                .parse::<u64>()
                .map_err(|_| Error::InvalidPage(raw_page.to_owned()))?,
        };

        if number == 0 || number > page_count {
            return Err(Error::InvalidPage(number.to_string()));
        }

        Ok(Self {
            number,
            page_count,
            limit: page_size,
            offset: (number - 1) * page_size,
        })
    }

    /// The `LIMIT` and `OFFSET` values for an SQL query.
    ///
    /// SQLite treats a negative `LIMIT` as no limit at all, so values that do
    /// not fit in an `i64` saturate instead of wrapping.
    pub fn sql_limit_offset(&self) -> (i64, i64) {
        (
            i64::try_from(self.limit).unwrap_or(i64::MAX),
            i64::try_from(self.offset).unwrap_or(i64::MAX),
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render the pagination indicator for `page`.
///
/// `page_url` creates the link for a page number. Nothing is rendered when
/// there is only a single page.
pub fn pagination_view(page: Page, max_pages: u64, page_url: impl Fn(u64) -> String) -> Markup {
    if page.page_count <= 1 {
        return html! {};
    }

    let indicators = create_pagination_indicators(page.number, page.page_count, max_pages);

    html! {
        nav class="pagination flex justify-center w-full mt-4" aria-label="Pagination"
        {
            ul class="pagination flex items-center gap-2 text-sm"
            {
                @for indicator in &indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(page_number) => {
                                a href=(page_url(*page_number)) class=(LINK_STYLE)
                                {
                                    (page_number)
                                }
                            }
                            PaginationIndicator::CurrPage(page_number) => {
                                p aria-current="page" class="font-bold px-2"
                                {
                                    (page_number)
                                }
                            }
                            PaginationIndicator::Ellipsis => {
                                span class="px-2" { "..." }
                            }
                            PaginationIndicator::BackButton(page_number) => {
                                a href=(page_url(*page_number)) class=(LINK_STYLE)
                                {
                                    "Back"
                                }
                            }
                            PaginationIndicator::NextButton(page_number) => {
                                a href=(page_url(*page_number)) class=(LINK_STYLE)
                                {
                                    "Next"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

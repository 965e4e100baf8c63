//! Categories listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_action_button,
    },
    navigation::NavBar,
    pagination::{Page, PaginationConfig, pagination_view},
};

use super::{Category, count_categories, db::map_row};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for the categories listing page.
#[derive(Debug, Default, Deserialize)]
pub struct CategoriesQuery {
    /// The page number to display, starting from 1, or "last".
    pub page: Option<String>,
}

/// A category with the number of expenses that belong to it.
#[derive(Debug, Clone, PartialEq)]
struct CategoryListItem {
    category: Category,
    expense_count: u32,
}

/// Render one page of categories with their expense counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Query(query): Query<CategoriesQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category_count = count_categories(&connection)
        .inspect_err(|error| tracing::error!("Could not count categories: {error}"))?;
    let page = Page::resolve(
        query.page.as_deref(),
        category_count,
        state.pagination_config.page_size,
    )?;

    let items = get_category_list_page(page, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(categories_view(&items, page, state.pagination_config.max_pages).into_response())
}

fn get_category_list_page(
    page: Page,
    connection: &Connection,
) -> Result<Vec<CategoryListItem>, Error> {
    let (limit, offset) = page.sql_limit_offset();

    connection
        .prepare(
            "SELECT category.id, category.name, COUNT(expense.id) FROM category \
            LEFT JOIN expense ON expense.category_id = category.id \
            GROUP BY category.id \
            ORDER BY category.name ASC, category.id ASC \
            LIMIT ?1 OFFSET ?2",
        )?
        .query_map([limit, offset], |row| {
            Ok(CategoryListItem {
                category: map_row(row)?,
                expense_count: row.get(2)?,
            })
        })?
        .map(|maybe_item| maybe_item.map_err(Error::from))
        .collect()
}

fn categories_view(items: &[CategoryListItem], page: Page, max_pages: u64) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();
    let page_url = |page_number: u64| format!("{}?page={page_number}", endpoints::CATEGORIES_VIEW);

    let table_row = |item: &CategoryListItem| {
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_CATEGORY, item.category.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'?",
            item.category.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (item.category.name) }
                }

                td class=(TABLE_CELL_STYLE) { (item.expense_count) }

                td class=(TABLE_CELL_STYLE)
                {
                    @if item.expense_count == 0 {
                        (delete_action_button(&delete_url, &confirm_message, "closest tr"))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE)
                    {
                        "Create Category"
                    }
                }

                section class="dark:bg-gray-800 w-full"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for item in items {
                                (table_row(item))
                            }

                            @if items.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(page, max_pages, page_url))
            }
        }
    );

    base("Categories", &[], &content)
}

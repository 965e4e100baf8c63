//! The expenses page: a searchable, sortable and paginated list of expenses
//! with summaries of the matching expenses.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// axum's Query does not support repeated keys, which the category checkboxes produce.
use axum_extra::extract::Query;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::get_all_categories,
    pagination::{Page, PaginationConfig},
};

use super::{
    query::{count_expenses, get_expenses_page},
    search::{ExpenseSearchForm, ExpenseSearchQuery},
    summary::ExpenseSummary,
    view::{ExpensesViewModel, expenses_view},
};

/// The state needed for the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The database connection for querying expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the page size and the pagination indicator.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the expenses page for the search in the query string.
///
/// # Errors
/// Returns [Error::InvalidPage] (rendered as a 404 page) if the requested page
/// does not exist.
pub async fn get_expenses_page_handler(
    State(state): State<ExpensesPageState>,
    Query(query): Query<ExpenseSearchQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let form = ExpenseSearchForm::clean(&query, &categories);

    if !form.errors.is_empty() {
        tracing::debug!("Invalid search inputs: {:?}", form.errors);
    }

    let filter = form.filter();
    let expense_count = count_expenses(&filter, &connection)
        .inspect_err(|error| tracing::error!("Could not count expenses: {error}"))?;
    let page = Page::resolve(
        query.page.as_deref(),
        expense_count,
        state.pagination_config.page_size,
    )?;

    let expenses = get_expenses_page(&filter, form.sort_key(), page, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve expenses: {error}"))?;
    let summary = ExpenseSummary::compute(&filter, &connection)
        .inspect_err(|error| tracing::error!("Failed to summarise expenses: {error}"))?;

    Ok(expenses_view(ExpensesViewModel {
        form: &form,
        categories: &categories,
        expenses: &expenses,
        expense_count,
        summary: &summary,
        page,
        max_pages: state.pagination_config.max_pages,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::{ElementRef, Html, Selector};
    use time::{Date, macros::date};

    use crate::{
        Error,
        category::{Category, CategoryName, create_category},
        db::initialize,
        expense::{Expense, create_expense},
        html::{format_currency, format_currency_rounded},
        pagination::PaginationConfig,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::{ExpenseSearchQuery, ExpensesPageState, get_expenses_page_handler};

    struct Fixture {
        state: ExpensesPageState,
        food: Category,
        transport: Category,
    }

    /// Eight expenses from January to April 2025 in two categories.
    fn get_fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let food = create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
        let transport =
            create_category(CategoryName::new_unchecked("Transport"), &connection).unwrap();

        for (name, amount, date, category_id) in [
            ("Groceries", 50.0, date!(2025 - 01 - 05), food.id),
            ("Bus", 3.0, date!(2025 - 01 - 20), transport.id),
            ("Coffee", 4.0, date!(2025 - 02 - 01), food.id),
            ("Lunch", 12.0, date!(2025 - 02 - 14), food.id),
            ("Train", 8.0, date!(2025 - 02 - 15), transport.id),
            ("Dinner", 30.0, date!(2025 - 03 - 02), food.id),
            ("Taxi", 20.0, date!(2025 - 03 - 10), transport.id),
            ("Snacks", 6.0, date!(2025 - 04 - 01), food.id),
        ] {
            create_expense(Expense::build(name, amount, date, category_id), &connection).unwrap();
        }

        Fixture {
            state: ExpensesPageState {
                db_connection: Arc::new(Mutex::new(connection)),
                pagination_config: PaginationConfig::default(),
            },
            food,
            transport,
        }
    }

    async fn get_page(state: &ExpensesPageState, query: &str) -> Html {
        let query: ExpenseSearchQuery = serde_html_form::from_str(query).unwrap();
        let response = get_expenses_page_handler(State(state.clone()), Query(query))
            .await
            .into_response();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    fn column_text(html: &Html, column: &str) -> Vec<String> {
        let selector = Selector::parse(&format!("tbody td[data-column='{column}']")).unwrap();
        html.select(&selector)
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    fn column_dates(html: &Html) -> Vec<Date> {
        column_text(html, "date")
            .iter()
            .map(|text| {
                Date::parse(
                    text,
                    time::macros::format_description!("[year]-[month]-[day]"),
                )
                .unwrap()
            })
            .collect()
    }

    fn summary_total(html: &Html) -> String {
        let selector = Selector::parse("[data-summary='total']").unwrap();
        html.select(&selector)
            .next()
            .expect("No total summary")
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    fn summary_rows(html: &Html, table_id: &str) -> Vec<Vec<String>> {
        let row_selector = Selector::parse(&format!("#{table_id} tr")).unwrap();
        let cell_selector = Selector::parse("td").unwrap();
        html.select(&row_selector)
            .map(|row: ElementRef| {
                row.select(&cell_selector)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect()
    }

    fn pagination_hrefs(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("nav.pagination a").unwrap())
            .filter_map(|link| link.value().attr("href").map(str::to_owned))
            .collect()
    }

    #[tokio::test]
    async fn first_page_shows_five_newest_expenses() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "").await;

        assert_eq!(
            column_text(&html, "name"),
            ["Snacks", "Taxi", "Dinner", "Train", "Lunch"]
        );
        assert!(column_dates(&html).is_sorted_by(|a, b| a >= b));
    }

    #[tokio::test]
    async fn second_page_shows_remaining_expenses() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "page=2").await;

        assert_eq!(column_text(&html, "name"), ["Coffee", "Bus", "Groceries"]);
    }

    #[tokio::test]
    async fn last_page_keyword() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "page=last").await;

        assert_eq!(column_text(&html, "name"), ["Coffee", "Bus", "Groceries"]);
    }

    #[tokio::test]
    async fn invalid_pages_are_not_found() {
        let fixture = get_fixture();

        for page in ["3", "0", "-1", "two"] {
            let query = ExpenseSearchQuery {
                page: Some(page.to_owned()),
                ..Default::default()
            };

            let result = get_expenses_page_handler(State(fixture.state.clone()), Query(query)).await;

            let error = result.expect_err("want error for invalid page");
            assert!(matches!(error, Error::InvalidPage(_)), "got {error:?}");
            assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn sort_by_date_ascending() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "sort=date").await;

        assert_eq!(
            column_text(&html, "name"),
            ["Groceries", "Bus", "Coffee", "Lunch", "Train"]
        );
        assert!(column_dates(&html).is_sorted());
    }

    #[tokio::test]
    async fn explicit_newest_first_sort_matches_default() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "sort=date_desc").await;

        assert_eq!(
            column_text(&html, "name"),
            ["Snacks", "Taxi", "Dinner", "Train", "Lunch"]
        );
        assert!(column_dates(&html).is_sorted_by(|a, b| a >= b));
    }

    #[tokio::test]
    async fn repeated_sort_uses_last_value() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "sort=date_desc&sort=date").await;

        assert!(column_dates(&html).is_sorted());
        assert_eq!(column_text(&html, "name")[0], "Groceries");
    }

    #[tokio::test]
    async fn sort_by_category() {
        let fixture = get_fixture();

        let ascending = get_page(&fixture.state, "sort=category").await;
        let descending = get_page(&fixture.state, "sort=category_desc").await;

        assert!(column_text(&ascending, "category").is_sorted());
        assert!(column_text(&descending, "category").is_sorted_by(|a, b| a >= b));
        assert_eq!(column_text(&descending, "category")[0], "Transport");
    }

    #[tokio::test]
    async fn date_range_filter_is_inclusive() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "from_date=2025-02-01&to_date=2025-03-02").await;

        let dates = column_dates(&html);
        assert_eq!(dates.len(), 4);
        assert!(
            dates
                .iter()
                .all(|date| (date!(2025 - 02 - 01)..=date!(2025 - 03 - 02)).contains(date))
        );
    }

    #[tokio::test]
    async fn category_filter_applies_with_dates() {
        let fixture = get_fixture();
        let query = format!(
            "from_date=2025-02-01&categories={}",
            fixture.transport.id
        );

        let html = get_page(&fixture.state, &query).await;

        assert_eq!(column_text(&html, "name"), ["Taxi", "Train"]);
        assert_eq!(summary_total(&html), format_currency(28.0));
    }

    #[tokio::test]
    async fn name_filter_ignores_case() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "name=%20tAX%20").await;

        assert_eq!(column_text(&html, "name"), ["Taxi"]);
    }

    #[tokio::test]
    async fn summaries_cover_every_page() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "page=2").await;

        assert_eq!(summary_total(&html), format_currency(133.0));
        assert_eq!(
            summary_rows(&html, "summary-per-category"),
            [
                vec!["Food".to_owned(), format_currency_rounded(102.0)],
                vec!["Transport".to_owned(), format_currency_rounded(31.0)],
            ]
        );
        let months: Vec<String> = summary_rows(&html, "summary-per-month")
            .into_iter()
            .map(|row| row[0].clone())
            .collect();
        assert_eq!(
            months,
            ["April 2025", "March 2025", "February 2025", "January 2025"]
        );
    }

    #[tokio::test]
    async fn pagination_links_keep_filters() {
        let fixture = get_fixture();
        let query = format!(
            "from_date=2025-01-01&categories={}&categories={}&sort=date",
            fixture.food.id, fixture.transport.id
        );

        let html = get_page(&fixture.state, &query).await;

        let want_href = format!(
            "/expenses?from_date=2025-01-01&categories={}&categories={}&sort=date&page=2",
            fixture.food.id, fixture.transport.id
        );
        assert!(
            pagination_hrefs(&html).contains(&want_href),
            "want link {want_href}, got {:?}",
            pagination_hrefs(&html)
        );
    }

    #[tokio::test]
    async fn sort_links_keep_filters_and_toggle_order() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "name=a&sort=date").await;

        let date_link = html
            .select(&Selector::parse("thead a[data-sort^='date']").unwrap())
            .next()
            .expect("No date sort link");
        assert_eq!(date_link.value().attr("href"), Some("/expenses?name=a&sort=date_desc"));
        let category_link = html
            .select(&Selector::parse("thead a[data-sort^='category']").unwrap())
            .next()
            .expect("No category sort link");
        assert_eq!(category_link.value().attr("href"), Some("/expenses?name=a&sort=category"));
    }

    #[tokio::test]
    async fn invalid_inputs_are_ignored_and_reported() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "from_date=soon&categories=999&sort=amount").await;

        assert_eq!(column_text(&html, "name").len(), 5);
        assert_eq!(summary_total(&html), format_currency(133.0));
        let errors: Vec<String> = html
            .select(&Selector::parse("[data-field-error]").unwrap())
            .map(|error| error.value().attr("data-field-error").unwrap_or_default().to_owned())
            .collect();
        assert_eq!(errors, ["from_date", "categories"]);
    }

    #[tokio::test]
    async fn selected_categories_are_checked() {
        let fixture = get_fixture();
        let query = format!("categories={}", fixture.food.id);

        let html = get_page(&fixture.state, &query).await;

        let checked: Vec<String> = html
            .select(&Selector::parse("input[name='categories'][checked]").unwrap())
            .filter_map(|input| input.value().attr("value").map(str::to_owned))
            .collect();
        assert_eq!(checked, [fixture.food.id.to_string()]);
    }

    #[tokio::test]
    async fn no_matches_shows_empty_state() {
        let fixture = get_fixture();

        let html = get_page(&fixture.state, "name=nothing-like-this").await;

        let empty_state = html
            .select(&Selector::parse("td[data-empty-state]").unwrap())
            .next()
            .expect("No empty state");
        assert_eq!(
            empty_state.text().collect::<String>().trim(),
            "No expenses match the search."
        );
        assert_eq!(summary_total(&html), "$0.00");
        assert!(pagination_hrefs(&html).is_empty());
    }
}

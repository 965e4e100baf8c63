//! The page and endpoint for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, CategoryId, get_all_categories, get_category},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, dollar_input_styles,
    },
    navigation::NavBar,
    timezone::local_today,
};

use super::{Expense, create_expense};

/// The state needed to show the new expense page and to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// What the money was spent on.
    pub name: String,
    /// The amount spent in dollars.
    pub amount: f64,
    /// The date the money was spent.
    pub date: Date,
    /// The ID of the expense's category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Render the page for recording a new expense.
///
/// The date defaults to today in the local timezone.
pub async fn get_new_expense_page(
    State(state): State<CreateExpenseState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(new_expense_view(today, &categories).into_response())
}

/// A route handler for creating a new expense, redirects to the expenses page on success.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let Some(category_id) = form.category_id else {
        tracing::debug!("Tried to create an expense without a category");
        return Error::InvalidCategory(None).into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let category = match get_category(category_id, &connection) {
        Ok(category) => category,
        Err(Error::NotFound) => {
            return Error::InvalidCategory(Some(category_id)).into_alert_response();
        }
        Err(error) => {
            tracing::error!("could not get category {category_id}: {error}");
            return error.into_alert_response();
        }
    };

    let builder = Expense::build(&form.name, form.amount, form.date, category.id);

    match create_expense(builder, &connection) {
        Ok(expense) => {
            tracing::info!(
                "Created expense {} ({}) in category {}",
                expense.name,
                expense.id,
                category.name
            );

            (
                HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            error.into_alert_response()
        }
    }
}

fn new_expense_view(today: Date, categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            @if categories.is_empty() {
                p
                {
                    "Expenses must belong to a category. "
                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Create a category"
                    }
                    " before recording an expense."
                }
            } @else {
                (new_expense_form(today, categories))
            }
        }
    };

    base("Create Expense", &[dollar_input_styles()], &content)
}

fn new_expense_form(today: Date, categories: &[Category]) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_EXPENSE)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "New Expense" }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    name="name"
                    id="name"
                    type="text"
                    placeholder="What was the money spent on?"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                // w-full needed to ensure input takes the full width when prefilled with a value
                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    required
                    value=(today)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    name="category_id"
                    id="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in categories {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Expense" }
        }
    }
}

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error};

use super::{ExpenseId, core::delete_expense};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense, responds with an alert on failure.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_expense(expense_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => {
            tracing::info!("Deleted expense {expense_id}");
            StatusCode::OK.into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete expense {expense_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, create_category},
        db::initialize,
        expense::{Expense, create_expense, get_expense},
    };

    use super::{DeleteExpenseState, delete_expense_endpoint};

    fn get_state() -> DeleteExpenseState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        DeleteExpenseState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deletes_expense() {
        let state = get_state();
        let expense = {
            let connection = state.db_connection.lock().unwrap();
            let category =
                create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
            create_expense(
                Expense::build("Bread", 4.5, date!(2025 - 02 - 01), category.id),
                &connection,
            )
            .unwrap()
        };

        let response = delete_expense_endpoint(State(state.clone()), Path(expense.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_expense(expense.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn deleting_missing_expense_is_not_found() {
        let state = get_state();

        let response = delete_expense_endpoint(State(state), Path(1)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

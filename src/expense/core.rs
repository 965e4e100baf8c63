//! Defines the core data model and database queries for expenses.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{Error, category::CategoryId};

/// The database ID of an expense.
pub type ExpenseId = i64;

/// Money spent on something, tagged with a category.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub name: String,
    /// The amount of money spent, always greater than zero.
    pub amount: f64,
    /// When the money was spent.
    pub date: Date,
    /// The ID of the category the expense belongs to.
    pub category_id: CategoryId,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(name: &str, amount: f64, date: Date, category_id: CategoryId) -> ExpenseBuilder {
        ExpenseBuilder {
            name: name.to_owned(),
            amount,
            date,
            category_id,
        }
    }
}

/// The fields needed to insert an [Expense] into the database.
///
/// The fields are validated by [create_expense].
#[derive(Debug, PartialEq, Clone)]
pub struct ExpenseBuilder {
    /// What the money was spent on. Leading and trailing whitespace is removed
    /// before saving.
    pub name: String,

    /// The amount of money spent.
    ///
    /// Expenses only record spending, so this must be a positive number.
    pub amount: f64,

    /// The date when the money was spent.
    pub date: Date,

    /// The category of the expense, e.g. "Groceries", "Transport", "Rent".
    pub category_id: CategoryId,
}

/// Create a new expense in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyExpenseName] if the name is empty or only whitespace,
/// - [Error::NonPositiveAmount] if the amount is not greater than zero,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(builder: ExpenseBuilder, connection: &Connection) -> Result<Expense, Error> {
    let name = builder.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyExpenseName);
    }

    if !builder.amount.is_finite() || builder.amount <= 0.0 {
        return Err(Error::NonPositiveAmount(builder.amount));
    }

    let expense = connection
        .prepare(
            "INSERT INTO expense (name, amount, date, category_id)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, amount, date, category_id",
        )?
        .query_row(
            (name, builder.amount, builder.date, builder.category_id),
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(builder.category_id)),
            error => error.into(),
        })?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare("SELECT id, name, amount, date, category_id FROM expense WHERE id = :id")?
        .query_one(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Delete an expense by its `id`.
///
/// # Errors
/// Returns [Error::DeleteMissingExpense] if the expense does not exist.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Create the expense table in the database.
///
/// The category table must exist before this function is called.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id)
                    ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // The list page filters by date range and category.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date_category ON expense(date, category_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let category_id = row.get(4)?;

    Ok(Expense {
        id,
        name,
        amount,
        date,
        category_id,
    })
}

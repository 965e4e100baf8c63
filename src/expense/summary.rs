//! Aggregate figures over all expenses that match a filter.
//!
//! The summaries are computed over the whole filtered set, not just the page
//! of expenses being displayed.

use rusqlite::{Connection, params_from_iter, types::Type};
use time::Month;

use crate::{Error, category::CategoryName};

use super::query::{EXPENSE_JOIN, ExpenseFilter};

/// The amount spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category's name.
    pub name: CategoryName,
    /// The sum of the matching expenses in the category.
    pub total: f64,
}

/// The amount spent in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    /// The year of the month.
    pub year: i32,
    /// The month.
    pub month: Month,
    /// The sum of the matching expenses in the month.
    pub total: f64,
}

/// All of the aggregate figures shown on the expenses page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    /// The sum of all matching expenses.
    pub total_amount: f64,
    /// Totals per category, ordered by category name.
    pub per_category: Vec<CategoryTotal>,
    /// Totals per month, newest month first.
    pub per_month: Vec<MonthlyTotal>,
}

impl ExpenseSummary {
    /// Compute every summary for the expenses that match `filter`.
    pub fn compute(filter: &ExpenseFilter, connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            total_amount: total_amount(filter, connection)?,
            per_category: summary_per_category(filter, connection)?,
            per_month: summary_per_month(filter, connection)?,
        })
    }
}

/// The sum of the amounts of the expenses that match `filter`, zero if none match.
pub fn total_amount(filter: &ExpenseFilter, connection: &Connection) -> Result<f64, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!("SELECT COALESCE(SUM(expense.amount), 0.0) {EXPENSE_JOIN} {where_clause}");

    connection
        .prepare(&query)?
        .query_row(params_from_iter(params), |row| row.get(0))
        .map_err(|error| error.into())
}

/// The total of the expenses matching `filter` for each category that has any.
pub fn summary_per_category(
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!(
        "SELECT category.name, SUM(expense.amount) {EXPENSE_JOIN} {where_clause} \
        GROUP BY category.id ORDER BY category.name ASC"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| {
            let raw_name: String = row.get(0)?;

            Ok(CategoryTotal {
                name: CategoryName::new_unchecked(&raw_name),
                total: row.get(1)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// The total of the expenses matching `filter` for each calendar month that has any.
pub fn summary_per_month(
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<MonthlyTotal>, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!(
        "SELECT CAST(strftime('%Y', expense.date) AS INTEGER) AS year, \
        CAST(strftime('%m', expense.date) AS INTEGER) AS month, \
        SUM(expense.amount) {EXPENSE_JOIN} {where_clause} \
        GROUP BY year, month ORDER BY year DESC, month DESC"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| {
            let month_number: u8 = row.get(1)?;
            let month = Month::try_from(month_number).map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Integer, Box::new(error))
            })?;

            Ok(MonthlyTotal {
                year: row.get(0)?,
                month,
                total: row.get(2)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

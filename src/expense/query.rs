//! Builds the filtered and sorted SQL queries behind the expenses page.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error,
    category::{CategoryId, CategoryName},
    expense::ExpenseId,
    pagination::Page,
};

/// The tables every expense query reads from.
pub(super) const EXPENSE_JOIN: &str =
    "FROM expense INNER JOIN category ON category.id = expense.category_id";

/// The criteria an expense must meet to be shown on the expenses page.
///
/// Every criterion that is set must hold, an empty filter matches all expenses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Only match expenses whose name contains this text, ignoring case.
    pub name: Option<String>,
    /// Only match expenses on or after this date.
    pub from_date: Option<Date>,
    /// Only match expenses on or before this date.
    pub to_date: Option<Date>,
    /// Only match expenses in one of these categories. Empty means any category.
    pub category_ids: Vec<CategoryId>,
}

impl ExpenseFilter {
    /// Build the `WHERE` clause and its positional parameters.
    ///
    /// Returns an empty string when no criteria are set.
    pub(super) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut where_clause_parts = Vec::new();
        let mut params = Vec::new();

        if let Some(name) = &self.name {
            where_clause_parts.push("expense.name LIKE ? ESCAPE '\\'".to_owned());
            params.push(Value::Text(format!("%{}%", escape_like_pattern(name))));
        }

        match (self.from_date, self.to_date) {
            (Some(from_date), Some(to_date)) => {
                where_clause_parts.push("expense.date BETWEEN ? AND ?".to_owned());
                params.push(Value::Text(from_date.to_string()));
                params.push(Value::Text(to_date.to_string()));
            }
            (Some(from_date), None) => {
                where_clause_parts.push("expense.date >= ?".to_owned());
                params.push(Value::Text(from_date.to_string()));
            }
            (None, Some(to_date)) => {
                where_clause_parts.push("expense.date <= ?".to_owned());
                params.push(Value::Text(to_date.to_string()));
            }
            (None, None) => {}
        }

        if !self.category_ids.is_empty() {
            let placeholders = vec!["?"; self.category_ids.len()].join(", ");
            where_clause_parts.push(format!("expense.category_id IN ({placeholders})"));
            params.extend(self.category_ids.iter().map(|&id| Value::Integer(id)));
        }

        if where_clause_parts.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", where_clause_parts.join(" AND ")), params)
        }
    }
}

/// Escape the wildcard characters of a `LIKE` pattern so they match literally.
///
/// The escaped pattern must be used with `ESCAPE '\'`.
fn escape_like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}

/// The orderings available on the expenses page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Category name, A to Z.
    Category,
    /// Category name, Z to A.
    CategoryDesc,
    /// Oldest first.
    Date,
    /// Newest first.
    #[default]
    DateDesc,
}

impl SortKey {
    /// Parse the value of the `sort` query parameter.
    ///
    /// Returns `None` for unknown values.
    pub fn from_query_value(value: &str) -> Option<Self> {
        match value {
            "category" => Some(Self::Category),
            "category_desc" => Some(Self::CategoryDesc),
            "date" => Some(Self::Date),
            "date_desc" => Some(Self::DateDesc),
            _ => None,
        }
    }

    /// The value of the `sort` query parameter for this ordering.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::CategoryDesc => "category_desc",
            Self::Date => "date",
            Self::DateDesc => "date_desc",
        }
    }

    fn order_by_clause(self) -> &'static str {
        // Expense ID breaks ties so that pages do not overlap.
        match self {
            Self::Category => "ORDER BY category.name ASC, expense.id ASC",
            Self::CategoryDesc => "ORDER BY category.name DESC, expense.id ASC",
            Self::Date => "ORDER BY expense.date ASC, expense.id ASC",
            Self::DateDesc => "ORDER BY expense.date DESC, expense.id ASC",
        }
    }
}

/// An expense joined with the name of its category.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub name: String,
    /// The amount of money spent.
    pub amount: f64,
    /// When the money was spent.
    pub date: Date,
    /// The ID of the expense's category.
    pub category_id: CategoryId,
    /// The name of the expense's category.
    pub category_name: CategoryName,
}

/// Count the expenses that match `filter`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is some SQL error.
pub fn count_expenses(filter: &ExpenseFilter, connection: &Connection) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!("SELECT COUNT(expense.id) {EXPENSE_JOIN} {where_clause}");

    connection
        .prepare(&query)?
        .query_row(params_from_iter(params), |row| row.get::<_, u32>(0))
        .map(u64::from)
        .map_err(|error| error.into())
}

/// Get the expenses on `page` of the expenses that match `filter`, ordered by `sort`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is some SQL error.
pub fn get_expenses_page(
    filter: &ExpenseFilter,
    sort: SortKey,
    page: Page,
    connection: &Connection,
) -> Result<Vec<ExpenseRow>, Error> {
    let (where_clause, mut params) = filter.where_clause();
    let query = format!(
        "SELECT expense.id, expense.name, expense.amount, expense.date, expense.category_id, \
        category.name {EXPENSE_JOIN} {where_clause} {} LIMIT ? OFFSET ?",
        sort.order_by_clause()
    );
    let (limit, offset) = page.sql_limit_offset();
    params.push(Value::Integer(limit));
    params.push(Value::Integer(offset));

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_expense_row)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn map_expense_row(row: &Row) -> Result<ExpenseRow, rusqlite::Error> {
    let raw_category_name: String = row.get(5)?;

    Ok(ExpenseRow {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        category_id: row.get(4)?,
        category_name: CategoryName::new_unchecked(&raw_category_name),
    })
}

#[cfg(test)]
mod where_clause_tests {
    use rusqlite::types::Value;
    use time::macros::date;

    use super::{ExpenseFilter, escape_like_pattern};

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (where_clause, params) = ExpenseFilter::default().where_clause();

        assert_eq!(where_clause, "");
        assert!(params.is_empty());
    }

    #[test]
    fn combines_all_criteria() {
        let filter = ExpenseFilter {
            name: Some("tea".to_owned()),
            from_date: Some(date!(2025 - 01 - 01)),
            to_date: Some(date!(2025 - 01 - 31)),
            category_ids: vec![2, 3],
        };

        let (where_clause, params) = filter.where_clause();

        assert_eq!(
            where_clause,
            "WHERE expense.name LIKE ? ESCAPE '\\' AND expense.date BETWEEN ? AND ? \
            AND expense.category_id IN (?, ?)"
        );
        assert_eq!(
            params,
            vec![
                Value::Text("%tea%".to_owned()),
                Value::Text("2025-01-01".to_owned()),
                Value::Text("2025-01-31".to_owned()),
                Value::Integer(2),
                Value::Integer(3),
            ]
        );
    }

    #[test]
    fn single_date_bound_uses_comparison() {
        let from_only = ExpenseFilter {
            from_date: Some(date!(2025 - 03 - 01)),
            ..Default::default()
        };
        let to_only = ExpenseFilter {
            to_date: Some(date!(2025 - 03 - 01)),
            ..Default::default()
        };

        assert_eq!(from_only.where_clause().0, "WHERE expense.date >= ?");
        assert_eq!(to_only.where_clause().0, "WHERE expense.date <= ?");
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like_pattern("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }
}

//! Database set up for the application's SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{category::create_category_table, expense::create_expense_table};

/// Create the tables for the domain models and enable foreign key checks.
///
/// Foreign keys must be enabled on each connection, so this function should be
/// called on every connection before it is used. Calling it more than once on
/// the same database is safe.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    // The expense table references the category table, so it must come second.
    create_category_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

//! Expense management.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and the database functions for storing expenses
//! - The search form, filtered queries and summaries behind the expenses page
//! - View handlers for creating, listing and deleting expenses

mod core;
mod create;
mod delete;
mod list_page;
mod query;
mod search;
mod summary;
mod view;

pub use core::{Expense, ExpenseBuilder, ExpenseId, create_expense, create_expense_table};
pub use create::{create_expense_endpoint, get_new_expense_page};
pub use delete::delete_expense_endpoint;
pub use list_page::get_expenses_page_handler;

#[cfg(test)]
pub use core::get_expense;

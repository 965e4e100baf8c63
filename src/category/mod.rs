//! Category management for grouping expenses.

mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_categories, create_category, create_category_table, get_all_categories, get_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName};
pub use list::get_categories_page;

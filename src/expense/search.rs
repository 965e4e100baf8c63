//! The search form on the expenses page.
//!
//! The form is submitted with GET, so every input is optional and comes from
//! the query string. Invalid inputs never fail the request. They are left out
//! of the filter and reported next to the input instead.

use serde::{Deserialize, Deserializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::category::{Category, CategoryId};

use super::query::{ExpenseFilter, SortKey};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The raw query string of the expenses page.
///
/// Must be extracted with [axum_extra::extract::Query] so that repeated
/// `categories` keys are collected. A repeated single-valued key, such as
/// `sort=date&sort=category`, keeps the last value.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExpenseSearchQuery {
    /// Text the expense name must contain.
    #[serde(default, deserialize_with = "last_value")]
    pub name: Option<String>,
    /// The earliest date, formatted as YYYY-MM-DD.
    #[serde(default, deserialize_with = "last_value")]
    pub from_date: Option<String>,
    /// The latest date, formatted as YYYY-MM-DD.
    #[serde(default, deserialize_with = "last_value")]
    pub to_date: Option<String>,
    /// The IDs of the categories to include.
    #[serde(default)]
    pub categories: Vec<String>,
    /// How to order the expenses.
    #[serde(default, deserialize_with = "last_value")]
    pub sort: Option<String>,
    /// The page number to display, starting from 1, or "last".
    #[serde(default, deserialize_with = "last_value")]
    pub page: Option<String>,
}

fn last_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<String>::deserialize(deserializer)?;

    Ok(values.into_iter().next_back())
}

/// Validation messages for the search form inputs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchFormErrors {
    /// Set if the from date could not be parsed.
    pub from_date: Option<String>,
    /// Set if the to date could not be parsed.
    pub to_date: Option<String>,
    /// Set if any selected category was not a valid choice.
    pub categories: Option<String>,
}

impl SearchFormErrors {
    /// Whether every input was valid.
    pub fn is_empty(&self) -> bool {
        self.from_date.is_none() && self.to_date.is_none() && self.categories.is_none()
    }
}

/// The validated search form.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenseSearchForm {
    /// The trimmed name filter, empty if not filtering by name.
    pub name: String,
    /// The valid from date, if given.
    pub from_date: Option<Date>,
    /// The valid to date, if given.
    pub to_date: Option<Date>,
    /// The selected categories that exist.
    pub categories: Vec<CategoryId>,
    /// The requested ordering, if it was a known value.
    pub sort: Option<SortKey>,
    /// Problems with the inputs that were left out of the filter.
    pub errors: SearchFormErrors,
}

impl ExpenseSearchForm {
    /// Validate the raw query against the categories that can be selected.
    pub fn clean(query: &ExpenseSearchQuery, available_categories: &[Category]) -> Self {
        let mut errors = SearchFormErrors::default();

        let name = query.name.as_deref().unwrap_or_default().trim().to_owned();

        let from_date = match parse_date(query.from_date.as_deref()) {
            Ok(date) => date,
            Err(message) => {
                errors.from_date = Some(message);
                None
            }
        };

        let to_date = match parse_date(query.to_date.as_deref()) {
            Ok(date) => date,
            Err(message) => {
                errors.to_date = Some(message);
                None
            }
        };

        let mut categories = Vec::new();
        for raw_id in &query.categories {
            let raw_id = raw_id.trim();
            if raw_id.is_empty() {
                continue;
            }

            match raw_id.parse::<CategoryId>() {
                Ok(id) if available_categories.iter().any(|category| category.id == id) => {
                    if !categories.contains(&id) {
                        categories.push(id);
                    }
                }
                _ => {
                    tracing::debug!("Ignoring invalid category choice {raw_id:?}");
                    errors.categories = Some(format!(
                        "Select a valid choice. {raw_id} is not one of the available choices."
                    ));
                }
            }
        }

        let sort = query
            .sort
            .as_deref()
            .and_then(|value| SortKey::from_query_value(value.trim()));

        Self {
            name,
            from_date,
            to_date,
            categories,
            sort,
            errors,
        }
    }

    /// The ordering to apply, falling back to the default ordering.
    pub fn sort_key(&self) -> SortKey {
        self.sort.unwrap_or_default()
    }

    /// The filter described by the valid inputs.
    pub fn filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            name: (!self.name.is_empty()).then(|| self.name.clone()),
            from_date: self.from_date,
            to_date: self.to_date,
            category_ids: self.categories.clone(),
        }
    }

    /// The valid inputs as query string pairs, excluding the page.
    ///
    /// Links built from these pairs keep the current filters and ordering.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if !self.name.is_empty() {
            pairs.push(("name", self.name.clone()));
        }
        if let Some(from_date) = self.from_date {
            pairs.push(("from_date", from_date.to_string()));
        }
        if let Some(to_date) = self.to_date {
            pairs.push(("to_date", to_date.to_string()));
        }
        for category_id in &self.categories {
            pairs.push(("categories", category_id.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_query_value().to_owned()));
        }

        pairs
    }

    /// Whether any filter is active.
    pub fn is_filtered(&self) -> bool {
        self.filter() != ExpenseFilter::default()
    }
}

fn parse_date(raw_date: Option<&str>) -> Result<Option<Date>, String> {
    match raw_date.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw_date) => Date::parse(raw_date, DATE_FORMAT)
            .map(Some)
            .map_err(|error| {
                tracing::debug!("Could not parse date {raw_date:?}: {error}");
                "Enter a valid date.".to_owned()
            }),
    }
}

/// Encode query string pairs, e.g. `name=tea&sort=date`.
pub fn encode_query(pairs: &[(&str, String)]) -> String {
    serde_urlencoded::to_string(pairs).unwrap_or_else(|error| {
        tracing::error!("Could not encode query string {pairs:?}: {error}");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        category::{Category, CategoryName},
        expense::query::{ExpenseFilter, SortKey},
    };

    use super::{ExpenseSearchForm, ExpenseSearchQuery, encode_query};

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: CategoryName::new_unchecked("Food"),
            },
            Category {
                id: 2,
                name: CategoryName::new_unchecked("Rent"),
            },
        ]
    }

    #[test]
    fn empty_query_has_empty_filter() {
        let form = ExpenseSearchForm::clean(&ExpenseSearchQuery::default(), &categories());

        assert_eq!(form.filter(), ExpenseFilter::default());
        assert_eq!(form.sort_key(), SortKey::DateDesc);
        assert!(form.errors.is_empty());
        assert!(!form.is_filtered());
    }

    #[test]
    fn deserializes_repeated_categories() {
        let query: ExpenseSearchQuery =
            serde_html_form::from_str("categories=1&categories=2&sort=category").unwrap();

        assert_eq!(query.categories, ["1", "2"]);
        assert_eq!(query.sort.as_deref(), Some("category"));
        assert_eq!(query.name, None);
    }

    #[test]
    fn repeated_single_value_keys_keep_the_last_value() {
        let query: ExpenseSearchQuery =
            serde_html_form::from_str("name=a&name=b&sort=date&sort=category&page=1&page=last")
                .unwrap();

        assert_eq!(query.name.as_deref(), Some("b"));
        assert_eq!(query.sort.as_deref(), Some("category"));
        assert_eq!(query.page.as_deref(), Some("last"));
        assert_eq!(query.from_date, None);
    }

    #[test]
    fn explicit_newest_first_sort_is_kept() {
        let query: ExpenseSearchQuery = serde_html_form::from_str("sort=date_desc").unwrap();

        let form = ExpenseSearchForm::clean(&query, &categories());

        assert_eq!(form.sort, Some(SortKey::DateDesc));
        assert_eq!(form.sort_key(), SortKey::DateDesc);
    }

    #[test]
    fn cleans_valid_inputs() {
        let query = ExpenseSearchQuery {
            name: Some("  coffee ".to_owned()),
            from_date: Some("2025-01-01".to_owned()),
            to_date: Some("2025-01-31".to_owned()),
            categories: vec!["2".to_owned(), "1".to_owned(), "2".to_owned()],
            sort: Some("category_desc".to_owned()),
            page: Some("3".to_owned()),
        };

        let form = ExpenseSearchForm::clean(&query, &categories());

        assert!(form.errors.is_empty());
        assert_eq!(form.sort_key(), SortKey::CategoryDesc);
        assert_eq!(
            form.filter(),
            ExpenseFilter {
                name: Some("coffee".to_owned()),
                from_date: Some(date!(2025 - 01 - 01)),
                to_date: Some(date!(2025 - 01 - 31)),
                category_ids: vec![2, 1],
            }
        );
    }

    #[test]
    fn invalid_dates_are_dropped_with_errors() {
        let query = ExpenseSearchQuery {
            from_date: Some("yesterday".to_owned()),
            to_date: Some("2025-02-30".to_owned()),
            ..Default::default()
        };

        let form = ExpenseSearchForm::clean(&query, &categories());

        assert_eq!(form.filter(), ExpenseFilter::default());
        assert_eq!(form.errors.from_date.as_deref(), Some("Enter a valid date."));
        assert_eq!(form.errors.to_date.as_deref(), Some("Enter a valid date."));
    }

    #[test]
    fn unknown_categories_are_dropped_with_error() {
        let query = ExpenseSearchQuery {
            categories: vec!["1".to_owned(), "99".to_owned(), "abc".to_owned()],
            ..Default::default()
        };

        let form = ExpenseSearchForm::clean(&query, &categories());

        assert_eq!(form.categories, [1]);
        let error = form.errors.categories.expect("want category error");
        assert!(error.starts_with("Select a valid choice."));
    }

    #[test]
    fn unknown_sort_is_ignored() {
        let query = ExpenseSearchQuery {
            sort: Some("amount".to_owned()),
            ..Default::default()
        };

        let form = ExpenseSearchForm::clean(&query, &categories());

        assert_eq!(form.sort, None);
        assert_eq!(form.sort_key(), SortKey::DateDesc);
        assert!(form.errors.is_empty());
    }

    #[test]
    fn query_pairs_keep_valid_inputs_only() {
        let query = ExpenseSearchQuery {
            name: Some("a&b".to_owned()),
            from_date: Some("not a date".to_owned()),
            to_date: Some("2025-03-31".to_owned()),
            categories: vec!["1".to_owned(), "2".to_owned()],
            sort: Some("date".to_owned()),
            page: Some("2".to_owned()),
        };

        let form = ExpenseSearchForm::clean(&query, &categories());

        assert_eq!(
            encode_query(&form.to_query_pairs()),
            "name=a%26b&to_date=2025-03-31&categories=1&categories=2&sort=date"
        );
    }
}

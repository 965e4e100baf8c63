//! HTML rendering for the expenses page.

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    category::Category,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, FORM_ERROR_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, currency_rounded_with_tooltip,
        delete_action_button, format_currency,
    },
    navigation::NavBar,
    pagination::{Page, pagination_view},
};

use super::{
    query::{ExpenseRow, SortKey},
    search::{ExpenseSearchForm, encode_query},
    summary::ExpenseSummary,
};

/// The max number of graphemes to display in the expense table rows before
/// truncating and displaying ellipses.
const MAX_NAME_GRAPHEMES: usize = 32;

/// Everything needed to render the expenses page.
pub(super) struct ExpensesViewModel<'a> {
    pub form: &'a ExpenseSearchForm,
    pub categories: &'a [Category],
    pub expenses: &'a [ExpenseRow],
    pub expense_count: u64,
    pub summary: &'a ExpenseSummary,
    pub page: Page,
    pub max_pages: u64,
}

pub(super) fn expenses_view(model: ExpensesViewModel) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();
    let query_pairs = model.form.to_query_pairs();
    let page_url = |page_number: u64| {
        let mut pairs = query_pairs.clone();
        pairs.push(("page", page_number.to_string()));
        expenses_url(&pairs)
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expenses" }

                    a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE)
                    {
                        "Create Expense"
                    }
                }

                (search_form_view(model.form, model.categories))

                (summary_view(model.summary))

                section class="dark:bg-gray-800 w-full"
                {
                    p class="text-sm py-2 text-gray-500 dark:text-gray-400"
                    {
                        (count_label(model.page, model.expenses.len(), model.expense_count))
                    }

                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    (sort_header("Category", SortKey::Category, SortKey::CategoryDesc, model.form))
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    (sort_header("Date", SortKey::Date, SortKey::DateDesc, model.form))
                                }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for expense in model.expenses {
                                (expense_row_view(expense))
                            }

                            @if model.expenses.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        data-empty-state="true"
                                        class="px-6 py-4 text-center"
                                    {
                                        @if model.form.is_filtered() {
                                            "No expenses match the search."
                                        } @else {
                                            "No expenses recorded yet. "
                                            a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE)
                                            {
                                                "Record your first expense"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(model.page, model.max_pages, page_url))
            }
        }
    };

    base("Expenses", &[], &content)
}

fn expenses_url(pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        endpoints::EXPENSES_VIEW.to_owned()
    } else {
        format!("{}?{}", endpoints::EXPENSES_VIEW, encode_query(pairs))
    }
}

fn count_label(page: Page, rows_on_page: usize, expense_count: u64) -> String {
    if expense_count == 0 {
        return "No expenses".to_owned();
    }

    let first = page.offset + 1;
    let last = page.offset + rows_on_page as u64;

    format!("Showing {first} to {last} of {expense_count} expenses")
}

/// A column header that links to the page sorted by the column.
///
/// Clicking the header of the column the page is sorted by flips the order.
fn sort_header(
    label: &str,
    ascending: SortKey,
    descending: SortKey,
    form: &ExpenseSearchForm,
) -> Markup {
    let current = form.sort_key();
    let (next, arrow) = if current == ascending {
        (descending, Some("▲"))
    } else if current == descending {
        (ascending, Some("▼"))
    } else {
        (ascending, None)
    };

    // Sorting changes which expenses are on each page, so go back to the first page.
    let mut pairs: Vec<(&str, String)> = form
        .to_query_pairs()
        .into_iter()
        .filter(|(key, _)| *key != "sort")
        .collect();
    pairs.push(("sort", next.as_query_value().to_owned()));

    html! {
        a href=(expenses_url(&pairs)) data-sort=(next.as_query_value()) class=(LINK_STYLE)
        {
            (label)
            @if let Some(arrow) = arrow {
                " " span aria-hidden="true" { (arrow) }
            }
        }
    }
}

fn search_form_view(form: &ExpenseSearchForm, categories: &[Category]) -> Markup {
    let from_date = form.from_date.map(|date| date.to_string());
    let to_date = form.to_date.map(|date| date.to_string());

    html! {
        form
            method="get"
            action=(endpoints::EXPENSES_VIEW)
            id="expense-search"
            class="rounded bg-gray-50 dark:bg-gray-800 p-4 space-y-4"
        {
            div class="grid gap-4 md:grid-cols-3"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                    input
                        id="name"
                        type="search"
                        name="name"
                        value=(form.name)
                        placeholder="Search by name"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="from_date" class=(FORM_LABEL_STYLE) { "From" }
                    input
                        id="from_date"
                        type="date"
                        name="from_date"
                        value=[from_date]
                        class=(FORM_TEXT_INPUT_STYLE);
                    @if let Some(error) = &form.errors.from_date {
                        p class=(FORM_ERROR_STYLE) data-field-error="from_date" { (error) }
                    }
                }

                div
                {
                    label for="to_date" class=(FORM_LABEL_STYLE) { "To" }
                    input
                        id="to_date"
                        type="date"
                        name="to_date"
                        value=[to_date]
                        class=(FORM_TEXT_INPUT_STYLE);
                    @if let Some(error) = &form.errors.to_date {
                        p class=(FORM_ERROR_STYLE) data-field-error="to_date" { (error) }
                    }
                }
            }

            @if !categories.is_empty() {
                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Categories" }

                    div class="flex flex-wrap gap-4"
                    {
                        @for category in categories {
                            @let input_id = format!("category-{}", category.id);
                            label for=(input_id) class="inline-flex items-center gap-2 text-sm"
                            {
                                input
                                    id=(input_id)
                                    type="checkbox"
                                    name="categories"
                                    value=(category.id)
                                    checked[form.categories.contains(&category.id)];
                                (category.name)
                            }
                        }
                    }

                    @if let Some(error) = &form.errors.categories {
                        p class=(FORM_ERROR_STYLE) data-field-error="categories" { (error) }
                    }
                }
            }

            @if let Some(sort) = form.sort {
                input type="hidden" name="sort" value=(sort.as_query_value());
            }

            div class="flex gap-4 items-start"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Search" }

                @if form.is_filtered() {
                    a href=(endpoints::EXPENSES_VIEW) class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Clear"
                    }
                }
            }
        }
    }
}

fn summary_view(summary: &ExpenseSummary) -> Markup {
    html! {
        section id="expense-summary" class="grid gap-4 md:grid-cols-3"
        {
            div class="rounded bg-gray-50 dark:bg-gray-800 p-4"
            {
                h2 class="text-sm font-semibold uppercase" { "Total" }
                p class="text-2xl font-bold" data-summary="total"
                {
                    (format_currency(summary.total_amount))
                }
            }

            div class="rounded bg-gray-50 dark:bg-gray-800 p-4"
            {
                h2 class="text-sm font-semibold uppercase" { "Per Category" }
                table id="summary-per-category" class="w-full text-sm"
                {
                    tbody
                    {
                        @for category_total in &summary.per_category {
                            tr
                            {
                                td class="py-1"
                                {
                                    span class=(CATEGORY_BADGE_STYLE) { (category_total.name) }
                                }
                                td class="py-1 text-right"
                                {
                                    (currency_rounded_with_tooltip(category_total.total))
                                }
                            }
                        }
                    }
                }
            }

            div class="rounded bg-gray-50 dark:bg-gray-800 p-4"
            {
                h2 class="text-sm font-semibold uppercase" { "Per Month" }
                table id="summary-per-month" class="w-full text-sm"
                {
                    tbody
                    {
                        @for monthly_total in &summary.per_month {
                            tr
                            {
                                td class="py-1" { (monthly_total.month) " " (monthly_total.year) }
                                td class="py-1 text-right"
                                {
                                    (currency_rounded_with_tooltip(monthly_total.total))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn expense_row_view(expense: &ExpenseRow) -> Markup {
    let (name, tooltip) = truncate_name(&expense.name);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_EXPENSE, expense.id);
    let confirm_message = format!(
        "Are you sure you want to delete the expense '{}'? This cannot be undone.",
        expense.name
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-expense-id=(expense.id)
        {
            td class=(TABLE_CELL_STYLE) data-column="name" title=[tooltip] { (name) }
            td class=(TABLE_CELL_STYLE) data-column="category"
            {
                span class=(CATEGORY_BADGE_STYLE) { (expense.category_name) }
            }
            td class=(TABLE_CELL_STYLE) data-column="date" { (expense.date) }
            td class="px-6 py-4 text-right" data-column="amount" { (format_currency(expense.amount)) }
            td class=(TABLE_CELL_STYLE)
            {
                (delete_action_button(&delete_url, &confirm_message, "closest tr"))
            }
        }
    }
}

fn truncate_name(name: &str) -> (String, Option<&str>) {
    if name.graphemes(true).count() <= MAX_NAME_GRAPHEMES {
        (name.to_owned(), None)
    } else {
        let truncated: String = name.graphemes(true).take(MAX_NAME_GRAPHEMES - 3).collect();
        (truncated + "...", Some(name))
    }
}

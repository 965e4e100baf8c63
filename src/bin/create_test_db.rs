use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, macros::date};

use expense_tracker::{CategoryName, Expense, create_category, create_expense, initialize_db};

/// A utility for creating a test database for the expense_tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of expenses to create.
    #[arg(long, short, default_value_t = 60)]
    expense_count: u32,
}

const CATEGORIES: [(&str, &[(&str, f64)]); 4] = [
    (
        "Food",
        &[("Groceries", 84.3), ("Coffee", 5.5), ("Takeaways", 27.0)],
    ),
    ("Transport", &[("Bus fare", 3.2), ("Fuel", 71.9)]),
    ("Bills", &[("Power", 132.45), ("Internet", 79.99)]),
    (
        "Entertainment",
        &[("Movie tickets", 38.0), ("Books", 24.99), ("50% off concert", 45.0)],
    ),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating categories...");
    let mut templates = Vec::new();
    for (category_name, expenses) in CATEGORIES {
        let category = create_category(CategoryName::new(category_name)?, &conn)?;
        templates.extend(
            expenses
                .iter()
                .map(|&(name, amount)| (name, amount, category.id)),
        );
    }

    println!("Creating {} expenses...", args.expense_count);
    let start_date = date!(2025 - 01 - 01);
    for i in 0..args.expense_count {
        let (name, amount, category_id) = templates[i as usize % templates.len()];
        // Spread the expenses out over roughly six months.
        let date = start_date + Duration::days((i as i64 * 3) % 180);
        // Vary the amount a little so the totals are not all round numbers.
        let amount = amount + (i % 7) as f64 * 0.5;

        create_expense(Expense::build(name, amount, date, category_id), &conn)?;
    }

    println!("Success!");

    Ok(())
}

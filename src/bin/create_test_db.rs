use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use vaultly::{NewTransaction, TransactionKind, create_transaction, create_user, initialize_db};

/// A utility for creating a test database for the REST API server of vaultly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The amount of the opening deposit for the test user.
    #[arg(long, default_value_t = Decimal::new(100_000, 2))]
    opening_balance: Decimal,
}

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

    println!("Creating test user...");
    let user = create_user(&conn)?;

    println!("Depositing {} for user {}...", args.opening_balance, user.id);
    create_transaction(
        user.id,
        NewTransaction {
            kind: TransactionKind::Deposit,
            title: "Opening balance".to_owned(),
            date: OffsetDateTime::now_utc().date(),
            category: "Income".to_owned(),
            amount: args.opening_balance,
            recurring: None,
        },
        &conn,
    )?;

    println!("Success!");

    Ok(())
}

//! Defines the ledger transaction model and the database queries that keep
//! the user's balance in step with the ledger.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction as SqlTransaction, TransactionBehavior, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    money::{get_amount, normalize_positive_amount, to_sql_text},
    recurring::{IntervalUnit, PaymentInterval},
    user::{UserID, get_balance, set_balance},
};

/// The ID of a ledger transaction.
pub type TransactionId = DatabaseId;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money entered or left the user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money was added to the balance.
    Deposit,
    /// Money was taken out of the balance.
    Withdrawal,
}

impl TransactionKind {
    /// The effect of `amount` on the balance: positive for deposits, negative
    /// for withdrawals.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Deposit => amount,
            TransactionKind::Withdrawal => -amount,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(TransactionKind::Deposit),
            "Withdrawal" => Ok(TransactionKind::Withdrawal),
            other => Err(Error::Validation(format!(
                "unknown transaction kind \"{other}\""
            ))),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A deposit or withdrawal recorded in the user's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user the transaction belongs to.
    pub user_id: UserID,
    /// Whether the money was deposited or withdrawn.
    pub kind: TransactionKind,
    /// A short description of the transaction.
    pub title: String,
    /// When the money moved.
    pub date: Date,
    /// The category tag of the transaction, e.g. "Groceries".
    pub category: String,
    /// The unsigned amount of money, always greater than zero.
    pub amount: Decimal,
    /// How often the transaction repeats, `None` for a one-time transaction.
    pub recurring: Option<PaymentInterval>,
}

impl Transaction {
    /// The effect of this transaction on the balance.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// The user supplied fields of a transaction, used for both creating and
/// replacing a transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    /// Whether the money was deposited or withdrawn.
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    /// A short description of the transaction.
    pub title: String,
    /// When the money moved.
    pub date: Date,
    /// The category tag of the transaction.
    pub category: String,
    /// The unsigned amount of money.
    pub amount: Decimal,
    /// How often the transaction repeats, e.g. `{"interval": "monthly"}`.
    /// Missing or `null` for a one-time transaction.
    #[serde(default)]
    pub recurring: Option<PaymentInterval>,
}

/// The validated, trimmed and normalized form of [NewTransaction].
struct ValidTransaction<'a> {
    kind: TransactionKind,
    title: &'a str,
    date: Date,
    category: &'a str,
    amount: Decimal,
    recurring: Option<PaymentInterval>,
}

impl NewTransaction {
    fn validate(&self) -> Result<ValidTransaction<'_>, Error> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title cannot be empty".to_owned()));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::Validation("category cannot be empty".to_owned()));
        }

        if let Some(interval) = &self.recurring {
            interval.validate()?;
        }

        Ok(ValidTransaction {
            kind: self.kind,
            title,
            date: self.date,
            category,
            amount: normalize_positive_amount(self.amount, "amount")?,
            recurring: self.recurring,
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('Deposit', 'Withdrawal')),
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                amount TEXT NOT NULL,
                recurring TEXT,
                recurrence_every INTEGER,
                recurrence_unit TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let recurring = match row.get::<_, Option<String>>(7)? {
        Some(tag) => {
            let every: Option<u32> = row.get(8)?;
            let unit: Option<IntervalUnit> = row.get(9)?;
            let interval = PaymentInterval::from_parts(&tag, every, unit).map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(error))
            })?;
            Some(interval)
        }
        None => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        title: row.get(3)?,
        date: row.get(4)?,
        category: row.get(5)?,
        amount: get_amount(row, 6)?,
        recurring,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, kind, title, date, category, amount, recurring, recurrence_every, recurrence_unit";

const SELECT_TRANSACTION: &str = "SELECT id, user_id, kind, title, date, category, amount, \
    recurring, recurrence_every, recurrence_unit FROM \"transaction\"";

/// The `recurring`, `recurrence_every` and `recurrence_unit` column values.
fn recurrence_columns(
    recurring: Option<PaymentInterval>,
) -> (Option<&'static str>, Option<u32>, Option<IntervalUnit>) {
    match recurring {
        Some(interval) => {
            let (every, unit) = interval.custom_parts();
            (Some(interval.tag()), every, unit)
        }
        None => (None, None, None),
    }
}

/// Record a transaction for `user_id` and apply it to their balance.
///
/// The insert and the balance update either both happen or neither does.
/// Withdrawals may take the balance below zero.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the title or category is blank or the amount is
///   not a positive amount of money,
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let valid = new_transaction.validate()?;
    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let balance = get_balance(user_id, &sql_transaction)?;
    let new_balance = checked_add_to_balance(balance, valid.kind.signed(valid.amount))?;

    let (recurring, every, unit) = recurrence_columns(valid.recurring);

    let transaction = sql_transaction
        .prepare(&format!(
            "INSERT INTO \"transaction\"
             (user_id, kind, title, date, category, amount, recurring, recurrence_every, recurrence_unit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                valid.kind,
                valid.title,
                valid.date,
                valid.category,
                to_sql_text(valid.amount),
                recurring,
                every,
                unit,
            ],
            map_transaction_row,
        )?;

    set_balance(user_id, new_balance, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transaction)
}

/// Replace the transaction `transaction_id` and move the user's balance by
/// the difference between the old and new signed amounts.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the replacement is invalid,
/// - [Error::NotFound] if the transaction does not exist or belongs to
///   another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    replacement: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let valid = replacement.validate()?;
    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let old = get_transaction(transaction_id, user_id, &sql_transaction)?;
    let delta = valid
        .kind
        .signed(valid.amount)
        .checked_sub(old.signed_amount())
        .ok_or_else(amount_too_large)?;
    let balance = get_balance(user_id, &sql_transaction)?;
    let new_balance = checked_add_to_balance(balance, delta)?;
    let (recurring, every, unit) = recurrence_columns(valid.recurring);

    let transaction = sql_transaction
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET kind = ?1, title = ?2, date = ?3, category = ?4, amount = ?5,
                 recurring = ?6, recurrence_every = ?7, recurrence_unit = ?8
             WHERE id = ?9 AND user_id = ?10
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                valid.kind,
                valid.title,
                valid.date,
                valid.category,
                to_sql_text(valid.amount),
                recurring,
                every,
                unit,
                transaction_id,
                user_id.as_i64(),
            ],
            map_transaction_row,
        )?;

    set_balance(user_id, new_balance, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transaction)
}

fn amount_too_large() -> Error {
    Error::Validation("amount is too large".to_owned())
}

fn checked_add_to_balance(balance: Decimal, delta: Decimal) -> Result<Decimal, Error> {
    balance.checked_add(delta).ok_or_else(amount_too_large)
}

/// Retrieve the transaction `transaction_id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction does not exist or belongs to another user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(
            params![transaction_id, user_id.as_i64()],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Get all of `user_id`'s transactions, newest date first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE user_id = ?1 ORDER BY date DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64()], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// The sum of `user_id`'s deposits minus the sum of their withdrawals.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_net_deposits(user_id: UserID, connection: &Connection) -> Result<Decimal, Error> {
    let transactions = list_transactions(user_id, connection)?;

    let mut total = Decimal::new(0, 2);
    for transaction in &transactions {
        total = checked_add_to_balance(total, transaction.signed_amount())?;
    }

    Ok(total)
}

/// A recurring transaction together with the next date it repeats on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingTransaction {
    /// The recorded transaction the series started from.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The first repeat that falls after today.
    pub next_occurrence: Date,
}

/// Get `user_id`'s recurring transactions with the date each one next
/// repeats after `today`, soonest first.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if a repeat would fall outside the supported date range,
/// - or [Error::SqlError] if there is an SQL error.
pub fn list_upcoming_transactions(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Vec<UpcomingTransaction>, Error> {
    let recurring_transactions = connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE user_id = ?1 AND recurring IS NOT NULL"
        ))?
        .query_map(params![user_id.as_i64()], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect::<Result<Vec<_>, _>>()?;

    let mut upcoming = Vec::with_capacity(recurring_transactions.len());
    for transaction in recurring_transactions {
        let Some(interval) = transaction.recurring else {
            continue;
        };
        let next_occurrence = interval.next_occurrence_after(transaction.date, today)?;
        upcoming.push(UpcomingTransaction {
            transaction,
            next_occurrence,
        });
    }

    upcoming.sort_by_key(|item| (item.next_occurrence, item.transaction.id));

    Ok(upcoming)
}

// ============================================================================
// TESTS
// ============================================================================

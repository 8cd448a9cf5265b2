//! Storage for recurring payment intents.
//!
//! An intent records that a user wants `amount` moved into a goal on every
//! interval. Nothing here moves money: a job runner lists the intents that are
//! due, funds each goal through [crate::goal::apply_funding] and then calls
//! [advance_recurring_payment].

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::DatabaseId,
    goal::{GoalId, get_goal},
    money::{get_amount, normalize_positive_amount, to_sql_text},
    recurring::interval::{IntervalUnit, PaymentInterval},
    user::UserID,
};

/// The ID of a recurring payment.
pub type RecurringPaymentId = DatabaseId;

/// A standing instruction to move money into a goal on a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPayment {
    /// The ID of the recurring payment.
    pub id: RecurringPaymentId,
    /// The goal the money goes into.
    pub goal_id: GoalId,
    /// The user that owns the goal.
    pub user_id: UserID,
    /// The amount moved into the goal on each payment, always positive.
    pub amount: Decimal,
    /// How often the payment repeats.
    #[serde(flatten)]
    pub interval: PaymentInterval,
    /// The next date the payment is due.
    pub next_payment_date: Date,
    /// When the payment was scheduled.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the recurring payment table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_recurring_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_payment (
            id INTEGER PRIMARY KEY,
            goal_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            interval TEXT NOT NULL,
            interval_every INTEGER,
            interval_unit TEXT,
            next_payment_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(goal_id) REFERENCES goal(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_payment_due ON recurring_payment(next_payment_date);",
        (),
    )?;

    Ok(())
}

const SELECT_RECURRING_PAYMENT: &str = "SELECT id, goal_id, user_id, amount, interval, \
    interval_every, interval_unit, next_payment_date, created_at FROM recurring_payment";

fn map_recurring_payment_row(row: &Row) -> Result<RecurringPayment, rusqlite::Error> {
    let tag: String = row.get(4)?;
    let every: Option<u32> = row.get(5)?;
    let unit: Option<IntervalUnit> = row.get(6)?;
    let interval = PaymentInterval::from_parts(&tag, every, unit).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(RecurringPayment {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        user_id: UserID::new(row.get(2)?),
        amount: get_amount(row, 3)?,
        interval,
        next_payment_date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Record that `user_id` wants to move `amount` into `goal_id` every
/// `interval`, with the first payment due on `today`.
///
/// The goal and the user's balance are not changed.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive amount of money or
///   `interval` is a custom interval that repeats zero times,
/// - [Error::NotFound] if the goal does not exist or belongs to another user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn schedule_recurring(
    user_id: UserID,
    goal_id: GoalId,
    amount: Decimal,
    interval: PaymentInterval,
    today: Date,
    connection: &Connection,
) -> Result<RecurringPayment, Error> {
    let amount = normalize_positive_amount(amount, "amount")?;
    interval.validate()?;
    get_goal(goal_id, user_id, connection)?;

    let (every, unit) = interval.custom_parts();
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO recurring_payment
        (goal_id, user_id, amount, interval, interval_every, interval_unit, next_payment_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            goal_id,
            user_id.as_i64(),
            to_sql_text(amount),
            interval.tag(),
            every,
            unit,
            today,
            created_at,
        ],
    )?;

    Ok(RecurringPayment {
        id: connection.last_insert_rowid(),
        goal_id,
        user_id,
        amount,
        interval,
        next_payment_date: today,
        created_at,
    })
}

/// Get the recurring payments for `goal_id`, oldest first.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to another user.
pub fn list_recurring(
    user_id: UserID,
    goal_id: GoalId,
    connection: &Connection,
) -> Result<Vec<RecurringPayment>, Error> {
    get_goal(goal_id, user_id, connection)?;

    connection
        .prepare(&format!(
            "{SELECT_RECURRING_PAYMENT} WHERE goal_id = ?1 AND user_id = ?2 ORDER BY id"
        ))?
        .query_map(params![goal_id, user_id.as_i64()], map_recurring_payment_row)?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}

/// Get every user's recurring payments that are due on or before `on_date`,
/// earliest due first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_due_recurring_payments(
    on_date: Date,
    connection: &Connection,
) -> Result<Vec<RecurringPayment>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_RECURRING_PAYMENT} WHERE next_payment_date <= ?1 ORDER BY next_payment_date, id"
        ))?
        .query_map(params![on_date], map_recurring_payment_row)?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}

/// Move the due date of `recurring_payment_id` forward by one interval.
///
/// # Errors
/// Returns [Error::NotFound] if the recurring payment does not exist, or
/// [Error::Validation] if the next date is out of range.
pub fn advance_recurring_payment(
    recurring_payment_id: RecurringPaymentId,
    connection: &Connection,
) -> Result<RecurringPayment, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let mut payment = transaction
        .prepare(&format!("{SELECT_RECURRING_PAYMENT} WHERE id = ?1"))?
        .query_row(params![recurring_payment_id], map_recurring_payment_row)?;
    let next_payment_date = payment.interval.advance(payment.next_payment_date)?;

    transaction.execute(
        "UPDATE recurring_payment SET next_payment_date = ?1 WHERE id = ?2",
        params![next_payment_date, recurring_payment_id],
    )?;
    transaction.commit()?;

    tracing::debug!(
        "Recurring payment {recurring_payment_id} is next due on {next_payment_date}"
    );
    payment.next_payment_date = next_payment_date;

    Ok(payment)
}

//! Code for creating the user table and reading and writing a user's balance.

use std::fmt::Display;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    money::{get_amount, to_sql_text},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Users are registered by the authentication service, this crate only
/// tracks the money that is not locked into a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The money the user has available, negative if the user is in debt.
    pub balance: Decimal,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                balance TEXT NOT NULL DEFAULT '0.00'
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user with a zero balance into the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn create_user(connection: &Connection) -> Result<User, Error> {
    let balance = Decimal::new(0, 2);
    connection.execute(
        "INSERT INTO user (balance) VALUES (?1)",
        (to_sql_text(balance),),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User { id, balance })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, balance FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], |row| {
            Ok(User {
                id: UserID::new(row.get(0)?),
                balance: get_amount(row, 1)?,
            })
        })
        .map_err(|error| error.into())
}

/// Get the balance of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn get_balance(user_id: UserID, connection: &Connection) -> Result<Decimal, Error> {
    get_user_by_id(user_id, connection).map(|user| user.balance)
}

/// Overwrite the balance of the user `user_id`.
///
/// Callers must read the old balance and write the new one inside the same
/// SQL transaction, otherwise concurrent updates can be lost.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub(crate) fn set_balance(
    user_id: UserID,
    balance: Decimal,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET balance = ?1 WHERE id = ?2",
        (to_sql_text(balance), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

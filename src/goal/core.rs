use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    money::{get_amount, normalize_positive_amount, to_sql_text},
    user::UserID,
};

/// The ID of a goal.
pub type GoalId = DatabaseId;

/// Whether deleting a goal returns its funded amount to the user's balance.
///
/// Deleting a goal keeps the money that was moved into it out of the user's
/// balance. Flip this only together with a migration plan for existing users,
/// as it changes what the balance means.
pub const GOAL_DELETION_REFUNDS_BALANCE: bool = false;

/// A savings goal that the user moves money into from their balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// The id for the goal.
    pub id: GoalId,
    /// The user that owns the goal.
    pub user_id: UserID,
    /// What the user is saving for.
    pub title: String,
    /// The amount the user wants to save, always greater than zero.
    pub target_amount: Decimal,
    /// The amount currently saved, never negative.
    pub current_amount: Decimal,
    /// The category tag of the goal.
    pub category: String,
    /// When the goal was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The user supplied fields for a new goal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewGoal {
    /// What the user is saving for.
    pub title: String,
    /// The amount the user wants to save.
    #[serde(alias = "targetAmount")]
    pub target_amount: Decimal,
    /// The category tag of the goal.
    pub category: String,
}

/// Create the goal table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            target_amount TEXT NOT NULL,
            current_amount TEXT NOT NULL DEFAULT '0.00',
            category TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_goal(row: &rusqlite::Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        title: row.get(2)?,
        target_amount: get_amount(row, 3)?,
        current_amount: get_amount(row, 4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const SELECT_GOAL: &str =
    "SELECT id, user_id, title, target_amount, current_amount, category, created_at FROM goal";

/// Create a new goal for `user_id` with nothing saved yet.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if the title or category is blank, or the target
///   amount is not a positive amount of money,
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_goal(user_id: UserID, goal: NewGoal, connection: &Connection) -> Result<Goal, Error> {
    let title = goal.title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title cannot be empty".to_owned()));
    }

    let category = goal.category.trim();
    if category.is_empty() {
        return Err(Error::Validation("category cannot be empty".to_owned()));
    }

    let target_amount = normalize_positive_amount(goal.target_amount, "target_amount")?;
    let current_amount = Decimal::new(0, 2);
    let created_at = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO goal (user_id, title, target_amount, current_amount, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id.as_i64(),
                title,
                to_sql_text(target_amount),
                to_sql_text(current_amount),
                category,
                created_at,
            ],
        )
        .map_err(|error| match error {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                Error::NotFound
            }
            error => error.into(),
        })?;

    Ok(Goal {
        id: connection.last_insert_rowid(),
        user_id,
        title: title.to_owned(),
        target_amount,
        current_amount,
        category: category.to_owned(),
        created_at,
    })
}

/// Get the goal `goal_id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to another user.
pub fn get_goal(goal_id: GoalId, user_id: UserID, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare(&format!("{SELECT_GOAL} WHERE id = ?1 AND user_id = ?2"))?
        .query_row(params![goal_id, user_id.as_i64()], map_row_to_goal)
        .map_err(Error::from)
}

/// Get all of `user_id`'s goals, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_goals(user_id: UserID, connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_GOAL} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64()], map_row_to_goal)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Overwrite the saved amount of a goal.
///
/// Callers are responsible for keeping the user's balance consistent, see
/// [crate::goal::apply_funding].
pub(crate) fn set_goal_amount(
    goal_id: GoalId,
    user_id: UserID,
    current_amount: Decimal,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE goal SET current_amount = ?1 WHERE id = ?2 AND user_id = ?3",
        params![to_sql_text(current_amount), goal_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a goal and its recurring payments.
///
/// The money saved in the goal is not returned to the user's balance, see
/// [GOAL_DELETION_REFUNDS_BALANCE].
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist or belongs to another
/// user, in which case nothing is deleted.
pub fn delete_goal(goal_id: GoalId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "DELETE FROM recurring_payment WHERE goal_id = ?1 AND user_id = ?2",
        params![goal_id, user_id.as_i64()],
    )?;

    let rows_affected = transaction.execute(
        "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
        params![goal_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        // Dropping the transaction rolls it back.
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}

/// The total amount saved across all of `user_id`'s goals.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if the total is too large to represent,
/// - or [Error::SqlError] if there is an SQL error.
pub fn get_total_goal_amount(user_id: UserID, connection: &Connection) -> Result<Decimal, Error> {
    let goals = list_goals(user_id, connection)?;

    goals
        .iter()
        .try_fold(Decimal::new(0, 2), |total, goal| {
            total.checked_add(goal.current_amount)
        })
        .ok_or_else(|| Error::Validation("total saved across goals is too large".to_owned()))
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_goal_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_goal_table(&connection));
    }
}

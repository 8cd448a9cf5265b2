//! Moves money between a user's balance and one of their goals.
//!
//! A transfer reads the goal and the balance, validates the new amounts, and
//! writes both inside a single `BEGIN IMMEDIATE` SQLite transaction. The
//! write lock is taken before the first read, so two transfers for the same
//! user can never both pass the balance check on stale reads.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    goal::core::{Goal, GoalId, get_goal, set_goal_amount},
    money::normalize_amount,
    user::{UserID, get_balance, set_balance},
};

/// The state of the goal and the user's balance after a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingOutcome {
    /// The goal with its new saved amount.
    pub goal: Goal,
    /// The user's new balance.
    pub balance: Decimal,
}

/// Move `amount` from the balance of `user_id` into the goal `goal_id`.
///
/// A positive `amount` moves money from the balance into the goal, a
/// negative `amount` moves money from the goal back into the balance.
/// The goal and the balance are updated together or not at all.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is zero, has more than two decimal
///   places, or the new totals would overflow,
/// - [Error::NotFound] if the goal does not exist or is not owned by `user_id`,
/// - [Error::InsufficientBalance] if adding `amount` to the goal would make
///   the balance negative,
/// - [Error::InvalidWithdrawal] if removing `amount` from the goal would make
///   the goal's amount negative,
/// - [Error::SqlError] if the database fails, in which case neither the goal
///   nor the balance changes.
pub fn apply_funding(
    user_id: UserID,
    goal_id: GoalId,
    amount: Decimal,
    connection: &Connection,
) -> Result<FundingOutcome, Error> {
    let amount = normalize_amount(amount, "amount")?;
    if amount.is_zero() {
        return Err(Error::Validation("amount cannot be zero".to_owned()));
    }

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    match transfer(user_id, goal_id, amount, &transaction) {
        Ok(outcome) => {
            transaction.commit()?;
            tracing::info!(
                "Moved {amount} into goal {goal_id} for user {user_id}, new balance {}",
                outcome.balance
            );
            Ok(outcome)
        }
        Err(error) => {
            if let Err(rollback_error) = transaction.rollback() {
                tracing::error!(
                    "Could not roll back transfer of {amount} into goal {goal_id}: {rollback_error}"
                );
            }
            Err(error)
        }
    }
}

/// The body of [apply_funding], run inside its SQL transaction.
fn transfer(
    user_id: UserID,
    goal_id: GoalId,
    amount: Decimal,
    connection: &Connection,
) -> Result<FundingOutcome, Error> {
    let goal = get_goal(goal_id, user_id, connection)?;
    let balance = get_balance(user_id, connection)?;

    let new_balance = balance
        .checked_sub(amount)
        .ok_or_else(|| Error::Validation(format!("amount {amount} is too large")))?;

    if amount > Decimal::ZERO && new_balance < Decimal::ZERO {
        tracing::warn!(
            "User {user_id} tried to move {amount} into goal {goal_id} with a balance of {balance}"
        );
        return Err(Error::InsufficientBalance);
    }

    let new_goal_amount = goal
        .current_amount
        .checked_add(amount)
        .ok_or_else(|| Error::Validation(format!("amount {amount} is too large")))?;

    if new_goal_amount < Decimal::ZERO {
        tracing::warn!(
            "User {user_id} tried to remove {} from goal {goal_id} which holds {}",
            -amount,
            goal.current_amount
        );
        return Err(Error::InvalidWithdrawal);
    }

    set_goal_amount(goal_id, user_id, new_goal_amount, connection)?;
    set_balance(user_id, new_balance, connection)?;

    let goal = get_goal(goal_id, user_id, connection)?;

    Ok(FundingOutcome {
        goal,
        balance: new_balance,
    })
}

//! The summary of where a user's money is: free to spend or saved in goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    db::lock_connection,
    goal::get_total_goal_amount,
    transaction::get_net_deposits,
    user::{UserID, get_balance},
};

/// A snapshot of a user's money.
///
/// Unless a goal with money in it was deleted, `balance + allocated` equals
/// `net_deposits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Money not locked into a goal, negative if the user is in debt.
    pub balance: Decimal,
    /// The total saved across all goals.
    pub allocated: Decimal,
    /// Deposits minus withdrawals over the whole ledger.
    pub net_deposits: Decimal,
}

/// Get the balance summary of `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `user_id` does not refer to a registered user.
pub fn get_balance_summary(
    user_id: UserID,
    connection: &Connection,
) -> Result<BalanceSummary, Error> {
    Ok(BalanceSummary {
        balance: get_balance(user_id, connection)?,
        allocated: get_total_goal_amount(user_id, connection)?,
        net_deposits: get_net_deposits(user_id, connection)?,
    })
}

/// The state needed for reading the balance summary.
#[derive(Debug, Clone)]
pub struct BalanceState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Return the user's balance summary.
pub async fn get_balance_endpoint(
    State(state): State<BalanceState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<BalanceSummary>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_balance_summary(user_id, &connection).map(Json)
}

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    transaction::core::{NewTransaction, Transaction, TransactionId, update_transaction},
    user::UserID,
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that replaces a transaction and corrects the balance.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    body: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(replacement) = body?;
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(user_id, transaction_id, replacement, &connection)
        .inspect_err(|error| {
            tracing::debug!("Could not update transaction {transaction_id}: {error}")
        })
        .map(Json)
}

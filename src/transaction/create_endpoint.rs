//! Defines the endpoint for recording a new ledger transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    transaction::core::{NewTransaction, Transaction, create_transaction},
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for recording a deposit or withdrawal.
///
/// Responds with `201 Created` and the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    body: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(new_transaction) = body?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(user_id, new_transaction, &connection)?;
    tracing::info!(
        "User {user_id} recorded {} {} as transaction {}",
        transaction.kind,
        transaction.amount,
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        transaction::{
            NewTransaction, TransactionKind,
            create_endpoint::{CreateTransactionState, create_transaction_endpoint},
        },
        user::{UserID, create_user, get_balance},
    };

    fn get_test_state() -> (CreateTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(&conn).unwrap();

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        (state, user.id)
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_test_state();
        let body = NewTransaction {
            kind: TransactionKind::Deposit,
            title: "Pay day".to_owned(),
            date: date!(2026 - 10 - 01),
            category: "Salary".to_owned(),
            amount: dec!(1200),
            recurring: None,
        };

        let (status, Json(transaction)) =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Ok(Json(body)))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.amount, dec!(1200.00));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_balance(user_id, &connection), Ok(dec!(1200)));
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected() {
        let (state, user_id) = get_test_state();
        let body = NewTransaction {
            kind: TransactionKind::Withdrawal,
            title: "Coffee".to_owned(),
            date: date!(2026 - 10 - 01),
            category: "Food".to_owned(),
            amount: dec!(4.999),
            recurring: None,
        };

        let result =
            create_transaction_endpoint(State(state), Extension(user_id), Ok(Json(body))).await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    timezone::local_today,
    transaction::core::{UpcomingTransaction, list_upcoming_transactions},
    user::UserID,
};

/// The state needed to list upcoming recurring transactions.
#[derive(Debug, Clone)]
pub struct UpcomingTransactionsState {
    /// The local timezone as a canonical timezone name, used to decide what "today" is.
    pub local_timezone: String,
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpcomingTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns when each of the user's recurring
/// transactions next repeats, soonest first.
pub async fn list_upcoming_transactions_endpoint(
    State(state): State<UpcomingTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<UpcomingTransaction>>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    list_upcoming_transactions(user_id, today, &connection).map(Json)
}

//! Route handlers for scheduling and listing a goal's recurring payments.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::lock_connection,
    goal::GoalId,
    recurring::{
        core::{RecurringPayment, list_recurring, schedule_recurring},
        interval::PaymentInterval,
    },
    timezone::local_today,
    user::UserID,
};

/// The state needed for the recurring payment endpoints.
#[derive(Debug, Clone)]
pub struct RecurringPaymentState {
    /// The local timezone as a canonical timezone name, used to decide what "today" is.
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringPaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for scheduling a recurring payment.
#[derive(Debug, Deserialize)]
pub struct ScheduleRecurringRequest {
    pub amount: Decimal,
    #[serde(flatten)]
    pub interval: PaymentInterval,
}

/// Schedule a recurring payment into a goal, first due today.
pub async fn schedule_recurring_endpoint(
    State(state): State<RecurringPaymentState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
    body: Result<Json<ScheduleRecurringRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecurringPayment>), Error> {
    let Json(request) = body?;
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let payment = schedule_recurring(
        user_id,
        goal_id,
        request.amount,
        request.interval,
        today,
        &connection,
    )?;
    tracing::info!(
        "User {user_id} scheduled {} {} into goal {goal_id}",
        payment.amount,
        payment.interval
    );

    Ok((StatusCode::CREATED, Json(payment)))
}

/// List the recurring payments of a goal.
pub async fn list_recurring_endpoint(
    State(state): State<RecurringPaymentState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<Vec<RecurringPayment>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_recurring(user_id, goal_id, &connection).map(Json)
}

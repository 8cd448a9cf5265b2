//! The endpoint for moving money between the balance and a goal.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::lock_connection,
    goal::{
        core::GoalId,
        funding::{FundingOutcome, apply_funding},
    },
    user::UserID,
};

/// The state needed for funding a goal.
#[derive(Debug, Clone)]
pub struct FundGoalEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FundGoalEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct FundGoalRequest {
    /// Positive to add money to the goal, negative to take it back.
    pub amount: Decimal,
}

/// Apply a signed transfer to a goal and return the updated goal and balance.
pub async fn fund_goal_endpoint(
    State(state): State<FundGoalEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
    body: Result<Json<FundGoalRequest>, JsonRejection>,
) -> Result<Json<FundingOutcome>, Error> {
    let Json(FundGoalRequest { amount }) = body?;
    let connection = lock_connection(&state.db_connection)?;

    apply_funding(user_id, goal_id, amount, &connection).map(Json)
}

#[cfg(test)]
mod fund_goal_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::{
        goal::FundingOutcome,
        test_utils::{TestApp, must_create_goal},
    };

    #[tokio::test]
    async fn fund_and_withdraw() {
        let app = TestApp::with_balance(dec!(500)).await;
        let goal = must_create_goal(&app, "Holiday", dec!(1000)).await;

        let response = app
            .server
            .patch(&format!("/api/goals/{}", goal.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({ "amount": 200 }))
            .await;

        response.assert_status_ok();
        let outcome: FundingOutcome = response.json();
        assert_eq!(outcome.goal.current_amount, dec!(200.00));
        assert_eq!(outcome.balance, dec!(300.00));

        let response = app
            .server
            .patch(&format!("/api/goals/{}", goal.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({ "amount": -50.25 }))
            .await;

        response.assert_status_ok();
        let outcome: FundingOutcome = response.json();
        assert_eq!(outcome.goal.current_amount, dec!(149.75));
        assert_eq!(outcome.balance, dec!(350.25));
    }

    #[tokio::test]
    async fn overspending_is_a_conflict() {
        let app = TestApp::with_balance(dec!(500)).await;
        let goal = must_create_goal(&app, "Holiday", dec!(1000)).await;

        let response = app
            .server
            .patch(&format!("/api/goals/{}", goal.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({ "amount": 500.01 }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({
            "error": "insufficient balance",
            "code": "INSUFFICIENT_BALANCE",
        }));
    }

    #[tokio::test]
    async fn over_withdrawal_is_unprocessable() {
        let app = TestApp::with_balance(dec!(500)).await;
        let goal = must_create_goal(&app, "Holiday", dec!(1000)).await;

        let response = app
            .server
            .patch(&format!("/api/goals/{}", goal.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({ "amount": -1 }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<serde_json::Value>()["code"], "INVALID_WITHDRAWAL");
    }

    #[tokio::test]
    async fn missing_amount_is_a_validation_error() {
        let app = TestApp::with_balance(dec!(500)).await;
        let goal = must_create_goal(&app, "Holiday", dec!(1000)).await;

        let response = app
            .server
            .patch(&format!("/api/goals/{}", goal.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({ "amount": "lots" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>()["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_goal_is_not_found() {
        let app = TestApp::with_balance(dec!(500)).await;

        let response = app
            .server
            .patch("/api/goals/999")
            .add_cookie(app.cookie.clone())
            .json(&json!({ "amount": 1 }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn requires_auth() {
        let app = TestApp::with_balance(dec!(500)).await;
        let goal = must_create_goal(&app, "Holiday", dec!(1000)).await;

        let response = app
            .server
            .patch(&format!("/api/goals/{}", goal.id))
            .json(&json!({ "amount": 1 }))
            .await;

        response.assert_status_unauthorized();
    }
}

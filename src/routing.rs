//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router, middleware,
    routing::{get, patch, put},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::auth_guard,
    balance::get_balance_endpoint,
    endpoints,
    goal::{create_goal_endpoint, delete_goal_endpoint, fund_goal_endpoint, list_goals_endpoint},
    logging::logging_middleware,
    recurring::{list_recurring_endpoint, schedule_recurring_endpoint},
    transaction::{
        create_transaction_endpoint, edit_transaction_endpoint, list_transactions_endpoint,
        list_upcoming_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except the health check requires a valid auth cookie.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(
            endpoints::GOALS,
            get(list_goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::GOAL,
            patch(fund_goal_endpoint).delete(delete_goal_endpoint),
        )
        .route(
            endpoints::GOAL_RECURRING,
            get(list_recurring_endpoint).post(schedule_recurring_endpoint),
        )
        .route(endpoints::USER_BALANCE, get(get_balance_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_UPCOMING,
            get(list_upcoming_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION, put(edit_transaction_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, TRANSACTION, format_endpoint},
        goal::Goal,
        test_utils::{TestApp, must_create_goal},
        transaction::Transaction,
    };

    #[tokio::test]
    async fn health_does_not_need_auth() {
        let app = TestApp::with_balance(dec!(0)).await;

        let response = app.server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn api_routes_need_auth() {
        let app = TestApp::with_balance(dec!(0)).await;

        for path in [
            endpoints::GOALS,
            endpoints::USER_BALANCE,
            endpoints::TRANSACTIONS,
        ] {
            let response = app.server.get(path).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_json(&json!({
                "error": "the request is not authenticated",
                "code": "UNAUTHORIZED",
            }));
        }
    }

    #[tokio::test]
    async fn goal_lifecycle() {
        let app = TestApp::with_balance(dec!(500)).await;

        let response = app
            .server
            .post(endpoints::GOALS)
            .add_cookie(app.cookie.clone())
            .json(&json!({ "title": "Laptop", "targetAmount": 1500, "category": "Tech" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let laptop: Goal = response.json();
        let phone = must_create_goal(&app, "Phone", dec!(900)).await;

        let response = app
            .server
            .get(endpoints::GOALS)
            .add_cookie(app.cookie.clone())
            .await;
        response.assert_status_ok();
        let goals: Vec<Goal> = response.json();
        assert_eq!(
            goals.iter().map(|goal| goal.id).collect::<Vec<_>>(),
            vec![phone.id, laptop.id]
        );

        let response = app
            .server
            .delete(&format_endpoint(endpoints::GOAL, laptop.id))
            .add_cookie(app.cookie.clone())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Goal deleted successfully" }));

        let response = app
            .server
            .delete(&format_endpoint(endpoints::GOAL, laptop.id))
            .add_cookie(app.cookie.clone())
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn blank_goal_title_is_a_validation_error() {
        let app = TestApp::with_balance(dec!(0)).await;

        let response = app
            .server
            .post(endpoints::GOALS)
            .add_cookie(app.cookie.clone())
            .json(&json!({ "title": " ", "target_amount": 10, "category": "Tech" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn ledger_round_trip() {
        let app = TestApp::with_balance(dec!(100)).await;

        let response = app
            .server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(app.cookie.clone())
            .json(&json!({
                "kind": "Withdrawal",
                "title": "Groceries",
                "date": "2026-10-17",
                "category": "Food",
                "amount": 42.5,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let groceries: Transaction = response.json();

        let response = app
            .server
            .put(&format_endpoint(TRANSACTION, groceries.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({
                "type": "Withdrawal",
                "title": "Groceries",
                "date": "2026-10-17",
                "category": "Food",
                "amount": 40,
            }))
            .await;
        response.assert_status_ok();

        let response = app
            .server
            .get(endpoints::TRANSACTIONS)
            .add_cookie(app.cookie.clone())
            .await;
        let transactions: Vec<Transaction> = response.json();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].id, groceries.id);
        assert_eq!(transactions[0].amount, dec!(40));

        let response = app
            .server
            .get(endpoints::USER_BALANCE)
            .add_cookie(app.cookie.clone())
            .await;
        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["balance"], json!(60.0));
        assert_eq!(summary["net_deposits"], json!(60.0));
    }

    #[tokio::test]
    async fn overflowing_transaction_edit_is_rejected_and_server_keeps_working() {
        let app = TestApp::with_balance(dec!(0)).await;
        let response = app
            .server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(app.cookie.clone())
            .json(&json!({
                "kind": "Deposit",
                "title": "Windfall",
                "date": "2026-10-17",
                "category": "Income",
                "amount": 7.9e28,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let windfall: Transaction = response.json();

        let response = app
            .server
            .put(&format_endpoint(TRANSACTION, windfall.id))
            .add_cookie(app.cookie.clone())
            .json(&json!({
                "kind": "Withdrawal",
                "title": "Windfall",
                "date": "2026-10-17",
                "category": "Income",
                "amount": 7.9e28,
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
        let response = app
            .server
            .get(endpoints::TRANSACTIONS)
            .add_cookie(app.cookie.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>(), vec![windfall]);
    }

    #[tokio::test]
    async fn overflowing_goal_total_is_rejected_and_server_keeps_working() {
        let app = TestApp::with_balance(dec!(0)).await;
        for title in ["Yacht", "Island"] {
            app.server
                .post(endpoints::TRANSACTIONS)
                .add_cookie(app.cookie.clone())
                .json(&json!({
                    "kind": "Deposit",
                    "title": "Windfall",
                    "date": "2026-10-17",
                    "category": "Income",
                    "amount": 5e28,
                }))
                .await
                .assert_status(StatusCode::CREATED);
            let goal = must_create_goal(&app, title, dec!(1000)).await;
            app.server
                .patch(&format_endpoint(endpoints::GOAL, goal.id))
                .add_cookie(app.cookie.clone())
                .json(&json!({ "amount": 5e28 }))
                .await
                .assert_status_ok();
        }

        let response = app
            .server
            .get(endpoints::USER_BALANCE)
            .add_cookie(app.cookie.clone())
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
        app.server
            .get(endpoints::GOALS)
            .add_cookie(app.cookie.clone())
            .await
            .assert_status_ok();
    }
}

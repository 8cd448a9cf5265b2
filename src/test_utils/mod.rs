//! Helpers for tests that drive the full router over HTTP.

#![allow(missing_docs)]

use axum::{Router, extract::Path, http::StatusCode, routing::post};
use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
use axum_test::TestServer;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::json;
use time::macros::date;

use crate::{
    AppState, Error, UserID,
    auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
    build_router,
    endpoints::{self, format_endpoint},
    goal::Goal,
    transaction::{NewTransaction, TransactionKind, create_transaction},
    user::create_user,
};

const TEST_LOG_IN_ROUTE: &str = "/test/log_in/{user_id}";

/// Issues the auth cookie like the external authentication service would.
async fn stub_log_in_route(
    Path(user_id): Path<i64>,
    jar: PrivateCookieJar,
) -> Result<PrivateCookieJar, Error> {
    set_auth_cookie(jar, UserID::new(user_id), DEFAULT_COOKIE_DURATION)
}

/// A test server backed by an in-memory database holding one logged in user.
pub(crate) struct TestApp {
    pub server: TestServer,
    /// The auth cookie of the user.
    pub cookie: Cookie<'static>,
}

impl TestApp {
    /// Create the app with a user whose ledger holds a single deposit of
    /// `balance`, or nothing if `balance` is zero.
    pub async fn with_balance(balance: Decimal) -> Self {
        let connection =
            Connection::open_in_memory().expect("could not create in-memory SQLite database");
        let state = AppState::new(connection, "test secret", "Etc/UTC")
            .expect("could not create app state");

        let user_id = {
            let connection = state.db_connection.lock().expect("could not acquire lock");
            let user = create_user(&connection).expect("could not create test user");
            if balance > Decimal::ZERO {
                create_transaction(
                    user.id,
                    NewTransaction {
                        kind: TransactionKind::Deposit,
                        title: "Opening balance".to_owned(),
                        date: date!(2026 - 01 - 01),
                        category: "Income".to_owned(),
                        amount: balance,
                        recurring: None,
                    },
                    &connection,
                )
                .expect("could not create opening deposit");
            }
            user.id
        };

        let app = build_router(state.clone()).merge(
            Router::new()
                .route(TEST_LOG_IN_ROUTE, post(stub_log_in_route))
                .with_state(state),
        );
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE, user_id.as_i64()))
            .await;
        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_TOKEN);

        Self { server, cookie }
    }
}

/// Create a goal through the API, panicking if the request fails.
pub(crate) async fn must_create_goal(app: &TestApp, title: &str, target_amount: Decimal) -> Goal {
    let response = app
        .server
        .post(endpoints::GOALS)
        .add_cookie(app.cookie.clone())
        .json(&json!({
            "title": title,
            "target_amount": target_amount,
            "category": "Savings",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}

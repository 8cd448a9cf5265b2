use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    goal::core::{Goal, list_goals},
    user::UserID,
};

/// The state needed for listing goals.
#[derive(Debug, Clone)]
pub struct ListGoalsEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListGoalsEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Return the user's goals, newest first.
pub async fn list_goals_endpoint(
    State(state): State<ListGoalsEndpointState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Goal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_goals(user_id, &connection).map(Json)
}

#[cfg(test)]
mod list_goals_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;

    use crate::{
        endpoints,
        goal::Goal,
        test_utils::{TestApp, must_create_goal},
    };

    #[tokio::test]
    async fn lists_goals_newest_first() {
        let app = TestApp::with_balance(dec!(0)).await;
        let first = must_create_goal(&app, "Car", dec!(8000)).await;
        let second = must_create_goal(&app, "Holiday", dec!(2500)).await;

        let response = app
            .server
            .get(endpoints::GOALS)
            .add_cookie(app.cookie.clone())
            .await;

        response.assert_status_ok();
        let ids: Vec<_> = response
            .json::<Vec<Goal>>()
            .into_iter()
            .map(|goal| goal.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn requires_log_in() {
        let app = TestApp::with_balance(dec!(0)).await;

        app.server
            .get(endpoints::GOALS)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

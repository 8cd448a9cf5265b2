//! Goal creation endpoint.

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
    goal::core::{Goal, NewGoal, create_goal},
    user::UserID,
};

/// The state needed for creating a goal.
#[derive(Debug, Clone)]
pub struct CreateGoalEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateGoalEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a goal with nothing saved. Responds with `201 Created` and the goal.
pub async fn create_goal_endpoint(
    State(state): State<CreateGoalEndpointState>,
    Extension(user_id): Extension<UserID>,
    body: Result<Json<NewGoal>, JsonRejection>,
) -> Result<(StatusCode, Json<Goal>), Error> {
    let Json(new_goal) = body?;
    let connection = lock_connection(&state.db_connection)?;

    let goal = create_goal(user_id, new_goal, &connection)?;
    tracing::info!("User {user_id} created goal {}", goal.id);

    Ok((StatusCode::CREATED, Json(goal)))
}

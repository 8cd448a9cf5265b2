//! Goal deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    db::lock_connection,
    goal::core::{GoalId, delete_goal},
    user::UserID,
};

/// The state needed for deleting a goal.
#[derive(Debug, Clone)]
pub struct DeleteGoalEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteGoalEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a goal and its recurring payments. The saved amount is not refunded.
pub async fn delete_goal_endpoint(
    State(state): State<DeleteGoalEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_goal(goal_id, user_id, &connection)?;
    tracing::info!("User {user_id} deleted goal {goal_id}");

    Ok(Json(json!({ "message": "Goal deleted successfully" })))
}

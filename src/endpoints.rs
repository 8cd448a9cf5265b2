//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/goals/{goal_id}', use [format_endpoint].

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route to list and create goals.
pub const GOALS: &str = "/api/goals";
/// The route to fund or delete a single goal.
pub const GOAL: &str = "/api/goals/{goal_id}";
/// The route to schedule and list a goal's recurring payments.
pub const GOAL_RECURRING: &str = "/api/goals/{goal_id}/recurring";
/// The route for the user's balance summary.
pub const USER_BALANCE: &str = "/api/user/balance";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for when the user's recurring transactions next repeat.
pub const TRANSACTIONS_UPCOMING: &str = "/api/transactions/upcoming";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/goals/{goal_id}', '{goal_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

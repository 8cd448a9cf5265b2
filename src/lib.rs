//! Vaultly is a personal finance tracker: users record deposits and
//! withdrawals, and move money from their running balance into savings goals.
//!
//! This library provides a JSON REST API and the storage functions behind it.
//! The central operation is [apply_funding], which moves money between a
//! user's balance and a goal so that neither ever changes without the other.
//! Recurring payment intents record how much should go into a goal and how
//! often; running them is left to an external job runner that uses
//! [get_due_recurring_payments], [apply_funding] and [advance_recurring_payment].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod balance;
mod database_id;
mod db;
pub mod endpoints;
mod error;
mod goal;
mod logging;
mod money;
mod recurring;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, create_cookie_key};
pub use auth::{AuthState, DEFAULT_COOKIE_DURATION, auth_guard, set_auth_cookie};
pub use balance::{BalanceSummary, get_balance_summary};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use goal::{
    FundingOutcome, GOAL_DELETION_REFUNDS_BALANCE, Goal, GoalId, NewGoal, apply_funding,
    create_goal, delete_goal, get_goal, get_total_goal_amount, list_goals,
};
pub use logging::logging_middleware;
pub use money::{MONEY_SCALE, normalize_amount, normalize_positive_amount};
pub use recurring::{
    IntervalUnit, PaymentInterval, RecurringPayment, RecurringPaymentId,
    advance_recurring_payment, get_due_recurring_payments, list_recurring, schedule_recurring,
};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};
pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionKind, UpcomingTransaction,
    create_transaction, get_net_deposits, get_transaction, list_transactions,
    list_upcoming_transactions, update_transaction,
};
pub use user::{User, UserID, create_user, get_balance, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the ctrl+c signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

//! The ledger of deposits and withdrawals.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and database functions that keep the user's
//!   balance in step with the ledger
//! - Route handlers for listing, recording and correcting transactions, and
//!   for seeing when recurring transactions next repeat

mod core;
mod create_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod upcoming_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionKind, UpcomingTransaction,
    create_transaction, create_transaction_table, get_net_deposits, get_transaction,
    list_transactions, list_upcoming_transactions, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use upcoming_endpoint::list_upcoming_transactions_endpoint;

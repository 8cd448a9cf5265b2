//! Recurring payment intents: what to move into a goal, how often, and when
//! it is next due.

mod core;
mod endpoints;
mod interval;

pub use core::{
    RecurringPayment, RecurringPaymentId, advance_recurring_payment,
    create_recurring_payment_table, get_due_recurring_payments, list_recurring,
    schedule_recurring,
};
pub use endpoints::{list_recurring_endpoint, schedule_recurring_endpoint};
pub use interval::{IntervalUnit, PaymentInterval};

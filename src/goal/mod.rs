//! Savings goals and the transfers that move money in and out of them.

mod core;
mod create;
mod delete;
mod fund;
mod funding;
mod list;

pub use core::{
    GOAL_DELETION_REFUNDS_BALANCE, Goal, GoalId, NewGoal, create_goal, create_goal_table,
    delete_goal, get_goal, get_total_goal_amount, list_goals,
};
pub use create::create_goal_endpoint;
pub use delete::delete_goal_endpoint;
pub use fund::fund_goal_endpoint;
pub use funding::{FundingOutcome, apply_funding};
pub use list::list_goals_endpoint;

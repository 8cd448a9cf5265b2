mod cookie;
mod middleware;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use middleware::{AuthState, auth_guard};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

//! Password log in for the treasurer and the cookie that keeps them logged in.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use user::{User, UserID, create_user_table, get_user_by_id, upsert_user};

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;

//! CLI entry points. Each command builds a client from [`Config`](crate::config::Config)
//! and prints its result to stdout.

mod admin;
mod hashtags;
mod request;
mod session;

pub use admin::{admin_delete, admin_list, admin_notice, admin_set_status};
pub use hashtags::{hashtags, set_hashtags};
pub use request::{parse_query_param, request};
pub use session::{LoginMethod, delete_account, login, logout, whoami};

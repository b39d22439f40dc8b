//! Typed backend endpoints built on [`AuthClient`](crate::http::AuthClient).

pub mod admin;
pub mod auth;
mod envelope;
pub mod user;

pub use admin::{AdminResource, PageQuery};
pub use envelope::{Listing, Page};
pub use user::Profile;

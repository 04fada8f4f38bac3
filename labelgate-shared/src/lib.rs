//! # Labelgate Shared Library
//!
//! Account management core used by the Labelgate API server.
//!
//! ## Module Organization
//!
//! - `account`: registration, password reset and login flows
//! - `auth`: password hashing, password policy and signed tokens
//! - `db`: connection pool and migrations
//! - `mail`: outbound e-mail seam
//! - `models`: database models
//! - `store`: user persistence seam with PostgreSQL and in-memory backends

pub mod account;
pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod store;

/// Current version of the Labelgate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

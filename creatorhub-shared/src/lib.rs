//! # Creator Hub Shared Library
//!
//! Domain types, persistence and auth primitives used by the Creator Hub API.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: database models and their queries
//! - `auth`: passwords, JWTs, request extractors and authorization checks
//! - `notifications`: notification fan-out for domain events
//! - `storage`: upload policy and object storage

pub mod auth;
pub mod db;
pub mod models;
pub mod notifications;
pub mod storage;

/// Current version of the Creator Hub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

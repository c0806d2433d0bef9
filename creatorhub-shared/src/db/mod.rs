/// Database layer for Creator Hub
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded schema migrations
///
/// Table models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;

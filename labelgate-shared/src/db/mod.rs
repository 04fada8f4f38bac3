/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded schema migrations
///
/// Models are in the `models` module at crate root level.
pub mod migrations;
pub mod pool;

/// Middleware for the API server
///
/// - `security`: hardening headers on every response
///
/// Authentication lives in `creatorhub_shared::auth::middleware` as
/// extractors plus the `require_auth` layer.

pub mod security;

//! Middleware and request extractors.

pub mod auth;
pub mod rate_limit;
pub mod session;

pub use auth::{RequireAuth, ResolvedIdentity, clear_current_user, set_current_user};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use session::create_session_layer;

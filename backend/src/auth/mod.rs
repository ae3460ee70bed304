//! Authentication module
//!
//! Verifies the bearer tokens issued by the external auth provider and
//! turns them into a [`UserScope`](crate::gateway::UserScope).

mod jwt;
mod middleware;

pub use jwt::{Claims, SessionVerifier};
pub use middleware::SessionUser;

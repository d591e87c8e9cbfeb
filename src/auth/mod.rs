mod helpers;
mod middleware;
mod token;

pub use middleware::{AuthError, RequireAdmin, RequireUser};
pub use token::{SessionClaims, SessionCodec};

//! Authentication: password and basic-credential verification, the JWT
//! token service, the request gates, and the login/register/profile
//! handlers.

pub mod credentials;
pub mod extract;
pub mod handlers;
pub mod token;

pub use credentials::BasicVerifier;
pub use extract::{AuthUser, BasicGuard};
pub use token::{Claims, TokenService};

mod helpers;
mod middleware;
mod token;
mod verifier;

pub use helpers::extract_token_from_header;
pub use middleware::{AuthError, RequireCaller};
pub use token::{TokenGenerator, parse_token};
pub use verifier::{Identity, StoreTokenVerifier, TokenVerifier, verify_with_timeout};

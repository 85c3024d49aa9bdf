pub mod claims;
pub mod errors;
pub mod service;

pub use claims::Claims;
pub use claims::TOKEN_TTL_SECONDS;
pub use errors::TokenError;
pub use service::TokenService;

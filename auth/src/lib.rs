//! Authentication building blocks for the account service.
//!
//! - Password hashing (Argon2id)
//! - Bearer token issuance and validation (HS256 JWT, one hour lifetime)
//! - Authentication coordination
//! - Request-scoped identity holder
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::TokenService;
//!
//! // base64("super-secret-signing-key-for-tests-32-bytes")
//! let tokens = TokenService::from_base64_secret(
//!     "c3VwZXItc2VjcmV0LXNpZ25pbmcta2V5LWZvci10ZXN0cy0zMi1ieXRlcw==",
//! )
//! .unwrap();
//! let token = tokens.issue("alice@example.com").unwrap();
//! assert!(tokens.validate(&token, "alice@example.com"));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, PasswordHasher, TokenService};
//!
//! let tokens = TokenService::from_base64_secret(
//!     "c3VwZXItc2VjcmV0LXNpZ25pbmcta2V5LWZvci10ZXN0cy0zMi1ieXRlcw==",
//! )
//! .unwrap();
//! let auth = Authenticator::new(PasswordHasher::new(), tokens);
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let result = auth.authenticate("password123", &hash, "alice@example.com").unwrap();
//!
//! // Later requests: resolve the subject
//! let subject = auth.token_service().extract_subject(&result.access_token).unwrap();
//! assert_eq!(subject, "alice@example.com");
//! ```

pub mod authenticator;
pub mod context;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use context::AuthenticatedIdentity;
pub use context::SecurityContext;
pub use jwt::Claims;
pub use jwt::TokenError;
pub use jwt::TokenService;
pub use jwt::TOKEN_TTL_SECONDS;
pub use password::PasswordError;
pub use password::PasswordHasher;

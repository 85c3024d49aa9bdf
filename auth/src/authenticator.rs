use crate::jwt::TokenError;
use crate::jwt::TokenService;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
#[derive(Clone)]
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_service: TokenService,
}

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Signed bearer token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator from its parts.
    pub fn new(password_hasher: PasswordHasher, token_service: TokenService) -> Self {
        Self {
            password_hasher,
            token_service,
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue a token bound to `subject`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Identifier the token is issued for
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match (or hash is unreadable)
    /// * `TokenError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.token_service.issue(subject)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Reject a login for which no stored hash exists.
    ///
    /// Spends one hashing round on `password` so the response takes as long
    /// as a wrong-password rejection.
    pub fn reject(&self, password: &str) -> AuthenticationError {
        let _ = self.password_hasher.hash(password);
        AuthenticationError::InvalidCredentials
    }

    /// Token service used to validate presented bearer tokens.
    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "c3VwZXItc2VjcmV0LXNpZ25pbmcta2V5LWZvci10ZXN0cy0zMi1ieXRlcw==";

    fn authenticator() -> Authenticator {
        Authenticator::new(
            PasswordHasher::with_params(1024, 1, 1).expect("Failed to build hasher"),
            TokenService::from_base64_secret(SECRET).expect("Failed to decode secret"),
        )
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("password123")
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate("password123", &hash, "a@x.com")
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());

        let tokens = authenticator.token_service();
        assert!(tokens.validate(&result.access_token, "a@x.com"));
        assert_eq!(
            tokens
                .extract_subject(&result.access_token)
                .expect("Token validation failed"),
            "a@x.com"
        );
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("password123")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrongpass", &hash, "a@x.com");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_corrupted_hash() {
        let result = authenticator().authenticate("password123", "not-a-hash", "a@x.com");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reject_costs_a_hashing_round() {
        // Costs high enough that a skipped hash would be obvious
        let slow = Authenticator::new(
            PasswordHasher::with_params(8 * 1024, 2, 1).expect("Failed to build hasher"),
            TokenService::from_base64_secret(SECRET).expect("Failed to decode secret"),
        );
        let hash = slow
            .hash_password("password123")
            .expect("Failed to hash password");

        let started = std::time::Instant::now();
        let wrong_password = slow.authenticate("wrongpass", &hash, "a@x.com");
        let verify_cost = started.elapsed();

        let started = std::time::Instant::now();
        let unknown = slow.reject("wrongpass");
        let reject_cost = started.elapsed();

        assert!(matches!(
            wrong_password,
            Err(AuthenticationError::InvalidCredentials)
        ));
        assert!(matches!(unknown, AuthenticationError::InvalidCredentials));
        assert!(reject_cost * 4 >= verify_cost);
    }
}

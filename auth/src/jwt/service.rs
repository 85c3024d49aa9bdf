use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Issues and validates signed, time-limited bearer tokens.
///
/// Tokens are HS256 JWTs carrying [`Claims`]. The service holds only the
/// signing key, so a single instance can be shared across concurrent requests.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenService {
    /// Create a token service from raw key bytes.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Create a token service from a base64-encoded shared secret.
    ///
    /// # Errors
    /// * `InvalidSigningKey` - Secret is not valid base64
    pub fn from_base64_secret(secret: &str) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_base64_secret(secret)
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;
        let decoding_key = DecodingKey::from_base64_secret(secret)
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::HS256,
        })
    }

    /// Issue a token for a subject, valid for one hour from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.sign(&Claims::for_subject(subject, Utc::now()))
    }

    /// Sign the given claims as-is.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Extract the subject of a fully verified token.
    ///
    /// Signature, algorithm, structure and expiry are all checked.
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiration
    /// * `InvalidToken` - Token is malformed, uses another algorithm or has a bad signature
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token, true).map(|claims| claims.sub)
    }

    /// Extract the expiration of a signed token.
    ///
    /// The signature is verified but expiry is not enforced, so the
    /// expiration of an already expired token can still be read.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed or has a bad signature
    pub fn extract_expiration(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.decode(token, false)?;

        claims
            .expires_at()
            .ok_or_else(|| TokenError::InvalidToken("Expiration out of range".to_string()))
    }

    /// Check whether a signed token is past its expiration.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed or has a bad signature
    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        let claims = self.decode(token, false)?;
        Ok(claims.is_expired(Utc::now().timestamp()))
    }

    /// Validate a token for an expected subject.
    ///
    /// True only when the signature is valid, the subject matches and the
    /// token is not expired.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        match self.decode(token, true) {
            Ok(claims) => {
                claims.sub == expected_subject && !claims.is_expired(Utc::now().timestamp())
            }
            Err(_) => false,
        }
    }

    fn decode(&self, token: &str, enforce_expiry: bool) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = enforce_expiry;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidToken(e.to_string()),
            })
    }
}

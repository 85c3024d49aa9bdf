use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Lifetime of every issued token, in seconds.
pub const TOKEN_TTL_SECONDS: i64 = 3600;

/// Claims carried by a bearer token.
///
/// `exp` is always `iat + TOKEN_TTL_SECONDS` for tokens built through
/// [`Claims::for_subject`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (the account's email)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims for a subject issued at the given instant.
    pub fn for_subject(subject: impl ToString, issued_at: DateTime<Utc>) -> Self {
        let expiration = issued_at + Duration::seconds(TOKEN_TTL_SECONDS);

        Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Expiration as a UTC timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Check if the token is expired at the given Unix timestamp.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_subject() {
        let now = Utc::now();
        let claims = Claims::for_subject("a@x.com", now);

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 60 * 60); // 1 hour
    }

    #[test]
    fn test_expires_at() {
        let claims = Claims::for_subject("a@x.com", Utc::now());
        let expires_at = claims.expires_at().expect("exp out of range");

        assert_eq!(expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims {
            sub: "a@x.com".to_string(),
            iat: 0,
            exp: 1000,
        };

        assert!(!claims.is_expired(999)); // Not expired
        assert!(!claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001)); // Expired
    }
}

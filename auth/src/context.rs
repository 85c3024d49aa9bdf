use std::collections::BTreeSet;

/// Principal resolved from a validated bearer token.
///
/// Built once per authenticated request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Token subject (the account's email)
    pub subject: String,

    /// Granted permission labels (no roles are modelled, so always empty)
    pub authorities: BTreeSet<String>,
}

impl AuthenticatedIdentity {
    /// Create an identity without authorities.
    pub fn new(subject: impl ToString) -> Self {
        Self {
            subject: subject.to_string(),
            authorities: BTreeSet::new(),
        }
    }
}

/// Request-scoped holder of the current identity.
///
/// Starts anonymous and can be authenticated at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    identity: Option<AuthenticatedIdentity>,
}

impl SecurityContext {
    /// Context for a request that presented no credentials.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a request whose token was validated.
    pub fn authenticated(identity: AuthenticatedIdentity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Set the identity if none is present yet.
    ///
    /// # Returns
    /// False if the context was already authenticated (left unchanged)
    pub fn establish(&mut self, identity: AuthenticatedIdentity) -> bool {
        if self.identity.is_some() {
            return false;
        }
        self.identity = Some(identity);
        true
    }

    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

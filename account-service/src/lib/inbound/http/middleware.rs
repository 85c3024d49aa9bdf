use auth::AuthenticatedIdentity;
use auth::SecurityContext;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::user::models::EmailAddress;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

const BEARER_PREFIX: &str = "Bearer ";

/// Identity of the caller, taken from the request's [`SecurityContext`].
///
/// Rejects with 401 when the request carried no valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthenticatedIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::identity)
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// Middleware that resolves the caller's identity from a bearer token.
///
/// - no `Authorization: Bearer` header: continue anonymously
/// - token invalid (malformed, expired, bad signature): 403, chain halted
/// - context already authenticated: continue untouched
/// - unknown or disabled account, or token not valid for it: 403
/// - otherwise: continue with an authenticated [`SecurityContext`]
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_token_from_header(&req) else {
        if req.extensions().get::<SecurityContext>().is_none() {
            req.extensions_mut().insert(SecurityContext::anonymous());
        }
        return next.run(req).await;
    };

    let tokens = state.authenticator.token_service();

    let subject = match tokens.extract_subject(&token) {
        Ok(subject) => subject,
        Err(e) => {
            tracing::warn!(error = %e, "Bearer token rejected");
            return forbidden();
        }
    };

    if req
        .extensions()
        .get::<SecurityContext>()
        .is_some_and(SecurityContext::is_authenticated)
    {
        return next.run(req).await;
    }

    let email = match EmailAddress::new(subject) {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!(error = %e, "Token subject is not an email address");
            return forbidden();
        }
    };

    let user = match state.user_service.get_user_by_email(&email).await {
        Ok(user) if user.enabled => user,
        Ok(user) => {
            tracing::warn!(user_id = %user.id, "Token presented for disabled account");
            return forbidden();
        }
        Err(UserError::NotFoundByEmail(_)) => {
            tracing::warn!(email = %email, "Token presented for unknown account");
            return forbidden();
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !tokens.validate(&token, user.email.as_str()) {
        tracing::warn!(user_id = %user.id, "Token not valid for account");
        return forbidden();
    }

    let identity = AuthenticatedIdentity::new(user.email.as_str());
    match req.extensions_mut().get_mut::<SecurityContext>() {
        Some(context) => {
            context.establish(identity);
        }
        None => {
            req.extensions_mut()
                .insert(SecurityContext::authenticated(identity));
        }
    }

    tracing::debug!(user_id = %user.id, "Request authenticated");
    next.run(req).await
}

fn extract_token_from_header(req: &Request) -> Option<String> {
    req.headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::to_string)
}

fn forbidden() -> Response {
    StatusCode::FORBIDDEN.into_response()
}

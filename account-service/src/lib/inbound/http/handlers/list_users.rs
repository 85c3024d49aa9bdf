use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::middleware::Authenticated;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    tracing::debug!(subject = %identity.subject, "Listing users");

    let users = state.user_service.list_users().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        users.iter().map(UserData::from).collect(),
    ))
}

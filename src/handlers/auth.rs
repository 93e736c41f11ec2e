use axum::{extract::State, response::Json, response::Response};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, ValidatedJson},
    services::users::{
        AuthenticatedUser, LoginRequest, RegisterRequest, SaveAddressRequest,
        SavedAddressesResponse, UserProfile,
    },
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Response, ServiceError> {
    let user = state.services.users.register(request).await?;
    Ok(created_response(user))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthenticatedUser>, ServiceError> {
    Ok(Json(state.services.users.login(request).await?))
}

pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, ServiceError> {
    Ok(Json(state.services.users.profile(user.user_id).await?))
}

pub async fn save_address(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<SaveAddressRequest>,
) -> Result<Json<SavedAddressesResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .users
            .save_address(user.user_id, request)
            .await?,
    ))
}

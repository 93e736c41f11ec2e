use axum::{extract::State, response::Json};

use crate::{errors::ServiceError, services::reports::AdminStats, AppState};

pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ServiceError> {
    Ok(Json(state.services.reports.admin_stats().await?))
}

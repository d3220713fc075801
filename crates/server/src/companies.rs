//! Company API endpoints

use api_types::{
    ActionResponse,
    company::{CompanyCreated, CompanyNew},
};
use axum::{Json, extract::State, http::StatusCode};

use crate::{ServerError, extract::JsonBody, server::ServerState};

/// Handle requests for creating a new company (tenant)
pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<CompanyNew>,
) -> Result<(StatusCode, Json<ActionResponse<CompanyCreated>>), ServerError> {
    let id = state.engine.create_company(&payload.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok(CompanyCreated { id })),
    ))
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Serialize;

use crate::api::dto::ErrorResponse;
use crate::api::middleware::Claims;
use crate::api::AppState;
use crate::application::party::GetPartyDetails;
use crate::domain::entities::PartySummary;
use crate::domain::errors::PartyError;

#[derive(Debug, Serialize)]
pub struct PartyDetailsResponse {
    pub success: bool,
    pub party: PartySummary,
    #[serde(rename = "isMember")]
    pub is_member: bool,
    #[serde(rename = "isHost")]
    pub is_host: bool,
}

/// GET /api/party/:partyCode - Live party summary
pub async fn get_party_details(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(party_code): Path<String>,
) -> Result<Json<PartyDetailsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let output = GetPartyDetails::new(state.directory.clone())
        .execute(&party_code, &claims.user_id)
        .await
        .map_err(|e| {
            let status = match e {
                PartyError::InvalidCode(_) => StatusCode::BAD_REQUEST,
                PartyError::PartyNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                    code: e.code().to_string(),
                }),
            )
        })?;

    Ok(Json(PartyDetailsResponse {
        success: true,
        party: output.summary,
        is_member: output.is_member,
        is_host: output.is_host,
    }))
}

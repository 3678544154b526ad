use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use chirpy_db::{ChirpRecord, SortOrder};
use chirpy_types::api::CreateChirpRequest;
use chirpy_types::models::Chirp;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiJson};
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct ChirpQuery {
    pub author_id: Option<u64>,
    #[serde(default)]
    pub sort: SortOrder,
}

fn public_chirp(record: ChirpRecord) -> Chirp {
    Chirp {
        id: record.id,
        body: record.body,
        author_id: record.author_id,
    }
}

/// POST /api/chirps
pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = blocking(move || Ok(state.db.create_chirp(&req.body, user_id)?)).await?;
    Ok((StatusCode::CREATED, Json(public_chirp(record))))
}

/// GET /api/chirps?author_id=&sort=asc|desc
pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ChirpQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let records = blocking(move || {
        let records = match query.author_id {
            Some(author_id) => state.db.list_chirps_by_author(author_id, query.sort)?,
            None => state.db.list_chirps(query.sort)?,
        };
        Ok(records)
    })
    .await?;

    let chirps: Vec<Chirp> = records.into_iter().map(public_chirp).collect();
    Ok(Json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = blocking(move || Ok(state.db.get_chirp(chirp_id)?)).await?;
    Ok(Json(public_chirp(record)))
}

/// DELETE /api/chirps/{chirp_id}
///
/// Only the author may delete a chirp.
pub async fn delete_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u64>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.guard.delete_chirp(user_id, chirp_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

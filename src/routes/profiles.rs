use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::Validate;
use crate::error::RecommendError;
use crate::models::{ApiResponse, CreateProfileRequest, NewProfile, ProfileIdData};
use crate::routes::AppState;
use crate::services::{ProfileStore, StoreError};

/// Configure profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/profile/create", web::post().to(create_profile))
        .route("/profile/{id}", web::get().to(get_profile));
}

fn profile_store(state: &AppState) -> Result<&Arc<dyn ProfileStore>, RecommendError> {
    state
        .profiles
        .as_ref()
        .ok_or_else(|| RecommendError::DataUnavailable("profile store is not configured".to_string()))
}

fn store_error(operation: &'static str, id: &str, e: StoreError) -> RecommendError {
    match e {
        StoreError::NotFound(what) => RecommendError::NotFound(what),
        other => RecommendError::query_failed(operation, format!("id={}", id), other),
    }
}

/// POST /api/profile/create
async fn create_profile(
    state: web::Data<AppState>,
    req: web::Json<CreateProfileRequest>,
) -> Result<HttpResponse, RecommendError> {
    req.validate()?;
    let req = req.into_inner();

    let subjects: Vec<String> = req
        .subjects
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if req.username.trim().is_empty() || req.province.trim().is_empty() || subjects.is_empty() {
        return Err(RecommendError::InvalidArgument(
            "username, province and subjects are required".to_string(),
        ));
    }

    let profile = profile_store(&state)?
        .create_profile(NewProfile {
            username: req.username.trim().to_string(),
            gender: req.gender,
            province: req.province.trim().to_string(),
            score: req.score,
            rank: req.rank,
            subjects,
            preference: req.preference.unwrap_or_default(),
        })
        .await
        .map_err(|e| store_error("create profile", &req.username, e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ProfileIdData { profile_id: profile.id },
        "profile created",
    )))
}

/// GET /api/profile/{id}
async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, RecommendError> {
    let id = path.into_inner();

    let profile = profile_store(&state)?
        .get_profile(&id)
        .await
        .map_err(|e| store_error("get profile", &id, e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(profile, "success")))
}

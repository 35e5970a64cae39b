use actix_web::{web, HttpResponse, Responder};
use crate::error::RecommendError;
use crate::models::{ApiResponse, HealthResponse, MajorGroupRequest, UniversityPriorityRequest};
use crate::routes::AppState;

/// Configure health and recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/voluntary/universityPriority", web::post().to(university_priority))
        .route("/voluntary/majorGroup", web::post().to(major_group));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => false,
    };

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_tables: state.recommender.index().cached_tables(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommend universities
///
/// POST /api/voluntary/universityPriority
///
/// Request body:
/// ```json
/// {
///   "profile_id": "string",
///   "province": "湖北",
///   "subjects": "物理,化学,生物",
///   "score": 600,
///   "strategy": 1,
///   "citys": "武汉,宜昌",
///   "college_type": "公办,985",
///   "page": 1,
///   "page_size": 20
/// }
/// ```
async fn university_priority(
    state: web::Data<AppState>,
    req: web::Json<UniversityPriorityRequest>,
) -> Result<HttpResponse, RecommendError> {
    let request = req.into_inner();
    tracing::info!(
        "Recommend request: profile={:?}, province={:?}, strategy={:?}, page={:?}",
        request.profile_id,
        request.criteria.province,
        request.criteria.strategy,
        request.page
    );

    let page = state.recommender.recommend(request).await.map_err(|e| {
        tracing::error!("Recommendation failed: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(page, "success")))
}

/// Detail of one major group
///
/// POST /api/voluntary/majorGroup
async fn major_group(
    state: web::Data<AppState>,
    req: web::Json<MajorGroupRequest>,
) -> Result<HttpResponse, RecommendError> {
    let request = req.into_inner();
    tracing::info!(
        "Major group request: school={}, group={}",
        request.school_code,
        request.group_code
    );

    let group = state.recommender.major_group_detail(request).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(group, "success")))
}

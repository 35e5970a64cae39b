use actix_web::{web, HttpResponse};
use crate::error::RecommendError;
use crate::models::{ApiResponse, ProvinceOptions, ProvinceOptionsQuery};
use crate::routes::AppState;

/// Configure selection option routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/options/provinces", web::get().to(get_provinces));
}

/// GET /api/options/provinces?province=湖北,湖南
async fn get_provinces(
    state: web::Data<AppState>,
    query: web::Query<ProvinceOptionsQuery>,
) -> Result<HttpResponse, RecommendError> {
    let provinces = state.regions.provinces(query.province.as_deref()).await;

    tracing::debug!("Returning cities for {} provinces", provinces.len());

    Ok(HttpResponse::Ok().json(ApiResponse::success(ProvinceOptions { provinces }, "success")))
}

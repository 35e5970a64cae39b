use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::error::RecommendError;
use crate::models::{ApiResponse, RankData, RankForScoreQuery, ScoreData, ScoreForRankQuery, SubjectCategory};
use crate::routes::AppState;

/// Configure score/rank conversion routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/rank/getRank", web::get().to(get_rank))
        .route("/rank/getScore", web::get().to(get_score));
}

fn parse_category(text: &str) -> Result<SubjectCategory, RecommendError> {
    text.parse().map_err(RecommendError::InvalidArgument)
}

/// GET /api/rank/getRank?province=湖北&category=physics&year=2024&score=600
async fn get_rank(
    state: web::Data<AppState>,
    query: web::Query<RankForScoreQuery>,
) -> Result<HttpResponse, RecommendError> {
    query.validate()?;
    let category = parse_category(&query.category)?;

    let rank = state
        .recommender
        .index()
        .rank_for_score(&query.province, category, query.year, query.score)
        .await?;

    tracing::debug!("Rank for score {} in {} {}: {}", query.score, query.province, category, rank);

    Ok(HttpResponse::Ok().json(ApiResponse::success(RankData { rank, year: query.year }, "success")))
}

/// GET /api/rank/getScore?province=湖北&category=physics&year=2024&rank=12000
async fn get_score(
    state: web::Data<AppState>,
    query: web::Query<ScoreForRankQuery>,
) -> Result<HttpResponse, RecommendError> {
    query.validate()?;
    let category = parse_category(&query.category)?;

    let score = state
        .recommender
        .index()
        .score_for_rank(&query.province, category, query.year, query.rank)
        .await?;

    tracing::debug!("Score for rank {} in {} {}: {}", query.rank, query.province, category, score);

    Ok(HttpResponse::Ok().json(ApiResponse::success(ScoreData { score, year: query.year }, "success")))
}

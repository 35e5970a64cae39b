use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpResponse, HttpServer};
use gaokao_recommend::config::{LoggingSettings, Settings};
use gaokao_recommend::core::{Catalog, Recommender, ScoreRankIndex};
use gaokao_recommend::models::ApiResponse;
use gaokao_recommend::routes::{self, AppState};
use gaokao_recommend::services::{FileDistributionSource, PostgresClient, ProvinceCityDirectory};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let message = format!("Invalid JSON: {}", err);
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::<()>::error(400, message)),
    )
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    let message = format!("Invalid query: {}", err);
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::<()>::error(400, message)),
    )
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);
    info!("Starting gaokao recommendation service...");

    let catalog = Arc::new(Catalog::from_settings(&settings.catalog, settings.recommend.data_year));
    info!(
        "Catalog loaded: table={}, data year={}",
        catalog.admission_table, catalog.data_year
    );

    let distributions = Arc::new(FileDistributionSource::new(&settings.catalog.distribution_dir));
    let index = Arc::new(ScoreRankIndex::new(
        distributions,
        catalog.clone(),
        settings.cache.score_rank_capacity,
        Duration::from_secs(settings.cache.score_rank_ttl_secs),
    ));

    info!(
        "Score-rank index initialized (capacity: {} tables, TTL: {}s)",
        settings.cache.score_rank_capacity, settings.cache.score_rank_ttl_secs
    );

    let postgres = match PostgresClient::from_settings(&settings.database, &settings.catalog.profile_table).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to connect to PostgreSQL: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    info!("PostgreSQL client initialized");

    let recommender = Recommender::new(catalog, index, settings.recommend.limits())
        .with_admissions(postgres.clone())
        .with_profiles(postgres.clone());

    let regions = Arc::new(ProvinceCityDirectory::new(&settings.catalog.province_city_file));

    // Build application state
    let app_state = AppState {
        recommender: Arc::new(recommender),
        profiles: Some(postgres.clone()),
        regions,
        postgres: Some(postgres),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

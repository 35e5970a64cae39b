// Route exports
pub mod options;
pub mod profiles;
pub mod rank;
pub mod voluntary;

use actix_web::web;
use std::sync::Arc;
use crate::core::Recommender;
use crate::services::{PostgresClient, ProfileStore, ProvinceCityDirectory};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub profiles: Option<Arc<dyn ProfileStore>>,
    pub regions: Arc<ProvinceCityDirectory>,
    /// Used only for health reporting
    pub postgres: Option<Arc<PostgresClient>>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(voluntary::configure)
            .configure(rank::configure)
            .configure(profiles::configure)
            .configure(options::configure),
    );
}

use serde::{Deserialize, Serialize};
use crate::models::domain::UniversityRecommendation;

/// Envelope wrapping every API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, msg: impl Into<String>) -> Self {
        Self {
            code: 200,
            msg: msg.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// One page of university recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversityPage {
    pub list: Vec<UniversityRecommendation>,
    pub page: i64,
    pub page_num: i64,
    pub page_size: i64,
    pub total: i64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_tables: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Cities of one province
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvinceCities {
    pub province: String,
    #[serde(rename = "citys")]
    pub cities: Vec<String>,
}

impl ProvinceCities {
    pub fn new(province: impl Into<String>, cities: &[String]) -> Self {
        Self {
            province: province.into(),
            cities: cities.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceOptions {
    pub provinces: Vec<ProvinceCities>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankData {
    pub rank: i32,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreData {
    pub score: i32,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileIdData {
    pub profile_id: String,
}

use async_trait::async_trait;
use thiserror::Error;
use crate::core::predicate::Statement;
use crate::models::{NewProfile, UserProfile};

/// Errors that can occur when talking to a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// One (school, major group) row of a grouped recommendation page
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub school_code: String,
    pub school_name: String,
    pub school_province: String,
    pub category_tags: Vec<String>,
    pub tags: Vec<String>,
    pub group_code: String,
    pub major_count: i64,
}

/// Admission line recorded for an earlier year, `years_back` before the data year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriorAdmission {
    pub years_back: i32,
    pub min_score: Option<i32>,
    pub min_rank: Option<i32>,
    pub plan_count: Option<i32>,
}

/// One major row returned by a batched detail query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MajorRow {
    pub school_code: String,
    pub group_code: String,
    pub id: i64,
    pub code: String,
    pub name: String,
    pub min_score: Option<i32>,
    pub min_rank: Option<i32>,
    pub plan_count: Option<i32>,
    pub tuition: Option<String>,
    pub duration: Option<String>,
    pub remark: Option<String>,
    pub prior: Vec<PriorAdmission>,
}

/// Historical admission table, queried through composed statements
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Run a `COUNT(...)` statement and return its single value
    async fn count(&self, statement: &Statement) -> Result<i64, StoreError>;

    /// Run a grouped page statement
    async fn group_rows(&self, statement: &Statement) -> Result<Vec<GroupRow>, StoreError>;

    /// Run a major detail statement
    async fn major_rows(&self, statement: &Statement) -> Result<Vec<MajorRow>, StoreError>;
}

/// Keyed user profile store
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: &str) -> Result<UserProfile, StoreError>;

    async fn create_profile(&self, profile: NewProfile) -> Result<UserProfile, StoreError>;
}

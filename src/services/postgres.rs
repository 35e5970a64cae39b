use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};
use std::time::Duration;
use crate::core::catalog::columns;
use crate::core::predicate::{SqlValue, Statement};
use crate::models::{NewProfile, Preference, UserProfile};
use crate::services::store::{AdmissionStore, GroupRow, MajorRow, PriorAdmission, ProfileStore, StoreError};

/// PostgreSQL client backing both the admission table and user profiles
///
/// Admission statements arrive fully composed with `$n` placeholders; this
/// client only binds their arguments and decodes rows.
pub struct PostgresClient {
    pool: PgPool,
    profile_table: String,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        profile_table: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            profile_table: profile_table.into(),
        })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        settings: &crate::config::DatabaseSettings,
        profile_table: &str,
    ) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max {} connections)",
            settings.max_connections.unwrap_or(10)
        );

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
            profile_table,
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn bind_statement(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!("Executing statement ({} args): {}", statement.args.len(), statement.sql);

    let mut query = sqlx::query(&statement.sql);
    for arg in &statement.args {
        query = match arg {
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::BigInt(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Bool(v) => query.bind(*v),
        };
    }
    query
}

fn decode_group(row: &PgRow) -> Result<GroupRow, sqlx::Error> {
    Ok(GroupRow {
        school_code: row.try_get(columns::SCHOOL_CODE)?,
        school_name: row.try_get(columns::SCHOOL_NAME)?,
        school_province: row.try_get::<Option<String>, _>(columns::SCHOOL_PROVINCE)?.unwrap_or_default(),
        category_tags: row.try_get::<Option<Vec<String>>, _>(columns::SCHOOL_LEVELS)?.unwrap_or_default(),
        tags: row.try_get::<Option<Vec<String>>, _>(columns::SCHOOL_TAGS)?.unwrap_or_default(),
        group_code: row.try_get(columns::MAJOR_GROUP_CODE)?,
        major_count: row.try_get("major_count")?,
    })
}

fn decode_major(row: &PgRow) -> Result<MajorRow, sqlx::Error> {
    let mut prior = Vec::with_capacity(columns::PRIOR_YEARS as usize);
    for years_back in 1..=columns::PRIOR_YEARS {
        prior.push(PriorAdmission {
            years_back,
            min_score: row.try_get(columns::prior(columns::MIN_SCORE_PREV, years_back).as_str())?,
            min_rank: row.try_get(columns::prior(columns::MIN_RANK_PREV, years_back).as_str())?,
            plan_count: row.try_get(columns::prior(columns::PLAN_COUNT_PREV, years_back).as_str())?,
        });
    }

    Ok(MajorRow {
        school_code: row.try_get(columns::SCHOOL_CODE)?,
        group_code: row.try_get(columns::MAJOR_GROUP_CODE)?,
        id: row.try_get(columns::ID)?,
        code: row.try_get::<Option<String>, _>(columns::MAJOR_CODE)?.unwrap_or_default(),
        name: row.try_get(columns::MAJOR_NAME)?,
        min_score: row.try_get(columns::MAJOR_MIN_SCORE)?,
        min_rank: row.try_get(columns::MAJOR_MIN_RANK)?,
        plan_count: row.try_get(columns::PLAN_COUNT)?,
        tuition: row.try_get(columns::TUITION_FEE)?,
        duration: row.try_get(columns::STUDY_DURATION)?,
        remark: row.try_get(columns::MAJOR_REMARK)?,
        prior,
    })
}

fn decode_profile(row: &PgRow) -> Result<UserProfile, sqlx::Error> {
    let preference: Option<Json<Preference>> = row.try_get("preference")?;

    Ok(UserProfile {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        gender: row.try_get("gender")?,
        province: row.try_get("province")?,
        score: row.try_get("score")?,
        rank: row.try_get("rank")?,
        subjects: row.try_get("subjects")?,
        preference: preference.map(|p| p.0).unwrap_or_default(),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AdmissionStore for PostgresClient {
    async fn count(&self, statement: &Statement) -> Result<i64, StoreError> {
        let row = bind_statement(statement)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<Option<i64>, _>("total")?.unwrap_or(0))
    }

    async fn group_rows(&self, statement: &Statement) -> Result<Vec<GroupRow>, StoreError> {
        let rows = bind_statement(statement)
            .fetch_all(&self.pool)
            .await?;

        let groups = rows.iter().map(decode_group).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Decoded {} group rows", groups.len());
        Ok(groups)
    }

    async fn major_rows(&self, statement: &Statement) -> Result<Vec<MajorRow>, StoreError> {
        let rows = bind_statement(statement)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(decode_major).collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn get_profile(&self, id: &str) -> Result<UserProfile, StoreError> {
        let query = format!(
            "SELECT id, username, gender, province, score, rank, subjects, preference, created_at \
             FROM {} WHERE id = $1",
            self.profile_table
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;

        Ok(decode_profile(&row)?)
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<UserProfile, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let query = format!(
            "INSERT INTO {} (id, username, gender, province, score, rank, subjects, preference, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             RETURNING id, username, gender, province, score, rank, subjects, preference, created_at",
            self.profile_table
        );

        let row = sqlx::query(&query)
            .bind(&id)
            .bind(&profile.username)
            .bind(&profile.gender)
            .bind(&profile.province)
            .bind(profile.score)
            .bind(profile.rank)
            .bind(&profile.subjects)
            .bind(Json(&profile.preference))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created profile {} for {}", id, profile.username);

        Ok(decode_profile(&row)?)
    }
}

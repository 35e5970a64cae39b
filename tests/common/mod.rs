// In-memory stores shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use gaokao_recommend::core::{Catalog, RecommendLimits, Recommender, ScoreRankIndex, Statement};
use gaokao_recommend::models::{NewProfile, Preference, UserProfile};
use gaokao_recommend::services::distribution::ScoreLabel;
use gaokao_recommend::services::{
    AdmissionStore, DistributionError, DistributionKey, DistributionRecord, DistributionSource, GroupRow,
    MajorRow, ProfileStore, StoreError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Admission store returning canned rows and recording every statement
#[derive(Default)]
pub struct FakeAdmissions {
    pub total: i64,
    pub groups: Vec<GroupRow>,
    pub majors: Vec<MajorRow>,
    pub delay: Option<Duration>,
    /// 0-based index of the statement that fails with a store error
    pub fail_on: Option<usize>,
    pub statements: Mutex<Vec<Statement>>,
}

impl FakeAdmissions {
    pub fn recorded(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    async fn record(&self, statement: &Statement) -> Result<(), StoreError> {
        let index = {
            let mut statements = self.statements.lock().unwrap();
            statements.push(statement.clone());
            statements.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(index) {
            return Err(StoreError::Decode("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AdmissionStore for FakeAdmissions {
    async fn count(&self, statement: &Statement) -> Result<i64, StoreError> {
        self.record(statement).await?;
        Ok(self.total)
    }

    async fn group_rows(&self, statement: &Statement) -> Result<Vec<GroupRow>, StoreError> {
        self.record(statement).await?;
        Ok(self.groups.clone())
    }

    async fn major_rows(&self, statement: &Statement) -> Result<Vec<MajorRow>, StoreError> {
        self.record(statement).await?;
        Ok(self.majors.clone())
    }
}

/// Profile store over a map; ids are sequential
#[derive(Default)]
pub struct FakeProfiles {
    pub profiles: Mutex<HashMap<String, UserProfile>>,
    pub fail: bool,
}

impl FakeProfiles {
    pub fn with(profile: UserProfile) -> Self {
        let store = Self::default();
        store.profiles.lock().unwrap().insert(profile.id.clone(), profile);
        store
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn get_profile(&self, id: &str) -> Result<UserProfile, StoreError> {
        if self.fail {
            return Err(StoreError::Decode("connection reset".to_string()));
        }
        self.profiles
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<UserProfile, StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        let created = UserProfile {
            id: format!("profile-{}", profiles.len() + 1),
            username: profile.username,
            gender: profile.gender,
            province: profile.province,
            score: profile.score,
            rank: profile.rank,
            subjects: profile.subjects,
            preference: profile.preference,
            created_at: Some(chrono::Utc::now()),
        };
        profiles.insert(created.id.clone(), created.clone());
        Ok(created)
    }
}

/// Distributions held in memory, keyed by `DistributionKey` display form
#[derive(Default)]
pub struct MemoryDistributions {
    pub tables: HashMap<String, Vec<DistributionRecord>>,
}

#[async_trait]
impl DistributionSource for MemoryDistributions {
    async fn fetch(&self, key: &DistributionKey) -> Result<Vec<DistributionRecord>, DistributionError> {
        self.tables
            .get(&key.to_string())
            .cloned()
            .ok_or_else(|| DistributionError::Empty(key.to_string()))
    }
}

pub fn record(score: i64, num: i64, accumulate: i64) -> DistributionRecord {
    DistributionRecord {
        score: ScoreLabel::Number(score),
        num,
        accumulate,
    }
}

/// Hubei physics 2024: 600 → 100, 590 → 250, 580 → 450
pub fn hubei_distributions() -> MemoryDistributions {
    let mut tables = HashMap::new();
    tables.insert(
        "hubei_2024_physics".to_string(),
        vec![record(600, 100, 100), record(590, 150, 250), record(580, 200, 450)],
    );
    MemoryDistributions { tables }
}

pub fn group_row(school_code: &str, school_name: &str, group_code: &str) -> GroupRow {
    GroupRow {
        school_code: school_code.to_string(),
        school_name: school_name.to_string(),
        school_province: "湖北".to_string(),
        category_tags: vec!["综合".to_string()],
        tags: vec!["双一流".to_string()],
        group_code: group_code.to_string(),
        major_count: 2,
    }
}

pub fn major_row(school_code: &str, group_code: &str, name: &str, min_score: Option<i32>) -> MajorRow {
    MajorRow {
        school_code: school_code.to_string(),
        group_code: group_code.to_string(),
        id: 1,
        code: "080901".to_string(),
        name: name.to_string(),
        min_score,
        min_rank: Some(12000),
        plan_count: Some(3),
        tuition: Some("5850".to_string()),
        duration: Some("四年".to_string()),
        remark: None,
        prior: Vec::new(),
    }
}

pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        username: "student".to_string(),
        gender: Some("female".to_string()),
        province: "湖北".to_string(),
        score: 600,
        rank: 0,
        subjects: vec!["物理".to_string(), "化学".to_string(), "生物".to_string()],
        preference: Preference::default(),
        created_at: None,
    }
}

pub fn recommender(
    admissions: Option<Arc<FakeAdmissions>>,
    profiles: Option<Arc<FakeProfiles>>,
    limits: RecommendLimits,
) -> Recommender {
    let catalog = Arc::new(Catalog::default());
    let index = Arc::new(ScoreRankIndex::new(
        Arc::new(hubei_distributions()),
        catalog.clone(),
        16,
        Duration::from_secs(60),
    ));

    let mut recommender = Recommender::new(catalog, index, limits);
    if let Some(store) = admissions {
        recommender = recommender.with_admissions(store);
    }
    if let Some(store) = profiles {
        recommender = recommender.with_profiles(store);
    }
    recommender
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject category of a candidate, decided by the anchor subject
/// (physics-track or history-track).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectCategory {
    Physics,
    History,
}

impl SubjectCategory {
    /// Stable integer code stored in the `subject_category` column.
    pub fn code(self) -> i32 {
        match self {
            SubjectCategory::Physics => 1,
            SubjectCategory::History => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubjectCategory::Physics => "physics",
            SubjectCategory::History => "history",
        }
    }
}

impl fmt::Display for SubjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "physics" | "物理" => Ok(SubjectCategory::Physics),
            "history" | "历史" => Ok(SubjectCategory::History),
            other => Err(format!("unknown category '{}', expected physics or history", other)),
        }
    }
}

/// Risk tier of a target relative to the candidate's score.
///
/// Serialized as its integer code: 0 = rush, 1 = stable, 2 = safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Strategy {
    #[default]
    Rush,
    Stable,
    Safe,
}

impl Strategy {
    pub fn code(self) -> i32 {
        match self {
            Strategy::Rush => 0,
            Strategy::Stable => 1,
            Strategy::Safe => 2,
        }
    }
}

impl TryFrom<i32> for Strategy {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Strategy::Rush),
            1 => Ok(Strategy::Stable),
            2 => Ok(Strategy::Safe),
            other => Err(format!("strategy must be 0, 1 or 2, got {}", other)),
        }
    }
}

impl From<Strategy> for i32 {
    fn from(value: Strategy) -> Self {
        value.code()
    }
}

/// Admission line of a major in an earlier year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionYear {
    pub year: i32,
    #[serde(rename = "min_score")]
    pub min_score: Option<i32>,
    #[serde(rename = "min_rank")]
    pub min_rank: Option<i32>,
    #[serde(rename = "plan_num")]
    pub plan_count: Option<i32>,
}

/// One historical admission line for a major, classified against the candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Major {
    pub code: String,
    pub id: i64,
    pub name: String,
    pub min_score: i32,
    pub min_rank: i32,
    #[serde(rename = "plan_num")]
    pub plan_count: i32,
    #[serde(rename = "study_cost")]
    pub tuition: String,
    #[serde(rename = "study_year")]
    pub duration: String,
    pub remark: String,
    pub probability: i32,
    pub strategy: Strategy,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<AdmissionYear>,
}

/// Majors admitted under one group code at one school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorGroup {
    pub group_code: String,
    #[serde(rename = "major")]
    pub majors: Vec<Major>,
    pub probability: i32,
    pub strategy: Strategy,
}

/// One university entry of a recommendation page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityRecommendation {
    pub recruit_code: String,
    pub university_name: String,
    pub province: String,
    #[serde(rename = "category")]
    pub category_tags: Vec<String>,
    pub tags: Vec<String>,
    #[serde(rename = "major_group")]
    pub major_groups: Vec<MajorGroup>,
}

/// (school, major group) key used to batch detail lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchoolGroupPair {
    pub school_code: String,
    pub group_code: String,
}

impl SchoolGroupPair {
    pub fn new(school_code: impl Into<String>, group_code: impl Into<String>) -> Self {
        Self {
            school_code: school_code.into(),
            group_code: group_code.into(),
        }
    }
}

/// Stored user profile, read by the recommender to pre-fill requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub province: String,
    pub score: i32,
    pub rank: i32,
    pub subjects: Vec<String>,
    #[serde(default)]
    pub preference: Preference,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Free-form preferences recorded with a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub career_interest: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graduation_plan: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub major_preference: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
    #[serde(default = "default_priority_strategy")]
    pub priority_strategy: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub region_preference: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_universities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuition_preference: Option<String>,
}

fn default_priority_strategy() -> String { "school".to_string() }

/// Fields needed to create a profile; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub username: String,
    pub gender: Option<String>,
    pub province: String,
    pub score: i32,
    pub rank: i32,
    pub subjects: Vec<String>,
    pub preference: Preference,
}

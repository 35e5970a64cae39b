use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Strategy, UserProfile};

/// Candidate criteria shared by every recommendation request shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Criteria {
    /// Province the candidate applies from
    #[serde(default)]
    pub province: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    #[serde(default)]
    pub score: Option<i32>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub rank: Option<i32>,
    /// Comma separated subject names, e.g. "物理,化学,生物"
    #[serde(default)]
    pub subjects: Option<String>,
    /// [0 rush, 1 stable, 2 safe], rush when omitted
    #[serde(default)]
    pub strategy: Strategy,
}

impl Criteria {
    pub fn province(&self) -> Option<&str> {
        self.province.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn subjects(&self) -> Option<&str> {
        self.subjects.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Score when one was given; zero counts as unset
    pub fn score(&self) -> Option<i32> {
        self.score.filter(|s| *s > 0)
    }

    /// Rank when one was given; zero counts as unset
    pub fn rank(&self) -> Option<i32> {
        self.rank.filter(|r| *r > 0)
    }

    /// Fill every field the request left unset from the stored profile.
    /// Fields given explicitly in the request always win.
    pub fn merge_profile(&mut self, profile: &UserProfile) {
        if self.province().is_none() && !profile.province.trim().is_empty() {
            self.province = Some(profile.province.clone());
        }
        if self.score().is_none() && profile.score > 0 {
            self.score = Some(profile.score);
        }
        if self.rank().is_none() && profile.rank > 0 {
            self.rank = Some(profile.rank);
        }
        if self.subjects().is_none() && !profile.subjects.is_empty() {
            self.subjects = Some(profile.subjects.join(","));
        }
    }
}

/// Capability shared by request shapes that can be pre-filled from a profile
pub trait ProfileFields {
    fn profile_id(&self) -> Option<&str>;
    fn criteria_mut(&mut self) -> &mut Criteria;
}

/// Request for university-first recommendations
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UniversityPriorityRequest {
    #[serde(default)]
    pub profile_id: Option<String>,
    #[validate(nested)]
    #[serde(flatten)]
    pub criteria: Criteria,
    /// Comma separated cities
    #[serde(default, alias = "citys")]
    pub cities: Option<String>,
    /// Comma separated college types: ownership values or school tags
    #[serde(default)]
    pub college_type: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub page: Option<i64>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl ProfileFields for UniversityPriorityRequest {
    fn profile_id(&self) -> Option<&str> {
        self.profile_id.as_deref().filter(|id| !id.is_empty())
    }

    fn criteria_mut(&mut self) -> &mut Criteria {
        &mut self.criteria
    }
}

/// Request for the detail of one major group
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MajorGroupRequest {
    #[validate(length(min = 1))]
    pub school_code: String,
    #[validate(length(min = 1))]
    pub group_code: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[validate(nested)]
    #[serde(flatten)]
    pub criteria: Criteria,
}

impl ProfileFields for MajorGroupRequest {
    fn profile_id(&self) -> Option<&str> {
        self.profile_id.as_deref().filter(|id| !id.is_empty())
    }

    fn criteria_mut(&mut self) -> &mut Criteria {
        &mut self.criteria
    }
}

/// Optional comma separated province filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvinceOptionsQuery {
    pub province: Option<String>,
}

/// Query for the rank matching a score
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankForScoreQuery {
    #[validate(length(min = 1))]
    pub province: String,
    pub category: String,
    pub year: i32,
    #[validate(range(min = 1))]
    pub score: i32,
}

/// Query for the score matching a rank
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreForRankQuery {
    #[validate(length(min = 1))]
    pub province: String,
    pub category: String,
    pub year: i32,
    #[validate(range(min = 1))]
    pub rank: i32,
}

/// Request to create a user profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[validate(length(min = 1))]
    pub province: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub score: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub rank: i32,
    #[validate(length(min = 1))]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub preference: Option<crate::models::domain::Preference>,
}

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AdmissionYear, Major, MajorGroup, NewProfile, Preference, SchoolGroupPair, Strategy,
    SubjectCategory, UniversityRecommendation, UserProfile,
};
pub use requests::{
    CreateProfileRequest, Criteria, MajorGroupRequest, ProfileFields, ProvinceOptionsQuery,
    RankForScoreQuery, ScoreForRankQuery, UniversityPriorityRequest,
};
pub use responses::{
    ApiResponse, HealthResponse, ProfileIdData, ProvinceCities, ProvinceOptions, RankData, ScoreData,
    UniversityPage,
};

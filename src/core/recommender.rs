use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use validator::Validate;
use crate::core::catalog::{columns, Catalog};
use crate::core::predicate::{Predicate, PredicateBuilder};
use crate::core::probability::{classify_or_fallback, Classification};
use crate::core::score_rank::ScoreRankIndex;
use crate::core::subjects::SubjectFilter;
use crate::error::RecommendError;
use crate::models::{
    AdmissionYear, Criteria, Major, MajorGroup, MajorGroupRequest, ProfileFields, SchoolGroupPair,
    Strategy, SubjectCategory, UniversityPage, UniversityPriorityRequest, UniversityRecommendation,
};
use crate::services::store::{AdmissionStore, GroupRow, MajorRow, ProfileStore};

const GROUP_COLUMNS: [&str; 6] = [
    columns::SCHOOL_CODE,
    columns::SCHOOL_NAME,
    columns::SCHOOL_PROVINCE,
    columns::SCHOOL_LEVELS,
    columns::SCHOOL_TAGS,
    columns::MAJOR_GROUP_CODE,
];

const MAJOR_COLUMNS: [&str; 11] = [
    columns::SCHOOL_CODE,
    columns::MAJOR_GROUP_CODE,
    columns::ID,
    columns::MAJOR_CODE,
    columns::MAJOR_NAME,
    columns::MAJOR_MIN_SCORE,
    columns::MAJOR_MIN_RANK,
    columns::PLAN_COUNT,
    columns::TUITION_FEE,
    columns::STUDY_DURATION,
    columns::MAJOR_REMARK,
];

fn group_projection() -> String {
    GROUP_COLUMNS.join(", ")
}

/// Current-year major columns followed by every prior year
fn major_projection() -> String {
    let mut names: Vec<String> = MAJOR_COLUMNS.iter().map(|c| c.to_string()).collect();
    for years_back in 1..=columns::PRIOR_YEARS {
        for prefix in [columns::MIN_SCORE_PREV, columns::MIN_RANK_PREV, columns::PLAN_COUNT_PREV] {
            names.push(columns::prior(prefix, years_back));
        }
    }
    names.join(", ")
}

/// Rows are paged per (school, major group)
fn count_key() -> String {
    format!("({}, {})", columns::SCHOOL_CODE, columns::MAJOR_GROUP_CODE)
}

/// Paging and timeout limits of the recommender
#[derive(Debug, Clone, Copy)]
pub struct RecommendLimits {
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub recommend_timeout: Duration,
    pub detail_timeout: Duration,
}

impl Default for RecommendLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            recommend_timeout: Duration::from_secs(30),
            detail_timeout: Duration::from_secs(15),
        }
    }
}

/// Inclusive range of group cutoff scores considered for a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWindow {
    pub min: i32,
    pub max: i32,
}

impl ScoreWindow {
    /// rush `[s+3, s+20]`, stable `[s-5, s+3]`, safe `[s-20, s-5]`
    pub fn around(score: i32, strategy: Strategy) -> Self {
        let (low, high) = match strategy {
            Strategy::Rush => (3, 20),
            Strategy::Stable => (-5, 3),
            Strategy::Safe => (-20, -5),
        };
        Self {
            min: score.saturating_add(low),
            max: score.saturating_add(high),
        }
    }

    pub fn contains(&self, cutoff: i32) -> bool {
        cutoff >= self.min && cutoff <= self.max
    }
}

/// Filters shared by the batched major lookup
#[derive(Debug, Clone)]
struct DetailScope<'a> {
    province: Option<&'a str>,
    subjects: Option<SubjectFilter>,
    score: Option<i32>,
    strategy: Strategy,
}

/// Turns recommendation requests into paginated, classified results
///
/// # Pipeline
/// 1. Profile merge (non-fatal)
/// 2. Subject validation
/// 3. Score window, converting a bare rank through the score-rank index
/// 4. Predicate composition
/// 5. Count and grouped page query
/// 6. One batched major lookup for every (school, group) pair of the page
/// 7. Assembly per university name
pub struct Recommender {
    admissions: Option<Arc<dyn AdmissionStore>>,
    profiles: Option<Arc<dyn ProfileStore>>,
    index: Arc<ScoreRankIndex>,
    catalog: Arc<Catalog>,
    limits: RecommendLimits,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, index: Arc<ScoreRankIndex>, limits: RecommendLimits) -> Self {
        Self {
            admissions: None,
            profiles: None,
            index,
            catalog,
            limits,
        }
    }

    pub fn with_admissions(mut self, store: Arc<dyn AdmissionStore>) -> Self {
        self.admissions = Some(store);
        self
    }

    pub fn with_profiles(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(store);
        self
    }

    pub fn index(&self) -> &Arc<ScoreRankIndex> {
        &self.index
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn admissions(&self) -> Result<&Arc<dyn AdmissionStore>, RecommendError> {
        self.admissions.as_ref().ok_or(RecommendError::NotInitialized)
    }

    /// Recommend universities and their major groups for one request
    pub async fn recommend(&self, request: UniversityPriorityRequest) -> Result<UniversityPage, RecommendError> {
        let store = self.admissions()?;
        request.validate()?;

        if request.profile_id().is_none() {
            let c = &request.criteria;
            if c.province().is_none() || c.subjects().is_none() || (c.score().is_none() && c.rank().is_none()) {
                return Err(RecommendError::InvalidArgument(
                    "profile_id or (province, subjects, score or rank) is required".to_string(),
                ));
            }
        }

        let limit = self.limits.recommend_timeout;
        tokio::time::timeout(limit, self.run_recommend(store.as_ref(), request))
            .await
            .map_err(|_| RecommendError::Timeout {
                operation: "recommend",
                seconds: limit.as_secs(),
            })?
    }

    async fn run_recommend(
        &self,
        store: &dyn AdmissionStore,
        mut request: UniversityPriorityRequest,
    ) -> Result<UniversityPage, RecommendError> {
        let started = Instant::now();

        self.merge_profile(&mut request).await;
        let criteria = &request.criteria;

        let subjects = criteria
            .subjects()
            .ok_or_else(|| RecommendError::InvalidArgument("subjects are required".to_string()))
            .and_then(SubjectFilter::parse)?;
        let province = criteria
            .province()
            .ok_or_else(|| RecommendError::InvalidArgument("province is required".to_string()))?;
        let score = self
            .working_score(criteria, province, subjects.category)
            .await?
            .ok_or_else(|| RecommendError::InvalidArgument("score or rank is required".to_string()))?;
        let strategy = criteria.strategy;
        let window = ScoreWindow::around(score, strategy);

        let page = request.page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = match request.page_size {
            Some(size) if size > 0 => size.min(self.limits.max_page_size),
            _ => self.limits.default_page_size,
        };
        let offset = (page - 1).saturating_mul(page_size);

        let mut builder = PredicateBuilder::new();
        builder
            .push(Predicate::eq(columns::SOURCE_PROVINCE, self.catalog.stored_province(province)))
            .push(Predicate::ge(columns::MAJOR_GROUP_MIN_SCORE, window.min))
            .push(Predicate::le(columns::MAJOR_GROUP_MIN_SCORE, window.max))
            .extend(subjects.build_conditions())
            .push_opt(city_condition(request.cities.as_deref()))
            .push_opt(self.college_type_condition(request.college_type.as_deref()));

        let context = format!(
            "province={}, category={}, window={}..={}",
            province, subjects.category, window.min, window.max
        );
        let table = &self.catalog.admission_table;

        let count_statement = builder.build_count(table, &count_key());
        tracing::debug!(
            "Counting major groups with {} conditions, {} args",
            builder.len(),
            count_statement.args.len()
        );
        let total = store
            .count(&count_statement)
            .await
            .map_err(|e| RecommendError::query_failed("count major groups", context.clone(), e))?;
        let page_num = (total + page_size - 1) / page_size;

        tracing::info!(
            "Found {} major groups for {} (score {}, strategy {:?}) in {:?}",
            total,
            context,
            score,
            strategy,
            started.elapsed()
        );

        if total == 0 || offset >= total {
            return Ok(UniversityPage {
                list: Vec::new(),
                page,
                page_num,
                page_size,
                total,
            });
        }

        let projection = group_projection();
        let rows_statement = builder.build(
            &format!("SELECT {}, COUNT(*) AS major_count FROM {}", projection, table),
            &format!(
                "GROUP BY {} ORDER BY {} ASC, {} ASC, {} ASC LIMIT {} OFFSET {}",
                projection,
                columns::SCHOOL_NAME,
                columns::SCHOOL_CODE,
                columns::MAJOR_GROUP_CODE,
                page_size,
                offset
            ),
        );
        let rows = store
            .group_rows(&rows_statement)
            .await
            .map_err(|e| RecommendError::query_failed("fetch major group page", context.clone(), e))?;

        let mut pairs: Vec<SchoolGroupPair> = Vec::with_capacity(rows.len());
        for row in &rows {
            let pair = SchoolGroupPair::new(row.school_code.clone(), row.group_code.clone());
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }

        let scope = DetailScope {
            province: Some(province),
            subjects: Some(subjects),
            score: Some(score),
            strategy,
        };
        let groups = self.resolve_groups(store, &pairs, &scope).await?;
        let list = assemble_universities(rows, groups, strategy);

        tracing::info!(
            "Recommendation page {}/{} ready: {} universities, {} groups in {:?}",
            page,
            page_num,
            list.len(),
            pairs.len(),
            started.elapsed()
        );

        Ok(UniversityPage {
            list,
            page,
            page_num,
            page_size,
            total,
        })
    }

    /// Detail of one major group, classified against the candidate
    pub async fn major_group_detail(&self, mut request: MajorGroupRequest) -> Result<MajorGroup, RecommendError> {
        let store = self.admissions()?;
        request.validate()?;
        request.school_code = request.school_code.trim().to_string();
        request.group_code = request.group_code.trim().to_string();
        if request.school_code.is_empty() || request.group_code.is_empty() {
            return Err(RecommendError::InvalidArgument(
                "school_code and group_code are required".to_string(),
            ));
        }

        let limit = self.limits.detail_timeout;
        tokio::time::timeout(limit, self.run_detail(store.as_ref(), request))
            .await
            .map_err(|_| RecommendError::Timeout {
                operation: "major group detail",
                seconds: limit.as_secs(),
            })?
    }

    async fn run_detail(
        &self,
        store: &dyn AdmissionStore,
        mut request: MajorGroupRequest,
    ) -> Result<MajorGroup, RecommendError> {
        self.merge_profile(&mut request).await;
        let criteria = &request.criteria;

        let subjects = criteria.subjects().map(SubjectFilter::parse).transpose()?;
        let province = criteria.province();
        let score = match (province, &subjects) {
            (Some(p), Some(filter)) => self.working_score(criteria, p, filter.category).await?,
            _ => criteria.score(),
        };

        let pair = SchoolGroupPair::new(request.school_code.clone(), request.group_code.clone());
        let scope = DetailScope {
            province,
            subjects,
            score,
            strategy: criteria.strategy,
        };

        let mut groups = self.resolve_groups(store, std::slice::from_ref(&pair), &scope).await?;
        let group = groups
            .remove(&pair)
            .unwrap_or_else(|| build_major_group(pair.group_code.clone(), Vec::new(), scope.strategy));

        tracing::info!(
            "Major group {}/{} resolved with {} majors",
            pair.school_code,
            pair.group_code,
            group.majors.len()
        );

        Ok(group)
    }

    /// Pre-fill unset request fields from the stored profile. Lookup
    /// failures only degrade the request to its explicit fields.
    async fn merge_profile<R: ProfileFields>(&self, request: &mut R) {
        let Some(id) = request.profile_id().map(str::to_owned) else {
            return;
        };
        let Some(profiles) = &self.profiles else {
            tracing::warn!("Profile {} requested but no profile store is configured", id);
            return;
        };

        match profiles.get_profile(&id).await {
            Ok(profile) => {
                request.criteria_mut().merge_profile(&profile);
                tracing::debug!("Applied profile {} to request", id);
            }
            Err(e) => {
                tracing::warn!("Failed to load profile {}, using request fields only: {}", id, e);
            }
        }
    }

    /// Explicit score, or the score equivalent to the given rank
    async fn working_score(
        &self,
        criteria: &Criteria,
        province: &str,
        category: SubjectCategory,
    ) -> Result<Option<i32>, RecommendError> {
        if let Some(score) = criteria.score() {
            return Ok(Some(score));
        }
        let Some(rank) = criteria.rank() else {
            return Ok(None);
        };

        let year = self.catalog.data_year;
        let score = self.index.score_for_rank(province, category, year, rank).await?;
        tracing::debug!(
            "Converted rank {} to score {} ({} {} {})",
            rank,
            score,
            province,
            category,
            year
        );
        Ok(Some(score))
    }

    /// `(ownership OR-group) AND (tag OR-group)` from a comma separated type list
    fn college_type_condition(&self, college_types: Option<&str>) -> Option<Predicate> {
        let mut ownership = Vec::new();
        let mut tags = Vec::new();
        for token in split_list(college_types?) {
            if self.catalog.is_ownership(token) {
                ownership.push(Predicate::eq(columns::SCHOOL_OWNERSHIP, token));
            } else {
                tags.push(Predicate::contains(columns::SCHOOL_TAGS, token));
            }
        }

        let parts: Vec<Predicate> = [Predicate::or_group(ownership), Predicate::or_group(tags)]
            .into_iter()
            .flatten()
            .collect();
        Predicate::and_group(parts)
    }

    /// One round trip for every major of the given pairs, grouped back per pair
    async fn resolve_groups(
        &self,
        store: &dyn AdmissionStore,
        pairs: &[SchoolGroupPair],
        scope: &DetailScope<'_>,
    ) -> Result<HashMap<SchoolGroupPair, MajorGroup>, RecommendError> {
        let Some(pairs_condition) = Predicate::in_pairs(
            columns::SCHOOL_CODE,
            columns::MAJOR_GROUP_CODE,
            pairs.iter().map(|p| (p.school_code.as_str(), p.group_code.as_str())),
        ) else {
            return Ok(HashMap::new());
        };

        let mut builder = PredicateBuilder::new();
        builder.push(pairs_condition);
        if let Some(province) = scope.province {
            builder.push(Predicate::eq(columns::SOURCE_PROVINCE, self.catalog.stored_province(province)));
        }
        if let Some(filter) = &scope.subjects {
            builder.extend(filter.build_conditions());
        }

        let statement = builder.build(
            &format!("SELECT {} FROM {}", major_projection(), self.catalog.admission_table),
            &format!(
                "ORDER BY {} ASC, {} ASC, {} ASC",
                columns::SCHOOL_CODE,
                columns::MAJOR_GROUP_CODE,
                columns::MAJOR_NAME
            ),
        );
        let rows = store.major_rows(&statement).await.map_err(|e| {
            RecommendError::query_failed("fetch majors", format!("{} major groups", pairs.len()), e)
        })?;

        tracing::debug!("Fetched {} majors for {} major groups", rows.len(), pairs.len());

        let mut majors_by_pair: HashMap<SchoolGroupPair, Vec<Major>> = HashMap::new();
        for row in rows {
            let pair = SchoolGroupPair::new(row.school_code.clone(), row.group_code.clone());
            let major = major_from_row(row, scope.score, self.catalog.data_year);
            majors_by_pair.entry(pair).or_default().push(major);
        }

        Ok(majors_by_pair
            .into_iter()
            .map(|(pair, majors)| {
                let group = build_major_group(pair.group_code.clone(), majors, scope.strategy);
                (pair, group)
            })
            .collect())
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn city_condition(cities: Option<&str>) -> Option<Predicate> {
    Predicate::any_of(columns::SCHOOL_CITY, split_list(cities?))
}

/// Classify one major row against the candidate score
pub fn major_from_row(row: MajorRow, candidate_score: Option<i32>, data_year: i32) -> Major {
    let Classification { probability, strategy } = classify_or_fallback(candidate_score, row.min_score);

    let history = row
        .prior
        .into_iter()
        .filter(|p| p.min_score.is_some() || p.min_rank.is_some())
        .map(|p| AdmissionYear {
            year: data_year - p.years_back,
            min_score: p.min_score,
            min_rank: p.min_rank,
            plan_count: p.plan_count,
        })
        .collect();

    Major {
        code: row.code,
        id: row.id,
        name: row.name,
        min_score: row.min_score.unwrap_or(0),
        min_rank: row.min_rank.unwrap_or(0),
        plan_count: row.plan_count.unwrap_or(0),
        tuition: row.tuition.unwrap_or_else(|| "0".to_string()),
        duration: row.duration.unwrap_or_default(),
        remark: row.remark.unwrap_or_default(),
        probability,
        strategy,
        year: data_year,
        history,
    }
}

/// Group probability is the mean over every major of the group. Stable or
/// safe then narrows the displayed majors to that tier, unless no major
/// matches it. Rush shows every major.
pub fn build_major_group(group_code: String, majors: Vec<Major>, strategy: Strategy) -> MajorGroup {
    let probability = if majors.is_empty() {
        0
    } else {
        let sum: i64 = majors.iter().map(|m| i64::from(m.probability)).sum();
        (sum / majors.len() as i64) as i32
    };

    let majors = if strategy.code() > 0 {
        let matching: Vec<Major> = majors.iter().filter(|m| m.strategy == strategy).cloned().collect();
        if matching.is_empty() {
            majors
        } else {
            matching
        }
    } else {
        majors
    };

    MajorGroup {
        group_code,
        majors,
        probability,
        strategy,
    }
}

/// Attach groups to universities keyed by university name, keeping page order
pub fn assemble_universities(
    rows: Vec<GroupRow>,
    mut groups: HashMap<SchoolGroupPair, MajorGroup>,
    strategy: Strategy,
) -> Vec<UniversityRecommendation> {
    let mut list: Vec<UniversityRecommendation> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let pair = SchoolGroupPair::new(row.school_code.clone(), row.group_code.clone());
        let group = groups
            .remove(&pair)
            .unwrap_or_else(|| build_major_group(row.group_code.clone(), Vec::new(), strategy));

        let idx = match by_name.get(&row.school_name) {
            Some(idx) => *idx,
            None => {
                by_name.insert(row.school_name.clone(), list.len());
                list.push(UniversityRecommendation {
                    recruit_code: row.school_code,
                    university_name: row.school_name,
                    province: row.school_province,
                    category_tags: row.category_tags,
                    tags: row.tags,
                    major_groups: Vec::new(),
                });
                list.len() - 1
            }
        };

        list[idx].major_groups.push(group);
    }

    list
}
